// Implementations for the leveling system.

pub mod in_memory;

pub use in_memory::InMemoryXpStore;
