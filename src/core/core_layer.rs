// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "leveling/leveling_service.rs"]
pub mod leveling;

#[path = "membership/membership_service.rs"]
pub mod membership;

#[path = "settings/mod.rs"]
pub mod settings;
