// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "session/mod.rs"]
pub mod session;

#[path = "drafts/mod.rs"]
pub mod drafts;

#[path = "letters/mod.rs"]
pub mod letters;
