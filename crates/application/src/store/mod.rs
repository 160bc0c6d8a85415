//! Persistence of workbench state.

mod persistent;
mod session_store;

pub use persistent::PersistentStore;
pub use session_store::SessionStore;
