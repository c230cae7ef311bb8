//! Presence state: per-identity sessions and their persistence.
//!
//! # Module Structure
//!
//! - [`types`]: The [`Session`] record and its on-disk form
//! - [`store`]: Case-insensitive in-memory session map
//! - [`file`]: Versioned JSON store file, legacy migration, atomic saves
//! - [`pending`]: Delayed, cancellable bot classification set
//!
//! None of these types synchronize on their own; [`crate::SeenEngine`] is the
//! single writer that serializes every mutation.

mod file;
mod pending;
mod store;
pub(crate) mod types;

pub use file::{Persistence, STORE_VERSION};
pub use pending::{PendingBots, PendingState};
pub use store::SessionStore;
pub use types::{Session, SessionRecord};
