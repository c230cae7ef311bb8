//! # seen-core
//!
//! Presence store for the seen tracker: when every player (human or bot) last
//! joined and left a server, and who has been away or online the longest.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Delayed work runs on short-lived threads.
//! - **Single writer**: [`SeenEngine`] serializes all mutations; the lower-level
//!   types in [`state`] are not thread-safe on their own.
//! - **Loud on corruption**: An unreadable store file is an error, never a silent reset.
//! - **Crash-safe saves**: The store file is replaced atomically.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use seen_core::{SeenConfig, SeenEngine, SeenPaths, TopKind, TopQuery};
//!
//! let paths = SeenPaths::under(Path::new("."));
//! let engine = SeenEngine::open(SeenConfig::load(&paths.config_file)?, paths.persistence())?;
//! engine.reconcile(&roster, seen_core::now_secs())?;
//! let longest_away = engine.top(TopKind::Seen, &TopQuery::parse("-merge", TopKind::Seen)?);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod identity;
pub mod patterns;
pub mod ranking;
pub mod state;

pub use config::{SeenConfig, SeenPaths};
pub use engine::{now_secs, Reconciled, SeenEngine};
pub use error::{Result, SeenError};
pub use events::PresenceEvent;
pub use identity::{
    actual_name, bot_alias, has_bot_marker, is_valid_name, BotClassifier, HeuristicClassifier,
    BOT_MARKER,
};
pub use ranking::{BotFilter, TopKind, TopQuery};
pub use state::{Persistence, Session, SessionStore};
