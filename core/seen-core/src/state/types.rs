//! Session record and its on-disk shape.
//!
//! Timestamps are whole seconds since the Unix epoch; `0` means "never".

use serde::{Deserialize, Serialize};

use crate::identity::{actual_name, has_bot_marker};

/// One identity's most recent join and leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub name: String,
    pub joined: i64,
    pub left: i64,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        Session {
            name: name.into(),
            joined: 0,
            left: 0,
        }
    }

    pub(crate) fn from_record(name: impl Into<String>, record: SessionRecord) -> Self {
        Session {
            name: name.into(),
            joined: record.joined,
            left: record.left,
        }
    }

    pub fn is_online(&self) -> bool {
        self.joined > self.left
    }

    /// Join time while online, leave time otherwise. Used for display and ordering.
    pub fn target(&self) -> i64 {
        if self.is_online() {
            self.joined
        } else {
            self.left
        }
    }

    /// Seconds spent in the current state (online or away) as of `now`.
    pub fn elapsed(&self, now: i64) -> i64 {
        now - self.target()
    }

    pub fn is_bot(&self) -> bool {
        has_bot_marker(&self.name)
    }

    pub fn actual_name(&self) -> &str {
        actual_name(&self.name)
    }

    pub fn is_empty(&self) -> bool {
        self.joined == 0 && self.left == 0
    }

    pub(crate) fn join(&mut self, now: i64) {
        self.joined = now;
    }

    /// Records a leave. A leave with no recorded join backfills `joined` one
    /// second earlier so the online duration stays positive.
    pub(crate) fn leave(&mut self, now: i64) {
        self.left = now;
        if self.joined == 0 {
            self.joined = now - 1;
        }
    }

    pub(crate) fn to_record(&self) -> SessionRecord {
        SessionRecord {
            joined: self.joined,
            left: self.left,
        }
    }
}

/// Persisted form of a [`Session`]; the name is the map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionRecord {
    #[serde(default)]
    pub joined: i64,
    #[serde(default)]
    pub left: i64,
}
