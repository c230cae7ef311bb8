//! Inbound presence events as delivered by a host.
//!
//! One JSON object per event, e.g.
//! `{"type":"join","name":"Steve","at":1700000000}`. `at` defaults to the
//! current time when omitted; `"local": true` on a join reports a player
//! connecting from the server itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceEvent {
    /// `local` marks a connection from the server's own address.
    Join {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<i64>,
        #[serde(default)]
        local: bool,
    },
    Leave {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<i64>,
    },
    /// Ground-truth roster; an empty list forces everyone offline.
    Reconcile {
        #[serde(default)]
        names: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<i64>,
    },
    /// Operator correction: drop these identities entirely.
    Remove { names: Vec<String> },
}
