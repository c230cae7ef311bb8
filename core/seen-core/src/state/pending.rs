//! Pending-bot set: aliases of bots believed to be online.
//!
//! A bot join does not enter the set right away. Insertion is scheduled after
//! a short delay so that a leave arriving in the same burst (a player handing
//! their name over to a bot) is not misattributed. A leave that arrives before
//! the delay elapses cancels the scheduled insertion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::identity::identity_key;

/// What [`PendingBots::take`] found for an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    /// The delay had elapsed; the alias was in the set.
    Confirmed,
    /// The insertion was still scheduled and has been cancelled.
    Cancelled,
    Absent,
}

#[derive(Debug, Default)]
struct PendingInner {
    /// identity key -> alias as first seen
    confirmed: HashMap<String, String>,
    /// identity key -> ticket of the scheduled insertion
    scheduled: HashMap<String, u64>,
    next_ticket: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PendingBots {
    inner: Arc<Mutex<PendingInner>>,
}

impl PendingBots {
    pub fn new() -> Self {
        PendingBots::default()
    }

    /// Adds `alias` to the set after `delay`, unless a [`take`](Self::take)
    /// for the same alias cancels it first. Rescheduling replaces the
    /// previous ticket.
    pub fn schedule(&self, alias: &str, delay: Duration) {
        let key = identity_key(alias);
        if delay.is_zero() {
            let mut inner = self.lock();
            inner.scheduled.remove(&key);
            inner.confirmed.insert(key, alias.to_string());
            return;
        }

        let ticket = {
            let mut inner = self.lock();
            inner.next_ticket += 1;
            let ticket = inner.next_ticket;
            inner.scheduled.insert(key.clone(), ticket);
            ticket
        };

        let pending = self.clone();
        let alias_owned = alias.to_string();
        let spawned = thread::Builder::new()
            .name("seen-pending-bot".to_string())
            .spawn(move || {
                thread::sleep(delay);
                pending.fire(&key, ticket, alias_owned);
            });

        if let Err(err) = spawned {
            tracing::warn!(error = %err, alias, "Failed to schedule pending bot, adding immediately");
            let mut inner = self.lock();
            let key = identity_key(alias);
            inner.scheduled.remove(&key);
            inner.confirmed.insert(key, alias.to_string());
        }
    }

    fn fire(&self, key: &str, ticket: u64, alias: String) {
        let mut inner = self.lock();
        if inner.scheduled.get(key) != Some(&ticket) {
            return;
        }
        inner.scheduled.remove(key);
        tracing::debug!(alias = %alias, "Bot confirmed online");
        inner.confirmed.insert(key.to_string(), alias);
    }

    /// Removes `alias` from the set, cancelling a scheduled insertion.
    pub fn take(&self, alias: &str) -> PendingState {
        let key = identity_key(alias);
        let mut inner = self.lock();
        if inner.confirmed.remove(&key).is_some() {
            inner.scheduled.remove(&key);
            PendingState::Confirmed
        } else if inner.scheduled.remove(&key).is_some() {
            PendingState::Cancelled
        } else {
            PendingState::Absent
        }
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.lock().confirmed.contains_key(&identity_key(alias))
    }

    pub fn is_scheduled(&self, alias: &str) -> bool {
        self.lock().scheduled.contains_key(&identity_key(alias))
    }

    /// Confirmed aliases, sorted.
    pub fn confirmed(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.lock().confirmed.values().cloned().collect();
        aliases.sort();
        aliases
    }

    /// Inserts aliases directly, skipping the delay.
    pub fn adopt<S: AsRef<str>>(&self, aliases: &[S]) {
        let mut inner = self.lock();
        for alias in aliases {
            let alias = alias.as_ref();
            inner.confirmed.insert(identity_key(alias), alias.to_string());
        }
    }

    /// Keeps only the aliases (confirmed or scheduled) for which `keep` holds.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) {
        let mut inner = self.lock();
        inner.confirmed.retain(|_, alias| keep(alias));
        inner.scheduled.retain(|key, _| keep(key));
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.confirmed.clear();
        inner.scheduled.clear();
    }

    fn lock(&self) -> MutexGuard<'_, PendingInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
