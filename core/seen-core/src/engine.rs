//! SeenEngine - the single writer for presence state.
//!
//! Hosts deliver join, leave, reconcile and remove events from independent
//! threads. The engine is:
//! - **Serialized**: every mutation runs under one write lock, so no two
//!   updates interleave on a session
//! - **Snapshot-read**: queries clone the sessions under a read lock and rank
//!   the copy, never observing a half-applied mutation
//! - **Write-behind**: the persistable records are copied under the lock and
//!   written after it is released; a snapshot older than the one already on
//!   disk is skipped
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use seen_core::{SeenConfig, SeenEngine, SeenPaths};
//!
//! let paths = SeenPaths::under(Path::new("."));
//! let config = SeenConfig::load(&paths.config_file)?;
//! let engine = SeenEngine::open(config, paths.persistence())?;
//! engine.join("Steve", seen_core::now_secs())?;
//! let away = engine.top(TopKind::Seen, &TopQuery::default());
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::SeenConfig;
use crate::error::{Result, SeenError};
use crate::events::PresenceEvent;
use crate::identity::{
    actual_name, bot_alias, has_bot_marker, identity_key, is_valid_name, BotClassifier,
    HeuristicClassifier,
};
use crate::ranking::{self, BotFilter, TopKind, TopQuery};
use crate::state::{PendingBots, PendingState, Persistence, Session, SessionRecord, SessionStore};

const AUDIT_TARGET: &str = "seen::audit";

/// Current time in whole seconds since the Unix epoch.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Sessions whose online state a reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub went_offline: Vec<String>,
    pub went_online: Vec<String>,
}

pub struct SeenEngine {
    config: SeenConfig,
    store: RwLock<SessionStore>,
    pending: PendingBots,
    persistence: Option<Persistence>,
    generation: AtomicU64,
    /// Generation of the snapshot last written to disk.
    saved_generation: Mutex<u64>,
}

impl SeenEngine {
    /// Creates an engine with no backing file. Used for tests and embedding.
    pub fn new_in_memory(config: SeenConfig) -> Self {
        Self::with_parts(config, SessionStore::new(), None)
    }

    /// Loads the store through `persistence`, migrating legacy files once.
    /// Legacy records the [`HeuristicClassifier`] flags are renamed to their
    /// bot alias during that migration.
    pub fn open(config: SeenConfig, persistence: Persistence) -> Result<Self> {
        Self::open_with_classifier(config, persistence, Box::new(HeuristicClassifier))
    }

    pub fn open_with_classifier(
        config: SeenConfig,
        persistence: Persistence,
        classifier: Box<dyn BotClassifier>,
    ) -> Result<Self> {
        let store = persistence.load(classifier.as_ref())?;
        tracing::info!(
            path = %persistence.store_file().display(),
            sessions = store.len(),
            "Session store loaded"
        );
        Ok(Self::with_parts(config, store, Some(persistence)))
    }

    fn with_parts(config: SeenConfig, store: SessionStore, persistence: Option<Persistence>) -> Self {
        SeenEngine {
            config,
            store: RwLock::new(store),
            pending: PendingBots::new(),
            persistence,
            generation: AtomicU64::new(0),
            saved_generation: Mutex::new(0),
        }
    }

    pub fn config(&self) -> &SeenConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Inbound events
    // ─────────────────────────────────────────────────────────────────────────────

    /// Records a join under `name` exactly as delivered. A bot alias is also
    /// scheduled into the pending-bot set so the plain-name leave that
    /// follows is routed back to it.
    ///
    /// The mutation is always applied; an `Err` other than
    /// [`SeenError::InvalidIdentity`] only reports a failed save.
    pub fn join(&self, name: &str, now: i64) -> Result<Session> {
        ensure_valid(name)?;

        let is_bot = has_bot_marker(name);
        let delay = self.config.bot_list_delay();
        let (session, snapshot) = self.mutate(|store| {
            let session = store.join(name, now).clone();
            if is_bot {
                self.pending.schedule(&session.name, delay);
            }
            session
        });
        self.audit(format_args!("Player {} joined the game", session.name));

        self.persist(snapshot)?;
        Ok(session)
    }

    /// Records a join seen on a connection. With `identify_bot`, a player
    /// connecting from the server's own address is a bot spawned in-game and
    /// is tracked under its bot alias.
    pub fn join_connection(&self, name: &str, local: bool, now: i64) -> Result<Session> {
        if local && self.config.identify_bot {
            self.join(&bot_alias(name), now)
        } else {
            self.join(name, now)
        }
    }

    /// Records a leave. If the bot alias of `name` is in the pending-bot set
    /// the leave belongs to the bot. If the alias was still waiting for its
    /// delay, the scheduled insertion is cancelled and the leave goes to
    /// whichever of the two identities is online, the human first.
    pub fn leave(&self, name: &str, now: i64) -> Result<Session> {
        ensure_valid(name)?;

        let (session, snapshot) = self.mutate(|store| {
            let key = if has_bot_marker(name) {
                self.pending.take(name);
                name.to_string()
            } else {
                let alias = bot_alias(name);
                match self.pending.take(&alias) {
                    PendingState::Confirmed => alias,
                    PendingState::Cancelled => {
                        let online = |n: &str| store.get(n).is_some_and(Session::is_online);
                        if !online(name) && online(&alias) {
                            alias
                        } else {
                            name.to_string()
                        }
                    }
                    PendingState::Absent => name.to_string(),
                }
            };
            store.leave(&key, now).clone()
        });
        self.audit(format_args!("Player {} left the game", session.name));

        self.persist(snapshot)?;
        Ok(session)
    }

    /// Brings online state in line with `active`, the names actually present.
    ///
    /// Online sessions whose base name is not active are forced offline;
    /// active names with neither their human nor bot session online are forced
    /// online. Called at startup with the live roster and at shutdown with an
    /// empty one.
    pub fn reconcile<S: AsRef<str>>(&self, active: &[S], now: i64) -> Result<Reconciled> {
        let active: Vec<&str> = active
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| {
                let valid = is_valid_name(name);
                if !valid {
                    tracing::warn!(name = %name, "Skipping invalid name in roster");
                }
                valid
            })
            .collect();
        let active_keys: HashSet<String> = active
            .iter()
            .map(|name| identity_key(actual_name(name)))
            .collect();

        let (result, snapshot) = self.mutate(|store| {
            let mut result = Reconciled::default();

            let stale: Vec<String> = store
                .online_sessions()
                .filter(|s| !active_keys.contains(&identity_key(s.actual_name())))
                .map(|s| s.name.clone())
                .collect();
            for name in stale {
                store.leave(&name, now);
                tracing::info!(player = %name, "Corrected player status to offline");
                result.went_offline.push(name);
            }

            let mut seen_keys = HashSet::new();
            for &name in &active {
                if !seen_keys.insert(identity_key(name)) {
                    continue;
                }
                let online = |n: &str| store.get(n).is_some_and(Session::is_online);
                if online(name) || online(&bot_alias(name)) {
                    continue;
                }
                let joined = store.join(name, now).name.clone();
                tracing::info!(player = %joined, "Corrected player status to online");
                result.went_online.push(joined);
            }

            self.pending
                .retain(|alias| active_keys.contains(&identity_key(actual_name(alias))));
            result
        });

        self.persist(snapshot)?;
        Ok(result)
    }

    /// Deletes the named sessions outright. Operator correction only.
    pub fn remove<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        let (removed, snapshot) = self.mutate(|store| {
            let removed = store.remove(names);
            for alias in removed.iter().filter(|name| has_bot_marker(name)) {
                self.pending.take(alias);
            }
            removed
        });
        tracing::debug!(
            count = removed.len(),
            players = %removed.join(", "),
            "Removed players' data"
        );

        self.persist(snapshot)?;
        Ok(removed)
    }

    /// Dispatches a host event; `at` defaults to now.
    pub fn apply(&self, event: PresenceEvent) -> Result<()> {
        match event {
            PresenceEvent::Join { name, at, local } => self
                .join_connection(&name, local, at.unwrap_or_else(now_secs))
                .map(drop),
            PresenceEvent::Leave { name, at } => {
                self.leave(&name, at.unwrap_or_else(now_secs)).map(drop)
            }
            PresenceEvent::Reconcile { names, at } => {
                self.reconcile(&names, at.unwrap_or_else(now_secs)).map(drop)
            }
            PresenceEvent::Remove { names } => self.remove(&names).map(drop),
        }
    }

    /// Forces every session offline, drops pending bots and saves.
    pub fn shutdown(&self, now: i64) -> Result<()> {
        let no_one: [&str; 0] = [];
        self.reconcile(&no_one, now)?;
        self.pending.clear();
        Ok(())
    }

    /// Writes the current state regardless of pending changes.
    pub fn save(&self) -> Result<()> {
        let (_, snapshot) = self.mutate(|_| ());
        self.persist(snapshot)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn get(&self, name: &str) -> Option<Session> {
        self.read_store().get(name).cloned()
    }

    /// The human session and the bot session for a base name, whichever exist.
    pub fn lookup(&self, name: &str) -> Vec<Session> {
        let store = self.read_store();
        let base = actual_name(name);
        [store.get(base), store.get(&bot_alias(base))]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Session> {
        self.read_store().all_sessions().cloned().collect()
    }

    pub fn seen_top(&self, filter: BotFilter) -> Vec<Session> {
        ranking::seen_top(&self.snapshot(), filter)
    }

    pub fn liver_top(&self, filter: BotFilter) -> Vec<Session> {
        ranking::liver_top(&self.snapshot(), filter)
    }

    /// Merges bot and human sessions sharing a base name, honoring
    /// `player_prior_in_merge`.
    pub fn merge(&self, sessions: Vec<Session>) -> Vec<Session> {
        ranking::merge(sessions, self.config.player_prior_in_merge)
    }

    /// Runs a parsed ranking query, truncated to `seen_top_max` unless full.
    pub fn top(&self, kind: TopKind, query: &TopQuery) -> Vec<Session> {
        let mut ranked = match kind {
            TopKind::Seen => self.seen_top(query.filter),
            TopKind::Liver => self.liver_top(query.filter),
        };
        if query.merge {
            ranked = self.merge(ranked);
            if kind == TopKind::Liver {
                ranked = ranking::liver_top(&ranked, BotFilter::All);
            }
        }
        if !query.full {
            ranked.truncate(self.config.seen_top_max);
        }
        ranked
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Pending bots
    // ─────────────────────────────────────────────────────────────────────────────

    /// Bot aliases currently believed online, for handing over to a reloaded engine.
    pub fn pending_bots(&self) -> Vec<String> {
        self.pending.confirmed()
    }

    pub fn adopt_pending_bots<S: AsRef<str>>(&self, aliases: &[S]) {
        self.pending.adopt(aliases);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────────

    fn mutate<R>(&self, apply: impl FnOnce(&mut SessionStore) -> R) -> (R, Option<Snapshot>) {
        let mut store = self.write_store();
        let result = apply(&mut store);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.persistence.as_ref().map(|_| Snapshot {
            generation,
            records: store.records(),
        });
        (result, snapshot)
    }

    fn persist(&self, snapshot: Option<Snapshot>) -> Result<()> {
        let (Some(persistence), Some(snapshot)) = (&self.persistence, snapshot) else {
            return Ok(());
        };

        let mut saved = self
            .saved_generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *saved >= snapshot.generation {
            return Ok(());
        }

        match persistence.save(&snapshot.records) {
            Ok(()) => {
                *saved = snapshot.generation;
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    path = %persistence.store_file().display(),
                    "Failed to save session store; in-memory state kept"
                );
                Err(err)
            }
        }
    }

    fn audit(&self, message: std::fmt::Arguments<'_>) {
        if self.config.log_seens {
            tracing::info!(target: AUDIT_TARGET, "{}", message);
        }
    }

    fn read_store(&self) -> RwLockReadGuard<'_, SessionStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, SessionStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> &PendingBots {
        &self.pending
    }
}

struct Snapshot {
    generation: u64,
    records: BTreeMap<String, SessionRecord>,
}

fn ensure_valid(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(SeenError::InvalidIdentity(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeenPaths;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn config_with_delay(delay: f64) -> SeenConfig {
        SeenConfig {
            bot_list_delay: delay,
            ..SeenConfig::default()
        }
    }

    fn engine() -> SeenEngine {
        SeenEngine::new_in_memory(config_with_delay(0.0))
    }

    #[test]
    fn test_join_marks_online() {
        let engine = engine();
        engine.join("Notch", 1000).unwrap();
        let session = engine.get("Notch").unwrap();
        assert!(session.is_online());
        assert_eq!(session.target(), 1000);
    }

    #[test]
    fn test_join_then_leave() {
        let engine = engine();
        engine.join("Notch", 1000).unwrap();
        engine.leave("Notch", 1500).unwrap();
        let session = engine.get("Notch").unwrap();
        assert!(!session.is_online());
        assert_eq!(session.target(), 1500);
        assert_eq!(session.elapsed(2000), 500);
    }

    #[test]
    fn test_leave_without_join_backfills() {
        let engine = engine();
        let session = engine.leave("Notch", 1500).unwrap();
        assert_eq!(session.joined, 1499);
        assert!(!session.is_online());
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let engine = engine();
        engine.join("Dinnerbone", 10).unwrap();
        assert_eq!(engine.get("dinnerbone"), engine.get("Dinnerbone"));
        assert!(engine.get("Jeb").is_none());
    }

    #[test]
    fn test_invalid_name_rejected() {
        let engine = engine();
        let err = engine.join("not a name", 10).unwrap_err();
        assert!(matches!(err, SeenError::InvalidIdentity(_)));
        assert!(engine.snapshot().is_empty());
    }

    #[test]
    fn test_join_keeps_name_as_delivered() {
        // Names the bot heuristic would flag are still human joins.
        let engine = SeenEngine::new_in_memory(SeenConfig::default());
        engine.join("Steve", 1000).unwrap();
        assert!(engine.get("Steve").unwrap().is_online());

        engine.leave("Steve", 1500).unwrap();
        let steve = engine.get("Steve").unwrap();
        assert!(!steve.is_online());
        assert_eq!(steve.target(), 1500);
        assert!(engine.get("Steve@bot").is_none());

        engine.join("Bob", 10).unwrap();
        assert!(engine.get("Bob").unwrap().is_online());
        assert!(engine.pending_bots().is_empty());
    }

    #[test]
    fn test_bot_join_routes_plain_leave_to_alias() {
        let engine = engine();
        let session = engine.join("IronFarm01@bot", 100).unwrap();
        assert_eq!(session.name, "IronFarm01@bot");
        assert!(engine.pending().contains("IronFarm01@bot"));

        // Hosts report the plain name on leave.
        let session = engine.leave("IronFarm01", 200).unwrap();
        assert_eq!(session.name, "IronFarm01@bot");
        assert!(!session.is_online());
        assert!(engine.get("IronFarm01").is_none());
        assert!(!engine.pending().contains("IronFarm01@bot"));
    }

    #[test]
    fn test_local_connection_joins_as_bot() {
        let engine = engine();
        let session = engine.join_connection("Steve", true, 100).unwrap();
        assert_eq!(session.name, "Steve@bot");
        assert_eq!(engine.pending_bots(), vec!["Steve@bot"]);

        let session = engine.join_connection("Alex", false, 100).unwrap();
        assert_eq!(session.name, "Alex");
    }

    #[test]
    fn test_bot_identification_can_be_disabled() {
        let engine = SeenEngine::new_in_memory(SeenConfig {
            identify_bot: false,
            ..config_with_delay(0.0)
        });
        let session = engine.join_connection("Steve", true, 100).unwrap();
        assert_eq!(session.name, "Steve");
        assert!(engine.pending_bots().is_empty());
    }

    #[test]
    fn test_oversized_bot_delay_confirms_immediately() {
        let engine = SeenEngine::new_in_memory(config_with_delay(1e20));
        engine.join("Notch@bot", 100).unwrap();
        assert!(engine.pending().contains("Notch@bot"));
        assert!(engine.get("Notch@bot").unwrap().is_online());
    }

    #[test]
    fn test_leave_before_bot_delay_cancels_pending() {
        let engine = SeenEngine::new_in_memory(config_with_delay(0.2));
        // The human hands their name to a bot; the bot join arrives first.
        engine.join("Notch", 100).unwrap();
        engine.join("Notch@bot", 101).unwrap();
        engine.leave("Notch", 101).unwrap();

        assert!(!engine.get("Notch").unwrap().is_online());
        assert!(engine.get("Notch@bot").unwrap().is_online());

        thread::sleep(Duration::from_millis(400));
        assert!(engine.pending_bots().is_empty());
    }

    #[test]
    fn test_cancelled_bot_leave_goes_to_bot_when_human_offline() {
        let engine = SeenEngine::new_in_memory(config_with_delay(5.0));
        engine.join("Notch@bot", 100).unwrap();
        let session = engine.leave("Notch", 101).unwrap();
        assert_eq!(session.name, "Notch@bot");
        assert!(!engine.pending().is_scheduled("Notch@bot"));
    }

    #[test]
    fn test_reconcile_empty_forces_offline() {
        let engine = engine();
        engine.join("Notch", 100).unwrap();
        engine.join("IronFarm01@bot", 100).unwrap();

        let result = engine.reconcile::<&str>(&[], 500).unwrap();
        assert_eq!(result.went_offline.len(), 2);
        for session in engine.snapshot() {
            assert!(!session.is_online());
            assert_eq!(session.left, 500);
        }
        assert!(engine.pending_bots().is_empty());
    }

    #[test]
    fn test_reconcile_brings_roster_online() {
        let engine = engine();
        engine.join("Alice", 100).unwrap();
        engine.leave("Alice", 200).unwrap();

        let result = engine.reconcile(&["Alice"], 300).unwrap();
        assert_eq!(result.went_online, vec!["Alice"]);
        let alice = engine.get("Alice").unwrap();
        assert!(alice.is_online());
        assert_eq!(alice.joined, 300);
    }

    #[test]
    fn test_reconcile_keeps_online_bot_for_active_name() {
        let engine = engine();
        engine.join("IronFarm01@bot", 100).unwrap();

        let result = engine.reconcile(&["IronFarm01"], 300).unwrap();
        assert_eq!(result, Reconciled::default());
        assert!(engine.get("IronFarm01@bot").unwrap().is_online());
        assert!(engine.get("IronFarm01").is_none());
    }

    #[test]
    fn test_remove_deletes_sessions() {
        let engine = engine();
        engine.join("Alice", 100).unwrap();
        let removed = engine.remove(&["alice", "Nobody"]).unwrap();
        assert_eq!(removed, vec!["Alice"]);
        assert!(engine.get("Alice").is_none());
    }

    #[test]
    fn test_remove_human_keeps_pending_bot() {
        let engine = engine();
        engine.join("Steve", 100).unwrap();
        engine.leave("Steve", 150).unwrap();
        engine.join("Steve@bot", 200).unwrap();

        let removed = engine.remove(&["Steve"]).unwrap();
        assert_eq!(removed, vec!["Steve"]);
        assert!(engine.pending().contains("Steve@bot"));

        let session = engine.leave("Steve", 300).unwrap();
        assert_eq!(session.name, "Steve@bot");
        assert!(!engine.get("Steve@bot").unwrap().is_online());
        assert!(engine.get("Steve").is_none());
    }

    #[test]
    fn test_remove_bot_drops_pending_alias() {
        let engine = engine();
        engine.join("Steve@bot", 100).unwrap();

        engine.remove(&["steve@bot"]).unwrap();
        assert!(engine.pending_bots().is_empty());
        assert!(engine.get("Steve@bot").is_none());
    }

    #[test]
    fn test_lookup_returns_human_and_bot() {
        let engine = engine();
        engine.join("Notch", 100).unwrap();
        engine.join("Notch@bot", 200).unwrap();
        let found: Vec<String> = engine.lookup("notch").into_iter().map(|s| s.name).collect();
        assert_eq!(found, vec!["Notch", "Notch@bot"]);
        assert!(engine.lookup("Jeb").is_empty());
    }

    #[test]
    fn test_top_truncates_unless_full() {
        let engine = SeenEngine::new_in_memory(SeenConfig {
            seen_top_max: 2,
            ..config_with_delay(0.0)
        });
        for (i, name) in ["Alice", "Bobby", "Carol"].iter().enumerate() {
            engine.leave(name, 100 + i as i64).unwrap();
        }

        let top = engine.top(TopKind::Seen, &TopQuery::default());
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Alice");

        let full = TopQuery::parse("-full", TopKind::Seen).unwrap();
        assert_eq!(engine.top(TopKind::Seen, &full).len(), 3);
    }

    #[test]
    fn test_top_merge() {
        let engine = engine();
        engine.join("Notch", 100).unwrap();
        engine.leave("Notch", 200).unwrap();
        engine.join("Notch@bot", 300).unwrap();
        engine.leave("Notch@bot", 400).unwrap();

        let query = TopQuery::parse("-merge", TopKind::Seen).unwrap();
        let top = engine.top(TopKind::Seen, &query);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Notch");
    }

    #[test]
    fn test_liver_merge_keeps_most_recent_first() {
        let engine = engine();
        engine.join("Alice", 100).unwrap();
        engine.join("Bobby", 300).unwrap();
        engine.join("Alice@bot", 200).unwrap();

        let query = TopQuery::parse("-merge", TopKind::Liver).unwrap();
        let live: Vec<String> = engine
            .top(TopKind::Liver, &query)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(live, vec!["Bobby", "Alice"]);
    }

    #[test]
    fn test_apply_dispatches_events() {
        let engine = engine();
        engine
            .apply(PresenceEvent::Join {
                name: "Notch".to_string(),
                at: Some(10),
                local: false,
            })
            .unwrap();
        engine
            .apply(PresenceEvent::Leave {
                name: "Notch".to_string(),
                at: Some(20),
            })
            .unwrap();
        assert_eq!(engine.get("Notch").unwrap().target(), 20);

        engine
            .apply(PresenceEvent::Remove {
                names: vec!["Notch".to_string()],
            })
            .unwrap();
        assert!(engine.get("Notch").is_none());
    }

    #[test]
    fn test_mutations_persist_and_reload() {
        let temp = tempdir().unwrap();
        let paths = SeenPaths::under(temp.path());

        {
            let engine = SeenEngine::open(config_with_delay(0.0), paths.persistence()).unwrap();
            engine.join("Notch", 1000).unwrap();
            engine.leave("Notch", 1500).unwrap();
            engine.join("Alice", 1200).unwrap();
            engine.shutdown(1600).unwrap();
        }

        let engine = SeenEngine::open(SeenConfig::default(), paths.persistence()).unwrap();
        let notch = engine.get("Notch").unwrap();
        assert_eq!((notch.joined, notch.left), (1000, 1500));
        let alice = engine.get("Alice").unwrap();
        assert!(!alice.is_online());
        assert_eq!(alice.left, 1600);
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let temp = tempdir().unwrap();
        let paths = SeenPaths::under(temp.path());
        let engine = SeenEngine::open(SeenConfig::default(), paths.persistence()).unwrap();
        engine.join("Notch", 1000).unwrap();

        // Replace the data directory with a plain file so saves cannot succeed.
        std::fs::remove_dir_all(&paths.data_dir).unwrap();
        std::fs::write(&paths.data_dir, "blocker").unwrap();

        let err = engine.leave("Notch", 2000).unwrap_err();
        assert!(matches!(err, SeenError::PersistenceWriteFailure { .. }));
        assert!(!engine.get("Notch").unwrap().is_online());
    }
}
