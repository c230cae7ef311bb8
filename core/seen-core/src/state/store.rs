//! In-memory session map keyed by case-insensitive identity.
//!
//! The store itself is not thread-safe; [`crate::SeenEngine`] owns it behind a
//! lock and is the only mutation path in a running process.

use std::collections::{BTreeMap, HashMap};

use super::types::{Session, SessionRecord};
use crate::identity::identity_key;

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    pub fn get(&self, name: &str) -> Option<&Session> {
        self.sessions.get(&identity_key(name))
    }

    /// Returns the session for `name`, inserting a zeroed one if absent.
    /// An existing session keeps the spelling it was first seen with.
    pub fn get_or_create(&mut self, name: &str) -> &mut Session {
        self.sessions
            .entry(identity_key(name))
            .or_insert_with(|| Session::new(name))
    }

    pub fn join(&mut self, name: &str, now: i64) -> &Session {
        let session = self.get_or_create(name);
        session.join(now);
        session
    }

    pub fn leave(&mut self, name: &str, now: i64) -> &Session {
        let session = self.get_or_create(name);
        session.leave(now);
        session
    }

    /// Inserts a session as-is, replacing any session with the same identity.
    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(identity_key(&session.name), session);
    }

    /// Deletes the sessions for `names`; returns the names actually removed.
    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .filter_map(|name| self.sessions.remove(&identity_key(name.as_ref())))
            .map(|session| session.name)
            .collect()
    }

    pub fn all_sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn online_sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values().filter(|s| s.is_online())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Persistable view: empty sessions are dropped, keys sorted.
    pub fn records(&self) -> BTreeMap<String, SessionRecord> {
        self.sessions
            .values()
            .filter(|s| !s.is_empty())
            .map(|s| (s.name.clone(), s.to_record()))
            .collect()
    }

    pub(crate) fn from_records(records: impl IntoIterator<Item = (String, SessionRecord)>) -> Self {
        let mut store = SessionStore::new();
        for (name, record) in records {
            store.insert(Session::from_record(name, record));
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_has_no_sessions() {
        let store = SessionStore::new();
        assert!(store.get("abc").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_join_creates_session() {
        let mut store = SessionStore::new();
        store.join("Alice", 100);
        let session = store.get("Alice").unwrap();
        assert!(session.is_online());
        assert_eq!(session.target(), 100);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut store = SessionStore::new();
        store.join("Bob", 100);
        assert_eq!(store.get("bob"), store.get("Bob"));
        assert_eq!(store.get("BOB").unwrap().name, "Bob");

        store.leave("bOB", 200);
        assert_eq!(store.len(), 1);
        assert!(!store.get("Bob").unwrap().is_online());
    }

    #[test]
    fn test_get_or_create_inserts_zeroed_session() {
        let mut store = SessionStore::new();
        assert!(store.get_or_create("Carol").is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_records_skip_empty_sessions() {
        let mut store = SessionStore::new();
        store.get_or_create("Nobody");
        store.join("Alice", 100);
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records["Alice"], SessionRecord { joined: 100, left: 0 });
    }

    #[test]
    fn test_remove_deletes_matching_sessions() {
        let mut store = SessionStore::new();
        store.join("Alice", 100);
        store.join("Bob", 100);
        let removed = store.remove(&["alice", "Nobody"]);
        assert_eq!(removed, vec!["Alice".to_string()]);
        assert!(store.get("Alice").is_none());
        assert!(store.get("Bob").is_some());
    }

    #[test]
    fn test_bot_and_human_are_separate_sessions() {
        let mut store = SessionStore::new();
        store.join("Steve", 100);
        store.join("Steve@bot", 200);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("Steve").unwrap().joined, 100);
        assert_eq!(store.get("steve@BOT").unwrap().joined, 200);
    }
}
