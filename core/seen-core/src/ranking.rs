//! Ranking queries over a session snapshot.
//!
//! - [`seen_top`]: offline sessions, longest away first
//! - [`liver_top`]: online sessions, most recent join first
//! - [`merge`]: collapse a bot and a human sharing a base name into one entry
//!
//! All functions are pure; callers pass a snapshot taken under the store lock.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Result, SeenError};
use crate::identity::identity_key;
use crate::state::Session;

/// Which identities a ranking includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotFilter {
    #[default]
    Human,
    Bot,
    All,
}

impl BotFilter {
    pub fn matches(self, session: &Session) -> bool {
        match self {
            BotFilter::Human => !session.is_bot(),
            BotFilter::Bot => session.is_bot(),
            BotFilter::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKind {
    /// Offline identities ranked by time away.
    Seen,
    /// Online identities.
    Liver,
}

/// Parsed ranking options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopQuery {
    pub filter: BotFilter,
    pub merge: bool,
    pub full: bool,
}

impl TopQuery {
    /// Parses the option tokens `-bot`, `-all`, `-merge` and `-full`.
    ///
    /// `-bot`, `-all` and `-merge` are mutually exclusive, `-full` is only
    /// meaningful for [`TopKind::Seen`], and any other token is rejected.
    /// Liver rankings include bots unless `-bot` narrows them.
    pub fn parse(args: &str, kind: TopKind) -> Result<TopQuery> {
        let illegal = || SeenError::ConflictingQueryArguments(args.to_string());

        let (mut bot, mut all, mut merge, mut full) = (false, false, false, false);
        for token in args.split_whitespace() {
            let flag = match token {
                "-bot" => &mut bot,
                "-all" => &mut all,
                "-merge" => &mut merge,
                "-full" => &mut full,
                _ => return Err(illegal()),
            };
            if *flag {
                return Err(illegal());
            }
            *flag = true;
        }

        let exclusive = [bot, all, merge].iter().filter(|set| **set).count();
        if exclusive > 1 || (full && kind == TopKind::Liver) {
            return Err(illegal());
        }

        let filter = if bot {
            BotFilter::Bot
        } else if all || merge || kind == TopKind::Liver {
            BotFilter::All
        } else {
            BotFilter::Human
        };

        Ok(TopQuery {
            filter,
            merge,
            full,
        })
    }
}

fn by_target(a: &Session, b: &Session) -> Ordering {
    a.target()
        .cmp(&b.target())
        .then_with(|| a.name.cmp(&b.name))
}

/// Offline sessions matching `filter`, ascending by leave time.
pub fn seen_top<'a>(
    sessions: impl IntoIterator<Item = &'a Session>,
    filter: BotFilter,
) -> Vec<Session> {
    let mut ranked: Vec<Session> = sessions
        .into_iter()
        .filter(|s| !s.is_online() && !s.is_empty() && filter.matches(s))
        .cloned()
        .collect();
    ranked.sort_by(by_target);
    ranked
}

/// Online sessions matching `filter`, descending by join time.
pub fn liver_top<'a>(
    sessions: impl IntoIterator<Item = &'a Session>,
    filter: BotFilter,
) -> Vec<Session> {
    let mut ranked: Vec<Session> = sessions
        .into_iter()
        .filter(|s| s.is_online() && filter.matches(s))
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        b.target()
            .cmp(&a.target())
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}

/// Keeps one session per base name, ascending by target.
///
/// With `player_prior` the human session always wins a collision; otherwise
/// the session with the larger target wins, the human on a tie.
pub fn merge(sessions: impl IntoIterator<Item = Session>, player_prior: bool) -> Vec<Session> {
    let mut merged: HashMap<String, Session> = HashMap::new();

    for session in sessions {
        let key = identity_key(session.actual_name());
        let replace = match merged.get(&key) {
            None => true,
            Some(existing) if player_prior => existing.is_bot() && !session.is_bot(),
            Some(existing) => match session.target().cmp(&existing.target()) {
                Ordering::Greater => true,
                Ordering::Equal => existing.is_bot() && !session.is_bot(),
                Ordering::Less => false,
            },
        };
        if replace {
            merged.insert(key, session);
        }
    }

    let mut ranked: Vec<Session> = merged.into_values().collect();
    ranked.sort_by(by_target);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(name: &str, joined: i64, left: i64) -> Session {
        Session {
            name: name.to_string(),
            joined,
            left,
        }
    }

    fn names(sessions: &[Session]) -> Vec<&str> {
        sessions.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_seen_top_orders_longest_away_first() {
        let sessions = vec![
            session("Alice", 100, 500),
            session("Bob", 100, 200),
            session("Carol", 900, 300),
            session("Dave@bot", 100, 150),
        ];
        let ranked = seen_top(&sessions, BotFilter::Human);
        assert_eq!(names(&ranked), vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_seen_top_filters() {
        let sessions = vec![
            session("Alice", 100, 500),
            session("Dave@bot", 100, 150),
        ];
        assert_eq!(names(&seen_top(&sessions, BotFilter::Bot)), vec!["Dave@bot"]);
        assert_eq!(
            names(&seen_top(&sessions, BotFilter::All)),
            vec!["Dave@bot", "Alice"]
        );
    }

    #[test]
    fn test_liver_top_orders_by_join_descending() {
        let sessions = vec![
            session("Alice", 300, 0),
            session("Bob", 500, 100),
            session("Carol", 100, 200),
            session("Dave@bot", 400, 0),
        ];
        let ranked = liver_top(&sessions, BotFilter::All);
        assert_eq!(names(&ranked), vec!["Bob", "Dave@bot", "Alice"]);
    }

    #[test]
    fn test_merge_prefers_player_when_configured() {
        let bot = session("Steve@bot", 900, 0);
        let human = session("Steve", 100, 200);
        let merged = merge(vec![bot.clone(), human.clone()], true);
        assert_eq!(merged, vec![human.clone()]);

        let merged = merge(vec![human.clone(), bot], true);
        assert_eq!(merged, vec![human]);
    }

    #[test]
    fn test_merge_prefers_larger_target_otherwise() {
        let bot = session("Steve@bot", 900, 0);
        let human = session("Steve", 100, 200);
        assert_eq!(merge(vec![human.clone(), bot.clone()], false), vec![bot]);

        let bot = session("Steve@bot", 10, 50);
        assert_eq!(merge(vec![bot, human.clone()], false), vec![human]);
    }

    #[test]
    fn test_merge_keeps_distinct_names_sorted() {
        let merged = merge(
            vec![
                session("Zed", 100, 700),
                session("Amy", 100, 300),
                session("Amy@bot", 100, 400),
            ],
            true,
        );
        assert_eq!(names(&merged), vec!["Amy", "Zed"]);
    }

    #[test]
    fn test_parse_defaults() {
        let query = TopQuery::parse("", TopKind::Seen).unwrap();
        assert_eq!(query, TopQuery::default());

        let query = TopQuery::parse("", TopKind::Liver).unwrap();
        assert_eq!(query.filter, BotFilter::All);
    }

    #[test]
    fn test_parse_options() {
        let query = TopQuery::parse("-merge -full", TopKind::Seen).unwrap();
        assert_eq!(
            query,
            TopQuery {
                filter: BotFilter::All,
                merge: true,
                full: true,
            }
        );
        assert_eq!(
            TopQuery::parse("-bot", TopKind::Liver).unwrap().filter,
            BotFilter::Bot
        );
    }

    #[test]
    fn test_parse_rejects_conflicts() {
        for args in ["-bot -all", "-all -merge", "-bot -merge", "-bot -bot", "-loud"] {
            let err = TopQuery::parse(args, TopKind::Seen).unwrap_err();
            assert!(matches!(err, SeenError::ConflictingQueryArguments(_)), "{args}");
        }
        assert!(TopQuery::parse("-full", TopKind::Liver).is_err());
    }
}
