//! Plain-text rendering of sessions and rankings.

use seen_core::{BotFilter, Session, TopKind, TopQuery};

const UNITS: [&str; 4] = ["s", "min", "h", "d"];
const SCALES: [i64; 3] = [60, 60, 24];

/// Formats seconds as `1 d 2 h 3 min 4 s`, dropping leading zero units.
pub fn format_duration(secs: i64) -> String {
    let mut rest = secs.max(0);
    let mut values = Vec::with_capacity(UNITS.len());
    for scale in SCALES {
        values.push(rest % scale);
        rest /= scale;
        if rest == 0 {
            break;
        }
    }
    if rest != 0 {
        values.push(rest);
    }

    values
        .iter()
        .zip(UNITS)
        .rev()
        .map(|(value, unit)| format!("{} {}", value, unit))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn session_line(session: &Session, now: i64) -> String {
    let kind = if session.is_bot() { "Bot" } else { "Player" };
    let state = if session.is_online() {
        "has been online for"
    } else {
        "has been away for"
    };
    format!(
        "{} {} {} {}",
        kind,
        session.actual_name(),
        state,
        format_duration(session.elapsed(now))
    )
}

pub fn ranking_header(kind: TopKind, query: &TopQuery, max: usize) -> String {
    let mut scope = match query.filter {
        BotFilter::Human => "players".to_string(),
        BotFilter::Bot => "bots".to_string(),
        BotFilter::All => "players and bots".to_string(),
    };
    if query.merge {
        scope.push_str(", merged");
    }
    match kind {
        TopKind::Liver => format!("Online {}:", scope),
        TopKind::Seen if query.full => format!("Away the longest ({}):", scope),
        TopKind::Seen => format!("Top {} away the longest ({}):", max, scope),
    }
}

pub fn ranking(header: &str, sessions: &[Session], now: i64) -> String {
    let mut lines = vec![header.to_string()];
    lines.extend(
        sessions
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, session_line(s, now))),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_durations() {
        assert_eq!(format_duration(0), "0 s");
        assert_eq!(format_duration(500), "8 min 20 s");
        assert_eq!(format_duration(3600), "1 h 0 min 0 s");
        assert_eq!(format_duration(90_061), "1 d 1 h 1 min 1 s");
    }

    #[test]
    fn test_renders_session_line() {
        let session = Session {
            name: "Steve@bot".to_string(),
            joined: 1000,
            left: 0,
        };
        assert_eq!(
            session_line(&session, 1060),
            "Bot Steve has been online for 1 min 0 s"
        );
    }

    #[test]
    fn test_renders_numbered_ranking() {
        let sessions = vec![Session {
            name: "Steve".to_string(),
            joined: 1000,
            left: 1500,
        }];
        let text = ranking("Header:", &sessions, 2000);
        assert_eq!(text, "Header:\n1. Player Steve has been away for 8 min 20 s");
    }
}
