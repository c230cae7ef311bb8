//! Compiled regex patterns for classifying player names.
//!
//! These patterns are compiled once on first use and reused for every
//! join event and every legacy record migrated at load.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Name Validation
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_PLAYER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// Bot Name Heuristics
// ═══════════════════════════════════════════════════════════════════════════════

/// Substrings and prefixes that mark a name as belonging to an automated player.
pub static RE_BOT_NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)farm",
        r"(?i)bot_",
        r"(?i)cam",
        r"(?i)_b_",
        r"(?i)bot-",
        r"(?i)bot\d",
        r"(?i)^bot",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});
