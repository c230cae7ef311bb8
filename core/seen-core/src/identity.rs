//! Identity resolution: bot classification and bot-alias derivation.
//!
//! A bot and a human may share a base name ("Steve" and "Steve@bot"). They are
//! tracked as two independent identities and only correlated through
//! [`actual_name`] at query time.
//!
//! Classification sits behind the [`BotClassifier`] trait so the heuristic can
//! be swapped without touching the store or persistence code.

use crate::patterns::{RE_BOT_NAME_PATTERNS, RE_PLAYER_NAME};

/// Suffix that turns a base name into its bot identity key.
pub const BOT_MARKER: &str = "@bot";

const NAME_MIN_LEN: usize = 4;
const NAME_MAX_LEN: usize = 16;

/// Names of well-known fake players; any name contained in this string is a bot.
const BOT_BLACKLIST: &str =
    "A_Pi#nw#sw#SE#ne#nf#SandWall#storage#Steve#Alex#DuperMaster#Nya_Vanilla#Witch#Klio_5#######";

/// Decides whether a base name belongs to an automated player.
pub trait BotClassifier: Send + Sync {
    fn is_bot(&self, name: &str) -> bool;
}

/// Name-pattern heuristic. Known to misfire on short or pattern-matching human names.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl BotClassifier for HeuristicClassifier {
    fn is_bot(&self, name: &str) -> bool {
        let upper = name.to_uppercase();
        if BOT_BLACKLIST.to_uppercase().contains(&upper) {
            return true;
        }
        let len = name.chars().count();
        if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
            return true;
        }
        RE_BOT_NAME_PATTERNS.iter().any(|re| re.is_match(name))
    }
}

/// Returns the bot identity key for `name`.
pub fn bot_alias(name: &str) -> String {
    if has_bot_marker(name) {
        name.to_string()
    } else {
        format!("{}{}", name, BOT_MARKER)
    }
}

pub fn has_bot_marker(name: &str) -> bool {
    name.len() > BOT_MARKER.len() && name.ends_with(BOT_MARKER)
}

/// Strips the bot marker; identity for human names.
pub fn actual_name(name: &str) -> &str {
    if has_bot_marker(name) {
        &name[..name.len() - BOT_MARKER.len()]
    } else {
        name
    }
}

/// A player name is one or more word characters. The bot marker is ignored.
pub fn is_valid_name(name: &str) -> bool {
    RE_PLAYER_NAME.is_match(actual_name(name))
}

/// Case-insensitive lookup key for an identity.
pub(crate) fn identity_key(name: &str) -> String {
    name.to_lowercase()
}
