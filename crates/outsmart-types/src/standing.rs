//! Final standings of a finished game.
//!
//! These are the values handed to whatever stores finished games. Rank 0
//! is the winner and players tied on coins share a rank, so a game can
//! have several rank-0 entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Coins;

/// Identifier of a single game run (UUID v7, time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

impl GameId {
    /// Create a new identifier using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for GameId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One player's final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Player name.
    pub name: String,
    /// Model identifier backing the player.
    #[serde(rename = "llm")]
    pub model: String,
    /// Final coin total.
    pub coins: Coins,
    /// 0 for the winner(s); otherwise the number of players with more coins.
    pub rank: u32,
}

/// A finished game, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Identifier of this run.
    pub id: GameId,
    /// When the game finished.
    pub run_date: DateTime<Utc>,
    /// Number of rounds that were played.
    pub rounds_played: u32,
    /// Standings in roster order.
    pub results: Vec<Standing>,
}

/// Rank `(name, model, coins)` entries, preserving input order.
///
/// Uses competition ranking: a player's rank is the number of players
/// holding strictly more coins, so ties share a rank and everyone tied for
/// the most coins gets rank 0.
pub fn rank_standings(entries: Vec<(String, String, Coins)>) -> Vec<Standing> {
    let all_coins: Vec<Coins> = entries.iter().map(|(_, _, coins)| *coins).collect();
    entries
        .into_iter()
        .map(|(name, model, coins)| {
            let ahead = all_coins.iter().filter(|other| **other > coins).count();
            Standing {
                name,
                model,
                coins,
                rank: u32::try_from(ahead).unwrap_or(u32::MAX),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, coins: Coins) -> (String, String, Coins) {
        (name.to_owned(), String::from("model"), coins)
    }

    #[test]
    fn single_winner_gets_rank_zero() {
        let ranked = rank_standings(vec![entry("A", 15), entry("B", 13), entry("C", 7)]);
        let ranks: Vec<u32> = ranked.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn ties_share_rank() {
        let ranked = rank_standings(vec![
            entry("A", 14),
            entry("B", 14),
            entry("C", 10),
            entry("D", 10),
        ]);
        let ranks: Vec<u32> = ranked.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![0, 0, 2, 2]);
    }

    #[test]
    fn game_record_serializes_model_as_llm() {
        let record = GameRecord {
            id: GameId::new(),
            run_date: Utc::now(),
            rounds_played: 10,
            results: rank_standings(vec![entry("A", 1)]),
        };
        let json = serde_json::to_value(&record).unwrap_or_default();
        let first = json.get("results").and_then(|r| r.get(0));
        assert_eq!(
            first.and_then(|r| r.get("llm")).and_then(serde_json::Value::as_str),
            Some("model")
        );
    }
}
