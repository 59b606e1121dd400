//! The per-agent, per-round ledger entry.
//!
//! The referee creates one [`TurnRecord`] per agent at the start of each
//! round, fills it in during settlement, and hands it to the agent's
//! history once the round is complete. After that it is never mutated.
//!
//! The [`Display`](std::fmt::Display) impl renders the recap an agent is
//! shown about its own round in later prompts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::moves::Move;

/// Outcome of one round from a single agent's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// The agent this record belongs to.
    pub name: String,
    /// Round number, starting at 1.
    pub round: u32,
    /// True if the agent's move could not be produced, parsed, or validated.
    pub is_invalid: bool,
    /// The agent's move. Present iff `is_invalid` is false.
    #[serde(rename = "move")]
    pub mv: Option<Move>,
    /// Agents that gave this agent a coin.
    pub givers: Vec<String>,
    /// Agents that took a coin from this agent.
    pub takers: Vec<String>,
    /// Agents this agent formed an alliance with.
    pub alliance_partners: Vec<String>,
    /// Agents that formed an alliance against this agent.
    pub allied_against: Vec<String>,
    /// Private messages received as `(sender, text)`, in delivery order.
    pub received_messages: Vec<(String, String)>,
}

impl TurnRecord {
    /// A record for an agent whose move was accepted.
    pub fn valid(name: impl Into<String>, round: u32, mv: Move) -> Self {
        Self {
            mv: Some(mv),
            ..Self::empty(name.into(), round, false)
        }
    }

    /// A record for an agent whose move was not processed.
    pub fn invalid(name: impl Into<String>, round: u32) -> Self {
        Self::empty(name.into(), round, true)
    }

    fn empty(name: String, round: u32, is_invalid: bool) -> Self {
        Self {
            name,
            round,
            is_invalid,
            mv: None,
            givers: Vec::new(),
            takers: Vec::new(),
            alliance_partners: Vec::new(),
            allied_against: Vec::new(),
            received_messages: Vec::new(),
        }
    }

    /// The accepted move, if any.
    pub const fn accepted_move(&self) -> Option<&Move> {
        if self.is_invalid {
            None
        } else {
            self.mv.as_ref()
        }
    }
}

impl fmt::Display for TurnRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recap of Turn {}", self.round)?;
        writeln!(f)?;
        writeln!(f, "Your actions:")?;
        match self.accepted_move() {
            None => writeln!(
                f,
                "You provided invalid JSON, so your move was not processed"
            )?,
            Some(mv) => {
                writeln!(f, "Your secret strategy: {}", mv.strategy)?;
                writeln!(f, "You gave a coin to {}", mv.give)?;
                writeln!(f, "You took a coin from {}", mv.take)?;
                writeln!(f, "You sent these private messages:")?;
                for (recipient, message) in &mv.messages {
                    writeln!(f, "Message to {recipient}: {message}")?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Results of the turn:")?;
        if self.givers.is_empty() {
            writeln!(f, "No players gave you coins")?;
        } else {
            writeln!(f, "These players gave you a coin: {}", self.givers.join(", "))?;
        }
        if self.takers.is_empty() {
            writeln!(f, "No players took coins from you")?;
        } else {
            writeln!(
                f,
                "These players took a coin from you: {}",
                self.takers.join(", ")
            )?;
        }
        if !self.alliance_partners.is_empty() {
            writeln!(
                f,
                "These players formed an alliance with you: {}",
                self.alliance_partners.join(", ")
            )?;
        }
        if !self.allied_against.is_empty() {
            writeln!(
                f,
                "These players formed an alliance against you: {}",
                self.allied_against.join(", ")
            )?;
        }

        writeln!(f, "You received these private messages:")?;
        for (sender, message) in &self.received_messages {
            writeln!(f, "Message from {sender}: {message}")?;
        }
        writeln!(f)
    }
}
