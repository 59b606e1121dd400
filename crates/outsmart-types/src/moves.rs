//! The structured form of one agent's intention for a round.
//!
//! Agents answer in JSON using human-readable keys (`"give coin to"` and
//! friends). The serde renames below are the single mapping between those
//! keys and the internal field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Wire names of the fields in an agent's JSON response.
pub mod fields {
    /// Private reasoning, never shown to the other agents.
    pub const STRATEGY: &str = "secret strategy";
    /// The agent that receives this agent's coin.
    pub const GIVE: &str = "give coin to";
    /// The agent this agent takes a coin from.
    pub const TAKE: &str = "take coin from";
    /// Recipient name -> message text.
    pub const MESSAGES: &str = "private messages";
}

/// A validated move for a single round.
///
/// Produced by the move parser from an agent's raw response. Legality
/// (known names, `give != take`) is enforced by the parser, not by this
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Free-text strategy, private to the agent.
    #[serde(rename = "secret strategy")]
    pub strategy: String,
    /// Name of the agent receiving a coin.
    #[serde(rename = "give coin to")]
    pub give: String,
    /// Name of the agent losing a coin to this one.
    #[serde(rename = "take coin from")]
    pub take: String,
    /// Private messages keyed by recipient name.
    ///
    /// One entry per other agent is requested but not enforced.
    #[serde(rename = "private messages")]
    pub messages: BTreeMap<String, String>,
}
