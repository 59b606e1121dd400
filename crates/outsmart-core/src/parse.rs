//! Agent response parsing into validated moves.
//!
//! Agents are asked to answer with a bare JSON object but often wrap it in
//! prose or a markdown fence. The parser keeps everything from the first
//! `{` to the last `}` and deserializes that into a [`Move`], then checks
//! the move is legal for the agent that made it.

use outsmart_types::Move;

use crate::error::MoveError;

/// Parse and validate a raw agent response.
///
/// `mover` is the agent that produced `raw`; `roster` holds every player
/// name in the game (including `mover`).
///
/// # Errors
///
/// - [`MoveError::Malformed`] if no JSON object can be found, it is not
///   valid JSON, a required field is missing, or a field has the wrong
///   shape (`private messages` must map strings to strings).
/// - [`MoveError::Illegal`] if `give` or `take` is not a known player, is
///   the mover itself, or both name the same player.
pub fn parse_move<S: AsRef<str>>(raw: &str, mover: &str, roster: &[S]) -> Result<Move, MoveError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| MoveError::Malformed(String::from("no JSON object found in response")))?;
    let mv: Move =
        serde_json::from_str(json).map_err(|e| MoveError::Malformed(e.to_string()))?;
    check_legality(&mv, mover, roster)?;
    Ok(mv)
}

/// Slice from the first `{` to the last `}` inclusive.
fn extract_json_object(text: &str) -> Option<&str> {
    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if last < first {
        return None;
    }
    text.get(first..=last)
}

/// Make sure the give and take targets are players the mover may pick.
fn check_legality<S: AsRef<str>>(mv: &Move, mover: &str, roster: &[S]) -> Result<(), MoveError> {
    let known = |name: &str| roster.iter().any(|n| n.as_ref() == name);

    if !known(&mv.give) {
        return Err(MoveError::Illegal(format!(
            "give target '{}' is not a player",
            mv.give
        )));
    }
    if !known(&mv.take) {
        return Err(MoveError::Illegal(format!(
            "take target '{}' is not a player",
            mv.take
        )));
    }
    if mv.give == mv.take {
        return Err(MoveError::Illegal(format!(
            "cannot give to and take from the same player '{}'",
            mv.give
        )));
    }
    if mv.give == mover || mv.take == mover {
        return Err(MoveError::Illegal(String::from(
            "cannot give to or take from yourself",
        )));
    }
    Ok(())
}
