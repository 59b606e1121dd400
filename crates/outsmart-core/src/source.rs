//! Move source trait and a scripted implementation.
//!
//! During collection the referee hands every agent its [`Instructions`]
//! and awaits raw text in response. The [`MoveSource`] trait abstracts how
//! that text is produced -- an LLM backend, a scripted bot, or a test stub.
//! Retries and transport-level timeouts belong to the implementation; the
//! referee only sees text or a [`TransportError`].
//!
//! [`ScriptedSource`] replays a queue of canned replies and is used to
//! exercise the engine without a network.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::TransportError;
use crate::prompt::Instructions;

/// Something that can produce a raw move response for an agent.
pub trait MoveSource: Send + Sync {
    /// Produce a raw text response for the given instructions.
    ///
    /// `max_tokens` is the length budget for the answer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no text could be obtained.
    fn send(
        &self,
        instructions: &Instructions,
        max_tokens: u32,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// One canned reply for a [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Answer immediately with this text.
    Text(String),
    /// Answer with this text after a delay.
    Delayed(Duration, String),
    /// Fail with a transport error carrying this message.
    Fail(String),
}

/// A move source that replays queued replies in order.
///
/// When the queue runs dry every further call fails, which the referee
/// treats like any other unreachable agent.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    replies: Mutex<VecDeque<ScriptedReply>>,
}

impl ScriptedSource {
    /// Create a source that will replay `replies` in order.
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
        }
    }

    /// Create a source that answers with each text in order.
    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| ScriptedReply::Text(t.into())))
    }

    fn next_reply(&self) -> Result<ScriptedReply, TransportError> {
        let mut queue = self
            .replies
            .lock()
            .map_err(|e| TransportError::new(format!("script lock poisoned: {e}")))?;
        queue
            .pop_front()
            .ok_or_else(|| TransportError::new("script exhausted"))
    }
}

impl MoveSource for ScriptedSource {
    fn send(
        &self,
        _instructions: &Instructions,
        _max_tokens: u32,
    ) -> impl Future<Output = Result<String, TransportError>> + Send {
        let reply = self.next_reply();
        async move {
            match reply? {
                ScriptedReply::Text(text) => Ok(text),
                ScriptedReply::Delayed(delay, text) => {
                    tokio::time::sleep(delay).await;
                    Ok(text)
                }
                ScriptedReply::Fail(message) => Err(TransportError::new(message)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instructions() -> Instructions {
        Instructions {
            system: String::from("rules"),
            user: String::from("your move"),
        }
    }

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let source = ScriptedSource::new([
            ScriptedReply::Text(String::from("first")),
            ScriptedReply::Fail(String::from("boom")),
        ]);
        let prompt = instructions();

        assert_eq!(source.send(&prompt, 400).await, Ok(String::from("first")));
        assert_eq!(
            source.send(&prompt, 400).await,
            Err(TransportError::new("boom"))
        );
        assert_eq!(
            source.send(&prompt, 400).await,
            Err(TransportError::new("script exhausted"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_reply_waits() {
        let source = ScriptedSource::new([ScriptedReply::Delayed(
            Duration::from_secs(5),
            String::from("late"),
        )]);
        let start = tokio::time::Instant::now();
        let reply = source.send(&instructions(), 400).await;
        assert_eq!(reply, Ok(String::from("late")));
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
