//! Reply stabilization.
//!
//! Lumo streams its answer into the last assistant bubble, so the DOM holds a
//! growing prefix for a while. The poller runs a small state machine: sample
//! until a real candidate shows up, then confirm it by re-reading after a
//! settle pause. Only text that survives a full pause unchanged is returned.
//!
//! The deadline is checked once per iteration, at the top, and every sleep is
//! clamped to the time remaining.

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::DriverConfig;
use crate::error::AskError;
use crate::surface::ChatSurface;

enum PollState {
    /// No candidate answer yet.
    Sampling,
    /// Saw a candidate; waiting a settle pause to see whether it changes.
    Confirming { baseline: String },
}

/// Poll the surface until the newest assistant message holds still, or the
/// deadline passes.
pub(crate) async fn wait_for_reply<S>(
    surface: &S,
    config: &DriverConfig,
    deadline: Instant,
) -> Result<String, AskError>
where
    S: ChatSurface + ?Sized,
{
    let mut state = PollState::Sampling;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(AskError::Timeout);
        }
        let remaining = deadline - now;

        state = match state {
            PollState::Sampling => match sample(surface, config).await {
                Some(text) => PollState::Confirming { baseline: text },
                None => {
                    tokio::time::sleep(config.poll_interval.min(remaining)).await;
                    PollState::Sampling
                },
            },
            PollState::Confirming { baseline } => {
                if remaining <= config.settle_interval {
                    // Too little time left for a full settle pause. A
                    // shortened pause could bless a still-growing answer, so
                    // run out the clock instead.
                    tokio::time::sleep(remaining).await;
                    PollState::Confirming { baseline }
                } else {
                    tokio::time::sleep(config.settle_interval).await;
                    match sample(surface, config).await {
                        Some(text) if text == baseline => return Ok(text),
                        Some(text) => {
                            trace!(chars = text.len(), "answer still growing");
                            PollState::Confirming { baseline: text }
                        },
                        None => {
                            debug!("candidate answer degraded, sampling again");
                            PollState::Sampling
                        },
                    }
                }
            },
        };
    }
}

/// One read of the newest assistant message. Empty text, the streaming
/// placeholder, a missing bubble, and read errors all count as "no candidate".
async fn sample<S>(surface: &S, config: &DriverConfig) -> Option<String>
where
    S: ChatSurface + ?Sized,
{
    match surface.last_reply().await {
        Ok(Some(text)) if !text.is_empty() && text != config.placeholder => Some(text),
        Ok(_) => None,
        Err(err) => {
            trace!(error = %err, "reply read failed, will retry");
            None
        },
    }
}
