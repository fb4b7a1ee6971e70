//! Prompt submission.
//!
//! Ordering matters: web search is reconciled first, then the input is
//! cleared, typed into, and sent. A failure at any step surfaces as
//! [`AskError::Submission`] and leaves nothing half-sent worth polling for.

use tracing::{debug, warn};

use crate::error::AskError;
use crate::surface::{ChatSurface, SurfaceError};

pub(crate) async fn submit_prompt<S>(
    surface: &S,
    prompt: &str,
    web_search: bool,
) -> Result<(), AskError>
where
    S: ChatSurface + ?Sized,
{
    reconcile_web_search(surface, web_search).await?;

    surface
        .clear_input()
        .await
        .map_err(|err| submission("clearing the input", err))?;
    surface
        .type_prompt(prompt)
        .await
        .map_err(|err| submission("typing the prompt", err))?;
    surface
        .submit()
        .await
        .map_err(|err| submission("sending the prompt", err))?;

    debug!(chars = prompt.len(), web_search, "prompt submitted");
    Ok(())
}

/// Bring the page's web-search toggle in line with what the caller asked
/// for. The toggle is sticky across prompts, so this reads the current state
/// and clicks only on a mismatch.
async fn reconcile_web_search<S>(surface: &S, enabled: bool) -> Result<(), AskError>
where
    S: ChatSurface + ?Sized,
{
    let state = match surface.web_search_state().await {
        Ok(state) => state,
        Err(err) => {
            // The prompt is still worth sending; the page may simply have
            // moved the control.
            warn!(error = %err, "could not read web-search toggle state");
            return Ok(());
        },
    };

    match state {
        None => {
            debug!("web-search toggle not present, leaving it alone");
            Ok(())
        },
        Some(active) if active == enabled => Ok(()),
        Some(_) => surface
            .toggle_web_search()
            .await
            .map_err(|err| submission("toggling web search", err)),
    }
}

fn submission(step: &str, err: SurfaceError) -> AskError {
    AskError::Submission(format!("{step}: {err}"))
}
