//! Scripted [`ChatSurface`] used by unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::surface::{ChatSurface, SurfaceError};

/// A fake chat page that serves replies from a script.
///
/// Each `last_reply` call pops the next scripted value; once the script is
/// exhausted the final value repeats, the way a finished answer stays in the
/// DOM. Cloning shares state, so a test can keep a handle for assertions
/// while the driver owns the other.
#[derive(Clone)]
pub(crate) struct ScriptedSurface {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    replies: Mutex<VecDeque<Option<String>>>,
    last_served: Mutex<Option<String>>,
    ever_changing: AtomicBool,
    reads: AtomicUsize,
    toggle: Mutex<Option<bool>>,
    toggle_clicks: AtomicUsize,
    clears: AtomicUsize,
    typed: Mutex<Vec<String>>,
    submits: AtomicUsize,
    fail_submit: AtomicBool,
    fail_toggle: AtomicBool,
    fail_state_read: AtomicBool,
}

impl ScriptedSurface {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner::default()),
        }
    }

    pub(crate) fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let surface = Self::new();
        *surface.inner.replies.lock().unwrap() =
            replies.into_iter().map(|r| r.map(Into::into)).collect();
        surface
    }

    /// Every read returns a fresh value, so the answer never stabilizes.
    pub(crate) fn never_stable() -> Self {
        let surface = Self::new();
        surface.inner.ever_changing.store(true, Ordering::SeqCst);
        surface
    }

    /// Make the web-search toggle present, in the given state.
    pub(crate) fn toggle_state(self, active: bool) -> Self {
        *self.inner.toggle.lock().unwrap() = Some(active);
        self
    }

    pub(crate) fn failing_submit(self) -> Self {
        self.inner.fail_submit.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_toggle(self) -> Self {
        self.inner.fail_toggle.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_state_read(self) -> Self {
        self.inner.fail_state_read.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn toggle_clicks(&self) -> usize {
        self.inner.toggle_clicks.load(Ordering::SeqCst)
    }

    pub(crate) fn clears(&self) -> usize {
        self.inner.clears.load(Ordering::SeqCst)
    }

    pub(crate) fn submits(&self) -> usize {
        self.inner.submits.load(Ordering::SeqCst)
    }

    pub(crate) fn typed(&self) -> Vec<String> {
        self.inner.typed.lock().unwrap().clone()
    }

    pub(crate) fn toggle(&self) -> Option<bool> {
        *self.inner.toggle.lock().unwrap()
    }
}

#[async_trait]
impl ChatSurface for ScriptedSurface {
    async fn web_search_state(&self) -> Result<Option<bool>, SurfaceError> {
        if self.inner.fail_state_read.load(Ordering::SeqCst) {
            return Err(SurfaceError::JsEval("scripted state failure".into()));
        }
        Ok(*self.inner.toggle.lock().unwrap())
    }

    async fn toggle_web_search(&self) -> Result<(), SurfaceError> {
        if self.inner.fail_toggle.load(Ordering::SeqCst) {
            return Err(SurfaceError::ElementNotFound("web-search toggle".into()));
        }
        self.inner.toggle_clicks.fetch_add(1, Ordering::SeqCst);
        let mut toggle = self.inner.toggle.lock().unwrap();
        *toggle = toggle.map(|active| !active);
        Ok(())
    }

    async fn clear_input(&self) -> Result<(), SurfaceError> {
        self.inner.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn type_prompt(&self, text: &str) -> Result<(), SurfaceError> {
        self.inner.typed.lock().unwrap().push(text.to_owned());
        Ok(())
    }

    async fn submit(&self) -> Result<(), SurfaceError> {
        if self.inner.fail_submit.load(Ordering::SeqCst) {
            return Err(SurfaceError::Cdp("scripted submit failure".into()));
        }
        self.inner.submits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn last_reply(&self) -> Result<Option<String>, SurfaceError> {
        let read = self.inner.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.inner.ever_changing.load(Ordering::SeqCst) {
            return Ok(Some(format!("chunk {read}")));
        }
        let mut replies = self.inner.replies.lock().unwrap();
        match replies.pop_front() {
            Some(next) => {
                self.inner.last_served.lock().unwrap().clone_from(&next);
                Ok(next)
            },
            None => Ok(self.inner.last_served.lock().unwrap().clone()),
        }
    }
}
