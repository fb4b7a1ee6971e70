//! HTTP front door for the Lumo session driver.
//!
//! One route does the work: `POST /v1/prompt` takes a prompt, relays it to
//! the single browser session, and returns the stabilized answer. Everything
//! else is plumbing around that.

pub mod routes;
pub mod server;
pub mod service;

pub use server::{AppState, build_app, start_server};
pub use service::PromptService;
