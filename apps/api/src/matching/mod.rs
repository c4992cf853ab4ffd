//! Resume ↔ job-description matching.
//!
//! text → extractor → matcher → reconciler → suggester, orchestrated by `pipeline`.
//! `repair` and `explanation` normalize what the completion service returns.

pub mod engine;
pub mod explanation;
pub mod extractor;
pub mod handlers;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod reconciler;
pub mod repair;
pub mod rules;
pub mod suggester;
pub mod text;
