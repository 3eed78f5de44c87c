//! Kids story creator - turns a few story settings into an illustrated story
//!
//! A Gemini model on Vertex AI writes a short story from the form settings,
//! then describes an illustration for it, which OpenAI's Images API draws.

pub mod ai;
pub mod app;
pub mod error;
pub mod form;
pub mod models;
pub mod prompts;
pub mod web;

pub use error::{Error, Result};
