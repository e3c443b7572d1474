//! # GlowUp Blog
//!
//! Content pipeline for a lifestyle blog: pick a topic, have a language
//! model write the article, and store it as JSON files with a per-category
//! index.
//!
//! ## Architecture
//!
//! The pipeline runs leaf-first through these modules:
//! 1. **Topics** ([`topics`]): sample a topic, keywords and length for a category
//! 2. **Generation** ([`generation`] over [`api`]): one completion call, with a
//!    deterministic fallback article when it fails
//! 3. **Storage** ([`store`]): write `articles/<id>.json` and update
//!    `categories/<category>.json`
//! 4. **Scheduling** ([`scheduler`]): bulk runs, single runs and the periodic task
//!
//! [`monitoring`] keeps the daily log book and health check; [`http`] and
//! [`cli`] are the trigger surfaces.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod models;
pub mod monitoring;
pub mod scheduler;
pub mod store;
pub mod topics;
pub mod utils;

pub use error::{Error, Result};
