// Library root
// -----------
// This crate exposes the uploader's stages as a small library surface;
// the binary (`main.rs`) only parses the command line and dispatches.
//
// Module responsibilities:
// - `cli`: clap command and flag definitions.
// - `config`: credentials file loading into an immutable value that is
//   passed explicitly to each stage.
// - `normalize`: the platform's fixed normalize-then-SHA-256 scheme for
//   identity fields.
// - `audience`: CSV reading, identifier construction, and grouping of
//   rows into audience lists.
// - `api`: blocking HTTP client for the remote platform (user lists,
//   offline user-data jobs, GAQL search).
// - `upload`: the per-group submission pipeline.
// - `status`: job status reporting and the `check-job` handler.
// - `error`: the crate-wide error type.
//
// Keeping this separation lets the normalization and grouping logic be
// tested without any network access.

pub mod api;
pub mod audience;
pub mod cli;
pub mod config;
pub mod error;
pub mod normalize;
pub mod status;
pub mod upload;

pub use error::{Error, Result};
