// Error types for the uploader. The library modules return `Error` so
// callers can tell configuration, input and remote failures apart; the
// binary converts everything into an `anyhow` exit at the edge.

use thiserror::Error;

/// Everything that can go wrong during a run. No variant is retried
/// automatically; the operator re-runs after fixing the cause.
#[derive(Debug, Error)]
pub enum Error {
    /// Unreadable or incomplete credentials file.
    #[error("config error: {0}")]
    Config(String),

    /// Malformed input file: unknown header column, unreadable row.
    #[error("input error: {0}")]
    Input(String),

    /// CSV-level parse failure from the input file.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Transport-level failure talking to the remote platform.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote platform rejected a request (auth, quota, payload).
    #[error("api request failed: {status} - {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// A submitted job reached the FAILED terminal status.
    #[error("offline user data job '{resource_name}' failed: {reason}")]
    JobFailed {
        resource_name: String,
        reason: String,
    },

    /// `--wait` was requested but the job never reached a terminal
    /// status within the polling bound.
    #[error("job '{0}' did not reach a terminal status within the polling window")]
    PollTimeout(String),

    /// One or more audience groups failed to upload; the rest were
    /// processed normally.
    #[error("{0} audience group(s) failed to upload")]
    GroupsFailed(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
