use thiserror::Error;

/// Failures surfaced to the user by a form submission.
///
/// The `Display` output of each variant is exactly the text the error panel
/// shows, so presenting an error is `view.show_error(err.to_string())`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Submit was pressed with nothing staged. No request is made.
    #[error("{0}")]
    NoFileSelected(String),

    /// The service answered with a non-2xx status.
    #[error("{message}")]
    ServerRejected { status: u16, message: String },

    /// Connectivity loss, timeout, or an unreadable response body.
    #[error("{0}")]
    TransportFailure(String),
}

/// Errors raised below the submission boundary while talking to the service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to read {name}: {source}")]
    ReadFile {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    Url(String),
}
