mod http;

pub use http::HttpTransport;

use crate::error::TransportError;
use crate::staging::{Mode, StagedFile};

/// Multipart field name every file part is sent under.
pub const FILE_FIELD: &str = "file";

/// The two service endpoints a form can post to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Returns JSON metadata for exactly one file.
    Analyze,
    /// Returns the sanitized file, or an archive when several were sent.
    Remove,
}

impl Endpoint {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Single => Self::Analyze,
            Mode::Multi => Self::Remove,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Analyze => "/api/analyze",
            Self::Remove => "/api/remove",
        }
    }
}

/// One named part of a multipart request. Contents are read when sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: &'static str,
    pub file: StagedFile,
}

/// Ordered multipart request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    parts: Vec<FilePart>,
}

impl MultipartBody {
    /// One `file` part per staged file, in selection order.
    pub fn from_files(files: &[StagedFile]) -> Self {
        Self {
            parts: files
                .iter()
                .map(|f| FilePart {
                    field: FILE_FIELD,
                    file: f.clone(),
                })
                .collect(),
        }
    }

    pub fn parts(&self) -> &[FilePart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// A complete response: status, declared content type, and raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends multipart requests to the metadata service.
///
/// The library ships with [`HttpTransport`]; tests substitute a recording
/// implementation.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Post `body` to `endpoint` and wait for the full response.
    ///
    /// A non-2xx status is not an error at this level; only failures to
    /// build, send, or receive the request are.
    async fn post_multipart(
        &self,
        endpoint: Endpoint,
        body: MultipartBody,
    ) -> Result<HttpResponse, TransportError>;
}
