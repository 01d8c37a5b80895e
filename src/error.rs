use thiserror::Error;

/// Outcome error of an upload batch or of one file inside it.
///
/// Cloneable so the same value can be handed to the per-file callback and kept
/// as the batch's last observed error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("No files to upload")]
    NoFilesOrTarget,
    #[error("Upload failed with status {status}")]
    Http { status: u16 },
    #[error("Upload failed: {0}")]
    Network(String),
    #[error("Upload aborted")]
    Aborted,
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

impl UploadError {
    /// HTTP status carried by the error, if the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Http { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, UploadError::Aborted)
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => UploadError::Http {
                status: status.as_u16(),
            },
            None => UploadError::Network(e.to_string()),
        }
    }
}
