// Per-file upload state machine: one POST ending in exactly one terminal state.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::progress::ProgressSink;
use super::request::{FileDescriptor, UploadRequest};
use crate::error::UploadError;
use crate::uploader::traits::{TransportResponse, Uploader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    InFlight,
    Succeeded,
    Failed,
    Aborted,
}

impl TransportState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransportState::Succeeded | TransportState::Failed | TransportState::Aborted
        )
    }

    /// Whether `self -> next` is a legal forward move.
    fn can_advance_to(self, next: TransportState) -> bool {
        match self {
            TransportState::Idle => next == TransportState::InFlight,
            TransportState::InFlight => next.is_terminal(),
            _ => false,
        }
    }
}

/// How a 2xx response body is treated before the transport is marked
/// succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Never look at the body; any 2xx succeeds. Parsing is left to the
    /// completion callbacks.
    #[default]
    Opaque,
    /// A 2xx body that is not valid JSON fails the transport with
    /// `UploadError::InvalidResponse`.
    RequireJson,
}

impl BodyPolicy {
    fn check(self, response: &TransportResponse) -> Option<UploadError> {
        match self {
            BodyPolicy::Opaque => None,
            BodyPolicy::RequireJson => serde_json::from_slice::<serde_json::Value>(&response.body)
                .err()
                .map(|e| UploadError::InvalidResponse(e.to_string())),
        }
    }
}

/// Handle to one file's upload. Shared between the batch, its task and the
/// caller's callbacks.
pub struct Transport {
    index: usize,
    file: Arc<FileDescriptor>,
    state: Mutex<TransportState>,
    response: Mutex<Option<TransportResponse>>,
    error: Mutex<Option<UploadError>>,
    cancel: CancellationToken,
}

impl Transport {
    pub fn new(index: usize, file: Arc<FileDescriptor>) -> Self {
        Self {
            index,
            file,
            state: Mutex::new(TransportState::Idle),
            response: Mutex::new(None),
            error: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Position of the file within its batch.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn file(&self) -> &Arc<FileDescriptor> {
        &self.file
    }

    pub fn state(&self) -> TransportState {
        *self.state.lock()
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Terminal error, `None` while running or after success.
    pub fn error(&self) -> Option<UploadError> {
        self.error.lock().clone()
    }

    pub fn response(&self) -> Option<TransportResponse> {
        self.response.lock().clone()
    }

    /// HTTP status of the response, if the endpoint answered.
    pub fn status(&self) -> Option<u16> {
        self.response.lock().as_ref().map(|r| r.status)
    }

    pub fn response_text(&self) -> Option<String> {
        self.response.lock().as_ref().map(TransportResponse::text)
    }

    /// Decode the response body. Fails with `InvalidResponse` when there is
    /// no body yet or it does not decode as `T`.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, UploadError> {
        let guard = self.response.lock();
        let response = guard
            .as_ref()
            .ok_or_else(|| UploadError::InvalidResponse("no response".to_string()))?;
        serde_json::from_slice(&response.body)
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))
    }

    /// Request cancellation. Returns `false` (and does nothing) once the
    /// transport is terminal.
    pub fn abort(&self) -> bool {
        let state = self.state.lock();
        if state.is_terminal() {
            return false;
        }
        self.cancel.cancel();
        debug!("transport {} ({}) abort requested", self.index, self.file.name);
        true
    }

    fn advance(&self, next: TransportState) -> bool {
        let mut state = self.state.lock();
        if !state.can_advance_to(next) {
            return false;
        }
        *state = next;
        true
    }

    /// Run the upload to a terminal state and return its error (`None` on
    /// success). A transport is sent at most once; later calls return the
    /// recorded outcome without touching the network.
    pub async fn send(
        &self,
        uploader: &dyn Uploader,
        request: UploadRequest,
        progress: ProgressSink,
        policy: BodyPolicy,
    ) -> Option<UploadError> {
        if !self.advance(TransportState::InFlight) {
            return self.error();
        }
        debug!("transport {} ({}) in flight", self.index, self.file.name);

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(UploadError::Aborted),
            r = uploader.upload(&request, progress) => r,
        };

        let (next, error) = match result {
            Ok(response) => {
                let error = if response.is_success() {
                    policy.check(&response)
                } else {
                    Some(UploadError::Http {
                        status: response.status,
                    })
                };
                *self.response.lock() = Some(response);
                match error {
                    None => (TransportState::Succeeded, None),
                    Some(e) => (TransportState::Failed, Some(e)),
                }
            }
            Err(UploadError::Aborted) => (TransportState::Aborted, Some(UploadError::Aborted)),
            Err(e) => (TransportState::Failed, Some(e)),
        };

        *self.error.lock() = error.clone();
        self.advance(next);
        debug!(
            "transport {} ({}) finished state={:?} error={:?}",
            self.index, self.file.name, next, error
        );
        error
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("index", &self.index)
            .field("file", &self.file.name)
            .field("state", &self.state())
            .finish()
    }
}
