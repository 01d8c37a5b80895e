// Multi-file upload coordinator: launches one transport per file and joins them into one completion signal.

use std::sync::Arc;

use anyhow::Result;
use bitvec::prelude::*;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::progress::{ProgressEvent, ProgressSink};
use super::request::{FileDescriptor, FormData, UploadOptions, UploadRequest};
use super::transport::{BodyPolicy, Transport};
use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::uploader::http_uploader::HttpUploader;
use crate::uploader::traits::Uploader;

pub type PrepareFn = Arc<dyn Fn(&FileDescriptor, &mut UploadOptions) + Send + Sync>;
pub type FileCompleteFn =
    Arc<dyn Fn(Option<&UploadError>, &Arc<Transport>, &Arc<FileDescriptor>) + Send + Sync>;
pub type ProgressFn = Arc<dyn Fn(ProgressEvent, &Arc<FileDescriptor>) + Send + Sync>;
pub type CompleteFn = Box<dyn FnOnce(Option<UploadError>, Option<Arc<Transport>>) + Send>;

/// Parameters of one batch invocation.
pub struct UploadParams {
    url: String,
    field_name: String,
    files: Vec<Arc<FileDescriptor>>,
    data: FormData,
    body_policy: BodyPolicy,
    on_prepare: Option<PrepareFn>,
    on_file_complete: Option<FileCompleteFn>,
    on_progress: Option<ProgressFn>,
    on_complete: Option<CompleteFn>,
}

impl UploadParams {
    pub fn new(url: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            field_name: field_name.into(),
            files: Vec::new(),
            data: FormData::new(),
            body_policy: BodyPolicy::Opaque,
            on_prepare: None,
            on_file_complete: None,
            on_progress: None,
            on_complete: None,
        }
    }

    pub fn files<I, F>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Arc<FileDescriptor>>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn data(mut self, data: FormData) -> Self {
        self.data = data;
        self
    }

    pub fn body_policy(mut self, policy: BodyPolicy) -> Self {
        self.body_policy = policy;
        self
    }

    pub fn on_prepare(
        mut self,
        f: impl Fn(&FileDescriptor, &mut UploadOptions) + Send + Sync + 'static,
    ) -> Self {
        self.on_prepare = Some(Arc::new(f));
        self
    }

    pub fn on_file_complete(
        mut self,
        f: impl Fn(Option<&UploadError>, &Arc<Transport>, &Arc<FileDescriptor>) + Send + Sync + 'static,
    ) -> Self {
        self.on_file_complete = Some(Arc::new(f));
        self
    }

    pub fn on_progress(
        mut self,
        f: impl Fn(ProgressEvent, &Arc<FileDescriptor>) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    pub fn on_complete(
        mut self,
        f: impl FnOnce(Option<UploadError>, Option<Arc<Transport>>) + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    fn has_target(&self) -> bool {
        !self.url.trim().is_empty() && !self.field_name.trim().is_empty() && !self.files.is_empty()
    }
}

/// What the completion callback received.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub error: Option<UploadError>,
    pub transport: Option<Arc<Transport>>,
}

/// Countdown latch over the batch's transports plus the most recently
/// observed outcome.
struct BatchState {
    total: usize,
    finished: BitVec,
    finished_count: usize,
    last_error: Option<UploadError>,
    last_transport: Option<Arc<Transport>>,
    on_complete: Option<CompleteFn>,
    done: Arc<watch::Sender<Option<BatchOutcome>>>,
}

impl BatchState {
    fn new(
        total: usize,
        on_complete: Option<CompleteFn>,
        done: watch::Sender<Option<BatchOutcome>>,
    ) -> Self {
        Self {
            total,
            finished: bitvec![0; total],
            finished_count: 0,
            last_error: None,
            last_transport: None,
            on_complete,
            done: Arc::new(done),
        }
    }

    /// Count one terminal transport; fire the completion signal when it was
    /// the last one. Callbacks run outside the lock.
    fn finish_one(
        state: &Mutex<BatchState>,
        index: usize,
        error: Option<UploadError>,
        transport: Arc<Transport>,
    ) {
        let completion = {
            let mut s = state.lock();
            if s.finished[index] {
                warn!("transport {} reported twice, ignoring", index);
                return;
            }
            s.finished.set(index, true);
            s.finished_count += 1;
            s.last_error = error;
            s.last_transport = Some(transport);
            debug!("batch progress {}/{}", s.finished_count, s.total);

            if s.finished_count < s.total {
                return;
            }
            let outcome = BatchOutcome {
                error: s.last_error.clone(),
                transport: s.last_transport.clone(),
            };
            (s.on_complete.take(), outcome, Arc::clone(&s.done), s.total)
        };

        let (on_complete, outcome, done, total) = completion;
        info!(
            "upload batch complete files={} last_error={:?}",
            total, outcome.error
        );
        if let Some(cb) = on_complete {
            cb(outcome.error.clone(), outcome.transport.clone());
        }
        done.send_replace(Some(outcome));
    }
}

/// Returned by `UploadBatch::invoke`; cancels and observes the batch.
#[derive(Clone)]
pub struct BatchHandle {
    transports: Vec<Arc<Transport>>,
    done: watch::Receiver<Option<BatchOutcome>>,
}

impl BatchHandle {
    /// Handle for a batch that never started.
    fn completed(outcome: BatchOutcome) -> Self {
        let (_tx, rx) = watch::channel(Some(outcome));
        Self {
            transports: Vec::new(),
            done: rx,
        }
    }

    /// Abort every transport that is not yet terminal. Each aborted transport
    /// still reports through the callbacks and counts toward completion.
    /// Returns how many transports were signalled.
    pub fn abort(&self) -> usize {
        let aborted = self.transports.iter().filter(|t| t.abort()).count();
        if aborted > 0 {
            info!("upload batch abort: {} transport(s) cancelled", aborted);
        }
        aborted
    }

    /// Transports in file order. Empty when the batch never started.
    pub fn transports(&self) -> &[Arc<Transport>] {
        &self.transports
    }

    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// Wait for the completion signal. There is no built-in deadline; race
    /// this against `tokio::time::timeout` if one is needed. Returns `None`
    /// only if the runtime dropped the batch's tasks before they finished.
    pub async fn wait(&self) -> Option<BatchOutcome> {
        let mut rx = self.done.clone();
        let outcome = rx.wait_for(Option::is_some).await.ok()?;
        (*outcome).clone()
    }
}

/// Coordinator launching one transport per file against a shared uploader.
pub struct UploadBatch {
    uploader: Arc<dyn Uploader>,
}

impl UploadBatch {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self { uploader }
    }

    /// Coordinator backed by a fresh reqwest client.
    pub fn http(config: UploadConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpUploader::new(config)?)))
    }

    /// Start uploading every file concurrently and return immediately.
    ///
    /// With an empty url, field name or file list the completion callback is
    /// invoked synchronously with `UploadError::NoFilesOrTarget` and no
    /// transport is created. Must be called within a tokio runtime.
    pub fn invoke(&self, params: UploadParams) -> BatchHandle {
        if !params.has_target() {
            warn!(
                "upload batch rejected: url={:?} field={:?} files={}",
                params.url,
                params.field_name,
                params.files.len()
            );
            let outcome = BatchOutcome {
                error: Some(UploadError::NoFilesOrTarget),
                transport: None,
            };
            if let Some(cb) = params.on_complete {
                cb(outcome.error.clone(), None);
            }
            return BatchHandle::completed(outcome);
        }

        let UploadParams {
            url,
            field_name,
            files,
            data,
            body_policy,
            on_prepare,
            on_file_complete,
            on_progress,
            on_complete,
        } = params;

        info!(
            "upload batch start url={} field={} files={}",
            url,
            field_name,
            files.len()
        );

        let (done_tx, done_rx) = watch::channel(None);
        let state = Arc::new(Mutex::new(BatchState::new(files.len(), on_complete, done_tx)));
        let mut transports = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            let mut options = UploadOptions { data: data.clone() };
            if let Some(prepare) = &on_prepare {
                prepare(&file, &mut options);
            }

            let request = UploadRequest {
                url: url.clone(),
                field_name: field_name.clone(),
                data: options.data,
                file: Arc::clone(&file),
            };
            let transport = Arc::new(Transport::new(index, Arc::clone(&file)));
            transports.push(Arc::clone(&transport));

            let progress: ProgressSink = match &on_progress {
                Some(cb) => {
                    let cb = Arc::clone(cb);
                    let file = Arc::clone(&file);
                    Arc::new(move |event: ProgressEvent| cb(event, &file))
                }
                None => Arc::new(|_: ProgressEvent| {}),
            };
            let uploader = Arc::clone(&self.uploader);
            let state = Arc::clone(&state);
            let on_file_complete = on_file_complete.clone();

            tokio::spawn(async move {
                let error = transport
                    .send(uploader.as_ref(), request, progress, body_policy)
                    .await;
                if let Some(cb) = &on_file_complete {
                    cb(error.as_ref(), &transport, &file);
                }
                BatchState::finish_one(&state, index, error, transport);
            });
        }

        BatchHandle {
            transports,
            done: done_rx,
        }
    }
}
