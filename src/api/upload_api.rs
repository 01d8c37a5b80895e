use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::try_join_all;
use tracing::info;

use crate::config::UploadConfig;
use crate::engine::batch::{UploadBatch, UploadParams};
use crate::engine::request::{FileDescriptor, FormData};
use crate::engine::uid::UploadUidGenerator;
use crate::error::UploadError;

/// Per-file result of `upload_paths`.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub name: String,
    pub status: Option<u16>,
    pub error: Option<UploadError>,
    pub body: Option<String>,
}

/// Outcome of `upload_paths`: the batch-level error as seen by the
/// completion signal plus every file's own result, in input order.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub error: Option<UploadError>,
    pub files: Vec<FileReport>,
}

impl UploadReport {
    pub fn all_succeeded(&self) -> bool {
        !self.files.is_empty() && self.files.iter().all(|f| f.error.is_none())
    }
}

/// Read `paths` from disk and upload them concurrently over HTTP, stamping
/// every request with a fresh UID from `uids`.
pub async fn upload_paths(
    uids: Arc<UploadUidGenerator>,
    url: &str,
    field_name: &str,
    paths: &[PathBuf],
    data: FormData,
) -> Result<UploadReport> {
    let files = try_join_all(paths.iter().map(|p| FileDescriptor::from_path(p))).await?;
    info!("uploading {} file(s) from disk to {}", files.len(), url);

    let batch = UploadBatch::http(UploadConfig::from_env())?;
    let params = UploadParams::new(url, field_name)
        .files(files)
        .data(data)
        .on_prepare(move |_file, options| {
            uids.stamp(options);
        });

    let handle = batch.invoke(params);
    let outcome = handle
        .wait()
        .await
        .ok_or_else(|| anyhow!("upload batch was dropped before completing"))?;

    let files = handle
        .transports()
        .iter()
        .map(|t| FileReport {
            name: t.file().name.clone(),
            status: t.status(),
            error: t.error(),
            body: t.response_text(),
        })
        .collect();

    Ok(UploadReport {
        error: outcome.error,
        files,
    })
}
