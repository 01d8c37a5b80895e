use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use mime_guess::mime::{self, Mime};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tracing::{debug, warn};

use super::traits::{TransportResponse, Uploader};
use crate::config::UploadConfig;
use crate::engine::progress::{ByteCounter, ProgressSink};
use crate::engine::request::UploadRequest;
use crate::error::UploadError;

/// reqwest-backed uploader: one multipart POST per file, the file body
/// streamed in `stream_chunk_size` pieces with a progress event per piece.
pub struct HttpUploader {
    client: Client,
    config: UploadConfig,
}

impl HttpUploader {
    pub fn new(config: UploadConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()?;
        Ok(Self { client, config })
    }

    /// Reuse an existing client (shared connection pool).
    pub fn with_client(client: Client, config: UploadConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Build the multipart form: auxiliary fields first, the file last under
    /// the configured field name.
    fn build_form(
        &self,
        request: &UploadRequest,
        progress: ProgressSink,
    ) -> Result<Form, UploadError> {
        let mut form = Form::new();
        for (name, value) in request.data.encode() {
            form = form.text(name, value);
        }

        let file = &request.file;
        let counter = Arc::new(ByteCounter::new(file.size()));
        let pieces = split_body(&file.data, self.config.stream_chunk_size);
        let body_stream = stream::iter(pieces.into_iter().map(move |piece| {
            let event = counter.advance(piece.len() as u64);
            progress(event);
            Ok::<Bytes, std::io::Error>(piece)
        }));

        let mime = file.mime_type.parse::<Mime>().unwrap_or_else(|e| {
            warn!("invalid mime type {:?} for {}: {}", file.mime_type, file.name, e);
            mime::APPLICATION_OCTET_STREAM
        });
        let part = Part::stream_with_length(Body::wrap_stream(body_stream), file.size())
            .file_name(file.name.clone())
            .mime_str(mime.essence_str())
            .map_err(|e| UploadError::Network(e.to_string()))?;
        Ok(form.part(request.field_name.clone(), part))
    }
}

fn split_body(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect()
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(
        &self,
        request: &UploadRequest,
        progress: ProgressSink,
    ) -> Result<TransportResponse, UploadError> {
        let form = self.build_form(request, progress)?;
        debug!(
            "http upload start url={} field={} file={} bytes={}",
            request.url,
            request.field_name,
            request.file.name,
            request.file.size()
        );

        let resp = self
            .client
            .post(&request.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("http upload failed file={}: {}", request.file.name, e);
                UploadError::Network(e.to_string())
            })?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;
        debug!(
            "http upload done file={} status={} response_bytes={}",
            request.file.name,
            status,
            body.len()
        );

        Ok(TransportResponse { status, body })
    }
}
