//! Concurrent multi-file upload coordinator.
//!
//! `UploadBatch` launches one `Transport` per file against an `Uploader`,
//! forwards per-file progress and outcomes, and joins everything into a single
//! completion callback. `DragZone` turns nested drag events over a region
//! into one enter/leave signal and a dropped file list.

pub mod api;
pub mod config;
pub mod drag;
pub mod engine;
pub mod error;
pub mod uploader;

pub use drag::event::{files_from_event, DragEvent, DragEventKind, DropEffect};
pub use drag::zone::{DragHandlers, DragTarget, DragZone, DropRegion};
pub use engine::batch::{BatchHandle, BatchOutcome, UploadBatch, UploadParams};
pub use engine::progress::ProgressEvent;
pub use engine::request::{FieldValue, FileDescriptor, FormData, UploadOptions, UploadRequest};
pub use engine::transport::{BodyPolicy, Transport, TransportState};
pub use engine::uid::{UploadUid, UploadUidGenerator};
pub use error::UploadError;
pub use uploader::traits::{TransportResponse, Uploader};
