use std::sync::Arc;

use crate::engine::request::FileDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragEventKind {
    Enter,
    Over,
    Leave,
    Drop,
    /// Selection made through a file picker input.
    Change,
}

/// Cursor affordance requested while dragging over a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropEffect {
    #[default]
    None,
    Copy,
    Move,
    Link,
}

/// Payload carried by drag events.
#[derive(Debug, Clone, Default)]
pub struct DataTransfer {
    pub files: Vec<Arc<FileDescriptor>>,
    pub drop_effect: DropEffect,
}

/// A platform drag event reduced to plain values.
#[derive(Debug, Clone)]
pub struct DragEvent {
    kind: DragEventKind,
    /// Element the event originated from (the region itself or a descendant).
    origin: String,
    pub data_transfer: Option<DataTransfer>,
    /// Files selected through a picker input, when the event comes from one.
    pub target_files: Vec<Arc<FileDescriptor>>,
    default_prevented: bool,
}

impl DragEvent {
    pub fn new(kind: DragEventKind) -> Self {
        Self {
            kind,
            origin: String::new(),
            data_transfer: Some(DataTransfer::default()),
            target_files: Vec::new(),
            default_prevented: false,
        }
    }

    pub fn enter() -> Self {
        Self::new(DragEventKind::Enter)
    }

    pub fn over() -> Self {
        Self::new(DragEventKind::Over)
    }

    pub fn leave() -> Self {
        Self::new(DragEventKind::Leave)
    }

    pub fn drop_files<I, F>(files: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Arc<FileDescriptor>>,
    {
        let mut event = Self::new(DragEventKind::Drop);
        event.data_transfer = Some(DataTransfer {
            files: files.into_iter().map(Into::into).collect(),
            drop_effect: DropEffect::None,
        });
        event
    }

    /// Change event from a file picker input.
    pub fn picker<I, F>(files: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Arc<FileDescriptor>>,
    {
        let mut event = Self::new(DragEventKind::Change);
        event.data_transfer = None;
        event.target_files = files.into_iter().map(Into::into).collect();
        event
    }

    /// Mark the element the event bubbled up from.
    pub fn from_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn kind(&self) -> DragEventKind {
        self.kind
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn drop_effect(&self) -> DropEffect {
        self.data_transfer
            .as_ref()
            .map(|dt| dt.drop_effect)
            .unwrap_or_default()
    }

    pub fn set_drop_effect(&mut self, effect: DropEffect) {
        if let Some(dt) = self.data_transfer.as_mut() {
            dt.drop_effect = effect;
        }
    }
}

/// Files carried by an event: the picker's selection when present, otherwise
/// the drop payload, otherwise nothing.
pub fn files_from_event(event: &DragEvent) -> Vec<Arc<FileDescriptor>> {
    if !event.target_files.is_empty() {
        return event.target_files.clone();
    }
    event
        .data_transfer
        .as_ref()
        .map(|dt| dt.files.clone())
        .unwrap_or_default()
}
