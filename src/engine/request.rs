// Upload data model: what a file is and what is sent alongside it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;

/// A file handed to the coordinator. Read-only; shared between the caller,
/// the batch and its transport through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Build a descriptor whose MIME type is guessed from the file name.
    pub fn guessed(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self::new(name, mime_type, data)
    }

    /// Read a file from disk, the file-picker path into the coordinator.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("path has no usable file name: {}", path.display()))?
            .to_string();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(Self::guessed(name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A value of the auxiliary form data. Scalars become one text field; a
/// list appends one field per element under the same key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<FieldValue>),
}

impl FieldValue {
    fn push_encoded(&self, key: &str, out: &mut Vec<(String, String)>) {
        match self {
            FieldValue::List(items) => {
                for item in items {
                    item.push_encoded(key, out);
                }
            }
            FieldValue::Text(s) => out.push((key.to_string(), s.clone())),
            FieldValue::Integer(n) => out.push((key.to_string(), n.to_string())),
            FieldValue::Float(f) => out.push((key.to_string(), f.to_string())),
            FieldValue::Bool(b) => out.push((key.to_string(), b.to_string())),
            FieldValue::Null => out.push((key.to_string(), String::new())),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(n as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Integer(n as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        FieldValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// Auxiliary form data sent alongside every file of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: BTreeMap<String, FieldValue>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flatten into `(name, value)` text form fields, in key order.
    pub fn encode(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            value.push_encoded(key, &mut out);
        }
        out
    }
}

/// Per-file options handed to the prepare hook. The hook may add or override
/// fields of its own copy of the batch data.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub data: FormData,
}

/// Everything one transport needs to perform its POST.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub url: String,
    pub field_name: String,
    pub data: FormData,
    pub file: Arc<FileDescriptor>,
}
