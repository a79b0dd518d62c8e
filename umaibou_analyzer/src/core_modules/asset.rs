// THEORY:
// An `Upload` is whatever the caller received; an `Asset` is an upload that
// passed the shape checks and may be sent to the renderer. The bytes live in a
// single immutable `Bytes` buffer, so each render call takes a cheap
// reference-counted clone instead of re-reading a stream.

use bytes::Bytes;

const USDZ_EXTENSION: &str = ".usdz";

/// Content type the renderer expects for the model part.
pub const USDZ_CONTENT_TYPE: &str = "model/vnd.usdz+zip";

/// A file as received from the caller, before any checks.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Rejections raised before any pipeline stage runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("No file uploaded")]
    NoFile,
    #[error("File must be a USDZ file")]
    NotUsdz,
}

/// A validated USDZ model held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct Asset {
    file_name: String,
    bytes: Bytes,
}

impl Asset {
    /// Accepts a present, non-empty upload whose name ends in `.usdz` (any case).
    pub fn from_upload(upload: Option<Upload>) -> Result<Self, InputError> {
        let upload = upload.ok_or(InputError::NoFile)?;
        if upload.bytes.is_empty() {
            return Err(InputError::NoFile);
        }
        if !has_usdz_extension(&upload.file_name) {
            return Err(InputError::NotUsdz);
        }
        Ok(Self {
            file_name: upload.file_name,
            bytes: upload.bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// A fresh handle on the asset bytes. Cloning `Bytes` never copies the payload.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Payload size in bytes. Never zero.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

fn has_usdz_extension(file_name: &str) -> bool {
    let split = file_name.len().saturating_sub(USDZ_EXTENSION.len());
    file_name
        .get(split..)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(USDZ_EXTENSION))
}
