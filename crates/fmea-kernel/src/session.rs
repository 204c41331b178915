//! Per-run context object.
//!
//! A [`Session`] is created at the start of a pipeline run and passed to the
//! operations that touch the outside world. It owns the engine configuration
//! and records every document read during the run, so the final report can
//! state exactly which inputs it was computed from.

use crate::config::EngineConfig;
use crate::error::KernelError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::Path;

/// A document read during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRead {
    pub path: String,
    pub sha256: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    config: EngineConfig,
    documents: Vec<DocumentRead>,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            documents: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn documents(&self) -> &[DocumentRead] {
        &self.documents
    }

    /// Read a UTF-8 document and record it.
    pub fn read_document(&mut self, path: &Path) -> Result<String, KernelError> {
        let bytes = std::fs::read(path).map_err(|source| KernelError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        self.record(path, bytes)
    }

    /// Like [`Session::read_document`], but a missing file is `Ok(None)`.
    pub fn try_read_document(&mut self, path: &Path) -> Result<Option<String>, KernelError> {
        match std::fs::read(path) {
            Ok(bytes) => self.record(path, bytes).map(Some),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(KernelError::ReadFile {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn record(&mut self, path: &Path, bytes: Vec<u8>) -> Result<String, KernelError> {
        let digest = sha256_hex(&bytes);
        let len = bytes.len();
        let text = String::from_utf8(bytes).map_err(|err| KernelError::ReadFile {
            path: path.display().to_string(),
            source: std::io::Error::new(ErrorKind::InvalidData, err),
        })?;
        tracing::debug!(path = %path.display(), bytes = len, "read document");
        self.documents.push(DocumentRead {
            path: path.display().to_string(),
            sha256: digest,
            bytes: len,
        });
        Ok(text)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
