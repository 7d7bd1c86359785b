#![warn(missing_docs)]
//! # notewall-store
//!
//! ## Purpose
//! Persists rendered artifacts at well-known paths and reports when they are
//! ready to be picked up by the external automation.
//!
//! ## Responsibilities
//! - Define the storage-agnostic [`ArtifactStore`] trait.
//! - Write artifacts atomically (temp file in the same directory + rename).
//! - Answer readiness: present, readable and non-empty.
//! - Persist simple boolean flags for collaborators ([`FlagStore`]).
//!
//! ## Data flow
//! Orchestrator saves [`RenderedArtifact`] values -> PNG files at
//! [`ArtifactStore::path_for`] -> readiness polling -> external process reads
//! the same paths.
//!
//! ## Ownership and lifetimes
//! The store owns nothing but its directory path; artifacts are borrowed for
//! the duration of one save.
//!
//! ## Concurrency
//! The rename is the only mutual exclusion with the external reader. A reader
//! sees either the previous complete file or the new complete file.
//!
//! ## Error model
//! I/O and encoding failures are reported as [`StoreError`]. Readiness checks
//! never error; any failure reads as "not ready".

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use notewall_core::{RenderedArtifact, Variant};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// File name of the home screen artifact.
pub const HOME_FILE_NAME: &str = "home-wallpaper.png";
/// File name of the lock screen artifact.
pub const LOCK_FILE_NAME: &str = "lock-wallpaper.png";
/// File name of the persisted flag set.
pub const FLAGS_FILE_NAME: &str = "flags.json";

/// Well-known file name for `variant`.
pub fn file_name_for(variant: Variant) -> &'static str {
    match variant {
        Variant::Home => HOME_FILE_NAME,
        Variant::Lock => LOCK_FILE_NAME,
    }
}

/// Receipt of one completed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    /// Saved variant.
    pub variant: Variant,
    /// Final path of the file.
    pub path: PathBuf,
    /// Encoded size in bytes.
    pub byte_len: u64,
    /// Hex SHA-256 of the encoded bytes.
    pub sha256: String,
}

/// Storage backend for rendered artifacts.
pub trait ArtifactStore: Send + Sync {
    /// Persists `artifact`, superseding any previous artifact of its variant.
    ///
    /// # Errors
    /// Returns [`StoreError`] when encoding or writing fails; the previous
    /// file, if any, is left untouched.
    fn save(&self, artifact: &RenderedArtifact) -> Result<SavedArtifact, StoreError>;

    /// Returns `true` only when the variant's file exists, is readable and is
    /// non-empty.
    fn is_ready(&self, variant: Variant) -> bool;

    /// Well-known path of the variant's file.
    fn path_for(&self, variant: Variant) -> PathBuf;
}

/// Filesystem-backed store under one application-private directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// Opens (and creates if needed) the storage directory.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] when the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, artifact: &RenderedArtifact) -> Result<SavedArtifact, StoreError> {
        let encoded = encode_png(artifact)?;
        let path = self.path_for(artifact.variant);
        write_atomic(&self.dir, &path, &encoded)?;

        let saved = SavedArtifact {
            variant: artifact.variant,
            path,
            byte_len: encoded.len() as u64,
            sha256: hex::encode(Sha256::digest(&encoded)),
        };
        info!(
            variant = %saved.variant,
            bytes = saved.byte_len,
            sha256 = %saved.sha256,
            "artifact persisted"
        );
        Ok(saved)
    }

    fn is_ready(&self, variant: Variant) -> bool {
        let path = self.path_for(variant);
        let ready = is_readable_non_empty(&path);
        debug!(%variant, ready, "readiness probe");
        ready
    }

    fn path_for(&self, variant: Variant) -> PathBuf {
        self.dir.join(file_name_for(variant))
    }
}

/// Readiness check on one opened handle, so all three facts describe the
/// same file even if a rename lands concurrently.
pub fn is_readable_non_empty(path: &Path) -> bool {
    File::open(path)
        .and_then(|file| file.metadata())
        .map(|metadata| metadata.is_file() && metadata.len() > 0)
        .unwrap_or(false)
}

/// Encodes an artifact as RGBA PNG.
///
/// # Errors
/// Returns [`StoreError::Encode`] when the encoder rejects the buffer.
pub fn encode_png(artifact: &RenderedArtifact) -> Result<Vec<u8>, StoreError> {
    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded)
        .write_image(
            &artifact.rgba,
            artifact.width,
            artifact.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|error| StoreError::Encode(error.to_string()))?;
    Ok(encoded)
}

/// Writes `bytes` to a temp file in `dir`, syncs it, then renames it over
/// `path`. The temp file is removed if any step fails.
///
/// # Errors
/// Returns [`StoreError::Io`] on any filesystem failure.
pub fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Same directory keeps the rename on one filesystem.
    let mut staged = NamedTempFile::new_in(dir).map_err(io_error)?;
    staged.write_all(bytes).map_err(io_error)?;
    staged.as_file().sync_all().map_err(io_error)?;
    staged.persist(path).map_err(|error| io_error(error.error))?;
    Ok(())
}

/// Persisted boolean flags (e.g. `setup_completed`) in one JSON object file.
#[derive(Debug)]
pub struct FlagStore {
    dir: PathBuf,
    path: PathBuf,
    lock: Mutex<()>,
}

impl FlagStore {
    /// Opens the flag file in `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] when the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(FLAGS_FILE_NAME);
        Ok(Self {
            dir,
            path,
            lock: Mutex::new(()),
        })
    }

    /// Flag value; missing file or missing flag reads as `false`.
    ///
    /// # Errors
    /// Returns [`StoreError::Corrupt`] when the file exists but is not a JSON
    /// object of booleans.
    pub fn get(&self, name: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(self.read_all()?.get(name).copied().unwrap_or(false))
    }

    /// Sets one flag, rewriting the file atomically.
    ///
    /// # Errors
    /// Returns [`StoreError`] on read, encode or write failure.
    pub fn set(&self, name: &str, value: bool) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut flags = self.read_all()?;
        flags.insert(name.to_string(), value);

        let encoded = serde_json::to_vec_pretty(&flags)
            .map_err(|error| StoreError::Encode(error.to_string()))?;
        write_atomic(&self.dir, &self.path, &encoded)?;
        debug!(flag = name, value, "flag persisted");
        Ok(())
    }

    fn read_all(&self) -> Result<BTreeMap<String, bool>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&raw).map_err(|error| StoreError::Corrupt(error.to_string()))
    }
}

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("i/o failure at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Artifact or flags could not be encoded.
    #[error("encode failure: {0}")]
    Encode(String),
    /// Flag file holds unexpected content.
    #[error("corrupt flag file: {0}")]
    Corrupt(String),
    /// A previous holder of the flag lock panicked.
    #[error("flag store lock poisoned")]
    LockPoisoned,
}
