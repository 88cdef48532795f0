//! Consumed inference-engine interface.
//!
//! The coordinator owns exactly one engine instance at a time and replaces
//! it through [`EngineFactory::construct`]. Disposal is by drop. Engines
//! whose execution backend compiles on first use expose that through
//! [`InferenceEngine::is_still_compiling`], which the coordinator polls.
//!
//! A minimal memory-mapping factory is provided so the crate runs
//! stand-alone; real inference backends implement the traits.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use memmap2::Mmap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Model artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid model artifact: {0}")]
    InvalidFormat(String),

    #[error("Engine construction failed: {0}")]
    Construction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Execution backend the engine runs on.
///
/// Determines whether the coordinator must wait for a just-in-time
/// compilation step before declaring a swap successful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionBackend {
    #[default]
    Cpu,
    Cuda,
    TensorRt,
}

impl ExecutionBackend {
    /// True when the backend compiles the model on first use, so a swap
    /// must not report success the instant construction returns.
    pub fn requires_compile_wait(&self) -> bool {
        matches!(self, Self::TensorRt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::TensorRt => "tensorrt",
        }
    }
}

impl FromStr for ExecutionBackend {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            "tensorrt" => Ok(Self::TensorRt),
            other => Err(EngineError::Construction(format!(
                "unknown execution backend: {other}"
            ))),
        }
    }
}

impl fmt::Display for ExecutionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live inference engine bound to one model artifact.
///
/// Dropping the instance releases its resources.
pub trait InferenceEngine: Send + Sync {
    /// Path of the artifact this engine was constructed from.
    fn artifact_path(&self) -> &Path;

    /// True while a backend-side compilation step is still running.
    /// Backends without such a step return false unconditionally.
    fn is_still_compiling(&self) -> bool;
}

/// Constructs engine instances from artifact paths.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn construct(&self, artifact: &Path) -> Result<Box<dyn InferenceEngine>, EngineError>;
}

/// Stand-alone factory that memory-maps the artifact read-only.
///
/// Validates that the file exists and is non-empty; performs no tensor
/// execution. Useful as a default wiring and in tests.
pub struct MmapEngineFactory;

#[async_trait]
impl EngineFactory for MmapEngineFactory {
    async fn construct(&self, artifact: &Path) -> Result<Box<dyn InferenceEngine>, EngineError> {
        let mapped = MappedArtifact::open(artifact)?;
        Ok(Box::new(mapped))
    }
}

/// Memory-mapped model artifact for zero-copy access.
pub struct MappedArtifact {
    path: PathBuf,
    mmap: Mmap,
}

impl MappedArtifact {
    /// Memory-map an artifact file read-only.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            return Err(EngineError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        // SAFETY: the file is opened read-only and artifacts are not
        // modified while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        if mmap.is_empty() {
            return Err(EngineError::InvalidFormat(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    /// Artifact contents as a byte slice (zero-copy).
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl InferenceEngine for MappedArtifact {
    fn artifact_path(&self) -> &Path {
        &self.path
    }

    fn is_still_compiling(&self) -> bool {
        false
    }
}
