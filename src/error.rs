use std::path::PathBuf;

use thiserror::Error;

/// The source artifact could not be turned into a document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read tafsir source {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable root element in {path:?}")]
    NoRoot { path: PathBuf },
}

/// Failure inside the linguistic or theme analysis of one verse.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("tokenizer failed: {0}")]
    Tokenize(String),
    #[error("language model failed: {0}")]
    Model(String),
}

/// Failure writing one chapter's output artifact.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create output directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize chapter for {path:?}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that terminate a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("processing failed for sura {index}")]
    Chapter {
        index: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
