use std::path::PathBuf;
use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Errors that can occur while persisting an uploaded file
#[derive(Debug, Error)]
pub enum StorageError {
    /// Could not create the upload directory
    #[error("Failed to create upload directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the uploaded file
    #[error("Failed to write upload {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every candidate file name was already taken
    #[error("Could not find a free file name for {0}")]
    NameExhausted(String),
}

/// Errors returned by a threat analyzer
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The CSV file handed to the analyzer does not exist
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    /// Reading the CSV file failed
    #[error("Failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// The CSV content could not be parsed
    #[error("Invalid CSV: {0}")]
    Csv(String),

    /// A column the analyzer depends on is absent from the header
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// The external analysis command could not be started
    #[error("Failed to spawn analyzer command {program}: {message}")]
    Spawn { program: String, message: String },

    /// The external analysis command exited unsuccessfully
    #[error("Analyzer command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    /// The external analysis command produced output that is not JSON
    #[error("Analyzer output is not valid JSON: {0}")]
    InvalidOutput(String),

    /// The external analysis command did not finish in time
    #[error("Analyzer timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking analysis task panicked or was cancelled
    #[error("Analysis task failed: {0}")]
    Task(String),
}

/// Errors raised while handling an upload request
#[derive(Debug, Error)]
pub enum UploadError {
    /// The multipart body could not be read
    #[error("Malformed multipart body: {message}")]
    Multipart { status: StatusCode, message: String },

    /// The request did not carry a file under the expected field
    #[error("No file uploaded under '{0}'")]
    MissingFile(&'static str),

    /// Persisting the file failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The analyzer failed on the stored file
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
