use std::path::PathBuf;

use thiserror::Error;

/// Problems that stop a run before anything is sent to a provider.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{var} not found in environment variables. Please check your .env file.")]
    MissingCredential { var: &'static str },

    #[error("No images found in {}. Please add some images and try again.", folder.display())]
    NoImages { folder: PathBuf },

    #[error(
        "No subfolders found in {}. Please create subfolders with images and try again.",
        folder.display()
    )]
    NoSubfolders { folder: PathBuf },
}

/// Failures reported by a provider after it accepted the request
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Prediction {status}: {message}")]
    Failed { status: String, message: String },

    #[error("Queue request {request_id} ended with status {status}")]
    QueueFailed { request_id: String, status: String },

    #[error("Provider output contained no image URLs")]
    NoOutput,
}
