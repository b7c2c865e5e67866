//! Application-level error type shared across the CLI entrypoints.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::AppConfigError;
use crate::pdf::ExtractError;
use crate::server::ServerError;
use crate::services::grobid::GrobidError;
use crate::services::object_store::BlobError;
use crate::services::urlmap::UrlMapError;
use crate::services::walker::WalkError;
use crate::spool::SpoolError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    ConfigLoad(#[from] AppConfigError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Spool(#[from] SpoolError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Grobid(#[from] GrobidError),
    #[error(transparent)]
    UrlMap(#[from] UrlMapError),
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to read input file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("derivation failed with status {0}")]
    DerivationFailed(String),
}
