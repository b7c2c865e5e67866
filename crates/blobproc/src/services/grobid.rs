//! Client for the remote structured-fulltext (TEI XML) service.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::debug;

use crate::pdf::ProcessingStatus;

/// Responses above this size are rejected as malformed.
const MAX_RESPONSE_BYTES: usize = 12_000_000;

#[derive(Debug, Error)]
pub enum GrobidError {
    #[error("file too large")]
    FileTooLarge,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Wrapped response of one fulltext processing call. The hash of the
/// submitted file is echoed here so the caller can key the stored XML
/// without re-reading the file.
#[derive(Debug)]
pub struct GrobidResult {
    pub sha1hex: String,
    pub status_code: u16,
    pub status: ProcessingStatus,
    pub body: Vec<u8>,
}

impl GrobidResult {
    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Success
    }
}

/// Client for one service host.
#[derive(Debug, Clone)]
pub struct GrobidClient {
    server: String,
    /// Files above this size are refused before upload; 0 disables the
    /// check.
    max_file_size: u64,
    http: reqwest::Client,
}

impl GrobidClient {
    pub fn new(server: impl Into<String>, max_file_size: u64) -> Self {
        Self {
            server: server.into(),
            max_file_size,
            http: reqwest::Client::new(),
        }
    }

    /// Run full document analysis over a PDF on disk and return the TEI
    /// XML. Non-200 responses and oversized bodies are mapped to
    /// statuses rather than errors, so the caller can log and move on.
    pub async fn process_fulltext(&self, path: &Path) -> Result<GrobidResult, GrobidError> {
        let blob = tokio::fs::read(path)
            .await
            .map_err(|source| GrobidError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if self.max_file_size > 0 && blob.len() as u64 > self.max_file_size {
            return Ok(GrobidResult {
                sha1hex: hex::encode(Sha1::digest(&blob)),
                status_code: 0,
                status: ProcessingStatus::BlobTooLarge,
                body: Vec::new(),
            });
        }
        let sha1hex = hex::encode(Sha1::digest(&blob));
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{sha1hex}.pdf"));

        let part = Part::bytes(blob)
            .file_name(filename)
            .mime_str("application/pdf")
            .expect("static mime type is valid");
        // Fixed option set: generated identifiers, consolidated header,
        // raw citations and affiliations, TEI coordinates, sentence
        // segmentation. Citation consolidation stays off, too expensive.
        let form = Form::new()
            .part("input", part)
            .text("generateIDs", "1")
            .text("consolidateHeader", "1")
            .text("consolidateCitations", "0")
            .text("includeRawCitations", "1")
            .text("includeRawAffiliations", "1")
            .text("segmentSentences", "1")
            .text("teiCoordinates", "ref")
            .text("teiCoordinates", "figure")
            .text("teiCoordinates", "persName")
            .text("teiCoordinates", "formula")
            .text("teiCoordinates", "biblStruct");

        let response = self
            .http
            .post(format!(
                "{}/api/processFulltextDocument",
                self.server.trim_end_matches('/')
            ))
            .multipart(form)
            .send()
            .await?;
        let status_code = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(status_code, len = body.len(), "fulltext service response");

        let status = match status_code {
            200 if body.len() > MAX_RESPONSE_BYTES => ProcessingStatus::Error,
            200 => ProcessingStatus::Success,
            500..=599 => ProcessingStatus::GrobidError,
            _ => ProcessingStatus::Error,
        };
        Ok(GrobidResult {
            sha1hex,
            status_code,
            status,
            body,
        })
    }
}
