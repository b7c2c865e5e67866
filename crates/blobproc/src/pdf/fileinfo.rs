//! Checksums, size and mimetype for an in-memory blob.

use std::io;
use std::path::Path;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;

/// Size and checksums for a file. All digests are lowercase hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub size: u64,
    pub sha1hex: String,
    pub sha256hex: String,
    pub md5hex: String,
    pub mimetype: String,
}

impl FileInfo {
    pub fn from_bytes(p: &[u8]) -> Self {
        Self {
            size: p.len() as u64,
            sha1hex: hex::encode(Sha1::digest(p)),
            sha256hex: hex::encode(Sha256::digest(p)),
            md5hex: hex::encode(Md5::digest(p)),
            mimetype: sniff_mimetype(p).to_string(),
        }
    }

    pub async fn from_file(path: &Path) -> io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(&bytes))
    }
}

/// Minimal content sniffing over magic bytes. The pipeline only needs to
/// separate PDFs from everything else; the remaining labels cover the
/// artifact types this system itself produces.
pub fn sniff_mimetype(p: &[u8]) -> &'static str {
    if p.starts_with(b"%PDF-") {
        "application/pdf"
    } else if p.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if p.starts_with(&[0xff, 0xd8, 0xff]) {
        "image/jpeg"
    } else if p.starts_with(b"<?xml") {
        "application/xml"
    } else if std::str::from_utf8(p).is_ok() {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}
