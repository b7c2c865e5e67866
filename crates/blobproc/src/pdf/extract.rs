//! Derivation pipeline over a single PDF blob.
//!
//! The heavy lifting happens in child processes: `pdftotext` for the
//! fulltext, `pdftoppm` for the page-0 thumbnail, `pdfinfo` and `pdfcpu`
//! for metadata. All children are spawned with kill-on-drop, so the
//! caller's deadline reliably tears down in-flight tools.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tokio::process::Command;

use super::fileinfo::FileInfo;
use super::info::{Metadata, PdfCpu, PdfExtra, parse_info};
use super::{BAD_PDF_SHA1HEX, ProcessingStatus};

/// Thumbnails smaller than this are treated as absent; very small images
/// mean something went wrong during rasterization.
const MIN_THUMBNAIL_BYTES: usize = 50;

/// Output format for the page-0 thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThumbFormat {
    #[default]
    Jpeg,
    Png,
    Tiff,
}

impl ThumbFormat {
    fn flag(self) -> &'static str {
        match self {
            ThumbFormat::Jpeg => "-jpeg",
            ThumbFormat::Png => "-png",
            ThumbFormat::Tiff => "-tiff",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ThumbFormat::Jpeg => ".jpg",
            ThumbFormat::Png => ".png",
            ThumbFormat::Tiff => ".tiff",
        }
    }
}

/// Controls for the derivation run.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Thumbnail target dimensions in pixels (width, height).
    pub dim: (u32, u32),
    pub thumb_format: ThumbFormat,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dim: (180, 300),
            thumb_format: ThumbFormat::Jpeg,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no data")]
    NoData,
    #[error("missing {0} executable")]
    MissingTool(&'static str),
    #[error("{tool} failed: {message}")]
    Tool {
        tool: &'static str,
        message: String,
    },
    #[error("mimetype is {0}")]
    NotPdf(String),
    #[error("PDF known to cause processing issues")]
    KnownBadPdf,
    #[error("zero length text")]
    EmptyText,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("scratch file: {0}")]
    Scratch(#[source] io::Error),
    #[error("unparsable pdfcpu output: {0}")]
    MetadataJson(#[source] serde_json::Error),
}

/// Everything one derivation run produced. Partial results coexist with
/// an error: the first failing step is recorded and later steps are
/// skipped, but file info and the hash survive where available.
#[derive(Debug, Default, Serialize)]
pub struct ExtractResult {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sha1hex: String,
    pub status: Option<ProcessingStatus>,
    #[serde(serialize_with = "serialize_err", skip_serializing_if = "Option::is_none")]
    pub err: Option<ExtractError>,
    #[serde(rename = "fileinfo", skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(
        rename = "page0thumbnail",
        serialize_with = "serialize_base64",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub page0_thumbnail: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(rename = "pdfextra", skip_serializing_if = "Option::is_none")]
    pub pdf_extra: Option<PdfExtra>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weblinks: Vec<String>,
}

impl ExtractResult {
    /// Whether the run produced a usable page-0 thumbnail.
    pub fn has_page0_thumbnail(&self) -> bool {
        self.page0_thumbnail.len() > MIN_THUMBNAIL_BYTES
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(ProcessingStatus::Success)
    }

    fn failed(sha1hex: String, status: ProcessingStatus, err: ExtractError) -> Self {
        Self {
            sha1hex,
            status: Some(status),
            err: Some(err),
            ..Self::default()
        }
    }
}

fn serialize_err<S: Serializer>(
    err: &Option<ExtractError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match err {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
}

/// Run the full derivation over a file on disk.
pub async fn process_file(path: &Path, opts: &ExtractOptions) -> ExtractResult {
    let blob = match tokio::fs::read(path).await {
        Ok(blob) => blob,
        Err(source) => {
            return ExtractResult::failed(
                String::new(),
                ProcessingStatus::Error,
                ExtractError::Read {
                    path: path.to_path_buf(),
                    source,
                },
            );
        }
    };
    process_blob(&blob, opts).await
}

/// Run the full derivation over an in-memory blob. The blob is staged to
/// a scratch `.pdf` file because the metadata tools insist on the
/// extension.
pub async fn process_blob(blob: &[u8], opts: &ExtractOptions) -> ExtractResult {
    if blob.is_empty() {
        return ExtractResult::failed(String::new(), ProcessingStatus::Error, ExtractError::NoData);
    }
    let file_info = FileInfo::from_bytes(blob);
    let sha1hex = file_info.sha1hex.clone();

    if file_info.mimetype != "application/pdf" {
        let mut result = ExtractResult::failed(
            sha1hex,
            ProcessingStatus::NotPdf,
            ExtractError::NotPdf(file_info.mimetype.clone()),
        );
        result.file_info = Some(file_info);
        return result;
    }
    if BAD_PDF_SHA1HEX.contains(&sha1hex.as_str()) {
        let mut result = ExtractResult::failed(
            sha1hex,
            ProcessingStatus::BadPdf,
            ExtractError::KnownBadPdf,
        );
        result.file_info = Some(file_info);
        return result;
    }

    let scratch = match stage_scratch_pdf(blob).await {
        Ok(scratch) => scratch,
        Err(err) => return ExtractResult::failed(sha1hex, ProcessingStatus::Error, err),
    };
    let scratch_path = scratch.path().to_path_buf();

    let text = match extract_text(&scratch_path).await {
        Ok(text) if text.is_empty() => {
            return ExtractResult::failed(
                sha1hex,
                ProcessingStatus::EmptyPdf,
                ExtractError::EmptyText,
            );
        }
        Ok(text) => text,
        Err(err) => return ExtractResult::failed(sha1hex, ProcessingStatus::ParseError, err),
    };

    let page0_thumbnail = match extract_thumbnail(&scratch_path, opts).await {
        Ok(thumb) if thumb.len() < MIN_THUMBNAIL_BYTES => Vec::new(),
        Ok(thumb) => thumb,
        Err(err) => return ExtractResult::failed(sha1hex, ProcessingStatus::ParseError, err),
    };

    let metadata = match extract_metadata(&scratch_path).await {
        Ok(metadata) => metadata,
        Err(err) => return ExtractResult::failed(sha1hex, ProcessingStatus::ParseError, err),
    };

    let text = String::from_utf8_lossy(&text).into_owned();
    let weblinks = extract_weblinks(&text);
    let pdf_extra = metadata.pdf_extra();

    ExtractResult {
        sha1hex,
        status: Some(ProcessingStatus::Success),
        err: None,
        file_info: Some(file_info),
        text,
        page0_thumbnail,
        metadata: Some(metadata),
        pdf_extra: Some(pdf_extra),
        weblinks,
    }
}

async fn stage_scratch_pdf(blob: &[u8]) -> Result<tempfile::NamedTempFile, ExtractError> {
    let scratch = tempfile::Builder::new()
        .prefix("blobproc-pdf-")
        .suffix(".pdf")
        .tempfile()
        .map_err(ExtractError::Scratch)?;
    tokio::fs::write(scratch.path(), blob)
        .await
        .map_err(ExtractError::Scratch)?;
    Ok(scratch)
}

/// Fulltext via `pdftotext -layout <file> -`.
async fn extract_text(filename: &Path) -> Result<Vec<u8>, ExtractError> {
    run_tool(
        "pdftotext",
        &[
            "-layout".as_ref(),
            filename.as_os_str(),
            "-".as_ref(),
        ],
    )
    .await
}

/// Page-0 raster via `pdftoppm`, written next to the scratch file and
/// read back.
async fn extract_thumbnail(filename: &Path, opts: &ExtractOptions) -> Result<Vec<u8>, ExtractError> {
    let (width, height) = opts.dim;
    let mut prefix = filename.as_os_str().to_os_string();
    prefix.push(".page0.wip");
    let mut dst = prefix.clone();
    dst.push(opts.thumb_format.extension());

    let width = width.to_string();
    let height = height.to_string();
    let output = run_tool(
        "pdftoppm",
        &[
            opts.thumb_format.flag().as_ref(),
            "-f".as_ref(),
            "1".as_ref(),
            "-l".as_ref(),
            "1".as_ref(),
            "-singlefile".as_ref(),
            "-scale-to-x".as_ref(),
            width.as_ref(),
            "-scale-to-y".as_ref(),
            height.as_ref(),
            filename.as_os_str(),
            prefix.as_os_str(),
        ],
    )
    .await;
    if let Err(err) = output {
        let _ = tokio::fs::remove_file(&dst).await;
        return Err(err);
    }
    let thumb = tokio::fs::read(&dst).await.map_err(|source| ExtractError::Read {
        path: PathBuf::from(&dst),
        source,
    });
    let _ = tokio::fs::remove_file(&dst).await;
    thumb
}

/// Metadata union: `pdfinfo` (line output) and `pdfcpu info -j` (JSON).
async fn extract_metadata(filename: &Path) -> Result<Metadata, ExtractError> {
    let raw = run_tool("pdfinfo", &[filename.as_os_str()]).await?;
    let pdfinfo = parse_info(&String::from_utf8_lossy(&raw));

    let raw = run_tool(
        "pdfcpu",
        &["info".as_ref(), "-j".as_ref(), filename.as_os_str()],
    )
    .await?;
    let pdfcpu: PdfCpu = serde_json::from_slice(&raw).map_err(ExtractError::MetadataJson)?;

    Ok(Metadata {
        pdfcpu: Some(pdfcpu),
        pdfinfo: Some(pdfinfo),
    })
}

async fn run_tool(
    tool: &'static str,
    args: &[&std::ffi::OsStr],
) -> Result<Vec<u8>, ExtractError> {
    let output = Command::new(tool)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                ExtractError::MissingTool(tool)
            } else {
                ExtractError::Tool {
                    tool,
                    message: err.to_string(),
                }
            }
        })?;
    if !output.status.success() {
        return Err(ExtractError::Tool {
            tool,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Absolute URLs from the fulltext: strict scheme match, zero-width
/// spaces stripped, sorted, adjacent duplicates removed.
fn extract_weblinks(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s<>"'\)\]\}]+"#).expect("weblink pattern")
    });
    let mut links: Vec<String> = re
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim()
                .replace('\u{200b}', "")
                .trim_end_matches(['.', ',', ';', ':'])
                .to_string()
        })
        .collect();
    links.sort();
    links.dedup();
    links
}
