//! HTTP ingress: accept binary PDF payloads and file them into the
//! sharded spool. A 202 response only confirms receipt; postprocessing
//! happens on the walker's schedule.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::fsutil;
use crate::services::object_store::is_sha1_hex;
use crate::services::urlmap::UrlMap;
use crate::spool::{self, SpoolDir};

/// Primary header carrying the capture URL of an uploaded payload.
pub const URLMAP_HTTP_HEADER: &str = "X-BLOBPROC-URL";
/// Legacy alias, consulted only when the primary header is absent.
pub const LEGACY_URLMAP_HTTP_HEADER: &str = "X-Heritrix-CURI";

const TEMP_FILE_PREFIX: &str = "blobprocd-";
const DEFAULT_MIN_FREE_DISK_PERCENT: u64 = 10;
const RETRY_AFTER_SECONDS: &str = "60";
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("listen address may not be empty")]
    EmptyListenAddr,
    #[error("invalid listen address `{address}`: {source}")]
    InvalidListenAddr {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to determine local address: {source}")]
    LocalAddr {
        #[source]
        source: io::Error,
    },
    #[error("failed to create spool directory {path}: {source}")]
    SpoolDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    UrlMap(#[from] crate::services::urlmap::UrlMapError),
    #[error("server error: {source}")]
    Serve {
        #[source]
        source: io::Error,
    },
}

/// Upload failure kinds that map to dedicated HTTP responses.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file size exceeds maximum allowed size of {0} bytes")]
    SizeExceeded(u64),
    #[error("content length mismatch, got {got}, expected {expected}")]
    ContentLengthMismatch { got: u64, expected: u64 },
}

/// Shared state of the ingress handlers.
#[derive(Debug)]
pub struct SpoolService {
    pub spool: SpoolDir,
    /// Advertised host:port, used to render absolute spool URLs.
    pub listen_addr: String,
    /// Optional audit table for (URL, SHA-1) pairs.
    pub urlmap: Option<UrlMap>,
    /// Uploads are refused while free disk falls below this percentage;
    /// 0 falls back to the default of 10.
    pub min_free_disk_percent: u64,
    /// Maximum accepted upload size in bytes; 0 disables the cap.
    pub max_file_size: u64,
}

/// One line of the spool listing.
#[derive(Debug, Serialize)]
struct SpoolListEntry {
    name: String,
    size: u64,
    t: String,
    url: String,
}

pub fn build_router(service: Arc<SpoolService>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/spool", post(upload).put(upload).get(list_spool))
        .route("/spool/{id}", get(spool_status))
        .with_state(service)
}

pub async fn serve(config: AppConfig) -> Result<(), ServerError> {
    let spool = SpoolDir::new(&config.spool.dir);
    tokio::fs::create_dir_all(spool.root())
        .await
        .map_err(|source| ServerError::SpoolDir {
            path: spool.root().to_path_buf(),
            source,
        })?;
    let urlmap = match &config.server.urlmap_path {
        Some(path) => Some(UrlMap::open(path).await?),
        None => None,
    };
    let service = Arc::new(SpoolService {
        spool,
        listen_addr: config.server.listen_addr.clone(),
        urlmap,
        min_free_disk_percent: config.server.min_free_disk_percent,
        max_file_size: config.server.max_file_size,
    });

    let listen_addr = parse_listen_addr(&config.server.listen_addr)?;
    let listener = bind_listener(listen_addr).await?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ServerError::LocalAddr { source })?;
    info!(%local_addr, spool = %config.spool.dir.display(), "ingress listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = build_router(service);

    let mut server_future = Box::pin(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(broadcast_shutdown(shutdown_tx))
            .await
    });
    let mut drain_timeout = Box::pin(drain_timeout_future(shutdown_rx));

    tokio::select! {
        result = server_future.as_mut() => {
            if let Err(source) = result {
                return Err(ServerError::Serve { source });
            }
        }
        _ = drain_timeout.as_mut() => {
            // Drain window elapsed; dropping the server future forces
            // termination of remaining connections.
        }
    }
    info!("ingress shutdown complete");
    Ok(())
}

async fn banner(State(service): State<Arc<SpoolService>>) -> impl IntoResponse {
    Json(json!({
        "id": "blobprocd",
        "about": format!(
            "Send your PDF payload to {}/spool - a 202 status only confirms receipt, \
             not successful postprocessing, which may take more time. Check the \
             Location header for the spool identifier.",
            service.listen_addr
        ),
    }))
}

/// HTTP 200 when the identifier is in the spool, 404 when it is not,
/// 400 for anything that is not a 40 character lowercase hex digest.
async fn spool_status(
    State(service): State<Arc<SpoolService>>,
    UrlPath(id): UrlPath<String>,
) -> Response {
    if !is_sha1_hex(&id) {
        debug!(id = %id, "invalid id");
        return plain(
            StatusCode::BAD_REQUEST,
            "id must be a 40 character lowercase hex digest",
        );
    }
    match service.spool.exists(&id) {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!(err = %err, id = %id, "spool existence check failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "failed to check spool")
        }
    }
}

/// Streamed newline-delimited JSON over all spooled files. The response
/// is a stream, not an atomic document: a walk error mid-stream
/// terminates the body, already emitted lines stand.
async fn list_spool(State(service): State<Arc<SpoolService>>) -> Response {
    if let Err(err) = std::fs::read_dir(service.spool.root()) {
        error!(err = %err, "failed to list files");
        return plain(
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to read spool directory",
        );
    }
    let root = service.spool.root().to_path_buf();
    let listen_addr = service.listen_addr.clone();
    let (sender, receiver) = tokio::sync::mpsc::channel::<Result<Bytes, io::Error>>(16);
    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(&root) {
            match render_list_line(entry, &listen_addr) {
                Ok(None) => continue,
                Ok(Some(line)) => {
                    if sender.blocking_send(Ok(Bytes::from(line))).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    error!(err = %err, "spool listing aborted");
                    let _ = sender.blocking_send(Err(err));
                    return;
                }
            }
        }
    });
    let stream = tokio_stream::wrappers::ReceiverStream::new(receiver);
    Body::from_stream(stream).into_response()
}

fn render_list_line(
    entry: Result<walkdir::DirEntry, walkdir::Error>,
    listen_addr: &str,
) -> Result<Option<String>, io::Error> {
    let entry = entry.map_err(io::Error::from)?;
    if !entry.file_type().is_file() {
        return Ok(None);
    }
    let id = spool::identifier_from_path(entry.path());
    if id.is_empty() {
        return Err(io::Error::other("zero length id"));
    }
    let metadata = entry.metadata().map_err(io::Error::from)?;
    let modified: DateTime<Utc> = metadata.modified()?.into();
    let entry = SpoolListEntry {
        url: format!("http://{listen_addr}/spool/{id}"),
        name: id,
        size: metadata.len(),
        t: modified.to_rfc3339(),
    };
    let mut line = serde_json::to_string(&entry).map_err(io::Error::other)?;
    line.push('\n');
    Ok(Some(line))
}

/// Receive a binary payload, stream it to a temp file while hashing,
/// and move it into the spool under its sharded SHA-1. Returns as soon
/// as the file is durable on disk.
async fn upload(
    State(service): State<Arc<SpoolService>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let started = Instant::now();

    // Admission first: disk headroom, then the declared size cap.
    match service.has_sufficient_disk_space().await {
        Ok(true) => {}
        Ok(false) => {
            warn!(dir = %service.spool.root().display(), "insufficient disk space, slowing down request");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, RETRY_AFTER_SECONDS)],
                "insufficient disk space\n",
            )
                .into_response();
        }
        Err(err) => {
            error!(err = %err, dir = %service.spool.root().display(), "failed to check disk space");
            return plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to check available disk space",
            );
        }
    }
    let declared = content_length(&headers);
    if service.max_file_size > 0 {
        if let Some(declared) = declared {
            if declared > service.max_file_size {
                warn!(size = declared, max = service.max_file_size, "file too large");
                return plain(StatusCode::PAYLOAD_TOO_LARGE, "file too large");
            }
        }
    }

    let tmp = match tempfile::Builder::new().prefix(TEMP_FILE_PREFIX).tempfile() {
        Ok(tmp) => tmp,
        Err(err) => {
            error!(err = %err, "failed to create temporary file");
            return plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create temporary file for upload",
            );
        }
    };
    let file = match tmp.reopen() {
        Ok(file) => file,
        Err(err) => {
            error!(err = %err, "failed to reopen temporary file");
            return plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create temporary file for upload",
            );
        }
    };

    let mut writer = tokio::fs::File::from_std(file);
    let mut hasher = Sha1::new();
    let mut written: u64 = 0;
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                error!(err = %err, "failed to drain request body");
                return plain(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to read request body",
                );
            }
        };
        if service.max_file_size > 0 && written + chunk.len() as u64 > service.max_file_size {
            let err = UploadError::SizeExceeded(service.max_file_size);
            warn!(max = service.max_file_size, err = %err, "file size limit exceeded");
            return plain(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!(
                    "file too large (maximum allowed: {} bytes)",
                    service.max_file_size
                ),
            );
        }
        hasher.update(&chunk);
        if let Err(err) = writer.write_all(&chunk).await {
            error!(err = %err, "failed to write upload to temporary file");
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "failed to write upload");
        }
        written += chunk.len() as u64;
    }
    if let Err(err) = writer.flush().await {
        error!(err = %err, "failed to flush temporary file");
        return plain(StatusCode::INTERNAL_SERVER_ERROR, "failed to write upload");
    }
    drop(writer);

    if let Some(declared) = declared {
        if declared != written {
            let err = UploadError::ContentLengthMismatch {
                got: written,
                expected: declared,
            };
            error!(err = %err, "content length mismatch");
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "content length mismatch");
        }
    }

    let digest = hex::encode(hasher.finalize());
    let spool_path = format!("/spool/{digest}");
    let spool_url = format!("http://{}{}", service.listen_addr, spool_path);
    let dst = match service.spool.sharded_path(&digest, true) {
        Ok(dst) => dst,
        Err(err) => {
            error!(err = %err, "could not determine sharded path");
            return plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to determine file path",
            );
        }
    };

    // Content-addressed, so an existing file of the same size is the
    // same payload; skip the overwrite and keep the stable location.
    match tokio::fs::metadata(&dst).await {
        Ok(metadata) if metadata.len() == written => {
            debug!(url = %spool_url, "found existing file in spool dir, skipping");
            return accepted(&spool_path);
        }
        Ok(_) => {
            warn!(path = %dst.display(), "existing spool file size differs, overwriting");
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            error!(err = %err, "failed to stat existing spool file");
            return plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to check if file exists",
            );
        }
    }

    let src = tmp.path().to_path_buf();
    let move_dst = dst.clone();
    let moved = tokio::task::spawn_blocking(move || fsutil::move_file(&move_dst, &src)).await;
    match moved {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(err = %err, "failed to move file");
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "failed to save file");
        }
        Err(err) => {
            error!(err = %err, "move task failed");
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "failed to save file");
        }
    }

    // Optionally record the capture URL. Nothing happens without the
    // header or without a configured audit table.
    let curi = headers
        .get(URLMAP_HTTP_HEADER)
        .or_else(|| headers.get(LEGACY_URLMAP_HTTP_HEADER))
        .and_then(|value| value.to_str().ok());
    if let Some(curi) = curi {
        debug!(file = %dst.display(), url = %spool_url, t = ?started.elapsed(), curi, "spooled file");
        if let Some(urlmap) = &service.urlmap {
            if let Err(err) = urlmap.insert(curi, &digest).await {
                warn!(err = %err, url = curi, sha1 = %digest, "could not update urlmap");
            }
        }
    } else {
        debug!(file = %dst.display(), url = %spool_url, t = ?started.elapsed(), "spooled file");
    }
    accepted(&spool_path)
}

impl SpoolService {
    async fn has_sufficient_disk_space(&self) -> Result<bool, io::Error> {
        let min_percent = if self.min_free_disk_percent == 0 {
            DEFAULT_MIN_FREE_DISK_PERCENT
        } else {
            self.min_free_disk_percent
        };
        let dir = self.spool.root().to_path_buf();
        let free = tokio::task::spawn_blocking(move || free_disk_percent(&dir))
            .await
            .map_err(io::Error::other)?;
        match free {
            Some(free) => Ok(free >= min_percent),
            None => {
                // No matching mount found; admission cannot be decided,
                // prefer availability.
                warn!(dir = %self.spool.root().display(), "cannot determine free disk space, admitting upload");
                Ok(true)
            }
        }
    }
}

/// Percent of free space on the filesystem holding `dir`, from the
/// longest matching mount point.
pub fn free_disk_percent(dir: &Path) -> Option<u64> {
    let canonical = dir.canonicalize().ok()?;
    let disks = sysinfo::Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| canonical.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| {
            let total = disk.total_space();
            if total == 0 {
                0
            } else {
                disk.available_space() * 100 / total
            }
        })
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn accepted(spool_path: &str) -> Response {
    (
        StatusCode::ACCEPTED,
        [(header::LOCATION, spool_path.to_string())],
        String::new(),
    )
        .into_response()
}

fn plain(status: StatusCode, message: &str) -> Response {
    (status, format!("{message}\n")).into_response()
}

fn parse_listen_addr(addr: &str) -> Result<SocketAddr, ServerError> {
    let trimmed = addr.trim();
    if trimmed.is_empty() {
        return Err(ServerError::EmptyListenAddr);
    }
    trimmed
        .parse()
        .map_err(|source| ServerError::InvalidListenAddr {
            address: trimmed.to_string(),
            source,
        })
}

async fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            address: addr.to_string(),
            source,
        })
}

fn broadcast_shutdown(sender: watch::Sender<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        wait_for_shutdown().await;
        if sender.send(true).is_err() {
            warn!("failed to broadcast shutdown event");
        }
    }
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to capture Ctrl+C signal");
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => warn!(%error, "failed to capture SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = sigterm => {}
    }
    info!("shutdown signal received; draining connections");
}

fn drain_timeout_future(
    mut receiver: watch::Receiver<bool>,
) -> impl Future<Output = ()> + Send + 'static {
    async move {
        if receiver.changed().await.is_ok() {
            tokio::time::sleep(DRAIN_TIMEOUT).await;
            warn!(
                seconds = DRAIN_TIMEOUT.as_secs(),
                "graceful shutdown timed out; continuing shutdown"
            );
        }
    }
}
