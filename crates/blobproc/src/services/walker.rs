//! Parallel walker over the spool directory, the derivation engine.
//!
//! One producer walks the sharded tree and hands `{path, size}` payloads
//! to N workers over a rendezvous channel, so the walk blocks while all
//! workers are busy. Each worker runs the per-file pipeline under a hard
//! deadline and removes the file afterwards unless retention is
//! requested. Partial failure is normal: a PDF leaves the spool after
//! one attempt regardless of how many artifacts succeeded, and
//! re-spooling the same bytes is the retry mechanism.

use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use bon::Builder;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::pdf::{self, ExtractOptions};
use crate::services::grobid::GrobidClient;
use crate::services::object_store::{BlobClient, BlobRequest};
use crate::spool::SHA1_HEX_LENGTH;

/// Poor man's metrics for one walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkStats {
    pub processed: usize,
    pub ok: usize,
}

impl WalkStats {
    /// Ratio of fully successful derivations to processed files,
    /// defined as 1.0 before anything was processed.
    pub fn success_ratio(&self) -> f64 {
        if self.processed == 0 {
            return 1.0;
        }
        self.ok as f64 / self.processed as f64
    }
}

/// What the producer hands to workers. The size rides along because the
/// walk already paid for the stat call.
#[derive(Debug, Clone)]
struct Payload {
    path: PathBuf,
    size: u64,
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("spool walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Walker configuration plus handles to the downstream services. Both
/// service handles are optional capabilities: without an object store
/// every put degrades to a debug log line, without a TEI client the
/// remote step is skipped. Derivations are idempotent, so a later run
/// with full wiring fills in whatever was missed.
#[derive(Builder)]
pub struct SpoolWalker {
    #[builder(into)]
    dir: PathBuf,
    #[builder(default = 1)]
    workers: usize,
    #[builder(default = Duration::from_secs(300))]
    timeout: Duration,
    #[builder(default)]
    keep_spool: bool,
    #[builder(default = 256 * 1024 * 1024)]
    grobid_max_file_size: u64,
    #[builder(default)]
    extract_options: ExtractOptions,
    s3: Option<Arc<BlobClient>>,
    grobid: Option<Arc<GrobidClient>>,
}

impl SpoolWalker {
    /// Walk the spool once and process every regular, non-empty file.
    /// Returns after all workers drained the channel.
    pub async fn run(self) -> Result<WalkStats, WalkError> {
        let worker_count = self.workers.max(1);
        let walker = Arc::new(self);
        let (sender, receiver) = mpsc::channel::<Payload>(1);
        let receiver = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(StdMutex::new(WalkStats::default()));

        let mut join_set = JoinSet::new();
        for worker_idx in 0..worker_count {
            let walker = Arc::clone(&walker);
            let receiver = Arc::clone(&receiver);
            let stats = Arc::clone(&stats);
            join_set.spawn(async move { run_worker(worker_idx, walker, receiver, stats).await });
        }
        // Workers hold the only receiver handles from here on, so the
        // producer's send fails instead of blocking if every worker dies.
        drop(receiver);

        let dir = walker.dir.clone();
        let producer = tokio::task::spawn_blocking(move || -> Result<(), walkdir::Error> {
            for entry in WalkDir::new(&dir) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let size = entry.metadata()?.len();
                if size == 0 {
                    warn!(path = %entry.path().display(), "skipping empty file");
                    continue;
                }
                let payload = Payload {
                    path: entry.path().to_path_buf(),
                    size,
                };
                if sender.blocking_send(payload).is_err() {
                    // All workers gone; nothing left to feed.
                    break;
                }
            }
            Ok(())
        });

        // The sender lives inside the producer task, so the channel
        // closes when the walk is done and workers drain then stop.
        let walk_result = producer.await;
        while let Some(joined) = join_set.join_next().await {
            joined?;
        }
        walk_result??;

        let stats = *stats.lock().expect("stats mutex");
        Ok(stats)
    }

    async fn process_payload(&self, worker: usize, payload: &Payload, stats: &StdMutex<WalkStats>) {
        debug!(worker, path = %payload.path.display(), "processing");
        let started = Instant::now();
        {
            stats.lock().expect("stats mutex").processed += 1;
        }

        let derived_ok =
            match tokio::time::timeout(self.timeout, self.run_pipeline(worker, payload)).await {
                Ok(derived_ok) => derived_ok,
                Err(_) => {
                    warn!(
                        worker,
                        path = %payload.path.display(),
                        timeout = ?self.timeout,
                        "pipeline deadline exceeded, external tools killed"
                    );
                    false
                }
            };

        // The file leaves the spool after one attempt, success or not.
        if self.keep_spool {
            debug!(path = %payload.path.display(), "keeping file in spool");
        } else if let Err(err) = tokio::fs::remove_file(&payload.path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(err = %err, path = %payload.path.display(), "error removing file from spool");
            }
        }

        if derived_ok {
            stats.lock().expect("stats mutex").ok += 1;
        }
        debug!(worker, path = %payload.path.display(), elapsed = ?started.elapsed(), "processing finished");
    }

    /// One derivation attempt. Returns whether local extraction fully
    /// succeeded; artifact persistence and the remote step only log
    /// their failures.
    async fn run_pipeline(&self, worker: usize, payload: &Payload) -> bool {
        let mut result = pdf::process_file(&payload.path, &self.extract_options).await;

        let mut derived_ok = false;
        if !result.is_success() {
            warn!(
                worker,
                status = ?result.status.map(|s| s.to_string()),
                err = ?result.err.as_ref().map(|e| e.to_string()),
                path = %payload.path.display(),
                "derivation failed"
            );
        } else if result.sha1hex.len() != SHA1_HEX_LENGTH {
            warn!(worker, sha1 = %result.sha1hex, "invalid sha1 in derivation result");
        } else {
            derived_ok = true;
            if result.has_page0_thumbnail() {
                let thumbnail = std::mem::take(&mut result.page0_thumbnail);
                self.put_artifact("thumbnail", "pdf", thumbnail, &result.sha1hex, &self.thumbnail_ext())
                    .await;
            }
            if !result.text.is_empty() {
                let text = std::mem::take(&mut result.text).into_bytes();
                self.put_artifact("sandcrawler", "text", text, &result.sha1hex, "txt")
                    .await;
            }
        }

        if payload.size > self.grobid_max_file_size {
            warn!(
                path = %payload.path.display(),
                size = payload.size,
                "skipping too large file for remote fulltext"
            );
            return derived_ok;
        }
        let Some(grobid) = &self.grobid else {
            debug!("remote fulltext client not configured, skipping");
            return derived_ok;
        };
        match grobid.process_fulltext(&payload.path).await {
            Ok(gres) if gres.is_success() => {
                let sha1hex = gres.sha1hex.clone();
                self.put_artifact("sandcrawler", "grobid", gres.body, &sha1hex, "tei.xml")
                    .await;
            }
            Ok(gres) => {
                warn!(
                    worker,
                    status = %gres.status,
                    status_code = gres.status_code,
                    "remote fulltext failed"
                );
            }
            Err(err) => warn!(worker, err = %err, "remote fulltext failed"),
        }
        derived_ok
    }

    async fn put_artifact(&self, bucket: &str, folder: &str, blob: Vec<u8>, sha1hex: &str, ext: &str) {
        let Some(s3) = &self.s3 else {
            debug!(
                bucket,
                folder,
                sha1 = sha1hex,
                "object store unavailable, skipping put"
            );
            return;
        };
        let req = BlobRequest {
            folder: folder.to_string(),
            blob,
            sha1hex: sha1hex.to_string(),
            ext: ext.to_string(),
            prefix: String::new(),
            bucket: bucket.to_string(),
        };
        match s3.put_blob(req).await {
            Ok(resp) => debug!(bucket = %resp.bucket, key = %resp.key, "object store put ok"),
            Err(err) => error!(err = %err, sha1 = sha1hex, "object store put failed"),
        }
    }

    /// Thumbnail key extension derived from the raster options, e.g.
    /// `180px.jpg` for a 180 pixel wide JPEG.
    fn thumbnail_ext(&self) -> String {
        format!(
            "{}px{}",
            self.extract_options.dim.0,
            match self.extract_options.thumb_format {
                pdf::ThumbFormat::Jpeg => ".jpg",
                pdf::ThumbFormat::Png => ".png",
                pdf::ThumbFormat::Tiff => ".tiff",
            }
        )
    }
}

async fn run_worker(
    worker_idx: usize,
    walker: Arc<SpoolWalker>,
    receiver: Arc<Mutex<mpsc::Receiver<Payload>>>,
    stats: Arc<StdMutex<WalkStats>>,
) {
    loop {
        let payload = {
            let mut guard = receiver.lock().await;
            guard.recv().await
        };
        let Some(payload) = payload else {
            debug!(worker = worker_idx, "worker shutdown ok");
            break;
        };
        walker.process_payload(worker_idx, &payload, &stats).await;
    }
}
