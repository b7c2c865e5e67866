//! Thin, content-aware wrapper over an S3-compatible object store.
//!
//! Objects are keyed by the SHA-1 of the PDF they derive from, fanned
//! out under the same two-level hex prefix tree as the spool:
//! `<prefix><folder>/<H[0:2]>/<H[2:4]>/<H><.ext>`.

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use md5::Md5;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::S3Config;
use crate::spool::SHA1_HEX_LENGTH;

/// Bucket used when a request names none.
pub const DEFAULT_BUCKET: &str = "sandcrawler";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid hash `{0}`, want 40 lowercase hex characters")]
    InvalidHash(String),
    #[error("put integrity mismatch for {key}: backend etag {etag}")]
    PutIntegrity { key: String, etag: String },
    #[error("could not list buckets: {0}")]
    Connect(String),
    #[error("bucket {bucket}: {message}")]
    Bucket { bucket: String, message: String },
    #[error("put {key}: {message}")]
    Put { key: String, message: String },
    #[error("get {key}: {message}")]
    Get { key: String, message: String },
}

/// Options for a single put or get, both keyed by content.
#[derive(Debug, Clone, Default)]
pub struct BlobRequest {
    /// Logical folder inside the bucket, e.g. "pdf", "text", "grobid".
    pub folder: String,
    pub blob: Vec<u8>,
    /// Lowercase hex SHA-1 of the source PDF; computed from the blob
    /// when empty on put.
    pub sha1hex: String,
    /// Key extension, with or without the leading dot.
    pub ext: String,
    /// Key prefix, e.g. "dev-" for staging buckets.
    pub prefix: String,
    /// Target bucket; the client default applies when empty.
    pub bucket: String,
}

/// Response echoing the final coordinates of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutBlobResponse {
    pub bucket: String,
    pub key: String,
}

/// Client over one S3-compatible endpoint with static credentials and
/// path-style addressing.
#[derive(Debug, Clone)]
pub struct BlobClient {
    client: Client,
    default_bucket: String,
}

impl BlobClient {
    /// Connect and sanity-check the endpoint by listing buckets. The
    /// caller decides whether a failure here is fatal; the walker runs
    /// degraded without a client.
    pub async fn connect(cfg: &S3Config) -> Result<Self, BlobError> {
        let credentials =
            Credentials::new(&cfg.access_key, &cfg.secret_key, None, None, "blobproc");
        let region = cfg.region.clone().unwrap_or_else(|| "us-east-1".to_string());
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(credentials)
            .load()
            .await;
        let conf = aws_sdk_s3::config::Builder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();
        let client = Client::from_conf(conf);

        let buckets = client
            .list_buckets()
            .send()
            .await
            .map_err(|err| BlobError::Connect(err.to_string()))?;
        info!(num_buckets = buckets.buckets().len(), "object store client ok");
        for bucket in buckets.buckets() {
            debug!(bucket = bucket.name().unwrap_or_default(), "found bucket");
        }

        let default_bucket = if cfg.default_bucket.is_empty() {
            DEFAULT_BUCKET.to_string()
        } else {
            cfg.default_bucket.clone()
        };
        Ok(Self {
            client,
            default_bucket,
        })
    }

    /// Store a blob under its content-derived key. Missing hashes are
    /// computed here; missing buckets are created. The backend ETag is
    /// compared against the MD5 of the payload, so a corrupted store
    /// write surfaces as [`BlobError::PutIntegrity`].
    pub async fn put_blob(&self, req: BlobRequest) -> Result<PutBlobResponse, BlobError> {
        let sha1hex = if req.sha1hex.is_empty() {
            hex::encode(Sha1::digest(&req.blob))
        } else {
            req.sha1hex
        };
        if !is_sha1_hex(&sha1hex) {
            return Err(BlobError::InvalidHash(sha1hex));
        }
        let key = blob_path(&req.folder, &sha1hex, &req.ext, &req.prefix);
        let bucket = if req.bucket.is_empty() {
            self.default_bucket.clone()
        } else {
            req.bucket
        };
        self.ensure_bucket(&bucket).await?;

        let md5hex = hex::encode(Md5::digest(&req.blob));
        let output = self
            .client
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .content_type(content_type_for(&req.ext))
            .body(ByteStream::from(req.blob))
            .send()
            .await
            .map_err(|err| {
                error!(%key, err = %err, "put object failed");
                BlobError::Put {
                    key: key.clone(),
                    message: err.to_string(),
                }
            })?;

        if let Some(etag) = output.e_tag() {
            let etag = etag.trim_matches('"');
            if etag != md5hex {
                return Err(BlobError::PutIntegrity {
                    key,
                    etag: etag.to_string(),
                });
            }
        }
        Ok(PutBlobResponse { bucket, key })
    }

    /// Fetch a blob back by content key. The request must carry the
    /// hash.
    pub async fn get_blob(&self, req: BlobRequest) -> Result<Vec<u8>, BlobError> {
        if !is_sha1_hex(&req.sha1hex) {
            return Err(BlobError::InvalidHash(req.sha1hex));
        }
        let key = blob_path(&req.folder, &req.sha1hex, &req.ext, &req.prefix);
        let bucket = if req.bucket.is_empty() {
            self.default_bucket.clone()
        } else {
            req.bucket
        };
        let output = self
            .client
            .get_object()
            .bucket(&bucket)
            .key(&key)
            .send()
            .await
            .map_err(|err| BlobError::Get {
                key: key.clone(),
                message: err.to_string(),
            })?;
        let bytes = output.body.collect().await.map_err(|err| BlobError::Get {
            key,
            message: err.to_string(),
        })?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BlobError> {
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                // A concurrent creator is not an error.
                if let SdkError::ServiceError(service_err) = &err {
                    let inner = service_err.err();
                    if inner.is_bucket_already_owned_by_you() || inner.is_bucket_already_exists() {
                        return Ok(());
                    }
                }
                error!(bucket, err = %err, "make bucket failed");
                Err(BlobError::Bucket {
                    bucket: bucket.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }
}

/// Object key for a folder, content hash, extension and prefix. The
/// extension gains a leading dot when it lacks one. An empty folder
/// yields the legacy leading-slash form, e.g. `/4e/12/4e12...`; backends
/// may or may not strip that slash.
pub fn blob_path(folder: &str, sha1hex: &str, ext: &str, prefix: &str) -> String {
    let ext = normalize_ext(ext);
    format!(
        "{}{}/{}/{}/{}{}",
        prefix,
        folder,
        &sha1hex[0..2],
        &sha1hex[2..4],
        sha1hex,
        ext
    )
}

fn normalize_ext(ext: &str) -> String {
    if !ext.is_empty() && !ext.starts_with('.') {
        format!(".{ext}")
    } else {
        ext.to_string()
    }
}

/// Content type by extension suffix. The extension is normalized first,
/// so both "txt" and "180px.jpg" resolve.
pub fn content_type_for(ext: &str) -> &'static str {
    let ext = normalize_ext(ext);
    if ext.ends_with(".xml") {
        "application/xml"
    } else if ext.ends_with(".png") {
        "image/png"
    } else if ext.ends_with(".jpg") || ext.ends_with(".jpeg") {
        "image/jpeg"
    } else if ext.ends_with(".txt") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

/// Whether `s` is a 40-character lowercase hex digest.
pub fn is_sha1_hex(s: &str) -> bool {
    s.len() == SHA1_HEX_LENGTH
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_path_cases() {
        struct Case {
            about: &'static str,
            folder: &'static str,
            sha1hex: &'static str,
            ext: &'static str,
            prefix: &'static str,
            want: &'static str,
        }
        let cases = [
            Case {
                about: "empty",
                folder: "",
                sha1hex: "4e1243bd22c66e76c2ba9eddc1f91394e57f9f83",
                ext: "",
                prefix: "",
                want: "/4e/12/4e1243bd22c66e76c2ba9eddc1f91394e57f9f83",
            },
            Case {
                about: "folder",
                folder: "images",
                sha1hex: "4e1243bd22c66e76c2ba9eddc1f91394e57f9f83",
                ext: "",
                prefix: "",
                want: "images/4e/12/4e1243bd22c66e76c2ba9eddc1f91394e57f9f83",
            },
            Case {
                about: "folder, ext",
                folder: "images",
                sha1hex: "4e1243bd22c66e76c2ba9eddc1f91394e57f9f83",
                ext: "xml",
                prefix: "",
                want: "images/4e/12/4e1243bd22c66e76c2ba9eddc1f91394e57f9f83.xml",
            },
            Case {
                about: "folder, ext, prefix",
                folder: "images",
                sha1hex: "4e1243bd22c66e76c2ba9eddc1f91394e57f9f83",
                ext: "xml",
                prefix: "dev-",
                want: "dev-images/4e/12/4e1243bd22c66e76c2ba9eddc1f91394e57f9f83.xml",
            },
            Case {
                about: "dotted ext kept as is",
                folder: "pdf",
                sha1hex: "4e1243bd22c66e76c2ba9eddc1f91394e57f9f83",
                ext: ".180px.jpg",
                prefix: "",
                want: "pdf/4e/12/4e1243bd22c66e76c2ba9eddc1f91394e57f9f83.180px.jpg",
            },
        ];
        for case in cases {
            assert_eq!(
                blob_path(case.folder, case.sha1hex, case.ext, case.prefix),
                case.want,
                "[{}]",
                case.about
            );
        }
    }

    #[test]
    fn content_type_table() {
        assert_eq!(content_type_for("tei.xml"), "application/xml");
        assert_eq!(content_type_for("png"), "image/png");
        assert_eq!(content_type_for("180px.jpg"), "image/jpeg");
        assert_eq!(content_type_for("jpeg"), "image/jpeg");
        assert_eq!(content_type_for("txt"), "text/plain");
        assert_eq!(content_type_for(""), "application/octet-stream");
        assert_eq!(content_type_for("bin"), "application/octet-stream");
    }

    #[test]
    fn sha1_hex_validation() {
        assert!(is_sha1_hex("4e1243bd22c66e76c2ba9eddc1f91394e57f9f83"));
        assert!(!is_sha1_hex(""));
        assert!(!is_sha1_hex("4e1243"));
        assert!(!is_sha1_hex("4E1243BD22C66E76C2BA9EDDC1F91394E57F9F83"));
        assert!(!is_sha1_hex("zz1243bd22c66e76c2ba9eddc1f91394e57f9f83"));
    }
}
