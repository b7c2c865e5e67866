//! IO-bound collaborators of the pipeline: object store, remote TEI
//! service, audit table, and the spool walker that drives them.

pub mod grobid;
pub mod object_store;
pub mod urlmap;
pub mod walker;

pub use grobid::{GrobidClient, GrobidError, GrobidResult};
pub use object_store::{
    BlobClient, BlobError, BlobRequest, PutBlobResponse, blob_path, content_type_for, is_sha1_hex,
};
pub use urlmap::{UrlMap, UrlMapError};
pub use walker::{SpoolWalker, WalkError, WalkStats};
