//! blobproc turns spooled PDF documents into derived artifacts.
//!
//! The crate is split into two halves that share one on-disk spool:
//!
//! - the ingress service (`server`) accepts raw PDF uploads over HTTP and
//!   files them into a SHA-1 sharded spool directory;
//! - the walker (`services::walker`) revisits the spool on its own
//!   schedule, runs local extraction tools and a remote TEI service over
//!   every file, and persists the results to an S3-compatible store.
//!
//! The spool directory is the only durable state. There is no broker and
//! no database on the critical path; a file's presence in the spool is
//! the sole signal that work remains.

pub mod cli;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod pdf;
pub mod server;
pub mod services;
pub mod spool;

pub use error::AppError;
