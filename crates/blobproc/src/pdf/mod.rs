//! PDF derivation: checksums, fulltext, page-0 thumbnail, metadata and
//! weblink extraction over external tools.

mod badlist;
mod extract;
mod fileinfo;
mod info;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub use badlist::BAD_PDF_SHA1HEX;
pub use extract::{
    ExtractError, ExtractOptions, ExtractResult, ThumbFormat, process_blob, process_file,
};
pub use fileinfo::{FileInfo, sniff_mimetype};
pub use info::{Info, Metadata, PageDim, PdfCpu, PdfExtra, parse_info};

/// Outcome classification shared by the derivation pipeline and the TEI
/// service client. The string forms are part of the operational contract
/// and appear in logs and JSON output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStatus {
    Success,
    NotPdf,
    BadPdf,
    EmptyPdf,
    ParseError,
    BlobTooLarge,
    GrobidError,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_are_kebab_case() {
        assert_eq!(ProcessingStatus::Success.to_string(), "success");
        assert_eq!(ProcessingStatus::NotPdf.to_string(), "not-pdf");
        assert_eq!(ProcessingStatus::BadPdf.to_string(), "bad-pdf");
        assert_eq!(ProcessingStatus::EmptyPdf.to_string(), "empty-pdf");
        assert_eq!(ProcessingStatus::ParseError.to_string(), "parse-error");
        assert_eq!(ProcessingStatus::BlobTooLarge.to_string(), "blob-too-large");
        assert_eq!(ProcessingStatus::GrobidError.to_string(), "grobid-error");
        assert_eq!(ProcessingStatus::Error.to_string(), "error");
    }

    #[test]
    fn status_parses_back() {
        use std::str::FromStr;
        assert_eq!(
            ProcessingStatus::from_str("empty-pdf").expect("known status"),
            ProcessingStatus::EmptyPdf
        );
        assert!(ProcessingStatus::from_str("no-such-status").is_err());
    }
}
