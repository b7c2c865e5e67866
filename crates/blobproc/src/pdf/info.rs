//! Parsed output of the two PDF metadata tools, `pdfinfo` (line oriented)
//! and `pdfcpu` (JSON).

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Union of the metadata both tools report for a single PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdfcpu: Option<PdfCpu>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdfinfo: Option<Info>,
}

impl Metadata {
    /// Flat summary shape kept for downstream consumers: page-0
    /// dimensions, page count and PDF version.
    pub fn pdf_extra(&self) -> PdfExtra {
        let dim = self
            .pdfinfo
            .as_ref()
            .map(Info::page_dim)
            .unwrap_or_default();
        PdfExtra {
            page0_height: dim.height,
            page0_width: dim.width,
            page_count: self.pdfinfo.as_ref().map(|i| i.pages).unwrap_or_default(),
            pdf_version: self
                .pdfinfo
                .as_ref()
                .map(|i| i.pdf_version.clone())
                .unwrap_or_default(),
        }
    }
}

/// Free-form extras dictionary, one entry per PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfExtra {
    #[serde(rename = "page0height", skip_serializing_if = "is_zero")]
    pub page0_height: f64,
    #[serde(rename = "page0width", skip_serializing_if = "is_zero")]
    pub page0_width: f64,
    #[serde(rename = "page_count", skip_serializing_if = "is_zero_int")]
    pub page_count: i64,
    #[serde(rename = "pdf_version", skip_serializing_if = "String::is_empty")]
    pub pdf_version: String,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn is_zero_int(v: &i64) -> bool {
    *v == 0
}

/// Structured output of `pdfcpu info -j`. One annoyance of pdfcpu is that
/// it expects the input file to carry a `.pdf` extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfCpu {
    #[serde(default)]
    pub header: PdfCpuHeader,
    #[serde(default)]
    pub infos: Vec<PdfCpuInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfCpuHeader {
    #[serde(default)]
    pub creation: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfCpuInfo {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub linearized: bool,
    #[serde(default)]
    pub modification_date: String,
    #[serde(default)]
    pub page_count: i64,
    #[serde(default)]
    pub page_sizes: Vec<PdfCpuPageSize>,
    #[serde(default)]
    pub permissions: i64,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub tagged: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfCpuPageSize {
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub width: f64,
}

/// Parsed `pdfinfo` output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub keywords: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creator: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub producer: String,
    #[serde(rename = "creation_date", skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
    #[serde(rename = "mod_date", skip_serializing_if = "String::is_empty")]
    pub mod_date: String,
    #[serde(rename = "custom_metadata")]
    pub custom_metadata: bool,
    #[serde(rename = "metadata_stream")]
    pub metadata_stream: bool,
    pub tagged: bool,
    #[serde(rename = "user_properties")]
    pub user_properties: bool,
    pub suspects: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub form: String,
    pub javascript: bool,
    pub pages: i64,
    pub encrypted: bool,
    #[serde(rename = "page_size", skip_serializing_if = "String::is_empty")]
    pub page_size: String,
    #[serde(rename = "page_rot")]
    pub page_rot: i64,
    #[serde(rename = "filesize")]
    pub file_size: i64,
    pub optimized: bool,
    #[serde(rename = "pdf_version", skip_serializing_if = "String::is_empty")]
    pub pdf_version: String,
    #[serde(rename = "pdf_subtype", skip_serializing_if = "String::is_empty")]
    pub pdf_subtype: String,
}

/// Width and height of a page in pts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageDim {
    pub width: f64,
    pub height: f64,
}

impl Info {
    /// Parse the "Page size" field, e.g. `595.276 x 841.89 pts (A4)`,
    /// into a dimension pair. Unparsable input yields the zero value.
    pub fn page_dim(&self) -> PageDim {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"(?P<width>[0-9.]+)\s*x\s*(?P<height>[0-9.]+)").expect("page size pattern")
        });
        let Some(captures) = re.captures(&self.page_size) else {
            return PageDim::default();
        };
        let width = captures["width"].parse();
        let height = captures["height"].parse();
        match (width, height) {
            (Ok(width), Ok(height)) => PageDim { width, height },
            _ => PageDim::default(),
        }
    }
}

/// Parse raw `pdfinfo` output into an [`Info`]. Unknown fields are
/// logged at debug level and skipped.
pub fn parse_info(s: &str) -> Info {
    let mut info = Info::default();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            "Title" => info.title = value.to_string(),
            "Subject" => info.subject = value.to_string(),
            "Keywords" => info.keywords = value.to_string(),
            "Author" => info.author = value.to_string(),
            "Creator" => info.creator = value.to_string(),
            "Producer" => info.producer = value.to_string(),
            "CreationDate" => info.creation_date = value.to_string(),
            "ModDate" => info.mod_date = value.to_string(),
            "Custom Metadata" => info.custom_metadata = parse_bool(value),
            "Metadata Stream" => info.metadata_stream = parse_bool(value),
            "Tagged" => info.tagged = parse_bool(value),
            "UserProperties" => info.user_properties = parse_bool(value),
            "Suspects" => info.suspects = parse_bool(value),
            "Form" => info.form = value.to_string(),
            "JavaScript" => info.javascript = parse_bool(value),
            "Pages" => info.pages = parse_int(value),
            "Encrypted" => info.encrypted = parse_bool(value),
            "Page size" => info.page_size = value.to_string(),
            "Page rot" => info.page_rot = parse_int(value),
            "File size" => info.file_size = parse_any_int(value),
            "Optimized" => info.optimized = parse_bool(value),
            "PDF version" => info.pdf_version = value.to_string(),
            "PDF subtype" => info.pdf_subtype = value.to_string(),
            other => tracing::debug!(field = other, "ignoring pdfinfo field"),
        }
    }
    info
}

fn parse_bool(s: &str) -> bool {
    s == "yes"
}

fn parse_int(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}

/// First whitespace-separated token that parses as an integer, e.g. the
/// number in `633850 bytes`.
fn parse_any_int(s: &str) -> i64 {
    s.split_whitespace()
        .find_map(|tok| tok.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LATEX_OUTPUT: &str = "
Title:
Subject:
Keywords:
Author:
Creator:         LaTeX with hyperref package
Producer:        pdfTeX-1.40.17
CreationDate:    Fri Jun  7 02:39:17 2019 CEST
ModDate:         Fri Jun  7 02:39:17 2019 CEST
Custom Metadata: yes
Metadata Stream: no
Tagged:          no
UserProperties:  no
Suspects:        no
Form:            none
JavaScript:      no
Pages:           8
Encrypted:       no
Page size:       595.276 x 841.89 pts (A4)
Page rot:        0
File size:       633850 bytes
Optimized:       no
PDF version:     1.5
";

    #[test]
    fn parse_empty() {
        assert_eq!(parse_info(""), Info::default());
    }

    #[test]
    fn parse_latex_output() {
        let info = parse_info(LATEX_OUTPUT);
        assert_eq!(
            info,
            Info {
                creator: "LaTeX with hyperref package".to_string(),
                producer: "pdfTeX-1.40.17".to_string(),
                creation_date: "Fri Jun  7 02:39:17 2019 CEST".to_string(),
                mod_date: "Fri Jun  7 02:39:17 2019 CEST".to_string(),
                custom_metadata: true,
                form: "none".to_string(),
                pages: 8,
                page_size: "595.276 x 841.89 pts (A4)".to_string(),
                file_size: 633_850,
                pdf_version: "1.5".to_string(),
                ..Info::default()
            }
        );
    }

    #[test]
    fn parse_word_output_keeps_colons_in_values() {
        let info = parse_info(
            "Title:           Choose the red pill <i>and</i> the blue pill: a position paper\n\
             Producer:        Mac OS X 10.5.5 Quartz PDFContext\n\
             Page size:       612 x 792 pts (letter)\n\
             Optimized:       yes\n",
        );
        assert_eq!(
            info.title,
            "Choose the red pill <i>and</i> the blue pill: a position paper"
        );
        assert_eq!(info.producer, "Mac OS X 10.5.5 Quartz PDFContext");
        assert!(info.optimized);
    }

    #[test]
    fn page_dim_vectors() {
        let mut info = Info {
            page_size: "463.059 x 668.047 pts".to_string(),
            ..Info::default()
        };
        assert_eq!(
            info.page_dim(),
            PageDim {
                width: 463.059,
                height: 668.047
            }
        );

        info.page_size = "595 x 882 pts".to_string();
        assert_eq!(
            info.page_dim(),
            PageDim {
                width: 595.0,
                height: 882.0
            }
        );

        info.page_size = "not a dimension".to_string();
        assert_eq!(info.page_dim(), PageDim::default());
    }

    #[test]
    fn pdf_extra_from_parsed_info() {
        let metadata = Metadata {
            pdfcpu: None,
            pdfinfo: Some(parse_info(LATEX_OUTPUT)),
        };
        let extra = metadata.pdf_extra();
        assert_eq!(extra.page_count, 8);
        assert_eq!(extra.pdf_version, "1.5");
        assert_eq!(extra.page0_width, 595.276);
        assert_eq!(extra.page0_height, 841.89);
    }

    #[test]
    fn pdfcpu_json_roundtrip() {
        let raw = r#"{
            "header": {"creation": "2024-01-02", "version": "pdfcpu v0.6.0"},
            "infos": [{
                "author": "Jane Roe",
                "pageCount": 8,
                "pageSizes": [{"height": 841.89, "width": 595.276}],
                "producer": "pdfTeX-1.40.17",
                "version": "1.5"
            }]
        }"#;
        let parsed: PdfCpu = serde_json::from_str(raw).expect("pdfcpu output parses");
        assert_eq!(parsed.infos.len(), 1);
        assert_eq!(parsed.infos[0].page_count, 8);
        assert_eq!(parsed.infos[0].page_sizes[0].width, 595.276);
    }
}
