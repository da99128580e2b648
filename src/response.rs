//! Outward response shapes, one per profile family

use crate::profiles::{ResponseShape, ScanProfile};
use crate::scan_types::{Finding, ScanResult};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ScanResponse {
    Full {
        target: String,
        findings: Vec<Finding>,
        count: usize,
        output: String,
        error: String,
    },
    Severity {
        target: String,
        severity: &'static str,
        findings: Vec<Finding>,
        count: usize,
    },
    Typed {
        target: String,
        #[serde(rename = "type")]
        kind: &'static str,
        findings: Vec<Finding>,
        count: usize,
    },
    Technologies {
        target: String,
        technologies: Vec<String>,
        details: Vec<Finding>,
        count: usize,
    },
}

pub fn assemble(profile: &ScanProfile, result: ScanResult) -> ScanResponse {
    let count = result.count();
    match profile.shape {
        ResponseShape::Full => ScanResponse::Full {
            target: result.target,
            findings: result.findings,
            count,
            output: result.stdout,
            error: result.stderr,
        },
        ResponseShape::Severity => ScanResponse::Severity {
            target: result.target,
            severity: profile.severity.unwrap_or_default(),
            findings: result.findings,
            count,
        },
        ResponseShape::Typed(kind) => ScanResponse::Typed {
            target: result.target,
            kind,
            findings: result.findings,
            count,
        },
        ResponseShape::Technologies => ScanResponse::Technologies {
            target: result.target,
            technologies: result.findings.iter().map(display_name).collect(),
            details: result.findings,
            count,
        },
    }
}

/// `info.name`, else `template-id`, else `"unknown"`.
pub fn display_name(finding: &Finding) -> String {
    finding
        .pointer("/info/name")
        .and_then(|v| v.as_str())
        .or_else(|| finding.get("template-id").and_then(|v| v.as_str()))
        .unwrap_or("unknown")
        .to_string()
}
