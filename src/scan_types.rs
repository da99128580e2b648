//! Shared scan request/result types

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One engine result record, kept exactly as emitted.
pub type Finding = Value;

/// Inbound scan parameters. Which fields matter depends on the profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub target: String,
    pub templates: Option<String>,
    pub tags: Option<String>,
    pub severity: Option<String>,
    pub args: Option<String>,
    pub year: Option<Year>,
}

/// CVE year filter; clients send either `2024` or `"2023,2024"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(u64),
    Text(String),
}

impl Year {
    pub fn as_text(&self) -> String {
        match self {
            Year::Number(n) => n.to_string(),
            Year::Text(s) => s.trim().to_string(),
        }
    }
}

impl ScanRequest {
    #[cfg(test)]
    pub fn new(target: impl Into<String>) -> Self {
        ScanRequest {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Trimmed target, rejected when empty or flag-like.
    pub fn validated_target(&self) -> Result<&str, ScanError> {
        let target = self.target.trim();
        if target.is_empty() {
            return Err(ScanError::validation("target required"));
        }
        reject_flag_like("target", target)?;
        Ok(target)
    }
}

/// Trimmed, non-empty value of an optional structured field.
pub fn field_value<'a>(name: &str, value: Option<&'a str>) -> Result<Option<&'a str>, ScanError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => {
            reject_flag_like(name, v)?;
            Ok(Some(v))
        }
        _ => Ok(None),
    }
}

fn reject_flag_like(name: &str, value: &str) -> Result<(), ScanError> {
    if value.starts_with('-') {
        return Err(ScanError::validation(format!(
            "{} must not start with '-'",
            name
        )));
    }
    Ok(())
}

/// Outcome of one engine run, before it is shaped for the client.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub profile: &'static str,
    pub target: String,
    pub findings: Vec<Finding>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ScanResult {
    pub fn count(&self) -> usize {
        self.findings.len()
    }
}

/// Profile metadata listed by `GET /profiles`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInfo {
    pub name: &'static str,
    pub route: &'static str,
    pub templates: Vec<&'static str>,
    pub severity: Option<&'static str>,
    pub timeout_secs: u64,
}
