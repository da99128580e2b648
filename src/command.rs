//! Engine argument vector construction

use crate::error::ScanError;
use crate::profiles::{ScanKind, ScanProfile};
use crate::sanitize;
use crate::scan_types::{field_value, ScanRequest};
use std::path::Path;
use std::time::Duration;

/// A concrete engine run: arguments (program excluded) and its wall-clock limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Merge a profile with a request into an engine invocation writing to `artifact`.
///
/// Order: target, export, `-silent`, selectors, tags, severity, profile flags,
/// then sanitized extra tokens.
pub fn build_invocation(
    profile: &ScanProfile,
    request: &ScanRequest,
    artifact: &Path,
) -> Result<EngineInvocation, ScanError> {
    let target = request.validated_target()?;

    let mut args = vec![
        "-u".to_string(),
        target.to_string(),
        "-json-export".to_string(),
        artifact.to_string_lossy().into_owned(),
        "-silent".to_string(),
    ];

    let mut extras = Vec::new();

    if profile.accepts_request_filters() {
        if let Some(templates) = field_value("templates", request.templates.as_deref())? {
            push_flag(&mut args, "-t", templates);
        }
        if let Some(tags) = field_value("tags", request.tags.as_deref())? {
            push_flag(&mut args, "-tags", tags);
        }
        if let Some(severity) = field_value("severity", request.severity.as_deref())? {
            push_flag(&mut args, "-severity", severity);
        }
        extras = sanitize::tokenize(request.args.as_deref());
    } else {
        for selector in profile.templates {
            push_flag(&mut args, "-t", selector);
        }
        if profile.kind == ScanKind::Cves {
            if let Some(year) = &request.year {
                let raw = year.as_text();
                if let Some(years) = field_value("year", Some(raw.as_str()))? {
                    push_flag(&mut args, "-tags", &cve_tags(years));
                }
            }
        }
        if let Some(severity) = profile.severity {
            push_flag(&mut args, "-severity", severity);
        }
    }

    args.extend(profile.fixed_args.iter().map(|a| a.to_string()));

    sanitize::guard_extra_flags(&extras, &args)?;
    args.extend(extras);

    Ok(EngineInvocation {
        args,
        timeout: profile.timeout,
    })
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

/// `2024` -> `cve2024`, `2023,2024` -> `cve2023,cve2024`
fn cve_tags(years: &str) -> String {
    years
        .split(',')
        .map(str::trim)
        .filter(|y| !y.is_empty())
        .map(|y| format!("cve{}", y))
        .collect::<Vec<_>>()
        .join(",")
}
