//! Scan profile registry: one fixed entry per named scan kind

use crate::error::ScanError;
use crate::scan_types::ProfileInfo;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Custom,
    Quick,
    Cves,
    Technologies,
    Exposures,
    Misconfigs,
}

/// How a profile's results are presented to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Findings plus raw engine stdout/stderr
    Full,
    /// Findings tagged with the severity filter used
    Severity,
    /// Findings tagged with a scan type label
    Typed(&'static str),
    /// Flat technology names plus the underlying findings
    Technologies,
}

#[derive(Debug)]
pub struct ScanProfile {
    pub kind: ScanKind,
    pub name: &'static str,
    pub route: &'static str,
    /// Template selectors passed as `-t`, one flag each
    pub templates: &'static [&'static str],
    pub severity: Option<&'static str>,
    pub fixed_args: &'static [&'static str],
    pub timeout: Duration,
    pub shape: ResponseShape,
}

impl ScanProfile {
    /// Custom scans take selectors, tags, severity and extra args from the request.
    pub fn accepts_request_filters(&self) -> bool {
        self.kind == ScanKind::Custom
    }

    pub fn info(&self) -> ProfileInfo {
        ProfileInfo {
            name: self.name,
            route: self.route,
            templates: self.templates.to_vec(),
            severity: self.severity,
            timeout_secs: self.timeout.as_secs(),
        }
    }
}

pub static PROFILES: [ScanProfile; 6] = [
    ScanProfile {
        kind: ScanKind::Custom,
        name: "custom",
        route: "/scan",
        templates: &[],
        severity: None,
        fixed_args: &[],
        timeout: Duration::from_secs(300),
        shape: ResponseShape::Full,
    },
    ScanProfile {
        kind: ScanKind::Quick,
        name: "quick",
        route: "/quick",
        templates: &[],
        severity: Some("critical,high"),
        fixed_args: &["-rate-limit", "150"],
        timeout: Duration::from_secs(180),
        shape: ResponseShape::Severity,
    },
    ScanProfile {
        kind: ScanKind::Cves,
        name: "cves",
        route: "/cves",
        templates: &["cves/"],
        severity: None,
        fixed_args: &[],
        timeout: Duration::from_secs(300),
        shape: ResponseShape::Typed("CVE scan"),
    },
    ScanProfile {
        kind: ScanKind::Technologies,
        name: "technologies",
        route: "/technologies",
        templates: &["technologies/"],
        severity: None,
        fixed_args: &[],
        timeout: Duration::from_secs(120),
        shape: ResponseShape::Technologies,
    },
    ScanProfile {
        kind: ScanKind::Exposures,
        name: "exposures",
        route: "/exposures",
        templates: &["exposures/", "exposed-panels/"],
        severity: None,
        fixed_args: &[],
        timeout: Duration::from_secs(180),
        shape: ResponseShape::Typed("exposures"),
    },
    ScanProfile {
        kind: ScanKind::Misconfigs,
        name: "misconfigs",
        route: "/misconfigs",
        templates: &["misconfiguration/", "miscellaneous/"],
        severity: None,
        fixed_args: &[],
        timeout: Duration::from_secs(180),
        shape: ResponseShape::Typed("misconfigurations"),
    },
];

impl ScanKind {
    pub fn profile(self) -> &'static ScanProfile {
        let index = match self {
            ScanKind::Custom => 0,
            ScanKind::Quick => 1,
            ScanKind::Cves => 2,
            ScanKind::Technologies => 3,
            ScanKind::Exposures => 4,
            ScanKind::Misconfigs => 5,
        };
        &PROFILES[index]
    }
}

impl FromStr for ScanKind {
    type Err = ScanError;

    /// Resolve a profile by its registry name, e.g. `"cves"`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        PROFILES
            .iter()
            .find(|p| p.name == name.trim())
            .map(|p| p.kind)
            .ok_or_else(|| ScanError::validation(format!("unknown scan profile: {}", name)))
    }
}
