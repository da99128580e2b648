//! Per-invocation result artifacts and tolerant NDJSON collection

use crate::scan_types::Finding;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

/// Request-scoped output file for one engine run.
///
/// The path is unique per allocation and the file is removed once read, or
/// when the handle is dropped on any other path.
#[derive(Debug)]
pub struct ResultArtifact {
    path: PathBuf,
}

impl ResultArtifact {
    pub fn allocate(dir: &Path) -> Self {
        ResultArtifact {
            path: dir.join(format!("{}.jsonl", Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ResultArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("Could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Parse one line. Blank lines, invalid JSON and non-object values yield `None`.
pub fn parse_line(line: &str) -> Option<Finding> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Finding>(line) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            tracing::debug!("Skipping non-object result line");
            None
        }
        Err(e) => {
            tracing::debug!("Skipping malformed result line: {}", e);
            None
        }
    }
}

/// Read every finding from `artifact` in emission order, then delete it.
///
/// A missing file means the engine wrote nothing and yields no findings.
pub async fn collect(artifact: ResultArtifact) -> std::io::Result<Vec<Finding>> {
    let file = match File::open(artifact.path()).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut segments = BufReader::new(file).split(b'\n');
    let mut findings = Vec::new();
    let mut skipped = 0usize;

    while let Some(segment) = segments.next_segment().await? {
        let line = String::from_utf8_lossy(&segment);
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(finding) => findings.push(finding),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(
            "Dropped {} unparseable result lines from {}",
            skipped,
            artifact.path().display()
        );
    }

    tokio::fs::remove_file(artifact.path()).await?;
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line(r#"{"template-id":"a"}"#),
            Some(json!({"template-id": "a"}))
        );
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("{not json"), None);
        assert_eq!(parse_line("42"), None);
    }

    #[test]
    fn test_allocations_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = ResultArtifact::allocate(dir.path());
        let b = ResultArtifact::allocate(dir.path());
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_tolerates_blank_and_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ResultArtifact::allocate(dir.path());
        let path = artifact.path().to_path_buf();
        std::fs::write(
            &path,
            "{\"template-id\":\"tech-detect\",\"host\":\"a\"}\n\n{\"broken\": \n",
        )
        .unwrap();

        let findings = collect(artifact).await.unwrap();
        assert_eq!(findings, vec![json!({"template-id": "tech-detect", "host": "a"})]);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_preserves_emission_order() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ResultArtifact::allocate(dir.path());
        std::fs::write(
            artifact.path(),
            "{\"n\":3}\n{\"n\":1}\r\n\u{0}\u{1}garbage\n{\"n\":2}",
        )
        .unwrap();

        let findings = collect(artifact).await.unwrap();
        let order: Vec<i64> = findings.iter().map(|f| f["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_missing_artifact_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ResultArtifact::allocate(dir.path());
        assert!(collect(artifact).await.unwrap().is_empty());
    }

    #[test]
    fn test_drop_removes_unread_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ResultArtifact::allocate(dir.path());
        let path = artifact.path().to_path_buf();
        std::fs::write(&path, "{\"partial\":true}\n").unwrap();
        drop(artifact);
        assert!(!path.exists());
    }
}
