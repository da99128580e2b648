//! Scanner - drives one engine run per request through a bounded pool

use crate::collector::{self, ResultArtifact};
use crate::command;
use crate::config::Config;
use crate::error::ScanError;
use crate::profiles::{ScanKind, ScanProfile};
use crate::response::{self, ScanResponse};
use crate::runner::{ProcessRunner, RunOutcome};
use crate::scan_types::{ScanRequest, ScanResult};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};

const VERSION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Scanner {
    runner: ProcessRunner,
    results_dir: PathBuf,
    slots: Semaphore,
    queue_timeout: Duration,
}

impl Scanner {
    pub fn new(config: &Config) -> Self {
        Scanner {
            runner: ProcessRunner::new(config.engine_bin.clone()),
            results_dir: config.results_dir.clone(),
            slots: Semaphore::new(config.max_concurrent_scans),
            queue_timeout: config.queue_timeout,
        }
    }

    pub async fn scan(
        &self,
        kind: ScanKind,
        request: &ScanRequest,
    ) -> Result<ScanResponse, ScanError> {
        self.scan_with_profile(kind.profile(), request).await
    }

    /// Validate, build, run and collect. Validation failures never reach the pool.
    pub async fn scan_with_profile(
        &self,
        profile: &ScanProfile,
        request: &ScanRequest,
    ) -> Result<ScanResponse, ScanError> {
        let artifact = ResultArtifact::allocate(&self.results_dir);
        let invocation = command::build_invocation(profile, request, artifact.path())?;
        let target = request.validated_target()?.to_string();

        let _slot = self.acquire_slot().await?;

        tracing::info!(
            "Starting {} scan of {} ({} args, limit {}s)",
            profile.name,
            target,
            invocation.args.len(),
            invocation.timeout.as_secs()
        );
        let start = Instant::now();

        let output = match self.runner.run(&invocation.args, invocation.timeout).await {
            RunOutcome::Completed(output) => output,
            RunOutcome::TimedOut { limit } => {
                tracing::warn!("{} scan of {} timed out", profile.name, target);
                return Err(ScanError::TimedOut {
                    limit_secs: limit.as_secs(),
                });
            }
            RunOutcome::LaunchFailed(e) => return Err(ScanError::LaunchFailed(e)),
            RunOutcome::Failed(e) => return Err(ScanError::Io(e)),
        };

        let findings = collector::collect(artifact).await?;

        if !output.status.success() && findings.is_empty() {
            return Err(ScanError::Engine {
                status: output.status.to_string(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        let result = ScanResult {
            profile: profile.name,
            target,
            findings,
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        };

        tracing::info!(
            "{} scan of {} complete: {} findings, exit {:?}, {}ms",
            result.profile,
            result.target,
            result.count(),
            result.exit_code,
            start.elapsed().as_millis()
        );

        Ok(response::assemble(profile, result))
    }

    /// Engine version string, from stdout or else stderr.
    pub async fn version(&self) -> Result<String, ScanError> {
        let args = vec!["-version".to_string()];
        match self.runner.run(&args, VERSION_TIMEOUT).await {
            RunOutcome::Completed(output) => {
                let stdout = output.stdout.trim();
                let version = if stdout.is_empty() {
                    output.stderr.trim()
                } else {
                    stdout
                };
                Ok(version.to_string())
            }
            RunOutcome::TimedOut { limit } => Err(ScanError::TimedOut {
                limit_secs: limit.as_secs(),
            }),
            RunOutcome::LaunchFailed(e) => Err(ScanError::LaunchFailed(e)),
            RunOutcome::Failed(e) => Err(ScanError::Io(e)),
        }
    }

    pub fn engine(&self) -> &PathBuf {
        self.runner.program()
    }

    async fn acquire_slot(&self) -> Result<SemaphorePermit<'_>, ScanError> {
        match tokio::time::timeout(self.queue_timeout, self.slots.acquire()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(ScanError::Busy),
            Err(_) => {
                tracing::warn!(
                    "No engine slot free within {}s, rejecting scan",
                    self.queue_timeout.as_secs()
                );
                Err(ScanError::Busy)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::profiles::ResponseShape;
    use crate::test_support::{fake_engine, test_config};
    use serde_json::Value;

    fn scanner_in(dir: &tempfile::TempDir) -> Scanner {
        let engine = fake_engine(dir.path());
        Scanner::new(&test_config(dir.path(), engine))
    }

    fn body(response: ScanResponse) -> Value {
        serde_json::to_value(response).unwrap()
    }

    fn results_dir_is_empty(dir: &tempfile::TempDir) -> bool {
        std::fs::read_dir(dir.path().join("results")).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_pipeline_collects_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner_in(&dir);

        let response = scanner
            .scan(ScanKind::Cves, &ScanRequest::new("alpha.test"))
            .await
            .unwrap();
        let body = body(response);
        assert_eq!(body["type"], "CVE scan");
        assert_eq!(body["count"], 1);
        assert_eq!(body["findings"][0]["host"], "alpha.test");
        assert!(results_dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_concurrent_scans_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner_in(&dir);
        let alpha = ScanRequest::new("alpha.test");
        let beta = ScanRequest::new("beta.test");

        let results = futures::future::join_all(vec![
            scanner.scan(ScanKind::Custom, &alpha),
            scanner.scan(ScanKind::Custom, &beta),
        ])
        .await;

        for (result, target) in results.into_iter().zip(["alpha.test", "beta.test"]) {
            let body = body(result.unwrap());
            assert_eq!(body["target"], target);
            assert_eq!(body["count"], 1);
            assert_eq!(body["findings"][0]["host"], target);
        }
    }

    #[tokio::test]
    async fn test_extra_args_reach_engine_literally() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner_in(&dir);
        let request = ScanRequest {
            args: Some("; rm -rf / #".into()),
            ..ScanRequest::new("alpha.test")
        };

        let body = body(scanner.scan(ScanKind::Custom, &request).await.unwrap());
        let output = body["output"].as_str().unwrap();
        assert!(output.contains("-silent rm -rf / #"));
        assert!(!output.contains(';'));
    }

    #[tokio::test]
    async fn test_missing_target_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), dir.path().join("no-such-engine"));
        let scanner = Scanner::new(&config);

        let err = scanner
            .scan(ScanKind::Quick, &ScanRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_engine_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), dir.path().join("no-such-engine"));
        let scanner = Scanner::new(&config);

        let err = scanner
            .scan(ScanKind::Quick, &ScanRequest::new("alpha.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::LaunchFailed(_)));
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner_in(&dir);

        let err = scanner
            .scan(ScanKind::Exposures, &ScanRequest::new("broken.test"))
            .await
            .unwrap_err();
        match err {
            ScanError::Engine { stderr, .. } => assert_eq!(stderr, "engine exploded"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_engine() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner_in(&dir);
        let profile = ScanProfile {
            kind: ScanKind::Quick,
            name: "short",
            route: "/short",
            templates: &[],
            severity: None,
            fixed_args: &[],
            timeout: Duration::from_millis(300),
            shape: ResponseShape::Severity,
        };

        let start = Instant::now();
        let err = scanner
            .scan_with_profile(&profile, &ScanRequest::new("slow.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(results_dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_full_pool_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path());
        let mut config = test_config(dir.path(), engine);
        config.max_concurrent_scans = 1;
        config.queue_timeout = Duration::ZERO;
        let scanner = Scanner::new(&config);

        let held = scanner.slots.acquire().await.unwrap();
        let err = scanner
            .scan(ScanKind::Quick, &ScanRequest::new("alpha.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Busy));

        drop(held);
        assert!(scanner
            .scan(ScanKind::Quick, &ScanRequest::new("alpha.test"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_version() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner_in(&dir);
        assert_eq!(scanner.version().await.unwrap(), "fake-nuclei v3.0.0");
    }
}
