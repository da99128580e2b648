//! Runtime configuration, read once from the environment at startup

use anyhow::anyhow;
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ENGINE_BIN: &str = "nuclei";
const DEFAULT_TEMPLATES_PATH: &str = "/root/nuclei-templates";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONCURRENT_SCANS: usize = 4;
const DEFAULT_QUEUE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Scanning engine executable, resolved through PATH when bare
    pub engine_bin: PathBuf,
    /// Root of the on-disk template catalog
    pub templates_path: PathBuf,
    /// Directory holding per-request result artifacts
    pub results_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Upper bound on engine processes running at once
    pub max_concurrent_scans: usize,
    /// How long a request may wait for a free engine slot
    pub queue_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine_bin = lookup("NUCLEI_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE_BIN));
        let templates_path = lookup("TEMPLATES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATES_PATH));
        let results_dir = lookup("RESULTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("nuclei-relay"));

        let bind_addr: SocketAddr = parse_var(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let max_concurrent_scans: usize =
            parse_var(&lookup, "MAX_CONCURRENT_SCANS", DEFAULT_MAX_CONCURRENT_SCANS)?;
        if max_concurrent_scans == 0 {
            return Err(anyhow!("MAX_CONCURRENT_SCANS must be at least 1"));
        }
        let queue_timeout_secs: u64 =
            parse_var(&lookup, "SCAN_QUEUE_TIMEOUT_SECS", DEFAULT_QUEUE_TIMEOUT_SECS)?;

        Ok(Config {
            engine_bin,
            templates_path,
            results_dir,
            bind_addr,
            max_concurrent_scans,
            queue_timeout: Duration::from_secs(queue_timeout_secs),
        })
    }
}

fn parse_var<F, T, D>(lookup: &F, key: &str, default: D) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
    D: ToString,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid {}={:?}: {}", key, raw, e))
}
