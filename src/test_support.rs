//! Fixtures shared by the pipeline and HTTP tests

use crate::config::Config;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Stand-in engine. Writes findings keyed on the target name:
/// `slow` hangs, `broken` fails, `partial` writes one record then fails,
/// `tech` emits technology records, anything else emits one valid record,
/// one blank line and one malformed line.
const FAKE_ENGINE: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo "fake-nuclei v3.0.0" >&2
  exit 0
fi
out=""
target=""
prev=""
for arg in "$@"; do
  case "$prev" in
    -u) target="$arg" ;;
    -json-export) out="$arg" ;;
  esac
  prev="$arg"
done
echo "args: $*"
case "$target" in
  *slow*) exec sleep 30 ;;
  *broken*) echo "engine exploded" >&2; exit 1 ;;
  *partial*)
    printf '{"template-id":"http-check","host":"%s"}\n' "$target" >> "$out"
    echo "rate limited, stopping early" >&2
    exit 1 ;;
  *tech*)
    echo '{"template-id":"nginx-detect","info":{"name":"Nginx"}}' >> "$out"
    echo '{"template-id":"php-detect"}' >> "$out"
    echo '{"host":"anonymous"}' >> "$out"
    exit 0 ;;
esac
printf '{"template-id":"http-check","host":"%s"}\n' "$target" >> "$out"
echo '' >> "$out"
echo 'garbage {' >> "$out"
"#;

pub fn fake_engine(dir: &Path) -> PathBuf {
    let path = dir.join("fake-nuclei");
    fs::write(&path, FAKE_ENGINE).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn test_config(dir: &Path, engine: PathBuf) -> Config {
    let results_dir = dir.join("results");
    fs::create_dir_all(&results_dir).unwrap();
    Config {
        engine_bin: engine,
        templates_path: dir.join("templates"),
        results_dir,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        max_concurrent_scans: 4,
        queue_timeout: Duration::from_secs(5),
    }
}
