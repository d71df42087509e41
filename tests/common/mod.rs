//! Shared utilities for the endpoint tests.

#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use pandoxed::{CONVERT_PATH, build_router, config::Config};
use tempfile::TempDir;
use tower::ServiceExt;

/// Stub that finds `-o <path>` among its arguments and writes a tiny PDF there.
pub const PDF_STUB: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
    if [ "$1" = "-o" ]; then
        out="$2"
    fi
    shift
done
printf '%%PDF-1.4\n%% stub\n' > "$out"
"#;

/// Stub that fails like a converter rejecting its input.
pub const FAILING_STUB: &str = r#"#!/bin/sh
echo "Error producing PDF." >&2
exit 43
"#;

/// Stub that exits cleanly but never writes the output file.
pub const SILENT_STUB: &str = "#!/bin/sh\nexit 0\n";

/// Stub that records its pid next to itself, then outlives any sane timeout.
pub const SLEEPING_STUB: &str = r#"#!/bin/sh
echo $$ > "$(dirname "$0")/converter.pid"
exec sleep 15
"#;

/// Stub that forks a helper, records the helper's pid and waits on it.
pub const FORKING_STUB: &str = r#"#!/bin/sh
sleep 15 &
echo $! > "$(dirname "$0")/converter.pid"
wait
"#;

/// Stub that produces a PDF but leaves a helper running, holding its stderr open.
pub const LINGERING_STUB: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
    if [ "$1" = "-o" ]; then
        out="$2"
    fi
    shift
done
printf '%%PDF-1.4\n%% stub\n' > "$out"
sleep 3 &
echo $! > "$(dirname "$0")/converter.pid"
exit 0
"#;

/// A scratch area holding the converter stub and an isolated staging directory.
pub struct Harness {
    pub root: TempDir,
    pub staging: PathBuf,
    pub converter: PathBuf,
}

impl Harness {
    pub fn with_stub(script: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let staging = root.path().join("staging");
        std::fs::create_dir(&staging).unwrap();
        let converter = root.path().join("converter.sh");
        write_executable(&converter, script);
        Self {
            root,
            staging,
            converter,
        }
    }

    /// Auth disabled, stub converter, private staging directory.
    pub fn config(&self) -> Config {
        Config {
            basic_auth_enabled: false,
            pandoc_path: self.converter.display().to_string(),
            staging_dir: Some(self.staging.display().to_string()),
            ..Config::default()
        }
    }

    pub fn router(&self) -> Router {
        build_router(&self.config())
    }

    /// Names left in the staging directory.
    pub fn staged_leftovers(&self) -> Vec<String> {
        std::fs::read_dir(&self.staging)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    pub fn recorded_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.root.path().join("converter.pid"))
            .ok()
            .and_then(|pid| pid.trim().parse().ok())
    }
}

/// True while `pid` exists and is not a zombie (Linux `/proc`).
pub fn process_alive(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // State is the first field after the parenthesised command name.
    stat.rsplit_once(") ")
        .is_some_and(|(_, rest)| !rest.starts_with('Z') && !rest.starts_with('X'))
}

/// Give a killed process up to two seconds to disappear.
pub async fn exits_soon(pid: u32) -> bool {
    for _ in 0..40 {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

fn write_executable(path: &Path, script: &str) {
    std::fs::write(path, script).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

pub fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(CONVERT_PATH)
        .body(body.into())
        .unwrap()
}

pub fn basic_header(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

pub async fn send(app: Router, request: Request<Body>) -> (Response<Body>, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (Response::from_parts(parts, Body::empty()), bytes.to_vec())
}
