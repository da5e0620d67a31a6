//! Isolated environment for running the stackup binary.
//!
//! Every run gets its own work dir and HOME, and a PATH that holds only the
//! stub tools a test installed, so nothing touches real containers.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Environment variables stackup reads that must not leak in from the host.
const SCRUBBED_VARS: &[&str] = &[
    "SPANNER_PROJECT_ID",
    "SPANNER_INSTANCE_ID",
    "SPANNER_DATABASE_ID",
    "STACKUP_WORK_DIR",
    "STACKUP_LOG",
    "USE_DOCKER",
    "DEV_MODE",
    "COMPOSE_CMD",
    "CLOUDSDK_CONFIG",
    "CI",
];

#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

pub struct TestEnv {
    pub work_dir: TempDir,
    pub home_dir: TempDir,
    pub bin_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            work_dir: tempfile::tempdir().unwrap(),
            home_dir: tempfile::tempdir().unwrap(),
            bin_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn work_path(&self, relative: &str) -> PathBuf {
        self.work_dir.path().join(relative)
    }

    /// File the stub tools append their invocations to.
    pub fn stub_log(&self) -> PathBuf {
        self.bin_dir.path().join("calls.log")
    }

    pub fn calls(&self) -> String {
        std::fs::read_to_string(self.stub_log()).unwrap_or_default()
    }

    /// Install an executable that records its arguments and exits with `code`.
    #[cfg(unix)]
    pub fn stub_tool(&self, name: &str, code: i32) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.bin_dir.path().join(name);
        let script = format!(
            "#!/bin/sh\necho \"{name} $*\" >> \"$STUB_LOG\"\nexit {code}\n",
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// git, curl, podman and podman-compose stubs that all succeed.
    #[cfg(unix)]
    pub fn with_podman_stack(self) -> Self {
        for tool in ["git", "curl", "podman", "podman-compose"] {
            self.stub_tool(tool, 0);
        }
        self
    }

    pub fn write_work_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.work_path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Skip the startup delay and keep the probes short.
    pub fn write_fast_settings(&self) {
        self.write_work_file(
            "stackup.toml",
            "[startup]\nwait_secs = 0\n\n[health]\ntimeout_secs = 1\n",
        );
    }

    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_stackup"));
        cmd.current_dir(self.work_dir.path())
            .args(args)
            .env("PATH", self.bin_dir.path())
            .env("HOME", self.home_dir.path())
            .env("STUB_LOG", self.stub_log())
            .env("LANG", "C");
        for var in SCRUBBED_VARS {
            cmd.env_remove(var);
        }
        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("failed to execute stackup");
        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Minimal service account key with a client email.
pub fn write_key(dir: &Path) -> PathBuf {
    let path = dir.join("key.json");
    std::fs::write(
        &path,
        r#"{"type":"service_account","project_id":"p1","client_email":"collector@p1.iam.gserviceaccount.com","token_uri":"https://oauth2.googleapis.com/token"}"#,
    )
    .unwrap();
    path
}
