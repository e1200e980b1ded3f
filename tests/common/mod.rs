//! Shared test infrastructure for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Runs the built binary with an empty config directory, so a developer's
/// own config or resume token never leaks into a test.
pub struct OracleCli {
    config_home: TempDir,
}

impl OracleCli {
    pub fn new() -> Self {
        Self {
            config_home: TempDir::new().expect("create config home"),
        }
    }

    #[allow(dead_code)]
    pub fn config_dir(&self) -> PathBuf {
        self.config_home.path().to_path_buf()
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_inline-oracle"));
        cmd.env("XDG_CONFIG_HOME", self.config_home.path())
            .env_remove("INLINE_ORACLE_SKIP")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run inline-oracle")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Check the tools are on PATH; skip the test if not.
#[allow(dead_code)]
pub fn skip_if_missing(tools: &[&str]) -> bool {
    for tool in tools {
        if which::which(tool).is_err() {
            eprintln!("Skipping: {tool} not available");
            return true;
        }
    }
    false
}
