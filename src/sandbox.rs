//! Isolated execution of a rendered script.
//!
//! Each run gets a fresh temporary directory. The directory is removed on every
//! return path, including errors and panics that unwind; only an aborting
//! process leaves it behind.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const SCRIPT_FILE_NAME: &str = "test.sh";
const SANDBOX_PREFIX: &str = "inline_test";
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// What the script printed and how it exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    shell: String,
    timeout: Option<Duration>,
}

impl Sandbox {
    pub fn new(shell: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }

    /// Write `script` into a fresh directory and run it there with `<shell> -e`.
    pub fn run(&self, script: &str) -> Result<CapturedOutput> {
        let dir = tempfile::Builder::new()
            .prefix(SANDBOX_PREFIX)
            .tempdir()
            .context("create sandbox directory")?;
        tracing::debug!(path = %dir.path().display(), "sandbox created");

        let captured = self.execute_in(dir.path(), script);
        let path = dir.path().to_path_buf();
        let closed = dir
            .close()
            .with_context(|| format!("remove sandbox directory {}", path.display()));
        let result = first_error(captured, closed);
        if result.is_ok() {
            tracing::debug!(path = %path.display(), "sandbox removed");
        }
        result
    }

    fn execute_in(&self, dir: &Path, script: &str) -> Result<CapturedOutput> {
        let script_path = dir.join(SCRIPT_FILE_NAME);
        fs::write(&script_path, script)
            .with_context(|| format!("write {}", script_path.display()))?;

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-e")
            .arg(SCRIPT_FILE_NAME)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(dir);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so a timeout also reaches the compiled binary.
            cmd.process_group(0);
        }

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawn {} -e {SCRIPT_FILE_NAME}", self.shell))?;
        // Drained while polling so a chatty script never blocks on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let mut timed_out = false;

        let status = loop {
            if let Some(status) = child.try_wait().context("check script status")? {
                break status;
            }
            if let Some(timeout) = self.timeout {
                if start.elapsed() > timeout {
                    timed_out = true;
                    kill_script(&mut child);
                    tracing::warn!(
                        timeout_secs = timeout.as_secs_f64(),
                        "script exceeded timeout; killed"
                    );
                    break child.wait().context("reap killed script")?;
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let stdout = collect(stdout).context("collect script stdout")?;
        let stderr = collect(stderr).context("collect script stderr")?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            code = ?status.code(),
            "script finished"
        );

        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            exit_code: status.code(),
            timed_out,
        })
    }
}

/// An execution error outranks a cleanup error; the latter is only logged then.
fn first_error(captured: Result<CapturedOutput>, closed: Result<()>) -> Result<CapturedOutput> {
    match (captured, closed) {
        (Ok(captured), Ok(())) => Ok(captured),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!(error = %format!("{close_err:#}"), "sandbox cleanup failed");
            Err(err)
        }
    }
}

type Drain = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Drain) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| anyhow!("pipe reader panicked"))?
            .context("read pipe"),
        None => Ok(Vec::new()),
    }
}

#[cfg(unix)]
fn kill_script(child: &mut std::process::Child) {
    let Ok(pid) = i32::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: signalling a process group we created; no memory is shared.
    let rc = unsafe { libc::kill(-pid, libc::SIGKILL) };
    if rc != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_script(child: &mut std::process::Child) {
    let _ = child.kill();
}

/// Fail early, with the offending name, when a required executable is missing.
pub fn require_executable(name: &str) -> Result<()> {
    which::which(name)
        .map(|_| ())
        .map_err(|err| anyhow!("required executable {name:?} not found on PATH: {err}"))
}
