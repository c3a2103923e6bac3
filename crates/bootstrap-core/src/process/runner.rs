//! Subprocess execution with interactive-prompt handling
//!
//! External generators are invoked through npx, which may stop and ask for
//! confirmation before installing packages. The runner scans accumulated
//! stdout for known markers and answers each one once on stdin, so a
//! non-interactive run never hangs on a question nobody can see.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// A stdout marker and the canned stdin reply that unblocks it.
#[derive(Debug, Clone)]
pub struct PromptRule {
    pub marker: String,
    pub response: String,
}

impl PromptRule {
    pub fn new(marker: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            response: response.into(),
        }
    }
}

/// Replies that keep npx-style installers from hanging on confirmation.
pub fn default_prompt_rules() -> Vec<PromptRule> {
    vec![
        PromptRule::new("Need to install the following packages", "y\n"),
        PromptRule::new("Ok to proceed?", "y\n"),
    ]
}

/// Outcome of a finished subprocess.
///
/// Both output streams have been fully drained into the result and the child
/// has been reaped by the time this is returned.
#[derive(Debug)]
pub struct SubprocessResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl SubprocessResult {
    fn spawn_failure(program: &str, err: &std::io::Error) -> Self {
        Self {
            success: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("failed to start {}: {}", program, err),
        }
    }
}

/// Run `program` with `args` in `cwd`, answering any matched prompt from
/// `rules` on stdin.
///
/// A binary that cannot start is reported as a failure result, not an error.
/// There are no retries and no timeout: a hung generator hangs the caller,
/// and the caller decides whether a failure result is fatal.
pub async fn run(
    program: &str,
    args: &[&str],
    cwd: &Path,
    rules: &[PromptRule],
) -> Result<SubprocessResult> {
    let mut child = match Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return Ok(SubprocessResult::spawn_failure(program, &e)),
    };

    let mut stdin = child.stdin.take().expect("Failed to capture stdin");
    let stdout = child.stdout.take().expect("Failed to capture stdout");
    let stderr = child.stderr.take().expect("Failed to capture stderr");

    // stderr is capture-only, no prompt detection there.
    let stderr_task = tokio::spawn(async move {
        let mut captured = String::new();
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            captured.push_str(&line);
            captured.push('\n');
        }
        captured
    });

    // The stdout drain owns stdin so a matched marker can be answered in
    // place. Read errors break the loop instead of propagating: stdin must
    // still be closed and the child reaped, or the pipes stall the parent
    // indefinitely.
    let mut captured = String::new();
    let mut answered = vec![false; rules.len()];
    let mut reader = BufReader::new(stdout);
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                captured.push_str(&String::from_utf8_lossy(&chunk[..n]));
                for (idx, rule) in rules.iter().enumerate() {
                    if !answered[idx] && captured.contains(&rule.marker) {
                        answered[idx] = true;
                        if stdin.write_all(rule.response.as_bytes()).await.is_ok() {
                            let _ = stdin.flush().await;
                        }
                    }
                }
            }
            Err(_) => break,
        }
    }

    // Close the write side so the child sees EOF, then join the drains.
    drop(stdin);
    let stderr_out = stderr_task.await.unwrap_or_default();

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for {}", program))?;

    Ok(SubprocessResult {
        success: status.success(),
        exit_code: status.code().unwrap_or(-1),
        stdout: captured,
        stderr: stderr_out,
    })
}
