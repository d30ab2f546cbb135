// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Running external tools (kubectl, ssh-keygen, ssh-keyscan)

use std::ffi::OsStr;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

/// An external command that could not be started or exited unsuccessfully
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{command} failed: {message}")]
pub struct CommandError {
    pub command: String,
    pub message: String,
}

/// Run a command to completion and return its stdout.
///
/// The child is killed when the returned future is dropped, so racing this
/// against a cancellation token terminates the process.
pub async fn run_command(program: &str, args: &[String]) -> Result<String, CommandError> {
    run_command_with_env(program, args, &[]).await
}

/// [`run_command`] with extra environment variables for the child
#[instrument(skip(args, envs), fields(args = %args.join(" ")))]
pub async fn run_command_with_env(
    program: &str,
    args: &[String],
    envs: &[(&str, &OsStr)],
) -> Result<String, CommandError> {
    let command_line = format!("{} {}", program, args.join(" "));
    debug!("Running {}", command_line);

    let mut command = Command::new(program);
    command
        .args(args)
        .envs(envs.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = command.output().await.map_err(|e| CommandError {
        command: command_line.clone(),
        message: format!("failed to run {}: {}", program, e),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CommandError {
            command: command_line,
            message: if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            },
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_command_error() {
        let err = run_command("definitely-not-a-real-binary-42", &[])
            .await
            .unwrap_err();
        assert!(err.command.starts_with("definitely-not-a-real-binary-42"));
        assert!(err.message.contains("failed to run"));
    }

    #[tokio::test]
    async fn test_env_is_passed_to_child() {
        let args = vec!["-c".to_string(), "printf %s \"$KUBECONFIG\"".to_string()];
        let output = run_command_with_env("sh", &args, &[("KUBECONFIG", OsStr::new("/a:/b"))])
            .await
            .unwrap();
        assert_eq!(output, "/a:/b");
    }

    #[tokio::test]
    async fn test_non_zero_exit_reports_stderr() {
        let args = vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()];
        let err = run_command("sh", &args).await.unwrap_err();
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn test_command_error_display() {
        let err = CommandError {
            command: "kubectl apply -k /tmp/x".to_string(),
            message: "no matches for kind".to_string(),
        };
        assert_eq!(err.to_string(), "kubectl apply -k /tmp/x failed: no matches for kind");
    }
}
