//! External-command challenge solver.

use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use seatwatch_core::error::ProtocolError;
use seatwatch_core::{ChallengeSolver, Result};

/// Pipes the challenge image to an external command and reads the answer
/// from its stdout.
///
/// Keeps OCR out of this process entirely: any recognizer with a
/// bytes-in, text-out command-line interface can be plugged in.
#[derive(Debug, Clone)]
pub struct CommandSolver {
    program: String,
    args: Vec<String>,
}

impl CommandSolver {
    /// `command` is the program followed by its arguments.
    pub fn new(command: &[String]) -> anyhow::Result<Self> {
        let (program, args) = command
            .split_first()
            .context("solver command must name a program")?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl ChallengeSolver for CommandSolver {
    async fn solve(&self, image: &[u8]) -> Result<String> {
        debug!(program = %self.program, bytes = image.len(), "invoking challenge solver");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ProtocolError::new(
                    "challenge solver",
                    format!("failed to spawn '{}': {e}", self.program),
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image).await.map_err(|e| {
                ProtocolError::new("challenge solver", format!("failed to write image: {e}"))
            })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ProtocolError::new("challenge solver", e.to_string()))?;
        if !output.status.success() {
            return Err(
                ProtocolError::new("challenge solver", format!("exited with {}", output.status))
                    .into(),
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_answer_from_stdout() {
        let solver = CommandSolver::new(&["cat".to_string()]).unwrap();
        let answer = solver.solve(b"A1B2\n").await.unwrap();
        assert_eq!(answer, "A1B2");
    }

    #[tokio::test]
    async fn failing_command_is_an_error() {
        let solver = CommandSolver::new(&["false".to_string()]).unwrap();
        assert!(solver.solve(b"image").await.is_err());
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandSolver::new(&[]).is_err());
    }
}
