//! PDF rendering through an external HTML-to-PDF program
//!
//! The program receives the HTML on stdin and must write the PDF to stdout,
//! e.g. `wkhtmltopdf --quiet --encoding utf-8 - -`.

use crate::output::{OutputError, OutputResult};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Converts HTML to PDF by piping it through a command
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    command: Vec<String>,
}

impl CommandRenderer {
    /// Creates a renderer from a program and its arguments
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Runs the command on `html` and returns the bytes it writes to stdout
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - The PDF bytes
    /// * `Err(OutputError::Pdf)` - The program could not start, failed, or wrote nothing
    pub async fn render(&self, html: &str) -> OutputResult<Vec<u8>> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| OutputError::Pdf("no PDF command configured".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OutputError::Pdf(format!("failed to start '{}': {}", program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OutputError::Pdf("child stdin unavailable".to_string()))?;

        // Write stdin on its own task so a full stdout pipe cannot deadlock
        let input = html.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OutputError::Pdf(format!(
                "'{}' exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(OutputError::Pdf(format!("failed to send HTML: {}", e))),
            Err(e) => return Err(OutputError::Pdf(format!("stdin writer failed: {}", e))),
        }

        if output.stdout.is_empty() {
            return Err(OutputError::Pdf(format!("'{}' produced no output", program)));
        }

        Ok(output.stdout)
    }
}
