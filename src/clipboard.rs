//! Host clipboard access for the copy action.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::errors::ClipboardError;

#[async_trait]
pub trait Clipboard: Send + Sync + 'static {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Pipes text into a system clipboard command such as `wl-copy`,
/// `xclip -selection clipboard` or `pbcopy`.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line. `None` if blank.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ClipboardError::Unavailable(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(text.as_bytes()).await {
                Ok(()) => {}
                // The command exited early; its exit status below says why.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(ClipboardError::Unavailable(e.to_string())),
            }
            // Dropping stdin closes the pipe so the command sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            tracing::warn!(program = %self.program, "clipboard command failed: {}", reason);
            return Err(ClipboardError::Denied(reason));
        }

        tracing::debug!(program = %self.program, "copied text to clipboard");
        Ok(())
    }
}

/// Used when no clipboard command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

#[async_trait]
impl Clipboard for NoClipboard {
    async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command_line() {
        let cb = CommandClipboard::from_command_line("xclip -selection clipboard").unwrap();
        assert_eq!(cb.program, "xclip");
        assert_eq!(cb.args, vec!["-selection", "clipboard"]);
        assert!(CommandClipboard::from_command_line("   ").is_none());
    }

    #[tokio::test]
    async fn test_no_clipboard_is_unsupported() {
        assert_eq!(NoClipboard.write_text("x").await, Err(ClipboardError::Unsupported));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let cb = CommandClipboard::new("keydash-no-such-clipboard-tool", vec![]);
        assert!(matches!(
            cb.write_text("x").await,
            Err(ClipboardError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_exit_status_is_checked() {
        let ok = CommandClipboard::new("cat", vec![]);
        assert!(ok.write_text("ingest_abc").await.is_ok());

        let denied = CommandClipboard::new("false", vec![]);
        assert!(matches!(
            denied.write_text("ingest_abc").await,
            Err(ClipboardError::Denied(_))
        ));
    }
}
