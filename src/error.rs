//! Error types for tool execution

use std::path::PathBuf;

/// Advisory returned by every tool when the Foundry binaries cannot be located.
pub const TOOLCHAIN_MISSING_MESSAGE: &str = "Foundry is not installed or could not be found. \
Install it from https://getfoundry.sh/ and make sure forge, cast and anvil are on your PATH.";

/// Failures a tool call can end with.
///
/// Everything except [`ToolError::InvalidArguments`] and [`ToolError::UnknownTool`]
/// is reported back to the client as an error tool result rather than a protocol error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{}", TOOLCHAIN_MISSING_MESSAGE)]
    ToolchainMissing,

    /// The subprocess failed; carries its output verbatim.
    #[error("{0}")]
    CommandFailed(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool '{0}' is disabled by configuration")]
    ToolDisabled(String),

    #[error("Anvil is already running on port {port}. Stop it first with anvil_stop.")]
    NodeAlreadyRunning { port: String },

    #[error("Anvil is not running.")]
    NodeNotRunning,

    #[error("Anvil did not come up after launch: {0}")]
    NodeStartFailed(String),

    #[error("Anvil is still running after the kill command was issued.")]
    NodeStillRunning,

    #[error("file already exists: {} (set overwrite to replace it)", .0.display())]
    FileExists(PathBuf),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("path escapes the workspace: {}", .0.display())]
    PathOutsideWorkspace(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error belongs at the protocol boundary rather than in a tool result.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::InvalidArguments(_) | Self::UnknownTool(_))
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_missing_displays_advisory() {
        assert_eq!(
            ToolError::ToolchainMissing.to_string(),
            TOOLCHAIN_MISSING_MESSAGE
        );
    }

    #[test]
    fn test_command_failed_is_verbatim() {
        let err = ToolError::CommandFailed("Error: execution reverted".to_string());
        assert_eq!(err.to_string(), "Error: execution reverted");
    }

    #[test]
    fn test_protocol_error_classification() {
        assert!(ToolError::InvalidArguments("missing field".into()).is_protocol_error());
        assert!(ToolError::UnknownTool("nope".into()).is_protocol_error());
        assert!(!ToolError::NodeNotRunning.is_protocol_error());
        assert!(!ToolError::ToolchainMissing.is_protocol_error());
    }

    #[test]
    fn test_file_exists_mentions_overwrite() {
        let err = ToolError::FileExists(PathBuf::from("src/Counter.sol"));
        let msg = err.to_string();
        assert!(msg.contains("src/Counter.sol"));
        assert!(msg.contains("overwrite"));
    }
}
