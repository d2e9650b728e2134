//! Interaction adapter trait for host-agnostic user prompts
//!
//! Command flows never talk to a terminal or an editor directly. They go
//! through `InteractionAdapter`, which the host implements:
//!
//! - **CLI mode**: terminal prompts (inquire crate), in the `riolink` binary
//! - **Tests**: scripted adapters that replay canned answers
//!
//! Prompts are async because each one is a suspension point of a flow. The
//! trait is object-safe, allowing it to be used as `Arc<dyn InteractionAdapter>`.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for interaction operations
#[derive(Error, Debug)]
pub enum InteractionError {
    /// User cancelled the prompt (e.g., pressed Escape or Ctrl+C)
    #[error("operation cancelled by user")]
    Cancelled,

    /// Standard input is not a TTY (e.g., running in CI or piped input)
    #[error("stdin is not a TTY - interactive input unavailable")]
    NonTty,

    /// IO error during interaction
    #[error("IO error: {0}")]
    Io(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Other interaction error
    #[error("{0}")]
    Other(String),
}

impl InteractionError {
    /// Create a new IO error
    pub fn io(err: impl fmt::Display) -> Self {
        Self::Io(err.to_string())
    }

    /// Create a new other error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this is the user backing out rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<std::io::Error> for InteractionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for interaction operations
pub type InteractionResult<T> = Result<T, InteractionError>;

/// Trait for abstracting user interaction across hosts
///
/// Every prompt method returns `InteractionError::Cancelled` when the user
/// backs out, which is distinct from every valid answer.
#[async_trait]
pub trait InteractionAdapter: Send + Sync {
    /// Ask the user for free text input
    ///
    /// # Arguments
    /// * `prompt` - The question or prompt to display
    /// * `default` - Optional default value if user provides no input
    async fn ask_text(&self, prompt: &str, default: Option<&str>) -> InteractionResult<String>;

    /// Ask the user to select one option from a list
    ///
    /// # Returns
    /// The index of the selected option (0-based)
    ///
    /// # Errors
    /// Returns `InteractionError::Cancelled` if user cancels, or
    /// `InvalidInput` if options is empty
    async fn ask_select(&self, prompt: &str, options: &[String]) -> InteractionResult<usize>;

    /// Show an informational notice
    fn print_info(&self, message: &str);

    /// Show a warning notice
    fn print_warning(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockAdapter;

    #[async_trait]
    impl InteractionAdapter for MockAdapter {
        async fn ask_text(
            &self,
            _prompt: &str,
            default: Option<&str>,
        ) -> InteractionResult<String> {
            Ok(default.unwrap_or("mock").to_string())
        }

        async fn ask_select(&self, _prompt: &str, options: &[String]) -> InteractionResult<usize> {
            if options.is_empty() {
                return Err(InteractionError::InvalidInput(
                    "options cannot be empty".to_string(),
                ));
            }
            Ok(0)
        }

        fn print_info(&self, _message: &str) {}
        fn print_warning(&self, _message: &str) {}
    }

    #[tokio::test]
    async fn test_trait_is_object_safe() {
        let adapter: Box<dyn InteractionAdapter> = Box::new(MockAdapter);

        let result = adapter.ask_text("test", Some("default")).await;
        assert_eq!(result.unwrap(), "default");

        let options = vec!["a".to_string(), "b".to_string()];
        assert_eq!(adapter.ask_select("select", &options).await.unwrap(), 0);

        let result = adapter.ask_select("select", &[]).await;
        assert!(matches!(result, Err(InteractionError::InvalidInput(_))));

        adapter.print_info("info");
        adapter.print_warning("warning");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            InteractionError::Cancelled.to_string(),
            "operation cancelled by user"
        );
        assert!(InteractionError::NonTty.to_string().contains("TTY"));
        assert!(InteractionError::io("broken pipe")
            .to_string()
            .contains("broken pipe"));
        assert_eq!(InteractionError::other("custom").to_string(), "custom");
    }

    #[test]
    fn test_is_cancelled() {
        assert!(InteractionError::Cancelled.is_cancelled());
        assert!(!InteractionError::NonTty.is_cancelled());
        assert!(!InteractionError::InvalidInput("x".into()).is_cancelled());
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let interaction_err: InteractionError = io_err.into();

        match interaction_err {
            InteractionError::Io(msg) => assert!(msg.contains("file not found")),
            _ => panic!("expected Io variant"),
        }
    }
}
