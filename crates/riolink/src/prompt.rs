//! Terminal prompts backed by inquire

use async_trait::async_trait;
use inquire::{InquireError, Select, Text};
use riolink_core::{InteractionAdapter, InteractionError, InteractionResult};

/// `InteractionAdapter` for an interactive terminal
///
/// inquire blocks on the terminal, so each prompt runs on the blocking pool
/// and the monitor keeps polling while the user types.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

fn map_inquire_error(err: InquireError) -> InteractionError {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            InteractionError::Cancelled
        }
        InquireError::NotTTY => InteractionError::NonTty,
        InquireError::IO(e) => InteractionError::io(e),
        InquireError::InvalidConfiguration(msg) => InteractionError::InvalidInput(msg),
        other => InteractionError::other(other.to_string()),
    }
}

async fn blocking<T, F>(prompt: F) -> InteractionResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| InteractionError::other(format!("prompt task failed: {}", e)))?
        .map_err(map_inquire_error)
}

#[async_trait]
impl InteractionAdapter for TerminalPrompt {
    async fn ask_text(&self, prompt: &str, default: Option<&str>) -> InteractionResult<String> {
        let prompt = prompt.to_string();
        let default = default.map(str::to_string);
        blocking(move || {
            let mut text = Text::new(&prompt);
            if let Some(default) = default.as_deref() {
                text = text.with_default(default);
            }
            text.prompt()
        })
        .await
    }

    async fn ask_select(&self, prompt: &str, options: &[String]) -> InteractionResult<usize> {
        if options.is_empty() {
            return Err(InteractionError::InvalidInput(
                "options cannot be empty".to_string(),
            ));
        }
        let prompt = prompt.to_string();
        let options = options.to_vec();
        blocking(move || {
            Select::new(&prompt, options)
                .raw_prompt()
                .map(|choice| choice.index)
        })
        .await
    }

    fn print_info(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn print_warning(&self, message: &str) {
        eprintln!("warning: {}", message);
    }
}
