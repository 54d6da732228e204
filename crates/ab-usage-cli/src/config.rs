//! Tool configuration.
//!
//! Settings come from command-line flags first, then environment
//! variables, then interactive prompts (with the API key read masked).

use std::io;

use clap::Parser;

use ab_usage_core::Prompt;

use crate::console;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.agenticbilling.ai";

/// Default provider name.
pub const DEFAULT_PROVIDER: &str = "AgenticBilling.AI";

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "ab-usage",
    about = "Submit usage events to the AgenticBilling API and browse usage/cost reports"
)]
pub struct CliArgs {
    /// Base URL for the API (e.g. https://api.agenticbilling.ai).
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key for authentication. Prompted for (masked) when absent.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Provider name reported with each event.
    #[arg(long)]
    pub provider: Option<String>,
}

/// Resolved tool configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL, without a trailing slash.
    pub base_url: String,

    /// API key sent in the `x-api-key` header.
    pub api_key: String,

    /// Provider name reported with each event.
    pub provider: String,
}

impl Config {
    /// Resolve configuration from flags, environment and prompts.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when an interactive prompt cannot be read.
    pub fn resolve(args: CliArgs, prompt: &mut dyn Prompt) -> io::Result<Self> {
        let base_url = match args.base_url.or_else(|| env_var("AB_BASE_URL")) {
            Some(url) => url,
            None => {
                let typed =
                    prompt.ask(&format!("Enter base URL (or press Enter for {DEFAULT_BASE_URL}): "))?;
                let typed = typed.trim().to_string();
                if typed.is_empty() {
                    DEFAULT_BASE_URL.to_string()
                } else {
                    typed
                }
            }
        };

        let api_key = match args.api_key.or_else(|| env_var("AB_API_KEY")) {
            Some(key) => key,
            None => {
                let key = console::read_masked("Enter API key: ")?;
                let key = key.trim().to_string();
                if key.is_empty() {
                    prompt.say("Warning: no API key entered");
                } else {
                    prompt.say(&format!(
                        "API key received ({} characters): {}",
                        key.len(),
                        mask(&key)
                    ));
                }
                key
            }
        };

        let provider = args
            .provider
            .or_else(|| env_var("AB_PROVIDER"))
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            provider,
        })
    }

    /// The API key with all but the last four characters masked.
    #[must_use]
    pub fn masked_key(&self) -> String {
        mask(&self.api_key)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 4 {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{tail}", "*".repeat(chars.len() - 4))
    } else {
        "*".repeat(chars.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_usage_core::ScriptedPrompt;

    fn args(base_url: Option<&str>, api_key: Option<&str>, provider: Option<&str>) -> CliArgs {
        CliArgs {
            base_url: base_url.map(String::from),
            api_key: api_key.map(String::from),
            provider: provider.map(String::from),
        }
    }

    #[test]
    fn flags_take_precedence() {
        let mut prompt = ScriptedPrompt::default();
        let config = Config::resolve(
            args(Some("https://api.example.com/"), Some("sk-12345678"), Some("Example")),
            &mut prompt,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.api_key, "sk-12345678");
        assert_eq!(config.provider, "Example");
        assert!(prompt.transcript.is_empty());
    }

    #[test]
    fn blank_base_url_prompt_falls_back_to_default() {
        let mut prompt = ScriptedPrompt::new([""]);
        let config =
            Config::resolve(args(None, Some("sk-12345678"), None), &mut prompt).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider, DEFAULT_PROVIDER);
    }

    #[test]
    fn masked_key_keeps_last_four() {
        let mut prompt = ScriptedPrompt::default();
        let config = Config::resolve(
            args(Some("https://api.example.com"), Some("sk-abcdef1234"), None),
            &mut prompt,
        )
        .unwrap();
        assert_eq!(config.masked_key(), "**********1234");
    }

    #[test]
    fn short_keys_are_fully_masked() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }
}
