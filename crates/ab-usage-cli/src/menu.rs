//! Main menu and usage submission flow.

use std::io;

use ab_usage_client::UsageApiClient;
use ab_usage_core::{new_template, run_preview_cycle, Outcome, Prompt, TemplateKind, UlidIds};

use crate::config::Config;
use crate::report;

/// Run the main menu until the operator exits.
///
/// # Errors
///
/// Returns an I/O error when the console is closed mid-session.
pub async fn main_menu(
    config: &Config,
    client: &UsageApiClient,
    prompt: &mut dyn Prompt,
) -> io::Result<()> {
    loop {
        prompt.say("\nMain menu:");
        prompt.say("  1. Send usage data");
        prompt.say("  2. View usage & cost data");
        prompt.say("  0. Exit");

        let choice = prompt.ask("Select option (0-2): ")?;
        match choice.trim() {
            "0" => return Ok(()),
            "1" => send_menu(config, client, prompt).await?,
            "2" => report::reports_menu(client, prompt).await?,
            _ => prompt.say("Invalid choice. Please select 0, 1, or 2."),
        }
    }
}

/// Template selection and preview/send loop.
async fn send_menu(
    config: &Config,
    client: &UsageApiClient,
    prompt: &mut dyn Prompt,
) -> io::Result<()> {
    let ids = UlidIds;
    loop {
        prompt.say("\nSend usage data:");
        for (i, kind) in TemplateKind::ALL.iter().enumerate() {
            prompt.say(&format!("  {}. {}", i + 1, kind.label()));
        }
        prompt.say("  0. Back to main menu");

        let choice = prompt.ask(&format!("Select template (0-{}): ", TemplateKind::ALL.len()))?;
        let choice = choice.trim();
        if choice == "0" {
            return Ok(());
        }

        let Some(kind) = choice
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=TemplateKind::ALL.len()).contains(n))
            .map(|n| TemplateKind::ALL[n - 1])
        else {
            prompt.say("Invalid choice");
            continue;
        };

        tracing::debug!(template = kind.as_str(), "building usage event");
        let mut event = new_template(kind, &config.provider, &ids, &[])
            .map_err(io::Error::other)?;

        if kind == TemplateKind::Custom {
            prompt.say("Custom event created with placeholder values; use edit to fill it in.");
        }

        match run_preview_cycle(&mut event, prompt, client).await? {
            Outcome::Sent(_) => {
                let again = prompt.ask("Send another usage event? (y/N): ")?;
                if !again.trim().eq_ignore_ascii_case("y") {
                    return Ok(());
                }
            }
            Outcome::Cancelled => {}
        }
    }
}
