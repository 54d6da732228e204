//! Preview/decision loop.
//!
//! Renders the current envelope, then loops on send / edit / cancel until
//! a terminal decision. Send validates first and refuses to transmit an
//! invalid event; a transport failure returns to the preview untouched so
//! the operator may retry or cancel.

use std::io;

use crate::editor::{full_edit, quick_edit};
use crate::event::UsageEvent;
use crate::prompt::Prompt;
use crate::transport::UsageTransport;
use crate::validate::validate;

/// Terminal result of one preview cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event was transmitted; carries the server response.
    Sent(serde_json::Value),
    /// The operator discarded the event. Nothing was transmitted.
    Cancelled,
}

/// Run the preview/edit/send loop for one event.
///
/// # Errors
///
/// Returns an I/O error when the console is closed mid-session, or when
/// the event cannot be rendered.
pub async fn run_preview_cycle(
    event: &mut UsageEvent,
    prompt: &mut dyn Prompt,
    transport: &dyn UsageTransport,
) -> io::Result<Outcome> {
    loop {
        let rendered = event.envelope_json().map_err(io::Error::other)?;
        prompt.say("\nEvent preview:");
        prompt.say(&rendered);

        let action = prompt.ask("(s)end, (e)dit, or (c)ancel? ")?;
        match action.trim().to_lowercase().as_str() {
            "s" | "send" => {
                let errors = validate(event);
                if !errors.is_empty() {
                    prompt.say("Cannot send, the event is invalid:");
                    for error in &errors {
                        prompt.say(&format!("  - {error}"));
                    }
                    continue;
                }

                tracing::debug!(event_id = %event.id, "submitting usage event");
                match transport.send(event).await {
                    Ok(response) => {
                        prompt.say("Server response:");
                        prompt.say(
                            &serde_json::to_string_pretty(&response)
                                .unwrap_or_else(|_| response.to_string()),
                        );
                        return Ok(Outcome::Sent(response));
                    }
                    Err(error) => {
                        tracing::warn!(%error, "usage submission failed");
                        prompt.say(&format!("Send failed: {error}"));
                        // The event is untouched; the operator may retry.
                    }
                }
            }
            "e" | "edit" => {
                let mode = prompt.ask("(q)uick or (f)ull edit? ")?;
                match mode.trim().to_lowercase().as_str() {
                    "q" | "quick" => quick_edit(event, prompt)?,
                    "f" | "full" => full_edit(event, prompt)?,
                    _ => prompt.say("Invalid choice"),
                }
            }
            "c" | "cancel" => {
                prompt.say("Cancelled");
                return Ok(Outcome::Cancelled);
            }
            _ => prompt.say("Invalid choice. Enter 's' (send), 'e' (edit) or 'c' (cancel)"),
        }
    }
}
