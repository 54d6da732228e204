//! Interactive event editor.
//!
//! Two modes over one live [`UsageEvent`], both going through the same
//! mutation primitive ([`UsageEvent::apply`]):
//!
//! - **Quick mode** offers a fixed menu of the commonly-edited fields.
//! - **Full mode** walks the whole document tree recursively; any scalar
//!   can be edited, meters can be added/removed, and dimension/tag entries
//!   can be added, overwritten or removed.
//!
//! Every accepted leaf edit mutates the event immediately. A failed
//! coercion reports the error and re-prompts without mutating, so the
//! event is never left partially typed.

use std::io;

use crate::event::UsageEvent;
use crate::node::{EditOp, FieldPath, Node};
use crate::prompt::Prompt;

/// The fixed quick-mode menu: path and label.
const QUICK_FIELDS: &[(&str, &str)] = &[
    ("data.service", "Service"),
    ("data.operation", "Operation"),
    ("data.resourceId", "Resource ID"),
    ("data.tenantId", "Tenant ID"),
    ("data.userId", "User ID"),
    ("data.meters[0].quantity", "First meter quantity"),
    ("data.meters[0].unit", "First meter unit"),
];

/// Run the quick-edit menu until the operator is done.
///
/// # Errors
///
/// Returns an I/O error when the console is closed mid-session.
pub fn quick_edit(event: &mut UsageEvent, prompt: &mut dyn Prompt) -> io::Result<()> {
    loop {
        let tree = event.to_node();
        prompt.say("\nQuick edit - common fields:");
        for (i, (path, label)) in QUICK_FIELDS.iter().enumerate() {
            let current = lookup_summary(&tree, path);
            prompt.say(&format!("  {}. {label:<22} {current}", i + 1));
        }
        prompt.say("  0. Done");

        let choice = prompt.ask(&format!("Select field (0-{}): ", QUICK_FIELDS.len()))?;
        let choice = choice.trim().to_lowercase();
        match choice.as_str() {
            "0" | "done" => return Ok(()),
            _ => match choice.parse::<usize>() {
                Ok(n) if (1..=QUICK_FIELDS.len()).contains(&n) => {
                    let path = parse_known_path(QUICK_FIELDS[n - 1].0);
                    edit_scalar(event, prompt, &path)?;
                }
                _ => prompt.say("Invalid choice"),
            },
        }
    }
}

/// Run the recursive full-edit walk until the operator finishes.
///
/// # Errors
///
/// Returns an I/O error when the console is closed mid-session.
pub fn full_edit(event: &mut UsageEvent, prompt: &mut dyn Prompt) -> io::Result<()> {
    walk(event, prompt, &FieldPath::root())?;
    Ok(())
}

/// How a level of the tree walk was left.
enum Walk {
    /// Go up one level.
    Up,
    /// Finish the whole session.
    Done,
}

fn walk(event: &mut UsageEvent, prompt: &mut dyn Prompt, path: &FieldPath) -> io::Result<Walk> {
    loop {
        let tree = event.to_node();
        let Some(node) = tree.at(path) else {
            // The node was removed out from under us (e.g. a deleted meter).
            return Ok(Walk::Up);
        };

        prompt.say(&format!("\nEditing {path}:"));
        let outcome = match node {
            Node::Record(fields) => {
                let children: Vec<(String, bool)> = fields
                    .iter()
                    .enumerate()
                    .map(|(i, (name, child))| {
                        prompt.say(&format!("  {}. {name:<14} {}", i + 1, child.summary()));
                        (name.clone(), matches!(child, Node::Scalar(_)))
                    })
                    .collect();
                record_level(event, prompt, path, &children)?
            }
            Node::List { items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    prompt.say(&format!("  {}. {}", i + 1, item.summary()));
                }
                list_level(event, prompt, path, items.len())?
            }
            Node::Map(entries) => {
                let pairs: Vec<(String, String)> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                for (i, (key, value)) in pairs.iter().enumerate() {
                    prompt.say(&format!("  {}. {key} = {value}", i + 1));
                }
                map_level(event, prompt, path, &pairs)?
            }
            Node::Scalar(_) => {
                // Only reachable by descending into a leaf; edit and go up.
                edit_scalar(event, prompt, path)?;
                return Ok(Walk::Up);
            }
        };

        match outcome {
            Level::Stay => {}
            Level::Up => return Ok(Walk::Up),
            Level::Done => return Ok(Walk::Done),
            Level::Descend(child) => {
                if let Walk::Done = walk(event, prompt, &child)? {
                    return Ok(Walk::Done);
                }
            }
        }
    }
}

/// What to do after handling one menu input.
enum Level {
    Stay,
    Up,
    Done,
    Descend(FieldPath),
}

fn record_level(
    event: &mut UsageEvent,
    prompt: &mut dyn Prompt,
    path: &FieldPath,
    children: &[(String, bool)],
) -> io::Result<Level> {
    let choice = prompt.ask("Select field, (u)p or (q)uit: ")?;
    match menu_choice(&choice, children.len()) {
        Choice::Up => Ok(Level::Up),
        Choice::Quit => Ok(Level::Done),
        Choice::Number(n) => {
            let (name, is_scalar) = &children[n - 1];
            let child = path.child(name.clone());
            if *is_scalar {
                edit_scalar(event, prompt, &child)?;
                Ok(Level::Stay)
            } else {
                Ok(Level::Descend(child))
            }
        }
        _ => {
            prompt.say("Invalid choice");
            Ok(Level::Stay)
        }
    }
}

fn list_level(
    event: &mut UsageEvent,
    prompt: &mut dyn Prompt,
    path: &FieldPath,
    len: usize,
) -> io::Result<Level> {
    let choice = prompt.ask("Select item, (a)dd, (d)elete, (u)p or (q)uit: ")?;
    match menu_choice(&choice, len) {
        Choice::Up => Ok(Level::Up),
        Choice::Quit => Ok(Level::Done),
        Choice::Add => {
            report(prompt, event.apply(&EditOp::InsertListItem { path: path.clone() }));
            Ok(Level::Stay)
        }
        Choice::Delete => {
            let raw = prompt.ask(&format!("Delete which item (1-{len}): "))?;
            match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => {
                    report(
                        prompt,
                        event.apply(&EditOp::RemoveListItem {
                            path: path.clone(),
                            index: n - 1,
                        }),
                    );
                }
                _ => prompt.say("Invalid item number"),
            }
            Ok(Level::Stay)
        }
        Choice::Number(n) => Ok(Level::Descend(path.index(n - 1))),
        Choice::Other => {
            prompt.say("Invalid choice");
            Ok(Level::Stay)
        }
    }
}

fn map_level(
    event: &mut UsageEvent,
    prompt: &mut dyn Prompt,
    path: &FieldPath,
    pairs: &[(String, String)],
) -> io::Result<Level> {
    let choice = prompt.ask("Select entry, (a)dd, (d)elete, (u)p or (q)uit: ")?;
    match menu_choice(&choice, pairs.len()) {
        Choice::Up => Ok(Level::Up),
        Choice::Quit => Ok(Level::Done),
        Choice::Add => {
            let key = prompt.ask("Key: ")?;
            let key = key.trim().to_string();
            if key.is_empty() {
                prompt.say("Skipped (empty key)");
            } else {
                let value = prompt.ask(&format!("Value for {key:?}: "))?;
                report(
                    prompt,
                    event.apply(&EditOp::InsertMapEntry {
                        path: path.clone(),
                        key,
                        value: value.trim().to_string(),
                    }),
                );
            }
            Ok(Level::Stay)
        }
        Choice::Delete => {
            let key = prompt.ask("Key to remove: ")?;
            report(
                prompt,
                event.apply(&EditOp::RemoveMapEntry {
                    path: path.clone(),
                    key: key.trim().to_string(),
                }),
            );
            Ok(Level::Stay)
        }
        Choice::Number(n) => {
            let (key, current) = &pairs[n - 1];
            let raw = prompt.ask(&format!("New value for {key} [{current}]: "))?;
            let raw = raw.trim();
            if raw.is_empty() {
                prompt.say("  unchanged");
            } else {
                report(
                    prompt,
                    event.apply(&EditOp::Set {
                        path: path.child(key.clone()),
                        raw: raw.to_string(),
                    }),
                );
            }
            Ok(Level::Stay)
        }
        Choice::Other => {
            prompt.say("Invalid choice");
            Ok(Level::Stay)
        }
    }
}

/// A parsed menu input.
enum Choice {
    Number(usize),
    Add,
    Delete,
    Up,
    Quit,
    Other,
}

fn menu_choice(raw: &str, len: usize) -> Choice {
    match raw.trim().to_lowercase().as_str() {
        "a" | "add" => Choice::Add,
        "d" | "del" | "delete" => Choice::Delete,
        "u" | "up" => Choice::Up,
        "q" | "quit" | "done" => Choice::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if (1..=len).contains(&n) => Choice::Number(n),
            _ => Choice::Other,
        },
    }
}

/// Prompt for a new leaf value until it coerces or the operator keeps the
/// current one with blank input.
fn edit_scalar(
    event: &mut UsageEvent,
    prompt: &mut dyn Prompt,
    path: &FieldPath,
) -> io::Result<()> {
    let current = event
        .to_node()
        .at(path)
        .map(Node::summary)
        .unwrap_or_else(|| "-".to_string());
    loop {
        let raw = prompt.ask(&format!("New value for {path} [{current}]: "))?;
        let raw = raw.trim();
        if raw.is_empty() {
            prompt.say("  unchanged");
            return Ok(());
        }
        match event.apply(&EditOp::Set {
            path: path.clone(),
            raw: raw.to_string(),
        }) {
            Ok(()) => {
                tracing::debug!(%path, "field updated");
                prompt.say("  updated");
                return Ok(());
            }
            Err(e) => prompt.say(&format!("  {e}")),
        }
    }
}

fn report(prompt: &mut dyn Prompt, result: Result<(), crate::node::EditError>) {
    match result {
        Ok(()) => prompt.say("  updated"),
        Err(e) => prompt.say(&format!("  {e}")),
    }
}

fn lookup_summary(tree: &Node, path: &str) -> String {
    path.parse::<FieldPath>()
        .ok()
        .and_then(|p| tree.at(&p).map(Node::summary))
        .unwrap_or_else(|| "-".to_string())
}

/// Parse a path literal that is known to be well-formed.
fn parse_known_path(path: &str) -> FieldPath {
    path.parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequenceIds;
    use crate::prompt::ScriptedPrompt;
    use crate::template::{new_template, TemplateKind};

    fn event() -> UsageEvent {
        new_template(TemplateKind::AiChat, "AgenticBilling.AI", &SequenceIds::new("id"), &[])
            .unwrap()
    }

    #[test]
    fn quick_edit_updates_selected_field() {
        let mut edited = event();
        let mut prompt = ScriptedPrompt::new(["1", "ai.embeddings", "0"]);
        quick_edit(&mut edited, &mut prompt).unwrap();
        assert_eq!(edited.data.service, "ai.embeddings");
        assert!(prompt.exhausted());
    }

    #[test]
    fn quick_edit_changes_only_that_field() {
        let mut edited = event();
        let before = edited.clone();
        let mut prompt = ScriptedPrompt::new(["4", "org/globex", "0"]);
        quick_edit(&mut edited, &mut prompt).unwrap();

        let mut expected = before;
        expected.data.tenant_id = Some("org/globex".to_string());
        assert_eq!(edited, expected);
    }

    #[test]
    fn quick_edit_reprompts_on_bad_number_without_mutating() {
        let mut edited = event();
        let snapshot = edited.clone();
        let mut prompt = ScriptedPrompt::new(["6", "abc", "", "0"]);
        quick_edit(&mut edited, &mut prompt).unwrap();

        // The bad value was rejected, the blank kept the original.
        assert_eq!(edited, snapshot);
        let errors: Vec<&String> = prompt
            .transcript
            .iter()
            .filter(|line| line.contains("not a number"))
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn quick_edit_blank_input_keeps_value() {
        let mut edited = event();
        let before = edited.data.operation.clone();
        let mut prompt = ScriptedPrompt::new(["2", "", "0"]);
        quick_edit(&mut edited, &mut prompt).unwrap();
        assert_eq!(edited.data.operation, before);
    }

    #[test]
    fn full_edit_descends_and_edits_a_scalar() {
        let mut edited = event();
        // root field 4 is "data", data field 2 is "service".
        let mut prompt = ScriptedPrompt::new(["4", "2", "ai.embeddings", "q"]);
        full_edit(&mut edited, &mut prompt).unwrap();
        assert_eq!(edited.data.service, "ai.embeddings");
    }

    #[test]
    fn full_edit_adds_and_removes_meters() {
        let mut edited = event();
        let before = edited.data.meters.len();
        // data -> meters -> add -> delete the new item -> up -> quit.
        let added = (before + 1).to_string();
        let script = ["4", "7", "a", "d", added.as_str(), "u", "q"];
        let mut prompt = ScriptedPrompt::new(script);
        full_edit(&mut edited, &mut prompt).unwrap();
        assert_eq!(edited.data.meters.len(), before);
    }

    #[test]
    fn full_edit_edits_a_meter_field() {
        let mut edited = event();
        // data -> meters -> item 1 -> field 2 (quantity) -> new value -> quit.
        let mut prompt = ScriptedPrompt::new(["4", "7", "1", "2", "2048", "q"]);
        full_edit(&mut edited, &mut prompt).unwrap();
        assert_eq!(edited.data.meters[0].quantity, 2048.0);
    }

    #[test]
    fn full_edit_adds_a_tag_entry() {
        let mut edited = event();
        // data -> tags (field 9) -> add key/value -> quit.
        let mut prompt = ScriptedPrompt::new(["4", "9", "a", "region", "eu-west", "q"]);
        full_edit(&mut edited, &mut prompt).unwrap();
        assert_eq!(
            edited.data.tags.as_ref().unwrap().get("region"),
            Some(&"eu-west".to_string())
        );
    }

    #[test]
    fn full_edit_up_at_root_finishes() {
        let mut edited = event();
        let snapshot = edited.clone();
        let mut prompt = ScriptedPrompt::new(["u"]);
        full_edit(&mut edited, &mut prompt).unwrap();
        assert_eq!(edited, snapshot);
        assert!(prompt.exhausted());
    }
}
