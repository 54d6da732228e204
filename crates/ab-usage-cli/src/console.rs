//! Terminal console: line prompts and masked key entry.

use std::io::{self, BufRead, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use ab_usage_core::Prompt;

/// Console backed by stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn say(&mut self, text: &str) {
        println!("{text}");
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        print!("{question}");
        io::stdout().flush()?;
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Read a secret from the terminal, echoing `*` per character.
///
/// Backspace erases, Enter finishes, Ctrl-C aborts with an
/// [`io::ErrorKind::Interrupted`] error. When the terminal cannot enter
/// raw mode (e.g. piped stdin) the input is read as a plain visible line.
///
/// # Errors
///
/// Returns an I/O error when the terminal is unreadable or the entry was
/// aborted.
pub fn read_masked(question: &str) -> io::Result<String> {
    print!("{question}");
    io::stdout().flush()?;

    if terminal::enable_raw_mode().is_err() {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }

    let result = masked_loop();
    let _ = terminal::disable_raw_mode();
    println!();
    result
}

fn masked_loop() -> io::Result<String> {
    let mut secret = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => return Ok(secret),
                KeyCode::Backspace => {
                    if secret.pop().is_some() {
                        print!("\x08 \x08");
                        io::stdout().flush()?;
                    }
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(io::Error::new(
                        io::ErrorKind::Interrupted,
                        "key entry aborted",
                    ));
                }
                KeyCode::Char(c) => {
                    secret.push(c);
                    print!("*");
                    io::stdout().flush()?;
                }
                _ => {}
            }
        }
    }
}
