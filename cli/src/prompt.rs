//! Raw-mode terminal input.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use doccompare_extract::PasswordIssue;

/// Ask a yes/no question on stderr. Anything but `y` (or 30 seconds of silence) is a no.
pub fn read_yes_no(question: &str) -> io::Result<bool> {
    eprint!("\x1b[33m{question}\x1b[0m");
    io::stderr().flush().ok();
    enable_raw_mode()?;
    let _guard = RawModeGuard;

    loop {
        if !event::poll(Duration::from_secs(30))? {
            eprint!("n (timeout)\r\n");
            return Ok(false);
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('y' | 'Y') => {
                    eprint!("y\r\n");
                    return Ok(true);
                }
                KeyCode::Char('n' | 'N') | KeyCode::Enter | KeyCode::Esc => {
                    eprint!("n\r\n");
                    return Ok(false);
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    eprint!("\r\n");
                    return Ok(false);
                }
                _ => {}
            }
        }
    }
}

/// Prompt for the password of `label` without echoing it.
///
/// Returns `None` when the user presses Esc or Ctrl-C.
pub fn read_password(
    label: &str,
    issue: PasswordIssue,
    attempts: usize,
) -> io::Result<Option<String>> {
    eprint!("\r\x1b[2K");
    match issue {
        PasswordIssue::Required => {
            eprintln!("\x1b[36m🔒 {label} is password protected.\x1b[0m");
        }
        PasswordIssue::Incorrect => {
            eprintln!("\x1b[31m✗ Incorrect password for {label} (attempt {attempts}).\x1b[0m");
        }
    }
    eprint!("\x1b[33mPassword\x1b[0m \x1b[90m(Esc to cancel)\x1b[0m: ");
    io::stderr().flush().ok();

    enable_raw_mode()?;
    let _guard = RawModeGuard;

    let mut buffer = String::new();
    loop {
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Esc => {
                eprint!("\r\n");
                return Ok(None);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                eprint!("\r\n");
                return Ok(None);
            }
            KeyCode::Enter => {
                eprint!("\r\n");
                return Ok(Some(buffer));
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
    }
}

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}
