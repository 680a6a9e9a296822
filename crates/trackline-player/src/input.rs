//! Line-based command input
//!
//! stdin is read on its own thread; parsed commands are forwarded over a
//! crossbeam channel and drained by the tick loop.

use std::io::BufRead;
use std::thread::JoinHandle;

use crossbeam::channel::Sender;
use trackline_core::SessionCommand;

/// A parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    Session(SessionCommand),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  toggle-target   play/pause the target track
  stop-target     stop the target track
  toggle          start/pause/resume the sample tracks
  stop            stop the sample tracks and return to the origin
  pitch-up        raise sample pitch
  pitch-down      lower sample pitch
  status          print track states
  quit            exit";

/// Parse one input line; `None` for blank or unknown input
pub fn parse_command(line: &str) -> Option<PlayerInput> {
    let input = match line.trim().to_ascii_lowercase().as_str() {
        "toggle-target" | "space" => PlayerInput::Session(SessionCommand::ToggleTarget),
        "stop-target" | "s" => PlayerInput::Session(SessionCommand::StopTarget),
        "toggle" | "p" => PlayerInput::Session(SessionCommand::ToggleSamples),
        "stop" | "return" => PlayerInput::Session(SessionCommand::StopSamples),
        "pitch-up" | "up" => PlayerInput::Session(SessionCommand::PitchUp),
        "pitch-down" | "down" => PlayerInput::Session(SessionCommand::PitchDown),
        "status" => PlayerInput::Status,
        "help" | "?" => PlayerInput::Help,
        "quit" | "exit" | "q" => PlayerInput::Quit,
        _ => return None,
    };
    Some(input)
}

/// Spawn the stdin reader; sends `Quit` on end of input
pub fn spawn_stdin_reader(sender: Sender<PlayerInput>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("stdin-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!("stdin read failed: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(input) => {
                        if sender.send(input).is_err() {
                            return;
                        }
                        if input == PlayerInput::Quit {
                            return;
                        }
                    }
                    None => log::warn!("Unknown command '{}' (try 'help')", line.trim()),
                }
            }
            let _ = sender.send(PlayerInput::Quit);
        })
}
