//! Line-oriented control protocol.
//!
//! Commands arrive as `COMMAND[=ARG]` lines; the command is case-folded,
//! the argument kept verbatim.  Every valid command answers
//! `OK:<CMD>=<value>`, anything else answers `ERR`.  Parsing and dispatch
//! are pure functions over the shared link state so the whole surface is
//! testable without audio.

use crate::bridge::{LinkState, Mode};

/// A parsed control command.  `None` payloads are queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Mode(Option<Mode>),
    SquelchEnable(Option<bool>),
    SquelchThreshold(Option<f32>),
    Text(Option<String>),
    Clip,
    Frames,
    Stat,
    Snr,
    Sync,
    FreqOffset,
    Version,
    Quit,
}

/// Outcome of dispatching one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Line(String),
    Err,
    Quit,
}

impl Response {
    fn ok(cmd: &str, value: impl std::fmt::Display) -> Self {
        Response::Line(format!("OK:{}={}", cmd, value))
    }
}

/// Parse one input line.  Returns `None` for anything malformed: unknown
/// command, an argument on a query-only command, or an unparsable argument.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    let (cmd, arg) = match line.split_once('=') {
        Some((cmd, arg)) => (cmd.trim(), Some(arg)),
        None => (line, None),
    };
    let cmd = cmd.to_ascii_uppercase();

    match (cmd.as_str(), arg) {
        ("MODE", None) => Some(Command::Mode(None)),
        ("MODE", Some(arg)) => arg.trim().parse::<Mode>().ok().map(|m| Command::Mode(Some(m))),

        ("SQEN", None) => Some(Command::SquelchEnable(None)),
        ("SQEN", Some(arg)) => match arg.trim().parse::<i32>() {
            Ok(v) => Some(Command::SquelchEnable(Some(v != 0))),
            Err(_) => None,
        },

        ("SQTH", None) => Some(Command::SquelchThreshold(None)),
        ("SQTH", Some(arg)) => arg
            .trim()
            .parse::<f32>()
            .ok()
            .map(|v| Command::SquelchThreshold(Some(v))),

        // An explicit empty argument is also a query.
        ("TEXT", None) => Some(Command::Text(None)),
        ("TEXT", Some(arg)) => {
            if arg.is_empty() {
                Some(Command::Text(None))
            } else {
                Some(Command::Text(Some(arg.to_string())))
            }
        }

        ("CLIP", None) => Some(Command::Clip),
        ("FRAMES", None) => Some(Command::Frames),
        ("STAT", None) => Some(Command::Stat),
        ("SNR", None) => Some(Command::Snr),
        ("SYNC", None) => Some(Command::Sync),
        ("DF", None) => Some(Command::FreqOffset),
        ("VERSION", None) => Some(Command::Version),
        ("QUIT", None) => Some(Command::Quit),

        _ => None,
    }
}

/// Execute a command against the link state.
pub fn dispatch(command: Command, link: &LinkState) -> Response {
    match command {
        Command::Mode(None) => Response::ok("MODE", link.mode()),
        Command::Mode(Some(mode)) => {
            link.set_mode(mode);
            Response::ok("MODE", mode)
        }

        Command::SquelchEnable(None) => Response::ok("SQEN", link.squelch_enabled() as u8),
        Command::SquelchEnable(Some(enabled)) => {
            link.set_squelch_enabled(enabled);
            Response::ok("SQEN", enabled as u8)
        }

        Command::SquelchThreshold(None) => Response::ok("SQTH", link.squelch_threshold()),
        Command::SquelchThreshold(Some(threshold)) => {
            link.set_squelch_threshold(threshold);
            Response::ok("SQTH", threshold)
        }

        Command::Text(None) => Response::ok("TEXT", link.text()),
        Command::Text(Some(text)) => {
            link.set_text(&text);
            Response::ok("TEXT", text)
        }

        Command::Clip => Response::ok("CLIP", link.take_clipped() as u8),
        Command::Frames => Response::ok("FRAMES", link.frames()),
        Command::Stat => Response::ok(
            "STAT",
            format!(
                "{}:{}",
                link.snr(),
                if link.sync() { "SYNC" } else { "NO_SYNC" }
            ),
        ),
        Command::Snr => Response::ok("SNR", link.snr()),
        Command::Sync => Response::ok("SYNC", link.sync() as u8),
        Command::FreqOffset => Response::ok("DF", link.freq_offset()),
        Command::Version => Response::ok(
            "VERSION",
            concat!("dvbridge ", env!("CARGO_PKG_VERSION")),
        ),
        Command::Quit => Response::Quit,
    }
}

/// Parse and execute one line.
pub fn handle_line(line: &str, link: &LinkState) -> Response {
    match parse(line) {
        Some(command) => dispatch(command, link),
        None => Response::Err,
    }
}
