//! Line-based session scripts.
//!
//! Each non-blank, non-comment line is one input event for the engine. The
//! grammar mirrors what a person does in the session view: pick a shape,
//! click an annotation, switch mode, hold keys, scroll, press the on-screen
//! arrows, leave the window, share a file.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use std::time::Duration;

use annotations::edit::EditMode;
use annotations::input::MoveKey;
use protocol::{MediaKind, ShapeKind};

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    Create(ShapeKind),
    Edit(String),
    /// Edit the annotation this session created most recently.
    EditLast,
    Mode(EditMode),
    Sensitivity(f64),
    KeyDown { key: String, shift: bool },
    KeyUp { key: String, shift: bool },
    Wheel { delta: f64, shift: bool },
    Nudge(MoveKey),
    Escape,
    /// Window lost focus; held keys are released.
    Blur,
    Delete(String),
    /// Delete whatever is being edited.
    DeleteCurrent,
    Share { kind: MediaKind, url: String },
    Wait(Duration),
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{command}` expects {expected}")]
    MissingArgument { command: String, expected: &'static str },
    #[error("invalid argument `{value}`: {reason}")]
    InvalidArgument { value: String, reason: String },
    #[error("unexpected trailing input `{0}`")]
    Trailing(String),
}

/// Parse one script line. Blank lines and `#` comments yield `Ok(None)`.
///
/// # Errors
///
/// Returns a [`ScriptError`] describing the first problem on the line.
pub fn parse_line(line: &str) -> Result<Option<ScriptEvent>, ScriptError> {
    let line = line.split_once('#').map_or(line, |(before, _)| before).trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let mut args = Args { command, words };

    let event = match command {
        "create" => ScriptEvent::Create(args.parse("a shape (Circle, Square, Arrow, Triangle)")?),
        "edit" => ScriptEvent::Edit(args.word("an annotation id")?.to_owned()),
        "edit-last" => ScriptEvent::EditLast,
        "mode" => ScriptEvent::Mode(args.parse("position, rotation or scale")?),
        "sensitivity" => ScriptEvent::Sensitivity(args.number("a number")?),
        "down" => {
            let key = args.word("a key")?.to_owned();
            ScriptEvent::KeyDown { key, shift: args.shift()? }
        }
        "up" => {
            let key = args.word("a key")?.to_owned();
            ScriptEvent::KeyUp { key, shift: args.shift()? }
        }
        "wheel" => {
            let delta = args.number("a wheel delta")?;
            ScriptEvent::Wheel { delta, shift: args.shift()? }
        }
        "nudge" => {
            let key = args.word("one of w, a, s, d")?;
            let Some(key) = MoveKey::from_name(key) else {
                return Err(ScriptError::InvalidArgument {
                    value: key.to_owned(),
                    reason: "expected one of w, a, s, d".to_owned(),
                });
            };
            ScriptEvent::Nudge(key)
        }
        "escape" => ScriptEvent::Escape,
        "blur" => ScriptEvent::Blur,
        "delete" => ScriptEvent::Delete(args.word("an annotation id")?.to_owned()),
        "delete-current" => ScriptEvent::DeleteCurrent,
        "share" => {
            let kind = args.parse("pdf, image or video")?;
            let url = args.word("a url")?.to_owned();
            ScriptEvent::Share { kind, url }
        }
        "wait" => {
            let ms: u64 = args.parse("milliseconds")?;
            ScriptEvent::Wait(Duration::from_millis(ms))
        }
        "list" => ScriptEvent::List,
        other => return Err(ScriptError::UnknownCommand(other.to_owned())),
    };

    args.finish()?;
    Ok(Some(event))
}

struct Args<'a, I> {
    command: &'a str,
    words: I,
}

impl<'a, I: Iterator<Item = &'a str>> Args<'a, I> {
    fn word(&mut self, expected: &'static str) -> Result<&'a str, ScriptError> {
        self.words.next().ok_or_else(|| ScriptError::MissingArgument {
            command: self.command.to_owned(),
            expected,
        })
    }

    fn parse<T>(&mut self, expected: &'static str) -> Result<T, ScriptError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let word = self.word(expected)?;
        word.parse()
            .map_err(|e: T::Err| ScriptError::InvalidArgument { value: word.to_owned(), reason: e.to_string() })
    }

    fn number(&mut self, expected: &'static str) -> Result<f64, ScriptError> {
        let value: f64 = self.parse(expected)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ScriptError::InvalidArgument { value: value.to_string(), reason: "must be finite".to_owned() })
        }
    }

    /// Optional trailing `shift` flag.
    fn shift(&mut self) -> Result<bool, ScriptError> {
        match self.words.next() {
            None => Ok(false),
            Some(word) if word.eq_ignore_ascii_case("shift") => Ok(true),
            Some(word) => Err(ScriptError::InvalidArgument {
                value: word.to_owned(),
                reason: "expected `shift` or nothing".to_owned(),
            }),
        }
    }

    fn finish(mut self) -> Result<(), ScriptError> {
        match self.words.next() {
            None => Ok(()),
            Some(word) => Err(ScriptError::Trailing(word.to_owned())),
        }
    }
}
