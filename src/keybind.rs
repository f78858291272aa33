//! Hotkey identifiers: user strings in, canonical accelerators out.
//!
//! Accepts the forms users type into the config file (`F9`, `<ctrl>+<shift>+a`,
//! `numpad_5`, `alt+numpad_plus`) and normalises them to the accelerator
//! syntax understood by the global hotkey backend (`control+shift+KeyA`).

use std::collections::BTreeSet;
use std::fmt;

/// Modifier keys, ordered the way the canonical form prints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Control,
    Shift,
    Alt,
    Super,
}

impl Modifier {
    fn from_token(token: &str) -> Option<Self> {
        let base = token
            .strip_suffix("_l")
            .or_else(|| token.strip_suffix("_r"))
            .unwrap_or(token);
        match base {
            "ctrl" | "control" => Some(Modifier::Control),
            "shift" => Some(Modifier::Shift),
            "alt" | "option" | "alt_gr" => Some(Modifier::Alt),
            "cmd" | "command" | "super" | "win" | "meta" => Some(Modifier::Super),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Modifier::Control => "control",
            Modifier::Shift => "shift",
            Modifier::Alt => "alt",
            Modifier::Super => "super",
        }
    }
}

/// A parsed hotkey: any number of modifiers plus exactly one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keybind {
    modifiers: BTreeSet<Modifier>,
    code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeybindError {
    #[error("Hotkey is empty")]
    Empty,

    #[error("Hotkey '{0}' has no key besides modifiers")]
    ModifiersOnly(String),

    #[error("Hotkey '{input}' has more than one key ('{first}' and '{second}')")]
    MultipleKeys {
        input: String,
        first: String,
        second: String,
    },

    #[error("Unrecognized key '{key}' in hotkey '{input}'")]
    UnknownKey { input: String, key: String },
}

impl Keybind {
    pub fn parse(input: &str) -> Result<Self, KeybindError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(KeybindError::Empty);
        }

        let mut modifiers = BTreeSet::new();
        let mut key: Option<(String, String)> = None;

        for raw in split_tokens(trimmed) {
            let token = raw
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_lowercase();
            if token.is_empty() {
                return Err(KeybindError::UnknownKey {
                    input: trimmed.to_string(),
                    key: raw.to_string(),
                });
            }

            if let Some(modifier) = Modifier::from_token(&token) {
                modifiers.insert(modifier);
                continue;
            }

            let code = key_code(&token).ok_or_else(|| KeybindError::UnknownKey {
                input: trimmed.to_string(),
                key: token.clone(),
            })?;

            if let Some((first, _)) = &key {
                return Err(KeybindError::MultipleKeys {
                    input: trimmed.to_string(),
                    first: first.clone(),
                    second: token,
                });
            }
            key = Some((token, code));
        }

        match key {
            Some((_, code)) => Ok(Self { modifiers, code }),
            None => Err(KeybindError::ModifiersOnly(trimmed.to_string())),
        }
    }

    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    /// Key code name, e.g. `KeyA`, `F9`, `Numpad5`.
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for Keybind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.as_str())?;
        }
        f.write_str(&self.code)
    }
}

impl std::str::FromStr for Keybind {
    type Err = KeybindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Keybind::parse(s)
    }
}

/// Split on `+`, keeping a literal `+` key (`ctrl++`, `numpad_+`) intact.
fn split_tokens(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let bytes = input.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'+' && i > start && !ends_with_numpad_prefix(&input[start..i]) {
            tokens.push(&input[start..i]);
            start = i + 1;
        }
    }
    if start < input.len() {
        tokens.push(&input[start..]);
    }
    tokens
}

/// `numpad_` waiting for its key: the next `+` is the key, not a separator.
fn ends_with_numpad_prefix(token: &str) -> bool {
    token
        .trim()
        .trim_start_matches('<')
        .to_ascii_lowercase()
        .ends_with("numpad_")
}

fn key_code(token: &str) -> Option<String> {
    if token.chars().count() == 1 {
        let c = token.chars().next()?;
        return match c {
            'a'..='z' => Some(format!("Key{}", c.to_ascii_uppercase())),
            '0'..='9' => Some(format!("Digit{}", c)),
            '-' => Some("Minus".to_string()),
            '=' => Some("Equal".to_string()),
            '+' => Some("Equal".to_string()),
            ',' => Some("Comma".to_string()),
            '.' => Some("Period".to_string()),
            '/' => Some("Slash".to_string()),
            ';' => Some("Semicolon".to_string()),
            '\'' => Some("Quote".to_string()),
            '[' => Some("BracketLeft".to_string()),
            ']' => Some("BracketRight".to_string()),
            '`' => Some("Backquote".to_string()),
            '\\' => Some("Backslash".to_string()),
            _ => None,
        };
    }

    if let Some(rest) = token.strip_prefix("numpad_") {
        return match rest {
            "plus" | "+" | "add" => Some("NumpadAdd".to_string()),
            "-" | "minus" | "subtract" => Some("NumpadSubtract".to_string()),
            "*" | "multiply" => Some("NumpadMultiply".to_string()),
            "/" | "divide" => Some("NumpadDivide".to_string()),
            "." | "decimal" => Some("NumpadDecimal".to_string()),
            "enter" => Some("NumpadEnter".to_string()),
            d if d.len() == 1 && d.as_bytes()[0].is_ascii_digit() => Some(format!("Numpad{}", d)),
            _ => None,
        };
    }

    if let Some(n) = token.strip_prefix('f') {
        if let Ok(n) = n.parse::<u8>() {
            return (1..=24).contains(&n).then(|| format!("F{}", n));
        }
    }

    let named = match token {
        "space" => "Space",
        "tab" => "Tab",
        "enter" | "return" => "Enter",
        "backspace" => "Backspace",
        "pause" => "Pause",
        "insert" => "Insert",
        "delete" => "Delete",
        "home" => "Home",
        "end" => "End",
        "page_up" | "pageup" => "PageUp",
        "page_down" | "pagedown" => "PageDown",
        "up" => "ArrowUp",
        "down" => "ArrowDown",
        "left" => "ArrowLeft",
        "right" => "ArrowRight",
        "print_screen" | "printscreen" => "PrintScreen",
        "scroll_lock" | "scrolllock" => "ScrollLock",
        "num_lock" | "numlock" => "NumLock",
        "caps_lock" | "capslock" => "CapsLock",
        _ => return None,
    };
    Some(named.to_string())
}
