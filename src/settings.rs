use serde::{Deserialize, Serialize};

/// The persisted key combination: four modifier flags plus one key.
///
/// The key is always stored upper-cased. `matches` upper-cases the incoming
/// key the same way, so comparison is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDefinition {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    pub key: String,
}

impl Default for ShortcutDefinition {
    fn default() -> Self {
        // Exactly one of {meta, ctrl} is set, chosen by platform family.
        let on_mac = cfg!(target_os = "macos");

        Self {
            ctrl: !on_mac,
            shift: true,
            alt: false,
            meta: on_mac,
            key: "Z".to_string(),
        }
    }
}

impl ShortcutDefinition {
    pub fn from_key_press(press: &KeyPress) -> Self {
        Self {
            ctrl: press.ctrl,
            shift: press.shift,
            alt: press.alt,
            meta: press.meta,
            key: press.key.to_uppercase(),
        }
    }

    /// All four modifier flags equal and the upper-cased keys equal.
    pub fn matches(&self, press: &KeyPress) -> bool {
        self.ctrl == press.ctrl
            && self.shift == press.shift
            && self.alt == press.alt
            && self.meta == press.meta
            && self.key == press.key.to_uppercase()
    }

    /// Human-readable form, e.g. `Ctrl + Shift + Z` or `⌘ Command + ⇧ Shift + Z`.
    pub fn display(&self) -> String {
        let on_mac = cfg!(target_os = "macos");
        let mut parts: Vec<&str> = Vec::new();

        if self.meta {
            parts.push(if on_mac { "⌘ Command" } else { "Win" });
        }
        if self.ctrl {
            parts.push(if on_mac { "⌃ Control" } else { "Ctrl" });
        }
        if self.alt {
            parts.push(if on_mac { "⌥ Option" } else { "Alt" });
        }
        if self.shift {
            parts.push(if on_mac { "⇧ Shift" } else { "Shift" });
        }
        parts.push(&self.key);

        parts.join(" + ")
    }
}

/// A keydown event as reported by the webview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPress {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    pub key: String,
}

impl KeyPress {
    /// True when the pressed key is itself a modifier, with no other key.
    pub fn is_bare_modifier(&self) -> bool {
        matches!(self.key.as_str(), "Control" | "Shift" | "Alt" | "Meta")
    }
}
