use crate::settings::{KeyPress, ShortcutDefinition};

/// Capture dialog lifecycle: `Closed -> AwaitingInput -> Captured -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    AwaitingInput,
    Captured,
}

/// The shortcut-capture dialog, modeled as a plain state machine.
///
/// The webview only renders this state and forwards events; every transition
/// rule lives here. A staged definition is never written anywhere until
/// `commit` hands it back to the caller.
#[derive(Debug)]
pub struct CaptureDialog {
    state: DialogState,
    active: ShortcutDefinition,
    staged: Option<ShortcutDefinition>,
}

impl CaptureDialog {
    pub fn new() -> Self {
        Self {
            state: DialogState::Closed,
            active: ShortcutDefinition::default(),
            staged: None,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != DialogState::Closed
    }

    /// Save is disabled until a first capture has been staged.
    pub fn can_save(&self) -> bool {
        self.state == DialogState::Captured
    }

    /// The definition the dialog should display: the staged one once a key
    /// has been captured, the currently active one before that.
    pub fn preview(&self) -> &ShortcutDefinition {
        self.staged.as_ref().unwrap_or(&self.active)
    }

    /// Opens the dialog showing `active`, ready to capture the next keydown.
    pub fn open(&mut self, active: ShortcutDefinition) {
        self.active = active;
        self.staged = None;
        self.state = DialogState::AwaitingInput;
    }

    /// Feeds one keydown into the dialog. Returns true when the press was
    /// staged as the new candidate shortcut.
    ///
    /// Bare modifier presses are ignored and leave the state unchanged, as
    /// does any keydown while the dialog is closed. A later press replaces
    /// an earlier staged candidate.
    pub fn observe_key(&mut self, press: &KeyPress) -> bool {
        if self.state == DialogState::Closed || press.is_bare_modifier() {
            return false;
        }

        self.staged = Some(ShortcutDefinition::from_key_press(press));
        self.state = DialogState::Captured;
        true
    }

    /// Commits the staged definition, closing the dialog. Returns `None`
    /// (and stays put) unless a capture has been staged.
    pub fn commit(&mut self) -> Option<ShortcutDefinition> {
        if self.state != DialogState::Captured {
            return None;
        }

        let staged = self.staged.take();
        self.state = DialogState::Closed;
        staged
    }

    /// Closes the dialog, discarding any staged definition.
    pub fn cancel(&mut self) {
        self.staged = None;
        self.state = DialogState::Closed;
    }

    /// Closes the dialog and hands back the platform default for the caller
    /// to persist. Discards any staged definition.
    pub fn reset_to_default(&mut self) -> ShortcutDefinition {
        self.staged = None;
        self.active = ShortcutDefinition::default();
        self.state = DialogState::Closed;
        self.active.clone()
    }
}

impl Default for CaptureDialog {
    fn default() -> Self {
        Self::new()
    }
}
