use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager, State};
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut};
use tracing::{info, warn};

use crate::clipboard::set_clipboard_text;
use crate::events::{CaptureStateEvent, NotificationEvent, ShortcutChangedEvent};
use crate::markdown::markdown_link;
use crate::settings::{KeyPress, ShortcutDefinition};
use crate::SharedState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutView {
    pub definition: ShortcutDefinition,
    pub display: String,
}

#[tauri::command]
pub fn get_shortcut(state: State<'_, Arc<SharedState>>) -> Result<ShortcutView, String> {
    let def = state.shortcut.read().map_err(err_to_string)?.clone();
    Ok(ShortcutView {
        display: def.display(),
        definition: def,
    })
}

#[tauri::command]
pub fn open_capture_dialog(app: AppHandle) -> Result<(), String> {
    open_capture(&app).map_err(err_to_string)
}

/// Feeds one keydown from the webview into the capture dialog and pushes the
/// refreshed dialog state back out.
#[tauri::command]
pub fn capture_key(
    app: AppHandle,
    state: State<'_, Arc<SharedState>>,
    press: KeyPress,
) -> Result<CaptureStateEvent, String> {
    let event = {
        let mut dialog = state.dialog.lock().map_err(err_to_string)?;
        dialog.observe_key(&press);
        CaptureStateEvent {
            preview: dialog.preview().display(),
            can_save: dialog.can_save(),
        }
    };

    app.emit("capture:state", event.clone())
        .map_err(err_to_string)?;
    Ok(event)
}

/// Save action. A no-op unless a capture has been staged, matching the
/// disabled save button in the view.
#[tauri::command]
pub fn commit_capture(app: AppHandle, state: State<'_, Arc<SharedState>>) -> Result<(), String> {
    let staged = state.dialog.lock().map_err(err_to_string)?.commit();
    let Some(def) = staged else {
        return Ok(());
    };

    apply_shortcut(&app, &state, def, "Shortcut saved!").map_err(err_to_string)
}

#[tauri::command]
pub fn cancel_capture(app: AppHandle, state: State<'_, Arc<SharedState>>) -> Result<(), String> {
    state.dialog.lock().map_err(err_to_string)?.cancel();
    app.emit("capture:closed", serde_json::json!({}))
        .map_err(err_to_string)
}

#[tauri::command]
pub fn reset_shortcut(app: AppHandle, state: State<'_, Arc<SharedState>>) -> Result<(), String> {
    let def = state.dialog.lock().map_err(err_to_string)?.reset_to_default();
    apply_shortcut(&app, &state, def, "Shortcut reset to default!").map_err(err_to_string)
}

/// In-window arm of the shortcut listener: compares a keydown against the
/// active definition and runs the copy action on a match. Returns whether the
/// view should suppress the event's default behavior.
#[tauri::command]
pub fn match_keydown(
    app: AppHandle,
    state: State<'_, Arc<SharedState>>,
    press: KeyPress,
) -> Result<bool, String> {
    // While the dialog is open its capturing listener owns every keydown.
    if state.dialog.lock().map_err(err_to_string)?.is_open() {
        return Ok(false);
    }

    let def = state.shortcut.read().map_err(err_to_string)?.clone();
    let matched = def.matches(&press);
    if matched {
        // A combo registered system-wide is handled (and swallowed) by the OS
        // before the webview sees it; reaching here with a registered combo
        // would run the copy twice.
        let os_registered = shortcut_from_definition(&def)
            .map(|s| app.global_shortcut().is_registered(s))
            .unwrap_or(false);
        if !os_registered {
            trigger_copy(&app);
        }
    }
    Ok(matched)
}

#[tauri::command]
pub fn copy_markdown_link(app: AppHandle) -> Result<(), String> {
    copy_page_link(&app).map_err(err_to_string)
}

pub fn open_capture(app: &AppHandle) -> anyhow::Result<()> {
    let state = app.state::<Arc<SharedState>>();

    let event = {
        let active = state
            .shortcut
            .read()
            .map_err(|_| anyhow::anyhow!("shortcut lock poisoned"))?
            .clone();
        let mut dialog = state
            .dialog
            .lock()
            .map_err(|_| anyhow::anyhow!("dialog lock poisoned"))?;
        dialog.open(active);
        CaptureStateEvent {
            preview: dialog.preview().display(),
            can_save: dialog.can_save(),
        }
    };

    show_main_window(app);
    app.emit("capture:opened", event)?;
    Ok(())
}

/// The copy action: reads the page title and URL at call time, formats the
/// Markdown link and writes it to the system clipboard.
pub fn copy_page_link(app: &AppHandle) -> anyhow::Result<()> {
    let window = app
        .webview_windows()
        .into_values()
        .find(|w| w.is_focused().unwrap_or(false))
        .or_else(|| app.get_webview_window("main"))
        .context("no webview window available")?;

    let title = window.title().context("failed to read window title")?;
    let url = window.url().context("failed to read window url")?;

    let link = markdown_link(&title, url.as_str());
    set_clipboard_text(&link)?;

    info!(%url, "copied markdown link to clipboard");
    notify(app, "Copied Markdown link to clipboard!");
    Ok(())
}

/// Fire-and-forget wrapper used by the tray item and the OS-global shortcut.
pub fn trigger_copy(app: &AppHandle) {
    if let Err(err) = copy_page_link(app) {
        warn!(%err, "markdown copy action failed");
    }
}

pub fn show_main_window(app: &AppHandle) {
    if let Some(window) = app.get_webview_window("main") {
        let _ = window.show();
        let _ = window.set_focus();
    }
}

pub fn notify(app: &AppHandle, message: &str) {
    let _ = app.emit(
        "app:notify",
        NotificationEvent {
            message: message.to_string(),
        },
    );
}

fn apply_shortcut(
    app: &AppHandle,
    state: &SharedState,
    def: ShortcutDefinition,
    message: &str,
) -> anyhow::Result<()> {
    {
        let storage = state
            .storage
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        storage.save_shortcut(&def)?;
    }

    // The in-memory value the listener consults updates synchronously with
    // the save, so the change applies to the very next keydown.
    {
        let mut active = state
            .shortcut
            .write()
            .map_err(|_| anyhow::anyhow!("shortcut lock poisoned"))?;
        *active = def.clone();
    }

    crate::register_global_shortcut(app, &def)?;

    info!(shortcut = %def.display(), "active shortcut updated");
    let _ = app.emit("capture:closed", serde_json::json!({}));
    let _ = app.emit(
        "shortcut:changed",
        ShortcutChangedEvent {
            display: def.display(),
        },
    );
    notify(app, message);
    Ok(())
}

/// Builds the OS-registerable form of a definition. `None` when the stored
/// key has no keycode we can register; the in-window listener still matches
/// such definitions.
pub fn shortcut_from_definition(def: &ShortcutDefinition) -> Option<Shortcut> {
    let mut mods = Modifiers::empty();
    if def.ctrl {
        mods |= Modifiers::CONTROL;
    }
    if def.shift {
        mods |= Modifiers::SHIFT;
    }
    if def.alt {
        mods |= Modifiers::ALT;
    }
    if def.meta {
        mods |= Modifiers::SUPER;
    }

    key_code_from_token(&def.key.to_lowercase()).map(|code| Shortcut::new(Some(mods), code))
}

fn err_to_string<E: std::fmt::Display>(e: E) -> String {
    e.to_string()
}

fn key_code_from_token(token: &str) -> Option<Code> {
    match token {
        "a" => Some(Code::KeyA),
        "b" => Some(Code::KeyB),
        "c" => Some(Code::KeyC),
        "d" => Some(Code::KeyD),
        "e" => Some(Code::KeyE),
        "f" => Some(Code::KeyF),
        "g" => Some(Code::KeyG),
        "h" => Some(Code::KeyH),
        "i" => Some(Code::KeyI),
        "j" => Some(Code::KeyJ),
        "k" => Some(Code::KeyK),
        "l" => Some(Code::KeyL),
        "m" => Some(Code::KeyM),
        "n" => Some(Code::KeyN),
        "o" => Some(Code::KeyO),
        "p" => Some(Code::KeyP),
        "q" => Some(Code::KeyQ),
        "r" => Some(Code::KeyR),
        "s" => Some(Code::KeyS),
        "t" => Some(Code::KeyT),
        "u" => Some(Code::KeyU),
        "v" => Some(Code::KeyV),
        "w" => Some(Code::KeyW),
        "x" => Some(Code::KeyX),
        "y" => Some(Code::KeyY),
        "z" => Some(Code::KeyZ),
        "0" => Some(Code::Digit0),
        "1" => Some(Code::Digit1),
        "2" => Some(Code::Digit2),
        "3" => Some(Code::Digit3),
        "4" => Some(Code::Digit4),
        "5" => Some(Code::Digit5),
        "6" => Some(Code::Digit6),
        "7" => Some(Code::Digit7),
        "8" => Some(Code::Digit8),
        "9" => Some(Code::Digit9),
        "f1" => Some(Code::F1),
        "f2" => Some(Code::F2),
        "f3" => Some(Code::F3),
        "f4" => Some(Code::F4),
        "f5" => Some(Code::F5),
        "f6" => Some(Code::F6),
        "f7" => Some(Code::F7),
        "f8" => Some(Code::F8),
        "f9" => Some(Code::F9),
        "f10" => Some(Code::F10),
        "f11" => Some(Code::F11),
        "f12" => Some(Code::F12),
        "escape" => Some(Code::Escape),
        "enter" => Some(Code::Enter),
        "tab" => Some(Code::Tab),
        " " | "space" => Some(Code::Space),
        "backspace" => Some(Code::Backspace),
        "delete" => Some(Code::Delete),
        "home" => Some(Code::Home),
        "end" => Some(Code::End),
        "pageup" => Some(Code::PageUp),
        "pagedown" => Some(Code::PageDown),
        "arrowup" => Some(Code::ArrowUp),
        "arrowdown" => Some(Code::ArrowDown),
        "arrowleft" => Some(Code::ArrowLeft),
        "arrowright" => Some(Code::ArrowRight),
        "," => Some(Code::Comma),
        "." => Some(Code::Period),
        "/" => Some(Code::Slash),
        ";" => Some(Code::Semicolon),
        "'" => Some(Code::Quote),
        "[" => Some(Code::BracketLeft),
        "]" => Some(Code::BracketRight),
        "-" => Some(Code::Minus),
        "=" => Some(Code::Equal),
        "\\" => Some(Code::Backslash),
        "`" => Some(Code::Backquote),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::shortcut_from_definition;
    use crate::settings::ShortcutDefinition;
    use tauri_plugin_global_shortcut::{Code, Modifiers};

    fn def(ctrl: bool, shift: bool, alt: bool, meta: bool, key: &str) -> ShortcutDefinition {
        ShortcutDefinition {
            ctrl,
            shift,
            alt,
            meta,
            key: key.to_string(),
        }
    }

    #[test]
    fn letter_shortcut_maps_modifiers_and_keycode() {
        let s = shortcut_from_definition(&def(true, true, false, false, "Z")).expect("shortcut");
        assert_eq!(s.key, Code::KeyZ);
        assert!(s.mods.contains(Modifiers::CONTROL));
        assert!(s.mods.contains(Modifiers::SHIFT));
        assert!(!s.mods.contains(Modifiers::ALT));
        assert!(!s.mods.contains(Modifiers::SUPER));
    }

    #[test]
    fn meta_maps_to_super() {
        let s = shortcut_from_definition(&def(false, false, false, true, "K")).expect("shortcut");
        assert!(s.mods.contains(Modifiers::SUPER));
    }

    #[test]
    fn named_keys_have_keycodes() {
        for key in ["ESCAPE", "F5", "ARROWUP", "ENTER"] {
            assert!(
                shortcut_from_definition(&def(true, false, false, false, key)).is_some(),
                "expected keycode for {key}"
            );
        }
    }

    #[test]
    fn unknown_key_yields_no_registration() {
        assert!(shortcut_from_definition(&def(true, false, false, false, "AUDIOVOLUMEUP")).is_none());
    }
}
