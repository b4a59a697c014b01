use serde::Serialize;

/// Capture dialog state pushed to the webview on open and after each
/// observed keydown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStateEvent {
    pub preview: String,
    pub can_save: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutChangedEvent {
    pub display: String,
}

/// Transient confirmation toast; the view clears it after one second.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub message: String,
}
