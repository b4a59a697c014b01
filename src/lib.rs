mod capture;
mod clipboard;
mod commands;
mod events;
mod markdown;
mod settings;
mod storage;

use std::sync::{Arc, Mutex, RwLock};

use anyhow::Context;
use tauri::image::Image;
use tauri::menu::{Menu, MenuEvent, MenuItem};
use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::Manager;
use tauri_plugin_global_shortcut::{GlobalShortcutExt, ShortcutState};
use tracing::{info, warn};

use crate::capture::CaptureDialog;
use crate::settings::ShortcutDefinition;
use crate::storage::Storage;

pub struct SharedState {
    pub storage: Mutex<Storage>,
    pub shortcut: RwLock<ShortcutDefinition>,
    pub dialog: Mutex<CaptureDialog>,
}

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linkmark=info".parse().unwrap()),
        )
        .init();

    tauri::Builder::default()
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, _shortcut, event| {
                    if event.state() == ShortcutState::Pressed {
                        commands::trigger_copy(app);
                    }
                })
                .build(),
        )
        .setup(|app| {
            let app_dir = app
                .path()
                .app_data_dir()
                .context("failed to resolve app data dir")?;
            std::fs::create_dir_all(&app_dir)?;

            let db_path = app_dir.join("linkmark.db");
            let storage = Storage::open(&db_path)?;
            let shortcut = storage.load_shortcut()?;
            info!(shortcut = %shortcut.display(), "loaded active shortcut");

            let state = Arc::new(SharedState {
                storage: Mutex::new(storage),
                shortcut: RwLock::new(shortcut.clone()),
                dialog: Mutex::new(CaptureDialog::new()),
            });

            app.manage(state);
            setup_tray(app.handle())?;
            register_global_shortcut(app.handle(), &shortcut)?;

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_shortcut,
            commands::open_capture_dialog,
            commands::capture_key,
            commands::commit_capture,
            commands::cancel_capture,
            commands::reset_shortcut,
            commands::match_keydown,
            commands::copy_markdown_link,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// Registers `def` as the OS-global shortcut, replacing whatever was
/// registered before. Definitions whose key has no registerable keycode are
/// skipped; the in-window listener still handles them.
pub fn register_global_shortcut(
    app: &tauri::AppHandle,
    def: &ShortcutDefinition,
) -> anyhow::Result<()> {
    let manager = app.global_shortcut();
    let _ = manager.unregister_all();

    let Some(shortcut) = commands::shortcut_from_definition(def) else {
        warn!(key = %def.key, "key has no OS keycode, global registration skipped");
        return Ok(());
    };

    manager.register(shortcut)?;
    Ok(())
}

fn setup_tray(app: &tauri::AppHandle) -> anyhow::Result<()> {
    let copy_item = MenuItem::with_id(app, "copy_link", "Copy Page as Markdown", true, None::<&str>)?;
    let shortcut_item = MenuItem::with_id(app, "set_shortcut", "Set Shortcut…", true, None::<&str>)?;
    let quit_item = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;
    let menu = Menu::with_items(app, &[&copy_item, &shortcut_item, &quit_item])?;

    let mut tray_builder = TrayIconBuilder::new()
        .icon(tray_icon_image())
        .menu(&menu)
        .on_menu_event(|app, event: MenuEvent| match event.id().as_ref() {
            "copy_link" => {
                commands::trigger_copy(app);
            }
            "set_shortcut" => {
                if let Err(err) = commands::open_capture(app) {
                    warn!(%err, "failed to open capture dialog");
                }
            }
            "quit" => {
                app.exit(0);
            }
            _ => {}
        })
        .on_tray_icon_event(|tray: &tauri::tray::TrayIcon, event: TrayIconEvent| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                let app = tray.app_handle();
                commands::show_main_window(&app);
            }
        });

    #[cfg(target_os = "macos")]
    {
        tray_builder = tray_builder.icon_as_template(true);
    }

    let tray = tray_builder.build(app)?;

    // Keep tray alive for whole process lifetime.
    Box::leak(Box::new(tray));

    Ok(())
}

fn tray_icon_image() -> Image<'static> {
    const W: usize = 18;
    const H: usize = 18;
    let mut rgba = vec![0u8; W * H * 4];

    // Two square brackets, the Markdown link glyph.
    for y in 0..H {
        for x in 0..W {
            let i = (y * W + x) * 4;
            let left = x == 3 || (y == 3 || y == 14) && x < 7;
            let right = x == 14 || (y == 3 || y == 14) && x > 10;
            if (left || right) && (3..=14).contains(&y) {
                rgba[i] = 0;
                rgba[i + 1] = 0;
                rgba[i + 2] = 0;
                rgba[i + 3] = 255;
            }
        }
    }

    Image::new_owned(rgba, W as u32, H as u32)
}
