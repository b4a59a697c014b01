use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::settings::ShortcutDefinition;

/// Settings-table key the shortcut definition is persisted under.
const SHORTCUT_KEY: &str = "markdown_shortcut";

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("failed to create db parent directory")?;
        }

        let conn = Connection::open(path).context("failed to open sqlite db")?;
        let storage = Self { conn };
        storage.run_migrations()?;
        Ok(storage)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(include_str!("migrations/001_init.sql"))
            .context("failed to run migrations")?;
        Ok(())
    }

    /// Returns the persisted shortcut, or the platform default when nothing
    /// has been saved yet. Absence of prior state is not an error; a value
    /// that no longer deserializes is logged and treated the same way.
    pub fn load_shortcut(&self) -> Result<ShortcutDefinition> {
        let row: Option<String> = self
            .conn
            .query_row(
                "SELECT value_json FROM settings WHERE key = ?1",
                params![SHORTCUT_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query shortcut setting")?;

        let Some(value_json) = row else {
            return Ok(ShortcutDefinition::default());
        };

        match serde_json::from_str(&value_json) {
            Ok(def) => Ok(def),
            Err(err) => {
                warn!(%err, "stored shortcut is unreadable, falling back to default");
                Ok(ShortcutDefinition::default())
            }
        }
    }

    /// Persists `def` as the active shortcut, replacing any prior value.
    pub fn save_shortcut(&self, def: &ShortcutDefinition) -> Result<()> {
        let value_json = serde_json::to_string(def).context("failed to serialize shortcut")?;
        self.conn.execute(
            "INSERT INTO settings(key, value_json) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
            params![SHORTCUT_KEY, value_json],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Storage;
    use crate::capture::CaptureDialog;
    use crate::settings::{KeyPress, ShortcutDefinition};

    fn temp_storage() -> (Storage, std::path::PathBuf) {
        let db_path = std::env::temp_dir().join(format!(
            "linkmark-test-{}.db",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        (Storage::open(&db_path).expect("open db"), db_path)
    }

    #[test]
    fn load_without_prior_state_returns_default() {
        let (storage, db_path) = temp_storage();

        let def = storage.load_shortcut().expect("load");
        assert_eq!(def, ShortcutDefinition::default());

        let _ = std::fs::remove_file(db_path);
    }

    #[test]
    fn save_then_load_round_trips_all_fields() {
        let (storage, db_path) = temp_storage();

        let def = ShortcutDefinition {
            ctrl: false,
            shift: true,
            alt: true,
            meta: true,
            key: "K".to_string(),
        };
        storage.save_shortcut(&def).expect("save");

        assert_eq!(storage.load_shortcut().expect("load"), def);

        let _ = std::fs::remove_file(db_path);
    }

    #[test]
    fn save_replaces_the_prior_value() {
        let (storage, db_path) = temp_storage();

        let first = ShortcutDefinition {
            ctrl: true,
            shift: false,
            alt: false,
            meta: false,
            key: "A".to_string(),
        };
        let second = ShortcutDefinition {
            ctrl: false,
            shift: false,
            alt: false,
            meta: true,
            key: "B".to_string(),
        };

        storage.save_shortcut(&first).expect("save first");
        storage.save_shortcut(&second).expect("save second");

        assert_eq!(storage.load_shortcut().expect("load"), second);

        let _ = std::fs::remove_file(db_path);
    }

    #[test]
    fn cancelled_capture_never_reaches_storage() {
        let (storage, db_path) = temp_storage();

        let saved = ShortcutDefinition {
            ctrl: true,
            shift: true,
            alt: false,
            meta: false,
            key: "Z".to_string(),
        };
        storage.save_shortcut(&saved).expect("save");

        let mut dialog = CaptureDialog::new();
        dialog.open(storage.load_shortcut().expect("load"));
        dialog.observe_key(&KeyPress {
            ctrl: true,
            shift: false,
            alt: true,
            meta: false,
            key: "q".to_string(),
        });
        dialog.cancel();

        assert_eq!(storage.load_shortcut().expect("reload"), saved);

        let _ = std::fs::remove_file(db_path);
    }

    #[test]
    fn saving_default_twice_is_idempotent() {
        let (storage, db_path) = temp_storage();

        let default = ShortcutDefinition::default();
        storage.save_shortcut(&default).expect("first reset");
        let once = storage.load_shortcut().expect("load once");
        storage.save_shortcut(&default).expect("second reset");
        let twice = storage.load_shortcut().expect("load twice");

        assert_eq!(once, twice);
        assert_eq!(twice, default);

        let _ = std::fs::remove_file(db_path);
    }
}
