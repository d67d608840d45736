use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which keys map onto the 3x3 grid
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyLayout {
    /// 7 8 9 / 4 5 6 / 1 2 3, laid out like a numeric keypad
    #[default]
    Numpad,
    /// q w e / a s d / z x c
    Qwerty,
}

impl KeyLayout {
    /// Keys for cells 0..9, row-major from the top left
    pub fn keys(self) -> [char; 9] {
        match self {
            KeyLayout::Numpad => ['7', '8', '9', '4', '5', '6', '1', '2', '3'],
            KeyLayout::Qwerty => ['q', 'w', 'e', 'a', 's', 'd', 'z', 'x', 'c'],
        }
    }

    pub fn cell_for(self, key: char) -> Option<usize> {
        let key = key.to_ascii_lowercase();
        self.keys().iter().position(|&k| k == key)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub key_layout: KeyLayout,
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "reflex") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("reflex_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
        assert_eq!(store.load().key_layout, KeyLayout::Numpad);
    }

    #[test]
    fn save_and_load_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            key_layout: KeyLayout::Qwerty,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"qwerty\""));
    }

    #[test]
    fn garbage_config_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn numpad_keys_mirror_keypad() {
        let layout = KeyLayout::Numpad;
        assert_eq!(layout.cell_for('7'), Some(0));
        assert_eq!(layout.cell_for('5'), Some(4));
        assert_eq!(layout.cell_for('3'), Some(8));
        assert_eq!(layout.cell_for('0'), None);
    }

    #[test]
    fn qwerty_keys_ignore_case() {
        let layout = KeyLayout::Qwerty;
        assert_eq!(layout.cell_for('q'), Some(0));
        assert_eq!(layout.cell_for('D'), Some(5));
        assert_eq!(layout.cell_for('c'), Some(8));
        assert_eq!(layout.cell_for('m'), None);
    }

    #[test]
    fn layout_display_matches_cli_value() {
        assert_eq!(KeyLayout::Qwerty.to_string(), "qwerty");
        assert_eq!(KeyLayout::Numpad.to_string(), "numpad");
    }
}
