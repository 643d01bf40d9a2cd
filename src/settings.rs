use std::path::{Path, PathBuf};

use crate::canvas::validate_scale;
use crate::components::colors::{DEFAULT_ON_COLOR, is_valid_color};
use crate::components::history::MAX_HISTORY_DEPTH;
use crate::components::tools::{DEFAULT_BRUSH_SIZE, Tool};

const SETTINGS_FILE: &str = "maskfe_settings.cfg";

/// Editor preferences that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Brush width in buffer pixels
    pub brush_size: u32,
    /// `#RRGGBB` color mask pixels are shown in
    pub on_color: String,
    /// Display zoom (any positive value)
    pub scale: f32,
    pub tool: Tool,
    pub max_undo_steps: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            on_color: DEFAULT_ON_COLOR.to_string(),
            scale: 1.0,
            tool: Tool::Draw,
            max_undo_steps: MAX_HISTORY_DEPTH,
        }
    }
}

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/maskfe/maskfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\MaskFE\maskfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/MaskFE/maskfe_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("maskfe");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_default();
            let config_dir = PathBuf::from(appdata).join("MaskFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("MaskFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join(SETTINGS_FILE)))
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "brush_size={}\n\
             on_color={}\n\
             scale={}\n\
             tool={}\n\
             max_undo_steps={}\n",
            self.brush_size,
            self.on_color,
            self.scale,
            self.tool.name(),
            self.max_undo_steps,
        )
    }

    /// Parse `key=value` lines.  Unknown keys are skipped; a value that does
    /// not parse (or is out of range) keeps the default for that key.
    pub fn from_config_string(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "brush_size" => {
                    if let Ok(v) = val.parse::<u32>()
                        && v > 0
                    {
                        s.brush_size = v;
                    }
                }
                "on_color" => {
                    if is_valid_color(val) {
                        s.on_color = val.to_lowercase();
                    }
                }
                "scale" => {
                    if let Ok(v) = val.parse::<f32>()
                        && validate_scale(v).is_ok()
                    {
                        s.scale = v;
                    }
                }
                "tool" => {
                    if let Some(t) = Tool::from_name(val) {
                        s.tool = t;
                    }
                }
                "max_undo_steps" => {
                    if let Ok(v) = val.parse::<usize>()
                        && v > 0
                    {
                        s.max_undo_steps = v;
                    }
                }
                _ => {}
            }
        }
        s
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config_string(&content),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk.  Failures are logged, never returned.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        self.save_to(&path);
    }

    pub fn save_to(&self, path: &Path) {
        if let Err(e) = std::fs::write(path, self.to_config_string()) {
            crate::log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }
}
