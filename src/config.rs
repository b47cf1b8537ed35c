//! Configuration management for inlay
//!
//! Handles loading and saving user preferences: output formats, blob and
//! render budgets, figure defaults and the window size.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::blob::DEFAULT_SIZE_LIMIT;
use crate::display::DEFAULT_KEY;
use crate::render::RenderContext;
use crate::window::{FigureSize, WindowSize};

/// Environment variable holding a window-size string
pub const WINDOW_SIZE_ENV: &str = "INLAY_WINDOW_SIZE";

/// inlay configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Byte budget for a single embedded image
    pub size_limit: usize,

    /// Format for draws and direct displays ("png", "svg", "jpeg", ...)
    pub format: String,

    /// Format for explicit shows
    pub show_format: String,

    /// Replace key shared by successive figures
    pub replace_key: String,

    /// Default figure size in inches
    pub figsize: [f64; 2],

    pub dpi: f64,

    /// Render budget for the display hook
    pub depth: usize,
    pub max_items: usize,
    pub max_entries: usize,
    pub max_string: usize,

    /// Window size as `<cols>x<rows>;<width>x<height>`
    /// If not set, asks the terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_size: Option<String>,

    /// Whether the display hook starts enabled
    pub notebook: bool,
}

impl Default for Config {
    fn default() -> Self {
        let ctx = RenderContext::default();
        let figsize = FigureSize::default();
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
            format: "png".to_string(),
            show_format: "svg".to_string(),
            replace_key: DEFAULT_KEY.to_string(),
            figsize: [figsize.width, figsize.height],
            dpi: 100.0,
            depth: ctx.depth,
            max_items: ctx.max_items,
            max_entries: ctx.max_entries,
            max_string: ctx.max_string,
            window_size: None,
            notebook: true,
        }
    }
}

impl Config {
    /// Get config directory path (~/.inlay)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".inlay"))
    }

    /// Get config file path (~/.inlay/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }

        let contents = self.to_toml()?;

        // Atomic write: write to temp file then rename
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &contents)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to rename config file to {}", path.display()))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Render budget built from the configured limits
    pub fn render_context(&self) -> RenderContext {
        RenderContext {
            depth: self.depth,
            max_items: self.max_items,
            max_entries: self.max_entries,
            max_string: self.max_string,
        }
    }

    pub fn figure_size(&self) -> FigureSize {
        FigureSize::new(self.figsize[0], self.figsize[1])
    }

    /// Resolve the window size from explicit arg, env var, config file, or
    /// the terminal itself
    pub fn resolve_window_size(&self, explicit: Option<&str>) -> Option<String> {
        if let Some(size) = explicit {
            return Some(size.to_string());
        }

        if let Ok(size) = env::var(WINDOW_SIZE_ENV) {
            if !size.trim().is_empty() {
                return Some(size);
            }
        }

        if let Some(size) = &self.window_size {
            return Some(size.clone());
        }

        WindowSize::detect()
    }
}
