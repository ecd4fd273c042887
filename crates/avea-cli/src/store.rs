//! Preset and device-address persistence.
//!
//! The store keeps two plain files under one base directory (`~/.avea` by
//! default): a JSON table of named color presets and a newline-separated
//! list of lamp addresses seen in earlier runs. Both files are created on
//! first use, and the preset file is seeded with the default palette.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use avea_types::{Color, DeviceAddress};

/// Directory under the home directory holding both store files.
const STORE_DIR: &str = ".avea";
/// Preset file name.
const COLORS_FILE: &str = "avea-colors.json";
/// Known-address file name.
const UUIDS_FILE: &str = "avea-uuids.txt";

/// A named color preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPreset {
    /// Name the preset is looked up by.
    pub title: String,
    /// The stored channel values.
    #[serde(flatten)]
    pub color: Color,
}

/// On-disk layout of the preset file.
#[derive(Debug, Serialize, Deserialize)]
struct PresetFile {
    colors: Vec<ColorPreset>,
}

/// File-backed store rooted at one base directory.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open the store under `~/.avea`, creating and seeding it if missing.
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine the home directory")?;
        Self::open(home.join(STORE_DIR))
    }

    /// Open a store rooted at the given directory, creating and seeding it
    /// if missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { dir: dir.into() };
        store.ensure_layout()?;
        Ok(store)
    }

    /// Create the directory and seed both files where they do not exist.
    fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create store directory: {}", self.dir.display())
        })?;
        if !self.colors_path().exists() {
            info!(path = %self.colors_path().display(), "seeding default color presets");
            self.write_presets(&default_presets())?;
        }
        let uuids = self.uuids_path();
        if !uuids.exists() {
            fs::write(&uuids, "").with_context(|| format!("failed to create {}", uuids.display()))?;
        }
        Ok(())
    }

    fn colors_path(&self) -> PathBuf {
        self.dir.join(COLORS_FILE)
    }

    fn uuids_path(&self) -> PathBuf {
        self.dir.join(UUIDS_FILE)
    }

    /// All stored presets, in file order.
    pub fn presets(&self) -> Result<Vec<ColorPreset>> {
        let path = self.colors_path();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file: PresetFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(file.colors)
    }

    /// Look up one preset by name.
    pub fn preset(&self, title: &str) -> Result<ColorPreset> {
        self.presets()?
            .into_iter()
            .find(|p| p.title == title)
            .with_context(|| {
                format!(
                    "no color found with name '{title}', check saved colors using 'avea show-colors'"
                )
            })
    }

    /// Add a preset. Fails if the name is already taken.
    pub fn add_preset(&self, preset: ColorPreset) -> Result<()> {
        let mut presets = self.presets()?;
        if presets.iter().any(|p| p.title == preset.title) {
            bail!(
                "color '{}' exists already, use 'avea delete-color {}' to remove it first",
                preset.title,
                preset.title
            );
        }
        presets.push(preset);
        self.write_presets(&presets)
    }

    /// Delete a preset by name. Fails if no preset has that name.
    pub fn delete_preset(&self, title: &str) -> Result<()> {
        let mut presets = self.presets()?;
        let before = presets.len();
        presets.retain(|p| p.title != title);
        if presets.len() == before {
            bail!("no color found with name '{title}', check saved colors using 'avea show-colors'");
        }
        self.write_presets(&presets)
    }

    fn write_presets(&self, presets: &[ColorPreset]) -> Result<()> {
        let path = self.colors_path();
        let file = PresetFile {
            colors: presets.to_vec(),
        };
        let content =
            serde_json::to_string_pretty(&file).context("failed to serialize color presets")?;
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Addresses of every lamp stored from earlier runs.
    pub fn known_addresses(&self) -> Result<HashSet<DeviceAddress>> {
        let path = self.uuids_path();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(DeviceAddress::from)
            .collect())
    }

    /// Store a lamp address unless it is already present.
    pub fn remember_address(&self, address: &DeviceAddress) -> Result<()> {
        let path = self.uuids_path();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.contains(&address.as_str()) {
            return Ok(());
        }

        info!(%address, "storing new lamp address");
        lines.push(address.as_str());
        let mut output = lines.join("\n");
        output.push('\n');
        fs::write(&path, output).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// The palette a fresh store is seeded with.
fn default_presets() -> Vec<ColorPreset> {
    fn preset(title: &str, red: u8, green: u8, blue: u8, white: u8) -> ColorPreset {
        ColorPreset {
            title: title.to_string(),
            color: Color {
                red,
                green,
                blue,
                white,
            },
        }
    }

    vec![
        preset("blue", 0, 5, 255, 10),
        preset("green", 0, 255, 0, 10),
        preset("red", 255, 0, 0, 15),
        preset("yellow", 255, 255, 0, 10),
        preset("orange", 255, 75, 0, 0),
        preset("purple", 200, 0, 250, 0),
        preset("pink", 220, 0, 80, 10),
        preset("white", 0, 0, 0, 255),
        preset("white-warm", 200, 100, 0, 175),
        preset("white-cold", 0, 100, 200, 175),
        preset("white-rose", 100, 0, 100, 200),
    ]
}
