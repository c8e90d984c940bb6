//! Settings and on-disk paths. Settings persist next to the export file
//! in the platform data directory; CLI flags override them per run.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub seed: u64,
    pub fps_cap: u32,
    pub enable_color: bool,
    pub initial_fish: usize,
    pub initial_plants: usize,
    pub initial_rocks: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0,
            fps_cap: 60,
            enable_color: true,
            initial_fish: 12,
            initial_plants: 5,
            initial_rocks: 8,
        }
    }
}

pub struct Paths {
    pub export_path: PathBuf,
    pub settings_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "aquarium-sim", "AquariumSim")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        export_path: dir.join("aquarium_export.json"),
        settings_path: dir.join("settings.json"),
    })
}

pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
    }
    Settings::default()
}

pub fn save_settings(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
