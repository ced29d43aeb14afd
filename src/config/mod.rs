// Configuration management for nook
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub library: LibraryConfig,
    pub media: MediaConfig,
    pub playback: PlaybackConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Optional JSON track list that replaces the built-in catalog.
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Candidate directories for audio assets, tried in order.
    pub audio_bases: Vec<String>,
    /// Candidate directories (or URLs) for scene assets, tried in order.
    pub scene_bases: Vec<String>,
    /// Dev-time directory-listing service; a reachable one supersedes the
    /// static scene probe entirely.
    pub listing_url: Option<String>,
    /// Scene files probed for existence when no listing service answers.
    pub known_scenes: Vec<String>,
    /// Last-resort scene when nothing is reachable. Never verified.
    pub default_scene: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub volume: f32,
    pub fade_in_secs: f32,
    pub fade_out_secs: f32,
    pub tick_ms: u64,
    pub skip_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub rotate_minutes: u64,
    pub retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: LibraryConfig { catalog_path: None },
            media: MediaConfig::default(),
            playback: PlaybackConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            audio_bases: vec![
                "audio".to_string(),
                "assets/audio".to_string(),
                "./audio".to_string(),
                "../audio".to_string(),
            ],
            scene_bases: vec![
                "art".to_string(),
                "assets/art".to_string(),
                "./art".to_string(),
                "../art".to_string(),
            ],
            listing_url: None,
            known_scenes: vec![
                "RoofStudy.mp4".to_string(),
                "RoofStudy2.mp4".to_string(),
                "study_cat1.mp4".to_string(),
            ],
            default_scene: "study_cat1.mp4".to_string(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            fade_in_secs: 2.0,
            fade_out_secs: 1.5,
            tick_ms: 100,
            skip_delay_ms: 1000,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            rotate_minutes: 10,
            retry_delay_ms: 1000,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("nook");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).expect("defaults should serialize");
        let back: Config = toml::from_str(&toml).expect("defaults should deserialize");
        assert_eq!(back.media.audio_bases, config.media.audio_bases);
        assert_eq!(back.playback.tick_ms, 100);
        assert_eq!(back.scene.rotate_minutes, 10);
    }

    #[test]
    fn each_asset_kind_has_a_primary_and_three_fallback_bases() {
        let media = MediaConfig::default();
        assert_eq!(media.audio_bases.len(), 4);
        assert_eq!(media.scene_bases.len(), 4);
    }
}
