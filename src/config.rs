//! Process configuration read from the environment.

use std::path::PathBuf;

use crate::assets::AssetPaths;
use crate::fonts::FontPaths;
use crate::provider::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Settings for the command-line front end. Everything has a default, so
/// loading never fails; whether the fonts actually exist is checked when the
/// [`FontRegistry`](crate::fonts::FontRegistry) is built.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub font_dir: PathBuf,
    pub logo_path: PathBuf,
    pub qr_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            font_dir: PathBuf::from("fonts"),
            logo_path: PathBuf::from("faith_sparks_logo.png"),
            qr_path: PathBuf::from("faithsparks_qr.png"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    /// Load `secret.env` and `.env` if present, then read the environment.
    pub fn from_env() -> Self {
        dotenvy::from_filename("secret.env").ok();
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_key: get("OPENAI_API_KEY"),
            model: get("COPYWORK_MODEL").unwrap_or(defaults.model),
            api_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.api_base_url),
            font_dir: get("COPYWORK_FONT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_dir),
            logo_path: get("COPYWORK_LOGO")
                .map(PathBuf::from)
                .unwrap_or(defaults.logo_path),
            qr_path: get("COPYWORK_QR")
                .map(PathBuf::from)
                .unwrap_or(defaults.qr_path),
            output_dir: get("COPYWORK_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }

    pub fn font_paths(&self) -> FontPaths {
        FontPaths::in_dir(&self.font_dir)
    }

    pub fn asset_paths(&self) -> AssetPaths {
        AssetPaths {
            logo: Some(self.logo_path.clone()),
            qr: Some(self.qr_path.clone()),
        }
    }
}
