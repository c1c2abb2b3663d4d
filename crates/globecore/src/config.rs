//! Viewer tunables. Everything has a default so a config file only needs
//! the fields it changes.

use crate::error::ConfigError;
use crate::pins::Pin;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// Auto-rotation, radians per second.
    pub rotation_speed: f32,
    /// Point sprite size in pixels at the default camera distance.
    pub point_size: f32,
    /// Sampling pitch in degrees for both coastlines and interiors.
    pub density_deg: f64,
    pub enable_zoom: bool,
    /// Opacity points fade toward on the far side of the sphere.
    pub back_opacity: f32,
    /// Interior points render dimmer than coastlines.
    pub fill_opacity: f32,
    /// Coastline point color.
    pub point_color: [f32; 3],
    /// Interior fill point color.
    pub fill_color: [f32; 3],
    pub pin_color: [f32; 3],
    pub halo_color: [f32; 3],
    pub label_color: [f32; 3],
    /// Font family selector: "proportional" or "monospace".
    pub label_font: String,
    pub label_font_size: f32,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 0.15,
            point_size: 2.0,
            density_deg: 2.0,
            enable_zoom: true,
            back_opacity: 0.15,
            fill_opacity: 0.6,
            point_color: [0.62, 0.85, 1.0],
            fill_color: [0.55, 0.78, 1.0],
            pin_color: [1.0, 0.43, 0.38],
            halo_color: [0.45, 0.75, 1.0],
            label_color: [0.92, 0.96, 1.0],
            label_font: "proportional".into(),
            label_font_size: 12.0,
        }
    }
}

pub fn load_config(path: &Path) -> Result<GlobeConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pin list file: a JSON array of pin objects.
pub fn load_pins(path: &Path) -> Result<Vec<Pin>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Stand-in storefronts shown when no pin file is given.
pub fn demo_pins() -> Vec<Pin> {
    vec![
        Pin {
            lat: 40.7128,
            lon: -74.006,
            name: Some("Harbor Flagship".into()),
            address: Some("18 Fulton St, New York, NY".into()),
            phone: Some("+1 212 555 0148".into()),
        },
        Pin {
            lat: 51.5074,
            lon: -0.1278,
            name: Some("Covent Garden Shop".into()),
            address: Some("9 Shorts Gardens, London".into()),
            phone: Some("+44 20 7946 0921".into()),
        },
        Pin {
            lat: 35.6762,
            lon: 139.6503,
            name: Some("Shibuya Annex".into()),
            address: Some("2-24-1 Shibuya, Tokyo".into()),
            phone: None,
        },
        Pin {
            lat: -33.8688,
            lon: 151.2093,
            ..Pin::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_files_fall_back_to_defaults() {
        let cfg: GlobeConfig = serde_json::from_str(r#"{ "rotation_speed": 0.4 }"#).unwrap();
        assert_eq!(cfg.rotation_speed, 0.4);
        assert_eq!(cfg.point_size, GlobeConfig::default().point_size);
        assert_eq!(cfg.density_deg, 2.0);
        assert!(cfg.enable_zoom);
    }

    #[test]
    fn config_survives_a_json_round_trip() {
        let mut cfg = GlobeConfig::default();
        cfg.back_opacity = 0.05;
        cfg.halo_color = [1.0, 0.0, 0.5];
        let text = serde_json::to_string(&cfg).unwrap();
        let back: GlobeConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.back_opacity, 0.05);
        assert_eq!(back.halo_color, [1.0, 0.0, 0.5]);
    }

    #[test]
    fn pin_files_accept_sparse_objects() {
        let pins: Vec<Pin> = serde_json::from_str(
            r#"[
                { "lat": 10.0, "lon": 20.0, "name": "A" },
                { "lat": -5.0, "lon": 100.0 }
            ]"#,
        )
        .unwrap();
        assert_eq!(pins.len(), 2);
        assert!(pins[0].has_details());
        assert!(!pins[1].has_details());
    }

    #[test]
    fn missing_config_file_reports_the_path() {
        let path = Path::new("/nonexistent/globe.json");
        match load_config(path) {
            Err(ConfigError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn demo_pins_mix_labeled_and_bare_markers() {
        let pins = demo_pins();
        assert!(pins.len() >= 3);
        assert!(pins.iter().any(|p| p.has_details()));
        assert!(pins.iter().any(|p| !p.has_details()));
    }
}
