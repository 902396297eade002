use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{PitwallError, views::StandingsWeighting};

const CONFIG_DIR_NAME: &str = "pitwall";
const CONFIG_FILE_NAME: &str = "config.json";

pub const REFRESH_INTERVAL_MS: u64 = 5000;
pub const LIVE_POSITIONS_INTERVAL_MS: u64 = 2000;
const FRAME_WIDTH: f32 = 1600.;
const FRAME_HEIGHT: f32 = 1000.;

/// Grid the panels are laid out in. Panels fill the grid row by row and the first one is the
/// primary panel, drawn `primary_width_ratio` times as wide as the other panels of its row.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct PanelLayout {
    pub rows: usize,
    pub cols: usize,
    pub primary_width_ratio: f32,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 2,
            primary_width_ratio: 2.,
        }
    }
}

impl PanelLayout {
    pub fn single() -> Self {
        Self {
            rows: 1,
            cols: 1,
            primary_width_ratio: 1.,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub refresh_interval_ms: u64,
    pub dark_mode: bool,
    pub panel_layout: PanelLayout,
    pub standings_weighting: StandingsWeighting,
    pub live_positions_interval_ms: u64,
    pub frame_size: FrameSize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: REFRESH_INTERVAL_MS,
            dark_mode: true,
            panel_layout: PanelLayout::default(),
            standings_weighting: StandingsWeighting::default(),
            live_positions_interval_ms: LIVE_POSITIONS_INTERVAL_MS,
            frame_size: FrameSize::default(),
        }
    }
}

impl DashboardConfig {
    pub fn local_path() -> Result<PathBuf, PitwallError> {
        Ok(dirs::config_dir()
            .ok_or(PitwallError::NoConfigDir)?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Config saved in the user's config directory, if there is one.
    pub fn from_local_file() -> Result<Option<Self>, PitwallError> {
        let config_path = Self::local_path()?;
        if !config_path.exists() {
            return Ok(None);
        }
        Self::from_file(&config_path).map(Some)
    }

    pub fn from_file(path: &Path) -> Result<Self, PitwallError> {
        let file =
            std::fs::File::open(path).map_err(|e| PitwallError::ConfigIOError { source: e })?;
        let config: Self = serde_json::from_reader(file)
            .map_err(|e| PitwallError::ConfigSerializeError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), PitwallError> {
        self.save_to(&Self::local_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), PitwallError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| PitwallError::ConfigSerializeError { source: e })
    }

    pub fn validate(&self) -> Result<(), PitwallError> {
        let invalid = |field: &str, reason: &str| PitwallError::InvalidConfig {
            field: field.to_string(),
            reason: reason.to_string(),
        };
        if self.refresh_interval_ms == 0 {
            return Err(invalid("refresh_interval_ms", "must be greater than zero"));
        }
        if self.live_positions_interval_ms == 0 {
            return Err(invalid(
                "live_positions_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.panel_layout.rows == 0 || self.panel_layout.cols == 0 {
            return Err(invalid("panel_layout", "grid needs at least one row and column"));
        }
        if !self.panel_layout.primary_width_ratio.is_finite()
            || self.panel_layout.primary_width_ratio < 1.
        {
            return Err(invalid("panel_layout.primary_width_ratio", "must be at least 1"));
        }
        if !(self.frame_size.width > 0. && self.frame_size.height > 0.) {
            return Err(invalid("frame_size", "must be positive"));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_millis(5000));
        assert!(config.dark_mode);
        assert_eq!(config.panel_layout.capacity(), 4);
        assert_eq!(config.panel_layout.primary_width_ratio, 2.);
        assert_eq!(config.standings_weighting, StandingsWeighting::Equal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{"refresh_interval_ms": 1000, "panel_layout": {"cols": 3}, "standings_weighting": "InverseRank"}"#,
        )
        .unwrap();

        assert_eq!(config.refresh_interval_ms, 1000);
        assert!(config.dark_mode);
        assert_eq!(config.panel_layout.rows, 2);
        assert_eq!(config.panel_layout.cols, 3);
        assert_eq!(config.standings_weighting, StandingsWeighting::InverseRank);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = DashboardConfig {
            dark_mode: false,
            refresh_interval_ms: 250,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(DashboardConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let zero_interval = DashboardConfig {
            refresh_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_interval.validate(),
            Err(PitwallError::InvalidConfig { field, .. }) if field == "refresh_interval_ms"
        ));

        let empty_grid = DashboardConfig {
            panel_layout: PanelLayout {
                rows: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(empty_grid.validate().is_err());

        let narrow_primary = DashboardConfig {
            panel_layout: PanelLayout {
                primary_width_ratio: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(narrow_primary.validate().is_err());
    }
}
