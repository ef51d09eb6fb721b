//! Configuration for the panel evaluator.
//!
//! All geometry is expressed in screen pixels of the sensor's color
//! space. Zone positions are stored without the surface center offset;
//! the offset is applied once when a zone is resolved for hit-testing.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::body::agility::GameConfig;
use crate::body::coaching::{Margins, MARGIN_MAX};
use crate::body::menu::MenuButton;
use crate::body::slider::SliderConfig;
use crate::body::zones::ZoneSpec;

/// Evaluator configuration, loadable from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Screen surface the sensor coordinates map onto.
    pub surface: SurfaceConfig,

    /// Hit-test tolerances per page and difficulty.
    pub tolerance: ToleranceConfig,

    /// Button and checkbox zone layout.
    pub zones: ZoneLayout,

    /// Difficulty slider geometry.
    pub slider: SliderConfig,

    /// Agility game target sequence.
    pub game: GameConfig,

    /// Initial placement margins.
    pub margins: Margins,

    /// Session clock timing.
    pub clock: ClockConfig,
}

/// Dimensions of the coordinate surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Proportional hit-test tolerances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Tolerance on the menu and options pages.
    pub menu: f64,
    /// Tolerance per difficulty value during the game.
    pub difficulty: [f64; 3],
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            menu: 0.03,
            difficulty: [0.04, 0.03, 0.02],
        }
    }
}

impl ToleranceConfig {
    /// Game tolerance for a slider value. Values outside the table fall
    /// back to the menu tolerance.
    pub fn for_difficulty(&self, value: u8) -> f64 {
        self.difficulty
            .get(value as usize)
            .copied()
            .unwrap_or(self.menu)
    }
}

/// Zone centers for the fixed panel controls, before the surface
/// offset is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneLayout {
    pub play: ZoneSpec,
    pub cancel: ZoneSpec,
    pub options: ZoneSpec,
    pub refresh: ZoneSpec,
    pub checkbox: ZoneSpec,
    /// Offset added to every zone center and game target.
    pub center_offset: f64,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self {
            play: ZoneSpec::new(912.0, 171.0),
            cancel: ZoneSpec::new(1251.0, 312.0),
            options: ZoneSpec::new(575.0, 312.0),
            refresh: ZoneSpec::new(1171.0, 180.0),
            checkbox: ZoneSpec::new(660.0, 180.0),
            center_offset: 50.0,
        }
    }
}

impl ZoneLayout {
    pub fn for_button(&self, button: MenuButton) -> &ZoneSpec {
        match button {
            MenuButton::Play => &self.play,
            MenuButton::Options => &self.options,
            MenuButton::Cancel => &self.cancel,
            MenuButton::Refresh => &self.refresh,
        }
    }
}

/// Session clock timing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Interval between clock ticks in milliseconds.
    pub tick_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tick_ms: 1000 }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Serialize the active configuration as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.surface.width <= 0.0 || self.surface.height <= 0.0 {
            return Err(Error::Config(
                "surface dimensions must be positive".to_string(),
            ));
        }
        if self.tolerance.menu <= 0.0 || self.tolerance.menu >= 1.0 {
            return Err(Error::Config(
                "menu tolerance must be in (0, 1)".to_string(),
            ));
        }
        for t in self.tolerance.difficulty {
            if t <= 0.0 || t >= 1.0 {
                return Err(Error::Config(
                    "difficulty tolerances must be in (0, 1)".to_string(),
                ));
            }
        }
        if self.game.targets.is_empty() {
            return Err(Error::Config(
                "the game needs at least one target".to_string(),
            ));
        }
        if self.slider.half_width <= 0.0 {
            return Err(Error::Config(
                "slider half-width must be positive".to_string(),
            ));
        }
        if !self.slider.segments.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::Config(
                "slider segments must be strictly increasing".to_string(),
            ));
        }
        for (name, value) in [
            ("top", self.margins.top),
            ("bottom", self.margins.bottom),
            ("sides", self.margins.sides),
        ] {
            if !(0.0..=MARGIN_MAX).contains(&value) {
                return Err(Error::Config(format!(
                    "{} margin must be in [0, {}]",
                    name, MARGIN_MAX
                )));
            }
        }
        if self.clock.tick_ms == 0 {
            return Err(Error::Config("clock tick must be positive".to_string()));
        }
        Ok(())
    }
}
