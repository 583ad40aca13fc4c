use serde::{Deserialize, Serialize};

use crate::error::{KonturError, KonturResult};

/// How stage 5 resolves weak edge candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HysteresisMode {
    /// One raster scan over an evolving label map: a weak pixel is promoted
    /// only if an 8-neighbor is already strong at the moment it is visited.
    /// Chains of weak pixels are not followed.
    SinglePass,
    /// Worklist promotion seeded from every strong pixel, following weak
    /// chains through full 8-connectivity as textbook Canny specifies.
    FloodFill,
}

impl Default for HysteresisMode {
    fn default() -> Self {
        HysteresisMode::SinglePass
    }
}

impl std::fmt::Display for HysteresisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HysteresisMode::SinglePass => write!(f, "single-pass"),
            HysteresisMode::FloodFill => write!(f, "flood-fill"),
        }
    }
}

impl std::str::FromStr for HysteresisMode {
    type Err = KonturError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single-pass" => Ok(HysteresisMode::SinglePass),
            "flood-fill" => Ok(HysteresisMode::FloodFill),
            other => Err(KonturError::config(format!(
                "unknown hysteresis mode '{}' (expected 'single-pass' or 'flood-fill')",
                other
            ))),
        }
    }
}

/// Configuration surface of the Canny pipeline.
///
/// Thresholds are `u8`, so the 0-255 range is guaranteed by the type; the
/// only checkable precondition is the threshold ordering. Fields omitted
/// from a serialized config fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannyConfig {
    /// Magnitudes below this are discarded outright.
    pub low_threshold: u8,
    /// Magnitudes at or above this are confirmed edges.
    pub high_threshold: u8,
    /// Box blur radius for stage 1; 0 skips smoothing entirely.
    pub blur_radius: u32,
    /// Weak-candidate resolution strategy for stage 5.
    pub hysteresis: HysteresisMode,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            low_threshold: 50,
            high_threshold: 100,
            blur_radius: 2,
            hysteresis: HysteresisMode::SinglePass,
        }
    }
}

impl CannyConfig {
    /// Check the threshold ordering precondition.
    ///
    /// A violation is an error, not a clamp: silently reordering thresholds
    /// would hide caller bugs behind plausible output.
    pub fn validate(&self) -> KonturResult<()> {
        if self.low_threshold > self.high_threshold {
            return Err(KonturError::config(format!(
                "low threshold {} exceeds high threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(())
    }

    pub fn load_from_file(path: &std::path::Path) -> KonturResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: CannyConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> KonturResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
