use serde::{Deserialize, Deserializer, Serialize};
use std::f64::consts::PI;
use std::path::PathBuf;

/// Target raster resolution shared by the material maps and the field grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImageConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
        }
    }
}

/// Parameters of the fragment-joining pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Maximum endpoint distance in millimeters at which fragments are joined.
    pub join_tolerance: f64,
    pub max_iterations: usize,
    /// Points sampled along each arc segment.
    pub arc_points: usize,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            join_tolerance: 0.1,
            max_iterations: 100,
            arc_points: 1000,
        }
    }
}

/// One value per scalar material property.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PropertyValues {
    pub permittivity: f64,
    pub conductivity: f64,
    pub density: f64,
}

/// Background values and pixel scalars of the material maps.
///
/// Backgrounds are expressed on the 0-255 map scale; a material property `p`
/// is drawn as `255 * p * scalar`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub background_color: [u8; 3],
    pub background: PropertyValues,
    pub scalars: PropertyValues,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            background_color: [135, 206, 250],
            background: PropertyValues {
                permittivity: 80.0,
                conductivity: 0.0,
                density: 0.0,
            },
            scalars: PropertyValues {
                permittivity: 1.0 / 80.0,
                conductivity: 1.0 / 1.01,
                density: 1.0 / 2160.0,
            },
        }
    }
}

/// Sampling ranges for the random excitations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcitationConfig {
    pub samples: usize,
    /// Half-open `[low, high)` phase range in radians.
    pub phase_limit: [f64; 2],
    /// Closed `[low, high]` amplitude range.
    pub amplitude_limit: [f64; 2],
    pub seed: Option<u64>,
}

impl Default for ExcitationConfig {
    fn default() -> Self {
        Self {
            samples: 3200,
            phase_limit: [0.0, 2.0 * PI],
            amplitude_limit: [0.0, 1.0],
            seed: None,
        }
    }
}

/// Decibel window that is mapped onto the 8-bit pixel range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DecibelRange {
    pub db_min: f64,
    pub db_max: f64,
}

impl DecibelRange {
    pub const MSF_DEFAULT: DecibelRange = DecibelRange {
        db_min: -20.0,
        db_max: 60.0,
    };
    pub const SAR_DEFAULT: DecibelRange = DecibelRange {
        db_min: -40.0,
        db_max: 40.0,
    };

    /// Reads a range, taking missing bounds from `fallback`.
    fn deserialize_over<'de, D>(deserializer: D, fallback: DecibelRange) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Partial {
            db_min: Option<f64>,
            db_max: Option<f64>,
        }
        let partial = Partial::deserialize(deserializer)?;
        Ok(Self {
            db_min: partial.db_min.unwrap_or(fallback.db_min),
            db_max: partial.db_max.unwrap_or(fallback.db_max),
        })
    }

    pub fn deserialize_msf<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Self::deserialize_over(deserializer, Self::MSF_DEFAULT)
    }

    pub fn deserialize_sar<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Self::deserialize_over(deserializer, Self::SAR_DEFAULT)
    }
}

/// Complete configuration threaded into every pipeline component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub image: ImageConfig,
    pub contour: ContourConfig,
    pub maps: MapConfig,
    pub excitation: ExcitationConfig,
    #[serde(deserialize_with = "DecibelRange::deserialize_msf")]
    pub msf: DecibelRange,
    #[serde(deserialize_with = "DecibelRange::deserialize_sar")]
    pub sar: DecibelRange,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image: ImageConfig::default(),
            contour: ContourConfig::default(),
            maps: MapConfig::default(),
            excitation: ExcitationConfig::default(),
            msf: DecibelRange::MSF_DEFAULT,
            sar: DecibelRange::SAR_DEFAULT,
        }
    }
}

impl PipelineConfig {
    /// Rejects values that would make a component divide by zero or draw
    /// from an empty range.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.image.width < 2 || self.image.height < 2 {
            return Err(PipelineError::InvalidInput(format!(
                "resolution must be at least 2x2, got {}x{}",
                self.image.width, self.image.height
            )));
        }
        if !(self.contour.join_tolerance > 0.0 && self.contour.join_tolerance.is_finite()) {
            return Err(PipelineError::InvalidInput(
                "join tolerance must be positive and finite".into(),
            ));
        }
        if self.contour.arc_points < 2 {
            return Err(PipelineError::InvalidInput(
                "arcs need at least two sample points".into(),
            ));
        }
        let scalars = self.maps.scalars;
        if [scalars.permittivity, scalars.conductivity, scalars.density]
            .iter()
            .any(|&s| !(s > 0.0))
        {
            return Err(PipelineError::InvalidInput(
                "map scalars must be positive".into(),
            ));
        }
        let excitation = self.excitation;
        if !excitation
            .phase_limit
            .iter()
            .chain(&excitation.amplitude_limit)
            .all(|v| v.is_finite())
        {
            return Err(PipelineError::InvalidInput(format!(
                "excitation limits must be finite, got phase {:?} and amplitude {:?}",
                excitation.phase_limit, excitation.amplitude_limit
            )));
        }
        let [phase_low, phase_high] = excitation.phase_limit;
        if !(phase_low < phase_high) {
            return Err(PipelineError::InvalidInput(format!(
                "empty phase range [{}, {})",
                phase_low, phase_high
            )));
        }
        let [amp_low, amp_high] = excitation.amplitude_limit;
        if !(amp_low <= amp_high) {
            return Err(PipelineError::InvalidInput(format!(
                "empty amplitude range [{}, {}]",
                amp_low, amp_high
            )));
        }
        for (name, range) in [("msf", self.msf), ("sar", self.sar)] {
            if !(range.db_min.is_finite() && range.db_max.is_finite()) {
                return Err(PipelineError::InvalidInput(format!(
                    "{} decibel range [{}, {}] is not finite",
                    name, range.db_min, range.db_max
                )));
            }
            if !(range.db_min < range.db_max) {
                return Err(PipelineError::InvalidInput(format!(
                    "{} decibel range [{}, {}] is empty",
                    name, range.db_min, range.db_max
                )));
            }
        }
        Ok(())
    }
}

/// Common error type of the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("drawing: {0}")]
    Drawing(String),
    #[error("unrecognized geometry mode `{mode}` on layer `{layer}`")]
    UnrecognizedGeometry { layer: String, mode: String },
    #[error("material: {0}")]
    Material(String),
    #[error("field export: {0}")]
    Field(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image encoding: {0}")]
    Image(#[from] image::ImageError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_degenerate_resolution() {
        let mut config = PipelineConfig::default();
        config.image.width = 1;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_rejects_inverted_decibel_range() {
        let mut config = PipelineConfig::default();
        config.sar = DecibelRange {
            db_min: 10.0,
            db_max: 10.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"image": {"width": 32}}"#).unwrap();
        assert_eq!(config.image.width, 32);
        assert_eq!(config.image.height, 64);
        assert_eq!(config.contour.arc_points, 1000);
    }

    #[test]
    fn validate_rejects_non_finite_limits() {
        let mut config = PipelineConfig::default();
        config.excitation.phase_limit = [0.0, f64::INFINITY];
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidInput(_))
        ));

        let mut config = PipelineConfig::default();
        config.excitation.amplitude_limit = [f64::NEG_INFINITY, 1.0];
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.msf.db_max = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.sar.db_min = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_decibel_range_keeps_its_own_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"msf": {"db_max": 70.0}, "sar": {"db_min": -30.0}}"#)
                .unwrap();
        assert_eq!(config.msf.db_min, -20.0);
        assert_eq!(config.msf.db_max, 70.0);
        assert_eq!(config.sar.db_min, -30.0);
        assert_eq!(config.sar.db_max, 40.0);
        config.validate().unwrap();
    }
}
