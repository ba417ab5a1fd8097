use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading or checking a [`ReconstructionConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the config schema.
    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    /// A parameter is out of its valid range.
    #[error("Invalid value for `{name}`: {value}")]
    InvalidValue {
        /// The parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
}

/// Fixed-point encoding of the SDF and displacement images.
///
/// Stored samples are `(value + offset) / scale`, so negative distances
/// survive an unsigned 8-bit image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldEncoding {
    /// Multiplier from normalized samples back to pixel units.
    pub scale: f32,
    /// Offset added to the values before they were stored.
    pub offset: f32,
}

impl FieldEncoding {
    /// Decode a normalized sample to a signed value in pixel units.
    ///
    /// # Example
    ///
    /// ```
    /// use contour_lift::FieldEncoding;
    ///
    /// let encoding = FieldEncoding::default();
    /// assert_eq!(encoding.decode(0.0), -8.0);
    /// assert!(encoding.decode(8.0 / 255.0).abs() < 1e-5);
    /// ```
    #[inline]
    pub fn decode(&self, raw: f32) -> f32 {
        self.scale * raw - self.offset
    }
}

impl Default for FieldEncoding {
    fn default() -> Self {
        Self {
            scale: 255.0,
            offset: 8.0,
        }
    }
}

/// Controls how the per-pixel ray casts are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    #[default]
    Serial,

    /// Use the global Rayon thread pool, one task per contour pixel.
    ///
    /// The output order is the same as with [`ExecutionStrategy::Serial`].
    Parallel,
}

/// Parameters of the reconstruction.
///
/// The defaults match the encoding of the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Encoding of the SDF and displacement images.
    pub encoding: FieldEncoding,
    /// Pixels with `|sdf| < contour_tolerance` are reconstructed.
    pub contour_tolerance: f32,
    /// Pixels with `sdf <= direct_max_sdf` try a ray through themselves first.
    pub direct_max_sdf: f32,
    /// How many pixels the extended attempt pushes past the displaced pixel.
    pub extension: f64,
    /// Depth of the placeholder recorded for pixels the cascade could not reach.
    pub placeholder_depth: f64,
    /// Slope of the smoothed step mapping the ground-truth SDF to alpha.
    pub alpha_slope: f32,
    /// How the cascade is executed.
    pub execution: ExecutionStrategy,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            encoding: FieldEncoding::default(),
            contour_tolerance: 8.0,
            direct_max_sdf: 1e-4,
            extension: 1.0,
            placeholder_depth: 100.0,
            alpha_slope: 1.2,
            execution: ExecutionStrategy::Serial,
        }
    }
}

impl ReconstructionConfig {
    /// Load a configuration from a JSON file. Missing fields take their default.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or parsed, or a parameter is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter is in its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |name: &'static str, value: f64, ok: bool| {
            if value.is_finite() && ok {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue { name, value })
            }
        };

        let scale = self.encoding.scale as f64;
        check("encoding.scale", scale, scale > 0.0)?;
        check("encoding.offset", self.encoding.offset as f64, true)?;
        let tolerance = self.contour_tolerance as f64;
        check("contour_tolerance", tolerance, tolerance > 0.0)?;
        check("direct_max_sdf", self.direct_max_sdf as f64, true)?;
        check("extension", self.extension, self.extension >= 0.0)?;
        check("placeholder_depth", self.placeholder_depth, true)?;
        let slope = self.alpha_slope as f64;
        check("alpha_slope", slope, slope > 0.0)?;

        Ok(())
    }
}
