use crate::cli::{Args, Backend};
use crate::error::ConfigError;

use super::defaults::*;

/// Runtime settings for the size searches
#[derive(Debug, Clone)]
pub struct SearchSettings {
    // Image quality search
    pub min_quality: u8,
    pub max_quality: u8,
    pub quality_probes: u32,

    // Image fallback
    pub downscale_margin: f64,
    pub shrink_factor: f64,
    pub shrink_quality: u8,
    pub min_dimension: u32,

    // Document DPI search
    pub min_dpi: u32,
    pub max_dpi: u32,
    pub dpi_probes: u32,
    pub page_quality: u8,

    // Document fallback
    pub dpi_shrink_factor: f64,
    pub dpi_floor: u32,

    /// Rasterizer used for document pages
    pub backend: Backend,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_quality: MIN_QUALITY,
            max_quality: MAX_QUALITY,
            quality_probes: QUALITY_PROBES,

            downscale_margin: DOWNSCALE_MARGIN,
            shrink_factor: SHRINK_FACTOR,
            shrink_quality: SHRINK_QUALITY,
            min_dimension: MIN_DIMENSION,

            min_dpi: MIN_DPI,
            max_dpi: MAX_DPI,
            dpi_probes: DPI_PROBES,
            page_quality: PAGE_JPEG_QUALITY,

            dpi_shrink_factor: DPI_SHRINK_FACTOR,
            dpi_floor: DPI_FLOOR,

            backend: Backend::default(),
        }
    }
}

impl SearchSettings {
    /// Create settings from CLI arguments
    pub fn from_args(args: &Args) -> Self {
        let defaults = Self::default();
        Self {
            min_dpi: args.min_dpi.unwrap_or(defaults.min_dpi),
            max_dpi: args.max_dpi.unwrap_or(defaults.max_dpi),
            page_quality: args.page_quality.unwrap_or(defaults.page_quality),
            backend: args.backend.unwrap_or(defaults.backend),
            ..defaults
        }
    }

    /// Use a specific rasterizer backend
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Check that every range is non-empty and every factor usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_quality == 0 || self.min_quality > self.max_quality || self.max_quality > 100 {
            return Err(ConfigError::InvalidRange {
                name: "quality",
                min: self.min_quality as u32,
                max: self.max_quality as u32,
            });
        }
        if self.min_dpi == 0 || self.min_dpi > self.max_dpi {
            return Err(ConfigError::InvalidRange {
                name: "dpi",
                min: self.min_dpi,
                max: self.max_dpi,
            });
        }
        if self.quality_probes == 0 || self.dpi_probes == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "probes",
                message: "at least one probe is required".to_string(),
            });
        }
        for (name, factor) in [
            ("downscale_margin", self.downscale_margin),
            ("shrink_factor", self.shrink_factor),
            ("dpi_shrink_factor", self.dpi_shrink_factor),
        ] {
            if !(factor > 0.0 && factor < 1.0) {
                return Err(ConfigError::InvalidSetting {
                    name,
                    message: format!("{} is not between 0 and 1", factor),
                });
            }
        }
        for (name, quality) in [
            ("shrink_quality", self.shrink_quality),
            ("page_quality", self.page_quality),
        ] {
            if quality == 0 || quality > 100 {
                return Err(ConfigError::InvalidSetting {
                    name,
                    message: format!("{} is not between 1 and 100", quality),
                });
            }
        }
        if self.min_dimension == 0 || self.dpi_floor == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "floor",
                message: "minimum dimension and DPI floor must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = SearchSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.quality_probes, 8);
        assert_eq!(settings.dpi_probes, 6);
        assert_eq!((settings.min_dpi, settings.max_dpi), (36, 150));
    }

    #[test]
    fn test_rejects_inverted_dpi_range() {
        let settings = SearchSettings {
            min_dpi: 200,
            max_dpi: 100,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidRange { name: "dpi", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_factor() {
        let settings = SearchSettings {
            shrink_factor: 1.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_with_backend() {
        let settings = SearchSettings::default().with_backend(Backend::Embedded);
        assert_eq!(settings.backend, Backend::Embedded);
    }
}
