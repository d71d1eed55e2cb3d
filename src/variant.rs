// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Heatmap generator variants and window policies.
//!
//! The fixed-sigma and scale-aware heatmap generators share one implementation;
//! this module names the two behaviors and the window sizing rules they use.

use std::fmt;
use std::str::FromStr;

/// Default Gaussian cutoff used by [`WindowPolicy::Threshold`].
pub const DEFAULT_WINDOW_THRESHOLD: f32 = 0.01;

/// Where a body joint's Gaussian standard deviation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum HeatmapVariant {
    /// One shared sigma for every body joint, supplied per call.
    #[default]
    FixedSigma,
    /// Per-instance sigma read from the 4th field of each body joint record.
    ScaleAware,
}

impl HeatmapVariant {
    /// Returns the canonical string name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FixedSigma => "fixed-sigma",
            Self::ScaleAware => "scale-aware",
        }
    }

    /// Returns whether body joints read their sigma from the keypoint record.
    #[must_use]
    pub const fn uses_instance_sigma(&self) -> bool {
        matches!(self, Self::ScaleAware)
    }

    /// Returns the window policy this variant uses unless configured otherwise.
    #[must_use]
    pub const fn default_window(&self) -> WindowPolicy {
        match self {
            Self::FixedSigma => WindowPolicy::ThreeSigma,
            Self::ScaleAware => WindowPolicy::Threshold {
                threshold: DEFAULT_WINDOW_THRESHOLD,
                round_radius: true,
            },
        }
    }
}

impl fmt::Display for HeatmapVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HeatmapVariant {
    type Err = VariantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed-sigma" | "fixed_sigma" | "fixed" => Ok(Self::FixedSigma),
            "scale-aware" | "scale_aware" | "scale" | "sa" => Ok(Self::ScaleAware),
            _ => Err(VariantParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid variant string.
#[derive(Debug, Clone)]
pub struct VariantParseError(String);

impl fmt::Display for VariantParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid heatmap variant '{}', expected one of: fixed-sigma, scale-aware",
            self.0
        )
    }
}

impl std::error::Error for VariantParseError {}

/// How far around a keypoint its Gaussian is rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum WindowPolicy {
    /// `[floor(c - 3σ - 1), ceil(c + 3σ + 2))` on each axis.
    #[default]
    ThreeSigma,
    /// Radius at which the Gaussian drops to `threshold`:
    /// `sqrt(2 · ln(1/threshold) · σ²)`, window `[round(c - r - 1), round(c + r + 2))`.
    Threshold {
        /// Gaussian value at the window edge, in `(0, 1)`.
        threshold: f32,
        /// Round the radius to the nearest integer before placing the window.
        round_radius: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_str() {
        assert_eq!(
            "fixed-sigma".parse::<HeatmapVariant>().unwrap(),
            HeatmapVariant::FixedSigma
        );
        assert_eq!(
            "scale-aware".parse::<HeatmapVariant>().unwrap(),
            HeatmapVariant::ScaleAware
        );

        // Alternative names
        assert_eq!(
            "fixed".parse::<HeatmapVariant>().unwrap(),
            HeatmapVariant::FixedSigma
        );
        assert_eq!(
            "Scale_Aware".parse::<HeatmapVariant>().unwrap(),
            HeatmapVariant::ScaleAware
        );
        assert!("gaussian".parse::<HeatmapVariant>().is_err());
    }

    #[test]
    fn test_variant_display() {
        assert_eq!(HeatmapVariant::FixedSigma.to_string(), "fixed-sigma");
        assert_eq!(HeatmapVariant::ScaleAware.to_string(), "scale-aware");
    }

    #[test]
    fn test_variant_defaults() {
        assert!(!HeatmapVariant::FixedSigma.uses_instance_sigma());
        assert!(HeatmapVariant::ScaleAware.uses_instance_sigma());
        assert_eq!(
            HeatmapVariant::FixedSigma.default_window(),
            WindowPolicy::ThreeSigma
        );
        assert!(matches!(
            HeatmapVariant::ScaleAware.default_window(),
            WindowPolicy::Threshold {
                round_radius: true,
                ..
            }
        ));
    }
}
