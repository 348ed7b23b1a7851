//! Figure rendering for sweep comparisons.
//!
//! Styling conventions shared by every chart:
//!
//! - each PSF keeps one fixed color and one fixed marker shape across all
//!   figures, so encoders are recognizable at a glance;
//! - the tradeoff scatter colors markers by photon count through a
//!   sequential colormap on a log scale, dark at 20 photons and bright
//!   at 300;
//! - confidence bands are translucent polygons under the center line.
//!
//! NaN-degraded conditions are dropped from the drawn series; the
//! aggregation layer has already warned about them.

use photoninfo_core::{ConfidenceBand, Psf};
use plotters::prelude::*;
use plotters::style::colors::colormaps::ViridisRGB;

pub mod charts;

/// Fixed per-PSF line and fill color.
pub fn psf_color(psf: Psf) -> RGBColor {
    match psf {
        Psf::One => BLUE,
        Psf::Four => RED,
        Psf::Diffuser => GREEN,
        Psf::Uc => MAGENTA,
        Psf::Two => BLACK,
    }
}

/// Sequential marker color for a photon count, normalized on a log scale
/// over `range`. A degenerate range maps everything to the midpoint.
pub fn photon_color(photon_count: u32, range: (u32, u32)) -> RGBColor {
    let (lo, hi) = range;
    let t = if hi > lo {
        ((photon_count as f64).ln() - (lo as f64).ln())
            / ((hi as f64).ln() - (lo as f64).ln())
    } else {
        0.5
    };
    ViridisRGB.get_color(t.clamp(0.0, 1.0))
}

/// Closed polygon tracing the upper bounds left to right, then the lower
/// bounds back. NaN bounds are skipped on both edges.
pub fn band_polygon(photon_counts: &[u32], bands: &[ConfidenceBand]) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = photon_counts
        .iter()
        .zip(bands)
        .filter(|(_, b)| b.upper.is_finite())
        .map(|(&pc, b)| (pc as f64, b.upper))
        .collect();
    let lower: Vec<(f64, f64)> = photon_counts
        .iter()
        .zip(bands)
        .filter(|(_, b)| b.lower.is_finite())
        .map(|(&pc, b)| (pc as f64, b.lower))
        .collect();
    points.extend(lower.into_iter().rev());
    points
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(c: RGBColor) -> (u8, u8, u8) {
        (c.0, c.1, c.2)
    }

    #[test]
    fn test_psf_colors_are_distinct() {
        let colors: Vec<_> = Psf::ALL.iter().map(|&p| rgb(psf_color(p))).collect();
        for i in 0..colors.len() {
            for j in (i + 1)..colors.len() {
                assert_ne!(colors[i], colors[j], "{:?} vs {:?}", Psf::ALL[i], Psf::ALL[j]);
            }
        }
    }

    #[test]
    fn test_photon_color_brightens_with_count() {
        // viridis green channel rises monotonically with t
        let g20 = photon_color(20, (20, 300)).1;
        let g100 = photon_color(100, (20, 300)).1;
        let g300 = photon_color(300, (20, 300)).1;
        assert!(g20 < g100, "{g20} vs {g100}");
        assert!(g100 < g300, "{g100} vs {g300}");
    }

    #[test]
    fn test_photon_color_degenerate_range_is_stable() {
        assert_eq!(
            rgb(photon_color(100, (100, 100))),
            rgb(photon_color(250, (100, 100)))
        );
    }

    #[test]
    fn test_band_polygon_closes_upper_then_lower() {
        let bands = [
            ConfidenceBand {
                lower: 1.0,
                center: 1.5,
                upper: 2.0,
            },
            ConfidenceBand {
                lower: 1.2,
                center: 1.7,
                upper: 2.2,
            },
        ];
        let poly = band_polygon(&[20, 40], &bands);
        assert_eq!(
            poly,
            vec![(20.0, 2.0), (40.0, 2.2), (40.0, 1.2), (20.0, 1.0)]
        );
    }

    #[test]
    fn test_band_polygon_drops_nan_conditions() {
        let bands = [
            ConfidenceBand {
                lower: 1.0,
                center: 1.5,
                upper: 2.0,
            },
            ConfidenceBand {
                lower: f64::NAN,
                center: f64::NAN,
                upper: f64::NAN,
            },
            ConfidenceBand {
                lower: 1.2,
                center: 1.7,
                upper: 2.2,
            },
        ];
        let poly = band_polygon(&[20, 40, 60], &bands);
        assert_eq!(poly.len(), 4);
        assert_eq!(
            poly,
            vec![(20.0, 2.0), (60.0, 2.2), (60.0, 1.2), (20.0, 1.0)]
        );
    }
}
