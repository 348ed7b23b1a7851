//! Chart renderers. Each function takes already-aggregated data and writes
//! one PNG; data marshalling and CSV companions live with the command.

use std::error::Error;
use std::path::Path;

use photoninfo_core::{AggregateGrid, Psf};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

const BINS: usize = 12;

/// Lines with confidence bands: one series per PSF against photon count.
///
/// Shared by the MI and accuracy figures; only captions and axis labels
/// differ.
pub fn render_metric_vs_photons(
    out_path: &Path,
    caption: &str,
    y_desc: &str,
    grid: &AggregateGrid,
) -> Result<(), Box<dyn Error>> {
    let photon_counts = grid.photon_counts();
    let x_lo = *photon_counts.first().ok_or("empty photon axis")? as f64;
    let x_hi = *photon_counts.last().ok_or("empty photon axis")? as f64;
    let x_pad = ((x_hi - x_lo) * 0.04).max(5.0);

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &psf in grid.psfs() {
        for band in grid.band_row(psf)? {
            if band.lower.is_finite() {
                y_min = y_min.min(band.lower);
            }
            if band.upper.is_finite() {
                y_max = y_max.max(band.upper);
            }
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return Err("every condition is NaN-degraded; nothing to plot".into());
    }
    let range = (y_max - y_min).abs();
    let pad = if range > 1e-6 {
        0.1 * range
    } else {
        0.1 * y_max.abs().max(1.0)
    };
    let y_lo = y_min - pad;
    let y_hi = y_max + pad;

    let root = BitMapBackend::new(out_path, (1200, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((x_lo - x_pad)..(x_hi + x_pad), y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("mean photon count")
        .y_desc(y_desc)
        .draw()?;

    for &psf in grid.psfs() {
        let bands = grid.band_row(psf)?;
        let color = super::psf_color(psf);

        let band_points = super::band_polygon(photon_counts, bands);
        if band_points.len() >= 3 {
            chart.draw_series(std::iter::once(Polygon::new(
                band_points,
                color.mix(0.15).filled(),
            )))?;
        }

        let centers: Vec<(f64, f64)> = photon_counts
            .iter()
            .zip(bands)
            .filter(|(_, b)| b.center.is_finite())
            .map(|(&pc, b)| (pc as f64, b.center))
            .collect();
        chart
            .draw_series(LineSeries::new(centers.clone(), &color))?
            .label(psf.legend_label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(
            centers
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Scatter of task accuracy against encoded information, one marker per
/// sweep cell. Marker shape encodes the PSF, marker color the photon
/// count; whiskers show both confidence bands.
pub fn render_tradeoff_scatter(
    out_path: &Path,
    caption: &str,
    mi: &AggregateGrid,
    accuracy: &AggregateGrid,
) -> Result<(), Box<dyn Error>> {
    if mi.psfs() != accuracy.psfs() || mi.photon_counts() != accuracy.photon_counts() {
        return Err("MI and accuracy grids cover different sweep axes".into());
    }
    let photon_counts = mi.photon_counts();
    let pc_range = (
        *photon_counts.first().ok_or("empty photon axis")?,
        *photon_counts.last().ok_or("empty photon axis")?,
    );

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &psf in mi.psfs() {
        let mi_bands = mi.band_row(psf)?;
        let acc_bands = accuracy.band_row(psf)?;
        for (m, a) in mi_bands.iter().zip(acc_bands) {
            if !m.center.is_finite() || !a.center.is_finite() {
                continue;
            }
            x_min = x_min.min(if m.lower.is_finite() { m.lower } else { m.center });
            x_max = x_max.max(if m.upper.is_finite() { m.upper } else { m.center });
            y_min = y_min.min(if a.lower.is_finite() { a.lower } else { a.center });
            y_max = y_max.max(if a.upper.is_finite() { a.upper } else { a.center });
        }
    }
    if !x_min.is_finite() || !y_min.is_finite() {
        return Err("every condition is NaN-degraded; nothing to plot".into());
    }
    let x_pad = 0.08 * (x_max - x_min).abs().max(0.1);
    let y_pad = 0.08 * (y_max - y_min).abs().max(0.01);

    let root = BitMapBackend::new(out_path, (1200, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((x_min - x_pad)..(x_max + x_pad), (y_min - y_pad)..(y_max + y_pad))?;

    chart
        .configure_mesh()
        .x_desc("MI (bits/pixel)")
        .y_desc("test accuracy")
        .draw()?;

    for &psf in mi.psfs() {
        let mi_bands = mi.band_row(psf)?;
        let acc_bands = accuracy.band_row(psf)?;
        let whisker_style = ShapeStyle::from(&super::psf_color(psf).mix(0.35)).stroke_width(1);

        let mut markers = Vec::with_capacity(photon_counts.len());
        for ((&pc, m), a) in photon_counts.iter().zip(mi_bands).zip(acc_bands) {
            if !m.center.is_finite() || !a.center.is_finite() {
                continue;
            }
            if m.lower.is_finite() && m.upper.is_finite() {
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(m.lower, a.center), (m.upper, a.center)],
                    whisker_style,
                )))?;
            }
            if a.lower.is_finite() && a.upper.is_finite() {
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(m.center, a.lower), (m.center, a.upper)],
                    whisker_style,
                )))?;
            }
            markers.push((m.center, a.center, super::photon_color(pc, pc_range)));
        }
        draw_marker_series(&mut chart, psf, &markers)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// One bar per PSF at a single photon count.
pub fn render_psf_bars(
    out_path: &Path,
    caption: &str,
    y_desc: &str,
    bars: &[(Psf, f64)],
) -> Result<(), Box<dyn Error>> {
    if bars.is_empty() {
        return Err("no bars to draw".into());
    }
    let y_max = bars
        .iter()
        .map(|&(_, v)| v)
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !y_max.is_finite() {
        return Err("every bar value is NaN; nothing to plot".into());
    }
    let y_hi = if y_max > 0.0 { y_max * 1.15 } else { 1.0 };
    let n = bars.len() as f64;
    let labels: Vec<&'static str> = bars.iter().map(|&(p, _)| p.legend_label()).collect();

    let root = BitMapBackend::new(out_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.6f64..(n - 0.4), 0f64..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|x: &f64| {
            let i = x.round();
            if (x - i).abs() < 0.3 && i >= 0.0 && (i as usize) < labels.len() {
                labels[i as usize].to_string()
            } else {
                String::new()
            }
        })
        .x_desc("encoder")
        .y_desc(y_desc)
        .draw()?;

    for (i, &(psf, value)) in bars.iter().enumerate() {
        if !value.is_finite() {
            continue;
        }
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.35, 0.0), (x + 0.35, value)],
            super::psf_color(psf).mix(0.8).filled(),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Overlaid per-PSF histograms of raw trial values at one photon count.
/// Makes diverged estimator runs visible before any clipping.
pub fn render_trial_spread(
    out_path: &Path,
    caption: &str,
    x_desc: &str,
    rows: &[(Psf, Vec<f64>)],
) -> Result<(), Box<dyn Error>> {
    let finite: Vec<f64> = rows
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .filter(|v| v.is_finite())
        .collect();
    if finite.is_empty() {
        return Err("no finite trial values to histogram".into());
    }
    let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi - lo < 1e-9 {
        // all trials identical; widen so the single bin is visible
        lo -= 0.5;
        hi += 0.5;
    }
    let bin_width = (hi - lo) / BINS as f64;

    let mut counts = vec![[0usize; BINS]; rows.len()];
    for (r, (_, values)) in rows.iter().enumerate() {
        for &v in values {
            if !v.is_finite() {
                continue;
            }
            let b = (((v - lo) / bin_width) as usize).min(BINS - 1);
            counts[r][b] += 1;
        }
    }
    let y_max = counts
        .iter()
        .flat_map(|c| c.iter())
        .copied()
        .max()
        .unwrap_or(0) as f64;

    let root = BitMapBackend::new(out_path, (1200, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, 0f64..(y_max + 1.0))?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("trials")
        .draw()?;

    for (r, &(psf, _)) in rows.iter().enumerate() {
        let color = super::psf_color(psf);
        chart
            .draw_series((0..BINS).filter(|&b| counts[r][b] > 0).map(|b| {
                let x0 = lo + b as f64 * bin_width;
                Rectangle::new(
                    [(x0, 0.0), (x0 + bin_width, counts[r][b] as f64)],
                    color.mix(0.45).filled(),
                )
            }))?
            .label(psf.legend_label())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 14, y + 5)], color.mix(0.45).filled())
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Draws one PSF's markers with its fixed shape; colors come per point.
/// Legend glyphs use the shape in black since marker colors encode the
/// photon count.
fn draw_marker_series<DB: DrawingBackend>(
    chart: &mut ChartContext<DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    psf: Psf,
    points: &[(f64, f64, RGBColor)],
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let label = psf.legend_label();
    match psf {
        Psf::One => {
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&(x, y, c)| Circle::new((x, y), 5, c.filled())),
                )?
                .label(label)
                .legend(|(x, y)| Circle::new((x + 10, y), 4, BLACK.filled()));
        }
        Psf::Four => {
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&(x, y, c)| TriangleMarker::new((x, y), 6, c.filled())),
                )?
                .label(label)
                .legend(|(x, y)| TriangleMarker::new((x + 10, y), 5, BLACK.filled()));
        }
        Psf::Diffuser => {
            chart
                .draw_series(points.iter().map(|&(x, y, c)| {
                    Cross::new((x, y), 5, ShapeStyle::from(&c).stroke_width(2))
                }))?
                .label(label)
                .legend(|(x, y)| {
                    Cross::new((x + 10, y), 4, ShapeStyle::from(&BLACK).stroke_width(2))
                });
        }
        Psf::Uc => {
            chart
                .draw_series(points.iter().map(|&(x, y, c)| {
                    EmptyElement::at((x, y)) + Rectangle::new([(-4, -4), (4, 4)], c.filled())
                }))?
                .label(label)
                .legend(|(x, y)| Rectangle::new([(x + 6, y - 4), (x + 14, y + 4)], BLACK.filled()));
        }
        Psf::Two => {
            chart
                .draw_series(points.iter().map(|&(x, y, c)| {
                    Circle::new((x, y), 5, ShapeStyle::from(&c).stroke_width(2))
                }))?
                .label(label)
                .legend(|(x, y)| {
                    Circle::new((x + 10, y), 4, ShapeStyle::from(&BLACK).stroke_width(2))
                });
        }
    }
    Ok(())
}
