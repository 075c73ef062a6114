use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;

use crate::models::Report;

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 640;

pub const FREQUENCY_CHART: &str = "license_frequency.png";
pub const ORGANIZATION_CHART: &str = "paid_by_organization.png";

/// Draw the license-distribution and paid-users-per-organization bar charts
/// into `dir`. Empty aggregates are reported and skipped, not drawn.
pub fn render(report: &Report, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create chart directory {}", dir.display()))?;

    let frequency: Vec<(String, usize)> = report
        .license_frequency
        .iter()
        .map(|(category, n)| (category.column_label().to_string(), *n))
        .collect();

    let mut written = Vec::new();
    let charts = [
        (FREQUENCY_CHART, "Paid license distribution", &frequency),
        (
            ORGANIZATION_CHART,
            "Users with a paid license per organization",
            &report.paid_users_by_organization,
        ),
    ];

    for (file, caption, bars) in charts {
        let path = dir.join(file);
        if draw_bars(&path, caption, bars)? {
            println!("Chart written to: {}", path.display());
            written.push(path);
        } else {
            println!("{}: no data, chart skipped", caption);
        }
    }

    Ok(written)
}

/// Returns `false` without touching the filesystem when there is nothing to draw.
fn draw_bars(path: &Path, caption: &str, bars: &[(String, usize)]) -> Result<bool> {
    let Some(max) = bars.iter().map(|(_, n)| *n).max() else {
        return Ok(false);
    };
    let y_max = max + max / 10 + 1;

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 26))
        .margin(18)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .build_cartesian_2d((0..bars.len()).into_segmented(), 0..y_max)
        .map_err(plot_err)?;

    let label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => bars.get(*i).map(|(l, _)| l.clone()).unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&label)
        .y_desc("Count")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(RGBColor(51, 117, 242).filled())
                .margin(16)
                .data(bars.iter().enumerate().map(|(i, (_, n))| (i, *n))),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(true)
}

fn plot_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {}", e)
}
