//! CSV export of the annotated series, for plotting outside the tool.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use super::Report;

#[derive(Serialize)]
struct SeriesRow {
    time: String,
    seconds: f64,
    requests: u64,
    predicted: f64,
    residual: f64,
    z_score: f64,
    in_baseline: bool,
    anomaly: bool,
}

/// Write one row per second:
/// `time,seconds,requests,predicted,residual,z_score,in_baseline,anomaly`.
pub fn write_series_csv<W: Write>(report: &Report, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for p in &report.points {
        wtr.serialize(SeriesRow {
            time: p.time.format("%Y-%m-%d %H:%M:%S").to_string(),
            seconds: p.seconds,
            requests: p.requests,
            predicted: p.predicted,
            residual: p.residual,
            z_score: p.z_score,
            in_baseline: p.in_baseline,
            anomaly: p.z_score > report.z_threshold,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
