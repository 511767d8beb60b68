use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use log::info;
use crate::error::ReportError;
use crate::simulator::AggregateCounters;

/// Default width of the longest bar on the chart, in characters
pub const CHART_WIDTH: usize = 50;

/// Formats the totals of a run as the plain text summary
///
/// # Examples
///
/// ```
/// use tiercache::report::render_summary;
/// use tiercache::simulator::AggregateCounters;
/// let summary = render_summary(&AggregateCounters::default());
/// assert!(summary.contains("Total Accesses: 0"));
/// assert!(summary.contains("Average Access Time: 0.000000 seconds"));
/// ```
pub fn render_summary(counters: &AggregateCounters) -> String {
    let mut out = String::new();
    // Writing to a String can't fail
    let _ = writeln!(out, "Cache Simulation Results");
    let _ = writeln!(out, "-----------------------");
    let _ = writeln!(out, "Total Accesses: {}", counters.accesses);
    let _ = writeln!(out, "L1 Hits: {}", counters.hits_l1);
    let _ = writeln!(out, "L1 Misses: {}", counters.misses_l1);
    let _ = writeln!(out, "L2 Hits: {}", counters.hits_l2);
    let _ = writeln!(out, "L2 Misses: {}", counters.misses_l2);
    let _ = writeln!(out, "Evictions: {}", counters.evictions);
    let _ = writeln!(out, "L1 Hit Rate: {:.2}%", counters.hit_rate_l1());
    let _ = writeln!(out, "L2 Hit Rate: {:.2}%", counters.hit_rate_l2());
    let _ = writeln!(out, "Average Access Time: {:.6} seconds", counters.mean_access_time().as_secs_f64());
    out
}

/// Draws the five counters as a horizontal bar chart, scaled so the largest is `width` wide
///
/// Non-zero counters always get at least one bar character
pub fn render_chart(counters: &AggregateCounters, width: usize) -> String {
    let values = counters.chart_values();
    let max = values.iter().map(|(_, value)| *value).max().unwrap_or(0);
    let label_width = values.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut out = String::from("Cache Performance\n");
    for (label, value) in values {
        let bar = if max == 0 {
            0
        } else {
            ((value as u128 * width as u128 + max as u128 / 2) / max as u128).max(u128::from(value > 0)) as usize
        };
        let _ = writeln!(out, "{label:>label_width$} | {} {value}", "#".repeat(bar));
    }
    out
}

/// The summary followed by the chart
pub fn render_report(counters: &AggregateCounters) -> String {
    format!("{}\n{}", render_summary(counters), render_chart(counters, CHART_WIDTH))
}

/// Writes the full report to a file. The counters are only read, a failed write leaves them as
/// they were
pub fn write_report(path: &Path, counters: &AggregateCounters) -> Result<(), ReportError> {
    fs::write(path, render_report(counters)).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Results saved to {}", path.display());
    Ok(())
}
