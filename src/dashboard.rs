use crate::record::Division;
use crate::store::StoredRecord;
use serde::Serialize;

#[cfg(feature = "web")]
use plotters::prelude::*;
#[cfg(feature = "web")]
use std::fs::remove_file;

/// Record count of one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainCount {
    /// Domain name
    pub domain: String,

    /// Number of records in the domain
    pub count: usize,
}

/// SME coverage of one division
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivisionCoverage {
    /// Division label
    pub division: String,

    /// Records with a real contact for this division
    pub with_contact: usize,

    /// Total records
    pub total: usize,
}

/// Count records per domain
///
/// Domains appear in the order first encountered in the record set, which
/// matches the sheet order of the source workbook.
///
/// # Arguments
/// * `records` - The full record set
///
/// # Returns
/// * `Vec<DomainCount>` - One entry per domain present
pub fn domain_counts(records: &[StoredRecord]) -> Vec<DomainCount> {
    let mut counts: Vec<DomainCount> = Vec::new();

    for stored in records {
        match counts
            .iter()
            .position(|c| c.domain == stored.record.domain)
        {
            Some(i) => counts[i].count += 1,
            None => counts.push(DomainCount {
                domain: stored.record.domain.clone(),
                count: 1,
            }),
        }
    }

    counts
}

/// Measure SME coverage per division
///
/// A record counts as covered for a division when its contact for that
/// division is non-blank and not the null marker (the same rule the has-SME
/// search filter applies to the global contact).
///
/// # Arguments
/// * `records` - The full record set
///
/// # Returns
/// * `Vec<DivisionCoverage>` - One entry per division, in workbook order
pub fn division_coverage(records: &[StoredRecord]) -> Vec<DivisionCoverage> {
    Division::ALL
        .iter()
        .map(|division| {
            let with_contact = records
                .iter()
                .filter(|stored| {
                    let contact = stored.record.division_sme(*division).trim();
                    !contact.is_empty()
                        && !contact.eq_ignore_ascii_case(crate::record::NULL_MARKER)
                })
                .count();

            DivisionCoverage {
                division: division.label().to_string(),
                with_contact,
                total: records.len(),
            }
        })
        .collect()
}

/// Styling options for dashboard charts
#[cfg(feature = "web")]
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

#[cfg(feature = "web")]
impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Capability Dashboard".to_string(),
            y_label: "Records".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Render the records-per-domain bar chart
///
/// # Arguments
/// * `counts` - Per-domain counts, as returned by [`domain_counts`]
/// * `options` - Chart styling options
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
#[cfg(feature = "web")]
pub fn domain_chart_png(
    counts: &[DomainCount],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let bars: Vec<(String, usize)> = counts
        .iter()
        .map(|c| (c.domain.clone(), c.count))
        .collect();

    render_bar_chart(&bars, options)
}

/// Render the SME-coverage-per-division bar chart
///
/// # Arguments
/// * `coverage` - Per-division coverage, as returned by [`division_coverage`]
/// * `options` - Chart styling options
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
#[cfg(feature = "web")]
pub fn division_chart_png(
    coverage: &[DivisionCoverage],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let bars: Vec<(String, usize)> = coverage
        .iter()
        .map(|c| (c.division.clone(), c.with_contact))
        .collect();

    render_bar_chart(&bars, options)
}

/// Draw labeled vertical bars into a PNG buffer
///
/// Renders through a temporary file-based bitmap backend and reads the
/// bytes back, then removes the file.
#[cfg(feature = "web")]
fn render_bar_chart(
    bars: &[(String, usize)],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let filename = std::env::temp_dir().join(format!("capsearch_chart_{}.png", std::process::id()));
    {
        let root = BitMapBackend::new(&filename, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let max_y = bars.iter().map(|(_, v)| *v).max().unwrap_or(1).max(1);
        let x_range = 0f64..bars.len().max(1) as f64;
        let y_range = 0f64..max_y as f64 + 1.0;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range, y_range)?;

        let labels: Vec<String> = bars.iter().map(|(label, _)| label.clone()).collect();

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len().max(1))
            .x_label_formatter(&|x| {
                let i = *x as usize;
                labels.get(i).cloned().unwrap_or_default()
            })
            .y_desc(&options.y_label)
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
            Rectangle::new(
                [(i as f64 + 0.15, 0.0), (i as f64 + 0.85, *value as f64)],
                BLUE.filled(),
            )
        }))?;

        root.present()?;
    }

    let mut file = std::fs::File::open(&filename)?;
    let mut buffer = Vec::new();
    use std::io::Read;
    file.read_to_end(&mut buffer)?;
    remove_file(&filename)?;
    Ok(buffer)
}
