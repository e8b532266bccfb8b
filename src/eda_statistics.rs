use std::error::Error;

use csv::WriterBuilder;
use itertools::Itertools;
use ndarray::{Array2, ArrayView1};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use statrs::statistics::{Data, Distribution, Median};

use crate::models::SummaryRow;
use crate::reshape::CountryTable;

/// Summary statistics per (country, indicator, year) over the selection.
///
/// Missing values are replaced with the per-year-column mean of the
/// already-filtered subset before aggregating; a column with no values at
/// all stays missing. An empty selection is an error.
pub(crate) fn calculate_summary(
    by_countries: &CountryTable,
    countries: &[&str],
    indicators: &[&str],
    year_cols: &[&str],
) -> Result<Vec<SummaryRow>, Box<dyn Error>> {
    let selected = by_countries.filter(countries, indicators, year_cols);
    if selected.rows.is_empty() {
        return Err("no rows selected for the summary statistics".into());
    }

    let column_means: Vec<Option<f64>> = (0..selected.years.len())
        .map(|c| {
            let present: Vec<f64> = selected.rows.iter().filter_map(|r| r.values[c]).collect();
            if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect();

    let mut rows = selected.rows.clone();
    for row in &mut rows {
        for (c, value) in row.values.iter_mut().enumerate() {
            if value.is_none() {
                *value = column_means[c];
            }
        }
    }
    rows.sort_by(|a, b| {
        (a.country_name.as_str(), a.indicator_name.as_str())
            .cmp(&(b.country_name.as_str(), b.indicator_name.as_str()))
    });

    let mut summary = Vec::new();
    for ((country, indicator), group) in &rows
        .iter()
        .chunk_by(|r| (r.country_name.clone(), r.indicator_name.clone()))
    {
        let members: Vec<_> = group.collect();
        for (c, year) in selected.years.iter().enumerate() {
            let values: Vec<f64> = members.iter().filter_map(|r| r.values[c]).collect();
            if values.is_empty() {
                summary.push(SummaryRow {
                    country_name: country.clone(),
                    indicator_name: indicator.clone(),
                    year: year.clone(),
                    mean: None,
                    median: None,
                    std_dev: None,
                });
                continue;
            }
            let std_dev = if values.len() > 1 {
                Data::new(values.clone()).std_dev()
            } else {
                // The sample standard deviation of one observation is
                // undefined; it serializes as an empty cell.
                None
            };
            let data = Data::new(values);
            summary.push(SummaryRow {
                country_name: country.clone(),
                indicator_name: indicator.clone(),
                year: year.clone(),
                mean: data.mean(),
                median: Some(data.median()),
                std_dev,
            });
        }
    }

    Ok(summary)
}

pub(crate) fn print_summary(summary: &[SummaryRow]) {
    let fmt = |v: Option<f64>| v.map_or_else(String::new, |x| format!("{:.4}", x));
    println!(
        "{:<28} {:<55} {:>6} {:>16} {:>16} {:>16}",
        "Country Name", "Indicator Name", "Year", "Mean", "Median", "Std"
    );
    for row in summary {
        println!(
            "{:<28} {:<55} {:>6} {:>16} {:>16} {:>16}",
            row.country_name,
            row.indicator_name,
            row.year,
            fmt(row.mean),
            fmt(row.median),
            fmt(row.std_dev),
        );
    }
}

pub(crate) fn write_summary(summary: &[SummaryRow], output_file: &str) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().from_path(output_file)?;
    for row in summary {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    println!("Summary statistics saved to '{}'", output_file);
    Ok(())
}

/// Correlation between two columns over pairwise-complete observations.
fn pairwise_correlation(x: &ArrayView1<f64>, y: &ArrayView1<f64>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let x_mean = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let y_mean = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let numerator: f64 = pairs.iter().map(|(a, b)| (a - x_mean) * (b - y_mean)).sum();
    let denominator_x = pairs.iter().map(|(a, _)| (a - x_mean).powi(2)).sum::<f64>().sqrt();
    let denominator_y = pairs.iter().map(|(_, b)| (b - y_mean).powi(2)).sum::<f64>().sqrt();
    if denominator_x > 0.0 && denominator_y > 0.0 {
        Some(numerator / (denominator_x * denominator_y))
    } else {
        None
    }
}

/// Map a correlation in [-1, 1] onto a yellow-to-red ramp.
fn heat_color(value: f64) -> RGBColor {
    let t = ((value + 1.0) / 2.0).clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64| (a + t * (b - a)) as u8;
    RGBColor(lerp(255.0, 189.0), lerp(255.0, 0.0), lerp(178.0, 38.0))
}

fn short_label(labels: &[String], idx: usize) -> String {
    match labels.get(idx) {
        Some(label) if label.chars().count() > 18 => {
            let head: String = label.chars().take(18).collect();
            format!("{}...", head)
        }
        Some(label) => label.clone(),
        None => String::new(),
    }
}

/// Annotated heatmap of the pairwise correlations between the selected
/// indicators for a single country, on a fixed [-1, 1] color scale.
pub(crate) fn create_correlation_heatmap(
    by_countries: &CountryTable,
    country: &str,
    indicators: &[&str],
    year_cols: &[&str],
    output_file: &str,
) -> Result<(), Box<dyn Error>> {
    let selected = by_countries.filter(&[country], indicators, year_cols);
    if selected.rows.is_empty() {
        return Err(format!("no indicator rows selected for '{}'", country).into());
    }

    // Pivot: one column per indicator, one row per year.
    let labels: Vec<String> = selected.rows.iter().map(|r| r.indicator_name.clone()).collect();
    let cols = labels.len();
    let mut pivoted = Array2::<f64>::from_elem((selected.years.len(), cols), f64::NAN);
    for (s, row) in selected.rows.iter().enumerate() {
        for (y, value) in row.values.iter().enumerate() {
            if let Some(v) = value {
                pivoted[(y, s)] = *v;
            }
        }
    }

    let mut corr = Array2::<f64>::zeros((cols, cols));
    for i in 0..cols {
        for j in 0..cols {
            let c = pairwise_correlation(&pivoted.column(i), &pivoted.column(j)).unwrap_or(0.0);
            corr[(i, j)] = c;
        }
    }

    let root = BitMapBackend::new(output_file, (900, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Correlation between selected indicators for {}", country),
            ("sans-serif", 22),
        )
        .margin(10)
        .x_label_area_size(140)
        .y_label_area_size(140)
        .build_cartesian_2d(0f64..cols as f64, 0f64..cols as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols)
        .y_labels(cols)
        .x_label_formatter(&|x| short_label(&labels, x.floor() as usize))
        .y_label_formatter(&|y| {
            short_label(&labels, (cols as f64 - 1.0 - y.floor()).max(0.0) as usize)
        })
        .label_style(("sans-serif", 13))
        .draw()?;

    let annotation = TextStyle::from(("sans-serif", 15).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center))
        .color(&BLACK);
    for i in 0..cols {
        for j in 0..cols {
            let value = corr[(i, j)];
            let (x0, y0) = (j as f64, (cols - 1 - i) as f64);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x0, y0), (x0 + 1.0, y0 + 1.0)],
                heat_color(value).filled(),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.2}", value),
                (x0 + 0.5, y0 + 0.5),
                annotation.clone(),
            )))?;
        }
    }

    root.present()?;
    println!("Correlation heatmap saved to '{}'", output_file);
    Ok(())
}
