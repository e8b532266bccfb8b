use std::error::Error;

use itertools::Itertools;
use ordered_float::NotNan;
use plotters::prelude::*;

use crate::models::abbreviate;
use crate::reshape::CountryTable;

/// Substitute 0.0 for missing cells, the policy the bar charts use.
fn fill_missing_with_zero(table: &CountryTable) -> CountryTable {
    let mut filled = table.clone();
    for row in &mut filled.rows {
        for value in &mut row.values {
            if value.is_none() {
                *value = Some(0.0);
            }
        }
    }
    filled
}

fn max_value(table: &CountryTable) -> f64 {
    table
        .rows
        .iter()
        .flat_map(|r| r.values.iter().flatten())
        .filter_map(|&v| NotNan::new(v).ok())
        .max()
        .map_or(0.0, NotNan::into_inner)
}

/// Equal-width binning for the histogram. Returns the lower bound, the bin
/// width, and the per-bin counts; every value lands in exactly one bin.
fn bin_values(values: &[f64], bins: usize) -> (f64, f64, Vec<u32>) {
    let min = values
        .iter()
        .filter_map(|&v| NotNan::new(v).ok())
        .min()
        .map_or(0.0, NotNan::into_inner);
    let max = values
        .iter()
        .filter_map(|&v| NotNan::new(v).ok())
        .max()
        .map_or(0.0, NotNan::into_inner);
    let span = max - min;
    let width = if span > 0.0 { span / bins as f64 } else { 1.0 };

    let mut counts = vec![0u32; bins];
    for &v in values {
        let mut bin = ((v - min) / width) as usize;
        if bin >= bins {
            bin = bins - 1;
        }
        counts[bin] += 1;
    }
    (min, width, counts)
}

/// Grouped bar chart for one indicator: countries on the x-axis, one colored
/// bar per year within each country group. Returns the filtered rows.
pub(crate) fn plot_bar_chart(
    by_countries: &CountryTable,
    countries: &[&str],
    indicator: &str,
    year_cols: &[&str],
    output_file: &str,
) -> Result<CountryTable, Box<dyn Error>> {
    let selected = fill_missing_with_zero(&by_countries.filter(countries, &[indicator], year_cols));
    if selected.rows.is_empty() {
        return Err(format!("no rows selected for '{}'", indicator).into());
    }

    let melted = selected.melt();
    let labels: Vec<String> = melted
        .iter()
        .map(|m| abbreviate(&m.country_name))
        .unique()
        .collect();
    let years = selected.years.clone();
    let slot = years.len() + 1; // bars per country plus a gap
    let y_max = (max_value(&selected) * 1.1).max(1.0);

    let root = BitMapBackend::new(output_file, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(indicator, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0..(labels.len() * slot) as u32, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_desc("Country")
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 13))
        .x_label_formatter(&|x| labels.get(*x as usize / slot).cloned().unwrap_or_default())
        .draw()?;

    for (yi, year) in years.iter().enumerate() {
        let color = Palette99::pick(yi).to_rgba();
        let bars: Vec<Rectangle<(u32, f64)>> = selected
            .rows
            .iter()
            .enumerate()
            .map(|(ci, row)| {
                let x0 = (ci * slot + yi) as u32;
                let value = row.values[yi].unwrap_or(0.0);
                Rectangle::new([(x0, 0.0), (x0 + 1, value)], color.filled())
            })
            .collect();
        chart
            .draw_series(bars)?
            .label(year.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 13))
        .draw()?;

    root.present()?;
    println!("Bar chart saved to '{}'", output_file);
    Ok(selected)
}

/// Same chart as [`plot_bar_chart`] with an explicit y-axis label.
pub(crate) fn plot_bar_chart_labeled(
    by_countries: &CountryTable,
    countries: &[&str],
    indicator: &str,
    year_cols: &[&str],
    output_file: &str,
) -> Result<CountryTable, Box<dyn Error>> {
    let selected = fill_missing_with_zero(&by_countries.filter(countries, &[indicator], year_cols));
    if selected.rows.is_empty() {
        return Err(format!("no rows selected for '{}'", indicator).into());
    }

    let melted = selected.melt();
    let labels: Vec<String> = melted
        .iter()
        .map(|m| abbreviate(&m.country_name))
        .unique()
        .collect();
    let years = selected.years.clone();
    let slot = years.len() + 1;
    let y_max = (max_value(&selected) * 1.1).max(1.0);

    let root = BitMapBackend::new(output_file, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(indicator, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0..(labels.len() * slot) as u32, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_desc("Country")
        .y_desc(indicator)
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 13))
        .x_label_formatter(&|x| labels.get(*x as usize / slot).cloned().unwrap_or_default())
        .draw()?;

    for (yi, year) in years.iter().enumerate() {
        let color = Palette99::pick(yi).to_rgba();
        let bars: Vec<Rectangle<(u32, f64)>> = selected
            .rows
            .iter()
            .enumerate()
            .map(|(ci, row)| {
                let x0 = (ci * slot + yi) as u32;
                let value = row.values[yi].unwrap_or(0.0);
                Rectangle::new([(x0, 0.0), (x0 + 1, value)], color.filled())
            })
            .collect();
        chart
            .draw_series(bars)?
            .label(year.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 13))
        .draw()?;

    root.present()?;
    println!("Bar chart saved to '{}'", output_file);
    Ok(selected)
}

/// One line per country of value vs. year for a single indicator, all on
/// shared axes. Missing values are skipped rather than plotted as zero.
pub(crate) fn plot_time_series(
    by_countries: &CountryTable,
    countries: &[&str],
    indicator: &str,
    year_cols: &[&str],
    output_file: &str,
) -> Result<(), Box<dyn Error>> {
    let selected = by_countries.filter(countries, &[indicator], year_cols);
    if selected.rows.is_empty() || selected.years.is_empty() {
        return Err(format!("no rows selected for '{}'", indicator).into());
    }

    let years: Vec<i32> = selected.years.iter().filter_map(|y| y.parse().ok()).collect();
    let values: Vec<f64> = selected
        .rows
        .iter()
        .flat_map(|r| r.values.iter().flatten().copied())
        .collect();
    if values.is_empty() {
        return Err(format!("no data points for '{}'", indicator).into());
    }
    let y_min = values
        .iter()
        .filter_map(|&v| NotNan::new(v).ok())
        .min()
        .map_or(0.0, NotNan::into_inner);
    let y_max = values
        .iter()
        .filter_map(|&v| NotNan::new(v).ok())
        .max()
        .map_or(0.0, NotNan::into_inner);
    let pad = ((y_max - y_min) * 0.1).max(0.1);

    let root = BitMapBackend::new(output_file, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Trends over time for {} in selected countries", indicator),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(
            years[0]..years[years.len() - 1],
            (y_min - pad)..(y_max + pad),
        )?;

    chart
        .configure_mesh()
        .x_labels(years.len())
        .x_desc("Year")
        .x_label_formatter(&|x| x.to_string())
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 13))
        .draw()?;

    for (ci, row) in selected.rows.iter().enumerate() {
        let color = Palette99::pick(ci).to_rgba();
        let points: Vec<(i32, f64)> = row
            .values
            .iter()
            .enumerate()
            .filter_map(|(yi, v)| v.map(|value| (years[yi], value)))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(abbreviate(&row.country_name))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 13))
        .draw()?;

    root.present()?;
    println!("Time series plot saved to '{}'", output_file);
    Ok(())
}

const HISTOGRAM_BINS: usize = 10;

/// Frequency histogram of one country's indicator values for a single year.
pub(crate) fn plot_histogram(
    by_countries: &CountryTable,
    country: &str,
    indicators: &[&str],
    year_col: &str,
    output_file: &str,
) -> Result<(), Box<dyn Error>> {
    let selected = by_countries.filter(&[country], indicators, &[year_col]);
    let melted = selected.melt();
    let values: Vec<f64> = melted.iter().filter_map(|m| m.value).collect();
    if values.is_empty() {
        return Err(format!("no numeric values for '{}' in {}", country, year_col).into());
    }

    let (min, width, counts) = bin_values(&values, HISTOGRAM_BINS);
    let y_max = counts.iter().max().copied().unwrap_or(0) + 1;

    let root = BitMapBackend::new(output_file, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Histogram of {} for year {}", country, year_col),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(50)
        .build_cartesian_2d(0..HISTOGRAM_BINS as u32, 0..y_max)?;

    chart
        .configure_mesh()
        .x_labels(HISTOGRAM_BINS)
        .x_desc("Values")
        .y_desc("Frequency")
        .axis_desc_style(("sans-serif", 16))
        .label_style(("sans-serif", 13))
        .x_label_formatter(&|x| format!("{:.2}", min + *x as f64 * width))
        .draw()?;

    let fill = RGBColor(70, 130, 180);
    chart.draw_series(counts.iter().enumerate().map(|(bin, &count)| {
        Rectangle::new(
            [(bin as u32, 0), (bin as u32 + 1, count)],
            fill.filled(),
        )
    }))?;

    root.present()?;
    println!("Histogram saved to '{}'", output_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndicatorSeries;

    fn series(country: &str, indicator: &str, values: Vec<Option<f64>>) -> IndicatorSeries {
        IndicatorSeries {
            index: 0,
            country_name: country.to_string(),
            country_code: String::new(),
            indicator_name: indicator.to_string(),
            values,
        }
    }

    #[test]
    fn bar_chart_input_substitutes_zero_for_missing() {
        let table = CountryTable {
            years: vec!["2000".to_string(), "2001".to_string()],
            rows: vec![series("Angola", "Forest area (sq. km)", vec![Some(4.0), None])],
        };
        let filled = fill_missing_with_zero(&table);
        assert_eq!(filled.rows[0].values, vec![Some(4.0), Some(0.0)]);

        let melted = filled.melt();
        assert_eq!(melted[1].value, Some(0.0));
    }

    #[test]
    fn max_value_ignores_missing_cells() {
        let table = CountryTable {
            years: vec!["2000".to_string(), "2001".to_string()],
            rows: vec![
                series("Angola", "Forest area (sq. km)", vec![Some(4.0), None]),
                series("Albania", "Forest area (sq. km)", vec![Some(7.5), Some(2.0)]),
            ],
        };
        assert_eq!(max_value(&table), 7.5);
    }

    #[test]
    fn binning_covers_every_value_exactly_once() {
        let values = vec![0.0, 0.5, 1.0, 2.5, 5.0, 7.5, 9.9, 10.0];
        let (min, width, counts) = bin_values(&values, 10);
        assert_eq!(min, 0.0);
        assert!((width - 1.0).abs() < 1e-12);
        assert_eq!(counts.iter().sum::<u32>() as usize, values.len());
        // The maximum lands in the last bin instead of overflowing.
        assert_eq!(counts[9], 2);
    }

    #[test]
    fn binning_handles_a_constant_sample() {
        let values = vec![3.0, 3.0, 3.0];
        let (min, width, counts) = bin_values(&values, 10);
        assert_eq!(min, 3.0);
        assert_eq!(width, 1.0);
        assert_eq!(counts[0], 3);
        assert_eq!(counts.iter().sum::<u32>(), 3);
    }
}
