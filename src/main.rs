mod eda;
mod eda_statistics;
mod load_clean;
mod models;
mod reshape;

use std::error::Error;

use itertools::Itertools;

use eda::{plot_bar_chart, plot_bar_chart_labeled, plot_histogram, plot_time_series};
use eda_statistics::{calculate_summary, create_correlation_heatmap, print_summary, write_summary};
use load_clean::read_data;

const DATA_FILE: &str = "data/climate_data.csv";
const INDEXED_COPY_FILE: &str = "climate_data_indexed.csv";
const SUMMARY_FILE: &str = "summary_stats.csv";

const GREENHOUSE_BAR_FILE: &str = "greenhouse_gas_bar_chart.png";
const CO2_BAR_FILE: &str = "co2_per_capita_bar_chart.png";
const HEATMAP_FILE: &str = "indicator_correlation_heatmap.png";
const TIME_SERIES_FILE: &str = "population_growth_time_series.png";
const HISTOGRAM_FILE: &str = "argentina_2001_histogram.png";

const COUNTRIES: [&str; 10] = [
    "Africa Eastern and Southern",
    "Afghanistan",
    "Africa Western and Central",
    "Angola",
    "Albania",
    "Andorra",
    "Arab World",
    "United Arab Emirates",
    "Argentina",
    "Armenia",
];

const INDICATORS: [&str; 5] = [
    "Total greenhouse gas emissions (kt of CO2 equivalent)",
    "Population growth (annual %)",
    "Forest area (sq. km)",
    "CO2 emissions (metric tons per capita)",
    "Arable land (% of land area)",
];

const YEAR_COLS: [&str; 6] = ["2000", "2001", "2002", "2003", "2004", "2005"];

const HEATMAP_COUNTRY: &str = "Arab World";
const HISTOGRAM_COUNTRY: &str = "Argentina";
const HISTOGRAM_YEAR: &str = "2001";

fn main() -> Result<(), Box<dyn Error>> {
    let (by_years, by_countries) = read_data(DATA_FILE, INDEXED_COPY_FILE)?;
    println!(
        "Year-indexed view spans {} years across {} series",
        by_years.years.len(),
        by_years.series.len()
    );

    plot_bar_chart(
        &by_countries,
        &COUNTRIES,
        INDICATORS[0],
        &YEAR_COLS,
        GREENHOUSE_BAR_FILE,
    )?;
    let selected_data = plot_bar_chart_labeled(
        &by_countries,
        &COUNTRIES,
        INDICATORS[3],
        &YEAR_COLS,
        CO2_BAR_FILE,
    )?;

    let unique_countries: Vec<&str> = selected_data
        .rows
        .iter()
        .map(|r| r.country_name.as_str())
        .unique()
        .collect();
    println!("Selected countries: {:?}", unique_countries);
    println!("Selected year columns: {:?}", selected_data.years);

    create_correlation_heatmap(
        &by_countries,
        HEATMAP_COUNTRY,
        &INDICATORS,
        &YEAR_COLS,
        HEATMAP_FILE,
    )?;

    plot_time_series(
        &by_countries,
        &COUNTRIES,
        INDICATORS[1],
        &YEAR_COLS,
        TIME_SERIES_FILE,
    )?;

    let summary = calculate_summary(&by_countries, &COUNTRIES, &INDICATORS, &YEAR_COLS)?;
    print_summary(&summary);
    write_summary(&summary, SUMMARY_FILE)?;

    plot_histogram(
        &by_countries,
        HISTOGRAM_COUNTRY,
        &INDICATORS,
        HISTOGRAM_YEAR,
        HISTOGRAM_FILE,
    )?;

    Ok(())
}
