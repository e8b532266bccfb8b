use std::collections::HashMap;

use serde::Serialize;

/// One data row of the raw indicator CSV, after the synthetic index has
/// been assigned. `values` is aligned with the owning table's year headers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRecord {
    pub(crate) index: usize,
    pub(crate) country_name: String,
    pub(crate) country_code: String,
    pub(crate) indicator_name: String,
    pub(crate) indicator_code: String,
    pub(crate) values: Vec<Option<f64>>,
}

/// One row of the country-indexed view. The indicator code is dropped when
/// the raw table is transposed, so it does not reappear here.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndicatorSeries {
    pub(crate) index: usize,
    pub(crate) country_name: String,
    pub(crate) country_code: String,
    pub(crate) indicator_name: String,
    pub(crate) values: Vec<Option<f64>>,
}

/// One aggregated row of the summary statistics table.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SummaryRow {
    #[serde(rename = "Country Name")]
    pub(crate) country_name: String,
    #[serde(rename = "Indicator Name")]
    pub(crate) indicator_name: String,
    #[serde(rename = "Year")]
    pub(crate) year: String,
    #[serde(rename = "Mean")]
    pub(crate) mean: Option<f64>,
    #[serde(rename = "Median")]
    pub(crate) median: Option<f64>,
    #[serde(rename = "Std")]
    pub(crate) std_dev: Option<f64>,
}

/// Short labels for the selected countries, used on chart axes and legends.
pub(crate) fn country_abbr() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("Africa Eastern and Southern", "AFE"),
        ("Afghanistan", "AFG"),
        ("Africa Western and Central", "AFW"),
        ("Angola", "ANG"),
        ("Albania", "ALB"),
        ("Andorra", "AND"),
        ("Arab World", "ARB"),
        ("United Arab Emirates", "ARE"),
        ("Argentina", "ARG"),
        ("Armenia", "ARM"),
    ])
}

/// Abbreviate a country name if we know it, otherwise keep it as-is.
pub(crate) fn abbreviate(name: &str) -> String {
    country_abbr()
        .get(name)
        .map_or_else(|| name.to_string(), |a| a.to_string())
}
