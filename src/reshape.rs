use crate::models::{IndicatorSeries, RawRecord};

/// The raw table as parsed from the CSV: metadata plus every trailing
/// column, whether or not its header is a year.
#[derive(Debug, Clone)]
pub(crate) struct RawTable {
    pub(crate) year_headers: Vec<String>,
    pub(crate) rows: Vec<RawRecord>,
}

/// Identity of one (country, indicator) series in the year-indexed view.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeriesKey {
    pub(crate) index: usize,
    pub(crate) country_name: String,
    pub(crate) country_code: String,
    pub(crate) indicator_name: String,
}

/// The table transposed so years are the primary axis. Only columns whose
/// header parses as an integer year survive the transpose.
#[derive(Debug, Clone)]
pub(crate) struct YearTable {
    pub(crate) years: Vec<i32>,
    pub(crate) series: Vec<SeriesKey>,
    /// values[y][s] is the value of series `s` in year `years[y]`.
    pub(crate) values: Vec<Vec<Option<f64>>>,
}

/// The transpose of [`YearTable`]: one row per (country, indicator), one
/// column per numeric year. Everything downstream filters this view.
#[derive(Debug, Clone)]
pub(crate) struct CountryTable {
    pub(crate) years: Vec<String>,
    pub(crate) rows: Vec<IndicatorSeries>,
}

/// One row of a melted (long form) table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MeltRow {
    pub(crate) country_name: String,
    pub(crate) indicator_name: String,
    pub(crate) year: String,
    pub(crate) value: Option<f64>,
}

impl YearTable {
    /// Transpose the raw table onto the year axis, keeping only columns
    /// whose header parses as an integer. The indicator code does not
    /// survive the transpose.
    pub(crate) fn from_raw(raw: &RawTable) -> YearTable {
        let mut years = Vec::new();
        let mut positions = Vec::new();
        for (pos, header) in raw.year_headers.iter().enumerate() {
            if let Ok(year) = header.trim().parse::<i32>() {
                years.push(year);
                positions.push(pos);
            }
        }

        let series: Vec<SeriesKey> = raw
            .rows
            .iter()
            .map(|r| SeriesKey {
                index: r.index,
                country_name: r.country_name.clone(),
                country_code: r.country_code.clone(),
                indicator_name: r.indicator_name.clone(),
            })
            .collect();

        let values: Vec<Vec<Option<f64>>> = positions
            .iter()
            .map(|&pos| raw.rows.iter().map(|r| r.values[pos]).collect())
            .collect();

        YearTable { years, series, values }
    }
}

impl CountryTable {
    /// Transpose the year-indexed view back to one row per
    /// (country, indicator).
    pub(crate) fn from_year_table(by_years: &YearTable) -> CountryTable {
        let years: Vec<String> = by_years.years.iter().map(|y| y.to_string()).collect();
        let rows = by_years
            .series
            .iter()
            .enumerate()
            .map(|(s, key)| IndicatorSeries {
                index: key.index,
                country_name: key.country_name.clone(),
                country_code: key.country_code.clone(),
                indicator_name: key.indicator_name.clone(),
                values: by_years.values.iter().map(|row| row[s]).collect(),
            })
            .collect();
        CountryTable { years, rows }
    }

    /// Select rows by country/indicator membership and restrict the columns
    /// to the requested years. Names or years absent from the table simply
    /// narrow the selection; they are not an error.
    pub(crate) fn filter(
        &self,
        countries: &[&str],
        indicators: &[&str],
        year_cols: &[&str],
    ) -> CountryTable {
        let col_positions: Vec<usize> = year_cols
            .iter()
            .filter_map(|y| self.years.iter().position(|h| h == y))
            .collect();
        let years: Vec<String> = col_positions.iter().map(|&p| self.years[p].clone()).collect();

        let rows = self
            .rows
            .iter()
            .filter(|r| {
                countries.contains(&r.country_name.as_str())
                    && indicators.contains(&r.indicator_name.as_str())
            })
            .map(|r| IndicatorSeries {
                index: r.index,
                country_name: r.country_name.clone(),
                country_code: r.country_code.clone(),
                indicator_name: r.indicator_name.clone(),
                values: col_positions.iter().map(|&p| r.values[p]).collect(),
            })
            .collect();

        CountryTable { years, rows }
    }

    /// Unpivot into long form: one row per (country, indicator, year).
    pub(crate) fn melt(&self) -> Vec<MeltRow> {
        let mut melted = Vec::with_capacity(self.rows.len() * self.years.len());
        for row in &self.rows {
            for (y, year) in self.years.iter().enumerate() {
                melted.push(MeltRow {
                    country_name: row.country_name.clone(),
                    indicator_name: row.indicator_name.clone(),
                    year: year.clone(),
                    value: row.values[y],
                });
            }
        }
        melted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw() -> RawTable {
        let mk = |index: usize, country: &str, code: &str, indicator: &str, values: Vec<Option<f64>>| RawRecord {
            index,
            country_name: country.to_string(),
            country_code: code.to_string(),
            indicator_name: indicator.to_string(),
            indicator_code: "X.Y.Z".to_string(),
            values,
        };
        RawTable {
            year_headers: vec!["2000".to_string(), "2001".to_string(), "Notes".to_string()],
            rows: vec![
                mk(1, "Argentina", "ARG", "Population growth (annual %)", vec![Some(1.1), Some(1.2), None]),
                mk(2, "Argentina", "ARG", "Forest area (sq. km)", vec![Some(3.0), None, Some(9.0)]),
                mk(3, "Albania", "ALB", "Population growth (annual %)", vec![Some(-0.3), Some(-0.4), None]),
            ],
        }
    }

    #[test]
    fn year_view_keeps_only_numeric_headers() {
        let by_years = YearTable::from_raw(&make_raw());
        assert_eq!(by_years.years, vec![2000, 2001]);
        assert_eq!(by_years.series.len(), 3);
        // Row per year, column per series.
        assert_eq!(by_years.values.len(), 2);
        assert_eq!(by_years.values[0], vec![Some(1.1), Some(3.0), Some(-0.3)]);
        assert_eq!(by_years.values[1], vec![Some(1.2), None, Some(-0.4)]);
    }

    #[test]
    fn year_view_columns_match_country_view_numeric_columns() {
        let by_years = YearTable::from_raw(&make_raw());
        let by_countries = CountryTable::from_year_table(&by_years);
        let numeric: Vec<i32> = by_countries
            .years
            .iter()
            .filter_map(|h| h.parse::<i32>().ok())
            .collect();
        assert_eq!(by_years.years, numeric);
        assert_eq!(by_countries.years.len(), numeric.len());
    }

    #[test]
    fn transpose_round_trip_reproduces_rows() {
        let raw = make_raw();
        let by_years = YearTable::from_raw(&raw);
        let by_countries = CountryTable::from_year_table(&by_years);

        assert_eq!(by_countries.rows.len(), raw.rows.len());
        for (row, original) in by_countries.rows.iter().zip(&raw.rows) {
            assert_eq!(row.index, original.index);
            assert_eq!(row.country_name, original.country_name);
            assert_eq!(row.indicator_name, original.indicator_name);
            // Values restricted to the numeric year columns.
            assert_eq!(row.values, original.values[..2].to_vec());
        }
    }

    #[test]
    fn filter_with_absent_country_narrows_instead_of_failing() {
        let by_countries = CountryTable::from_year_table(&YearTable::from_raw(&make_raw()));
        let selected = by_countries.filter(
            &["Argentina", "Atlantis"],
            &["Population growth (annual %)"],
            &["2000", "2001"],
        );
        let countries: Vec<&str> = selected.rows.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(countries, vec!["Argentina"]);
    }

    #[test]
    fn filter_with_absent_year_drops_the_column() {
        let by_countries = CountryTable::from_year_table(&YearTable::from_raw(&make_raw()));
        let selected = by_countries.filter(&["Argentina"], &["Forest area (sq. km)"], &["2001", "2099"]);
        assert_eq!(selected.years, vec!["2001".to_string()]);
        assert_eq!(selected.rows[0].values, vec![None]);
    }

    #[test]
    fn melt_yields_numeric_values_in_long_form() {
        let by_countries = CountryTable::from_year_table(&YearTable::from_raw(&make_raw()));
        let selected = by_countries.filter(&["Argentina"], &["Population growth (annual %)"], &["2001"]);
        let melted = selected.melt();
        assert_eq!(
            melted,
            vec![MeltRow {
                country_name: "Argentina".to_string(),
                indicator_name: "Population growth (annual %)".to_string(),
                year: "2001".to_string(),
                value: Some(1.2),
            }]
        );
    }
}
