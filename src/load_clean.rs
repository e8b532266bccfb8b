use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};

use csv::{ReaderBuilder, WriterBuilder};

use crate::models::RawRecord;
use crate::reshape::{CountryTable, RawTable, YearTable};

/// Non-data banner lines at the top of a World Bank indicator export.
const BANNER_LINES: usize = 3;

const METADATA_COLUMNS: [&str; 4] = [
    "Country Name",
    "Country Code",
    "Indicator Name",
    "Indicator Code",
];

/// Load the indicator CSV, number the rows, persist an indexed copy of the
/// raw table, and return the two reshaped views.
pub(crate) fn read_data(
    file_path: &str,
    indexed_out: &str,
) -> Result<(YearTable, CountryTable), Box<dyn Error>> {
    let raw = load_raw_table(file_path)?;
    write_indexed_copy(&raw, indexed_out)?;

    let total_cells = raw.rows.len() * raw.year_headers.len();
    let missing: usize = raw
        .rows
        .iter()
        .map(|r| r.values.iter().filter(|v| v.is_none()).count())
        .sum();
    println!(
        "Loaded {} rows over {} year columns ({} of {} cells missing)",
        raw.rows.len(),
        raw.year_headers.len(),
        missing,
        total_cells
    );

    let by_years = YearTable::from_raw(&raw);
    let by_countries = CountryTable::from_year_table(&by_years);
    Ok((by_years, by_countries))
}

fn load_raw_table(file_path: &str) -> Result<RawTable, Box<dyn Error>> {
    // The banner is not CSV data: skip it line by line, then hand the rest
    // to the CSV reader with the real header up front.
    let mut buffered = BufReader::new(File::open(file_path)?);
    let mut banner = String::new();
    for _ in 0..BANNER_LINES {
        banner.clear();
        if buffered.read_line(&mut banner)? == 0 {
            return Err(format!(
                "'{}' is too short: expected {} banner lines followed by a header",
                file_path, BANNER_LINES
            )
            .into());
        }
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(buffered);

    let header = reader.headers()?.clone();
    let mut metadata_positions = Vec::with_capacity(METADATA_COLUMNS.len());
    for name in METADATA_COLUMNS {
        let pos = header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| format!("'{}' is missing the '{}' column", file_path, name))?;
        metadata_positions.push(pos);
    }

    // Everything that is not one of the four metadata columns is treated as
    // a year column, in file order.
    let year_columns: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter(|(pos, _)| !metadata_positions.contains(pos))
        .map(|(pos, name)| (pos, name.trim().to_string()))
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let field = |pos: usize| record.get(pos).unwrap_or("").trim().to_string();
        let values = year_columns
            .iter()
            .map(|&(pos, _)| record.get(pos).and_then(|cell| cell.trim().parse::<f64>().ok()))
            .collect();
        rows.push(RawRecord {
            index: i + 1,
            country_name: field(metadata_positions[0]),
            country_code: field(metadata_positions[1]),
            indicator_name: field(metadata_positions[2]),
            indicator_code: field(metadata_positions[3]),
            values,
        });
    }

    Ok(RawTable {
        year_headers: year_columns.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}

/// Write the raw table, plus the synthetic `Index` column, to a new CSV.
fn write_indexed_copy(raw: &RawTable, output_file: &str) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().from_path(output_file)?;

    let mut header = vec!["Index".to_string()];
    header.extend(METADATA_COLUMNS.iter().map(|c| c.to_string()));
    header.extend(raw.year_headers.iter().cloned());
    wtr.write_record(&header)?;

    for row in &raw.rows {
        let mut record = vec![
            row.index.to_string(),
            row.country_name.clone(),
            row.country_code.clone(),
            row.indicator_name.clone(),
            row.indicator_code.clone(),
        ];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map_or_else(String::new, |x| x.to_string())),
        );
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    println!("Indexed copy of the raw table saved to '{}'", output_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = "\
Data Source,World Development Indicators
Last Updated Date,2023-01-01

Country Name,Country Code,Indicator Name,Indicator Code,2000,2001,2002
Argentina,ARG,Population growth (annual %),SP.POP.GROW,1.1,1.2,1.13
Albania,ALB,Population growth (annual %),SP.POP.GROW,-0.3,,-0.5
Argentina,ARG,Forest area (sq. km),AG.LND.FRST.K2,287750,,285870
";

    #[test]
    fn banner_and_header_are_skipped_and_rows_are_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("climate.csv");
        fs::write(&input, SAMPLE).unwrap();

        let raw = load_raw_table(input.to_str().unwrap()).unwrap();
        // 7 input lines, 3 banner lines and a header: 3 data rows remain.
        assert_eq!(raw.rows.len(), SAMPLE.lines().count() - 4);
        let indices: Vec<usize> = raw.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(raw.year_headers, vec!["2000", "2001", "2002"]);
        assert_eq!(raw.rows[1].values, vec![Some(-0.3), None, Some(-0.5)]);
    }

    #[test]
    fn indexed_copy_round_trips_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("climate.csv");
        let output = dir.path().join("indexed.csv");
        fs::write(&input, SAMPLE).unwrap();

        let raw = load_raw_table(input.to_str().unwrap()).unwrap();
        write_indexed_copy(&raw, output.to_str().unwrap()).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Index,Country Name,Country Code,Indicator Name,Indicator Code,2000,2001,2002"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("1,Argentina,ARG,"));
        // The missing Albania cell stays empty rather than becoming zero.
        let second = lines.next().unwrap();
        assert!(second.contains(",-0.3,,-0.5"));
    }

    #[test]
    fn read_data_builds_both_views() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("climate.csv");
        let output = dir.path().join("indexed.csv");
        fs::write(&input, SAMPLE).unwrap();

        let (by_years, by_countries) =
            read_data(input.to_str().unwrap(), output.to_str().unwrap()).unwrap();
        assert_eq!(by_years.years, vec![2000, 2001, 2002]);
        assert_eq!(by_countries.rows.len(), 3);
        assert_eq!(by_countries.years, vec!["2000", "2001", "2002"]);
    }

    #[test]
    fn truncated_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("short.csv");
        fs::write(&input, "Data Source,WDI\nLast Updated,2023\n").unwrap();

        assert!(load_raw_table(input.to_str().unwrap()).is_err());
    }

    #[test]
    fn missing_metadata_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.csv");
        fs::write(
            &input,
            "a\nb\nc\nCountry Name,Country Code,Indicator Code,2000\nArgentina,ARG,SP.POP.GROW,1.1\n",
        )
        .unwrap();

        let err = load_raw_table(input.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Indicator Name"));
    }
}
