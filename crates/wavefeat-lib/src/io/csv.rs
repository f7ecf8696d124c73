use crate::waveforms::TabularSource;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;

/// Column-oriented view of a delimited text table with a header row.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    headers: Vec<String>,
    cells: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .context("reading header")?
            .iter()
            .map(str::to_string)
            .collect();
        let mut cells = vec![Vec::new(); headers.len()];
        for (row, record) in reader.records().enumerate() {
            let record: StringRecord =
                record.with_context(|| format!("reading record {}", row + 1))?;
            for (col, column) in cells.iter_mut().enumerate() {
                column.push(record.get(col).unwrap_or_default().to_string());
            }
        }
        Ok(Self { headers, cells })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Values of one column, failing if it is missing or holds a non-numeric cell.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing column '{}'", name))?;
        self.cells[idx]
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.parse::<f64>().with_context(|| {
                    format!("column '{}' row {} is not numeric: {}", name, row + 1, cell)
                })
            })
            .collect()
    }
}

impl TabularSource for CsvTable {
    /// Columns in which every cell parses as `f64`; the rest are skipped.
    fn numeric_columns(&self) -> Result<Vec<(String, Vec<f64>)>> {
        Ok(self
            .headers
            .iter()
            .filter_map(|name| self.column(name).ok().map(|values| (name.clone(), values)))
            .collect())
    }
}

/// Read a comma-separated file with a header row.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    CsvTable::from_reader(file, b',')
}

#[cfg(feature = "polars")]
pub mod polars_io {
    use crate::waveforms::TabularSource;
    use anyhow::Result;
    use polars::prelude::*;
    use std::path::Path;

    impl TabularSource for DataFrame {
        fn numeric_columns(&self) -> Result<Vec<(String, Vec<f64>)>> {
            let mut out = Vec::new();
            for s in self.get_columns() {
                if !s.dtype().is_numeric() {
                    continue;
                }
                let values = s.cast(&DataType::Float64)?;
                let values: Option<Vec<f64>> = values.f64()?.into_iter().collect();
                match values {
                    Some(values) => out.push((s.name().to_string(), values)),
                    None => anyhow::bail!("column '{}' contains nulls", s.name()),
                }
            }
            Ok(out)
        }
    }

    /// Load a CSV through polars into a `DataFrame`.
    pub fn load_frame(path: &Path) -> Result<DataFrame> {
        Ok(CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveforms::Waveforms;

    const SAMPLE: &str = "time,pressure,label\n0.0,80.0,a\n0.1, 108.1 ,b\n0.2,118.9,c\n";

    #[test]
    fn keeps_only_numeric_columns() {
        let table = CsvTable::from_reader(SAMPLE.as_bytes(), b',').unwrap();
        assert_eq!(table.rows(), 3);
        assert_eq!(table.headers(), &["time", "pressure", "label"]);
        let cols = table.numeric_columns().unwrap();
        let names: Vec<_> = cols.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["time", "pressure"]);
        assert_eq!(cols[1].1, vec![80.0, 108.1, 118.9]);
    }

    #[test]
    fn missing_or_text_column_is_an_error() {
        let table = CsvTable::from_reader(SAMPLE.as_bytes(), b',').unwrap();
        assert!(table.column("flow").is_err());
        let err = table.column("label").unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn tab_separated_tables_feed_the_container() {
        let tsv = "pressure\tflow\n80\t0.1\n120\t0.4\n";
        let table = CsvTable::from_reader(tsv.as_bytes(), b'\t').unwrap();
        let w = Waveforms::from_table(&table).unwrap();
        assert_eq!(w.len(), 2);
        assert_eq!(w.get_series("flow").unwrap().data, vec![0.1, 0.4]);
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abp.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        let table = read_csv_table(&path).unwrap();
        assert_eq!(table.column("pressure").unwrap().len(), 3);
        assert!(read_csv_table(&dir.path().join("missing.csv")).is_err());
    }
}
