// src/ingest/raw_table.rs

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{collections::HashMap, io::Write};
use tracing::{debug, warn};

use crate::model::Dataset;
use crate::normalize::FieldSource;

/// Delimiter and quoting convention of one tabular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormat {
    pub delimiter: u8,
    pub quoting: bool,
}

impl SourceFormat {
    /// Comma separated, double-quote quoting.
    pub const CSV: SourceFormat = SourceFormat {
        delimiter: b',',
        quoting: true,
    };

    /// Tab separated with quotes taken literally, as the SQL download writes it.
    pub const TSV_LITERAL: SourceFormat = SourceFormat {
        delimiter: b'\t',
        quoting: false,
    };

    pub fn for_dataset(dataset: Dataset) -> Self {
        match dataset {
            Dataset::Publisher => Self::TSV_LITERAL,
            Dataset::Hosting => Self::CSV,
        }
    }
}

/// A header row plus string cells, as read from one file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        let mut table = Self {
            headers: Vec::new(),
            rows: Vec::new(),
            index: HashMap::new(),
        };
        for h in headers {
            table.push_header(h);
        }
        table
    }

    fn push_header(&mut self, name: String) -> usize {
        let idx = self.headers.len();
        // duplicate names resolve to the first column
        self.index.entry(name.clone()).or_insert(idx);
        self.headers.push(name);
        idx
    }

    /// Parse `data` with a header row. Blank lines are skipped; rows that the
    /// tokenizer rejects are logged and skipped, never failing the table.
    pub fn parse(data: &[u8], format: &SourceFormat) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(format.delimiter)
            .quoting(format.quoting)
            .from_reader(data);

        let headers: Vec<String> = rdr
            .byte_headers()
            .context("reading header row")?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = String::from_utf8_lossy(h);
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.into_owned()
                }
            })
            .collect();
        let mut table = Self::new(headers);

        let mut skipped = 0usize;
        for (idx, result) in rdr.byte_records().enumerate() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(record = idx, error = %e, "skipping unreadable row");
                    skipped += 1;
                    continue;
                }
            };
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            table.rows.push(
                record
                    .iter()
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .collect(),
            );
        }

        debug!(
            columns = table.headers.len(),
            rows = table.rows.len(),
            skipped,
            "parsed table"
        );
        Ok(table)
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Index of `name`, appending an empty column if it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        match self.column(name) {
            Some(idx) => idx,
            None => self.push_header(name.to_string()),
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// Set a cell, padding short rows with empty cells.
    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = value.into();
        }
    }

    pub fn records(&self) -> impl Iterator<Item = RawRecord<'_>> + '_ {
        self.rows.iter().map(move |cells| RawRecord {
            table: self,
            cells,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write headers and rows, padding ragged rows to the header width.
    pub fn write_csv<W: Write>(&self, out: W, format: &SourceFormat) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .delimiter(format.delimiter)
            .flexible(true)
            .from_writer(out);
        wtr.write_record(&self.headers).context("writing header row")?;
        let width = self.headers.len();
        for cells in &self.rows {
            if cells.len() >= width {
                wtr.write_record(cells)?;
            } else {
                let mut padded = cells.clone();
                padded.resize(width, String::new());
                wtr.write_record(&padded)?;
            }
        }
        wtr.flush().context("flushing table")?;
        Ok(())
    }
}

/// One row of a [`RawTable`], looked up by column name.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    table: &'a RawTable,
    cells: &'a [String],
}

impl<'a> RawRecord<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column(column)?;
        self.cells.get(idx).map(String::as_str)
    }
}

impl FieldSource for RawRecord<'_> {
    fn field(&self, column: &str) -> Option<&str> {
        self.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unquoted_tsv_with_literal_quotes() -> Result<()> {
        let data = "publishingorgkey\tpublishername\ttotal_records\n\
                    k1\t\"Quoted\" Museum\t1,000\n\
                    \n\
                    k2\tHerbarium\n";
        let table = RawTable::parse(data.as_bytes(), &SourceFormat::TSV_LITERAL)?;
        assert_eq!(table.headers, vec!["publishingorgkey", "publishername", "total_records"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "publishername"), Some("\"Quoted\" Museum"));
        assert_eq!(table.get(0, "total_records"), Some("1,000"));
        // short row: the missing column is simply absent
        assert_eq!(table.get(1, "total_records"), None);
        Ok(())
    }

    #[test]
    fn parses_quoted_csv() -> Result<()> {
        let data = "hostingorganizationkey,publisherName,total_records\n\
                    h1,\"Museum, Natural History\",\"2,500\"\n";
        let table = RawTable::parse(data.as_bytes(), &SourceFormat::CSV)?;
        let rec = table.records().next().unwrap();
        assert_eq!(rec.get("publisherName"), Some("Museum, Natural History"));
        assert_eq!(rec.field("total_records"), Some("2,500"));
        assert_eq!(rec.field("missing"), None);
        Ok(())
    }

    #[test]
    fn strips_bom_and_tolerates_invalid_utf8() -> Result<()> {
        let mut data = b"\xef\xbb\xbfkey,name\n".to_vec();
        data.extend_from_slice(b"a,caf\xe9\n");
        let table = RawTable::parse(&data, &SourceFormat::CSV)?;
        assert_eq!(table.headers[0], "key");
        assert_eq!(table.len(), 1);
        assert!(table.get(0, "name").unwrap().starts_with("caf"));
        Ok(())
    }

    #[test]
    fn ensure_column_appends_and_writes_padded_rows() -> Result<()> {
        let mut table = RawTable::parse(b"a\tb\n1\t2\n3\n", &SourceFormat::TSV_LITERAL)?;
        let c = table.ensure_column("c");
        assert_eq!(c, 2);
        assert_eq!(table.ensure_column("a"), 0);
        table.set(0, c, "x");

        let mut out = Vec::new();
        table.write_csv(&mut out, &SourceFormat::CSV)?;
        assert_eq!(String::from_utf8(out)?, "a,b,c\n1,2,x\n3,,\n");
        Ok(())
    }
}
