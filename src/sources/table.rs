// Header-led CSV tables with columns addressed by name.

use std::collections::HashMap;
use std::path::Path;

use crate::error::SourceError;
use crate::models::Timestamp;

/// Timestamp column names, in lookup order. sar tables use `#timestamp`;
/// tables behind a `#site,host,...` header carry a plain `timestamp`.
const TIMESTAMP_COLUMNS: [&str; 2] = ["#timestamp", "timestamp"];

#[derive(Debug, Default)]
pub struct RawTable {
    columns: HashMap<String, usize>,
    width: usize,
    rows: Vec<(usize, Vec<String>)>,
}

impl RawTable {
    /// Reads `path`; a file that does not exist is `SourceError::Missing`.
    pub fn read(path: &Path) -> Result<Self, SourceError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SourceError::Missing(path.to_path_buf()))
            }
            Err(e) => Err(SourceError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// First non-blank line is the header. Line numbers are 1-based and count blank lines.
    pub fn parse(text: &str) -> Self {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .filter(|(_, l)| !l.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            return Self::default();
        };
        let names = split_record(header);
        let columns = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.trim().to_string(), i))
            .collect();
        let rows = lines.map(|(n, l)| (n, split_record(l))).collect();

        Self {
            columns,
            width: names.len(),
            rows,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose field count disagrees with the header come back as `Malformed`.
    pub fn rows(&self) -> impl Iterator<Item = Result<Row<'_>, SourceError>> {
        self.rows.iter().map(move |(line, fields)| {
            if fields.len() != self.width {
                return Err(SourceError::malformed(
                    *line,
                    format!("expected {} fields, found {}", self.width, fields.len()),
                ));
            }
            Ok(Row {
                table: self,
                line: *line,
                fields,
            })
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a RawTable,
    pub line: usize,
    fields: &'a [String],
}

impl<'a> Row<'a> {
    /// Raw cell text, trimmed. `None` when the table has no such column.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = *self.table.columns.get(column)?;
        self.fields.get(idx).map(|s| s.trim())
    }

    pub fn text(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }

    /// Absent column or empty cell reads as zero; unparseable text is malformed.
    pub fn number(&self, column: &str) -> Result<f64, SourceError> {
        match self.get(column) {
            None | Some("") => Ok(0.0),
            Some(v) => v.parse::<f64>().map_err(|_| {
                SourceError::malformed(self.line, format!("{column}: not a number: {v:?}"))
            }),
        }
    }

    /// Like `number`, but the column must be present and non-empty.
    pub fn required_number(&self, column: &str) -> Result<f64, SourceError> {
        match self.get(column) {
            None | Some("") => Err(SourceError::malformed(
                self.line,
                format!("missing {column}"),
            )),
            Some(_) => self.number(column),
        }
    }

    pub fn timestamp(&self) -> Result<Timestamp, SourceError> {
        let raw = TIMESTAMP_COLUMNS
            .iter()
            .find_map(|c| self.get(c).filter(|v| !v.is_empty()))
            .ok_or_else(|| SourceError::malformed(self.line, "missing timestamp"))?;
        parse_timestamp(raw)
            .ok_or_else(|| SourceError::malformed(self.line, format!("bad timestamp: {raw:?}")))
    }
}

/// Integer epoch seconds; integral floats such as `1767893329.0` are accepted too.
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = raw.parse::<i64>() {
        return Some(ts);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

/// Splits one CSV line, honouring double-quoted fields and `""` escapes.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
