//! Untyped string tables and the delimited-text parser that produces them.
//!
//! Every source is first reduced to a [`RawTable`]: a header plus rows of
//! string cells. Typing happens later, in [`crate::frame`], once the recipe
//! has decided which columns are features and which is the target.

use crate::error::DatasetError;

/// How fields are separated on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Comma separated with CSV quoting rules. Leading spaces are kept.
    Comma,
    /// Any run of whitespace.
    Whitespace,
    /// An exact separator string, e.g. `", "` or `" "`.
    Literal(&'static str),
}

/// Layout of a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFormat {
    pub delimiter: Delimiter,
    /// First non-blank line holds column names.
    pub header: bool,
    /// Drop `@`-prefixed directive lines (KEEL `.dat` headers).
    pub strip_directives: bool,
}

impl TextFormat {
    pub const fn csv() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            header: false,
            strip_directives: false,
        }
    }

    pub const fn whitespace() -> Self {
        Self {
            delimiter: Delimiter::Whitespace,
            header: false,
            strip_directives: false,
        }
    }

    /// KEEL `.dat` body: comma separated, directives stripped.
    pub const fn keel() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            header: false,
            strip_directives: true,
        }
    }

    pub const fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub const fn with_header(mut self) -> Self {
        self.header = true;
        self
    }
}

/// Reference to a column of a [`RawTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Positional index.
    Index(usize),
    /// Column name from the header.
    Name(&'static str),
    /// The last column.
    Last,
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "#{i}"),
            ColumnRef::Name(name) => write!(f, "'{name}'"),
            ColumnRef::Last => write!(f, "<last>"),
        }
    }
}

/// Header plus string rows. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table, padding short rows (and the header) to the widest row.
    ///
    /// When `columns` is `None` the table is headerless and columns are named
    /// by position.
    pub fn new(columns: Option<Vec<String>>, mut rows: Vec<Vec<String>>) -> Self {
        let header_width = columns.as_ref().map_or(0, Vec::len);
        let width = rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(header_width);

        for row in &mut rows {
            row.resize(width, String::new());
        }

        let columns = match columns {
            Some(mut names) => {
                let start = names.len();
                names.extend((start..width).map(|i| i.to_string()));
                names
            }
            None => positional_names(width),
        };

        Self { columns, rows }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Resolve a column reference to a positional index.
    pub fn resolve(&self, column: &ColumnRef) -> Result<usize, DatasetError> {
        match column {
            ColumnRef::Index(i) if *i < self.width() => Ok(*i),
            ColumnRef::Name(name) => self
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| DatasetError::ColumnNotFound(column.to_string())),
            ColumnRef::Last if self.width() > 0 => Ok(self.width() - 1),
            _ => Err(DatasetError::ColumnNotFound(column.to_string())),
        }
    }

    /// Append the rows of `other` below this table.
    ///
    /// Column names are taken from `self`; widths are padded to the wider of
    /// the two tables.
    pub fn append_rows(self, other: RawTable) -> RawTable {
        if self.columns.is_empty() && self.rows.is_empty() {
            return other;
        }
        let mut rows = self.rows;
        rows.extend(other.rows);
        RawTable::new(Some(self.columns), rows)
    }

    /// Place the columns of `other` to the right of this table.
    ///
    /// The result is headerless: columns are renumbered by position.
    pub fn append_columns(self, other: RawTable) -> Result<RawTable, DatasetError> {
        if self.columns.is_empty() && self.rows.is_empty() {
            return Ok(RawTable::new(None, other.rows));
        }
        if self.height() != other.height() {
            return Err(DatasetError::parse(
                "column concatenation",
                format!(
                    "row counts differ: {} vs {}",
                    self.height(),
                    other.height()
                ),
            ));
        }

        let rows = self
            .rows
            .into_iter()
            .zip(other.rows)
            .map(|(mut left, right)| {
                left.extend(right);
                left
            })
            .collect();
        Ok(RawTable::new(None, rows))
    }
}

fn positional_names(width: usize) -> Vec<String> {
    (0..width).map(|i| i.to_string()).collect()
}

/// Missing-value markers recognised in raw cells.
const MISSING_MARKERS: [&str; 4] = ["?", "NA", "NaN", "nan"];

/// True when a cell holds no value.
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// Decode and split a delimited text file.
pub fn parse_text(bytes: &[u8], format: &TextFormat) -> Result<RawTable, DatasetError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DatasetError::parse("text decode", e))?;

    let lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !(format.strip_directives && line.trim_start().starts_with('@')));

    let mut records: Vec<Vec<String>> = match format.delimiter {
        Delimiter::Comma => {
            let body: String = lines.flat_map(|l| [l, "\n"]).collect();
            split_csv(&body)?
        }
        Delimiter::Whitespace => lines
            .map(|l| l.split_whitespace().map(str::to_string).collect())
            .collect(),
        Delimiter::Literal(sep) => lines
            .map(|l| l.split(sep).map(str::to_string).collect())
            .collect(),
    };

    let header = if format.header && !records.is_empty() {
        let names = records.remove(0);
        Some(names.into_iter().map(|n| n.trim().to_string()).collect())
    } else {
        None
    };

    Ok(RawTable::new(header, records))
}

fn split_csv(body: &str) -> Result<Vec<Vec<String>>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(body.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| DatasetError::parse("csv", e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_rows_get_positional_names() {
        let table = parse_text(b"1,2,a\n3,4,b\n", &TextFormat::csv()).unwrap();
        assert_eq!(table.columns, vec!["0", "1", "2"]);
        assert_eq!(table.rows[1], vec!["3", "4", "b"]);
    }

    #[test]
    fn comma_keeps_leading_spaces_and_quotes() {
        let table = parse_text(b"0.5, positive\n\"x,y\", negative\n", &TextFormat::csv()).unwrap();
        assert_eq!(table.rows[0][1], " positive");
        assert_eq!(table.rows[1][0], "x,y");
    }

    #[test]
    fn whitespace_collapses_runs_and_skips_blank_lines() {
        let text = b"AAT_ECOLI   0.49  0.29 cp\n\n  ACEA_ECOLI 0.07 0.40   pp \r\n";
        let table = parse_text(text, &TextFormat::whitespace()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows[1], vec!["ACEA_ECOLI", "0.07", "0.40", "pp"]);
    }

    #[test]
    fn keel_directives_are_stripped() {
        let text = b"@relation yeast\n@attribute a real\n@inputs a\n@data\n0.5, negative\n0.7, positive\n";
        let table = parse_text(text, &TextFormat::keel()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows[1], vec!["0.7", " positive"]);
    }

    #[test]
    fn literal_separator_splits_exactly() {
        let format = TextFormat::keel().with_delimiter(Delimiter::Literal(", "));
        let table = parse_text(b"@data\n1, 2, positive\n", &format).unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", "positive"]);
    }

    #[test]
    fn trailing_separator_yields_empty_column() {
        let format = TextFormat::csv().with_delimiter(Delimiter::Literal(" "));
        let table = parse_text(b"1 2 3 \n4 5 6 \n", &format).unwrap();
        assert_eq!(table.width(), 4);
        assert!(is_missing(&table.rows[0][3]));
    }

    #[test]
    fn header_row_names_columns() {
        let format = TextFormat::csv().with_header();
        let table = parse_text(b"a, b ,Risk\n1,2,0\n", &format).unwrap();
        assert_eq!(table.columns, vec!["a", "b", "Risk"]);
        assert_eq!(table.resolve(&ColumnRef::Name("Risk")).unwrap(), 2);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let table = parse_text(b"1,2\n3\n", &TextFormat::csv()).unwrap();
        assert_eq!(table.rows[1], vec!["3", ""]);
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = parse_text(&[0xff, 0xfe, b'\n'], &TextFormat::csv()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn resolve_rejects_unknown_columns() {
        let table = RawTable::new(None, vec![vec!["1".into()]]);
        assert_eq!(table.resolve(&ColumnRef::Last).unwrap(), 0);
        assert!(table.resolve(&ColumnRef::Index(3)).is_err());
        assert!(table.resolve(&ColumnRef::Name("target")).is_err());
    }

    #[test]
    fn append_rows_stacks_tables() {
        let a = RawTable::new(None, vec![vec!["1".into(), "van".into()]]);
        let b = RawTable::new(None, vec![vec!["2".into(), "bus".into()]]);
        let stacked = RawTable::default().append_rows(a).append_rows(b);
        assert_eq!(stacked.height(), 2);
        assert_eq!(stacked.rows[1][1], "bus");
    }

    #[test]
    fn append_columns_renumbers_and_checks_heights() {
        let data = RawTable::new(None, vec![vec!["1".into()], vec!["2".into()]]);
        let labels = RawTable::new(None, vec![vec!["-1".into()], vec!["1".into()]]);
        let joined = data.clone().append_columns(labels).unwrap();
        assert_eq!(joined.columns, vec!["0", "1"]);
        assert_eq!(joined.rows[1], vec!["2", "1"]);

        let short = RawTable::new(None, vec![vec!["1".into()]]);
        assert!(data.append_columns(short).is_err());
    }

    #[test]
    fn missing_markers() {
        assert!(is_missing(""));
        assert!(is_missing(" ? "));
        assert!(is_missing("NaN"));
        assert!(!is_missing("0"));
    }
}
