use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;
use serde_json::{Map, Number, Value};

pub const PREVIEW_ROWS: usize = 5;
pub const MIN_ROWS: usize = 5;
pub const MIN_DATA_DENSITY: f64 = 0.3;

const DELIMITER_SAMPLE_CHARS: usize = 1024;
// Latin-1 and ISO-8859-1 labels resolve to windows-1252 in the WHATWG
// encoding registry, so one fallback covers all three.
const CSV_ENCODINGS: [&encoding_rs::Encoding; 2] =
    [encoding_rs::UTF_8, encoding_rs::WINDOWS_1252];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    Excel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTable {
    pub format: TableFormat,
    pub url: String,
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub total_rows: usize,
}

impl ParsedTable {
    pub fn preview(&self, limit: usize) -> Vec<Map<String, Value>> {
        self.rows.iter().take(limit).cloned().collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("none of the candidate encodings decoded the file")]
    Decode,
    #[error("csv parsing failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet parsing failed: {0}")]
    Spreadsheet(String),
    #[error("table has no data rows")]
    EmptyTable,
}

#[derive(Debug, Clone, Copy)]
pub struct QualityThresholds {
    pub min_rows: usize,
    pub min_data_density: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        QualityThresholds {
            min_rows: MIN_ROWS,
            min_data_density: MIN_DATA_DENSITY,
        }
    }
}

pub fn parse(bytes: &[u8], format: TableFormat, url: &str) -> Result<ParsedTable, ParseError> {
    match format {
        TableFormat::Csv => parse_csv(bytes, url),
        TableFormat::Excel => parse_excel(bytes, url),
    }
}

fn parse_csv(bytes: &[u8], url: &str) -> Result<ParsedTable, ParseError> {
    let text = decode_text(bytes)?;
    let delimiter = detect_delimiter(&text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = unique_columns(headers.iter().map(|h| h.to_string()).collect());

    let mut rows: Vec<Map<String, Value>> = vec![];
    for record in reader.records() {
        let record = record?;
        let mut row = Map::new();
        for (i, column) in columns.iter().enumerate() {
            let value = record.get(i).map(csv_cell_value).unwrap_or(Value::Null);
            row.insert(column.clone(), value);
        }
        match row.values().all(Value::is_null) {
            true => {}
            false => rows.push(row),
        }
    }

    finish_table(TableFormat::Csv, url, columns, rows)
}

fn parse_excel(bytes: &[u8], url: &str) -> Result<ParsedTable, ParseError> {
    let cursor = Cursor::new(bytes);
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    // First sheet only.
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ParseError::EmptyTable)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let header_row = sheet_rows.next().ok_or(ParseError::EmptyTable)?;
    let columns = unique_columns(header_row.iter().map(cell_to_string).collect());

    let mut rows: Vec<Map<String, Value>> = vec![];
    for sheet_row in sheet_rows {
        let mut row = Map::new();
        for (i, column) in columns.iter().enumerate() {
            let value = sheet_row.get(i).map(excel_cell_value).unwrap_or(Value::Null);
            row.insert(column.clone(), value);
        }
        match row.values().all(Value::is_null) {
            true => {}
            false => rows.push(row),
        }
    }

    finish_table(TableFormat::Excel, url, columns, rows)
}

fn finish_table(
    format: TableFormat,
    url: &str,
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
) -> Result<ParsedTable, ParseError> {
    let rows: Vec<Map<String, Value>> = rows.into_iter().map(normalize_row).collect();
    match rows.is_empty() {
        true => Err(ParseError::EmptyTable),
        false => Ok(ParsedTable {
            format,
            url: url.to_string(),
            columns,
            total_rows: rows.len(),
            rows,
        }),
    }
}

fn decode_text(bytes: &[u8]) -> Result<String, ParseError> {
    for encoding in CSV_ENCODINGS {
        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        match had_errors {
            true => continue,
            false => return Ok(text.into_owned()),
        }
    }
    Err(ParseError::Decode)
}

fn detect_delimiter(text: &str) -> u8 {
    let sample: String = text.chars().take(DELIMITER_SAMPLE_CHARS).collect();

    // Comma is last so it wins ties and serves as the fallback.
    [b'\t', b';', b',']
        .into_iter()
        .map(|delimiter| {
            let count = sample.bytes().filter(|b| *b == delimiter).count();
            (delimiter, count)
        })
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(delimiter, _)| delimiter)
        .unwrap_or(b',')
}

fn unique_columns(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let name = name.trim().to_string();
        let base = match name.is_empty() {
            true => format!("column_{}", i + 1),
            false => name,
        };

        let mut column = base.clone();
        let mut suffix = 2;
        while !seen.insert(column.clone()) {
            column = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        columns.push(column);
    }

    columns
}

fn csv_cell_value(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        // from_f64 refuses NaN and infinities, which must not reach JSON.
        return Number::from_f64(float).map(Value::Number).unwrap_or(Value::Null);
    }
    Value::String(field.to_string())
}

fn excel_cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => match s.trim().is_empty() {
            true => Value::Null,
            false => Value::String(s.clone()),
        },
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        // Serial date number; rendering calendar dates needs sheet styles
        // calamine does not expose here.
        Data::DateTime(dt) => Value::String(dt.as_f64().to_string()),
        Data::DateTimeIso(s) => Value::String(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{:?}", e),
    }
}

fn normalize_row(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter().map(|(k, v)| (k, normalize_value(v))).collect()
}

pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => match s.trim().is_empty() {
            true => Value::Null,
            false => Value::String(s),
        },
        Value::Number(n) => match n.as_f64() {
            Some(f) if !f.is_finite() => Value::Null,
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

pub fn validate_table(table: &ParsedTable, thresholds: &QualityThresholds) -> bool {
    if table.total_rows < thresholds.min_rows {
        return false;
    }

    let total_cells = table.total_rows * table.columns.len();
    if total_cells == 0 {
        return false;
    }

    let informative = table
        .rows
        .iter()
        .flat_map(|row| row.values())
        .filter(|v| is_informative(v))
        .count();

    informative as f64 / total_cells as f64 >= thresholds.min_data_density
}

fn is_informative(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && s != "-"
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::*;

    fn parse_csv_bytes(bytes: &[u8]) -> ParsedTable {
        parse(bytes, TableFormat::Csv, "https://example.org/data.csv").unwrap()
    }

    #[test]
    fn parses_comma_csv() {
        let table = parse_csv_bytes(b"name,sector\nAcme,energy\nBolt,transport\n");

        assert_eq!(table.columns, vec!["name", "sector"]);
        assert_eq!(table.total_rows, 2);
        assert_eq!(table.rows[0]["name"], json!("Acme"));
        assert_eq!(table.rows[1]["sector"], json!("transport"));
    }

    #[test]
    fn detects_semicolon_delimiter() {
        let table = parse_csv_bytes(b"ville;population\nParis;2100000\nLyon;520000\n");

        assert_eq!(table.columns, vec!["ville", "population"]);
        assert_eq!(table.rows[0]["population"], json!(2100000));
    }

    #[test]
    fn decodes_windows_1252_after_utf8_fails() {
        // 0xE9 is e-acute in windows-1252 and invalid as a UTF-8 sequence.
        let table = parse_csv_bytes(b"r\xE9gion;valeur\nBretagne;12\n");

        assert_eq!(table.columns, vec!["r\u{e9}gion", "valeur"]);
        assert_eq!(table.rows[0]["valeur"], json!(12));
    }

    #[test]
    fn strips_utf8_bom() {
        let table = parse_csv_bytes(b"\xEF\xBB\xBFname,v\na,1\n");

        assert_eq!(table.columns[0], "name");
    }

    #[test]
    fn normalizes_nan_empty_and_infinite_cells() {
        let table = parse_csv_bytes(b"a,b,c\nNaN,,ok\ninf,nan,3\n");

        assert_eq!(table.rows[0]["a"], Value::Null);
        assert_eq!(table.rows[0]["b"], Value::Null);
        assert_eq!(table.rows[0]["c"], json!("ok"));
        assert_eq!(table.rows[1]["a"], Value::Null);
        assert_eq!(table.rows[1]["b"], Value::Null);
        assert_eq!(table.rows[1]["c"], json!(3));
    }

    #[test]
    fn infers_numeric_cell_types() {
        let table = parse_csv_bytes(b"n,f,s\n42,4.5,croissance\n");

        assert_eq!(table.rows[0]["n"], json!(42));
        assert_eq!(table.rows[0]["f"], json!(4.5));
        assert_eq!(table.rows[0]["s"], json!("croissance"));
    }

    #[test]
    fn skips_fully_empty_rows() {
        let table = parse_csv_bytes(b"a,b\n1,2\n,\n3,4\n");

        assert_eq!(table.total_rows, 2);
    }

    #[test]
    fn short_records_pad_with_null() {
        let table = parse_csv_bytes(b"a,b,c\n1,2\n");

        assert_eq!(table.rows[0]["a"], json!(1));
        assert_eq!(table.rows[0]["c"], Value::Null);
    }

    #[test]
    fn rejects_table_without_data_rows() {
        let result = parse(b"a,b\n", TableFormat::Csv, "https://example.org/empty.csv");

        assert!(matches!(result, Err(ParseError::EmptyTable)));
    }

    #[test]
    fn renames_blank_and_duplicate_headers() {
        let table = parse_csv_bytes(b"a,a,\n1,2,3\n");

        assert_eq!(table.columns, vec!["a", "a_2", "column_3"]);
    }

    #[test]
    fn unique_columns_avoids_suffix_collisions() {
        let columns = unique_columns(vec!["a".into(), "a".into(), "a_2".into()]);

        assert_eq!(columns, vec!["a", "a_2", "a_2_2"]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let bytes = b"name;score\nAcme;91\nBolt;NaN\nCarbone;7\n";
        let first = parse_csv_bytes(bytes);
        let second = parse_csv_bytes(bytes);

        assert_eq!(first, second);
    }

    #[test]
    fn delimiter_detection_prefers_comma_on_tie_and_failure() {
        assert_eq!(detect_delimiter("a,b;c,d"), b',');
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
        assert_eq!(detect_delimiter("a;b\nc;d"), b';');
        assert_eq!(detect_delimiter("a;b,c"), b',');
        assert_eq!(detect_delimiter("plain text"), b',');
    }

    #[test]
    fn excel_cells_normalize_non_finite_floats() {
        assert_eq!(excel_cell_value(&Data::Float(f64::NAN)), Value::Null);
        assert_eq!(excel_cell_value(&Data::Float(f64::INFINITY)), Value::Null);
        assert_eq!(excel_cell_value(&Data::Float(f64::NEG_INFINITY)), Value::Null);
        assert_eq!(excel_cell_value(&Data::Float(2.5)), json!(2.5));
        assert_eq!(excel_cell_value(&Data::Int(7)), json!(7));
        assert_eq!(excel_cell_value(&Data::Bool(true)), json!(true));
        assert_eq!(excel_cell_value(&Data::Empty), Value::Null);
        assert_eq!(excel_cell_value(&Data::String("".into())), Value::Null);
    }

    #[test]
    fn normalize_value_reaches_nested_structures() {
        let value = json!({"a": {"b": ""}, "c": ["", "x"]});

        let normalized = normalize_value(value);

        assert_eq!(normalized, json!({"a": {"b": null}, "c": [null, "x"]}));
    }

    fn dense_table(rows: usize) -> ParsedTable {
        let columns = vec!["a".to_string(), "b".to_string()];
        let rows: Vec<Map<String, Value>> = (0..rows)
            .map(|i| {
                let mut row = Map::new();
                row.insert("a".to_string(), json!(i));
                row.insert("b".to_string(), json!("x"));
                row
            })
            .collect();
        ParsedTable {
            format: TableFormat::Csv,
            url: "https://example.org/data.csv".to_string(),
            columns,
            total_rows: rows.len(),
            rows,
        }
    }

    #[test]
    fn validator_rejects_below_min_rows() {
        let thresholds = QualityThresholds::default();

        assert!(!validate_table(&dense_table(4), &thresholds));
        assert!(validate_table(&dense_table(5), &thresholds));
    }

    #[test]
    fn validator_applies_density_threshold() {
        let mut table = dense_table(5);
        // 10 cells, 3 informative: density 0.3 sits exactly on the gate.
        for (i, row) in table.rows.iter_mut().enumerate() {
            row.insert("b".to_string(), Value::Null);
            if i >= 3 {
                row.insert("a".to_string(), json!("-"));
            }
        }

        assert!(validate_table(&table, &QualityThresholds::default()));

        table.rows[2].insert("a".to_string(), Value::Null);
        assert!(!validate_table(&table, &QualityThresholds::default()));
    }

    #[test]
    fn validator_rejects_zero_columns() {
        let table = ParsedTable {
            format: TableFormat::Csv,
            url: "https://example.org/data.csv".to_string(),
            columns: vec![],
            rows: vec![Map::new(); 6],
            total_rows: 6,
        };

        assert!(!validate_table(&table, &QualityThresholds::default()));
    }
}
