use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::table::TableFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Csv,
    Xlsx,
    Xls,
    Unknown,
}

impl DatasetFormat {
    // The catalog's declared format wins; the URL extension is the fallback.
    pub fn from_resource(declared: Option<&str>, url: &str) -> Self {
        if let Some(declared) = declared {
            match declared.trim().to_lowercase().as_str() {
                "csv" => return DatasetFormat::Csv,
                "xlsx" => return DatasetFormat::Xlsx,
                "xls" => return DatasetFormat::Xls,
                _ => {}
            }
        }
        Self::from_url(url)
    }

    pub fn from_url(url: &str) -> Self {
        let path = url
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or(url)
            .to_lowercase();

        if path.ends_with(".csv") {
            DatasetFormat::Csv
        } else if path.ends_with(".xlsx") {
            DatasetFormat::Xlsx
        } else if path.ends_with(".xls") {
            DatasetFormat::Xls
        } else {
            DatasetFormat::Unknown
        }
    }

    pub fn is_tabular(&self) -> bool {
        !matches!(self, DatasetFormat::Unknown)
    }

    pub fn table_format(&self) -> Option<TableFormat> {
        match self {
            DatasetFormat::Csv => Some(TableFormat::Csv),
            DatasetFormat::Xlsx | DatasetFormat::Xls => Some(TableFormat::Excel),
            DatasetFormat::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetCandidate {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub format: DatasetFormat,
    pub description: String,
    pub organization: String,
    pub source: String,
    pub relevance_score: f64,
    pub preview: Option<Vec<Map<String, Value>>>,
    pub preview_columns: Vec<String>,
    pub total_rows: usize,
}
