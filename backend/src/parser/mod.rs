//! Raw snapshot readers.
//!
//! [`RawSource`] is what the pipeline reads raw tables through. [`CsvSource`]
//! reads the six extract files from a directory, detecting encoding and
//! delimiter on the way; [`InMemorySource`] serves records held in memory.

use csv::StringRecord;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::models::{
    CategoryRaw, CustomerRaw, DemographicRaw, LocationRaw, ProductRaw, SalesRaw, Table,
};

/// Provider of full raw snapshots, one read per source table.
pub trait RawSource {
    fn customers(&self) -> SourceResult<Vec<CustomerRaw>>;
    fn products(&self) -> SourceResult<Vec<ProductRaw>>;
    fn sales(&self) -> SourceResult<Vec<SalesRaw>>;
    fn demographics(&self) -> SourceResult<Vec<DemographicRaw>>;
    fn locations(&self) -> SourceResult<Vec<LocationRaw>>;
    fn categories(&self) -> SourceResult<Vec<CategoryRaw>>;
}

/// Parsed extract with the detected settings.
#[derive(Debug, Clone)]
pub struct ParseResult<T> {
    pub records: Vec<T>,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes with the given encoding. Unknown encodings fall back to
/// lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting candidates on the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded CSV text into typed records.
///
/// `origin` names the extract in error messages. Field values are kept
/// verbatim; only header names are trimmed.
pub fn parse_records<T: DeserializeOwned>(
    content: &str,
    delimiter: char,
    origin: &str,
) -> SourceResult<(Vec<String>, Vec<T>)> {
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Err(SourceError::EmptyFile(origin.to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| SourceError::format(origin, e.to_string()))?
        .iter()
        .map(str::trim)
        .collect();
    reader.set_headers(headers.clone());

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<T>().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record = row.map_err(|e| SourceError::format(origin, format!("line {}: {}", idx + 2, e)))?;
        records.push(record);
    }

    Ok((headers.iter().map(str::to_string).collect(), records))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto<T: DeserializeOwned>(bytes: &[u8], origin: &str) -> SourceResult<ParseResult<T>> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(content.trim_start_matches('\u{feff}'));
    let (headers, records) = parse_records(&content, delimiter, origin)?;

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> SourceResult<ParseResult<T>> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| SourceError::io(origin.clone(), e))?;
    parse_bytes_auto(&bytes, &origin)
}

// =============================================================================
// CSV directory source
// =============================================================================

/// Reads extracts laid out as `<root>/source_crm/*.csv` and `<root>/source_erp/*.csv`.
#[derive(Debug, Clone)]
pub struct CsvSource {
    root: PathBuf,
}

impl CsvSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the extract backing `table`.
    pub fn path_of(&self, table: Table) -> PathBuf {
        self.root.join(table.source_path())
    }

    fn read_table<T: DeserializeOwned>(&self, table: Table) -> SourceResult<Vec<T>> {
        let path = self.path_of(table);
        let parsed = parse_csv_file_auto::<T, _>(&path)?;
        debug!(
            table = %table,
            encoding = %parsed.encoding,
            delimiter = ?parsed.delimiter,
            rows = parsed.records.len(),
            "read raw extract"
        );
        Ok(parsed.records)
    }
}

impl RawSource for CsvSource {
    fn customers(&self) -> SourceResult<Vec<CustomerRaw>> {
        self.read_table(Table::CrmCustomers)
    }

    fn products(&self) -> SourceResult<Vec<ProductRaw>> {
        self.read_table(Table::CrmProducts)
    }

    fn sales(&self) -> SourceResult<Vec<SalesRaw>> {
        self.read_table(Table::CrmSales)
    }

    fn demographics(&self) -> SourceResult<Vec<DemographicRaw>> {
        self.read_table(Table::ErpDemographics)
    }

    fn locations(&self) -> SourceResult<Vec<LocationRaw>> {
        self.read_table(Table::ErpLocations)
    }

    fn categories(&self) -> SourceResult<Vec<CategoryRaw>> {
        self.read_table(Table::ErpCategories)
    }
}

// =============================================================================
// In-memory source
// =============================================================================

/// Snapshots held in memory. Every read returns a copy.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub customers: Vec<CustomerRaw>,
    pub products: Vec<ProductRaw>,
    pub sales: Vec<SalesRaw>,
    pub demographics: Vec<DemographicRaw>,
    pub locations: Vec<LocationRaw>,
    pub categories: Vec<CategoryRaw>,
}

impl RawSource for InMemorySource {
    fn customers(&self) -> SourceResult<Vec<CustomerRaw>> {
        Ok(self.customers.clone())
    }

    fn products(&self) -> SourceResult<Vec<ProductRaw>> {
        Ok(self.products.clone())
    }

    fn sales(&self) -> SourceResult<Vec<SalesRaw>> {
        Ok(self.sales.clone())
    }

    fn demographics(&self) -> SourceResult<Vec<DemographicRaw>> {
        Ok(self.demographics.clone())
    }

    fn locations(&self) -> SourceResult<Vec<LocationRaw>> {
        Ok(self.locations.clone())
    }

    fn categories(&self) -> SourceResult<Vec<CategoryRaw>> {
        Ok(self.categories.clone())
    }
}
