use licensewatch_db::{NewUsageRecord, StoreError, UsageStore, normalize_license_id};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "vni_asset_number",
    "license_id",
    "project_name",
    "domain_name",
    "team_name",
    "current_user_id",
    "duration_days",
    "duration_hours",
];

pub const PREVIEW_ROWS: usize = 10;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV is missing one or more required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Could not read CSV: {0}")]
    Malformed(#[from] csv::Error),

    #[error("Failed to insert into database: {0}")]
    Store(#[from] StoreError),
}

/// The first rows of an upload exactly as they appeared in the file.
#[derive(Debug, Clone, Serialize)]
pub struct UploadPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A decoded CSV upload, before any type coercion.
#[derive(Debug, Clone)]
pub struct UploadedTable {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl UploadedTable {
    /// Decodes the whole file. Blank lines are skipped; rows whose field
    /// count differs from the header are rejected.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, IngestError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;

        Ok(Self { headers, rows })
    }

    pub fn preview(&self, limit: usize) -> UploadPreview {
        UploadPreview {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .take(limit)
                .map(|r| r.iter().map(str::to_string).collect())
                .collect(),
        }
    }

    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|col| !self.headers.iter().any(|h| h == *col))
            .map(|col| col.to_string())
            .collect()
    }

    /// Coerces every row into a record. Unparseable numbers become `None`;
    /// only a missing required column is an error.
    pub fn to_usage_records(&self) -> Result<Vec<NewUsageRecord>, IngestError> {
        let missing = self.missing_columns();
        if !missing.is_empty() {
            return Err(IngestError::MissingColumns(missing));
        }

        let columns = ColumnIndex::resolve(&self.headers);
        Ok(self.rows.iter().map(|row| columns.record(row)).collect())
    }
}

struct ColumnIndex([usize; 8]);

impl ColumnIndex {
    // Callers have already checked that every required column exists.
    fn resolve(headers: &[String]) -> Self {
        let mut idx = [0usize; 8];
        for (slot, col) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
            if let Some(pos) = headers.iter().position(|h| h == col) {
                *slot = pos;
            }
        }
        Self(idx)
    }

    fn record(&self, row: &csv::StringRecord) -> NewUsageRecord {
        let cell = |i: usize| row.get(self.0[i]).unwrap_or("");
        NewUsageRecord {
            vni_asset_number: text_cell(cell(0)),
            license_id: normalize_license_id(cell(1)),
            project_name: text_cell(cell(2)),
            domain_name: text_cell(cell(3)),
            team_name: text_cell(cell(4)),
            current_user_id: text_cell(cell(5)),
            duration_days: numeric_cell(cell(6)),
            duration_hours: numeric_cell(cell(7)),
        }
    }
}

fn text_cell(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn numeric_cell(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Validates and appends an upload. Nothing is written unless every
/// required column is present.
pub async fn ingest(store: &dyn UsageStore, table: &UploadedTable) -> Result<u64, IngestError> {
    let records = match table.to_usage_records() {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected upload: {}", e);
            return Err(e);
        }
    };

    let unparsed_ids = records.iter().filter(|r| r.license_id.is_none()).count();
    if unparsed_ids > 0 {
        info!(
            "{} of {} uploaded rows have no numeric license_id",
            unparsed_ids,
            records.len()
        );
    }

    let inserted = store.append(&records).await?;
    Ok(inserted)
}
