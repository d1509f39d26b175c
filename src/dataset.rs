//! Append-only dataset of recorded windows, exportable as CSV.
//!
//! The first row ever appended is the fixed header; every data row is laid
//! out positionally in [`COLUMNS`] order. Fields are escaped at append time,
//! so `to_export_text` is a plain join.

use serde::Serialize;

/// Fixed column order for the export artifact.
pub const COLUMNS: [&str; 9] = [
    "label",
    "device_id",
    "start_time_iso",
    "duration_ms",
    "accel",
    "gyro",
    "orientation",
    "mag",
    "gravity",
];

/// One recorded window, ready to be appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRow {
    pub label: String,
    pub device_id: String,
    pub start_time_iso: String,
    pub duration_ms: u64,
    /// JSON-encoded per-channel sample buffers (`[]` when the channel
    /// produced nothing during the window).
    pub accel: String,
    pub gyro: String,
    pub orientation: String,
    pub mag: String,
    pub gravity: String,
}

impl DatasetRow {
    /// Field values in [`COLUMNS`] order.
    fn fields(&self) -> [String; 9] {
        [
            self.label.clone(),
            self.device_id.clone(),
            self.start_time_iso.clone(),
            self.duration_ms.to_string(),
            self.accel.clone(),
            self.gyro.clone(),
            self.orientation.clone(),
            self.mag.clone(),
            self.gravity.clone(),
        ]
    }
}

/// Escape one CSV field: wrap in double quotes (doubling internal quotes)
/// when the value contains a comma, quote, or newline.
pub fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// An ordered table of recorded windows, header row first.
///
/// Rows are immutable once appended; `clear` is the only way to remove them.
#[derive(Debug, Default)]
pub struct Dataset {
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one window row, inserting the header first if the table is empty.
    pub fn append_row(&mut self, row: &DatasetRow) {
        if self.rows.is_empty() {
            self.rows
                .push(COLUMNS.iter().map(|c| c.to_string()).collect());
        }
        self.rows
            .push(row.fields().iter().map(|f| csv_escape(f)).collect());
    }

    /// Number of data rows, excluding the header.
    pub fn row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Whether the dataset holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Render header and data rows as one CSV text blob.
    pub fn to_export_text(&self) -> String {
        self.rows
            .iter()
            .map(|r| r.join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Drop all rows, header included; the header is re-inserted on the
    /// next append.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
