/// CSV export of finished scan records.
///
/// The file is written with a UTF-8 byte-order mark so spreadsheet tools pick
/// up the Japanese header correctly.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::ScannedRecord;

/// Header row: date, truck number, tag number.
pub const CSV_HEADER: &str = "日付,トラック番号,荷札番号";

pub const UTF8_BOM: char = '\u{FEFF}';

pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";

/// A rendered export, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: Vec<u8>,
}

/// Render the full record list. Returns `None` when there is nothing to export.
pub fn render_csv(records: &[ScannedRecord]) -> Option<CsvExport> {
    let first = records.first()?;

    let rows = records
        .iter()
        .map(|r| format!("{},{},\"{}\"", r.date, r.truck_number, r.tag_id.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join("\n");

    let mut content = String::with_capacity(CSV_HEADER.len() + rows.len() + 4);
    content.push(UTF8_BOM);
    content.push_str(CSV_HEADER);
    content.push('\n');
    content.push_str(&rows);

    Some(CsvExport {
        filename: export_filename(&first.truck_number, &first.date),
        mime_type: CSV_MIME_TYPE,
        content: content.into_bytes(),
    })
}

/// `scans_<truckNumber>_<date>.csv`, with path separators neutralized.
pub fn export_filename(truck_number: &str, date: &str) -> String {
    let safe = |s: &str| s.replace(['/', '\\'], "_");
    format!("scans_{}_{}.csv", safe(truck_number), safe(date))
}

pub struct RecordExporter {
    pub output_dir: PathBuf,
}

impl RecordExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the CSV into the output directory. An empty list writes nothing
    /// and returns `Ok(None)`.
    pub async fn export(&self, records: &[ScannedRecord]) -> Result<Option<PathBuf>> {
        let Some(csv) = render_csv(records) else {
            debug!("[Export] No records; skipping");
            return Ok(None);
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create export dir: {}", self.output_dir.display()))?;
        let path = self.output_dir.join(&csv.filename);
        tokio::fs::write(&path, &csv.content)
            .await
            .with_context(|| format!("Failed to write export: {}", path.display()))?;

        info!(mime = csv.mime_type, "[Export] {} records → {}", records.len(), path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TruckInfo;

    fn records() -> Vec<ScannedRecord> {
        let truck = TruckInfo::new("2024-05-01", "T-9").unwrap();
        vec![
            ScannedRecord::stamped(&truck, "A1"),
            ScannedRecord::stamped(&truck, "A2"),
        ]
    }

    #[test]
    fn renders_bom_header_and_quoted_tags() {
        let csv = render_csv(&records()).unwrap();
        let text = String::from_utf8(csv.content).unwrap();
        assert_eq!(
            text,
            "\u{FEFF}日付,トラック番号,荷札番号\n2024-05-01,T-9,\"A1\"\n2024-05-01,T-9,\"A2\""
        );
        assert_eq!(csv.filename, "scans_T-9_2024-05-01.csv");
        assert_eq!(csv.mime_type, "text/csv;charset=utf-8");
    }

    #[test]
    fn content_starts_with_bom_bytes() {
        let csv = render_csv(&records()).unwrap();
        assert_eq!(&csv.content[..3], &[0xEF, 0xBB, 0xBF]);
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert!(render_csv(&[]).is_none());
    }

    #[test]
    fn rendering_is_deterministic() {
        let recs = records();
        assert_eq!(render_csv(&recs), render_csv(&recs));
    }

    #[test]
    fn filename_uses_first_record() {
        let mut recs = records();
        let other = TruckInfo::new("2024-06-01", "Z-1").unwrap();
        recs.push(ScannedRecord::stamped(&other, "B1"));
        assert_eq!(render_csv(&recs).unwrap().filename, "scans_T-9_2024-05-01.csv");
    }

    #[test]
    fn quotes_inside_tag_are_doubled() {
        let truck = TruckInfo::new("2024-05-01", "T-9").unwrap();
        let csv = render_csv(&[ScannedRecord::stamped(&truck, "1\"2")]).unwrap();
        let text = String::from_utf8(csv.content).unwrap();
        assert!(text.ends_with("2024-05-01,T-9,\"1\"\"2\""));
    }

    #[test]
    fn filename_strips_path_separators() {
        assert_eq!(export_filename("A/B", "2024-05-01"), "scans_A_B_2024-05-01.csv");
    }

    #[tokio::test]
    async fn exporter_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = RecordExporter::new(dir.path().join("out"));
        let path = exporter.export(&records()).await.unwrap().unwrap();
        let bytes = tokio::fs::read(&path).await.unwrap();
        assert_eq!(bytes, render_csv(&records()).unwrap().content);
    }

    #[tokio::test]
    async fn exporter_skips_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = RecordExporter::new(dir.path().join("out"));
        assert!(exporter.export(&[]).await.unwrap().is_none());
        assert!(!dir.path().join("out").exists());
    }
}
