use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Date format accepted for a truck session (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Truck metadata entered before a scanning session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruckInfo {
    pub date: String,
    pub truck_number: String,
}

impl TruckInfo {
    /// Validate and build truck metadata. Both fields are trimmed.
    pub fn new(date: impl AsRef<str>, truck_number: impl AsRef<str>) -> Result<Self, WorkflowError> {
        let date = date.as_ref().trim();
        let truck_number = truck_number.as_ref().trim();

        if date.is_empty() || truck_number.is_empty() {
            return Err(WorkflowError::IncompleteSubmission);
        }
        NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| WorkflowError::InvalidDate(date.to_string()))?;

        Ok(Self {
            date: date.to_string(),
            truck_number: truck_number.to_string(),
        })
    }

    /// Today's date in the local timezone, formatted for the input form.
    pub fn today() -> String {
        chrono::Local::now().date_naive().format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for TruckInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.truck_number, self.date)
    }
}

/// One recognized tag identifier, stamped with the session it was finished in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedRecord {
    pub date: String,
    pub truck_number: String,
    pub tag_id: String,
}

impl ScannedRecord {
    pub fn stamped(truck: &TruckInfo, tag_id: impl Into<String>) -> Self {
        Self {
            date: truck.date.clone(),
            truck_number: truck.truck_number.clone(),
            tag_id: tag_id.into(),
        }
    }
}

/// Which way the camera faces. Tags are shot with the rear (environment) camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    Environment,
    User,
}

/// Constraints passed when requesting camera access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: Option<FacingMode>,
}

impl CameraConstraints {
    pub fn rear() -> Self {
        Self { facing: Some(FacingMode::Environment) }
    }

    pub fn any() -> Self {
        Self::default()
    }
}

/// A frozen camera frame: tightly packed RGBA8 pixels.
///
/// A 0×0 frame means the camera is open but not producing images yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Base64 image payload sent to the recognition service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truck_info_trims_and_validates() {
        let info = TruckInfo::new(" 2024-05-01 ", " T-9 ").unwrap();
        assert_eq!(info.date, "2024-05-01");
        assert_eq!(info.truck_number, "T-9");
    }

    #[test]
    fn truck_info_rejects_blank_fields() {
        assert!(matches!(
            TruckInfo::new("2024-05-01", "   "),
            Err(WorkflowError::IncompleteSubmission)
        ));
        assert!(matches!(
            TruckInfo::new("", "T-9"),
            Err(WorkflowError::IncompleteSubmission)
        ));
    }

    #[test]
    fn truck_info_rejects_non_iso_date() {
        assert!(matches!(
            TruckInfo::new("05/01/2024", "T-9"),
            Err(WorkflowError::InvalidDate(_))
        ));
    }

    #[test]
    fn today_is_parseable() {
        assert!(TruckInfo::new(TruckInfo::today(), "T-1").is_ok());
    }

    #[test]
    fn record_serializes_camel_case() {
        let truck = TruckInfo::new("2024-05-01", "T-9").unwrap();
        let record = ScannedRecord::stamped(&truck, "A1");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["truckNumber"], "T-9");
        assert_eq!(json["tagId"], "A1");
    }
}
