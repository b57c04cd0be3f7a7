//! TUI App State
//!
//! Owns the workflow, the input form, and the capture controller. Everything
//! here is synchronous or touches only the camera; network calls and file IO
//! live in the runner.

use tracing::{debug, warn};
use uuid::Uuid;

use tagscan_core::{CameraDevice, CaptureError, RecognitionError, Transition, TruckInfo, Workflow};
use tagscan_logging::{ScanEvent, ScanEventLogger};
use tagscan_media::{CaptureController, PendingCapture};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Credential,
    Date,
    TruckNumber,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Self::Credential => Self::Date,
            Self::Date => Self::TruckNumber,
            Self::TruckNumber => Self::Credential,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Credential => Self::TruckNumber,
            Self::Date => Self::Credential,
            Self::TruckNumber => Self::Date,
        }
    }
}

/// The Input screen's fields. The date starts at today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputForm {
    pub credential: String,
    pub date: String,
    pub truck_number: String,
    pub focus: Field,
}

impl InputForm {
    pub fn new(credential: Option<String>) -> Self {
        Self {
            credential: credential.unwrap_or_default(),
            date: TruckInfo::today(),
            truck_number: String::new(),
            focus: Field::Credential,
        }
    }

    /// Submit is enabled only when every field has content.
    pub fn is_complete(&self) -> bool {
        [&self.credential, &self.date, &self.truck_number]
            .iter()
            .all(|v| !v.trim().is_empty())
    }

    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Credential => &mut self.credential,
            Field::Date => &mut self.date,
            Field::TruckNumber => &mut self.truck_number,
        }
    }
}

pub struct AppState {
    pub workflow: Workflow,
    pub form: InputForm,
    pub capture: CaptureController,
    /// One-line status under the current screen (submit errors, export result).
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(credential: Option<String>, instruction: impl Into<String>) -> Self {
        Self {
            workflow: Workflow::new(),
            form: InputForm::new(credential),
            capture: CaptureController::new(instruction),
            notice: None,
            should_quit: false,
        }
    }

    /// Try to leave Input. On success the caller should start the camera.
    pub fn submit(&mut self) -> bool {
        let result = self.workflow.submit(
            self.form.date.clone(),
            self.form.truck_number.clone(),
            self.form.credential.clone(),
        );
        match result {
            Ok(Transition::SessionStarted { session_id, truck }) => {
                ScanEventLogger::log_event(
                    Some(session_id),
                    ScanEvent::SessionStarted {
                        date: truck.date,
                        truck_number: truck.truck_number,
                    },
                );
                self.notice = None;
                true
            }
            Ok(_) => true,
            Err(err) => {
                self.notice = Some(err.to_string());
                false
            }
        }
    }

    pub async fn start_camera(&mut self, camera: &dyn CameraDevice) {
        if let Err(err) = self.capture.start(camera).await {
            ScanEventLogger::log_event(
                self.workflow.session_id(),
                ScanEvent::CaptureFailed {
                    error_msg: err.to_string(),
                },
            );
        }
    }

    /// Freeze the current frame for the active session. Failures are already
    /// recorded as the capture controller's display error.
    pub async fn begin_capture(&mut self) -> Option<(Uuid, PendingCapture)> {
        let session_id = self.workflow.session_id()?;
        match self.capture.begin_capture().await {
            Ok(pending) => Some((session_id, pending)),
            Err(CaptureError::Busy) => None,
            Err(err) => {
                ScanEventLogger::log_event(
                    Some(session_id),
                    ScanEvent::CaptureFailed {
                        error_msg: err.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Apply a recognition outcome. Results for a session that is no longer
    /// active, or with no capture pending, are dropped. Returns whether the
    /// outcome was applied.
    pub fn accept_scan(
        &mut self,
        session_id: Uuid,
        outcome: Result<String, RecognitionError>,
    ) -> bool {
        if self.workflow.session_id() != Some(session_id) || !self.capture.is_capturing() {
            debug!(%session_id, "Discarding recognition result for an inactive session");
            return false;
        }

        let workflow = &mut self.workflow;
        let completed = self.capture.complete(outcome, |ids| {
            if let Err(err) = workflow.accumulate(ids) {
                warn!(error = %err, "Recognized tags could not be accumulated");
            }
        });

        let event = match completed {
            Ok(tags) => ScanEvent::TagsRecognized {
                tags,
                session_total: self.workflow.session_scans().len(),
            },
            Err(err) => ScanEvent::CaptureFailed {
                error_msg: err.to_string(),
            },
        };
        ScanEventLogger::log_event(Some(session_id), event);
        true
    }

    /// Leave Scanning. The camera is released first, unconditionally.
    pub fn finish(&mut self) {
        self.capture.release();
        match self.workflow.finish() {
            Ok(Transition::SessionFinished {
                session_id,
                new_records,
            }) => {
                ScanEventLogger::log_event(Some(session_id), ScanEvent::SessionFinished { new_records });
                self.notice = None;
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "Finish ignored"),
        }
    }

    /// Back to a fresh Input form. `credential` is the stored value, read
    /// again because the Input screen is being entered.
    pub fn scan_another(&mut self, credential: Option<String>) {
        match self.workflow.scan_another() {
            Ok(_) => {
                self.form = InputForm::new(credential);
                self.notice = None;
            }
            Err(err) => warn!(error = %err, "Scan another ignored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagscan_core::WorkflowState;

    fn filled(truck: &str) -> AppState {
        let mut app = AppState::new(Some("key".into()), "read tags");
        app.form.date = "2024-05-01".into();
        app.form.truck_number = truck.into();
        app
    }

    #[test]
    fn form_defaults_to_today_and_stored_credential() {
        let form = InputForm::new(Some("saved".into()));
        assert_eq!(form.credential, "saved");
        assert_eq!(form.date, TruckInfo::today());
        assert!(!form.is_complete());
    }

    #[test]
    fn focus_cycles_through_all_fields() {
        let f = Field::default();
        assert_eq!(f.next().next().next(), f);
        assert_eq!(f.prev(), Field::TruckNumber);
    }

    #[test]
    fn incomplete_submit_stays_on_input_with_notice() {
        let mut app = filled("   ");
        assert!(!app.submit());
        assert_eq!(app.workflow.state(), &WorkflowState::Input);
        assert!(app.notice.is_some());
    }

    #[test]
    fn bad_date_is_reported() {
        let mut app = filled("T-9");
        app.form.date = "May 1st".into();
        assert!(!app.submit());
        assert!(app.notice.as_deref().unwrap_or_default().contains("May 1st"));
    }

    #[test]
    fn result_for_unknown_session_is_ignored() {
        let mut app = filled("T-9");
        assert!(app.submit());
        assert!(!app.accept_scan(Uuid::new_v4(), Ok("1, 2".into())));
        assert!(app.workflow.session_scans().is_empty());
    }

    #[test]
    fn result_without_pending_capture_is_ignored() {
        let mut app = filled("T-9");
        assert!(app.submit());
        let session = app.workflow.session_id().unwrap();
        assert!(!app.accept_scan(session, Ok("1, 2".into())));
    }

    #[test]
    fn finish_then_scan_another_resets_form_and_keeps_records() {
        let mut app = filled("T-9");
        assert!(app.submit());
        app.workflow.accumulate(vec!["A".into()]).unwrap();
        app.finish();
        assert_eq!(app.workflow.state(), &WorkflowState::Results);
        assert!(!app.capture.has_stream());

        app.scan_another(Some("rotated".into()));
        assert_eq!(app.workflow.state(), &WorkflowState::Input);
        assert_eq!(app.form.credential, "rotated");
        assert!(app.form.truck_number.is_empty());
        assert_eq!(app.workflow.records().len(), 1);
    }
}
