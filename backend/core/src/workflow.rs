//! Three-state workflow controller: Input → Scanning → Results.
//!
//! The state is a tagged variant carrying only what each screen needs. All
//! transitions go through [`Workflow::apply`], which either performs the whole
//! transition or returns an error and leaves the workflow untouched.

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::types::{ScannedRecord, TruckInfo};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Input,
    Scanning {
        session_id: Uuid,
        truck: TruckInfo,
        session: Vec<String>,
    },
    Results,
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Scanning { .. } => "scanning",
            Self::Results => "results",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Submit {
        date: String,
        truck_number: String,
        credential: String,
    },
    Accumulate(Vec<String>),
    Finish,
    ScanAnother,
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Accumulate(_) => "accumulate",
            Self::Finish => "finish",
            Self::ScanAnother => "scan another",
        }
    }
}

/// What a successful [`Workflow::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    SessionStarted { session_id: Uuid, truck: TruckInfo },
    Accumulated { added: usize, session_total: usize },
    SessionFinished { session_id: Uuid, new_records: usize },
    Reset,
}

/// Workflow state plus every record finished during this run.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    state: WorkflowState,
    records: Vec<ScannedRecord>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// All finished records, in finish order.
    pub fn records(&self) -> &[ScannedRecord] {
        &self.records
    }

    /// Identifiers accumulated in the current session (empty outside Scanning).
    pub fn session_scans(&self) -> &[String] {
        match &self.state {
            WorkflowState::Scanning { session, .. } => session,
            _ => &[],
        }
    }

    pub fn truck(&self) -> Option<&TruckInfo> {
        match &self.state {
            WorkflowState::Scanning { truck, .. } => Some(truck),
            _ => None,
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match &self.state {
            WorkflowState::Scanning { session_id, .. } => Some(*session_id),
            _ => None,
        }
    }

    /// Apply one event.
    pub fn apply(&mut self, event: WorkflowEvent) -> Result<Transition, WorkflowError> {
        let state_name = self.state.name();
        let event_name = event.name();
        let invalid = || WorkflowError::InvalidTransition {
            state: state_name,
            event: event_name,
        };

        match (&mut self.state, event) {
            (
                WorkflowState::Input,
                WorkflowEvent::Submit {
                    date,
                    truck_number,
                    credential,
                },
            ) => {
                if credential.trim().is_empty() {
                    return Err(WorkflowError::IncompleteSubmission);
                }
                let truck = TruckInfo::new(&date, &truck_number)?;
                let session_id = Uuid::new_v4();
                info!(%session_id, truck = %truck, "Scanning session started");
                self.state = WorkflowState::Scanning {
                    session_id,
                    truck: truck.clone(),
                    session: Vec::new(),
                };
                Ok(Transition::SessionStarted { session_id, truck })
            }

            (WorkflowState::Scanning { session, .. }, WorkflowEvent::Accumulate(ids)) => {
                let added = ids.len();
                session.extend(ids);
                debug!(added, total = session.len(), "Accumulated tag identifiers");
                Ok(Transition::Accumulated {
                    added,
                    session_total: session.len(),
                })
            }

            (WorkflowState::Scanning { .. }, WorkflowEvent::Finish) => {
                let (session_id, truck, session) =
                    match std::mem::replace(&mut self.state, WorkflowState::Results) {
                        WorkflowState::Scanning {
                            session_id,
                            truck,
                            session,
                        } => (session_id, truck, session),
                        other => {
                            self.state = other;
                            return Err(invalid());
                        }
                    };
                let new_records = session.len();
                self.records.extend(
                    session
                        .into_iter()
                        .map(|tag_id| ScannedRecord::stamped(&truck, tag_id)),
                );
                info!(
                    %session_id,
                    new_records,
                    total_records = self.records.len(),
                    "Scanning session finished"
                );
                Ok(Transition::SessionFinished {
                    session_id,
                    new_records,
                })
            }

            (WorkflowState::Results, WorkflowEvent::ScanAnother) => {
                self.state = WorkflowState::Input;
                Ok(Transition::Reset)
            }

            _ => Err(invalid()),
        }
    }

    pub fn submit(
        &mut self,
        date: impl Into<String>,
        truck_number: impl Into<String>,
        credential: impl Into<String>,
    ) -> Result<Transition, WorkflowError> {
        self.apply(WorkflowEvent::Submit {
            date: date.into(),
            truck_number: truck_number.into(),
            credential: credential.into(),
        })
    }

    pub fn accumulate(&mut self, ids: Vec<String>) -> Result<Transition, WorkflowError> {
        self.apply(WorkflowEvent::Accumulate(ids))
    }

    pub fn finish(&mut self) -> Result<Transition, WorkflowError> {
        self.apply(WorkflowEvent::Finish)
    }

    pub fn scan_another(&mut self) -> Result<Transition, WorkflowError> {
        self.apply(WorkflowEvent::ScanAnother)
    }
}
