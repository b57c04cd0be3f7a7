//! Event Loop
//!
//! Owns the terminal and the app state, multiplexing keyboard input with
//! recognition results from spawned calls. Only one call can be in flight;
//! results are tagged with the session they were started in.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use tagscan_core::{
    CameraDevice, CredentialStore, RecognitionError, RecordExporter, CREDENTIAL_KEY, CSV_MIME_TYPE,
};
use tagscan_logging::{ScanEvent, ScanEventLogger};
use tagscan_understanding::RecognitionClient;

use crate::app::AppState;
use crate::input::{handle_key_event, Command};
use crate::render::draw_ui;

/// Collaborators the scanner needs at runtime.
pub struct ScannerDeps {
    pub camera: Arc<dyn CameraDevice>,
    pub client: RecognitionClient,
    pub store: Arc<dyn CredentialStore>,
    pub exporter: RecordExporter,
    pub instruction: String,
}

/// A finished recognition call.
#[derive(Debug)]
pub struct ScanDone {
    pub session_id: Uuid,
    pub outcome: Result<String, RecognitionError>,
}

pub struct Scanner {
    state: AppState,
    deps: ScannerDeps,
    results_tx: mpsc::Sender<ScanDone>,
}

impl Scanner {
    /// The credential is read once here, as the Input screen is entered.
    pub fn new(deps: ScannerDeps) -> (Self, mpsc::Receiver<ScanDone>) {
        let (results_tx, results_rx) = mpsc::channel(8);
        let state = AppState::new(deps.store.get(CREDENTIAL_KEY), deps.instruction.clone());
        (
            Self {
                state,
                deps,
                results_tx,
            },
            results_rx,
        )
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if let Some(command) = handle_key_event(key, &mut self.state) {
            self.execute(command).await;
        }
    }

    pub fn accept(&mut self, done: ScanDone) {
        self.state.accept_scan(done.session_id, done.outcome);
    }

    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::SaveCredential(value) => {
                if let Err(err) = self.deps.store.set(CREDENTIAL_KEY, &value) {
                    warn!(error = %format!("{err:#}"), "Credential could not be saved");
                    self.state.notice = Some(format!("APIキーを保存できませんでした: {err:#}"));
                }
            }
            Command::StartCamera => {
                self.state.start_camera(self.deps.camera.as_ref()).await;
            }
            Command::Capture => self.capture().await,
            Command::Export => self.export().await,
            Command::ScanAnother => {
                let credential = self.deps.store.get(CREDENTIAL_KEY);
                self.state.scan_another(credential);
            }
        }
    }

    async fn capture(&mut self) {
        let Some((session_id, pending)) = self.state.begin_capture().await else {
            return;
        };
        match self.deps.client.prepare() {
            Ok(prepared) => {
                let tx = self.results_tx.clone();
                tokio::spawn(async move {
                    let outcome = prepared.run(pending.image, pending.instruction).await;
                    if tx.send(ScanDone { session_id, outcome }).await.is_err() {
                        info!(%session_id, "Scanner closed before recognition finished");
                    }
                });
            }
            Err(err) => {
                self.state.accept_scan(session_id, Err(err));
            }
        }
    }

    async fn export(&mut self) {
        let records = self.state.workflow.records();
        match self.deps.exporter.export(records).await {
            Ok(Some(path)) => {
                ScanEventLogger::log_event(
                    None,
                    ScanEvent::Exported {
                        path: path.display().to_string(),
                        mime_type: CSV_MIME_TYPE.to_string(),
                        records: records.len(),
                    },
                );
                self.state.notice = Some(format!("保存しました: {}", path.display()));
            }
            Ok(None) => {}
            Err(err) => {
                error!(error = %format!("{err:#}"), "Export failed");
                self.state.notice = Some(format!("エクスポートに失敗しました: {err:#}"));
            }
        }
    }
}

/// Run the interactive scanner until the operator quits.
pub async fn run_ui(deps: ScannerDeps) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, deps).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop<B: Backend>(terminal: &mut Terminal<B>, deps: ScannerDeps) -> Result<()> {
    let (mut scanner, mut results) = Scanner::new(deps);
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| draw_ui(f, scanner.state()))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    scanner.handle_key(key).await;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("Terminal event stream failed"),
                None => break,
            },
            Some(done) = results.recv() => scanner.accept(done),
        }

        if scanner.state().should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tagscan_core::{Frame, InlineImage, VisionBackend, WorkflowState};
    use tagscan_media::{encode_png, CaptureState, DirectoryCamera, StillImageCamera};

    #[derive(Default)]
    struct TestStore(Mutex<HashMap<String, String>>);

    impl CredentialStore for TestStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().insert(key.into(), value.into());
            Ok(())
        }
    }

    struct Reply(&'static str);

    #[async_trait]
    impl VisionBackend for Reply {
        fn name(&self) -> &str {
            "reply"
        }

        async fn generate(&self, _image: &InlineImage, _instruction: &str) -> anyhow::Result<String> {
            if self.0.is_empty() {
                Err(anyhow!("quota exceeded"))
            } else {
                Ok(self.0.to_string())
            }
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        scanner: Scanner,
        results: mpsc::Receiver<ScanDone>,
        store: Arc<TestStore>,
        export_dir: std::path::PathBuf,
    }

    fn tag_png() -> Vec<u8> {
        encode_png(&Frame::new(2, 2, vec![9; 16])).unwrap()
    }

    fn fixture(reply: &'static str) -> Fixture {
        fixture_with(reply, |dir| {
            let image = dir.join("tag.png");
            std::fs::write(&image, tag_png()).unwrap();
            Arc::new(StillImageCamera::new(&image))
        })
    }

    fn fixture_with(
        reply: &'static str,
        camera: impl FnOnce(&std::path::Path) -> Arc<dyn CameraDevice>,
    ) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let camera = camera(dir.path());
        let export_dir = dir.path().join("out");

        let store = Arc::new(TestStore::default());
        let client = RecognitionClient::new(store.clone(), move |_: &str| -> Arc<dyn VisionBackend> {
            Arc::new(Reply(reply))
        });
        let (scanner, results) = Scanner::new(ScannerDeps {
            camera,
            client,
            store: store.clone(),
            exporter: RecordExporter::new(&export_dir),
            instruction: "read".into(),
        });
        Fixture {
            dir,
            scanner,
            results,
            store,
            export_dir,
        }
    }

    async fn type_keys(scanner: &mut Scanner, keys: &[KeyCode]) {
        for code in keys {
            scanner.handle_key(KeyEvent::new(*code, KeyModifiers::NONE)).await;
        }
    }

    async fn start_session(fx: &mut Fixture) {
        type_keys(&mut fx.scanner, &[KeyCode::Char('k'), KeyCode::Tab, KeyCode::Tab]).await;
        type_keys(&mut fx.scanner, &[KeyCode::Char('T'), KeyCode::Enter]).await;
    }

    #[tokio::test]
    async fn full_session_exports_csv() {
        let mut fx = fixture("111, 222");
        start_session(&mut fx).await;
        assert_eq!(fx.store.get(CREDENTIAL_KEY).as_deref(), Some("k"));
        assert!(fx.scanner.state().capture.has_stream());

        type_keys(&mut fx.scanner, &[KeyCode::Char(' ')]).await;
        let done = fx.results.recv().await.unwrap();
        fx.scanner.accept(done);
        assert_eq!(fx.scanner.state().workflow.session_scans(), ["111", "222"]);

        type_keys(&mut fx.scanner, &[KeyCode::Char('f'), KeyCode::Char('e')]).await;
        assert!(!fx.scanner.state().capture.has_stream());
        let files: Vec<_> = std::fs::read_dir(&fx.export_dir).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert!(fx.scanner.state().notice.is_some());
    }

    #[tokio::test]
    async fn late_result_after_finish_is_discarded() {
        let mut fx = fixture("111");
        start_session(&mut fx).await;
        type_keys(&mut fx.scanner, &[KeyCode::Char(' '), KeyCode::Char('f')]).await;

        let done = fx.results.recv().await.unwrap();
        fx.scanner.accept(done);
        assert_eq!(fx.scanner.state().workflow.state(), &WorkflowState::Results);
        assert!(fx.scanner.state().workflow.records().is_empty());
    }

    #[tokio::test]
    async fn service_failure_is_shown_and_nothing_accumulates() {
        let mut fx = fixture("");
        start_session(&mut fx).await;
        type_keys(&mut fx.scanner, &[KeyCode::Char(' ')]).await;
        let done = fx.results.recv().await.unwrap();
        fx.scanner.accept(done);

        let state = fx.scanner.state();
        assert!(state.workflow.session_scans().is_empty());
        assert!(state.capture.error().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn scan_another_rereads_the_stored_credential() {
        let mut fx = fixture("1");
        start_session(&mut fx).await;
        type_keys(&mut fx.scanner, &[KeyCode::Char('f')]).await;
        fx.store.set(CREDENTIAL_KEY, "rotated").unwrap();
        type_keys(&mut fx.scanner, &[KeyCode::Char('n')]).await;
        assert_eq!(fx.scanner.state().form.credential, "rotated");
    }

    #[tokio::test]
    async fn unreadable_snapshot_is_recovered_by_reopening_the_camera() {
        let mut fx = fixture_with("777", |dir| {
            let snapshots = dir.join("camera");
            std::fs::create_dir_all(&snapshots).unwrap();
            let mut truncated = b"\x89PNG\r\n\x1a\n".to_vec();
            truncated.extend_from_slice(b"partial write");
            std::fs::write(snapshots.join("shot.png"), truncated).unwrap();
            Arc::new(DirectoryCamera::new(snapshots, None))
        });
        let snapshot = fx.dir.path().join("camera/shot.png");
        start_session(&mut fx).await;
        assert_eq!(fx.scanner.state().capture.state(), &CaptureState::Ready);

        type_keys(&mut fx.scanner, &[KeyCode::Char(' ')]).await;
        assert!(matches!(
            fx.scanner.state().capture.state(),
            CaptureState::CameraError(_)
        ));
        assert!(!fx.scanner.state().capture.has_stream());

        std::fs::write(&snapshot, tag_png()).unwrap();
        type_keys(&mut fx.scanner, &[KeyCode::Char('r')]).await;
        assert_eq!(fx.scanner.state().capture.state(), &CaptureState::Ready);

        type_keys(&mut fx.scanner, &[KeyCode::Char(' ')]).await;
        let done = fx.results.recv().await.unwrap();
        fx.scanner.accept(done);
        assert_eq!(fx.scanner.state().workflow.session_scans(), ["777"]);
    }
}
