//! TUI Rendering
//!
//! Translates `AppState` into Ratatui widgets, one screen per workflow state.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use tagscan_core::WorkflowState;
use tagscan_media::CaptureState;

use crate::app::{AppState, Field, InputForm};

/// Main draw function.
pub fn draw_ui(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(5),    // Screen
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Key help
        ])
        .split(f.size());

    let help = match state.workflow.state() {
        WorkflowState::Input => {
            draw_input(f, chunks[0], &state.form);
            "Tab: next field  Enter: start  Esc: quit"
        }
        WorkflowState::Scanning { .. } => {
            draw_scanner(f, chunks[0], state);
            "Space: capture  f: finish  r: retry camera"
        }
        WorkflowState::Results => {
            draw_results(f, chunks[0], state);
            "e: export CSV  n: next truck  q: quit"
        }
    };

    if let Some(notice) = &state.notice {
        f.render_widget(
            Paragraph::new(notice.as_str()).style(Style::default().fg(Color::Red)),
            chunks[1],
        );
    }
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(format!("{value}{cursor}"), style),
    ])
}

fn draw_input(f: &mut Frame, area: Rect, form: &InputForm) {
    let masked = "*".repeat(form.credential.chars().count());
    let submit_style = if form.is_complete() {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let lines = vec![
        Line::from("情報を入力してスキャンを開始してください。"),
        Line::from(""),
        field_line("Gemini APIキー", masked, form.focus == Field::Credential),
        field_line("日付", form.date.clone(), form.focus == Field::Date),
        field_line("トラック番号", form.truck_number.clone(), form.focus == Field::TruckNumber),
        Line::from(""),
        Line::from(Span::styled("[ スキャン開始 ]", submit_style)),
    ];

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title("トラックカートスキャナー")
                .borders(Borders::ALL),
        ),
        area,
    );
}

fn draw_scanner(f: &mut Frame, area: Rect, state: &AppState) {
    let capture = &state.capture;
    let camera_style = match capture.state() {
        CaptureState::Ready => Style::default().fg(Color::Green),
        CaptureState::CameraError(_) => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Yellow),
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw("camera: "),
            Span::styled(capture.state().label(), camera_style),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("スキャンされたカート: "),
            Span::styled(
                state.workflow.session_scans().len().to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    if capture.is_capturing() {
        lines.push(Line::from("スキャン中..."));
    }
    if let Some(last) = capture.last_scan() {
        lines.push(Line::from(format!("最後のスキャン: {last}")));
    }
    if let Some(error) = capture.error() {
        lines.push(Line::from(Span::styled(error, Style::default().fg(Color::Red))));
    }

    let title = state
        .workflow
        .truck()
        .map(|truck| format!("スキャン: {truck}"))
        .unwrap_or_else(|| "スキャン".to_string());

    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn draw_results(f: &mut Frame, area: Rect, state: &AppState) {
    let records = state.workflow.records();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    // Summary reflects the first record, matching the export filename.
    let summary = match records.first() {
        Some(first) => vec![
            Line::from(format!("日付: {}", first.date)),
            Line::from(format!("トラック番号: {}", first.truck_number)),
            Line::from(format!("スキャン総数: {}", records.len())),
        ],
        None => vec![Line::from("まだタグはスキャンされていません。")],
    };
    f.render_widget(
        Paragraph::new(summary).block(Block::default().title("スキャン結果").borders(Borders::ALL)),
        chunks[0],
    );

    let rows = records
        .iter()
        .map(|r| Row::new(vec![Cell::from(r.tag_id.as_str())]));
    let table = Table::new(rows, [Constraint::Percentage(100)])
        .header(Row::new(vec!["荷札番号"]).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(table, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 20)).unwrap();
        terminal.draw(|f| draw_ui(f, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn input_masks_the_credential() {
        let state = AppState::new(Some("secret-key".into()), "i");
        let screen = rendered(&state);
        assert!(!screen.contains("secret-key"));
        assert!(screen.contains("**********"));
        assert!(screen.contains("Enter: start"));
    }

    #[test]
    fn results_list_every_tag() {
        let mut state = AppState::new(Some("k".into()), "i");
        state.form.date = "2024-05-01".into();
        state.form.truck_number = "T-9".into();
        state.submit();
        state
            .workflow
            .accumulate(vec!["TAG-1".into(), "TAG-2".into()])
            .unwrap();
        state.finish();

        let screen = rendered(&state);
        assert!(screen.contains("2024-05-01"));
        assert!(screen.contains("T-9"));
        assert!(screen.contains("TAG-1"));
        assert!(screen.contains("TAG-2"));
    }

    #[test]
    fn scanner_shows_camera_state() {
        let mut state = AppState::new(Some("k".into()), "i");
        state.form.truck_number = "T-9".into();
        state.submit();
        let screen = rendered(&state);
        assert!(screen.contains("camera: idle"));
        assert!(screen.contains("Space: capture"));
    }
}
