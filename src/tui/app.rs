use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::{mpsc, Mutex};

use super::events::{AppEvent, Notification, NotificationLevel, Tab};
use super::theme;
use super::views::tutor::TutorPanelState;
use super::views::voice::VoicePanelState;
use super::views::InputResult;
use crate::core::education::{QuestionRequest, Tutor};
use crate::core::voice::{KeyValueStore, SpeechPlatform, VoiceSettingsResolver};

const MAX_NOTIFICATIONS: usize = 3;
const NOTIFICATION_TTL_TICKS: u32 = 60;

/// Central application state (Elm architecture).
pub struct AppState<S: KeyValueStore, P: SpeechPlatform> {
    /// Whether the app is still running.
    pub running: bool,
    pub tab: Tab,
    pub voice: VoicePanelState,
    pub tutor: TutorPanelState,
    /// Active notifications (max 3 visible).
    pub notifications: Vec<Notification>,
    notification_counter: u64,
    resolver: VoiceSettingsResolver<S, P>,
    tutor_engine: Arc<Mutex<Tutor>>,
    tick_rate: Duration,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl<S: KeyValueStore, P: SpeechPlatform> AppState<S, P> {
    /// `resolver` should already be initialized.
    pub fn new(resolver: VoiceSettingsResolver<S, P>, tutor: Tutor, tick_rate: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut voice = VoicePanelState::new();
        voice.sync_cursor(&resolver);
        Self {
            running: true,
            tab: Tab::Profiles,
            voice,
            tutor: TutorPanelState::new(),
            notifications: Vec::new(),
            notification_counter: 0,
            resolver,
            tutor_engine: Arc::new(Mutex::new(tutor)),
            tick_rate,
            event_rx,
            event_tx,
        }
    }

    pub fn resolver(&self) -> &VoiceSettingsResolver<S, P> {
        &self.resolver
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(self.tick_rate);
        let mut event_stream = EventStream::new();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.handle_event(AppEvent::Tick);
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    /// Drain events queued by background tasks without blocking.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    // ── Event handling ──────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => self.on_tick(),
            AppEvent::Input(input) => self.handle_input(&input),
            AppEvent::TutorAnswer { subject_id, response } => {
                let answer = response.answer.clone();
                self.tutor.receive(response);
                if let Err(e) = self.resolver.speak(&answer, Some(&subject_id)) {
                    tracing::warn!(error = %e, "Failed to speak tutor answer");
                    self.push_notification(format!("语音播放失败: {e}"), NotificationLevel::Error);
                }
            }
            AppEvent::Notification(n) => self.push_notification(n.message, n.level),
            AppEvent::Quit => self.running = false,
        }
    }

    fn handle_input(&mut self, event: &Event) {
        // The test text box swallows everything while editing
        let editing = self.voice.editing && self.tab != Tab::Tutor;

        if !editing {
            if let Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                modifiers,
                ..
            }) = event
            {
                match (*modifiers, *code) {
                    (KeyModifiers::NONE, KeyCode::Char('q')) => {
                        self.running = false;
                        return;
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        self.running = false;
                        return;
                    }
                    (KeyModifiers::NONE, KeyCode::Tab) => {
                        self.tab = self.tab.next();
                        return;
                    }
                    (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                        self.tab = self.tab.prev();
                        return;
                    }
                    (KeyModifiers::NONE, KeyCode::Char('e')) => {
                        self.resolver.toggle_enabled();
                        if !self.resolver.is_enabled() {
                            self.resolver.platform().cancel();
                        }
                        let msg = if self.resolver.is_enabled() { "语音已开启" } else { "语音已关闭" };
                        self.push_notification(msg.to_string(), NotificationLevel::Info);
                        return;
                    }
                    _ => {}
                }
            }
        }

        let result = match self.tab {
            Tab::Tutor => self.tutor.handle_input(event),
            tab => self.voice.handle_input(tab, event, &mut self.resolver),
        };

        match result {
            InputResult::Ignored | InputResult::Consumed => {}
            InputResult::Notify(level, message) => self.push_notification(message, level),
            InputResult::Ask(request) => self.ask_tutor(request),
        }
    }

    /// Answer on a background task; the reply comes back as `TutorAnswer`.
    fn ask_tutor(&self, request: QuestionRequest) {
        let tutor = Arc::clone(&self.tutor_engine);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let response = tutor.lock().await.ask(&request).await;
            let _ = tx.send(AppEvent::TutorAnswer {
                subject_id: request.subject,
                response,
            });
        });
    }

    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }

        self.notification_counter += 1;
        self.notifications.push(Notification {
            id: self.notification_counter,
            message,
            level,
            ttl_ticks: NOTIFICATION_TTL_TICKS,
        });

        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    /// Tick: decrement notification TTLs, advance the typewriter, pick up new voices.
    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);

        self.tutor.tick(self.tick_rate);

        if self.resolver.poll_voices() {
            let count = self.resolver.available_voices().len();
            self.push_notification(format!("检测到 {count} 个系统语音"), NotificationLevel::Info);
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_tabs(frame, chunks[0]);
        match self.tab {
            Tab::Tutor => self.tutor.render(frame, chunks[1]),
            tab => self.voice.render(frame, chunks[1], tab, &self.resolver),
        }
        self.render_status_bar(frame, chunks[2]);
        self.render_notifications(frame, area);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(" 语音设置 ", theme::brand_badge()), Span::raw(" ")];
        for t in Tab::ALL {
            let style = if t == self.tab {
                Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT_MUTED)
            };
            spans.push(Span::styled(format!(" {} ", t.label()), style));
            spans.push(Span::raw("\u{2502}"));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(Line::from(spans)), inner);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode = if self.voice.editing && self.tab != Tab::Tutor {
            Span::styled(" INSERT ", theme::insert_badge())
        } else {
            Span::raw("")
        };

        let hints: &[(&str, &str)] = match self.tab {
            Tab::Profiles => &[("↑↓", "选择"), ("Enter", "使用"), ("t", "试听"), ("i", "编辑"), ("e", "开关")],
            Tab::Custom => &[("↑↓", "参数"), ("←→", "调整"), ("Enter", "启用"), ("r", "重置"), ("t", "试听")],
            Tab::Tutor => &[("↑↓", "学科"), ("←→", "知识点"), ("Enter", "提问"), ("Space", "跳过")],
        };

        let mut spans = vec![Span::styled(" TUTORVOX ", theme::brand_badge()), mode, Span::raw(" ")];
        for (key, label) in hints.iter().chain([("Tab", "切换"), ("q", "退出")].iter()) {
            spans.push(Span::styled(*key, theme::key_hint().add_modifier(Modifier::BOLD)));
            spans.push(Span::raw(format!(":{label} ")));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let max_width = 50.min(area.width.saturating_sub(2));
        let height = (self.notifications.len() as u16).min(area.height);
        let x = area.width.saturating_sub(max_width + 1);
        let notification_area = Rect::new(x, 1.min(area.height.saturating_sub(height)), max_width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Info => ("ℹ", theme::INFO),
                    NotificationLevel::Success => ("✓", theme::SUCCESS),
                    NotificationLevel::Warning => ("⚠", theme::WARNING),
                    NotificationLevel::Error => ("✗", theme::ERROR),
                };
                Line::from(vec![
                    Span::styled(format!(" {prefix} "), Style::default().fg(color).bold()),
                    Span::raw(n.message.as_str()),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(Paragraph::new(lines), notification_area);
    }
}
