//! Tutor console: pick a subject and topic, ask, watch the answer type out.

use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::super::theme;
use super::InputResult;
use crate::core::education::{learning_objective, subjects, QuestionRequest, Subject, TutorResponse};
use crate::core::typewriter::{Typewriter, BLOCK_SPEED};

pub struct TutorPanelState {
    pub subject_idx: usize,
    pub topic_idx: usize,
    /// A question is with the tutor
    pub pending: bool,
    pub typewriter: Typewriter,
    pub last_response: Option<TutorResponse>,
}

impl Default for TutorPanelState {
    fn default() -> Self {
        Self::new()
    }
}

impl TutorPanelState {
    pub fn new() -> Self {
        Self {
            subject_idx: 0,
            topic_idx: 0,
            pending: false,
            typewriter: Typewriter::new("", BLOCK_SPEED),
            last_response: None,
        }
    }

    pub fn subject(&self) -> Option<&'static Subject> {
        subjects().get(self.subject_idx)
    }

    /// The canned question for the current selection
    pub fn question(&self) -> Option<QuestionRequest> {
        let subject = self.subject()?;
        let topic = subject.topics.get(self.topic_idx)?;
        Some(QuestionRequest::new(
            &subject.id,
            &topic.id,
            &format!("请讲解一下{}：{}", topic.name, topic.description),
        ))
    }

    pub fn handle_input(&mut self, event: &Event) -> InputResult {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            modifiers: KeyModifiers::NONE,
            ..
        }) = event
        else {
            return InputResult::Ignored;
        };

        let subject_count = subjects().len();
        let topic_count = self.subject().map(|s| s.topics.len()).unwrap_or(0);

        match code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.subject_idx = (self.subject_idx + 1).min(subject_count.saturating_sub(1));
                self.topic_idx = 0;
                InputResult::Consumed
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.subject_idx = self.subject_idx.saturating_sub(1);
                self.topic_idx = 0;
                InputResult::Consumed
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.topic_idx = (self.topic_idx + 1).min(topic_count.saturating_sub(1));
                InputResult::Consumed
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.topic_idx = self.topic_idx.saturating_sub(1);
                InputResult::Consumed
            }
            KeyCode::Enter if !self.pending => match self.question() {
                Some(request) => {
                    self.pending = true;
                    self.typewriter.set_text("");
                    InputResult::Ask(request)
                }
                None => InputResult::Consumed,
            },
            KeyCode::Char(' ') => {
                self.typewriter.finish();
                InputResult::Consumed
            }
            _ => InputResult::Ignored,
        }
    }

    /// Start revealing a fresh answer
    pub fn receive(&mut self, response: TutorResponse) {
        self.pending = false;
        self.typewriter.set_text(response.answer.clone());
        self.last_response = Some(response);
    }

    /// Returns true on the tick the answer finishes typing
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.last_response.is_none() {
            return false;
        }
        self.typewriter.advance(elapsed)
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);

        self.render_subjects(frame, columns[0]);
        self.render_answer(frame, columns[1]);
    }

    fn render_subjects(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_default("学科");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line<'static>> = Vec::new();
        for (i, subject) in subjects().iter().enumerate() {
            let selected = i == self.subject_idx;
            let style = if selected {
                theme::highlight()
            } else {
                Style::default().fg(theme::TEXT)
            };
            lines.push(Line::from(Span::styled(
                format!("{}{} {}", if selected { "\u{25b8} " } else { "  " }, subject.icon, subject.name),
                style,
            )));
            if selected {
                for (j, topic) in subject.topics.iter().enumerate() {
                    let topic_style = if j == self.topic_idx {
                        Style::default().fg(theme::PRIMARY_LIGHT)
                    } else {
                        theme::muted()
                    };
                    lines.push(Line::from(Span::styled(
                        format!(
                            "    {} {} ({}, {}分钟)",
                            if j == self.topic_idx { "\u{2022}" } else { " " },
                            topic.name,
                            topic.difficulty.display_name(),
                            topic.estimated_time
                        ),
                        topic_style,
                    )));
                }
            }
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_answer(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_focused("智能辅导");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line<'static>> = Vec::new();

        if let Some(objective) = self.subject().and_then(|s| learning_objective(&s.id)) {
            lines.push(Line::from(Span::styled(format!("目标: {}", objective.primary), theme::heading())));
            lines.push(Line::from(Span::styled(
                format!("技能: {}", objective.skills.join("、")),
                theme::muted(),
            )));
            lines.push(Line::raw(""));
        }

        if self.pending {
            lines.push(Line::from(Span::styled("思考中...", Style::default().fg(theme::WARNING))));
        } else if let Some(response) = &self.last_response {
            let mut text: Vec<Line<'static>> = self
                .typewriter
                .visible()
                .lines()
                .map(|l| Line::raw(l.to_string()))
                .collect();
            if self.typewriter.show_cursor() {
                match text.last_mut() {
                    Some(last) => last.push_span(Span::styled("|", Style::default().fg(theme::ACCENT))),
                    None => text.push(Line::from(Span::styled("|", Style::default().fg(theme::ACCENT)))),
                }
            }
            lines.extend(text);

            if self.typewriter.is_complete() {
                lines.push(Line::raw(""));
                lines.push(Line::from(Span::styled(response.explanation.clone(), theme::muted())));
                lines.push(Line::from(Span::styled(
                    format!("相关: {}", response.related_topics.join("、")),
                    theme::dim(),
                )));
                lines.push(Line::from(Span::styled(
                    format!("下一步: {}", response.next_steps.join(" → ")),
                    theme::dim(),
                )));
                lines.push(Line::from(Span::styled(
                    format!("置信度 {:.0}%", response.confidence * 100.0),
                    theme::dim(),
                )));
            }
        } else {
            lines.push(Line::from(Span::styled(
                "选择学科与知识点，按 Enter 提问",
                theme::muted(),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
