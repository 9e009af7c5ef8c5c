//! Voice settings panel: catalog profiles, custom sliders, test speech.
//!
//! Tabs:
//!   Profiles: catalog profiles plus the custom entry; Enter selects
//!   Custom: rate / pitch / volume sliders applied when "custom" is active
//!
//! Both tabs share the test text box, the enabled toggle and the
//! available-voice summary.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::super::events::{NotificationLevel, Tab};
use super::super::theme;
use super::{subject_label, truncate_str, InputResult};
use crate::core::voice::types::ParamRange;
use crate::core::voice::{
    KeyValueStore, SpeechPlatform, VoiceSettings, VoiceSettingsPatch, VoiceSettingsResolver,
    CUSTOM_PROFILE_KEY, PITCH_RANGE, RATE_RANGE, VOLUME_RANGE,
};

pub const DEFAULT_TEST_TEXT: &str = "您好，这是语音测试。欢迎使用智能教育助手！";

/// Voice names listed under the summary before eliding
const VOICE_PREVIEW: usize = 3;
const SLIDER_WIDTH: usize = 20;

// ── Sliders ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Rate,
    Pitch,
    Volume,
}

impl Slider {
    pub const ALL: [Slider; 3] = [Slider::Rate, Slider::Pitch, Slider::Volume];

    pub fn label(self) -> &'static str {
        match self {
            Slider::Rate => "语速",
            Slider::Pitch => "音调",
            Slider::Volume => "音量",
        }
    }

    pub fn range(self) -> ParamRange {
        match self {
            Slider::Rate => RATE_RANGE,
            Slider::Pitch => PITCH_RANGE,
            Slider::Volume => VOLUME_RANGE,
        }
    }

    pub fn value(self, settings: &VoiceSettings) -> f32 {
        match self {
            Slider::Rate => settings.rate,
            Slider::Pitch => settings.pitch,
            Slider::Volume => settings.volume,
        }
    }

    fn patch(self, value: f32) -> VoiceSettingsPatch {
        match self {
            Slider::Rate => VoiceSettingsPatch::rate(value),
            Slider::Pitch => VoiceSettingsPatch::pitch(value),
            Slider::Volume => VoiceSettingsPatch::volume(value),
        }
    }
}

// ── State ────────────────────────────────────────────────────────────────────

pub struct VoicePanelState {
    /// Cursor in the Profiles list; the last row is the custom entry
    pub profile_idx: usize,
    pub slider_idx: usize,
    pub test_text: String,
    /// Keystrokes go to the test text box
    pub editing: bool,
}

impl Default for VoicePanelState {
    fn default() -> Self {
        Self::new()
    }
}

impl VoicePanelState {
    pub fn new() -> Self {
        Self {
            profile_idx: 0,
            slider_idx: 0,
            test_text: DEFAULT_TEST_TEXT.to_string(),
            editing: false,
        }
    }

    pub fn slider(&self) -> Slider {
        Slider::ALL[self.slider_idx.min(Slider::ALL.len() - 1)]
    }

    /// Catalog keys in display order followed by the custom entry
    fn profile_rows<S: KeyValueStore, P: SpeechPlatform>(
        resolver: &VoiceSettingsResolver<S, P>,
    ) -> Vec<String> {
        resolver
            .catalog()
            .profile_keys()
            .map(str::to_string)
            .chain(std::iter::once(CUSTOM_PROFILE_KEY.to_string()))
            .collect()
    }

    /// Put the cursor on whatever is selected, so reopening shows it
    pub fn sync_cursor<S: KeyValueStore, P: SpeechPlatform>(
        &mut self,
        resolver: &VoiceSettingsResolver<S, P>,
    ) {
        let rows = Self::profile_rows(resolver);
        let selected = resolver.selected_profile();
        self.profile_idx = rows
            .iter()
            .position(|k| k == selected)
            .unwrap_or(rows.len().saturating_sub(1));
    }

    pub fn handle_input<S: KeyValueStore, P: SpeechPlatform>(
        &mut self,
        tab: Tab,
        event: &Event,
        resolver: &mut VoiceSettingsResolver<S, P>,
    ) -> InputResult {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            modifiers,
            ..
        }) = event
        else {
            return InputResult::Ignored;
        };

        if self.editing {
            return self.edit_text(*code, *modifiers);
        }

        match (*modifiers, *code) {
            (KeyModifiers::NONE, KeyCode::Char('i')) => {
                self.editing = true;
                InputResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('t')) => self.speak_test(resolver),
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                resolver.reset_custom_settings();
                InputResult::Notify(NotificationLevel::Info, "已重置为默认设置".to_string())
            }
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => {
                match tab {
                    Tab::Profiles => {
                        let last = Self::profile_rows(resolver).len().saturating_sub(1);
                        self.profile_idx = (self.profile_idx + 1).min(last);
                    }
                    _ => self.slider_idx = (self.slider_idx + 1).min(Slider::ALL.len() - 1),
                }
                InputResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => {
                match tab {
                    Tab::Profiles => self.profile_idx = self.profile_idx.saturating_sub(1),
                    _ => self.slider_idx = self.slider_idx.saturating_sub(1),
                }
                InputResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Left | KeyCode::Right) if tab == Tab::Custom => {
                let steps = if *code == KeyCode::Left { -1 } else { 1 };
                let slider = self.slider();
                let current = slider.value(resolver.custom_settings());
                let next = slider.range().nudge(current, steps);
                resolver.update_custom_settings(&slider.patch(next));
                InputResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Enter) => {
                let key = match tab {
                    Tab::Profiles => Self::profile_rows(resolver)
                        .get(self.profile_idx)
                        .cloned()
                        .unwrap_or_else(|| CUSTOM_PROFILE_KEY.to_string()),
                    _ => CUSTOM_PROFILE_KEY.to_string(),
                };
                resolver.select_profile(&key);
                let name = resolver
                    .active_profile()
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| "自定义设置".to_string());
                InputResult::Notify(NotificationLevel::Success, format!("已选择：{name}"))
            }
            _ => InputResult::Ignored,
        }
    }

    fn edit_text(&mut self, code: KeyCode, modifiers: KeyModifiers) -> InputResult {
        match code {
            KeyCode::Esc | KeyCode::Enter => self.editing = false,
            KeyCode::Backspace => {
                self.test_text.pop();
            }
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.test_text.clear();
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.test_text.push(c);
            }
            _ => {}
        }
        InputResult::Consumed
    }

    fn speak_test<S: KeyValueStore, P: SpeechPlatform>(
        &self,
        resolver: &VoiceSettingsResolver<S, P>,
    ) -> InputResult {
        if self.test_text.trim().is_empty() {
            return InputResult::Notify(NotificationLevel::Warning, "测试文本为空".to_string());
        }
        if !resolver.is_enabled() {
            return InputResult::Notify(NotificationLevel::Warning, "语音已关闭 (e 开启)".to_string());
        }
        match resolver.speak(&self.test_text, None) {
            Ok(()) => InputResult::Consumed,
            Err(e) => InputResult::Notify(NotificationLevel::Error, format!("语音播放失败: {e}")),
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render<S: KeyValueStore, P: SpeechPlatform>(
        &self,
        frame: &mut Frame,
        area: Rect,
        tab: Tab,
        resolver: &VoiceSettingsResolver<S, P>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // body
                Constraint::Length(4), // test text
                Constraint::Length(4), // voices
            ])
            .split(area);

        match tab {
            Tab::Custom => self.render_custom(frame, chunks[0], resolver),
            _ => self.render_profiles(frame, chunks[0], resolver),
        }
        self.render_test_text(frame, chunks[1], resolver);
        render_voices(frame, chunks[2], resolver);
    }

    fn render_profiles<S: KeyValueStore, P: SpeechPlatform>(
        &self,
        frame: &mut Frame,
        area: Rect,
        resolver: &VoiceSettingsResolver<S, P>,
    ) {
        let block = theme::block_focused("语音配置");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let selected = resolver.selected_profile();
        let mut lines: Vec<Line<'static>> = Vec::new();

        for (i, key) in Self::profile_rows(resolver).iter().enumerate() {
            let is_cursor = i == self.profile_idx;
            let cursor = if is_cursor { "\u{25b8} " } else { "  " };
            let marker = if key == selected { "\u{25cf} " } else { "\u{25cb} " };
            let style = if is_cursor {
                theme::highlight()
            } else {
                Style::default().fg(theme::TEXT)
            };

            let Some(profile) = resolver.catalog().profile(key) else {
                lines.push(Line::from(vec![
                    Span::styled(cursor.to_string(), style),
                    Span::styled(marker.to_string(), style),
                    Span::styled("自定义设置".to_string(), style),
                    Span::styled("  (使用 Custom 页的滑块)".to_string(), theme::muted()),
                ]));
                continue;
            };

            lines.push(Line::from(vec![
                Span::styled(cursor.to_string(), style),
                Span::styled(marker.to_string(), style),
                Span::styled(truncate_str(&profile.name, 16), style),
                Span::raw("  "),
                Span::styled(
                    format!(
                        "[{}] [{}]",
                        profile.gender.display_name(),
                        profile.age_group.display_name()
                    ),
                    Style::default().fg(theme::PRIMARY_LIGHT),
                ),
            ]));
            lines.push(Line::from(Span::styled(
                format!("      {}", profile.description),
                theme::muted(),
            )));
            let subjects: Vec<String> = profile.subjects.iter().map(|s| subject_label(s)).collect();
            lines.push(Line::from(Span::styled(
                format!(
                    "      适合学科：{}  语速 {:.1} | 音调 {:.1} | 音量 {:.1}",
                    subjects.join("、"),
                    profile.settings.rate,
                    profile.settings.pitch,
                    profile.settings.volume
                ),
                theme::dim(),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_custom<S: KeyValueStore, P: SpeechPlatform>(
        &self,
        frame: &mut Frame,
        area: Rect,
        resolver: &VoiceSettingsResolver<S, P>,
    ) {
        let block = theme::block_focused("自定义设置");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let custom = resolver.custom_settings();
        let mut lines: Vec<Line<'static>> = vec![Line::raw("")];

        for (i, slider) in Slider::ALL.iter().enumerate() {
            let focused = i == self.slider_idx;
            let style = if focused {
                theme::highlight()
            } else {
                Style::default().fg(theme::TEXT)
            };
            let range = slider.range();
            let value = slider.value(custom);
            lines.push(Line::from(vec![
                Span::styled(if focused { " \u{25b8} " } else { "   " }.to_string(), style),
                Span::styled(format!("{:<4}", slider.label()), style),
                Span::styled(bar(value, range), theme::slider_fill()),
                Span::styled(format!(" 当前: {value:.1}"), style),
                Span::styled(format!("  ({:.1}-{:.1})", range.min, range.max), theme::dim()),
            ]));
        }

        lines.push(Line::raw(""));
        let active = if resolver.active_profile().is_none() {
            Span::styled("   当前生效", Style::default().fg(theme::SUCCESS))
        } else {
            Span::styled("   Enter 启用自定义设置", theme::muted())
        };
        lines.push(Line::from(active));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_test_text<S: KeyValueStore, P: SpeechPlatform>(
        &self,
        frame: &mut Frame,
        area: Rect,
        resolver: &VoiceSettingsResolver<S, P>,
    ) {
        let block = if self.editing {
            theme::block_focused("测试语音 (编辑中, Enter 完成)")
        } else {
            theme::block_default("测试语音")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let enabled = resolver.is_enabled();
        let label = if enabled { "开" } else { "关" };
        let mut text = vec![Span::raw(format!(" {}", self.test_text))];
        if self.editing {
            text.push(Span::styled("\u{258c}", Style::default().fg(theme::ACCENT)));
        }
        let effective = resolver.effective_settings();
        let lines = vec![
            Line::from(text),
            Line::from(vec![
                Span::styled(" 语音输出: ", theme::muted()),
                Span::styled(label, theme::toggle(enabled)),
                Span::styled(
                    format!(
                        "   生效参数: 语速 {:.1} | 音调 {:.1} | 音量 {:.1}",
                        effective.rate, effective.pitch, effective.volume
                    ),
                    theme::dim(),
                ),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn render_voices<S: KeyValueStore, P: SpeechPlatform>(
    frame: &mut Frame,
    area: Rect,
    resolver: &VoiceSettingsResolver<S, P>,
) {
    let block = theme::block_default("系统语音");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = match voice_summary(resolver.available_voices().iter().map(|v| v.name.as_str())) {
        Some((count, preview)) => vec![
            Line::from(Span::styled(format!(" 系统可用语音: {count} 个"), theme::muted())),
            Line::from(Span::styled(format!(" {preview}"), theme::dim())),
        ],
        None => vec![Line::from(Span::styled(
            " 暂无可用语音，将使用平台默认声音",
            theme::dim(),
        ))],
    };
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Count plus the first few names, `None` when empty
pub fn voice_summary<'a>(names: impl Iterator<Item = &'a str>) -> Option<(usize, String)> {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        return None;
    }
    let mut preview = names.iter().take(VOICE_PREVIEW).copied().collect::<Vec<_>>().join("、");
    if names.len() > VOICE_PREVIEW {
        preview.push_str("...");
    }
    Some((names.len(), preview))
}

fn bar(value: f32, range: ParamRange) -> String {
    let span = (range.max - range.min).max(f32::EPSILON);
    let filled = (((value - range.min) / span) * SLIDER_WIDTH as f32).round() as usize;
    let filled = filled.min(SLIDER_WIDTH);
    format!(
        "[{}{}]",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(SLIDER_WIDTH - filled)
    )
}
