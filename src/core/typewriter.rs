//! Character-by-character text reveal for tutor answers

use std::time::Duration;

pub const DEFAULT_SPEED: Duration = Duration::from_millis(50);
/// Used for long answer blocks
pub const BLOCK_SPEED: Duration = Duration::from_millis(30);

#[derive(Debug, Clone)]
pub struct Typewriter {
    text: String,
    speed: Duration,
    /// Characters revealed so far
    shown: usize,
    total: usize,
    carry: Duration,
    completed: bool,
}

impl Typewriter {
    pub fn new(text: impl Into<String>, speed: Duration) -> Self {
        let text = text.into();
        let total = text.chars().count();
        Self {
            text,
            speed,
            shown: 0,
            total,
            carry: Duration::ZERO,
            completed: false,
        }
    }

    /// Replace the text and start over
    pub fn set_text(&mut self, text: impl Into<String>) {
        *self = Self::new(text, self.speed);
    }

    /// Feed elapsed time. Returns true on the one call that finishes the text.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if self.completed {
            return false;
        }

        if self.speed.is_zero() {
            self.shown = self.total;
        } else {
            self.carry += elapsed;
            while self.shown < self.total && self.carry >= self.speed {
                self.carry -= self.speed;
                self.shown += 1;
            }
        }

        if self.shown == self.total {
            self.completed = true;
            self.carry = Duration::ZERO;
            return true;
        }
        false
    }

    /// Reveal everything at once
    pub fn finish(&mut self) -> bool {
        self.shown = self.total;
        self.advance(Duration::ZERO)
    }

    pub fn visible(&self) -> &str {
        match self.text.char_indices().nth(self.shown) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// The blinking cursor is drawn while typing
    pub fn show_cursor(&self) -> bool {
        !self.completed
    }
}
