/*
 * Notifications Module
 *
 * Short-lived user-facing messages about what the environment did: spawns,
 * evictions, failed loads, connection changes. The viewer draws them as
 * toasts; headless runs just let them expire.
 */

use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub remaining: Duration,
}

pub struct Notifications {
    notices: VecDeque<Notice>,
    ttl: Duration,
    limit: usize,
}

impl Notifications {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3);
    pub const DEFAULT_LIMIT: usize = 6;

    pub fn new() -> Self {
        Self::with_limits(Self::DEFAULT_TTL, Self::DEFAULT_LIMIT)
    }

    pub fn with_limits(ttl: Duration, limit: usize) -> Self {
        Self {
            notices: VecDeque::new(),
            ttl,
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        if self.notices.len() >= self.limit {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            message: message.into(),
            remaining: self.ttl,
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    // Count down every notice and drop the ones that ran out
    pub fn tick(&mut self, dt: Duration) {
        for notice in self.notices.iter_mut() {
            notice.remaining = notice.remaining.saturating_sub(dt);
        }
        self.notices.retain(|notice| !notice.remaining.is_zero());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    // Fraction of its lifetime a notice has left, for fading
    pub fn opacity(&self, notice: &Notice) -> f32 {
        if self.ttl.is_zero() {
            return 0.0;
        }
        (notice.remaining.as_secs_f32() / self.ttl.as_secs_f32()).clamp(0.0, 1.0)
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}
