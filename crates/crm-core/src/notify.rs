//! Transient user notifications (toasts).
//!
//! Adapters report through the [`Notifier`] trait; [`ToastQueue`] is the
//! stack a page renders in its corner. Toasts expire after a fixed duration;
//! time spent paused (hovered, or window blurred) does not count.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::NotificationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastLevel::Info => "i",
            ToastLevel::Success => "*",
            ToastLevel::Warning => "!",
            ToastLevel::Error => "x",
        }
    }
}

/// Sink for user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: ToastLevel, message: &str);

    fn success(&self, message: &str) {
        self.notify(ToastLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(ToastLevel::Error, message);
    }

    fn info(&self, message: &str) {
        self.notify(ToastLevel::Info, message);
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub level: ToastLevel,
    pub created: Instant,
    pub duration: Duration,
    hovered: bool,
    paused_since: Option<Instant>,
    paused_total: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, level: ToastLevel, duration: Duration) -> Self {
        Self::created_at(message, level, duration, Instant::now())
    }

    fn created_at(
        message: impl Into<String>,
        level: ToastLevel,
        duration: Duration,
        now: Instant,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            level,
            created: now,
            duration,
            hovered: false,
            paused_since: None,
            paused_total: Duration::ZERO,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    /// Running time, excluding pauses.
    pub fn active_time(&self, now: Instant) -> Duration {
        let until = self.paused_since.unwrap_or(now);
        until
            .saturating_duration_since(self.created)
            .saturating_sub(self.paused_total)
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.active_time(now) >= self.duration
    }

    /// Fraction of time remaining, from 1.0 (just created) to 0.0 (expired).
    pub fn remaining_fraction(&self, now: Instant) -> f64 {
        let total = self.duration.as_secs_f64();
        if total <= 0.0 {
            return 0.0;
        }
        (1.0 - self.active_time(now).as_secs_f64() / total).max(0.0)
    }

    fn set_paused(&mut self, paused: bool, now: Instant) {
        match (self.paused_since, paused) {
            (None, true) => self.paused_since = Some(now),
            (Some(since), false) => {
                self.paused_total += now.saturating_duration_since(since);
                self.paused_since = None;
            }
            _ => {}
        }
    }
}

/// Where the stack is anchored. Only the top-right corner is used by the
/// CRM pages, the rest exist for configuration parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPosition {
    TopRight,
    TopCenter,
    TopLeft,
    BottomRight,
    BottomCenter,
    BottomLeft,
}

impl ToastPosition {
    fn parse(raw: &str) -> Self {
        match raw {
            "top-center" => ToastPosition::TopCenter,
            "top-left" => ToastPosition::TopLeft,
            "bottom-right" => ToastPosition::BottomRight,
            "bottom-center" => ToastPosition::BottomCenter,
            "bottom-left" => ToastPosition::BottomLeft,
            _ => ToastPosition::TopRight,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToastSettings {
    pub position: ToastPosition,
    pub auto_close: Duration,
    pub close_on_click: bool,
    pub pause_on_hover: bool,
    pub pause_on_focus_loss: bool,
    pub newest_on_top: bool,
    pub max_visible: usize,
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self::from(&NotificationConfig::default())
    }
}

impl From<&NotificationConfig> for ToastSettings {
    fn from(cfg: &NotificationConfig) -> Self {
        Self {
            position: ToastPosition::parse(&cfg.position),
            auto_close: Duration::from_millis(cfg.auto_close_ms),
            close_on_click: cfg.close_on_click,
            pause_on_hover: cfg.pause_on_hover,
            pause_on_focus_loss: cfg.pause_on_focus_loss,
            newest_on_top: cfg.newest_on_top,
            max_visible: cfg.max_visible.max(1),
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    toasts: VecDeque<Toast>,
    window_blurred: bool,
}

/// Thread-safe toast stack. Oldest toasts are dropped once `max_visible` is
/// exceeded.
#[derive(Debug)]
pub struct ToastQueue {
    settings: ToastSettings,
    state: Mutex<QueueState>,
}

impl ToastQueue {
    pub fn new(settings: ToastSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn settings(&self) -> &ToastSettings {
        &self.settings
    }

    pub fn push(&self, level: ToastLevel, message: impl Into<String>) -> Uuid {
        self.push_at(level, message, Instant::now())
    }

    pub fn push_at(&self, level: ToastLevel, message: impl Into<String>, now: Instant) -> Uuid {
        let mut toast = Toast::created_at(message, level, self.settings.auto_close, now);
        let id = toast.id;
        let mut state = self.lock();
        if state.window_blurred && self.settings.pause_on_focus_loss {
            toast.set_paused(true, now);
        }
        state.toasts.push_back(toast);
        while state.toasts.len() > self.settings.max_visible {
            state.toasts.pop_front();
        }
        id
    }

    /// Drop expired toasts.
    pub fn tick(&self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&self, now: Instant) {
        self.lock().toasts.retain(|t| !t.expired(now));
    }

    /// Toasts in display order.
    pub fn visible(&self) -> Vec<Toast> {
        let state = self.lock();
        let mut toasts: Vec<Toast> = state.toasts.iter().cloned().collect();
        if self.settings.newest_on_top {
            toasts.reverse();
        }
        toasts
    }

    /// Click on a toast. Returns `true` when it was dismissed.
    pub fn click(&self, id: Uuid) -> bool {
        if !self.settings.close_on_click {
            return false;
        }
        self.dismiss(id)
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut state = self.lock();
        let before = state.toasts.len();
        state.toasts.retain(|t| t.id != id);
        state.toasts.len() != before
    }

    pub fn hover(&self, id: Uuid, hovered: bool) {
        self.hover_at(id, hovered, Instant::now());
    }

    pub fn hover_at(&self, id: Uuid, hovered: bool, now: Instant) {
        let mut state = self.lock();
        let blurred = state.window_blurred;
        if let Some(toast) = state.toasts.iter_mut().find(|t| t.id == id) {
            toast.hovered = hovered;
            let paused = self.should_pause(toast, blurred);
            toast.set_paused(paused, now);
        }
    }

    /// The window lost (`false`) or regained (`true`) focus.
    pub fn window_focus(&self, focused: bool) {
        self.window_focus_at(focused, Instant::now());
    }

    pub fn window_focus_at(&self, focused: bool, now: Instant) {
        let mut state = self.lock();
        state.window_blurred = !focused;
        let blurred = state.window_blurred;
        for toast in state.toasts.iter_mut() {
            let paused = self.should_pause(toast, blurred);
            toast.set_paused(paused, now);
        }
    }

    /// Remove and return every toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.lock().toasts.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().toasts.is_empty()
    }

    fn should_pause(&self, toast: &Toast, blurred: bool) -> bool {
        (toast.hovered && self.settings.pause_on_hover)
            || (blurred && self.settings.pause_on_focus_loss)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        // A poisoned queue only ever holds display data; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(ToastSettings::default())
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, level: ToastLevel, message: &str) {
        tracing::debug!(?level, text = message, "toast");
        self.push(level, message);
    }
}
