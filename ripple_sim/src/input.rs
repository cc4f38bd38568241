//! Pointer normalization and the idle reset. Client coordinates arrive in the
//! same units as the viewport and are divided through without clamping, so
//! only coordinates inside the window land in `[0, 1]`.

use std::time::{Duration, Instant};

/// Normalized pointer position plus the frame-to-frame delta that drives impulses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

/// Which device family feeds the normalizer. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Pointer,
    Touch,
}

/// Raw event handed over by the windowing layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer { client_x: f64, client_y: f64 },
    /// Active touch points in client coordinates; only the first is tracked.
    Touch { touches: Vec<(f64, f64)> },
}

/// Debounced one-shot deadline. Re-arming replaces any pending deadline, so at
/// most one reset is outstanding.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl IdleTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    pub fn rearm(&mut self, now: Instant) {
        self.deadline = Some(now + self.timeout);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the deadline has passed, then disarms.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputNormalizer {
    mode: InputMode,
    sample: PointerSample,
    prev_x: f32,
    prev_y: f32,
    idle: IdleTimer,
    zero_velocity_on_idle: bool,
}

impl InputNormalizer {
    pub fn new(mode: InputMode, idle_timeout: Duration) -> Self {
        Self {
            mode,
            sample: PointerSample::default(),
            prev_x: 0.0,
            prev_y: 0.0,
            idle: IdleTimer::new(idle_timeout),
            zero_velocity_on_idle: false,
        }
    }

    /// Also clear velocity when the idle reset fires. Off by default, which
    /// leaves a fading impulse at the origin after the reset.
    pub fn with_zero_velocity_on_idle(mut self, enabled: bool) -> Self {
        self.zero_velocity_on_idle = enabled;
        self
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn sample(&self) -> &PointerSample {
        &self.sample
    }

    pub fn sample_mut(&mut self) -> &mut PointerSample {
        &mut self.sample
    }

    pub fn idle_pending(&self) -> bool {
        self.idle.is_pending()
    }

    /// Apply one raw event. Returns `false` when the event was skipped because
    /// it belongs to the other input mode or carries no touch point.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        viewport_width: u32,
        viewport_height: u32,
        now: Instant,
    ) -> bool {
        let (client_x, client_y) = match (self.mode, event) {
            (InputMode::Pointer, InputEvent::Pointer { client_x, client_y }) => {
                (*client_x, *client_y)
            }
            (InputMode::Touch, InputEvent::Touch { touches }) => match touches.first() {
                Some(&point) => point,
                None => {
                    log::debug!("touch event without touch points skipped");
                    return false;
                }
            },
            _ => return false,
        };

        let x = (client_x / viewport_width as f64) as f32;
        let y = (client_y / viewport_height as f64) as f32;
        self.sample.x = x;
        self.sample.y = y;
        self.sample.vx = x - self.prev_x;
        self.sample.vy = y - self.prev_y;
        self.prev_x = x;
        self.prev_y = y;

        self.idle.rearm(now);
        true
    }

    /// Fire the idle reset if its deadline has passed. Returns `true` when the
    /// position was reset during this call.
    pub fn poll_idle(&mut self, now: Instant) -> bool {
        if !self.idle.poll(now) {
            return false;
        }
        self.sample.x = 0.0;
        self.sample.y = 0.0;
        if self.zero_velocity_on_idle {
            self.sample.vx = 0.0;
            self.sample.vy = 0.0;
        }
        log::debug!("pointer idle; position reset to origin");
        true
    }
}
