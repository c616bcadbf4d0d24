//! Parameter automation primitives.
//!
//! Two shapes of control signal drive the engine: [`Smoothed`], a one-pole
//! exponential approach toward a live-tweaked target (the "smoothly approach
//! value with time-constant τ" primitive every bus setter uses), and
//! [`Automated`], an event lane that evaluates scheduled value changes
//! against the absolute sample clock so envelopes can be placed ahead of
//! real time with sample accuracy.

/// One-pole exponential smoother: each sample moves the current value a
/// fixed fraction of the way to the target. Avoids audible stepping when a
/// parameter is changed live.
#[derive(Debug, Clone)]
pub struct Smoothed {
    current: f64,
    target: f64,
    coeff: f64,
}

impl Smoothed {
    /// Default time constant matching the original's 50 ms setters.
    pub const DEFAULT_TAU: f64 = 0.05;

    pub fn new(initial: f64, tau: f64, sample_rate: f64) -> Self {
        Smoothed {
            current: initial,
            target: initial,
            coeff: (-1.0 / (tau.max(1e-4) * sample_rate)).exp(),
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Jump without smoothing (initialization only).
    pub fn snap_to(&mut self, value: f64) {
        self.current = value;
        self.target = value;
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn value(&self) -> f64 {
        self.current
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn tick(&mut self) -> f64 {
        self.current = self.target + (self.current - self.target) * self.coeff;
        self.current
    }
}

/// A scheduled change on an [`Automated`] lane.
#[derive(Debug, Clone, Copy)]
enum AutomationEvent {
    /// Jump to `value` at `time`.
    SetValue { time: f64, value: f64 },
    /// From `time`, approach `value` exponentially with time constant `tau`.
    TargetAt { time: f64, value: f64, tau: f64 },
    /// From `time` to `end`, ramp exponentially from the current value to
    /// `value`. Endpoints must be positive (pitch sweeps).
    ExpRamp { time: f64, end: f64, value: f64 },
}

impl AutomationEvent {
    fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. } => time,
            AutomationEvent::TargetAt { time, .. } => time,
            AutomationEvent::ExpRamp { time, .. } => time,
        }
    }
}

/// The motion the lane is currently performing.
#[derive(Debug, Clone, Copy)]
enum Motion {
    Hold,
    Target { value: f64, coeff: f64 },
    ExpRamp { start: f64, end: f64, from: f64, to: f64 },
}

/// An automation lane evaluated per sample against a monotone clock.
///
/// Events may be scheduled in any order ahead of time; `tick` must be called
/// with non-decreasing `t`. Events sharing a timestamp apply in insertion
/// order, so "set 0 at t, then approach v from t" behaves as written.
#[derive(Debug, Clone)]
pub struct Automated {
    value: f64,
    dt: f64,
    motion: Motion,
    events: Vec<AutomationEvent>,
    next_event: usize,
}

impl Automated {
    pub fn new(initial: f64, sample_rate: f64) -> Self {
        Automated {
            value: initial,
            dt: 1.0 / sample_rate,
            motion: Motion::Hold,
            events: Vec::new(),
            next_event: 0,
        }
    }

    fn insert(&mut self, ev: AutomationEvent) {
        // Stable insert: equal timestamps keep insertion order.
        let at = self.events[self.next_event..]
            .iter()
            .position(|e| e.time() > ev.time())
            .map(|p| self.next_event + p)
            .unwrap_or(self.events.len());
        self.events.insert(at, ev);
    }

    /// Schedule a jump to `value` at time `t`.
    pub fn set_value_at(&mut self, value: f64, t: f64) {
        self.insert(AutomationEvent::SetValue { time: t, value });
    }

    /// Schedule an exponential approach toward `value` with time constant
    /// `tau`, starting at time `t`.
    pub fn set_target_at(&mut self, value: f64, t: f64, tau: f64) {
        self.insert(AutomationEvent::TargetAt {
            time: t,
            value,
            tau: tau.max(1e-4),
        });
    }

    /// Schedule an exponential ramp to `value` over `[t0, t1]`.
    pub fn exp_ramp(&mut self, value: f64, t0: f64, t1: f64) {
        self.insert(AutomationEvent::ExpRamp {
            time: t0,
            end: t1.max(t0 + self.dt),
            value: value.max(1e-6),
        });
    }

    /// Drop all events scheduled at or after time `t`. Motion already in
    /// progress continues.
    pub fn cancel_after(&mut self, t: f64) {
        let keep_until = self.events[self.next_event..]
            .iter()
            .position(|e| e.time() >= t)
            .map(|p| self.next_event + p)
            .unwrap_or(self.events.len());
        self.events.truncate(keep_until);
    }

    /// Advance to time `t` and return the lane value.
    #[inline]
    pub fn tick(&mut self, t: f64) -> f64 {
        while self.next_event < self.events.len() && self.events[self.next_event].time() <= t {
            match self.events[self.next_event] {
                AutomationEvent::SetValue { value, .. } => {
                    self.value = value;
                    self.motion = Motion::Hold;
                }
                AutomationEvent::TargetAt { value, tau, .. } => {
                    self.motion = Motion::Target {
                        value,
                        coeff: (-self.dt / tau).exp(),
                    };
                }
                AutomationEvent::ExpRamp { time, end, value } => {
                    self.motion = Motion::ExpRamp {
                        start: time,
                        end,
                        from: self.value.max(1e-6),
                        to: value,
                    };
                }
            }
            self.next_event += 1;
        }

        match self.motion {
            Motion::Hold => {}
            Motion::Target { value, coeff } => {
                self.value = value + (self.value - value) * coeff;
            }
            Motion::ExpRamp { start, end, from, to } => {
                if t >= end {
                    self.value = to;
                    self.motion = Motion::Hold;
                } else {
                    let frac = (t - start) / (end - start);
                    self.value = from * (to / from).powf(frac.clamp(0.0, 1.0));
                }
            }
        }
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
