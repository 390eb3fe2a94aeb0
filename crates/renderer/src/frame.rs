use std::time::{Duration, Instant};

use tracing::debug;

/// Lifecycle of the tick chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Explicit RUNNING/STOPPED flag checked before every reschedule, plus the
/// once-a-second render stats.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    frame_count: u64,
    frames_since_last_update: u32,
    last_fps_update: Instant,
    frames_per_second: f32,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            frame_count: 0,
            frames_since_last_update: 0,
            last_fps_update: Instant::now(),
            frames_per_second: 0.0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Moves to `Stopped`. Returns `true` only for the call that made the
    /// transition.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = LoopState::Stopped;
        was_running
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn record_frame(&mut self, time: f32) {
        self.frame_count = self.frame_count.saturating_add(1);
        self.frames_since_last_update += 1;

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.frame_count,
                time,
                "render stats"
            );
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Shader time in seconds for a tick timestamp in milliseconds.
pub fn seconds_from_timestamp(timestamp_ms: f64) -> f32 {
    (timestamp_ms * 0.001) as f32
}

/// Where tick timestamps come from.
pub trait TimeSource: Send {
    /// Restarts the clock at zero.
    fn reset(&mut self);
    /// Milliseconds since the animation started.
    fn timestamp_ms(&mut self) -> f64;
}

/// Monotonic wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
    }

    fn timestamp_ms(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock frozen at a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    timestamp_ms: f64,
}

impl FixedTimeSource {
    pub fn from_seconds(seconds: f32) -> Self {
        Self {
            timestamp_ms: f64::from(seconds) * 1000.0,
        }
    }

    pub fn from_millis(timestamp_ms: f64) -> Self {
        Self { timestamp_ms }
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {}

    fn timestamp_ms(&mut self) -> f64 {
        self.timestamp_ms
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource>;

/// Animated clock unless a still time is requested.
pub fn time_source_for(still_time: Option<f32>) -> BoxedTimeSource {
    match still_time {
        Some(seconds) => Box::new(FixedTimeSource::from_seconds(seconds)),
        None => Box::new(SystemTimeSource::new()),
    }
}
