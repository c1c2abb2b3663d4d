//! Render pacing and lifecycle. The controller is fed wall-clock deltas and
//! answers two questions per tick: how far the animation advances, and
//! whether this tick draws a frame.

/// Seconds between drawn frames. Animation runs on the caller's clock and is
/// not quantized to this.
pub const FRAME_INTERVAL: f32 = 1.0 / 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobePhase {
    /// Scene not built yet; ticks are inert.
    Loading,
    Running,
    Paused,
    /// Terminal. No phase leaves Disposed.
    Disposed,
}

/// What one tick asks of the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Seconds of animation to apply. Nonzero on every running tick, drawn
    /// or skipped, so rotation speed is independent of the frame cap.
    pub advance_dt: f32,
    pub render: bool,
}

impl Tick {
    const INERT: Tick = Tick {
        advance_dt: 0.0,
        render: false,
    };
}

pub struct LoopController {
    phase: GlobePhase,
    interval: f32,
    accumulated: f32,
    frames_rendered: u64,
}

impl LoopController {
    pub fn new() -> Self {
        Self {
            phase: GlobePhase::Loading,
            interval: FRAME_INTERVAL,
            accumulated: 0.0,
            frames_rendered: 0,
        }
    }

    pub fn phase(&self) -> GlobePhase {
        self.phase
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Scene is ready; ticks start counting.
    pub fn begin_running(&mut self) {
        if self.phase == GlobePhase::Loading {
            self.phase = GlobePhase::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.phase == GlobePhase::Running {
            self.phase = GlobePhase::Paused;
        }
    }

    /// Returns true when the caller owes an immediate draw, so a freshly
    /// revealed window never shows a stale frame.
    pub fn resume(&mut self) -> bool {
        if self.phase != GlobePhase::Paused {
            return false;
        }
        self.phase = GlobePhase::Running;
        self.accumulated = 0.0;
        true
    }

    pub fn dispose(&mut self) {
        self.phase = GlobePhase::Disposed;
    }

    pub fn is_disposed(&self) -> bool {
        self.phase == GlobePhase::Disposed
    }

    /// Advance by `dt` seconds. `visible` gates drawing only; a hidden
    /// running globe keeps animating.
    pub fn tick(&mut self, dt: f32, visible: bool) -> Tick {
        if self.phase != GlobePhase::Running {
            return Tick::INERT;
        }
        self.accumulated += dt;
        let render = visible && self.accumulated >= self.interval;
        if render {
            self.accumulated %= self.interval;
            self.frames_rendered += 1;
        }
        Tick {
            advance_dt: dt,
            render,
        }
    }
}

impl Default for LoopController {
    fn default() -> Self {
        Self::new()
    }
}
