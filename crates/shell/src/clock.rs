use std::time::Instant;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Seconds since the clock was created.
    pub elapsed: f32,
    pub frame_index: u64,
}

/// Monotonic frame clock. Delta time is the real gap between ticks; callers
/// that want to bound motion after a stall clamp it themselves.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            frame_index: 0,
        }
    }

    /// Advance to now.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advance to `now`. An instant earlier than the previous tick yields a
    /// zero delta.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last);
        self.last = self.last.max(now);

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.last.saturating_duration_since(self.start).as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}
