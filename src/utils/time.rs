#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Wall-clock stopwatch used to fill `PassResult::time_ms`.
#[derive(Clone, Copy)]
pub struct PassTimer(Instant);

impl PassTimer {
    #[must_use]
    pub fn start() -> Self {
        Self(Instant::now())
    }

    /// CPU time spent recording since [`start`](Self::start), in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f32 {
        self.0.elapsed().as_secs_f32() * 1000.0
    }
}
