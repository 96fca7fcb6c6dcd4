use std::time::{Duration, Instant};

/// Wall-clock cost of the passes of the most recent `update()`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameProfile {
    /// Hard-sphere contact resolution and depenetration, MD collision counting.
    /// The MD pair pass is counted under `integrate_time`.
    pub resolve_time: Duration,
    pub integrate_time: Duration,
    pub adapt_time: Duration,
    pub stats_time: Duration,
    pub total_time: Duration,

    pub particle_count: usize,
    pub substeps: u32,
}

impl FrameProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Multi-line summary suitable for a debug log line.
    pub fn report(&self) -> String {
        let total_us = self.total_time.as_micros().max(1) as f32;
        let share = |d: Duration| d.as_micros() as f32 / total_us * 100.0;
        let ms = |d: Duration| d.as_secs_f32() * 1000.0;
        format!(
            "particles: {}, sub-steps: {}, total: {:.2} ms\n  resolve:   {:.2} ms ({:.1}%)\n  integrate: {:.2} ms ({:.1}%)\n  adapt:     {:.2} ms ({:.1}%)\n  stats:     {:.2} ms ({:.1}%)",
            self.particle_count,
            self.substeps,
            ms(self.total_time),
            ms(self.resolve_time),
            share(self.resolve_time),
            ms(self.integrate_time),
            share(self.integrate_time),
            ms(self.adapt_time),
            share(self.adapt_time),
            ms(self.stats_time),
            share(self.stats_time),
        )
    }
}

/// Adds the lifetime of the guard to `output`.
pub struct ProfileTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> ProfileTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl Drop for ProfileTimer<'_> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
