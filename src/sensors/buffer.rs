//! Circular PPG sample window.
//!
//! Holds the most recent [`WINDOW_LEN`] infrared/red pairs in two parallel
//! arrays (the layout the estimation routine consumes).  A fresh or reset
//! buffer is zero-filled; [`SampleBuffer::is_filled`] only turns true once
//! the cursor has wrapped, so estimation never sees that zero fill.

/// Number of sample pairs in one estimation window.
pub const WINDOW_LEN: usize = 50;

/// One PPG acquisition: infrared and red LED intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PpgSample {
    pub infrared: u32,
    pub red: u32,
}

impl PpgSample {
    pub const fn new(infrared: u32, red: u32) -> Self {
        Self { infrared, red }
    }
}

pub struct SampleBuffer {
    infrared: [u32; WINDOW_LEN],
    red: [u32; WINDOW_LEN],
    cursor: usize,
    filled: bool,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuffer {
    pub const fn new() -> Self {
        Self {
            infrared: [0; WINDOW_LEN],
            red: [0; WINDOW_LEN],
            cursor: 0,
            filled: false,
        }
    }

    /// Overwrite the oldest slot and advance the cursor.
    ///
    /// `filled` latches true when the cursor wraps back to 0.
    pub fn push(&mut self, sample: PpgSample) {
        self.infrared[self.cursor] = sample.infrared;
        self.red[self.cursor] = sample.red;
        self.cursor = (self.cursor + 1) % WINDOW_LEN;
        if self.cursor == 0 {
            self.filled = true;
        }
    }

    /// Forget the current window.  Idempotent.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.filled = false;
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Infrared window in storage order (not chronological once wrapped).
    pub fn infrared(&self) -> &[u32; WINDOW_LEN] {
        &self.infrared
    }

    /// Red window in storage order.
    pub fn red(&self) -> &[u32; WINDOW_LEN] {
        &self.red
    }

    /// Copy of both windows, oldest sample first.
    pub fn chronological(&self) -> ([u32; WINDOW_LEN], [u32; WINDOW_LEN]) {
        let mut infrared = [0; WINDOW_LEN];
        let mut red = [0; WINDOW_LEN];
        for i in 0..WINDOW_LEN {
            let slot = (self.cursor + i) % WINDOW_LEN;
            infrared[i] = self.infrared[slot];
            red[i] = self.red[slot];
        }
        (infrared, red)
    }
}
