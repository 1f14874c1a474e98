//! Confidence-window sampling.
//!
//! A reading is only trusted after [`CONFIDENCE`] consecutive in-range samples whose combined
//! X/Y variance stays under [`SamplingConfig::max_deviation`]. A single missed sample empties
//! the window, so a finger has to stay down for a whole window before anything is reported.

use embedded_hal::delay::DelayNs;
use log::{debug, trace};

use super::{FilteredReading, RawSample};

/// Samples per confidence window.
pub const CONFIDENCE: usize = 5;

/// Timing and acceptance threshold for one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplingConfig {
    /// Give up after this long without an accepted window.
    pub timeout_ms: u32,
    /// Pause between samples.
    pub step_ms: u32,
    /// Largest accepted population variance, X and Y summed, in raw units squared.
    pub max_deviation: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            step_ms: 50,
            max_deviation: 50,
        }
    }
}

impl SamplingConfig {
    // A zero step would never drain the timeout budget
    pub(crate) fn clamped(mut self) -> Self {
        self.step_ms = self.step_ms.max(1);
        self
    }
}

/// Ring buffer of the most recent raw samples.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfidenceWindow {
    samples: [RawSample; CONFIDENCE],
    next: usize,
    filled: usize,
}

impl Default for ConfidenceWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfidenceWindow {
    pub const fn new() -> Self {
        Self {
            samples: [RawSample { raw_x: 0, raw_y: 0 }; CONFIDENCE],
            next: 0,
            filled: 0,
        }
    }

    /// Number of samples collected since the last reset, saturating at [`CONFIDENCE`].
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == CONFIDENCE
    }

    /// Overwrites the oldest sample.
    pub fn push(&mut self, sample: RawSample) {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % CONFIDENCE;
        self.filled = (self.filled + 1).min(CONFIDENCE);
    }

    /// Forgets the collected samples. The write position is kept; a refill overwrites all slots
    /// before the window is evaluated again.
    pub fn reset(&mut self) {
        self.filled = 0;
    }

    /// Mean of a full window if its variance is within `max_deviation`.
    pub fn evaluate(&self, max_deviation: u32) -> Option<FilteredReading> {
        if !self.is_full() {
            return None;
        }

        let n = CONFIDENCE as u32;
        let (sum_x, sum_y) = self.samples.iter().fold((0u32, 0u32), |(sx, sy), s| {
            (sx + u32::from(s.raw_x), sy + u32::from(s.raw_y))
        });
        let mean_x = sum_x / n;
        let mean_y = sum_y / n;

        let spread: u32 = self
            .samples
            .iter()
            .map(|s| squared_distance(s.raw_x, mean_x) + squared_distance(s.raw_y, mean_y))
            .sum();

        // spread / n <= max_deviation, without dropping the remainder
        if spread > max_deviation.saturating_mul(n) {
            trace!("window rejected, variance {}/{}", spread, n);
            return None;
        }

        Some(FilteredReading {
            mean_x: mean_x as u16,
            mean_y: mean_y as u16,
        })
    }

    /// Feeds one acquisition step: a sample extends the window, a miss resets it.
    pub fn observe(
        &mut self,
        sample: Option<RawSample>,
        max_deviation: u32,
    ) -> Option<FilteredReading> {
        match sample {
            Some(sample) => {
                self.push(sample);
                self.evaluate(max_deviation)
            }
            None => {
                self.reset();
                None
            }
        }
    }
}

fn squared_distance(value: u16, mean: u32) -> u32 {
    let d = u32::from(value).abs_diff(mean);
    d * d
}

/// Timeout-bounded loop around a [`ConfidenceWindow`].
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Denoiser {
    config: SamplingConfig,
}

impl Denoiser {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config: config.clamped(),
        }
    }

    pub fn config(&self) -> SamplingConfig {
        self.config
    }

    /// Pulls samples from `source` until a window is accepted or the timeout budget runs out.
    ///
    /// `Ok(None)` means no stable touch. Errors from `source` end the loop and are returned as-is.
    pub fn acquire<D, E, F>(
        &self,
        delay: &mut D,
        mut source: F,
    ) -> Result<Option<FilteredReading>, E>
    where
        D: DelayNs,
        F: FnMut() -> Result<Option<RawSample>, E>,
    {
        let mut window = ConfidenceWindow::new();
        let mut budget = self.config.timeout_ms;

        while budget > 0 {
            let sample = source()?;
            if let Some(reading) = window.observe(sample, self.config.max_deviation) {
                debug!("touch accepted at raw ({}, {})", reading.mean_x, reading.mean_y);
                return Ok(Some(reading));
            }

            delay.delay_ms(self.config.step_ms);
            budget = budget.saturating_sub(self.config.step_ms);
        }

        debug!("no stable touch within {} ms", self.config.timeout_ms);
        Ok(None)
    }

    /// [`acquire`](Self::acquire) for an async sample source and an async delay.
    #[cfg(feature = "async")]
    pub async fn acquire_async<D, E, F>(
        &self,
        delay: &mut D,
        mut source: F,
    ) -> Result<Option<FilteredReading>, E>
    where
        D: embedded_hal_async::delay::DelayNs,
        F: AsyncFnMut() -> Result<Option<RawSample>, E>,
    {
        let mut window = ConfidenceWindow::new();
        let mut budget = self.config.timeout_ms;

        while budget > 0 {
            let sample = source().await?;
            if let Some(reading) = window.observe(sample, self.config.max_deviation) {
                debug!("touch accepted at raw ({}, {})", reading.mean_x, reading.mean_y);
                return Ok(Some(reading));
            }

            delay.delay_ms(self.config.step_ms).await;
            budget = budget.saturating_sub(self.config.step_ms);
        }

        debug!("no stable touch within {} ms", self.config.timeout_ms);
        Ok(None)
    }
}
