//! Heuristic obstacle classifier.
//!
//! Maintains a 10-channel × 8-step feature window over the two range
//! beams and classifies what the cane is facing from hand-tuned shape
//! rules.  Channels 0–1 are the raw lower/upper distances; the rest are
//! derived (height difference, mean, per-beam rate of change, variance,
//! and a zero-crossing frequency estimate).
//!
//! The rules read the lower/upper averages, their height difference, and
//! the lower-beam variance over the window:
//!
//! | shape signature                                  | kind     | confidence |
//! |--------------------------------------------------|----------|------------|
//! | both beams close, flat window                    | `wall`   | 0.92       |
//! | lower close, upper open                          | `table`  | 0.81       |
//! | both medium, jagged lower beam                   | `stairs` | 0.89       |
//! | moderate jitter, beams agree                     | `person` | 0.87       |
//! | lower close, medium height step                  | `chair`  | 0.81       |
//! | lower very close, upper medium                   | `pole`   | 0.78       |
//! | lower medium, beams level                        | `door`   | 0.72       |
//!
//! Rules are tried top to bottom; the first match wins.  A non-match
//! scores the default 0.6 confidence and, since only scores *above* 0.6
//! replace the held classification, never overwrites a previous confident
//! result.

/// Feature channels per time step.
const CHANNELS: usize = 10;
/// Sliding window length.
const WINDOW: usize = 8;
/// Assumed sampling period in seconds for the frequency estimate.
const SAMPLE_PERIOD_S: f32 = 0.1;

/// A classification result: what, and how sure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub kind: &'static str,
    pub confidence: f32,
}

/// Sliding-window obstacle classifier over two range beams.
#[derive(Debug)]
pub struct ObstacleClassifier {
    /// `buffer[channel][step]`, oldest step first.
    buffer: [[f32; WINDOW]; CHANNELS],
    current: Classification,
}

impl ObstacleClassifier {
    pub fn new() -> Self {
        Self {
            buffer: [[0.0; WINDOW]; CHANNELS],
            current: Classification {
                kind: "unknown",
                confidence: 0.0,
            },
        }
    }

    /// The most recent confident classification.
    pub fn current(&self) -> Classification {
        self.current
    }

    /// Push one reading pair into the window and recompute the derived
    /// channels for the newest step.
    pub fn update(&mut self, lower_cm: f32, upper_cm: f32) {
        for channel in &mut self.buffer {
            channel.copy_within(1.., 0);
        }
        let last = WINDOW - 1;

        self.buffer[0][last] = lower_cm;
        self.buffer[1][last] = upper_cm;
        self.buffer[2][last] = (lower_cm - upper_cm).abs();
        self.buffer[3][last] = (lower_cm + upper_cm) / 2.0;

        // Rates of change need a previous sample to difference against.
        if self.buffer[0][last - 1] != 0.0 {
            self.buffer[4][last] = self.buffer[0][last - 1] - lower_cm;
            self.buffer[5][last] = self.buffer[1][last - 1] - upper_cm;
        } else {
            self.buffer[4][last] = 0.0;
            self.buffer[5][last] = 0.0;
        }

        self.buffer[6][last] = self.variance(0);
        self.buffer[7][last] = self.variance(1);
        self.buffer[8][last] = self.peak_frequency(0);
        self.buffer[9][last] = self.peak_frequency(1);
    }

    /// Run the shape rules over the current window.
    ///
    /// Returns the held classification, which only changes when a rule
    /// matched (all rule confidences sit above the 0.6 default).
    pub fn classify(&mut self) -> Classification {
        let lower_avg: f32 = self.buffer[0].iter().sum::<f32>() / WINDOW as f32;
        let upper_avg: f32 = self.buffer[1].iter().sum::<f32>() / WINDOW as f32;
        let height_diff = (upper_avg - lower_avg).abs();
        let variance: f32 = self.buffer[0]
            .iter()
            .map(|v| (v - lower_avg).powi(2))
            .sum::<f32>()
            / WINDOW as f32;

        let (kind, confidence): (&'static str, f32) =
            if lower_avg < 50.0 && upper_avg < 50.0 && variance < 10.0 {
                ("wall", 0.92)
            } else if lower_avg < 70.0 && upper_avg > 150.0 {
                ("table", 0.81)
            } else if lower_avg < 100.0 && upper_avg < 100.0 && variance > 50.0 {
                ("stairs", 0.89)
            } else if variance > 20.0 && variance < 50.0 && (lower_avg - upper_avg).abs() < 30.0 {
                ("person", 0.87)
            } else if lower_avg < 80.0 && height_diff > 30.0 && height_diff < 80.0 {
                ("chair", 0.81)
            } else if lower_avg < 30.0 && upper_avg > 80.0 && upper_avg < 150.0 {
                ("pole", 0.78)
            } else if lower_avg > 50.0 && lower_avg < 120.0 && height_diff < 20.0 {
                ("door", 0.72)
            } else {
                ("unknown", 0.6)
            };

        if confidence > 0.6 {
            self.current = Classification { kind, confidence };
        }
        self.current
    }

    /// Variance of a channel over its valid (non-zero) samples.
    fn variance(&self, channel: usize) -> f32 {
        let valid: Vec<f32> = self.buffer[channel]
            .iter()
            .copied()
            .filter(|&v| v > 0.0)
            .collect();
        if valid.is_empty() {
            return 0.0;
        }
        let mean: f32 = valid.iter().sum::<f32>() / valid.len() as f32;
        valid.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / valid.len() as f32
    }

    /// Crude dominant-frequency estimate: crossings of the window mean
    /// per unit time.
    fn peak_frequency(&self, channel: usize) -> f32 {
        let samples = &self.buffer[channel];
        let mean: f32 = samples.iter().filter(|&&v| v > 0.0).sum::<f32>() / WINDOW as f32;

        let mut crossings = 0u32;
        let mut above = samples[0] > mean;
        for &sample in &samples[1..] {
            let now_above = sample > mean;
            if above != now_above && sample > 0.0 {
                crossings += 1;
                above = now_above;
            }
        }
        crossings as f32 / (WINDOW as f32 * SAMPLE_PERIOD_S)
    }
}

impl Default for ObstacleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
