use std::fmt::Write as _;

/// Number of EMG channels delivered per frame by the armband.
pub const CHANNEL_COUNT: usize = 8;

/// CSV header written once at the top of every log file.
pub const CSV_HEADER: &str = "timestamp,sample_number,emg1,emg2,emg3,emg4,emg5,emg6,emg7,emg8\n";

/// One timestamped sensor frame.
///
/// `seq` starts at 0 and increases by exactly 1 per delivered frame;
/// `elapsed` is seconds since the collector was constructed. A sample is
/// never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub elapsed: f64,
    pub seq: u64,
    pub channels: [i8; CHANNEL_COUNT],
}

impl Sample {
    pub fn new(elapsed: f64, seq: u64, channels: [i8; CHANNEL_COUNT]) -> Self {
        Self {
            elapsed,
            seq,
            channels,
        }
    }

    /// Render the sample as one CSV row, newline-terminated.
    ///
    /// Layout: `<elapsed:6 decimals>,<seq>,<ch0>,...,<ch7>\n`, channels as
    /// signed decimal integers.
    pub fn csv_row(&self) -> String {
        let mut row = String::with_capacity(64);
        let _ = write!(row, "{:.6},{}", self.elapsed, self.seq);
        for ch in &self.channels {
            let _ = write!(row, ",{}", ch);
        }
        row.push('\n');
        row
    }
}
