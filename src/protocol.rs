// Copyright 2025 the emg-relay developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Wire format for the TCP relay: newline-delimited JSON, one object per frame.

use crate::sample::{Sample, CHANNEL_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One relayed frame as it appears on the wire.
///
/// Receivers parse lines with any JSON decoder; the serde derives exist so
/// Rust consumers can deserialize the stream directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelayFrame {
    pub timestamp: f64,
    pub sample: u64,
    pub emg: [i8; CHANNEL_COUNT],
}

impl From<&Sample> for RelayFrame {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample.elapsed,
            sample: sample.seq,
            emg: sample.channels,
        }
    }
}

impl RelayFrame {
    /// Encode as a single JSON line, without the trailing newline.
    ///
    /// Hand-formatted rather than serde_json::to_string: the timestamp must
    /// carry exactly 6 fractional digits, which float printing does not
    /// guarantee.
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(96);
        let _ = write!(
            line,
            "{{\"timestamp\":{:.6},\"sample\":{},\"emg\":[",
            self.timestamp, self.sample
        );
        for (i, ch) in self.emg.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            let _ = write!(line, "{}", ch);
        }
        line.push_str("]}");
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_golden() {
        let sample = Sample::new(1.234567, 42, [1, -2, 3, -4, 5, -6, 7, -8]);
        let line = RelayFrame::from(&sample).to_line();
        assert_eq!(
            line,
            "{\"timestamp\":1.234567,\"sample\":42,\"emg\":[1,-2,3,-4,5,-6,7,-8]}"
        );
    }

    #[test]
    fn test_line_is_valid_json() {
        let sample = Sample::new(0.005, 1, [-128, 127, 0, 1, -1, 64, -64, 32]);
        let line = RelayFrame::from(&sample).to_line();
        assert!(!line.contains('\n'));

        let parsed: RelayFrame = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.sample, 1);
        assert_eq!(parsed.emg, sample.channels);
        assert!((parsed.timestamp - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_serde_roundtrip() {
        let frame = RelayFrame {
            timestamp: 12.5,
            sample: 99,
            emg: [9, -9, 8, -8, 7, -7, 6, -6],
        };
        let json = serde_json::to_string(&frame).unwrap();
        let back: RelayFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_emg_array_length_on_wire() {
        let sample = Sample::new(0.0, 0, [0; CHANNEL_COUNT]);
        let line = RelayFrame::from(&sample).to_line();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["emg"].as_array().unwrap().len(), CHANNEL_COUNT);
    }
}
