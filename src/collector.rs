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

// Sample collector: the per-frame fan-out entry point

use crate::sample::{Sample, CHANNEL_COUNT};
use crate::sink::RecordSink;
use std::time::Instant;
use tracing::warn;

/// Receives sensor callbacks and fans each frame out to the configured sinks.
///
/// Exactly two triggers exist: `on_frame` (the hot path, once per delivered
/// frame) and `on_signal_loss` (device unpaired or stopped streaming, resets
/// the last-known reading to zeros). Sequence numbers start at 0 and
/// increase by exactly 1 per frame for the collector's lifetime.
///
/// Everything runs on the single thread that drives the source; sinks are
/// owned exclusively, so no locking is involved. A sink write failure is
/// logged and never interrupts sampling.
pub struct SampleCollector {
    sinks: Vec<Box<dyn RecordSink>>,
    channels: [i8; CHANNEL_COUNT],
    count: u64,
    start: Instant,
}

impl SampleCollector {
    pub fn new(sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self {
            sinks,
            channels: [0; CHANNEL_COUNT],
            count: 0,
            start: Instant::now(),
        }
    }

    /// Hot path: one call per sensor frame.
    ///
    /// The host timestamp identifies the frame on the device clock; the
    /// recorded timestamp is elapsed time on our clock since construction,
    /// which is what the log and wire formats carry.
    pub fn on_frame(&mut self, channels: [i8; CHANNEL_COUNT], _host_timestamp_us: u64) {
        self.channels = channels;

        let elapsed = self.start.elapsed().as_secs_f64();
        let sample = Sample::new(elapsed, self.count, channels);

        for sink in &mut self.sinks {
            if let Err(e) = sink.record(&sample) {
                warn!("{} sink failed to record frame {}: {:#}", sink.kind(), sample.seq, e);
            }
        }

        self.count += 1;
    }

    /// Device unpaired or signal lost: zero the last-known reading.
    pub fn on_signal_loss(&mut self, _host_timestamp_us: u64) {
        self.channels = [0; CHANNEL_COUNT];
    }

    /// Last-known channel values, for the live display.
    pub fn current_channels(&self) -> [i8; CHANNEL_COUNT] {
        self.channels
    }

    /// Total frames delivered so far (also the next sequence number).
    pub fn sample_count(&self) -> u64 {
        self.count
    }

    /// (kind, healthy) per sink, for the status line.
    pub fn sink_status(&self) -> Vec<(&'static str, bool)> {
        self.sinks
            .iter()
            .map(|s| (s.kind(), s.healthy()))
            .collect()
    }

    /// Flush all sinks. Called once when sampling stops.
    pub fn finish(&mut self) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.flush() {
                warn!("{} sink failed to flush: {:#}", sink.kind(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Test double capturing everything recorded through it.
    struct CapturingSink {
        samples: Rc<RefCell<Vec<Sample>>>,
        fail: bool,
    }

    impl RecordSink for CapturingSink {
        fn record(&mut self, sample: &Sample) -> Result<()> {
            if self.fail {
                anyhow::bail!("injected failure");
            }
            self.samples.borrow_mut().push(*sample);
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn kind(&self) -> &'static str {
            "capturing"
        }
    }

    fn collector_with_capture() -> (SampleCollector, Rc<RefCell<Vec<Sample>>>) {
        let samples = Rc::new(RefCell::new(Vec::new()));
        let sink = CapturingSink {
            samples: samples.clone(),
            fail: false,
        };
        (SampleCollector::new(vec![Box::new(sink)]), samples)
    }

    #[test]
    fn test_sequence_numbers_are_contiguous() {
        let (mut collector, samples) = collector_with_capture();
        for i in 0..50 {
            collector.on_frame([i as i8; CHANNEL_COUNT], i * 5000);
        }

        let seqs: Vec<u64> = samples.borrow().iter().map(|s| s.seq).collect();
        assert_eq!(seqs, (0..50).collect::<Vec<u64>>());
        assert_eq!(collector.sample_count(), 50);
    }

    #[test]
    fn test_elapsed_is_monotonic_and_nonnegative() {
        let (mut collector, samples) = collector_with_capture();
        for i in 0..10 {
            collector.on_frame([0; CHANNEL_COUNT], i);
        }

        let elapsed: Vec<f64> = samples.borrow().iter().map(|s| s.elapsed).collect();
        assert!(elapsed[0] >= 0.0);
        assert!(elapsed.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_signal_loss_zeroes_current_channels() {
        let (mut collector, _samples) = collector_with_capture();
        collector.on_frame([7, -7, 7, -7, 7, -7, 7, -7], 0);
        assert_eq!(collector.current_channels()[0], 7);

        collector.on_signal_loss(5000);
        assert_eq!(collector.current_channels(), [0; CHANNEL_COUNT]);
        // The count is untouched: signal loss is not a frame.
        assert_eq!(collector.sample_count(), 1);
    }

    #[test]
    fn test_sink_failure_does_not_stop_sampling() {
        let good = Rc::new(RefCell::new(Vec::new()));
        let failing = CapturingSink {
            samples: Rc::new(RefCell::new(Vec::new())),
            fail: true,
        };
        let capturing = CapturingSink {
            samples: good.clone(),
            fail: false,
        };
        let mut collector = SampleCollector::new(vec![Box::new(failing), Box::new(capturing)]);

        collector.on_frame([1; CHANNEL_COUNT], 0);
        collector.on_frame([2; CHANNEL_COUNT], 5000);

        // Frames still reached the healthy sink and the count still advanced.
        assert_eq!(good.borrow().len(), 2);
        assert_eq!(collector.sample_count(), 2);
    }

    #[test]
    fn test_fan_out_reaches_all_sinks() {
        let a = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::new(RefCell::new(Vec::new()));
        let mut collector = SampleCollector::new(vec![
            Box::new(CapturingSink {
                samples: a.clone(),
                fail: false,
            }),
            Box::new(CapturingSink {
                samples: b.clone(),
                fail: false,
            }),
        ]);

        collector.on_frame([1, -2, 3, -4, 5, -6, 7, -8], 0);

        assert_eq!(a.borrow().len(), 1);
        assert_eq!(b.borrow().len(), 1);
        assert_eq!(a.borrow()[0].channels, b.borrow()[0].channels);
    }

    #[test]
    fn test_sink_status_reports_kinds() {
        let (collector, _samples) = collector_with_capture();
        let status = collector.sink_status();
        assert_eq!(status, vec![("capturing", true)]);
    }
}
