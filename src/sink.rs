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

// Sink abstraction for write-only sample recording
//
// A sink is a destination that durably records or forwards a formatted
// sample: the CSV log and the TCP relay both implement it, and the
// collector fans every frame out to whichever sinks it was built with.
//
// This module is WRITE-ONLY. Reading recordings back is a consumer concern
// (spreadsheet, pandas, a downstream model process).

pub mod csv;
pub mod relay;

pub use csv::CsvSink;
pub use relay::RelaySink;

use crate::sample::Sample;
use anyhow::Result;

/// Destination for collected samples.
///
/// Implementations format the sample themselves (row vs. JSON line) so the
/// collector stays format-agnostic. `record` is called once per frame on the
/// sampling path: implementations must degrade to a status flag rather than
/// panic, and best-effort sinks should swallow their own failures.
pub trait RecordSink {
    /// Record a single sample.
    fn record(&mut self, sample: &Sample) -> Result<()>;

    /// Push any buffered data down to the OS.
    fn flush(&mut self) -> Result<()>;

    /// Short identifier for logs and the status display.
    fn kind(&self) -> &'static str;

    /// Whether the sink is currently able to deliver.
    fn healthy(&self) -> bool {
        true
    }
}
