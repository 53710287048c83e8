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

// EMG sample relay
//
// Records 8-channel EMG frames from a wearable armband:
// - Appends every frame to a CSV log, header first, flushed every 100 rows
// - Optionally relays each frame as newline-delimited JSON over TCP,
//   best-effort with lazy reconnect
// - Keeps the last-known reading available for a live terminal display
//
// The vendor SDK owns discovery, pairing and the radio link; this crate
// starts at the frame callback.

pub mod collector;
pub mod protocol;
pub mod sample;
pub mod sink;
pub mod source;

// Re-export main types
pub use collector::SampleCollector;
pub use protocol::RelayFrame;
pub use sample::{Sample, CHANNEL_COUNT, CSV_HEADER};
pub use sink::{CsvSink, RecordSink, RelaySink};
pub use source::{FrameEvent, FrameSource, SimulatedSource, SourceError};
