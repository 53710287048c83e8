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

// Best-effort TCP relay sink
//
// Forwards one JSON line per frame to a fixed remote endpoint over a
// persistent connection. Delivery is fire-and-forget: a frame that cannot
// be sent is dropped, and the next send attempt doubles as the reconnect.
// There is deliberately no backoff, no background reconnect thread and no
// outbound buffering; a consumer needing guaranteed delivery adds its own
// buffering layer behind the socket.

use crate::protocol::RelayFrame;
use crate::sample::Sample;
use crate::sink::RecordSink;
use anyhow::Result;
use std::io::Write;
use std::net::TcpStream;
use tracing::{debug, info, warn};

/// Persistent TCP client for the newline-delimited JSON stream.
///
/// Owns the connection state: `None` means disconnected. The stream is
/// closed on drop, so teardown needs no explicit call on any exit path.
pub struct RelaySink {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl RelaySink {
    /// No I/O happens here; the first `send` (or an explicit `connect`)
    /// establishes the connection.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            stream: None,
        }
    }

    /// One blocking connect attempt with the OS default timeout.
    ///
    /// Returns false on any failure (resolution, refusal, timeout) without
    /// propagating; the sink simply stays disconnected.
    pub fn connect(&mut self) -> bool {
        if self.stream.is_some() {
            return true;
        }

        match TcpStream::connect((self.host.as_str(), self.port)) {
            Ok(stream) => {
                // One small line every 5 ms; Nagle would batch them.
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("failed to set TCP_NODELAY: {}", e);
                }
                info!("relay connected to {}:{}", self.host, self.port);
                self.stream = Some(stream);
                true
            }
            Err(e) => {
                // Attempted once per frame while down; keep the log quiet.
                debug!(
                    "relay connect to {}:{} failed: {}",
                    self.host, self.port, e
                );
                false
            }
        }
    }

    /// Send one line, appending the newline delimiter on the wire.
    ///
    /// Lazy reconnect: if disconnected, try `connect` once inline; if that
    /// fails the frame is dropped and the next call retries. A send error
    /// closes the connection and returns false. Never panics and never
    /// propagates a socket error.
    pub fn send(&mut self, line: &str) -> bool {
        if self.stream.is_none() && !self.connect() {
            return false;
        }
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        let mut payload = String::with_capacity(line.len() + 1);
        payload.push_str(line);
        payload.push('\n');

        match stream.write_all(payload.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "relay send to {}:{} failed, dropping connection: {}",
                    self.host, self.port, e
                );
                self.stream = None;
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn endpoint(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

impl RecordSink for RelaySink {
    /// Best-effort path: the boolean send result is intentionally swallowed.
    /// Connectivity is observable through `healthy` only.
    fn record(&mut self, sample: &Sample) -> Result<()> {
        let line = RelayFrame::from(sample).to_line();
        self.send(&line);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_mut() {
            let _ = stream.flush();
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "relay"
    }

    fn healthy(&self) -> bool {
        self.is_connected()
    }
}
