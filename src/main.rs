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

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use emg_relay::collector::SampleCollector;
use emg_relay::sink::{CsvSink, RecordSink, RelaySink};
use emg_relay::source::{FrameEvent, FrameSource, SimulatedSource};

/// EMG sample relay - log armband frames to CSV and forward them over TCP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay endpoint address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Relay endpoint port
    #[arg(long, default_value_t = 9002)]
    port: u16,

    /// Disable the TCP relay entirely; log to CSV only
    #[arg(long)]
    no_socket: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Bounded wait for device discovery at startup.
const DISCOVERY_WINDOW: Duration = Duration::from_secs(10);

/// Per-iteration poll bound: one frame interval at 200 Hz.
const POLL_TIMEOUT: Duration = Duration::from_millis(5);

fn main() {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install tracing subscriber");
    }

    // The sampling loop never returns in normal operation; reaching the
    // error arm means startup failed.
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let csv_path = format!("emg_data_{}.csv", chrono::Utc::now().timestamp());

    info!("Starting EMG sample relay");
    info!("CSV log: {}", csv_path);

    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();
    sinks.push(Box::new(
        CsvSink::create(&csv_path).context("cannot open CSV log")?,
    ));

    if args.no_socket {
        info!("TCP relay disabled (--no-socket)");
    } else {
        info!("Relay endpoint: {}:{}", args.host, args.port);
        sinks.push(Box::new(RelaySink::new(args.host, args.port)));
    }

    let mut source = SimulatedSource::new();
    info!("Waiting for an EMG device...");
    source
        .wait_for_device(DISCOVERY_WINDOW)
        .context("device discovery failed")?;
    info!("EMG device connected, sampling at 200 Hz");

    let mut collector = SampleCollector::new(sinks);

    // Runs until the process is terminated externally.
    loop {
        match source.poll(POLL_TIMEOUT) {
            Some(FrameEvent::Frame {
                channels,
                host_timestamp_us,
            }) => collector.on_frame(channels, host_timestamp_us),
            Some(FrameEvent::SignalLoss { host_timestamp_us }) => {
                collector.on_signal_loss(host_timestamp_us)
            }
            None => {}
        }
        render(&collector);
    }
}

/// Redraw the live readout in place: one 4-wide cell per channel plus a
/// relay status glyph.
fn render(collector: &SampleCollector) {
    let mut line = String::with_capacity(64);
    line.push('\r');
    for value in collector.current_channels() {
        let text = value.to_string();
        line.push('[');
        line.push_str(&text);
        for _ in text.len()..4 {
            line.push(' ');
        }
        line.push(']');
    }

    for (kind, healthy) in collector.sink_status() {
        if kind == "relay" {
            line.push_str(if healthy { " *" } else { " -" });
        }
    }

    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(line.as_bytes());
    let _ = stdout.flush();
}
