//! gpsd client - TCP consumer of the gpsd JSON stream.
//!
//! Connects to a local gpsd, enables JSON watch mode and turns TPV reports
//! into [`PositionFix`] updates.
//!
//! # Setup
//!
//! gpsd must be running and attached to the receiver, e.g.
//! `gpsd -n /dev/serial0 -F /var/run/gpsd.sock`.
//!
//! # Example
//!
//! ```ignore
//! let mut source = GpsdSource::new(GpsdConfig::default());
//! let fix = source.next_update().await?;
//! println!("{:?} {:?}", fix.latitude, fix.longitude);
//! ```

mod protocol;

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tracing::info;

use super::error::PositionError;
use super::source::PositionSource;
use super::state::PositionFix;
pub use protocol::parse_report;
use protocol::WATCH_COMMAND;

/// Default gpsd port.
pub const DEFAULT_GPSD_PORT: u16 = 2947;

/// gpsd client configuration.
#[derive(Debug, Clone)]
pub struct GpsdConfig {
    /// Host running gpsd.
    pub host: String,

    /// gpsd TCP port (default: 2947).
    pub port: u16,

    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
}

impl GpsdConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GpsdConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_GPSD_PORT,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Streaming position source backed by gpsd.
///
/// Connects lazily on the first [`PositionSource::next_update`] call and
/// again after any stream failure.
pub struct GpsdSource {
    config: GpsdConfig,
    lines: Option<Lines<BufReader<TcpStream>>>,
    reports_received: u64,
}

impl GpsdSource {
    pub fn new(config: GpsdConfig) -> Self {
        Self {
            config,
            lines: None,
            reports_received: 0,
        }
    }

    /// Check whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.lines.is_some()
    }

    async fn connect(&self) -> Result<Lines<BufReader<TcpStream>>, PositionError> {
        let address = self.config.address();
        let mut stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(&address),
        )
        .await
        .map_err(|_| PositionError::ConnectTimeout(address.clone()))?
        .map_err(|source| PositionError::Connect {
            address: address.clone(),
            source,
        })?;

        stream.write_all(WATCH_COMMAND).await?;
        info!(
            address = %address,
            reports = self.reports_received,
            "Connected to gpsd, watch enabled"
        );

        Ok(BufReader::new(stream).lines())
    }
}

impl PositionSource for GpsdSource {
    async fn next_update(&mut self) -> Result<PositionFix, PositionError> {
        loop {
            if self.lines.is_none() {
                let lines = self.connect().await?;
                self.lines = Some(lines);
            }
            let Some(lines) = self.lines.as_mut() else {
                continue;
            };

            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(fix) = parse_report(&line) {
                        self.reports_received += 1;
                        return Ok(fix);
                    }
                }
                Ok(None) => {
                    self.lines = None;
                    return Err(PositionError::Closed);
                }
                Err(e) => {
                    self.lines = None;
                    return Err(PositionError::Io(e));
                }
            }
        }
    }
}
