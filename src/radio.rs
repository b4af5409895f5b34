use soapysdr::{Device, Direction, TxStream};
use tracing::{info, warn};

use crate::{
    channel::{StreamingChannel, BUFFER_SYMBOLS},
    error::{Error, Result},
    sym::{Iq, BYTES_PER_SYMBOL},
};

const TX_CHANNEL: usize = 0;

/// How long a single buffer push may block.
const PUSH_TIMEOUT_US: i64 = 1_000_000;

/// Front end settings for the transmit chain.
#[derive(Debug, Clone)]
pub struct RadioConfig {
    /// SoapySDR device arguments.
    pub device: String,
    pub center_frequency_hz: f64,
    pub bandwidth_hz: f64,
    pub sample_rate_hz: f64,
    /// RF output port (antenna name).
    pub port: String,
    pub buffer_symbols: usize,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            device: "driver=plutosdr,uri=ip:192.168.2.8".to_string(),
            center_frequency_hz: 915_000_000.0,
            bandwidth_hz: 20_000_000.0,
            sample_rate_hz: 20_000_000.0,
            port: "A".to_string(),
            buffer_symbols: BUFFER_SYMBOLS,
        }
    }
}

/// An opened, configured transmitter with an active TX stream.
///
/// Dropping the session deactivates the stream and then releases the device.
pub struct RadioSession {
    stream: TxStream<Iq>,
    dev: Device,
    capacity: usize,
}

impl RadioSession {
    pub fn open(config: &RadioConfig) -> Result<Self> {
        info!("setting up device ({})", config.device);
        let dev =
            Device::new(config.device.as_str()).map_err(|e| Error::config("SDR device", e))?;

        configure(&dev, config)?;

        info!("setting up TX stream");
        let mut stream = dev
            .tx_stream::<Iq>(&[TX_CHANNEL])
            .map_err(|e| Error::config("TX stream", e))?;

        info!("enabling TX stream");
        stream
            .activate(None)
            .map_err(|e| Error::config("TX stream activation", e))?;

        Ok(Self {
            stream,
            dev,
            capacity: config.buffer_symbols,
        })
    }

    /// Driver and hardware identification for the start banner.
    pub fn describe(&self) -> String {
        let driver = self.dev.driver_key().unwrap_or_else(|_| "unknown".into());
        let hardware = self.dev.hardware_key().unwrap_or_else(|_| "unknown".into());

        format!("{driver} ({hardware})")
    }
}

/// Writes port, bandwidth, sample rate and LO frequency, in that order.
fn configure(dev: &Device, config: &RadioConfig) -> Result<()> {
    info!("configuring TX front end");

    dev.set_antenna(Direction::Tx, TX_CHANNEL, config.port.as_str())
        .map_err(|e| Error::config("rf port select", e))?;
    dev.set_bandwidth(Direction::Tx, TX_CHANNEL, config.bandwidth_hz)
        .map_err(|e| Error::config("rf bandwidth", e))?;
    dev.set_sample_rate(Direction::Tx, TX_CHANNEL, config.sample_rate_hz)
        .map_err(|e| Error::config("sampling frequency", e))?;
    dev.set_frequency(Direction::Tx, TX_CHANNEL, config.center_frequency_hz, ())
        .map_err(|e| Error::config("center frequency", e))?;

    Ok(())
}

impl StreamingChannel for RadioSession {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn push(&mut self, buf: &[Iq]) -> Result<usize> {
        self.stream
            .write_all(&[buf], None, false, PUSH_TIMEOUT_US)
            .map_err(|e| Error::Push(e.to_string()))?;

        Ok(buf.len() * BYTES_PER_SYMBOL)
    }
}

impl Drop for RadioSession {
    fn drop(&mut self) {
        if let Err(e) = self.stream.deactivate(None) {
            warn!("could not disable TX stream: {e}");
        }

        info!("radio session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::RadioConfig;

    #[test]
    fn reference_configuration() {
        let c = RadioConfig::default();

        assert_eq!(c.center_frequency_hz, 915e6);
        assert_eq!(c.bandwidth_hz, 20e6);
        assert_eq!(c.sample_rate_hz, 20e6);
        assert_eq!(c.port, "A");
        assert_eq!(c.buffer_symbols, 65536);
    }
}
