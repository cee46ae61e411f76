use std::time::Duration;

use crate::{
    error::{Error, Result},
    payload::PayloadMode,
};

/// Largest UDP payload that fits in a single IPv4 datagram.
pub const MAX_PAYLOAD_SIZE: usize = 65_507;

/// `SO_SNDBUF` is an `int`.
pub const MAX_SEND_BUFFER: usize = i32::MAX as usize;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub pps: u64,
    pub duration: Duration,
    pub payload_size: usize,
    pub payload_mode: PayloadMode,
    pub send_buffer: usize,
}

impl Config {
    /// Validates raw CLI values. A negative or NaN duration becomes an empty
    /// run rather than an error.
    pub fn new(
        host: String,
        port: u16,
        pps: u64,
        duration_secs: f64,
        payload_size: usize,
        payload_mode: PayloadMode,
        send_buffer: usize,
    ) -> Result<Config> {
        if pps == 0 {
            return Err(Error::Config("--pps must be at least 1".into()));
        }

        if payload_size > MAX_PAYLOAD_SIZE {
            return Err(Error::Config(format!(
                "Payload size {payload_size} exceeds the UDP maximum of {MAX_PAYLOAD_SIZE} bytes"
            )));
        }

        if send_buffer > MAX_SEND_BUFFER {
            return Err(Error::Config(format!(
                "Send buffer {send_buffer} exceeds the socket option maximum of {MAX_SEND_BUFFER} bytes"
            )));
        }

        let duration = Duration::try_from_secs_f64(duration_secs.max(0.0))
            .map_err(|err| Error::Config(format!("Invalid duration {duration_secs}: {err}")))?;

        Ok(Config {
            host,
            port,
            pps,
            duration,
            payload_size,
            payload_mode,
            send_buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pps: u64, duration: f64, size: usize) -> Result<Config> {
        with_send_buffer(pps, duration, size, 0)
    }

    fn with_send_buffer(pps: u64, duration: f64, size: usize, send_buffer: usize) -> Result<Config> {
        Config::new(
            "127.0.0.1".into(),
            9000,
            pps,
            duration,
            size,
            PayloadMode::Fixed,
            send_buffer,
        )
    }

    #[test]
    fn test_valid_config() {
        let config = config(60_000, 1.5, 512).unwrap();
        assert_eq!(config.duration, Duration::from_millis(1500));
        assert_eq!(config.pps, 60_000);
    }

    #[test]
    fn test_non_positive_duration_is_empty_run() {
        assert_eq!(config(100, 0.0, 10).unwrap().duration, Duration::ZERO);
        assert_eq!(config(100, -3.0, 10).unwrap().duration, Duration::ZERO);
        assert_eq!(config(100, f64::NAN, 10).unwrap().duration, Duration::ZERO);
    }

    #[test]
    fn test_rejects_infinite_duration() {
        assert!(matches!(config(100, f64::INFINITY, 10), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_rate() {
        assert!(matches!(config(0, 1.0, 10), Err(Error::Config(_))));
    }

    #[test]
    fn test_payload_size_bounds() {
        assert!(config(100, 1.0, 0).is_ok());
        assert!(config(100, 1.0, MAX_PAYLOAD_SIZE).is_ok());
        assert!(matches!(
            config(100, 1.0, MAX_PAYLOAD_SIZE + 1),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_send_buffer_bounds() {
        assert!(with_send_buffer(100, 1.0, 10, MAX_SEND_BUFFER).is_ok());
        assert!(matches!(
            with_send_buffer(100, 1.0, 10, MAX_SEND_BUFFER + 1),
            Err(Error::Config(_))
        ));
    }
}
