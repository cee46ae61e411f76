use bytes::{BufMut, Bytes, BytesMut};
use clap::{builder::PossibleValue, ValueEnum};
use rand::{distributions::Alphanumeric, Rng};

/// Byte repeated over the whole payload in fixed mode.
pub const FILL_BYTE: u8 = b'A';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadMode {
    #[default]
    Fixed,
    Random,
}

impl ValueEnum for PayloadMode {
    fn value_variants<'a>() -> &'a [Self] {
        &[PayloadMode::Fixed, PayloadMode::Random]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            PayloadMode::Fixed => PossibleValue::new("fixed").help("Repeat a single byte"),
            PayloadMode::Random => {
                PossibleValue::new("random").help("Random alphanumeric content, drawn once")
            }
        })
    }
}

/// Builds the datagram body shared by every send of a run.
pub fn generate(mode: PayloadMode, size: usize) -> Bytes {
    match mode {
        PayloadMode::Fixed => {
            let mut buf = BytesMut::with_capacity(size);
            buf.put_bytes(FILL_BYTE, size);
            buf.freeze()
        }
        PayloadMode::Random => rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(size)
            .collect::<Vec<u8>>()
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_payload() {
        let payload = generate(PayloadMode::Fixed, 512);
        assert_eq!(payload.len(), 512);
        assert!(payload.iter().all(|&b| b == FILL_BYTE));
    }

    #[test]
    fn test_random_payload_is_alphanumeric() {
        let payload = generate(PayloadMode::Random, 64);
        assert_eq!(payload.len(), 64);
        assert!(payload.iter().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_empty_payload() {
        assert!(generate(PayloadMode::Fixed, 0).is_empty());
        assert!(generate(PayloadMode::Random, 0).is_empty());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            PayloadMode::from_str("random", false).unwrap(),
            PayloadMode::Random
        );
        assert_eq!(
            PayloadMode::from_str("FIXED", true).unwrap(),
            PayloadMode::Fixed
        );
        assert!(PayloadMode::from_str("zeros", false).is_err());
    }
}
