use hmac::{Hmac, Mac};
use sha1::Sha1;

// RFC 6238 time-based codes on top of RFC 4226 HOTP, HMAC-SHA1 flavor.
// Secrets arrive as user-typed Base32: decoding is lenient, output is strict.

pub type HmacSha1 = Hmac<Sha1>;

pub const DEFAULT_TIME_STEP_SECS: u64 = 30;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("secret decodes to an empty key")]
    EmptySecret,
}

/// Lenient Base32 decode: case-insensitive, whitespace and symbols outside the
/// RFC 4648 alphabet are skipped, `=` terminates decoding (padding).
///
/// Never fails; a secret with no usable symbols decodes to an empty key, which
/// the code derivation rejects.
pub fn decode_base32(secret: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for byte in secret.bytes() {
        if byte.is_ascii_whitespace() {
            continue;
        }
        if byte == b'=' {
            break;
        }
        let symbol = byte.to_ascii_uppercase();
        let index = match BASE32_ALPHABET.iter().position(|&a| a == symbol) {
            Some(i) => i as u32,
            None => continue,
        };
        acc = (acc << 5) | index;
        bits += 5;
        if bits >= 8 {
            out.push((acc >> (bits - 8)) as u8);
            bits -= 8;
        }
    }
    out
}

/// One HOTP code: 8-byte big-endian counter, HMAC-SHA1, dynamic truncation,
/// six decimal digits zero-padded.
pub fn hotp(key: &[u8], counter: u64) -> Result<String, OtpError> {
    if key.is_empty() {
        return Err(OtpError::EmptySecret);
    }
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC key");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Low nibble of the last digest byte picks a 4-byte window; the top bit of
    // that window is masked off to dodge sign ambiguity.
    let offset = (digest[19] & 0x0f) as usize;
    let value = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);
    Ok(format!("{:06}", value % 1_000_000))
}

/// Current TOTP code for a Base32 secret. The counter is the number of whole
/// time steps since the epoch, so the code is stable within one window.
pub fn totp(secret: &str, time_step_secs: u64, now_epoch_secs: u64) -> Result<String, OtpError> {
    let key = decode_base32(secret);
    hotp(&key, now_epoch_secs / time_step_secs)
}

/// Seconds until the current window rolls over. Derived for UI countdowns,
/// never stored.
pub fn seconds_remaining(time_step_secs: u64, now_epoch_secs: u64) -> u64 {
    time_step_secs - (now_epoch_secs % time_step_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4226 appendix D key: ASCII "12345678901234567890".
    const RFC_KEY: &[u8] = b"12345678901234567890";
    const RFC_KEY_BASE32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_hotp_rfc4226_vectors() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314", "254676", "287922", "162583",
            "399871", "520489",
        ];
        for (counter, want) in expected.iter().enumerate() {
            assert_eq!(hotp(RFC_KEY, counter as u64).unwrap(), *want);
        }
    }

    #[test]
    fn test_totp_rfc6238_vectors() {
        // RFC 6238 appendix B epochs, truncated to six digits.
        let vectors: [(u64, &str); 6] = [
            (59, "287082"),
            (1_111_111_109, "081804"),
            (1_111_111_111, "050471"),
            (1_234_567_890, "005924"),
            (2_000_000_000, "279037"),
            (20_000_000_000, "353130"),
        ];
        for (now, want) in vectors {
            assert_eq!(totp(RFC_KEY_BASE32, 30, now).unwrap(), want);
        }
    }

    #[test]
    fn test_totp_stable_within_window() {
        for now in 30..60 {
            assert_eq!(totp(RFC_KEY_BASE32, 30, now).unwrap(), "287082");
        }
        // Adjacent windows differ (1111111109 and 1111111111 straddle one).
        assert_ne!(
            totp(RFC_KEY_BASE32, 30, 1_111_111_109).unwrap(),
            totp(RFC_KEY_BASE32, 30, 1_111_111_111).unwrap()
        );
    }

    #[test]
    fn test_base32_lenient_matches_canonical() {
        let canonical = decode_base32(RFC_KEY_BASE32);
        assert_eq!(canonical, RFC_KEY);
        let sloppy = " gezd gnbv GY3T QOJQ gezd gnbv GY3T QOJQ ===";
        assert_eq!(decode_base32(sloppy), canonical);
        // Symbols outside the alphabet are skipped, not errors.
        let noisy = "GE1ZD8GNBVGY3TQOJQ-GEZDGNBVGY3TQOJQ!";
        assert_eq!(decode_base32(noisy), canonical);
    }

    #[test]
    fn test_base32_degenerate_inputs() {
        assert!(decode_base32("").is_empty());
        assert!(decode_base32("  \t\n").is_empty());
        assert!(decode_base32("0189!?").is_empty());
        // Padding terminates immediately, even mid-string.
        assert!(decode_base32("=GEZD").is_empty());
    }

    #[test]
    fn test_empty_secret_is_an_error_not_a_code() {
        assert_eq!(totp("", 30, 59), Err(OtpError::EmptySecret));
        assert_eq!(totp("!!!", 30, 59), Err(OtpError::EmptySecret));
    }

    #[test]
    fn test_code_shape() {
        for now in (0..3_000u64).step_by(97) {
            let code = totp(RFC_KEY_BASE32, 30, now).unwrap();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_seconds_remaining() {
        assert_eq!(seconds_remaining(30, 0), 30);
        assert_eq!(seconds_remaining(30, 29), 1);
        assert_eq!(seconds_remaining(30, 30), 30);
        assert_eq!(seconds_remaining(30, 59), 1);
    }
}
