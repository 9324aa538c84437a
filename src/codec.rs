//! Bit-packed transport for Rademacher perturbation vectors ({-1,+1}^d).
//!
//! `+1` maps to a set bit, `-1` to a clear bit, little-endian within each
//! byte. This is the wire format for `packed_flips` in both the dispatch
//! response and the report request (§6).

use crate::error::UpdateError;

/// Packs a `{-1,+1}` vector into `ceil(d/8)` bytes.
pub fn pack(flips: &[i8]) -> Vec<u8> {
    let mut bytes = vec![0u8; flips.len().div_ceil(8)];
    for (i, &flip) in flips.iter().enumerate() {
        if flip > 0 {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// Unpacks `d` flips from a byte string. Bits beyond `d` are ignored.
///
/// Returns [`UpdateError::MalformedFlips`] if `bytes` is too short to hold
/// `d` bits.
pub fn unpack(bytes: &[u8], d: usize) -> Result<Vec<i8>, UpdateError> {
    let expected = d.div_ceil(8);
    if bytes.len() < expected {
        return Err(UpdateError::MalformedFlips {
            expected,
            got: bytes.len(),
        });
    }
    let mut flips = Vec::with_capacity(d);
    for i in 0..d {
        let bit = (bytes[i / 8] >> (i % 8)) & 1;
        flips.push(if bit == 1 { 1 } else { -1 });
    }
    Ok(flips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty() {
        let flips: Vec<i8> = vec![];
        let packed = pack(&flips);
        assert_eq!(packed.len(), 0);
        assert_eq!(unpack(&packed, 0).unwrap(), flips);
    }

    #[test]
    fn round_trip_single_byte() {
        let flips = vec![1, -1, 1, 1, -1, -1, 1, -1];
        let packed = pack(&flips);
        assert_eq!(packed.len(), 1);
        assert_eq!(unpack(&packed, flips.len()).unwrap(), flips);
    }

    #[test]
    fn round_trip_unaligned_length() {
        let flips = vec![1, -1, 1, -1, 1];
        let packed = pack(&flips);
        assert_eq!(packed.len(), 1);
        assert_eq!(unpack(&packed, flips.len()).unwrap(), flips);
    }

    #[test]
    fn round_trip_multi_byte() {
        let flips: Vec<i8> = (0..37).map(|i| if i % 3 == 0 { -1 } else { 1 }).collect();
        let packed = pack(&flips);
        assert_eq!(packed.len(), 5);
        assert_eq!(unpack(&packed, flips.len()).unwrap(), flips);
    }

    #[test]
    fn bits_beyond_d_are_ignored() {
        let flips = vec![1, 1, 1, 1, 1, 1, 1, 1, -1];
        let packed = pack(&flips);
        // truncate the request to 8 axes: trailing garbage in byte 1 must not matter.
        let short = unpack(&packed[..1], 8).unwrap();
        assert_eq!(short, vec![1i8; 8]);
    }

    #[test]
    fn malformed_flips_reports_expected_and_got() {
        let err = unpack(&[0u8], 16).unwrap_err();
        assert_eq!(
            err,
            UpdateError::MalformedFlips {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn exhaustive_roundtrip_for_all_byte_boundaries() {
        for d in 0..64 {
            let flips: Vec<i8> = (0..d).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect();
            let packed = pack(&flips);
            assert_eq!(packed.len(), d.div_ceil(8));
            assert_eq!(unpack(&packed, d).unwrap(), flips, "failed at d={d}");
        }
    }
}
