//! Systematic Reed-Solomon over GF(2^8), erasure-only decoding.
//!
//! The codeword is handled in sequence order: data symbols first, parity
//! last. Sequence position `i` corresponds to polynomial coefficient
//! `n - 1 - i`, so the erasure machinery below converts between the two at
//! the edges and works in coefficient order in between.

use crate::gf256;

/// Systematic encode: `data` followed by `nsym` parity symbols.
///
/// Parity is `msg(x) * x^nsym mod g(x)`, computed by synthetic division.
pub fn encode(data: &[u8], nsym: usize) -> Vec<u8> {
    let gen = gf256::generator_poly(nsym);
    let mut buf = vec![0u8; data.len() + nsym];
    buf[..data.len()].copy_from_slice(data);

    for i in 0..data.len() {
        let coef = buf[i];
        if coef == 0 {
            continue;
        }
        // gen is monic with its leading coefficient at the end; walk the
        // remaining coefficients from high degree down.
        for j in 1..gen.len() {
            buf[i + j] ^= gf256::mul(gen[gen.len() - 1 - j], coef);
        }
    }

    let mut out = data.to_vec();
    out.extend_from_slice(&buf[data.len()..]);
    out
}

/// Recover the `data_len` data symbols from a codeword with known-missing
/// positions. Returns `None` when more than `n - data_len` positions are
/// erased, or when the input is malformed enough that a locator root has a
/// zero derivative.
pub fn decode_erasures(codeword: &[Option<u8>], data_len: usize) -> Option<Vec<u8>> {
    let n = codeword.len();
    debug_assert!(data_len <= n);
    let nsym = n - data_len;

    // Erasures as polynomial coefficient indices.
    let erased: Vec<usize> = codeword
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_none())
        .map(|(i, _)| n - 1 - i)
        .collect();
    if erased.len() > nsym {
        return None;
    }

    let mut coeffs = vec![0u8; n];
    for (i, v) in codeword.iter().enumerate() {
        coeffs[n - 1 - i] = v.unwrap_or(0);
    }

    if !erased.is_empty() {
        let syndromes: Vec<u8> = (0..nsym)
            .map(|j| gf256::poly_eval(&coeffs, gf256::alpha_pow(j)))
            .collect();

        if syndromes.iter().any(|&s| s != 0) {
            correct_erasures(&mut coeffs, &syndromes, &erased)?;
        }
    }

    Some((0..data_len).map(|i| coeffs[n - 1 - i]).collect())
}

/// Forney's algorithm restricted to erasures: locator from the known
/// positions, evaluator from the syndromes, magnitudes XORed in place.
fn correct_erasures(coeffs: &mut [u8], syndromes: &[u8], erased: &[usize]) -> Option<()> {
    let mut locator = vec![1u8];
    for &p in erased {
        locator = gf256::poly_mul(&locator, &[1, gf256::alpha_pow(p)]);
    }

    let mut evaluator = gf256::poly_mul(syndromes, &locator);
    evaluator.truncate(erased.len());

    // Formal derivative keeps only odd-degree terms in characteristic 2.
    let mut derivative = vec![0u8; locator.len() - 1];
    let mut i = 1;
    while i < locator.len() {
        derivative[i - 1] = locator[i];
        i += 2;
    }

    for &p in erased {
        let x = gf256::alpha_pow(p);
        let x_inv = gf256::inverse(x);
        let denom = gf256::poly_eval(&derivative, x_inv);
        if denom == 0 {
            return None;
        }
        let numer = gf256::mul(x, gf256::poly_eval(&evaluator, x_inv));
        coeffs[p] ^= gf256::div(numer, denom);
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn erase(codeword: &[u8], positions: &[usize]) -> Vec<Option<u8>> {
        codeword
            .iter()
            .enumerate()
            .map(|(i, &b)| {
                if positions.contains(&i) {
                    None
                } else {
                    Some(b)
                }
            })
            .collect()
    }

    #[test]
    fn test_encode_is_systematic() {
        let data = b"aurora";
        let encoded = encode(data, 4);
        assert_eq!(encoded.len(), data.len() + 4);
        assert_eq!(&encoded[..data.len()], data);
    }

    #[test]
    fn test_codeword_roots() {
        // Every alpha^i for i < nsym must be a root of the codeword.
        let encoded = encode(&[0x41, 0x00, 0x7F, 0xFF], 4);
        let n = encoded.len();
        let mut coeffs = vec![0u8; n];
        for (i, &b) in encoded.iter().enumerate() {
            coeffs[n - 1 - i] = b;
        }
        for i in 0..4 {
            assert_eq!(gf256::poly_eval(&coeffs, gf256::alpha_pow(i)), 0);
        }
    }

    #[test]
    fn test_round_trip_no_erasures() {
        let data = b"Hello Aurora!";
        let encoded = encode(data, 6);
        let decoded = decode_erasures(&erase(&encoded, &[]), data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_recovers_data_erasures() {
        let data = b"0123456789";
        let encoded = encode(data, 4);
        let decoded = decode_erasures(&erase(&encoded, &[0, 3, 7, 9]), data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_recovers_parity_erasures() {
        let data = b"0123456789";
        let encoded = encode(data, 4);
        let decoded = decode_erasures(&erase(&encoded, &[10, 11, 12, 13]), data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_recovers_mixed_erasures() {
        let data = &[0u8, 255, 1, 128, 7];
        let encoded = encode(data, 3);
        let cases: [&[usize]; 4] = [&[0, 4, 6], &[1, 7], &[2], &[5, 6, 7]];
        for positions in cases {
            let decoded = decode_erasures(&erase(&encoded, positions), data.len()).unwrap();
            assert_eq!(&decoded, data, "erasures at {positions:?}");
        }
    }

    #[test]
    fn test_single_symbol_message() {
        let encoded = encode(&[0x41], 4);
        assert_eq!(encoded.len(), 5);
        let decoded = decode_erasures(&erase(&encoded, &[0]), 1).unwrap();
        assert_eq!(decoded, vec![0x41]);
    }

    #[test]
    fn test_fails_with_too_many_erasures() {
        let data = b"0123456789";
        let encoded = encode(data, 4);
        assert!(decode_erasures(&erase(&encoded, &[0, 1, 2, 3, 4]), data.len()).is_none());
    }

    #[test]
    fn test_exhaustive_erasure_pairs() {
        let data = b"band";
        let encoded = encode(data, 2);
        let n = encoded.len();
        for a in 0..n {
            for b in (a + 1)..n {
                let decoded = decode_erasures(&erase(&encoded, &[a, b]), data.len()).unwrap();
                assert_eq!(decoded, data, "erasures at {a},{b}");
            }
        }
    }
}
