//! Textual vector literals: `[v0,v1,...]`.
//!
//! This is the persisted format of `chunks.embedding` and the format bound
//! into sqlite-vec queries. Encoding uses six fixed decimals; decoding also
//! accepts spaced lists and shorter canonical forms such as `0.5` or `1e-7`.

/// A literal component that is not a floating-point number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid vector component {token:?} at position {position}")]
pub struct DecodeError {
    pub position: usize,
    pub token: String,
}

/// Render a vector as `[a,b,c]` with six decimals per component.
pub fn encode(vector: &[f32]) -> String {
    let mut out = String::with_capacity(2 + vector.len() * 10);
    out.push('[');
    for (i, value) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{value:.6}"));
    }
    out.push(']');
    out
}

/// Parse a vector literal. Empty tokens are skipped; dimension is not checked.
pub fn decode(literal: &str) -> Result<Vec<f32>, DecodeError> {
    let trimmed = literal.trim();
    let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    inner
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .enumerate()
        .map(|(position, token)| {
            token.parse::<f32>().map_err(|_| DecodeError {
                position,
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_with_six_decimals() {
        assert_eq!(encode(&[0.5, -1.0, 0.1234567]), "[0.500000,-1.000000,0.123457]");
        assert_eq!(encode(&[]), "[]");
    }

    #[test]
    fn decodes_compact_and_spaced() {
        assert_eq!(decode("[1,2,3]").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(decode("[1, 2, 3]").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(decode("  [0.25 ,  -0.5 ]  ").unwrap(), vec![0.25, -0.5]);
    }

    #[test]
    fn decodes_store_canonical_forms() {
        assert_eq!(decode("[0.1,1e-7,-3]").unwrap(), vec![0.1, 1e-7, -3.0]);
    }

    #[test]
    fn skips_empty_tokens() {
        assert_eq!(decode("[1,2,]").unwrap(), vec![1.0, 2.0]);
        assert_eq!(decode("[,1,,2]").unwrap(), vec![1.0, 2.0]);
        assert!(decode("[]").unwrap().is_empty());
    }

    #[test]
    fn tolerates_missing_brackets() {
        assert_eq!(decode("4,5").unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn rejects_garbage_component() {
        let err = decode("[0.1,oops,0.3]").unwrap_err();
        assert_eq!(err.position, 1);
        assert_eq!(err.token, "oops");
    }

    proptest! {
        #[test]
        fn round_trip_within_rounding_bound(v in prop::collection::vec(-1000.0f32..1000.0, 0..64)) {
            let decoded = decode(&encode(&v)).unwrap();
            prop_assert_eq!(decoded.len(), v.len());
            for (a, b) in decoded.iter().zip(&v) {
                // 5e-7 from rounding plus f32 representation error at this magnitude
                let tolerance = 5e-7 + (f64::from(b.abs()) + 1e-3) * f64::from(f32::EPSILON);
                prop_assert!((f64::from(*a) - f64::from(*b)).abs() <= tolerance);
            }
        }
    }
}
