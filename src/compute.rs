//! Compute collaborator: arbitrary precision factorial
//!
//! The worker pool only needs a pure, deterministic `Fn(i64) -> Result<BigUint, ComputeError>`.
//! [`factorial`] is the implementation the binary wires in.

use num_bigint::BigUint;
use num_traits::One;
use thiserror::Error;

/// Why the compute collaborator could not produce a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("factorial is undefined for negative input {0}")]
    NegativeInput(i64),
}

/// Calculate `n!` without overflow.
pub fn factorial(n: i64) -> Result<BigUint, ComputeError> {
    if n < 0 {
        return Err(ComputeError::NegativeInput(n));
    }

    let mut result = BigUint::one();
    for i in 2..=n as u64 {
        result *= i;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factorial_known_values() {
        let cases: [(i64, &str); 5] = [
            (0, "1"),
            (1, "1"),
            (5, "120"),
            (10, "3628800"),
            (40, "815915283247897734345611269596115894272000000000"),
        ];

        for (n, expected) in cases {
            assert_eq!(factorial(n).unwrap().to_string(), expected, "{n}!");
        }
    }

    #[test]
    fn test_factorial_is_deterministic() {
        assert_eq!(factorial(7).unwrap(), BigUint::from(5040u32));
        assert_eq!(factorial(7).unwrap(), factorial(7).unwrap());
    }

    #[test]
    fn test_factorial_negative_input() {
        assert_eq!(factorial(-1), Err(ComputeError::NegativeInput(-1)));
    }

    #[test]
    fn test_factorial_large_input_has_expected_digit_count() {
        // 1000! has 2568 decimal digits
        assert_eq!(factorial(1000).unwrap().to_string().len(), 2568);
    }
}
