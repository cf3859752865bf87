//! Bit-exact reinterpretation between words and IEEE-754 single floats.
//!
//! A word is untyped. Float opcodes view it through these helpers, which
//! never perform a numeric conversion.

/// An untyped 32-bit machine word.
pub type Word = u32;

/// View a word as an `f32` with the same bit pattern.
#[inline]
pub fn to_float(word: Word) -> f32 {
    f32::from_bits(word)
}

/// View an `f32` as a word with the same bit pattern.
#[inline]
pub fn from_float(value: f32) -> Word {
    value.to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinterprets_without_conversion() {
        assert_eq!(from_float(1.0), 0x3F80_0000);
        assert_eq!(to_float(0x4020_0000), 2.5);
    }

    #[test]
    fn preserves_nan_payload_and_negative_zero() {
        let nan = 0x7FC0_1234;
        assert_eq!(from_float(to_float(nan)), nan);
        assert_eq!(from_float(-0.0), 0x8000_0000);
    }
}
