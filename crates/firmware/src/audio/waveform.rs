//! Test waveform for the I2S TX buffer.

/// One period of a 750 Hz sine at 48 kHz, full-scale 16-bit signed.
///
/// 64 samples are streamed as 32 32-bit words (two samples per word), looped
/// by the I2S peripheral.
pub static SINE_750HZ_48K: [i16; 64] = [
    3211, 6392, 9511, 12539, 15446, 18204, 20787, 23169, //
    25329, 27244, 28897, 30272, 31356, 32137, 32609, 32767, //
    32609, 32137, 31356, 30272, 28897, 27244, 25329, 23169, //
    20787, 18204, 15446, 12539, 9511, 6392, 3211, 0, //
    -3212, -6393, -9512, -12540, -15447, -18205, -20788, -23170, //
    -25330, -27245, -28898, -30273, -31357, -32138, -32610, -32767, //
    -32610, -32138, -31357, -30273, -28898, -27245, -25330, -23170, //
    -20788, -18205, -15447, -12540, -9512, -6393, -3212, -1,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_full_period() {
        assert_eq!(SINE_750HZ_48K.iter().max(), Some(&32767));
        assert_eq!(SINE_750HZ_48K.iter().min(), Some(&-32767));
        // 48 kHz / 750 Hz
        assert_eq!(SINE_750HZ_48K.len(), 48_000 / 750);
        let sum: i32 = SINE_750HZ_48K.iter().map(|&s| i32::from(s)).sum();
        assert!(sum.abs() < 64);
    }
}
