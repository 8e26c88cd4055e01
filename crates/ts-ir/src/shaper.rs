//! Waveform shaping: harmonic sums of the base wave functions.
//!
//! The base functions return a bipolar value in [-7.5, 7.5]. Each harmonic
//! `h` samples the base function at `(i * (h + 1)) % 32`, and the weighted
//! sum is re-biased by 7.5 and rounded into a 4-bit table entry.

use core::f64::consts::PI;

use crate::eval::round_half_up;
use crate::frame::{Waveform, WAVEFORM_LEN};
use crate::instrument::{WaveType, HARMONIC_COUNT};

/// Bipolar base wave value at table index `i` (0-31) for the given phase.
///
/// Returns `None` for wave types that are not built from a base function.
pub fn wave_value(wave_type: WaveType, phase: f64, i: usize) -> Option<f64> {
    let x = i as f64;
    match wave_type {
        WaveType::Square => Some(if x < phase { 7.5 } else { -7.5 }),
        WaveType::Triangle => Some(if x < phase {
            15.0 * x / phase - 7.5
        } else {
            15.0 * (32.0 - x) / (32.0 - phase) - 7.5
        }),
        WaveType::Sine => Some(7.5 * libm::sin(PI * x / 16.0)),
        WaveType::Noise | WaveType::Sample => None,
    }
}

/// Table index sampled by harmonic `h` at position `i`.
pub const fn harmonic_index(i: usize, h: usize) -> usize {
    (i * (h + 1)) % WAVEFORM_LEN
}

/// Weighted contribution of every harmonic at table index `i`.
pub fn harmonic_terms(
    wave_type: WaveType,
    phase: f64,
    harmonics: &[f64; HARMONIC_COUNT],
    i: usize,
) -> Option<[f64; HARMONIC_COUNT]> {
    let mut terms = [0.0; HARMONIC_COUNT];
    for (h, term) in terms.iter_mut().enumerate() {
        *term = harmonics[h] * wave_value(wave_type, phase, harmonic_index(i, h))?;
    }
    Some(terms)
}

/// Build the 4-bit table for a shaped wave type.
pub fn shape(
    wave_type: WaveType,
    phase: f64,
    harmonics: &[f64; HARMONIC_COUNT],
) -> Option<Waveform> {
    let mut waveform = [0; WAVEFORM_LEN];
    for (i, slot) in waveform.iter_mut().enumerate() {
        let total: f64 = harmonic_terms(wave_type, phase, harmonics, i)?.iter().sum();
        *slot = round_half_up(7.5 + total).clamp(0.0, 15.0) as u8;
    }
    Some(waveform)
}
