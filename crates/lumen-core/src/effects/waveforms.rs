//! Brightness waveform library
//!
//! Pure functions of time. "Period" always means the mathematical period
//! of the underlying wave: given y = sin(Ax), period = 2π / |A|. It is
//! never a frame count; the compiler decides how many samples to take.

use std::f32::consts::PI;

/// Period of a full sinus cycle phase-locked to `bpm`.
pub fn bpm_period(bpm: f32) -> f32 {
    60.0 / bpm
}

/// Period of a truncated sinus whose half-cycle spans one beat.
pub fn trunc_bpm_period(bpm: f32) -> f32 {
    60.0 / (2.0 * bpm)
}

/// Sinusoidal pulse: `a * sin(2π/p * t - h)^e + v`.
///
/// The exponent `e` sharpens crests; 1 is a plain sine.
pub fn sinus(a: f32, p: f32, v: f32, h: f32, e: i32) -> impl Fn(f32) -> f32 {
    move |t| a * ((2.0 * PI / p) * t - h).sin().powi(e) + v
}

/// Truncated sinusoidal pulse: `±|a * sin(2π/p * t - h)^e| + v`.
///
/// The absolute value folds the wave into a one-directional pulse train;
/// `invert` flips it downward.
pub fn trunc_sinus(a: f32, p: f32, v: f32, h: f32, e: i32, invert: bool) -> impl Fn(f32) -> f32 {
    let sign = if invert { -1.0 } else { 1.0 };
    move |t| sign * (a * ((2.0 * PI / p) * t - h).sin().powi(e)).abs() + v
}

/// Sinus pulse locked to `bpm`, one full cycle per beat.
pub fn sinus_bpm(bpm: f32, a: f32, v: f32) -> impl Fn(f32) -> f32 {
    sinus(a, bpm_period(bpm), v, 0.0, 1)
}

/// Truncated sinus locked to `bpm`, one crest per beat.
pub fn trunc_sinus_bpm(
    bpm: f32,
    a: f32,
    v: f32,
    h: f32,
    e: i32,
    invert: bool,
) -> impl Fn(f32) -> f32 {
    trunc_sinus(a, trunc_bpm_period(bpm), v, h, e, invert)
}

/// Sawtooth ramp through `[v - a, v + a]` with period `p`, phase-shifted
/// so the ramp starts at its minimum.
pub fn sawtooth(a: f32, p: f32, v: f32) -> impl Fn(f32) -> f32 {
    move |t| {
        let x = t / p - 0.5;
        a * 2.0 * (x - (0.5 + x).floor()) + v
    }
}
