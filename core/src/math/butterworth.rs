//! Butterworth band-pass design and zero-phase application.
//!
//! The analog low-pass prototype is shifted to a band-pass with the usual
//! `s -> (s^2 + w0^2) / (s * bw)` substitution, mapped to the z-plane with a
//! pre-warped bilinear transform, and realized as a cascade of second-order
//! sections. Every section carries one zero at `z = 1` and one at `z = -1`.

use crate::prelude::StageResult;
use crate::signal::FilterSpec;
use num_complex::Complex64;
use std::f64::consts::PI;

const REAL_POLE_TOLERANCE: f64 = 1e-10;

/// Second-order section `(b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`,
/// evaluated in transposed direct form II.
#[derive(Debug, Clone, PartialEq)]
pub struct Biquad {
    b: [f64; 3],
    a: [f64; 2],
}

impl Biquad {
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self { b, a }
    }

    pub fn numerator(&self) -> &[f64; 3] {
        &self.b
    }

    pub fn denominator(&self) -> &[f64; 2] {
        &self.a
    }

    /// Both poles inside the unit circle (stability triangle).
    pub fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }

    fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (1.0 + self.a[0] + self.a[1])
    }

    /// State that makes a constant input `level` produce a constant output.
    fn steady_state(&self, level: f64) -> [f64; 2] {
        let output = self.dc_gain() * level;
        let second = self.b[2] * level - self.a[1] * output;
        let first = self.b[1] * level - self.a[0] * output + second;
        [first, second]
    }

    fn run(&self, buffer: &mut [f64], mut state: [f64; 2]) {
        for sample in buffer.iter_mut() {
            let input = *sample;
            let output = self.b[0] * input + state[0];
            state[0] = self.b[1] * input - self.a[0] * output + state[1];
            state[1] = self.b[2] * input - self.a[1] * output;
            *sample = output;
        }
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = 1.0 + z_inv * self.a[0] + z_inv2 * self.a[1];
        num / den
    }
}

/// Cascade of [`Biquad`] sections.
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<Biquad>,
}

impl SosFilter {
    pub fn new(sections: Vec<Biquad>) -> Self {
        Self { sections }
    }

    /// Designs a Butterworth band-pass of `spec.order` (2·order poles).
    pub fn butterworth_bandpass(spec: &FilterSpec, sample_rate: u32) -> StageResult<Self> {
        spec.validate(sample_rate)?;
        let fs = f64::from(sample_rate);
        let fs2 = 2.0 * fs;

        let w_low = prewarp(spec.low_hz, fs);
        let w_high = prewarp(spec.high_hz, fs);
        let bandwidth = w_high - w_low;
        let center_sq = w_low * w_high;

        let mut gain = Complex64::new(1.0, 0.0);
        let mut digital_poles = Vec::with_capacity(2 * spec.order);
        for prototype in butterworth_poles(spec.order) {
            let scaled = prototype * (bandwidth / 2.0);
            let offset = (scaled * scaled - center_sq).sqrt();
            let upper = scaled + offset;
            let lower = scaled - offset;
            // One zero at s = 0 and one at infinity per prototype pole.
            gain *= bandwidth * fs2 / ((fs2 - upper) * (fs2 - lower));
            digital_poles.push((fs2 + upper) / (fs2 - upper));
            digital_poles.push((fs2 + lower) / (fs2 - lower));
        }

        Ok(Self::new(poles_to_sections(&digital_poles, gain.re)))
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Biquad::is_stable)
    }

    /// |H(e^jw)| at `freq_hz`.
    pub fn magnitude_response(&self, freq_hz: f64, sample_rate: u32) -> f64 {
        let omega = 2.0 * PI * freq_hz / f64::from(sample_rate);
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, section| {
                acc * section.response(z_inv)
            })
            .norm()
    }

    /// Forward-backward filtering with odd-extension padding.
    ///
    /// Output has no time shift and the squared magnitude response. Inputs
    /// shorter than the nominal pad length use `len - 1` padding samples.
    pub fn filtfilt(&self, samples: &[f32]) -> Vec<f32> {
        let len = samples.len();
        if len == 0 {
            return Vec::new();
        }
        let pad = self.pad_len().min(len - 1);
        let mut extended = odd_extension(samples, pad);

        let level = extended[0];
        self.run_from_steady_state(&mut extended, level);
        extended.reverse();
        let level = extended[0];
        self.run_from_steady_state(&mut extended, level);
        extended.reverse();

        extended[pad..pad + len]
            .iter()
            .map(|&value| value as f32)
            .collect()
    }

    fn pad_len(&self) -> usize {
        3 * (2 * self.sections.len() + 1)
    }

    fn run_from_steady_state(&self, buffer: &mut [f64], level: f64) {
        let mut section_level = level;
        for section in &self.sections {
            let state = section.steady_state(section_level);
            section_level *= section.dc_gain();
            section.run(buffer, state);
        }
    }
}

fn prewarp(freq_hz: f64, sample_rate: f64) -> f64 {
    2.0 * sample_rate * (PI * freq_hz / sample_rate).tan()
}

/// Left-half-plane poles of the unit-cutoff analog Butterworth prototype.
fn butterworth_poles(order: usize) -> Vec<Complex64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - (n - 1.0);
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect()
}

fn poles_to_sections(poles: &[Complex64], gain: f64) -> Vec<Biquad> {
    let mut sections = Vec::with_capacity(poles.len() / 2);
    let mut real_poles = Vec::new();

    for pole in poles {
        if pole.im.abs() <= REAL_POLE_TOLERANCE {
            real_poles.push(pole.re);
        } else if pole.im > 0.0 {
            sections.push(Biquad::new(
                [1.0, 0.0, -1.0],
                [-2.0 * pole.re, pole.norm_sqr()],
            ));
        }
    }

    real_poles.sort_by(|a, b| a.total_cmp(b));
    for pair in real_poles.chunks(2) {
        let first = pair[0];
        let second = pair.get(1).copied().unwrap_or(0.0);
        sections.push(Biquad::new(
            [1.0, 0.0, -1.0],
            [-(first + second), first * second],
        ));
    }

    if let Some(section) = sections.first_mut() {
        for coeff in section.b.iter_mut() {
            *coeff *= gain;
        }
    }
    sections
}

fn odd_extension(samples: &[f32], pad: usize) -> Vec<f64> {
    let len = samples.len();
    let first = f64::from(samples[0]);
    let last = f64::from(samples[len - 1]);

    let mut extended = Vec::with_capacity(len + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - f64::from(samples[i])));
    extended.extend(samples.iter().map(|&value| f64::from(value)));
    extended.extend((1..=pad).map(|i| 2.0 * last - f64::from(samples[len - 1 - i])));
    extended
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_band() -> SosFilter {
        SosFilter::butterworth_bandpass(&FilterSpec::new(5, 20.0, 6000.0), 44_100).unwrap()
    }

    fn tone(freq_hz: f64, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq_hz * i as f64 / f64::from(sample_rate)).sin() as f32)
            .collect()
    }

    #[test]
    fn prototype_poles_sit_on_left_unit_circle() {
        for pole in butterworth_poles(5) {
            assert!(pole.re < 0.0);
            assert!((pole.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn bandpass_has_one_stable_section_per_order() {
        let filter = audio_band();
        assert_eq!(filter.sections().len(), 5);
        assert!(filter.is_stable());
    }

    #[test]
    fn every_section_has_zeros_at_dc_and_nyquist() {
        for section in audio_band().sections() {
            let b = section.numerator();
            assert!((b[0] + b[1] + b[2]).abs() < 1e-12);
            assert!((b[0] - b[1] + b[2]).abs() < 1e-12);
            assert!(section.denominator()[1] < 1.0);
        }
    }

    #[test]
    fn bandpass_is_three_db_down_at_cutoffs() {
        let filter = audio_band();
        let half_power = std::f64::consts::FRAC_1_SQRT_2;
        assert!((filter.magnitude_response(20.0, 44_100) - half_power).abs() < 1e-3);
        assert!((filter.magnitude_response(6000.0, 44_100) - half_power).abs() < 1e-3);
        assert!((filter.magnitude_response(1000.0, 44_100) - 1.0).abs() < 1e-2);
        assert!(filter.magnitude_response(0.0, 44_100) < 1e-9);
        assert!(filter.magnitude_response(22_050.0, 44_100) < 1e-9);
    }

    #[test]
    fn filtfilt_keeps_in_band_tone_aligned() {
        let filter = audio_band();
        let input = tone(1000.0, 44_100, 44_100);
        let output = filter.filtfilt(&input);
        assert_eq!(output.len(), input.len());
        let worst = input[10_000..34_000]
            .iter()
            .zip(&output[10_000..34_000])
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(worst < 0.02, "worst deviation {}", worst);
    }

    #[test]
    fn filtfilt_handles_inputs_shorter_than_padding() {
        let filter = audio_band();
        let output = filter.filtfilt(&[0.5, -0.25, 0.125]);
        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|v| v.is_finite()));
        assert!(filter.filtfilt(&[]).is_empty());
    }
}
