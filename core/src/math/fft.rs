use num_complex::Complex32;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse.
pub struct FftHelper {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    /// Full complex transform; input is zero-padded or cut to the planned size.
    fn forward(&self, input: &[f32]) -> Vec<Complex32> {
        let mut buffer: Vec<Complex32> = input
            .iter()
            .take(self.size)
            .map(|&value| Complex32::new(value, 0.0))
            .collect();
        buffer.resize(self.size, Complex32::zero());

        self.fft.process(&mut buffer);
        buffer
    }

    /// Non-negative frequency half of the transform, `size / 2 + 1` bins.
    pub fn forward_one_sided(&self, input: &[f32]) -> Vec<Complex32> {
        let mut buffer = self.forward(input);
        buffer.truncate(self.size / 2 + 1);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn naive_dft_one_sided(input: &[f32]) -> Vec<(f64, f64)> {
        let n = input.len();
        (0..=n / 2)
            .map(|k| {
                input
                    .iter()
                    .enumerate()
                    .fold((0.0, 0.0), |(re, im), (i, &x)| {
                        let angle = -2.0 * PI * (k * i) as f64 / n as f64;
                        (re + f64::from(x) * angle.cos(), im + f64::from(x) * angle.sin())
                    })
            })
            .collect()
    }

    #[test]
    fn one_sided_has_half_plus_one_bins() {
        assert_eq!(FftHelper::new(8).forward_one_sided(&[0.0; 8]).len(), 5);
        assert_eq!(FftHelper::new(7).forward_one_sided(&[0.0; 7]).len(), 4);
    }

    #[test]
    fn one_sided_matches_direct_dft() {
        let input: Vec<f32> = (0..15)
            .map(|i| ((i * 7 % 11) as f32 - 5.0) / 5.0)
            .collect();
        let fast = FftHelper::new(input.len()).forward_one_sided(&input);
        let slow = naive_dft_one_sided(&input);
        assert_eq!(fast.len(), slow.len());
        for (f, (re, im)) in fast.iter().zip(slow) {
            assert!((f64::from(f.re) - re).abs() < 1e-4);
            assert!((f64::from(f.im) - im).abs() < 1e-4);
        }
    }
}
