use num_complex::Complex;
use rustfft::FftPlanner;

fn forward(values: &[f64]) -> Vec<Complex<f64>> {
    let mut buf: Vec<Complex<f64>> = values.iter().map(|&v| Complex::new(v, 0.0)).collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(buf.len()).process(&mut buf);
    buf
}

/// Fourier low-pass: keep the DC bin and the first `terms` harmonics
/// (with their negative-frequency mirrors), zero the rest, transform back.
///
/// The output has the same length as the input.
pub fn lowpass(values: &[f64], terms: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || 2 * terms + 1 >= n {
        return values.to_vec();
    }

    let mut spectrum = forward(values);
    for c in &mut spectrum[terms + 1..n - terms] {
        *c = Complex::new(0.0, 0.0);
    }

    let mut planner = FftPlanner::new();
    planner.plan_fft_inverse(n).process(&mut spectrum);
    let scale = 1.0 / n as f64;
    spectrum.iter().map(|c| c.re * scale).collect()
}

/// Squared magnitude of the discrete Fourier transform, optionally after
/// subtracting the mean.
pub fn power_spectrum(values: &[f64], remove_mean: bool) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let offset = if remove_mean {
        values.iter().sum::<f64>() / values.len() as f64
    } else {
        0.0
    };
    let centred: Vec<f64> = values.iter().map(|v| v - offset).collect();
    forward(&centred).iter().map(|c| c.norm_sqr()).collect()
}

/// Sample frequencies for an `n`-point transform with spacing `d`:
/// `[0, 1, ..., n/2 - 1, -n/2, ..., -1] / (d n)` for even `n`.
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let scale = 1.0 / (d * n as f64);
    let positive = (n - 1) / 2 + 1;
    (0..n)
        .map(|i| {
            let k = if i < positive { i as f64 } else { i as f64 - n as f64 };
            k * scale
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fftfreq_matches_numpy_ordering() {
        assert_eq!(fftfreq(4, 1.0), vec![0.0, 0.25, -0.5, -0.25]);
        assert_eq!(fftfreq(5, 0.5), vec![0.0, 0.4, 0.8, -0.8, -0.4]);
    }

    #[test]
    fn lowpass_removes_high_harmonic() {
        let n = 64;
        let values: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                5.0 + t.sin() + 0.3 * (10.0 * t).sin()
            })
            .collect();
        let smooth = lowpass(&values, 3);
        for (i, v) in smooth.iter().enumerate() {
            let t = i as f64 / n as f64 * std::f64::consts::TAU;
            assert!((v - (5.0 + t.sin())).abs() < 1e-9);
        }
    }

    #[test]
    fn power_spectrum_without_mean_has_empty_dc() {
        let p = power_spectrum(&[3.0, 4.0, 3.0, 4.0], true);
        assert!(p[0].abs() < 1e-12);
        assert!((p[2] - 4.0).abs() < 1e-12);
    }
}
