//! Windowed moving-average smoothing with reflected edges.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayBase, Data, Dimension};
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::error::{DoradoError, Result};

/// Smoothing window shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    /// Plain moving average
    Flat,
    #[default]
    Hanning,
    Hamming,
    Bartlett,
    Blackman,
}

impl Window {
    pub const ALL: [Window; 5] = [
        Window::Flat,
        Window::Hanning,
        Window::Hamming,
        Window::Bartlett,
        Window::Blackman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Hanning => "hanning",
            Self::Hamming => "hamming",
            Self::Bartlett => "bartlett",
            Self::Blackman => "blackman",
        }
    }

    /// Window coefficients of length `len`, unnormalized.
    pub fn coefficients(&self, len: usize) -> Vec<f64> {
        if len == 1 {
            return vec![1.0];
        }
        let m = (len - 1) as f64;
        (0..len)
            .map(|n| {
                let n = n as f64;
                match self {
                    Self::Flat => 1.0,
                    Self::Hanning => 0.5 - 0.5 * (2.0 * PI * n / m).cos(),
                    Self::Hamming => 0.54 - 0.46 * (2.0 * PI * n / m).cos(),
                    Self::Bartlett => 1.0 - (2.0 * n / m - 1.0).abs(),
                    Self::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * n / m).cos() + 0.08 * (4.0 * PI * n / m).cos()
                    }
                }
            })
            .collect()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Window {
    type Err = DoradoError;

    fn from_str(s: &str) -> Result<Self> {
        Window::ALL
            .iter()
            .copied()
            .find(|w| w.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DoradoError::InvalidInput(format!(
                    "window {s:?} is none of flat, hanning, hamming, bartlett, blackman"
                ))
            })
    }
}

/// Smooth a 1-D signal by convolving it with a normalized window.
///
/// The signal is padded at both ends with `window_len - 1` reflected
/// samples and only the fully overlapping part of the convolution is kept,
/// so the output has `len + window_len - 1` samples. A window shorter than
/// 3 returns the input unchanged.
pub fn smooth<A, S, D>(x: &ArrayBase<S, D>, window_len: usize, window: Window) -> Result<Array1<A>>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    if x.ndim() != 1 {
        return Err(DoradoError::InvalidInput(format!(
            "smooth only accepts 1-D input, got {} dimensions",
            x.ndim()
        )));
    }
    let n = x.len();
    if n < window_len {
        return Err(DoradoError::InvalidInput(format!(
            "input of {n} samples is shorter than the window ({window_len})"
        )));
    }
    let values: Vec<A> = x.iter().copied().collect();
    if window_len < 3 {
        return Ok(Array1::from(values));
    }

    let padded: Vec<A> = values[1..window_len]
        .iter()
        .rev()
        .chain(values.iter())
        .chain(values[n - window_len..n - 1].iter().rev())
        .copied()
        .collect();

    let coeffs = window.coefficients(window_len);
    let total: f64 = coeffs.iter().sum();
    let weights: Vec<A> = coeffs
        .iter()
        .map(|&c| A::from(c / total).unwrap_or_else(A::zero))
        .collect();

    let out_len = padded.len() - window_len + 1;
    let smoothed = (0..out_len)
        .map(|k| {
            weights
                .iter()
                .rev()
                .zip(&padded[k..k + window_len])
                .fold(A::zero(), |acc, (&w, &v)| acc + w * v)
        })
        .collect::<Vec<A>>();
    Ok(Array1::from(smoothed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numpy_window_values() {
        let h = Window::Hanning.coefficients(5);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0];
        for (a, b) in h.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }
        let b = Window::Bartlett.coefficients(5);
        assert_eq!(b, vec![0.0, 0.5, 1.0, 0.5, 0.0]);
        let bl = Window::Blackman.coefficients(3);
        assert!(bl[0].abs() < 1e-12 && (bl[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn window_names_round_trip() {
        for w in Window::ALL {
            assert_eq!(w.as_str().parse::<Window>().unwrap(), w);
        }
    }
}
