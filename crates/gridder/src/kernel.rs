//! Convolution kernel tabulation.
//!
//! Kernels are tabulated once per run as a 1-D radial profile sampled at
//! `sampling` points per pixel of offset. During accumulation the profile is
//! looked up by rounded fractional-pixel distance, so no transcendental
//! function is evaluated in the inner gridding loop.

use crate::config::{GridderConfig, KernelKind};
use crate::error::GridderError;

/// A tabulated radial kernel profile.
#[derive(Debug, Clone)]
pub struct KernelProfile {
    /// Kernel family this profile was tabulated from.
    pub kind: KernelKind,
    /// Half-width of the kernel footprint, in whole pixels.
    pub support: usize,
    /// Tabulated samples per pixel of offset.
    pub sampling: usize,
    values: Vec<f32>,
}

impl KernelProfile {
    /// Tabulate the kernel selected by `config`.
    pub fn tabulate(config: &GridderConfig) -> Result<Self, GridderError> {
        let sampling = config.kernel_sampling;
        match config.kernel {
            KernelKind::Box => {
                let support = config.kernel_support.unwrap_or(0);
                let len = sampling * (2 * support + 2);
                let mut values = vec![0.0f32; len];
                for v in values.iter_mut().take(len / 2) {
                    *v = 1.0;
                }
                Ok(Self {
                    kind: KernelKind::Box,
                    support,
                    sampling,
                    values,
                })
            }
            KernelKind::Spheroidal => {
                let support = config.kernel_support.unwrap_or(3);
                let len = sampling * (2 * support + 2);
                let mut values = vec![0.0f32; len];
                let edge = support * sampling;
                for (i, v) in values.iter_mut().enumerate().take(edge) {
                    let nu = i as f64 / edge as f64;
                    *v = ((1.0 - nu * nu) * spheroidal(nu)) as f32;
                }
                Ok(Self {
                    kind: KernelKind::Spheroidal,
                    support,
                    sampling,
                    values,
                })
            }
            KernelKind::Gaussian => {
                // Default HWHM corresponds to b = 1.0 of Mangum et al. (2007).
                let hwhm = config.gauss_width.unwrap_or_else(|| (2.0f64).ln().sqrt());
                let truncate = config.truncate.unwrap_or(3.0 * hwhm);
                let support = ceil_support(truncate);
                let len = sampling * (2 * support + 2);
                let mut values = vec![0.0f32; len];
                let tabulated = (truncate * sampling as f64 + 0.5) as usize;
                for (i, v) in values.iter_mut().enumerate().take(tabulated.min(len)) {
                    let r = i as f64 / sampling as f64;
                    *v = gauss(hwhm, r) as f32;
                }
                Ok(Self {
                    kind: KernelKind::Gaussian,
                    support,
                    sampling,
                    values,
                })
            }
            KernelKind::GaussJinc => {
                // Defaults correspond to b = 2.52, c = 1.55 of Mangum et al.
                let hwhm = config
                    .gauss_width
                    .unwrap_or_else(|| (2.0f64).ln().sqrt() * 2.52);
                let jw = config.jinc_width.unwrap_or(1.55);
                let support = ceil_support(config.truncate.unwrap_or(2.0 * jw));
                let len = sampling * (2 * support + 2);
                let mut values = vec![0.0f32; len];
                match config.truncate {
                    Some(truncate) => {
                        let tabulated = (truncate * sampling as f64 + 0.5) as usize;
                        for (i, v) in values.iter_mut().enumerate().take(tabulated.min(len)) {
                            let r = i as f64 / sampling as f64;
                            *v = (gauss(hwhm, r) * jinc(jw, r)) as f32;
                        }
                    }
                    None => {
                        // Truncate at the first null of the jinc envelope.
                        for (i, v) in values.iter_mut().enumerate() {
                            let r = i as f64 / sampling as f64;
                            let envelope = jinc(jw, r);
                            if envelope <= 0.0 {
                                tracing::debug!(
                                    radius = r,
                                    "kernel profile truncated at first jinc null"
                                );
                                break;
                            }
                            *v = (gauss(hwhm, r) * envelope) as f32;
                        }
                    }
                }
                Ok(Self {
                    kind: KernelKind::GaussJinc,
                    support,
                    sampling,
                    values,
                })
            }
        }
    }

    /// Look up the kernel value at a tabulated radial index.
    ///
    /// Indices beyond the tabulated range return 0, so callers can index by
    /// rounded distance without clamping.
    #[inline]
    pub fn value(&self, idx: usize) -> f32 {
        self.values.get(idx).copied().unwrap_or(0.0)
    }

    /// The raw tabulated profile.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

fn ceil_support(radius: f64) -> usize {
    let whole = radius as usize;
    if radius - whole as f64 > 0.0 {
        whole + 1
    } else {
        whole
    }
}

fn gauss(hwhm: f64, r: f64) -> f64 {
    (-(2.0f64).ln() * (r / hwhm) * (r / hwhm)).exp()
}

/// Normalized jinc, J1(πr/c) / (πr/c), scaled so jinc(0) = 1.
fn jinc(c: f64, r: f64) -> f64 {
    let x = std::f64::consts::PI * r / c;
    let raw = if x == 0.0 { 0.5 } else { bessel_j1(x) / x };
    raw / 0.5
}

/// Prolate spheroidal wave function rational approximation for m = 6,
/// alpha = 1 (Schwab 1984), valid on 0 <= nu <= 1.
fn spheroidal(nu: f64) -> f64 {
    const P: [[f64; 5]; 2] = [
        [
            8.203343e-2,
            -3.644705e-1,
            6.278660e-1,
            -5.335581e-1,
            2.312756e-1,
        ],
        [
            4.028559e-3,
            -3.697768e-2,
            1.021332e-1,
            -1.201436e-1,
            6.412774e-2,
        ],
    ];
    const Q: [[f64; 3]; 2] = [
        [1.0, 8.212018e-1, 2.078043e-1],
        [1.0, 9.599102e-1, 2.918724e-1],
    ];

    let (part, nuend) = if nu < 0.75 { (0, 0.75) } else { (1, 1.0) };
    if nu > 1.0 {
        return 0.0;
    }
    let delnusq = nu * nu - nuend * nuend;

    let mut top = 0.0;
    for &p in P[part].iter().rev() {
        top = top * delnusq + p;
    }
    let mut bottom = 0.0;
    for &q in Q[part].iter().rev() {
        bottom = bottom * delnusq + q;
    }
    top / bottom
}

/// Bessel function of the first kind, order one, via the Numerical Recipes
/// polynomial approximation.
fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let num = x
            * (72362614232.0
                + y * (-7895059235.0
                    + y * (242396853.1
                        + y * (-2972611.439 + y * (15704.48260 + y * (-30.16036606))))));
        let den = 144725228442.0
            + y * (2300535178.0
                + y * (18583304.74 + y * (99447.43394 + y * (376.9991397 + y))));
        num / den
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - 2.356194491;
        let p1 = 1.0
            + y * (0.183105e-2
                + y * (-0.3516396496e-4 + y * (0.2457520174e-5 + y * (-0.240337019e-6))));
        let p2 = 0.04687499995
            + y * (-0.2002690873e-3
                + y * (0.8449199096e-5 + y * (-0.88228987e-6 + y * 0.105787412e-6)));
        let ans = (0.636619772 / ax).sqrt() * (xx.cos() * p1 - z * xx.sin() * p2);
        if x < 0.0 {
            -ans
        } else {
            ans
        }
    }
}
