//! Seeded synthetic signals for tests
//!
//! Generates dual-polarization QPSK test signals distorted by
//! a known unitary polarization rotation, plus optional
//! additive Gaussian noise. Everything is driven by a seeded
//! ChaCha generator so test runs are reproducible.

use num_complex::Complex;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::signal::DualPol;

/// Rotated dual-pol QPSK, returning the transmitted symbols
///
/// Draws independent QPSK streams for X and Y at one sample
/// per symbol, mixes them with the unitary rotation
///
/// ```txt
/// [ cos θ  −sin θ ]
/// [ sin θ   cos θ ]
/// ```
///
/// and adds zero-mean Gaussian noise of standard deviation
/// `noise_std` per axis. Returns the distorted signal and the
/// clean transmitted symbol streams.
pub fn rotated_qpsk_with_tx(
    seed: u64,
    len: usize,
    theta: f64,
    noise_std: f64,
) -> (DualPol, [Vec<Complex<f64>>; 2]) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut tx_x = Vec::with_capacity(len);
    let mut tx_y = Vec::with_capacity(len);
    for _i in 0..len {
        tx_x.push(qpsk_symbol(&mut rng));
        tx_y.push(qpsk_symbol(&mut rng));
    }

    let (sin, cos) = theta.sin_cos();
    let mut rx_x = Vec::with_capacity(len);
    let mut rx_y = Vec::with_capacity(len);
    for (&sx, &sy) in tx_x.iter().zip(tx_y.iter()) {
        rx_x.push(cos * sx - sin * sy + noise(&mut rng, noise_std));
        rx_y.push(sin * sx + cos * sy + noise(&mut rng, noise_std));
    }

    (DualPol::new(rx_x, rx_y), [tx_x, tx_y])
}

/// Rotated dual-pol QPSK, signal only
pub fn rotated_qpsk(seed: u64, len: usize, theta: f64, noise_std: f64) -> DualPol {
    rotated_qpsk_with_tx(seed, len, theta, noise_std).0
}

/// Mean squared magnitude of a complex slice
pub fn mean_sq(values: &[Complex<f64>]) -> f64 {
    values.iter().map(|v| v.norm_sqr()).sum::<f64>() / values.len() as f64
}

// One unit-power QPSK symbol: (±1 ± j)/√2
fn qpsk_symbol(rng: &mut ChaCha8Rng) -> Complex<f64> {
    let axis = 0.5f64.sqrt();
    let re = if rng.gen::<bool>() { axis } else { -axis };
    let im = if rng.gen::<bool>() { axis } else { -axis };
    Complex::new(re, im)
}

// Complex Gaussian noise via Box-Muller
fn noise(rng: &mut ChaCha8Rng, std: f64) -> Complex<f64> {
    if std == 0.0 {
        return Complex::new(0.0, 0.0);
    }
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    let mag = std * (-2.0 * u1.ln()).sqrt();
    let ang = 2.0 * std::f64::consts::PI * u2;
    Complex::new(mag * ang.cos(), mag * ang.sin())
}
