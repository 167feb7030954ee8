//! xorshift64* random number generator
//!
//! Same seed → same sequence of draws. A run is only reproducible if every
//! stochastic choice (Kiesling noise, take-the-best random fallback, lifetime
//! sampling, word-of-mouth partner selection) consumes from one `RngManager`
//! owned by that run.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use adoption_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let noise = rng.uniform(-0.1, 0.1);
/// assert!(noise >= -0.1 && noise < 0.1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit, never zero)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is mapped to 1, since xorshift cannot leave the zero state.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Generate random f64 in range [low, high)
    ///
    /// Returns `low` when the range is empty, without consuming a draw.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + (high - low) * self.next_f64()
    }

    /// Pick an index in [0, len)
    ///
    /// # Panics
    /// Panics if `len` is zero
    pub fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty range");
        (self.next() % len as u64) as usize
    }

    /// Bernoulli trial with success probability `p` (clamped to [0, 1])
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.next_f64() < p
    }

    /// Standard normal draw (Box-Muller)
    pub fn standard_normal(&mut self) -> f64 {
        // 1 - u keeps the logarithm argument in (0, 1]
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Get current RNG state (for checkpointing/replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }
}
