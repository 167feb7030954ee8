//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm for fast, reproducible draws.
//! All randomness in the kernel (decision noise, random fallbacks, lifetime
//! sampling, communication partner selection) goes through this module.

mod xorshift;

pub use xorshift::RngManager;
