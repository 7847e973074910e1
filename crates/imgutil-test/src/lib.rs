//! imgutil-test - Regression test helpers for imgutil
//!
//! Provides a small regression harness modeled on numbered checks: each
//! comparison bumps an index, failures are collected, and `cleanup`
//! reports the outcome.
//!
//! # Usage
//!
//! ```
//! use imgutil_test::RegParams;
//!
//! let mut rp = RegParams::new("palette");
//! rp.compare_values(3.0, 3.0, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! Synthetic inputs live in [`synthetic`], so no image files are needed.

mod params;
pub mod synthetic;

pub use params::RegParams;
