//! Testing utilities for credential resolution
//!
//! Mock exchange and host identity clients plus fixtures, so code built on
//! this crate can be tested without AWS. Enabled by the `test-util` feature.

pub mod fixtures;
pub mod mocks;

pub use self::fixtures::*;
pub use self::mocks::*;
pub use crate::clock::ManualClock;
