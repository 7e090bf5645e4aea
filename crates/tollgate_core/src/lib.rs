//! Shared primitives for the Tollgate crates.
//!
//! Both the rate limiter and the token session reason about "now". They take
//! an `Arc<dyn Clock>` so production code reads the monotonic system clock
//! while tests drive time by hand with [`ManualClock`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
