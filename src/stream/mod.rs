//! Stream combinators for consumer subscriptions

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
