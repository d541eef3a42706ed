//! Producer threads, backpressured handoffs and cancellation

pub mod cancel;
pub mod enumeration;
pub mod handoff;

pub use cancel::CancelToken;
pub use enumeration::{Canceller, Enumeration};
pub use handoff::Fallible;
