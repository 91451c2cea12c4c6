//! Business logic for playtube-rs.
//!
//! Services own the domain rules: account and session handling, video
//! publishing, the channel/video aggregation composers, and the toggle
//! semantics for likes and subscriptions. Each service wraps one or more
//! repositories and takes the viewer identity as an explicit parameter,
//! never ambient state.

pub mod services;

pub use services::*;
