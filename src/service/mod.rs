//! # Services
//!
//! The two long-running units and the code that starts them.
//!
//! - **relay**: ingress → egress pass-through
//! - **tap**: egress subscriber that decodes, prints and logs
//! - **proxy**: starts both and hands back a [`proxy::ProxyHandle`]

pub mod proxy;
pub mod relay;
pub mod tap;
