//! # Transport Layer
//!
//! ZeroMQ publish/subscribe plumbing shared by the relay, the capture tap and
//! test producers.
//!
//! Only `tcp://` and `ipc://` endpoints are used. Binding with port `0` is
//! supported; the helpers report the endpoint that was actually bound so callers
//! can connect to it.

pub mod bus;
