//! Control protocol for Vantage.
//!
//! Defines the requests a capture driver sends to a scene session and the
//! responses it gets back. Messages travel as compact bincode frames or as
//! JSON lines for scripted drivers.

pub mod codec;
pub mod dispatch;
pub mod messages;

pub use codec::*;
pub use dispatch::dispatch;
pub use messages::*;
