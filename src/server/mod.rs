//! Server module
//!
//! Transport listeners: a connection-oriented stream listener and a
//! connectionless datagram listener. Both delegate command processing to
//! the shared dispatcher and observe the same shutdown signal around every
//! blocking accept/receive.

mod datagram;
mod stream;

pub use datagram::DatagramListener;
pub use stream::StreamListener;
