//! TriKV - one in-memory key-value store, three transport front-ends
//!
//! The same store is served over a connection-oriented stream listener, a
//! connectionless datagram listener, and a remote invocation service:
//! - One command surface, registered once, bound by three thin adapters
//! - A single shutdown signal observed at every blocking boundary
//! - No implicit globals; the store is constructed once and shared by Arc

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod remote;
pub mod server;
pub mod shutdown;
pub mod store;

/// Re-export commonly used types
pub use commands::{Command, CommandContext, CommandRegistry};
pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use remote::{RemoteClient, RemoteError, RemoteService};
pub use server::{DatagramListener, StreamListener};
pub use shutdown::{ShutdownCoordinator, ShutdownHandle};
pub use store::KvStore;
