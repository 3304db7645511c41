//! Command execution context

use crate::shutdown::ShutdownHandle;
use crate::store::KvStore;
use std::sync::Arc;

/// Context provided to commands during execution
///
/// Gives every verb access to the shared store and to the shutdown signal
/// (for the `exit` verb). Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct CommandContext {
    /// The shared store
    pub store: Arc<KvStore>,

    /// Process-wide shutdown signal
    pub shutdown: ShutdownHandle,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(store: Arc<KvStore>, shutdown: ShutdownHandle) -> Self {
        CommandContext { store, shutdown }
    }
}
