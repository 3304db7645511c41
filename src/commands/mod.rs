//! Command execution module
//!
//! Provides a unified interface for all verbs through the Command trait.
//! One command surface serves all three transports: the stream and datagram
//! listeners reach it through the dispatcher, and the remote service binds
//! the same implementations as named operations.

mod context;
mod registry;

// Verb implementations
mod admin;
mod key;
mod string;

pub use admin::{ExitCommand, GetLenCommand, StoreCommand, TestCommand};
pub use context::CommandContext;
pub use key::DelCommand;
pub use registry::CommandRegistry;
pub use string::{GetCommand, PutCommand};

/// Command execution trait
///
/// All verbs implement this trait with a single execute method. This keeps
/// the dispatcher and the transport adapters decoupled from individual verb
/// implementations.
pub trait Command: Send + Sync {
    /// Execute the command with the given context and arguments
    ///
    /// Arguments:
    /// - ctx: the command context (store and shutdown signal)
    /// - args: argument tokens (excluding the verb itself)
    ///
    /// Returns the wire response text.
    fn execute(&self, ctx: &CommandContext, args: &[&str]) -> String;

    /// Verb name as it appears on the wire (lowercase)
    fn name(&self) -> &'static str;

    /// Exact number of argument tokens the verb requires
    ///
    /// None means the verb ignores whatever follows it.
    fn exact_args(&self) -> Option<usize> {
        None
    }

    /// Response for a malformed token count
    ///
    /// `tokens` is the full received line split on spaces, verb included.
    fn usage_error(&self, tokens: &[&str]) -> String {
        format!(
            "ERROR: Usage: {} <key> - Received parts: {:?}",
            self.name(),
            tokens
        )
    }
}
