//! Command dispatcher
//!
//! Routes a raw wire line to the appropriate verb handler. The dispatcher
//! is transport-agnostic: the stream and datagram listeners hand it received
//! text unchanged, so both speak exactly the same command grammar.

use crate::commands::{CommandContext, CommandRegistry};
use crate::shutdown::ShutdownHandle;
use crate::store::KvStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Command dispatcher
///
/// Splits a received line into tokens, validates arity, and executes the
/// selected verb against the shared store.
pub struct Dispatcher {
    /// Command registry
    registry: CommandRegistry,

    /// Command execution context
    context: CommandContext,
}

impl Dispatcher {
    /// Create a new dispatcher over the shared store
    pub fn new(store: Arc<KvStore>, shutdown: ShutdownHandle) -> Self {
        Dispatcher {
            registry: CommandRegistry::new(),
            context: CommandContext::new(store, shutdown),
        }
    }

    /// Dispatch one wire line and produce the response text
    ///
    /// The line is split on single spaces; the first token selects the verb
    /// (case-insensitive). A malformed token count is rejected before any
    /// store access, so a usage error never mutates state.
    pub fn dispatch(&self, line: &str) -> String {
        let mut tokens: Vec<&str> = line.split(' ').collect();
        // trailing empty tokens do not count toward arity
        while tokens.len() > 1 && tokens.last() == Some(&"") {
            tokens.pop();
        }
        // split always yields at least one token
        let verb = tokens[0];

        debug!("Dispatching command: {}", verb);

        let command = match self.registry.get(verb) {
            Some(cmd) => cmd,
            None => {
                warn!("Unknown command: {}", verb);
                return "ERROR: Unknown command.".to_string();
            }
        };

        let args = &tokens[1..];
        if let Some(expected) = command.exact_args() {
            if args.len() != expected {
                return command.usage_error(&tokens);
            }
        }

        command.execute(&self.context, args)
    }

    /// Get reference to the context (for the remote service and tests)
    pub fn context(&self) -> &CommandContext {
        &self.context
    }
}
