//! Command registry
//!
//! Centralized registry for all available verbs. This allows loose coupling
//! between verb implementations and the dispatcher.

use super::{admin, key, string, Command};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all available commands
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a new command registry and register all verbs
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        // Register string commands
        registry.register(Arc::new(string::PutCommand));
        registry.register(Arc::new(string::GetCommand));

        // Register key commands
        registry.register(Arc::new(key::DelCommand));

        // Register admin commands
        registry.register(Arc::new(admin::StoreCommand));
        registry.register(Arc::new(admin::TestCommand));
        registry.register(Arc::new(admin::GetLenCommand));
        registry.register(Arc::new(admin::ExitCommand));

        registry
    }

    /// Register a command
    fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Get a command by verb (case-insensitive)
    pub fn get(&self, verb: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&verb.to_lowercase()).cloned()
    }

    /// Check if a verb is registered
    pub fn has_command(&self, verb: &str) -> bool {
        self.commands.contains_key(&verb.to_lowercase())
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
