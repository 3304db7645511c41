//! String commands (PUT, GET)

use super::{Command, CommandContext};

/// PUT command - Store a value under a key
///
/// Syntax: put <key> <value>
pub struct PutCommand;

impl Command for PutCommand {
    fn execute(&self, ctx: &CommandContext, args: &[&str]) -> String {
        ctx.store.put(args[0], args[1]);
        "OK".to_string()
    }

    fn name(&self) -> &'static str {
        "put"
    }

    fn exact_args(&self) -> Option<usize> {
        Some(2)
    }

    fn usage_error(&self, _tokens: &[&str]) -> String {
        "ERROR: Usage: put <key> <value>".to_string()
    }
}

/// GET command - Get the value of a key
///
/// Syntax: get <key>
pub struct GetCommand;

impl Command for GetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[&str]) -> String {
        match ctx.store.get(args[0]) {
            Some(value) => value,
            None => "NOT FOUND".to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "get"
    }

    fn exact_args(&self) -> Option<usize> {
        Some(1)
    }
}
