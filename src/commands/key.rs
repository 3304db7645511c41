//! Key commands (DEL)

use super::{Command, CommandContext};

/// DEL command - Remove a key
///
/// Syntax: del <key>
pub struct DelCommand;

impl Command for DelCommand {
    fn execute(&self, ctx: &CommandContext, args: &[&str]) -> String {
        if ctx.store.delete(args[0]) {
            "OK".to_string()
        } else {
            "NOT FOUND".to_string()
        }
    }

    fn name(&self) -> &'static str {
        "del"
    }

    fn exact_args(&self) -> Option<usize> {
        Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownCoordinator;
    use crate::store::KvStore;
    use std::sync::Arc;

    #[test]
    fn test_del() {
        let ctx = CommandContext::new(
            Arc::new(KvStore::new()),
            ShutdownCoordinator::new().handle(),
        );
        ctx.store.put("key1", "value1");

        assert_eq!(DelCommand.execute(&ctx, &["key1"]), "OK");
        assert_eq!(DelCommand.execute(&ctx, &["key1"]), "NOT FOUND");
        assert_eq!(ctx.store.get("key1"), None);
    }

    #[test]
    fn test_del_absent_key_is_not_a_protocol_error() {
        let ctx = CommandContext::new(
            Arc::new(KvStore::new()),
            ShutdownCoordinator::new().handle(),
        );

        let response = DelCommand.execute(&ctx, &["never-inserted"]);
        assert_eq!(response, "NOT FOUND");
        assert!(!response.starts_with("ERROR:"));
    }
}
