//! Admin commands (STORE, TEST, GETLEN, EXIT)

use super::{Command, CommandContext};

/// STORE command - Render the whole store
///
/// Syntax: store
pub struct StoreCommand;

impl Command for StoreCommand {
    fn execute(&self, ctx: &CommandContext, _args: &[&str]) -> String {
        ctx.store.render_snapshot()
    }

    fn name(&self) -> &'static str {
        "store"
    }
}

/// TEST command - Populate the store with the synthetic data set
///
/// Syntax: test
pub struct TestCommand;

impl Command for TestCommand {
    fn execute(&self, ctx: &CommandContext, _args: &[&str]) -> String {
        ctx.store.populate_fixture();

        let rendered = ctx.store.render_snapshot();
        format!(
            "TEST COMPLETED: Store contents length: {}",
            rendered.chars().count()
        )
    }

    fn name(&self) -> &'static str {
        "test"
    }
}

/// GETLEN command - Report the snapshot's character length
///
/// Syntax: getlen
pub struct GetLenCommand;

impl Command for GetLenCommand {
    fn execute(&self, ctx: &CommandContext, _args: &[&str]) -> String {
        format!("LENGTH:{}", ctx.store.render_snapshot().chars().count())
    }

    fn name(&self) -> &'static str {
        "getlen"
    }
}

/// EXIT command - Initiate process-wide shutdown
///
/// Syntax: exit
///
/// This is the terminal transition for a stream session: after the response
/// is written, no listener accepts new work.
pub struct ExitCommand;

impl Command for ExitCommand {
    fn execute(&self, ctx: &CommandContext, _args: &[&str]) -> String {
        ctx.shutdown.initiate();
        "Server shutting down.".to_string()
    }

    fn name(&self) -> &'static str {
        "exit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownCoordinator;
    use crate::store::KvStore;
    use std::sync::Arc;

    fn test_context() -> CommandContext {
        CommandContext::new(Arc::new(KvStore::new()), ShutdownCoordinator::new().handle())
    }

    #[test]
    fn test_store_renders_snapshot() {
        let ctx = test_context();
        ctx.store.put("b", "2");

        assert_eq!(StoreCommand.execute(&ctx, &[]), "b=2; ");
    }

    #[test]
    fn test_test_and_getlen_agree_with_store() {
        let ctx = test_context();

        let summary = TestCommand.execute(&ctx, &[]);
        let rendered_len = StoreCommand.execute(&ctx, &[]).chars().count();

        assert_eq!(
            summary,
            format!("TEST COMPLETED: Store contents length: {}", rendered_len)
        );
        assert_eq!(
            GetLenCommand.execute(&ctx, &[]),
            format!("LENGTH:{}", rendered_len)
        );
    }

    #[test]
    fn test_getlen_of_empty_store() {
        let ctx = test_context();

        assert_eq!(GetLenCommand.execute(&ctx, &[]), "LENGTH:0");
    }

    #[test]
    fn test_exit_sets_the_flag() {
        let ctx = test_context();

        assert_eq!(ExitCommand.execute(&ctx, &[]), "Server shutting down.");
        assert!(ctx.shutdown.is_triggered());
    }
}
