//! Batch execution with rollback
//!
//! Commands run strictly in order since later commands may resolve
//! placeholders bound by earlier ones. When command `k` fails, commands
//! `k-1..=0` are reverted in that order. Rollback is best-effort: a revert
//! failure is logged and collected, and the apply failure stays the reported
//! cause.

use crate::db::PageStore;
use crate::operations::commands::Command;
use crate::operations::context::ExecutionContext;
use crate::operations::error::CommandError;

/// A batch that failed at `index` and was rolled back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub index: usize,
    pub error: CommandError,
    /// Reverts that failed during rollback, by command index
    pub rollback_errors: Vec<(usize, CommandError)>,
}

/// A logged command whose revert failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertFailure {
    pub index: usize,
    pub error: CommandError,
}

pub struct BatchExecutor<'a> {
    store: &'a dyn PageStore,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(store: &'a dyn PageStore) -> Self {
        Self { store }
    }

    /// Apply `commands` in order
    ///
    /// Returns the executed commands, each carrying its captured revert state.
    pub async fn execute(
        &self,
        commands: Vec<Command>,
        ctx: &mut ExecutionContext,
    ) -> Result<Vec<Command>, BatchFailure> {
        let total = commands.len();
        let mut executed: Vec<Command> = Vec::with_capacity(total);

        for (index, mut command) in commands.into_iter().enumerate() {
            match command.apply(self.store, ctx).await {
                Ok(()) => executed.push(command),
                Err(error) => {
                    tracing::warn!(
                        "Command {}/{} ({}) failed: {}; rolling back {} applied",
                        index + 1,
                        total,
                        command.name(),
                        error,
                        executed.len()
                    );
                    let rollback_errors = self.rollback(&executed, ctx).await;
                    return Err(BatchFailure {
                        index,
                        error,
                        rollback_errors,
                    });
                }
            }
        }

        tracing::debug!("Applied {} commands", executed.len());
        Ok(executed)
    }

    async fn rollback(
        &self,
        executed: &[Command],
        ctx: &ExecutionContext,
    ) -> Vec<(usize, CommandError)> {
        let mut errors = Vec::new();
        for (index, command) in executed.iter().enumerate().rev() {
            match command.revert(self.store, ctx).await {
                Ok(()) => tracing::debug!("Rolled back command {} ({})", index, command.name()),
                Err(e) => {
                    tracing::error!(
                        "Rollback of command {} ({}) failed: {}",
                        index,
                        command.name(),
                        e
                    );
                    errors.push((index, e));
                }
            }
        }
        errors
    }

    /// Revert logged commands newest first, stopping at the first failure
    pub async fn revert_all(
        &self,
        commands: &[Command],
        ctx: &ExecutionContext,
    ) -> Result<(), RevertFailure> {
        for (index, command) in commands.iter().enumerate().rev() {
            command
                .revert(self.store, ctx)
                .await
                .map_err(|error| RevertFailure { index, error })?;
            tracing::debug!("Reverted command {} ({})", index, command.name());
        }
        Ok(())
    }
}
