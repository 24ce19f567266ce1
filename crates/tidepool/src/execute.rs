//! Applying a plan.
//!
//! The planner's job ends at [`Plan`]. Something implementing [`PlanExecutor`]
//! performs each operation against the remote service. [`apply_plan`] drives
//! it in plan order and decides, per [`ApplyPolicy`], what happens after a
//! failure. Nothing here retries or rolls back.

use crate::error::BoxError;
use crate::plan::{Operation, Plan};
use std::future::Future;
use tracing::{Instrument, debug, warn};

/// Performs a single operation against the remote service.
pub trait PlanExecutor {
    fn apply(&mut self, operation: &Operation) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// A single operation failed during execution.
#[derive(Debug, thiserror::Error)]
#[error("failed to apply `{operation}`: {cause}")]
pub struct ApplyError {
    /// Position of the operation in its plan
    pub step: usize,
    pub operation: Operation,
    #[source]
    pub cause: BoxError,
}

/// What to do after an operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyPolicy {
    /// Stop at the first failure; later operations are not attempted.
    #[default]
    HaltOnError,
    /// Attempt every operation and collect all failures.
    Continue,
}

impl ApplyPolicy {
    pub fn from_halt_on_error(halt: bool) -> Self {
        if halt {
            ApplyPolicy::HaltOnError
        } else {
            ApplyPolicy::Continue
        }
    }
}

/// Outcome of applying a plan.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Plan positions that were applied successfully
    pub applied: Vec<usize>,
    pub failures: Vec<ApplyError>,
    /// Operations never attempted because an earlier one failed
    pub skipped: usize,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }

    /// Number of operations applied, or the first failure.
    pub fn into_result(self) -> Result<usize, ApplyError> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.applied.len()),
        }
    }
}

/// Apply every operation of `plan` in order.
pub async fn apply_plan<E: PlanExecutor>(
    plan: &Plan,
    executor: &mut E,
    policy: ApplyPolicy,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for (step, operation) in plan.iter().enumerate() {
        let span = tracing::debug_span!("plan.apply", step, op = %operation);
        match executor.apply(operation).instrument(span).await {
            Ok(()) => {
                debug!(step, "applied");
                report.applied.push(step);
            }
            Err(cause) => {
                warn!(step, op = %operation, error = %cause, "operation failed");
                report.failures.push(ApplyError {
                    step,
                    operation: operation.clone(),
                    cause,
                });
                if policy == ApplyPolicy::HaltOnError {
                    report.skipped = plan.len() - step - 1;
                    break;
                }
            }
        }
    }

    report
}

/// Sends SQL to the remote query endpoint.
pub trait SqlClient {
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// An executor that renders each operation to SQL and sends the batch in one
/// request.
#[derive(Debug)]
pub struct SqlPlanExecutor<C> {
    client: C,
}

impl<C> SqlPlanExecutor<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C: SqlClient + Send> PlanExecutor for SqlPlanExecutor<C> {
    async fn apply(&mut self, operation: &Operation) -> Result<(), BoxError> {
        let statements = operation.to_sql();
        if statements.is_empty() {
            debug!(op = %operation, "nothing to send");
            return Ok(());
        }
        let mut sql = statements.join(";\n");
        sql.push(';');
        self.client.execute(&sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{TableOperation, TableRef};

    #[derive(Default)]
    struct RecordingClient {
        batches: Vec<String>,
    }

    impl SqlClient for RecordingClient {
        async fn execute(&mut self, sql: &str) -> Result<(), BoxError> {
            self.batches.push(sql.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sql_executor_sends_one_batch_per_operation() {
        let table = TableRef::new("public", "post");
        let plan = Plan::new(vec![
            Operation::Table {
                table: table.clone(),
                op: TableOperation::EnableRls(true),
            },
            Operation::Table {
                table: table.clone(),
                op: TableOperation::Rename {
                    from: "post".to_string(),
                    to: "post".to_string(),
                },
            },
            Operation::DropTable {
                table,
                cascade: true,
            },
        ]);

        let mut executor = SqlPlanExecutor::new(RecordingClient::default());
        let report = apply_plan(&plan, &mut executor, ApplyPolicy::HaltOnError).await;
        assert!(report.is_success());
        assert_eq!(report.applied, vec![0, 1, 2]);
        assert_eq!(
            executor.into_inner().batches,
            vec![
                r#"ALTER TABLE "public"."post" ENABLE ROW LEVEL SECURITY;"#.to_string(),
                r#"DROP TABLE IF EXISTS "public"."post" CASCADE;"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_policy_from_config_flag() {
        assert_eq!(ApplyPolicy::from_halt_on_error(true), ApplyPolicy::HaltOnError);
        assert_eq!(ApplyPolicy::from_halt_on_error(false), ApplyPolicy::Continue);
    }
}
