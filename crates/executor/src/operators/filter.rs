//! `WHERE` re-evaluation. Always re-applies the complete predicate,
//! regardless of whether a scan hint offered (part of) it for pushdown —
//! pushdown is a pure optimization signal a `DataSource` may ignore, so
//! correctness never depends on whether it did.

use async_trait::async_trait;
use esql_ir::{ExecutionResult, Expr, Row};

use crate::context::ExecContext;
use crate::eval::eval_expr;
use crate::stream::{check_cancelled, RowStream};

pub struct FilterStream {
    input: Box<dyn RowStream>,
    predicate: Expr,
    ctx: ExecContext,
}

impl FilterStream {
    pub fn new(input: Box<dyn RowStream>, predicate: Expr, ctx: ExecContext) -> Self {
        Self { input, predicate, ctx }
    }
}

#[async_trait]
impl RowStream for FilterStream {
    async fn next(&mut self) -> ExecutionResult<Option<Row>> {
        loop {
            check_cancelled(&self.ctx.cancel)?;
            let Some(row) = self.input.next().await? else { return Ok(None) };
            let keep = eval_expr(&self.predicate, &row, &self.ctx).await?;
            if keep.is_truthy() {
                return Ok(Some(row));
            }
        }
    }

    fn limit_already_applied(&self) -> bool {
        self.input.limit_already_applied()
    }
}
