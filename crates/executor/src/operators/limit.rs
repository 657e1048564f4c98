//! `LIMIT`/`OFFSET`. The one operator that genuinely benefits from the
//! tree being pull-based: it stops asking its input for more rows as soon
//! as it has emitted `limit` of them.

use async_trait::async_trait;
use esql_ir::{ExecutionResult, Row};

use crate::context::ExecContext;
use crate::stream::{check_cancelled, RowStream};

pub struct LimitStream {
    input: Box<dyn RowStream>,
    ctx: ExecContext,
    remaining_offset: u64,
    remaining_limit: Option<u64>,
}

impl LimitStream {
    pub fn new(input: Box<dyn RowStream>, limit: Option<u64>, offset: Option<u64>, ctx: ExecContext) -> Self {
        Self { input, ctx, remaining_offset: offset.unwrap_or(0), remaining_limit: limit }
    }
}

#[async_trait]
impl RowStream for LimitStream {
    async fn next(&mut self) -> ExecutionResult<Option<Row>> {
        if self.remaining_limit == Some(0) {
            return Ok(None);
        }
        loop {
            check_cancelled(&self.ctx.cancel)?;
            let Some(row) = self.input.next().await? else { return Ok(None) };
            if self.remaining_offset > 0 {
                self.remaining_offset -= 1;
                continue;
            }
            if let Some(n) = &mut self.remaining_limit {
                *n -= 1;
            }
            return Ok(Some(row));
        }
    }
}
