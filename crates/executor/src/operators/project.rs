//! `SELECT` list evaluation, including `*`/`table.*` expansion.

use async_trait::async_trait;
use esql_ir::{Cell, ExecutionResult, Row, SelectItem};

use crate::context::ExecContext;
use crate::eval::eval_expr;
use crate::stream::{check_cancelled, RowStream};

pub struct ProjectStream {
    input: Box<dyn RowStream>,
    columns: Vec<SelectItem>,
    ctx: ExecContext,
}

impl ProjectStream {
    pub fn new(input: Box<dyn RowStream>, columns: Vec<SelectItem>, ctx: ExecContext) -> Self {
        Self { input, columns, ctx }
    }
}

#[async_trait]
impl RowStream for ProjectStream {
    async fn next(&mut self) -> ExecutionResult<Option<Row>> {
        check_cancelled(&self.ctx.cancel)?;
        let Some(row) = self.input.next().await? else { return Ok(None) };
        Ok(Some(project_row(&self.columns, &row, &self.ctx).await?))
    }

    fn limit_already_applied(&self) -> bool {
        self.input.limit_already_applied()
    }
}

pub async fn project_row(columns: &[SelectItem], row: &Row, ctx: &ExecContext) -> ExecutionResult<Row> {
    let mut out = Row::new();
    for item in columns {
        match item {
            SelectItem::Wildcard => push_wildcard(&mut out, row, None),
            SelectItem::QualifiedWildcard(table) => push_wildcard(&mut out, row, Some(table.as_str())),
            SelectItem::Expr { expr, alias } => {
                let value = eval_expr(expr, row, ctx).await?;
                let name = alias.clone().unwrap_or_else(|| default_column_name(expr));
                out.push(name, Cell::value(value));
            }
        }
    }
    Ok(out)
}

fn push_wildcard(out: &mut Row, row: &Row, only_table: Option<&str>) {
    let has_qualified = row.names().any(|n| n.contains('.'));
    if !has_qualified {
        for (name, cell) in row.iter() {
            out.push(name.to_string(), cell.clone());
        }
        return;
    }
    for (name, cell) in row.iter() {
        let Some(dot) = name.find('.') else { continue };
        let (table, label) = (&name[..dot], &name[dot + 1..]);
        if only_table.is_some_and(|t| t != table) {
            continue;
        }
        out.push(label.to_string(), cell.clone());
    }
}

fn default_column_name(expr: &esql_ir::Expr) -> String {
    match &expr.kind {
        esql_ir::ExprKind::Column(col) => col.column.clone(),
        esql_ir::ExprKind::Function { name, .. } => name.clone(),
        _ => "?column?".to_string(),
    }
}
