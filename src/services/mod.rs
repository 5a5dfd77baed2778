pub mod experience_service;
pub mod portfolio_service;
pub mod profile_service;
pub mod project_service;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::store::{DataStore, SelectQuery, StoreError};

/// Next display-order value for a scope: current max + 1, or 1 when the
/// scope is empty. Read-then-write, so concurrent creates can race to the
/// same value; display order is advisory, not a uniqueness sequence.
pub(crate) async fn next_order_index(
    store: &dyn DataStore,
    table: &str,
    scope_column: &str,
    scope_id: Uuid,
) -> Result<i32, StoreError> {
    let rows = store
        .select(
            table,
            SelectQuery::new()
                .columns(&["order_index"])
                .eq(scope_column, json!(scope_id))
                .order_desc("order_index")
                .limit(1),
        )
        .await?;

    let max = rows
        .first()
        .and_then(|row| row.get("order_index"))
        .and_then(Value::as_i64);

    Ok(match max {
        Some(current) => current as i32 + 1,
        None => 1,
    })
}
