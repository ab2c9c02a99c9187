//! Placement of line items across the pages' table regions

use crate::report::{CellValue, LineItem};
use crate::template::{CellAddress, ColumnRole, PagePlan};

/// One table cell written by pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCell {
    pub page_id: String,
    pub cell: CellAddress,
    pub role: ColumnRole,
    pub value: CellValue,
}

/// Result of placing line items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    pub cells: Vec<PlacedCell>,
    /// Items written to some page
    pub placed: usize,
    /// Items left over after the last page
    pub overflow: usize,
}

/// Distribute `items` over `plans` in order.
///
/// Each page takes the next `min(capacity, remaining)` items onto consecutive
/// rows from its start row. The index column carries the 1-based position
/// across all pages. Items that do not fit are counted, never dropped
/// silently.
pub fn place(items: &[LineItem], plans: &[PagePlan]) -> Placement {
    let mut cells = Vec::new();
    let mut next = 0;

    for plan in plans {
        if next == items.len() {
            break;
        }
        // Rows past u32::MAX do not exist, even on an unbounded page
        let rows_left = usize::try_from(u32::MAX - plan.start_row)
            .map_or(usize::MAX, |n| n.saturating_add(1));
        let take = plan.capacity.take(items.len() - next).min(rows_left);

        for (offset, item) in items[next..next + take].iter().enumerate() {
            let row = plan.start_row + offset as u32;
            let index = next + offset + 1;
            for (role, column) in &plan.columns {
                cells.push(PlacedCell {
                    page_id: plan.page_id.clone(),
                    cell: column.with_row(row),
                    role: *role,
                    value: column_value(*role, item, index),
                });
            }
        }

        tracing::debug!(page = %plan.page_id, items = take, first = next + 1, "placed line items");
        next += take;
    }

    Placement {
        cells,
        placed: next,
        overflow: items.len() - next,
    }
}

fn column_value(role: ColumnRole, item: &LineItem, index: usize) -> CellValue {
    match role {
        ColumnRole::Index => CellValue::Integer(index as i64),
        ColumnRole::Name => CellValue::text(item.name.clone()),
        ColumnRole::Unit => CellValue::text(item.unit.clone()),
        ColumnRole::Result => CellValue::text(item.result.clone()),
        ColumnRole::Limit => CellValue::text(item.limit.clone()),
        ColumnRole::Method => CellValue::text(item.method.clone()),
        ColumnRole::Judgment => item.judgment.clone().map(CellValue::Text).unwrap_or_default(),
    }
}
