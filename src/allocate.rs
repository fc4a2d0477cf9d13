use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::aggregate::normalize_label;
use crate::dates::days_between;
use crate::error::{OpsError, Result};
use crate::models::{AllocationPlan, DateRange, PlannedEntry};
use crate::rounding::{round_cents, truncate_cents};

/// Splits `total` evenly across `day_count` slots at two decimal places.
///
/// Each slot gets the truncated share and whatever the truncation lost lands
/// on the last slot, so the slots always add back up to `total` rounded to
/// cents. A non-positive `day_count` yields no slots.
pub fn allocate(total: Decimal, day_count: i64) -> Vec<Decimal> {
    if day_count <= 0 {
        return Vec::new();
    }

    let days = Decimal::from(day_count);
    let base = truncate_cents(total / days);
    let remainder = round_cents(total - base * days);

    let mut amounts = vec![base; day_count as usize];
    if let Some(last) = amounts.last_mut() {
        *last = round_cents(*last + remainder);
    }
    amounts
}

/// Builds the per-day loss entries for one plant over `range`.
pub fn build_plan(usina: &str, range: DateRange, total: Decimal) -> Result<AllocationPlan> {
    let days = days_between(range.start, range.end);
    if days.is_empty() {
        return Err(OpsError::InvertedRange {
            start: range.start,
            end: range.end,
        });
    }

    let usina = normalize_label(usina);
    let amounts = allocate(total, days.len() as i64);
    let entries: Vec<PlannedEntry> = days
        .into_iter()
        .zip(amounts)
        .map(|(day, amount)| PlannedEntry {
            id: Uuid::new_v4(),
            source_key: source_key(&usina, &day.to_string()),
            usina: usina.clone(),
            day,
            amount,
        })
        .collect();

    info!(
        usina = %usina,
        start = %range.start,
        end = %range.end,
        days = entries.len(),
        total = %total,
        "built loss allocation plan"
    );

    Ok(AllocationPlan {
        range,
        total,
        entries,
    })
}

fn source_key(usina: &str, day: &str) -> String {
    let slug: String = usina
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { '-' })
        .collect();
    if slug.is_empty() {
        format!("perda-{day}")
    } else {
        format!("perda-{slug}-{day}")
    }
}
