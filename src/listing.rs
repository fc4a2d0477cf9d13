use std::cmp::Ordering;

use tracing::debug;

use crate::aggregate::normalize_label;
use crate::models::{DateRange, OperationRecord, Page};

/// Filter and paging state shared by every record list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub usina: Option<String>,
    pub range: Option<DateRange>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            usina: None,
            range: None,
            page: 1,
            page_size: 20,
        }
    }
}

impl ListQuery {
    pub fn matches(&self, record: &OperationRecord) -> bool {
        if let Some(range) = &self.range {
            match record.occurred_on {
                Some(date) if range.contains(date) => {}
                _ => return false,
            }
        }

        if let Some(usina) = self.usina.as_deref().map(normalize_label) {
            if !usina.is_empty()
                && normalize_label(record.usina.as_deref().unwrap_or("")) != usina
            {
                return false;
            }
        }

        if let Some(needle) = self.search.as_deref().map(|s| s.trim().to_lowercase()) {
            let found = searchable_fields(record).any(|field| field.to_lowercase().contains(&needle));
            if !needle.is_empty() && !found {
                return false;
            }
        }

        true
    }

    /// Filters, orders newest first, and cuts out the requested page.
    pub fn apply(&self, records: &[OperationRecord]) -> Page<OperationRecord> {
        let mut matched: Vec<&OperationRecord> =
            records.iter().filter(|record| self.matches(record)).collect();
        debug!(
            total = records.len(),
            matched = matched.len(),
            "filtered records"
        );

        matched.sort_by(|a, b| newest_first(a, b));

        let page_size = self.page_size.max(1);
        let total_items = matched.len();
        let total_pages = total_items.div_ceil(page_size).max(1);
        let page = self.page.clamp(1, total_pages);

        let items = matched
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        Page {
            items,
            page,
            page_size,
            total_items,
            total_pages,
        }
    }
}

fn searchable_fields(record: &OperationRecord) -> impl Iterator<Item = &str> {
    [
        Some(record.id.as_str()),
        record.usina.as_deref(),
        record.equipamento.as_deref(),
        record.alarme.as_deref(),
        record.cliente.as_deref(),
        record.tipo.as_deref(),
        record.status.as_deref(),
        record.note.as_deref(),
    ]
    .into_iter()
    .flatten()
}

fn newest_first(a: &OperationRecord, b: &OperationRecord) -> Ordering {
    match (a.occurred_on, b.occurred_on) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}
