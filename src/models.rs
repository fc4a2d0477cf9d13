use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One row from the acionamentos or Sismetro export, after boundary parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationRecord {
    pub id: String,
    pub usina: Option<String>,
    pub equipamento: Option<String>,
    pub alarme: Option<String>,
    pub cliente: Option<String>,
    pub tipo: Option<String>,
    pub status: Option<String>,
    pub occurred_on: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Field a record can be grouped or segmented by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dimension {
    Usina,
    Equipamento,
    Alarme,
    Cliente,
    Tipo,
}

impl Dimension {
    pub fn value<'a>(&self, record: &'a OperationRecord) -> &'a str {
        let field = match self {
            Dimension::Usina => &record.usina,
            Dimension::Equipamento => &record.equipamento,
            Dimension::Alarme => &record.alarme,
            Dimension::Cliente => &record.cliente,
            Dimension::Tipo => &record.tipo,
        };
        field.as_deref().unwrap_or("")
    }

    pub fn title(&self) -> &'static str {
        match self {
            Dimension::Usina => "plant",
            Dimension::Equipamento => "equipment",
            Dimension::Alarme => "alarm",
            Dimension::Cliente => "client",
            Dimension::Tipo => "type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBucket {
    pub label: String,
    pub total: usize,
    pub by_segment: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentTotal {
    pub label: String,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackedSummary {
    pub groups: Vec<GroupBucket>,
    pub segments: Vec<SegmentTotal>,
}

impl StackedSummary {
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|group| group.total).sum()
    }
}

/// Inclusive calendar range. Serialized as ISO `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedEntry {
    pub id: Uuid,
    pub source_key: String,
    pub usina: String,
    pub day: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan {
    pub range: DateRange,
    pub total: Decimal,
    pub entries: Vec<PlannedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}
