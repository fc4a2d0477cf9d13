//! Boundary parsing for exported acionamentos and Sismetro service requests.
//!
//! Exports disagree on field names and value types (`cliente` vs `Cliente`,
//! numeric ids, several date layouts). Rows are normalized here, once, into
//! [`OperationRecord`] so nothing downstream needs fallback chains.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{OpsError, Result};
use crate::models::OperationRecord;

type Row = Map<String, Value>;

// Spellings seen in the exports, in lookup order. The first non-blank value wins.
const ID_KEYS: &[&str] = &["id", "Id", "ID", "codigo", "numero", "ss"];
const USINA_KEYS: &[&str] = &["usina", "Usina", "planta", "plant", "nome_usina"];
const EQUIPAMENTO_KEYS: &[&str] = &["equipamento", "Equipamento", "equipment", "equip"];
const ALARME_KEYS: &[&str] = &["alarme", "Alarme", "alarm", "codigo_alarme"];
const CLIENTE_KEYS: &[&str] = &["cliente", "Cliente", "client", "nome_cliente"];
const TIPO_KEYS: &[&str] = &["tipo", "Tipo", "type", "tipo_ss", "tipo_servico"];
const STATUS_KEYS: &[&str] = &["status", "Status", "situacao"];
const DATA_KEYS: &[&str] = &[
    "data",
    "Data",
    "date",
    "data_acionamento",
    "aberta_em",
    "created_at",
    "occurred_at",
];
const NOTA_KEYS: &[&str] = &["nota", "observacao", "descricao", "Descricao", "note"];

/// Strings, numbers and booleans read as text; anything else is absent.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn pick(row: &Row, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find_map(scalar_text)
}

/// Reads the dates the exports actually contain: ISO days, Brazilian
/// `DD/MM/YYYY`, RFC 3339 timestamps and naive timestamps.
pub fn parse_loose_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Some(stamp.date_naive());
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(value, layout) {
            return Some(stamp.date());
        }
    }
    None
}

fn into_record(row: &Row, index: usize) -> OperationRecord {
    let occurred_on = pick(row, DATA_KEYS).and_then(|text| {
        let parsed = parse_loose_date(&text);
        if parsed.is_none() {
            warn!(row = index, value = %text, "ignoring unparseable date");
        }
        parsed
    });

    OperationRecord {
        id: pick(row, ID_KEYS).unwrap_or_else(|| format!("row-{index}")),
        usina: pick(row, USINA_KEYS),
        equipamento: pick(row, EQUIPAMENTO_KEYS),
        alarme: pick(row, ALARME_KEYS),
        cliente: pick(row, CLIENTE_KEYS),
        tipo: pick(row, TIPO_KEYS),
        status: pick(row, STATUS_KEYS),
        occurred_on,
        note: pick(row, NOTA_KEYS),
    }
}

pub fn load_records(path: &Path) -> Result<Vec<OperationRecord>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let records = match extension.as_deref() {
        Some("csv") => read_csv(File::open(path)?)?,
        Some("json") => read_json(File::open(path)?)?,
        _ => return Err(OpsError::UnsupportedInput(path.to_path_buf())),
    };

    debug!(path = %path.display(), rows = records.len(), "loaded records");
    Ok(records)
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<OperationRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let fields = result?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(fields.iter()) {
            // A repeated header keeps its first non-blank cell.
            if row.get(header).and_then(scalar_text).is_none() {
                row.insert(header.to_string(), Value::String(field.to_string()));
            }
        }
        records.push(into_record(&row, idx + 1));
    }

    Ok(records)
}

/// Accepts a bare array of rows or the API envelope `{ "data": [...] }`.
/// Any other shape, such as an error envelope, is rejected.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<OperationRecord>> {
    let payload: Value = serde_json::from_reader(reader)?;
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => {
                let keys: Vec<&str> = envelope.keys().map(String::as_str).collect();
                return Err(OpsError::UnexpectedPayload(format!(
                    "object without a data array (keys: {})",
                    keys.join(", ")
                )));
            }
        },
        other => {
            return Err(OpsError::UnexpectedPayload(format!(
                "expected an array of rows, got {}",
                json_kind(&other)
            )))
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| match row {
            Value::Object(row) => Ok(into_record(&row, idx + 1)),
            other => Err(OpsError::UnexpectedPayload(format!(
                "row {} is {}, expected an object",
                idx + 1,
                json_kind(&other)
            ))),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
