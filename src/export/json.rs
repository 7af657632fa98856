use serde_json::{json, Map, Value};

use super::{Dataset, ExportData, ExportError};

/// `{ export_info: {...}, data: { <type>: [ {column: value, ...} ] } }`
pub fn to_value(data: &ExportData) -> Value {
    let include_types: Vec<&str> = data.datasets.iter().map(|d| d.kind.as_str()).collect();

    let mut sections = Map::new();
    for dataset in &data.datasets {
        sections.insert(dataset.kind.as_str().to_string(), records(dataset));
    }

    json!({
        "export_info": {
            "timestamp": data.timestamp.to_rfc3339(),
            "format": "json",
            "project": data.project_name().unwrap_or("all"),
            "include_types": include_types,
        },
        "data": sections,
    })
}

pub fn to_bytes(data: &ExportData) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(&to_value(data))?)
}

fn records(dataset: &Dataset) -> Value {
    let rows = dataset
        .rows
        .iter()
        .map(|row| {
            let record: Map<String, Value> = dataset
                .columns
                .iter()
                .zip(row)
                .map(|(column, cell)| (column.to_string(), cell.to_json()))
                .collect();
            Value::Object(record)
        })
        .collect();
    Value::Array(rows)
}
