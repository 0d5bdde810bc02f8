//! Line layers and their GeoJSON rendering.

use geo::LineString;
use serde::Serialize;
use serde_json::{json, Value};

/// Key column of the attribute table attached to delivered layers.
pub const KEY_COLUMN: &str = "cat";

/// Attribute table schema; rows are implied by the layer's line categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeTable {
    pub columns: Vec<String>,
}

impl AttributeTable {
    /// Table with only the key column.
    pub fn empty() -> Self {
        Self {
            columns: vec![KEY_COLUMN.to_string()],
        }
    }
}

/// Vector layer of line features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorLayer {
    lines: Vec<LineString<f64>>,
    table: Option<AttributeTable>,
}

impl VectorLayer {
    pub fn new(lines: Vec<LineString<f64>>) -> Self {
        Self { lines, table: None }
    }

    pub fn lines(&self) -> &[LineString<f64>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn push(&mut self, line: LineString<f64>) {
        self.lines.push(line);
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = LineString<f64>>) {
        self.lines.extend(lines);
    }

    pub fn into_lines(self) -> Vec<LineString<f64>> {
        self.lines
    }

    pub fn table(&self) -> Option<&AttributeTable> {
        self.table.as_ref()
    }

    pub fn attach_empty_table(&mut self) {
        self.table = Some(AttributeTable::empty());
    }

    /// Render the layer as a GeoJSON `FeatureCollection`.
    ///
    /// When a table is attached each feature carries its category in the key
    /// column; otherwise properties are empty.
    pub fn to_geojson(&self, name: &str) -> Value {
        let features: Vec<Value> = self
            .lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let coordinates: Vec<[f64; 2]> = line.coords().map(|c| [c.x, c.y]).collect();
                let properties = match self.table {
                    Some(_) => json!({ KEY_COLUMN: index + 1 }),
                    None => json!({}),
                };
                json!({
                    "type": "Feature",
                    "geometry": { "type": "LineString", "coordinates": coordinates },
                    "properties": properties,
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "name": name,
            "features": features,
        })
    }
}
