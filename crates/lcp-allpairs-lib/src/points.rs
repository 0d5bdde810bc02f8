//! Point-of-interest loading.
//!
//! Points are read from delimited text with one `x,y` pair per record. Extra
//! columns (such as a category) are ignored, `#` starts a comment line and a
//! non-numeric first record is treated as a header.

use std::io::Read;
use std::path::Path;

use geo::Coord;
use serde::Serialize;

use crate::error::{Error, Result};

/// 1-based position of a point in the input ordering.
pub type PointId = usize;

/// Input location acting as both source and stop during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub id: PointId,
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// Ordered, immutable collection of input points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<Point>,
}

impl PointSet {
    /// Build a point set from coordinates, numbering them 1..N in order.
    pub fn from_coords(coords: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let points = coords
            .into_iter()
            .enumerate()
            .map(|(index, (x, y))| Point { id: index + 1, x, y })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// All coordinates in input order; used as the stop list of every iteration.
    pub fn coords(&self) -> Vec<Coord<f64>> {
        self.points.iter().map(Point::coord).collect()
    }
}

/// Load points from a delimited text file.
pub fn load_points(path: &Path) -> Result<PointSet> {
    let file = std::fs::File::open(path)?;
    read_points(file)
}

/// Read points from any delimited text source.
pub fn read_points<R: Read>(source: R) -> Result<PointSet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut coords = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let record_no = index + 1;
        match parse_record(&record) {
            Ok(pair) => coords.push(pair),
            Err(_) if record_no == 1 => {
                tracing::debug!("treating first point record as header");
            }
            Err(message) => {
                return Err(Error::InvalidPoints {
                    record: record_no,
                    message,
                })
            }
        }
    }

    Ok(PointSet::from_coords(coords))
}

fn parse_record(record: &csv::StringRecord) -> std::result::Result<(f64, f64), String> {
    if record.len() < 2 {
        return Err(format!("expected at least 2 fields, found {}", record.len()));
    }
    let x = parse_coordinate(&record[0])?;
    let y = parse_coordinate(&record[1])?;
    Ok((x, y))
}

fn parse_coordinate(raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("non-numeric coordinate {raw}"))?;
    if !value.is_finite() {
        return Err(format!("coordinate {raw} is not finite"));
    }
    Ok(value)
}
