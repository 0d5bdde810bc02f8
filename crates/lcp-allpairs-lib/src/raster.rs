//! Regular raster grids and ESRI ASCII grid input.
//!
//! Rows run north to south and columns west to east. Cell values are stored
//! row-major. Floating-point rasters use NaN for no-data cells.

use std::fs;
use std::path::Path;

use geo::Coord;

use crate::error::{Error, Result};

/// Row/column address of a raster cell.
pub type Cell = (usize, usize);

/// Georeferenced extent and resolution shared by every raster of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub rows: usize,
    pub cols: usize,
    pub west: f64,
    pub north: f64,
    pub ew_res: f64,
    pub ns_res: f64,
}

impl Region {
    /// Square-celled region anchored at its north-west corner.
    pub fn new(rows: usize, cols: usize, west: f64, north: f64, cell_size: f64) -> Self {
        Self {
            rows,
            cols,
            west,
            north,
            ew_res: cell_size,
            ns_res: cell_size,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn south(&self) -> f64 {
        self.north - self.rows as f64 * self.ns_res
    }

    pub fn east(&self) -> f64 {
        self.west + self.cols as f64 * self.ew_res
    }

    /// Resolve the cell containing a map coordinate.
    pub fn cell_of(&self, coord: Coord<f64>) -> Result<Cell> {
        let col = ((coord.x - self.west) / self.ew_res).floor();
        let row = ((self.north - coord.y) / self.ns_res).floor();
        if !col.is_finite()
            || !row.is_finite()
            || col < 0.0
            || row < 0.0
            || col >= self.cols as f64
            || row >= self.rows as f64
        {
            return Err(Error::CoordinateOutsideRegion {
                x: coord.x,
                y: coord.y,
            });
        }
        Ok((row as usize, col as usize))
    }

    /// Map coordinate of a cell centre.
    pub fn center_of(&self, (row, col): Cell) -> Coord<f64> {
        Coord {
            x: self.west + (col as f64 + 0.5) * self.ew_res,
            y: self.north - (row as f64 + 0.5) * self.ns_res,
        }
    }

    /// Offset a cell by a signed row/column step, staying inside the region.
    pub fn offset(&self, (row, col): Cell, d_row: isize, d_col: isize) -> Option<Cell> {
        let row = row.checked_add_signed(d_row)?;
        let col = col.checked_add_signed(d_col)?;
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    pub fn index(&self, (row, col): Cell) -> usize {
        row * self.cols + col
    }
}

/// Row-major raster of values over a [`Region`].
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    region: Region,
    data: Vec<T>,
}

impl<T> Raster<T> {
    pub fn from_vec(region: Region, data: Vec<T>) -> Result<Self> {
        if data.len() != region.cell_count() {
            return Err(Error::Engine(format!(
                "raster holds {} values but region has {} cells",
                data.len(),
                region.cell_count()
            )));
        }
        Ok(Self { region, data })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn get(&self, cell: Cell) -> &T {
        &self.data[self.region.index(cell)]
    }

    pub fn set(&mut self, cell: Cell, value: T) {
        let index = self.region.index(cell);
        self.data[index] = value;
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }
}

impl<T: Clone> Raster<T> {
    pub fn filled(region: Region, value: T) -> Self {
        Self {
            data: vec![value; region.cell_count()],
            region,
        }
    }
}

impl Raster<f64> {
    /// Value at a cell, or `None` for no-data.
    pub fn value(&self, cell: Cell) -> Option<f64> {
        let value = *self.get(cell);
        (!value.is_nan()).then_some(value)
    }
}

/// Read an ESRI ASCII grid (`.asc`) into a floating-point raster.
pub fn read_ascii_grid(path: &Path) -> Result<Raster<f64>> {
    let text = fs::read_to_string(path)?;
    parse_ascii_grid(&text).map_err(|message| Error::InvalidRaster {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse ESRI ASCII grid text.
///
/// Header keys are case-insensitive. Both `xllcorner`/`yllcorner` and
/// `xllcenter`/`yllcenter` anchors are accepted; `NODATA_value` is optional.
pub fn parse_ascii_grid(text: &str) -> std::result::Result<Raster<f64>, String> {
    let mut tokens = text.split_whitespace().peekable();
    let mut ncols = None;
    let mut nrows = None;
    let mut x_anchor = None;
    let mut y_anchor = None;
    let mut centered = false;
    let mut cell_size = None;
    let mut nodata = None;

    while let Some(token) = tokens.peek() {
        if token.parse::<f64>().is_ok() {
            break;
        }
        let key = token.to_ascii_lowercase();
        tokens.next();
        let raw = tokens
            .next()
            .ok_or_else(|| format!("header key {key} has no value"))?;
        let value: f64 = raw
            .parse()
            .map_err(|_| format!("header key {key} has non-numeric value {raw}"))?;
        match key.as_str() {
            "ncols" => ncols = Some(value),
            "nrows" => nrows = Some(value),
            "xllcorner" => x_anchor = Some(value),
            "yllcorner" => y_anchor = Some(value),
            "xllcenter" => {
                x_anchor = Some(value);
                centered = true;
            }
            "yllcenter" => {
                y_anchor = Some(value);
                centered = true;
            }
            "cellsize" => cell_size = Some(value),
            "nodata_value" => nodata = Some(value),
            other => return Err(format!("unknown header key {other}")),
        }
    }

    let cols = positive_count(ncols, "ncols")?;
    let rows = positive_count(nrows, "nrows")?;
    let cell_size = cell_size.ok_or("missing cellsize")?;
    if !(cell_size > 0.0) {
        return Err(format!("cellsize must be positive, got {cell_size}"));
    }
    let mut west = x_anchor.ok_or("missing xllcorner")?;
    let mut south = y_anchor.ok_or("missing yllcorner")?;
    if centered {
        west -= cell_size / 2.0;
        south -= cell_size / 2.0;
    }
    let north = south + rows as f64 * cell_size;
    let region = Region::new(rows, cols, west, north, cell_size);

    let mut data = Vec::with_capacity(region.cell_count());
    for raw in tokens {
        let value: f64 = raw
            .parse()
            .map_err(|_| format!("non-numeric cell value {raw}"))?;
        let is_nodata = nodata.is_some_and(|nd: f64| (value - nd).abs() < f64::EPSILON);
        data.push(if is_nodata { f64::NAN } else { value });
    }
    if data.len() != region.cell_count() {
        return Err(format!(
            "expected {} cell values, found {}",
            region.cell_count(),
            data.len()
        ));
    }

    Ok(Raster { region, data })
}

fn positive_count(value: Option<f64>, key: &str) -> std::result::Result<usize, String> {
    let value = value.ok_or_else(|| format!("missing {key}"))?;
    if value < 1.0 || value.fract() != 0.0 {
        return Err(format!("{key} must be a positive integer, got {value}"));
    }
    Ok(value as usize)
}
