use geo::{Coord, LineString};

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::vector::VectorLayer;

use super::{Drainage, PathTracer, NEIGHBOURS};

/// Traces each stop back to the source along the direction field, one vertex
/// per cell centre.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDrain;

impl PathTracer for NativeDrain {
    fn trace(
        &self,
        cumulative: &Raster<f64>,
        direction: &Raster<u8>,
        stops: &[Coord<f64>],
    ) -> Result<Drainage> {
        let region = *direction.region();
        if cumulative.region() != &region {
            return Err(Error::RegionMismatch {
                name: "cumulative cost".to_string(),
            });
        }

        let mut visited = Raster::filled(region, 0u8);
        let mut lines = VectorLayer::default();

        for stop in stops {
            let Ok(start) = region.cell_of(*stop) else {
                tracing::warn!(x = stop.x, y = stop.y, "stop point outside the region; no path traced");
                continue;
            };
            if cumulative.value(start).is_none() {
                tracing::warn!(x = stop.x, y = stop.y, "stop point was not reached; no path traced");
                lines.push(LineString::new(vec![region.center_of(start)]));
                continue;
            }

            let mut vertices = Vec::new();
            let mut cell = start;
            loop {
                vertices.push(region.center_of(cell));
                visited.set(cell, 1);
                let code = *direction.get(cell);
                if code == 0 {
                    break;
                }
                if vertices.len() > region.cell_count() {
                    return Err(Error::Engine(format!(
                        "direction field loops while tracing from ({}, {})",
                        stop.x, stop.y
                    )));
                }
                let (d_row, d_col) = NEIGHBOURS
                    .get(code as usize - 1)
                    .copied()
                    .ok_or_else(|| Error::Engine(format!("invalid direction code {code}")))?;
                cell = region.offset(cell, d_row, d_col).ok_or_else(|| {
                    Error::Engine("direction field points outside the region".to_string())
                })?;
            }
            lines.push(LineString::new(vertices));
        }

        Ok(Drainage {
            lines,
            raster: visited,
        })
    }
}
