use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::config::{CostModel, WalkingCoefficients};
use crate::error::{Error, Result};
use crate::raster::{Cell, Raster, Region};

use super::{CostFieldEngine, CostRequest, CostSurface};

/// Row/column steps between neighbouring cells.
///
/// The first eight are the queen's moves, the last eight the knight's moves
/// used for accurate propagation. Entries `2m` and `2m + 1` are opposites.
pub const NEIGHBOURS: [(isize, isize); 16] = [
    (-1, 0),
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, 1),
    (1, -1),
    (-1, -1),
    (1, 1),
    (-2, 1),
    (2, -1),
    (-2, -1),
    (2, 1),
    (-1, 2),
    (1, -2),
    (-1, -2),
    (1, 2),
];

/// Dijkstra accumulation over the friction raster, in plain-cost or
/// walking-energy mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCostField;

impl CostFieldEngine for NativeCostField {
    fn accumulate(&self, request: &CostRequest<'_>) -> Result<CostSurface> {
        let friction = request.friction;
        let region = *friction.region();
        let elevation = match request.model {
            CostModel::Walking(_) => {
                let elevation = request.elevation.ok_or_else(|| {
                    Error::Engine("walking model requires an elevation raster".to_string())
                })?;
                if elevation.region() != &region {
                    return Err(Error::RegionMismatch {
                        name: "elevation".to_string(),
                    });
                }
                Some(elevation)
            }
            CostModel::Isotropic => None,
        };

        let source = region.cell_of(request.source)?;
        if friction.value(source).is_none() {
            return Err(Error::SourceOnNoData {
                x: request.source.x,
                y: request.source.y,
            });
        }
        let mut remaining: HashSet<usize> = request
            .stops
            .iter()
            .filter_map(|stop| match region.cell_of(*stop) {
                Ok(cell) => Some(region.index(cell)),
                Err(_) => {
                    tracing::warn!(x = stop.x, y = stop.y, "stop point outside the region; ignored");
                    None
                }
            })
            .collect();

        let cells = region.cell_count();
        let moves = if request.knight_moves { 16 } else { 8 };
        let mut best = vec![f64::INFINITY; cells];
        let mut settled = vec![false; cells];
        let mut cumulative = Raster::filled(region, f64::NAN);
        let mut direction = Raster::filled(region, 0u8);

        let budget_entries =
            request.memory_mb.saturating_mul(1024 * 1024) / std::mem::size_of::<QueueEntry>();
        let mut queue = BinaryHeap::with_capacity(cells.min(budget_entries));

        best[region.index(source)] = 0.0;
        queue.push(QueueEntry::new(region.index(source), 0.0));
        let mut settled_count = 0usize;

        while let Some(entry) = queue.pop() {
            let index = entry.index;
            if settled[index] || entry.cost.0 > best[index] {
                continue;
            }
            settled[index] = true;
            settled_count += 1;
            let cell = (index / region.cols, index % region.cols);
            let current_cost = entry.cost.0;
            cumulative.set(cell, current_cost);

            if remaining.remove(&index) && remaining.is_empty() {
                break;
            }

            for (k, &(d_row, d_col)) in NEIGHBOURS.iter().enumerate().take(moves) {
                let Some(next) = region.offset(cell, d_row, d_col) else {
                    continue;
                };
                let next_index = region.index(next);
                if settled[next_index] {
                    continue;
                }
                let Some(step) = step_cost(&region, request.model, friction, elevation, cell, next)
                else {
                    continue;
                };

                let next_cost = current_cost + step;
                if request.max_cost.is_some_and(|limit| next_cost > limit) {
                    continue;
                }
                if next_cost < best[next_index] {
                    best[next_index] = next_cost;
                    // Point back along the move just taken.
                    direction.set(next, (k ^ 1) as u8 + 1);
                    queue.push(QueueEntry::new(next_index, next_cost));
                }
            }
        }

        for (index, done) in settled.iter().enumerate() {
            if !done {
                direction.set((index / region.cols, index % region.cols), 0);
            }
        }

        if !remaining.is_empty() {
            tracing::debug!(
                unreached = remaining.len(),
                "some stop cells were not reached by cost accumulation"
            );
        }
        tracing::debug!(?source, settled = settled_count, "cost field accumulated");

        Ok(CostSurface {
            cumulative,
            direction,
        })
    }
}

/// Cost of moving from `from` to the neighbouring cell `to`, or `None` when the
/// move touches a no-data cell.
///
/// A knight's move also crosses the two cells between its ends; their
/// friction joins the average and either one being no-data blocks the move.
fn step_cost(
    region: &Region,
    model: CostModel,
    friction: &Raster<f64>,
    elevation: Option<&Raster<f64>>,
    from: Cell,
    to: Cell,
) -> Option<f64> {
    let d_row = to.0 as isize - from.0 as isize;
    let d_col = to.1 as isize - from.1 as isize;
    let mut friction_sum = friction.value(from)? + friction.value(to)?;
    let mut friction_cells = 2.0;
    if d_row.abs() + d_col.abs() == 3 {
        let crossed = if d_row.abs() == 2 {
            [(d_row / 2, 0), (d_row / 2, d_col)]
        } else {
            [(0, d_col / 2), (d_row, d_col / 2)]
        };
        for (c_row, c_col) in crossed {
            friction_sum += friction.value(region.offset(from, c_row, c_col)?)?;
        }
        friction_cells = 4.0;
    }

    let length = (d_col as f64 * region.ew_res).hypot(d_row as f64 * region.ns_res);
    let friction_cost = length * friction_sum / friction_cells;

    match model {
        CostModel::Isotropic => Some(friction_cost),
        CostModel::Walking(coefficients) => {
            let elevation = elevation?;
            let rise = elevation.value(to)? - elevation.value(from)?;
            let time = walking_time(&coefficients, length, rise);
            Some((time + coefficients.lambda * friction_cost).max(0.0))
        }
    }
}

/// Walking time over `length` map units with elevation change `rise`.
fn walking_time(coefficients: &WalkingCoefficients, length: f64, rise: f64) -> f64 {
    let vertical = if rise > 0.0 {
        coefficients.b * rise
    } else if rise / length >= coefficients.slope_factor {
        coefficients.c * rise
    } else {
        coefficients.d * rise
    };
    coefficients.a * length + vertical
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    index: usize,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(index: usize, cost: f64) -> Self {
        Self {
            index,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
