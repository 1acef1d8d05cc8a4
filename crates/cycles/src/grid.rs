use crate::{CycleDetector, CycleOutcome, CycleScenario};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use whisker_dispatch::Dispatch;
use whisker_types::WhiskerTree;

/// Rewma values are rounded to this many decimal places so grid labels stay
/// clean after repeated multiplication.
const REWMA_DECIMALS: i32 = 9;

/// The grid of initial conditions to analyse.
///
/// Covers `rewma` in `[0, rewma_max)` by `rewma_step` and initial buffers in
/// `[0, buffer_max)`, processed in tiles of `rewma_chunk` by `buffer_chunk`
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub rewma_step: f64,
    pub rewma_max: f64,
    /// Rewma values per tile.
    pub rewma_chunk: usize,
    pub buffer_max: u32,
    /// Buffer values per tile.
    pub buffer_chunk: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rewma_step: 0.1,
            rewma_max: 2.0,
            rewma_chunk: 2,
            buffer_max: 20,
            buffer_chunk: 4,
        }
    }
}

impl GridConfig {
    pub fn with_rewma(mut self, step: f64, max: f64) -> Self {
        self.rewma_step = step;
        self.rewma_max = max;
        self
    }

    pub fn with_buffer_max(mut self, buffer_max: u32) -> Self {
        self.buffer_max = buffer_max;
        self
    }

    pub fn with_chunk(mut self, rewma_chunk: usize, buffer_chunk: u32) -> Self {
        self.rewma_chunk = rewma_chunk;
        self.buffer_chunk = buffer_chunk;
        self
    }

    fn rewma_values(&self) -> Vec<f64> {
        if !(self.rewma_step > 0.0) || !self.rewma_max.is_finite() {
            return Vec::new();
        }
        let scale = 10f64.powi(REWMA_DECIMALS);
        (0u32..)
            .map(|i| (f64::from(i) * self.rewma_step * scale).round() / scale)
            .take_while(|rewma| *rewma < self.rewma_max)
            .collect()
    }

    /// Every grid point, tile by tile.
    ///
    /// Tiles are ordered by rewma then buffer; so are points within a tile.
    pub fn chunks(&self) -> Vec<Vec<GridPoint>> {
        let rewmas = self.rewma_values();
        let rewma_chunk = self.rewma_chunk.max(1);
        let buffer_chunk = self.buffer_chunk.max(1);

        let mut chunks = Vec::new();
        for rewma_tile in rewmas.chunks(rewma_chunk) {
            let mut buffer_start = 0;
            while buffer_start < self.buffer_max {
                let buffer_end = buffer_start.saturating_add(buffer_chunk).min(self.buffer_max);
                let tile = rewma_tile
                    .iter()
                    .flat_map(|&rewma| {
                        (buffer_start..buffer_end).map(move |buffer| GridPoint { rewma, buffer })
                    })
                    .collect();
                chunks.push(tile);
                buffer_start = buffer_end;
            }
        }
        chunks
    }
}

/// One initial condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub rewma: f64,
    pub buffer: u32,
}

/// The detector's verdict for one grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridResult {
    pub point: GridPoint,
    pub outcome: CycleOutcome,
}

impl fmt::Display for GridResult {
    /// `<rewma> <buffer> <start> <period>`, with `-1 -1` for no cycle.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, period) = self.outcome.as_pair();
        write!(
            f,
            "{} {} {} {}",
            self.point.rewma, self.point.buffer, start, period
        )
    }
}

/// Run cycle detection over every point of `grid`.
///
/// Each tile is handed to `dispatch` as one batch and fully completed before
/// the next starts; `on_chunk` sees each tile's results as soon as it
/// finishes, in submission order. All points share `whiskers` read-only.
pub fn run_grid<D: Dispatch>(
    whiskers: Arc<WhiskerTree>,
    scenario: &CycleScenario,
    detector: &CycleDetector,
    grid: &GridConfig,
    dispatch: &D,
    mut on_chunk: impl FnMut(&[GridResult]),
) -> Vec<GridResult> {
    let chunks = grid.chunks();
    info!(
        chunks = chunks.len(),
        points = chunks.iter().map(Vec::len).sum::<usize>(),
        parallelism = dispatch.parallelism(),
        "Starting cycle grid"
    );

    let mut results = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let tile: Vec<GridResult> = dispatch.map(chunk, |point| GridResult {
            point: *point,
            outcome: detector.detect(|| scenario.build(&whiskers, point.rewma, point.buffer)),
        });
        debug!(
            chunk = index,
            found = tile.iter().filter(|r| r.outcome.is_found()).count(),
            "Chunk complete"
        );
        on_chunk(&tile);
        results.extend(tile);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_covers_rectangle() {
        let chunks = GridConfig::default().chunks();
        assert_eq!(chunks.len(), 10 * 5);
        assert!(chunks.iter().all(|c| c.len() == 8));

        let points: Vec<GridPoint> = chunks.into_iter().flatten().collect();
        assert_eq!(points.len(), 400);
        assert_eq!(points[0], GridPoint { rewma: 0.0, buffer: 0 });
        assert_eq!(points[1], GridPoint { rewma: 0.0, buffer: 1 });
        assert_eq!(points[4], GridPoint { rewma: 0.1, buffer: 0 });

        let last = points[points.len() - 1];
        assert_eq!(last, GridPoint { rewma: 1.9, buffer: 19 });
        assert!(points.iter().any(|p| p.rewma == 0.3));
    }

    #[test]
    fn test_ragged_tiles() {
        let grid = GridConfig::default()
            .with_rewma(0.5, 1.2)
            .with_buffer_max(5)
            .with_chunk(2, 3);
        let chunks = grid.chunks();
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        // rewma {0, 0.5} then {1.0}; buffers {0,1,2} then {3,4}
        assert_eq!(sizes, vec![6, 4, 3, 2]);
    }

    #[test]
    fn test_empty_grid() {
        assert!(GridConfig::default().with_buffer_max(0).chunks().is_empty());
        assert!(GridConfig::default().with_rewma(0.0, 2.0).chunks().is_empty());
    }

    #[test]
    fn test_result_line_format() {
        let found = GridResult {
            point: GridPoint { rewma: 0.3, buffer: 4 },
            outcome: CycleOutcome::Found {
                start: 1234.5,
                period: 51.0,
            },
        };
        assert_eq!(found.to_string(), "0.3 4 1234.5 51");

        let missing = GridResult {
            point: GridPoint { rewma: 0.0, buffer: 0 },
            outcome: CycleOutcome::NotFound,
        };
        assert_eq!(missing.to_string(), "0 0 -1 -1");
    }
}
