//! Level maps, the path provider seam, and path sampling.

use std::collections::{BTreeSet, HashMap};

use glam::DVec2;

use rampart_core::enums::CellKind;
use rampart_core::error::ConfigError;
use rampart_core::types::{GridCell, LevelRef};

/// Grid layout of a single level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelMap {
    pub columns: i32,
    pub rows: i32,
    /// Ordered from spawn to exit.
    pub path: Vec<GridCell>,
    pub blocked: BTreeSet<GridCell>,
    pub obstacles: BTreeSet<GridCell>,
}

impl LevelMap {
    pub fn in_bounds(&self, cell: GridCell) -> bool {
        (0..self.columns).contains(&cell.col) && (0..self.rows).contains(&cell.row)
    }

    /// Classify a cell, or `None` when it lies outside the grid.
    pub fn cell_kind(&self, cell: GridCell) -> Option<CellKind> {
        if !self.in_bounds(cell) {
            return None;
        }
        let kind = if self.path.contains(&cell) {
            CellKind::Path
        } else if self.blocked.contains(&cell) {
            CellKind::Blocked
        } else if self.obstacles.contains(&cell) {
            CellKind::Obstacle
        } else {
            CellKind::Open
        };
        Some(kind)
    }

    /// Turn an obstacle into an open cell. Returns false if it was not an obstacle.
    pub fn clear_obstacle(&mut self, cell: GridCell) -> bool {
        self.obstacles.remove(&cell)
    }

    /// Check the path against the grid.
    pub fn validate(&self, level: LevelRef) -> Result<(), ConfigError> {
        let (world, lvl) = (level.world, level.level);
        if self.path.len() < 2 {
            return Err(ConfigError::PathTooShort {
                world,
                level: lvl,
                len: self.path.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for (index, &cell) in self.path.iter().enumerate() {
            if !self.in_bounds(cell) {
                return Err(ConfigError::PathOutOfBounds {
                    world,
                    level: lvl,
                    cell,
                });
            }
            if !seen.insert(cell) {
                return Err(ConfigError::PathRepeats {
                    world,
                    level: lvl,
                    cell,
                });
            }
            if index > 0 && !self.path[index - 1].is_adjacent(cell) {
                return Err(ConfigError::PathDisjoint {
                    world,
                    level: lvl,
                    cell,
                });
            }
            if self.blocked.contains(&cell) || self.obstacles.contains(&cell) {
                return Err(ConfigError::PathObstructed {
                    world,
                    level: lvl,
                    cell,
                });
            }
        }
        Ok(())
    }

    /// A back-and-forth path across every other row, with two obstacles on
    /// the top row.
    pub fn serpentine(columns: i32, rows: i32) -> Self {
        let mut path = Vec::new();
        let mut band = 0;
        let mut row = 1;
        while row < rows - 1 {
            let cols: Vec<i32> = if band % 2 == 0 {
                (0..columns).collect()
            } else {
                (0..columns).rev().collect()
            };
            if band > 0 {
                // Connector from the previous band's end column.
                path.push(GridCell::new(cols[0], row - 1));
            }
            path.extend(cols.into_iter().map(|col| GridCell::new(col, row)));
            band += 1;
            row += 2;
        }

        let obstacles = [GridCell::new(2, 0), GridCell::new(columns - 3, 0)]
            .into_iter()
            .filter(|cell| (0..columns).contains(&cell.col) && rows > 0)
            .collect();

        Self {
            columns,
            rows,
            path,
            blocked: BTreeSet::new(),
            obstacles,
        }
    }
}

/// Source of level maps. Read-only to the simulation.
pub trait PathProvider: Send {
    fn level_map(&self, level: LevelRef) -> Option<LevelMap>;
}

/// Maps registered per global level, with an optional fallback for the rest.
#[derive(Debug, Clone, Default)]
pub struct StaticMaps {
    maps: HashMap<u32, LevelMap>,
    fallback: Option<LevelMap>,
}

impl StaticMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every level uses the same 12x8 serpentine layout.
    pub fn serpentine() -> Self {
        Self::with_fallback(LevelMap::serpentine(12, 8))
    }

    pub fn with_fallback(map: LevelMap) -> Self {
        Self {
            maps: HashMap::new(),
            fallback: Some(map),
        }
    }

    pub fn insert(&mut self, global_level: u32, map: LevelMap) {
        self.maps.insert(global_level, map);
    }
}

impl PathProvider for StaticMaps {
    fn level_map(&self, level: LevelRef) -> Option<LevelMap> {
        self.maps
            .get(&level.global)
            .or(self.fallback.as_ref())
            .cloned()
    }
}

/// Arc-length parameterization of a path through cell centers.
#[derive(Debug, Clone)]
pub struct PathTrack {
    points: Vec<DVec2>,
    /// Distance from the first point to each point.
    cumulative: Vec<f64>,
    length: f64,
}

impl PathTrack {
    pub fn new(path: &[GridCell]) -> Self {
        let points: Vec<DVec2> = path.iter().map(|c| c.center()).collect();
        let mut cumulative = Vec::with_capacity(points.len());
        let mut length = 0.0;
        for (index, point) in points.iter().enumerate() {
            if index > 0 {
                length += point.distance(points[index - 1]);
            }
            cumulative.push(length);
        }
        Self {
            points,
            cumulative,
            length,
        }
    }

    /// Total path length in world units. Movement divides by this.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Position at normalized progress `t` (clamped to 0.0 - 1.0).
    pub fn sample(&self, t: f64) -> DVec2 {
        let Some(&first) = self.points.first() else {
            return DVec2::ZERO;
        };
        if self.length <= 0.0 {
            return first;
        }
        let target = t.clamp(0.0, 1.0) * self.length;
        let segment = self.cumulative.partition_point(|&d| d < target);
        if segment == 0 {
            return first;
        }
        if segment >= self.points.len() {
            return self.points[self.points.len() - 1];
        }
        let start = self.cumulative[segment - 1];
        let span = self.cumulative[segment] - start;
        let along = if span > 0.0 { (target - start) / span } else { 0.0 };
        self.points[segment - 1].lerp(self.points[segment], along)
    }
}
