// patterns.rs - Preset starting patterns for the board

use crate::grid::Grid;

/// A named starting configuration, as `(row, col)` cells on a 50x50
/// board. Cells falling outside a smaller board are skipped.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Glider",
        cells: &[(5, 6), (6, 7), (7, 5), (7, 6), (7, 7)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(24, 23), (24, 24), (24, 25)],
    },
    Pattern {
        name: "Toad",
        cells: &[(23, 24), (23, 25), (23, 26), (24, 23), (24, 24), (24, 25)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(9, 9), (9, 10), (10, 9), (10, 10), (11, 11), (11, 12), (12, 11), (12, 12)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top section
            (19, 23), (19, 24), (19, 25), (19, 29), (19, 30), (19, 31),
            (21, 21), (21, 26), (21, 28), (21, 33),
            (22, 21), (22, 26), (22, 28), (22, 33),
            (23, 21), (23, 26), (23, 28), (23, 33),
            (24, 23), (24, 24), (24, 25), (24, 29), (24, 30), (24, 31),
            // Bottom section (mirrored)
            (26, 23), (26, 24), (26, 25), (26, 29), (26, 30), (26, 31),
            (27, 21), (27, 26), (27, 28), (27, 33),
            (28, 21), (28, 26), (28, 28), (28, 33),
            (29, 21), (29, 26), (29, 28), (29, 33),
            (31, 23), (31, 24), (31, 25), (31, 29), (31, 30), (31, 31),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(24, 24), (24, 25), (23, 25), (25, 24), (25, 23)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (4, 0), (4, 1), (5, 0), (5, 1),
            (4, 10), (5, 10), (6, 10), (3, 11), (7, 11), (2, 12), (8, 12),
            (2, 13), (8, 13), (5, 14), (3, 15), (7, 15), (4, 16), (5, 16),
            (6, 16), (5, 17), (2, 20), (3, 20), (4, 20), (2, 21), (3, 21),
            (4, 21), (1, 22), (5, 22), (0, 24), (1, 24), (5, 24), (6, 24),
            (2, 34), (3, 34), (2, 35), (3, 35),
        ],
    },
];

/// A fresh board of the same dimensions as `grid` holding only the
/// pattern's in-bounds cells.
pub fn apply_pattern(grid: &Grid, pattern: &Pattern) -> Grid {
    let mut next = Grid::empty(grid.rows(), grid.cols());
    for &(row, col) in pattern.cells {
        next.set(row, col, true);
    }
    next
}
