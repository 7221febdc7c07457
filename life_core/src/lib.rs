// lib.rs - Game of Life simulation core

//! Finite-grid Game of Life simulation core.
//!
//! [`Grid`] is an immutable-snapshot board: toggling a cell, clearing,
//! randomizing and stepping all produce new values. [`Simulation`] owns
//! the current board and the run/pause clock, publishing every new
//! generation over a [`tokio::sync::watch`] channel so a presentation
//! layer can re-render on change without holding its own copy of the
//! truth.

pub mod error;
pub mod grid;
pub mod patterns;
pub mod sim;

// Re-export primary types for convenience.
pub use error::{GridError, GridResult};
pub use grid::Grid;
pub use patterns::{PATTERNS, Pattern, apply_pattern};
pub use sim::{SimConfig, Simulation};
