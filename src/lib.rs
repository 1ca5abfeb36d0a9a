//! # flowplan
//!
//! A command-line tool and library for planning factory production chains.
//!
//! Given a game's recipe catalog, caps on raw resources, and the items you
//! want out, this crate builds a linear program that keeps every item in
//! balance and picks the recipe mix with the lowest weighted cost:
//!
//! - Power drawn by machines and extraction
//! - Items moved through the chain
//! - Buildings, optionally scaled by recipe complexity
//! - Raw resources, optionally scaled by scarcity
//!
//! It can also maximize a single item or the sink-point total instead, and
//! rank alternative recipes against each other by re-solving with each
//! competitor switched off.
//!
//! ## Modules
//!
//! - [`models`] - Dataset types: items, recipes, machines, generators
//! - [`data`] - JSON loading of datasets and settings
//! - [`settings`] - Per-request settings, objective weights, balance profile
//! - [`network`] - Item classification and recipe flow indexing
//! - [`lp`] - Solver-independent linear program representation
//! - [`compiler`] - Turns a dataset and settings into a model
//! - [`solver`] - Solver trait and the built-in backend
//! - [`decoder`] - Turns a solved model into a report
//! - [`optimizer`] - The compile, solve, decode pipeline
//! - [`ranking`] - Recipe alternative ranking and CSV export
//! - [`display`] - Output formatting and display utilities
//!
//! ## Example Usage
//!
//! ```no_run
//! use flowplan::{
//!     data::{load_dataset, load_settings},
//!     display::display_report,
//!     optimizer::optimize_production,
//!     solver::MinilpSolver,
//! };
//! use std::path::Path;
//!
//! let dataset = load_dataset(Path::new("data.json")).unwrap();
//! let settings = load_settings(Path::new("saved.json")).unwrap();
//!
//! let report = optimize_production(&dataset, &settings, &MinilpSolver).unwrap();
//! display_report(&report);
//! ```
//!
//! ## Objective Modes
//!
//! The objective is chosen by [`settings::MaxItem`]:
//!
//! 1. **Weighted cost** (default): minimizes the weighted sum of the cost
//!    aggregates while meeting every fixed output.
//!
//! 2. **Maximize item**: spends the resource caps on as much of one item
//!    as possible.
//!
//! 3. **Maximize points**: spends them on the highest sink-point total,
//!    without farming event and creature items.

pub mod compiler;
pub mod data;
pub mod decoder;
pub mod display;
pub mod error;
pub mod lp;
pub mod models;
pub mod network;
pub mod optimizer;
pub mod ranking;
pub mod settings;
pub mod solver;
pub mod wasm;

pub use error::{Error, Result};
