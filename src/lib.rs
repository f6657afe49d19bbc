//! Boolean operations (*union*, *intersection*, *difference*) on triangle
//! soup brushes, clipping face pairs against each other and classifying
//! the fragments by ray parity against the opposing volume.
//!
//! The input and output type is [`Brush`]: a list of triangles with UVs,
//! per-face flags and an indexed material palette. Brushes are expected
//! to be closed and counter-clockwise wound when viewed from outside.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **earcut**: use `geo`s `earcutr` feature for triangulation
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **delaunay**: use `geo`s `spade` feature for triangulation, this
//!   conflicts with earcut
//! - **parallel**: use rayon for multithreading

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod brush;
pub mod errors;
pub mod float_types;
pub mod ops;
pub mod plane;

mod build_poly;
mod bvh;
mod geometry;
mod intersect;
mod merge;
mod reconstruct;

pub use brush::{Brush, Face};
pub use errors::CsgError;
pub use ops::{MergeOptions, Operation, merge_brushes, merge_brushes_with};

#[cfg(all(feature = "f64", feature = "f32"))]
compile_error!("Features 'f64' and 'f32' are mutually exclusive.");

#[cfg(all(feature = "delaunay", feature = "earcut"))]
compile_error!("Features 'delaunay' and 'earcut' are mutually exclusive.");

#[cfg(not(any(feature = "f64", feature = "f32")))]
compile_error!("Either feature 'f64' or 'f32' must be enabled.");

#[cfg(not(any(feature = "delaunay", feature = "earcut")))]
compile_error!("Either feature 'delaunay' or 'earcut' must be enabled.");
