#![forbid(unsafe_code)]

//! Shared primitives for the Kestrel UI toolkit.
//!
//! This crate holds the geometry types every other Kestrel crate speaks:
//!
//! - [`Size`] - a width/height pair, where `+∞` means "unconstrained"
//! - [`Rect`] - an absolute rectangle in device-independent pixels
//! - [`Point`] - a position
//! - [`Sides`] - four-sided thickness for margins and padding
//!
//! Coordinates are `f32` device-independent pixels with the origin at the
//! top-left. Layout treats `f32::INFINITY` as a valid "no constraint"
//! width or height; `NaN` and negative extents are programmer errors that
//! the sanitization helpers clamp to zero so one malformed value cannot
//! poison a whole layout pass.

pub mod geometry;

pub use geometry::{Point, Rect, Sides, Size, sanitize_coord, sanitize_extent};
