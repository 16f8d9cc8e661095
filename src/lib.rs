#![warn(rust_2018_idioms)]

//! Build a subset of an emoji font whose glyphs are reachable through Private Use Area
//! codepoints, for renderers that only understand BMP `cmap` subtables.
//!
//! [`build::build_font`] runs the whole process. The remaining modules are the pieces it
//! is built from: TrueType reading and writing, subsetting, and PUA assignment.

/// Reading and writing of binary data.
pub mod binary;
pub mod build;
/// Checksum calculation routines.
pub mod checksum;
pub mod codepoints;
pub mod config;
pub mod emit;
pub mod error;
pub mod font;
pub mod post;
pub mod pua;
/// Font subsetting.
pub mod subset;
pub mod tables;
pub mod tag;
pub mod verify;

/// Shared test code.
#[cfg(test)]
pub mod tests;
