//! Population Pyramid - demographic CSV dashboard
//!
//! Loads wide-format population tables (`{year}년_{sex}_{age group}` columns),
//! and renders an age/sex pyramid plus a yearly total-population trend.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod fonts;
pub mod gui;
pub mod logging;
