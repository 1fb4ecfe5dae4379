//! Core types and utilities

pub mod cell;
pub mod field;
pub mod wind;

pub use cell::{Cell, FireIntensity, FuelAge, OwnerId};
pub use field::Field;
pub use wind::{Wind, WindDirection};
