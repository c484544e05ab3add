//! Small standalone utilities that don't belong to any one subsystem.

pub mod parallel;

pub use parallel::parallel_for;
