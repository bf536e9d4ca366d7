//! Types shared between the minesweeper engine and its front ends.

pub mod models;
pub mod protocol;
