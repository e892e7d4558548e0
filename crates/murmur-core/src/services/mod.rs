//! Shared service layer used by front ends.

mod board;

pub use board::{Board, Receipt, RecordEdit, Submission};
