//! Rank-revealing QR decomposition with column pivoting.

pub mod factor;
