//! Linear algebra kernels and decomposition engines.

use crate::internal_prelude::*;

pub mod reductions;

pub mod matmul;

pub mod triangular_solve;

pub mod householder;

pub mod rank_update;

pub mod lu;

pub mod qr;

pub mod svd;

/// computes the workspace requirement of a temporary `nrows × ncols` matrix of
/// `T`.
#[inline]
pub fn temp_mat_scratch<T: ComplexField>(nrows: usize, ncols: usize) -> StackReq {
	StackReq::new::<T>(nrows.checked_mul(ncols).unwrap())
}
