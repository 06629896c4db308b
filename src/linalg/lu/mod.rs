//! LU decomposition with partial pivoting.
//!
//! The factorization of a square matrix $A$ is $PA = LU$, with $L$
//! unit-lower-triangular, $U$ upper-triangular, and $P$ the row permutation
//! chosen so that every pivot is the largest entry of its column. Both factors
//! are stored in place in the decomposed buffer: $L$ strictly below the
//! diagonal (its unit diagonal is implied), $U$ on and above it.
//!
//! A singular input is not an error: the factorization runs to completion and
//! leaves a zero pivot on the diagonal of $U$, which [`determinant`] then
//! reports as an exactly zero determinant.

use crate::internal_prelude::*;

pub mod factor;
pub mod reconstruct;
pub mod solve;

/// computes the determinant of the factored matrix from its packed factors
/// and its permutation.
///
/// # panics
///
/// panics if `lu` is not square or the permutation length does not match.
#[track_caller]
pub fn determinant<T: ComplexField>(lu: MatRef<'_, T>, perm: &Perm) -> T {
	assert!(all(lu.nrows() == lu.ncols(), perm.len() == lu.nrows()));
	let mut det = from_f64::<T>(perm.parity() as f64);
	for i in 0..lu.nrows() {
		det = det * lu.read(i, i);
	}
	det
}
