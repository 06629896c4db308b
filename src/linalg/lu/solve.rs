//! Solving linear systems from packed LU factors.

use crate::internal_prelude::*;

/// solves `A * x = rhs` in place, where `lu` and `perm` are the packed output
/// of [`lu_in_place`](super::factor::lu_in_place).
///
/// a singular factorization propagates infinities and NaNs through IEEE
/// semantics rather than failing; callers are expected to check
/// [`LuInfo::zero_pivot`](super::factor::LuInfo) or the conditioning
/// themselves.
///
/// # panics
///
/// panics eagerly if the dimensions do not match.
#[track_caller]
pub fn solve_in_place<T: ComplexField>(lu: MatRef<'_, T>, perm: &Perm, rhs: MatMut<'_, T>, par: Par) {
	assert!(all(lu.nrows() == lu.ncols(), rhs.nrows() == lu.ncols(), perm.len() == lu.nrows()));
	let mut rhs = rhs;

	// P A = L U, so x = U⁻¹ L⁻¹ P rhs
	perm.apply_to_rows(rhs.rb_mut());
	linalg::triangular_solve::solve_unit_lower_triangular_in_place(lu, rhs.rb_mut(), par);
	linalg::triangular_solve::solve_upper_triangular_in_place(lu, rhs, par);
}

/// solves `Aᵀ * x = rhs` in place, where `lu` and `perm` are the packed
/// output of [`lu_in_place`](super::factor::lu_in_place).
///
/// # panics
///
/// panics eagerly if the dimensions do not match.
#[track_caller]
pub fn solve_transpose_in_place<T: ComplexField>(lu: MatRef<'_, T>, perm: &Perm, rhs: MatMut<'_, T>, par: Par) {
	assert!(all(lu.nrows() == lu.ncols(), rhs.nrows() == lu.ncols(), perm.len() == lu.nrows()));
	let mut rhs = rhs;

	// Aᵀ = Uᵀ Lᵀ P, so x = P⁻¹ L⁻ᵀ U⁻ᵀ rhs
	linalg::triangular_solve::solve_lower_triangular_in_place(lu.transpose(), rhs.rb_mut(), par);
	linalg::triangular_solve::solve_unit_upper_triangular_in_place(lu.transpose(), rhs.rb_mut(), par);
	perm.apply_inverse_to_rows(rhs);
}
