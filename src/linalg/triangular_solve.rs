//! Triangular solve kernels.
//!
//! All solves are in place over the right-hand side, read only the relevant
//! triangle of the coefficient view (so the other half may hold unrelated
//! data, like the packed factors of an LU decomposition), and recurse by
//! splitting the triangle in half, turning the bulk of the work into matrix
//! products.

use crate::internal_prelude::*;

/// below this dimension the recursion bottoms out into scalar substitution.
const RECURSION_THRESHOLD: usize = 4;

/// right-hand sides wider than this are split across threads.
const PAR_COLS_THRESHOLD: usize = 64;

#[inline]
fn blocksize(n: usize) -> usize {
	n / 2
}

macro_rules! par_split {
	($imp: ident, $tri: ident, $rhs: ident, $par: ident) => {
		let n = $tri.nrows();
		let k = $rhs.ncols();
		if k > PAR_COLS_THRESHOLD && n <= 128 && $par.degree() > 1 {
			let (left, right) = $rhs.split_at_col_mut(k / 2);
			join_raw(|par| $imp($tri, left, par), |par| $imp($tri, right, par), $par);
			return;
		}
	};
}

fn solve_unit_lower_triangular_in_place_imp<T: ComplexField>(tril: MatRef<'_, T>, rhs: MatMut<'_, T>, par: Par) {
	let mut rhs = rhs;
	let n = tril.nrows();
	let k = rhs.ncols();

	par_split!(solve_unit_lower_triangular_in_place_imp, tril, rhs, par);

	if n <= RECURSION_THRESHOLD {
		for j in 0..k {
			for depth in 0..n {
				let x = rhs.read(depth, j);
				for i in depth + 1..n {
					rhs.write(i, j, rhs.read(i, j) - tril.read(i, depth) * x);
				}
			}
		}
		return;
	}

	//  (L00    ) (X0)   (B0)
	//  (L10 L11) (X1) = (B1)
	//
	// 1. L00 X0 = B0
	// 2. L11 X1 = B1 - L10 X0
	let bs = blocksize(n);
	let (tril_tl, _, tril_bl, tril_br) = tril.split_at(bs, bs);
	let (mut rhs_top, mut rhs_bot) = rhs.split_at_row_mut(bs);

	solve_unit_lower_triangular_in_place_imp(tril_tl, rhs_top.rb_mut(), par);
	linalg::matmul::matmul(rhs_bot.rb_mut(), Accum::Add, tril_bl, rhs_top.rb(), -one::<T>(), par);
	solve_unit_lower_triangular_in_place_imp(tril_br, rhs_bot, par);
}

fn solve_lower_triangular_in_place_imp<T: ComplexField>(tril: MatRef<'_, T>, rhs: MatMut<'_, T>, par: Par) {
	let mut rhs = rhs;
	let n = tril.nrows();
	let k = rhs.ncols();

	par_split!(solve_lower_triangular_in_place_imp, tril, rhs, par);

	if n <= RECURSION_THRESHOLD {
		for j in 0..k {
			for depth in 0..n {
				let x = rhs.read(depth, j) * tril.read(depth, depth).recip();
				rhs.write(depth, j, x);
				for i in depth + 1..n {
					rhs.write(i, j, rhs.read(i, j) - tril.read(i, depth) * x);
				}
			}
		}
		return;
	}

	let bs = blocksize(n);
	let (tril_tl, _, tril_bl, tril_br) = tril.split_at(bs, bs);
	let (mut rhs_top, mut rhs_bot) = rhs.split_at_row_mut(bs);

	solve_lower_triangular_in_place_imp(tril_tl, rhs_top.rb_mut(), par);
	linalg::matmul::matmul(rhs_bot.rb_mut(), Accum::Add, tril_bl, rhs_top.rb(), -one::<T>(), par);
	solve_lower_triangular_in_place_imp(tril_br, rhs_bot, par);
}

fn solve_unit_upper_triangular_in_place_imp<T: ComplexField>(triu: MatRef<'_, T>, rhs: MatMut<'_, T>, par: Par) {
	let mut rhs = rhs;
	let n = triu.nrows();
	let k = rhs.ncols();

	par_split!(solve_unit_upper_triangular_in_place_imp, triu, rhs, par);

	if n <= RECURSION_THRESHOLD {
		for j in 0..k {
			for depth in (0..n).rev() {
				let x = rhs.read(depth, j);
				for i in 0..depth {
					rhs.write(i, j, rhs.read(i, j) - triu.read(i, depth) * x);
				}
			}
		}
		return;
	}

	//  (U00 U01) (X0)   (B0)
	//  (    U11) (X1) = (B1)
	//
	// 1. U11 X1 = B1
	// 2. U00 X0 = B0 - U01 X1
	let bs = blocksize(n);
	let (triu_tl, triu_tr, _, triu_br) = triu.split_at(bs, bs);
	let (mut rhs_top, mut rhs_bot) = rhs.split_at_row_mut(bs);

	solve_unit_upper_triangular_in_place_imp(triu_br, rhs_bot.rb_mut(), par);
	linalg::matmul::matmul(rhs_top.rb_mut(), Accum::Add, triu_tr, rhs_bot.rb(), -one::<T>(), par);
	solve_unit_upper_triangular_in_place_imp(triu_tl, rhs_top, par);
}

fn solve_upper_triangular_in_place_imp<T: ComplexField>(triu: MatRef<'_, T>, rhs: MatMut<'_, T>, par: Par) {
	let mut rhs = rhs;
	let n = triu.nrows();
	let k = rhs.ncols();

	par_split!(solve_upper_triangular_in_place_imp, triu, rhs, par);

	if n <= RECURSION_THRESHOLD {
		for j in 0..k {
			for depth in (0..n).rev() {
				let x = rhs.read(depth, j) * triu.read(depth, depth).recip();
				rhs.write(depth, j, x);
				for i in 0..depth {
					rhs.write(i, j, rhs.read(i, j) - triu.read(i, depth) * x);
				}
			}
		}
		return;
	}

	let bs = blocksize(n);
	let (triu_tl, triu_tr, _, triu_br) = triu.split_at(bs, bs);
	let (mut rhs_top, mut rhs_bot) = rhs.split_at_row_mut(bs);

	solve_upper_triangular_in_place_imp(triu_br, rhs_bot.rb_mut(), par);
	linalg::matmul::matmul(rhs_top.rb_mut(), Accum::Add, triu_tr, rhs_bot.rb(), -one::<T>(), par);
	solve_upper_triangular_in_place_imp(triu_tl, rhs_top, par);
}

/// solves `L x = rhs` in place, with an implicit unit diagonal, reading only
/// the strictly lower triangle of `tril`.
///
/// # panics
///
/// panics eagerly if `tril` is not square or the dimensions do not match.
#[track_caller]
pub fn solve_unit_lower_triangular_in_place<T: ComplexField>(tril: MatRef<'_, T>, rhs: MatMut<'_, T>, par: Par) {
	assert!(all(tril.nrows() == tril.ncols(), rhs.nrows() == tril.ncols()));
	solve_unit_lower_triangular_in_place_imp(tril, rhs, par);
}

/// solves `L x = rhs` in place, reading only the lower triangle of `tril`.
///
/// # panics
///
/// panics eagerly if `tril` is not square or the dimensions do not match.
#[track_caller]
pub fn solve_lower_triangular_in_place<T: ComplexField>(tril: MatRef<'_, T>, rhs: MatMut<'_, T>, par: Par) {
	assert!(all(tril.nrows() == tril.ncols(), rhs.nrows() == tril.ncols()));
	solve_lower_triangular_in_place_imp(tril, rhs, par);
}

/// solves `U x = rhs` in place, with an implicit unit diagonal, reading only
/// the strictly upper triangle of `triu`.
///
/// # panics
///
/// panics eagerly if `triu` is not square or the dimensions do not match.
#[track_caller]
pub fn solve_unit_upper_triangular_in_place<T: ComplexField>(triu: MatRef<'_, T>, rhs: MatMut<'_, T>, par: Par) {
	assert!(all(triu.nrows() == triu.ncols(), rhs.nrows() == triu.ncols()));
	solve_unit_upper_triangular_in_place_imp(triu, rhs, par);
}

/// solves `U x = rhs` in place, reading only the upper triangle of `triu`.
///
/// # panics
///
/// panics eagerly if `triu` is not square or the dimensions do not match.
#[track_caller]
pub fn solve_upper_triangular_in_place<T: ComplexField>(triu: MatRef<'_, T>, rhs: MatMut<'_, T>, par: Par) {
	assert!(all(triu.nrows() == triu.ncols(), rhs.nrows() == triu.ncols()));
	solve_upper_triangular_in_place_imp(triu, rhs, par);
}
