//! LU factorization with partial pivoting.

use crate::internal_prelude::*;
use crate::perm::swap_rows_idx;

/// LU factorization tuning parameters.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub struct LuParams {
	/// panel width at which the implementation stops recursing.
	pub recursion_threshold: usize,
	/// problem area below which the transposition passes stay sequential.
	pub par_threshold: usize,
}

impl Default for LuParams {
	#[inline]
	fn default() -> Self {
		Self {
			recursion_threshold: 16,
			par_threshold: 128 * 128,
		}
	}
}

/// information about a computed LU factorization.
#[derive(Copy, Clone, Debug)]
pub struct LuInfo {
	/// number of proper transpositions performed; determines the sign of the
	/// permutation.
	pub transposition_count: usize,
	/// column of the first exactly zero pivot, if any. the factorization still
	/// ran to completion, but the matrix is singular and the factors must not
	/// be used for solving.
	pub zero_pivot: Option<usize>,
}

fn lu_in_place_unblocked<T: ComplexField>(A: MatMut<'_, T>, start: usize, end: usize, col0: usize, trans: &mut [usize]) -> (usize, Option<usize>) {
	let mut A = A;
	let m = A.nrows();
	if start == end {
		return (0, None);
	}

	let mut n_trans = 0;
	let mut zero_pivot = None;

	for j in start..end {
		let col = j;
		let row = j - start;

		// pick the largest entry of the column, lowest row index on ties
		let mut imax = row;
		let mut max = zero::<T::Real>();
		for i in row..m {
			let abs = A.read(i, col).abs1();
			if abs > max {
				max = abs;
				imax = i;
			}
		}
		trans[row] = imax - row;
		if imax != row {
			swap_rows_idx(A.rb_mut(), row, imax);
			n_trans += 1;
		}

		let mut win = A.rb_mut().subcols_mut(start, end - start);
		if max == zero::<T::Real>() {
			// the whole candidate column is zero; leave the zero pivot in
			// place and keep factoring
			if zero_pivot.is_none() {
				zero_pivot = Some(col0 + col);
			}
		} else {
			let inv = win.read(row, row).recip();
			for i in row + 1..m {
				win.write(i, row, win.read(i, row) * inv);
			}
		}

		let (_, A01, A10, A11) = win.split_at_mut(row + 1, row + 1);
		let A01 = A01.row_mut(row).into_const();
		let A10 = A10.col_mut(row).into_const();
		linalg::matmul::matmul(A11, Accum::Add, A10.as_mat(), A01.as_mat(), -one::<T>(), Par::Seq);
	}

	(n_trans, zero_pivot)
}

fn apply_transpositions<T: ComplexField>(mat: MatMut<'_, T>, trans: &[usize]) {
	let mut mat = mat;
	for j in 0..mat.ncols() {
		let mut col = mat.rb_mut().col_mut(j);
		for (i, &t) in trans.iter().enumerate() {
			if t != 0 {
				let a = col.read(i);
				let b = col.read(i + t);
				col.write(i, b);
				col.write(i + t, a);
			}
		}
	}
}

fn lu_in_place_recursion<T: ComplexField>(
	A: MatMut<'_, T>,
	start: usize,
	end: usize,
	col0: usize,
	trans: &mut [usize],
	par: Par,
	params: LuParams,
) -> (usize, Option<usize>) {
	let mut A = A;
	let m = A.nrows();
	let ncols = A.ncols();
	let n = end - start;

	if n <= params.recursion_threshold {
		return lu_in_place_unblocked(A, start, end, col0, trans);
	}

	let half = n / 2;
	let pow = Ord::min(16, half.next_power_of_two());
	let block_size = half.next_multiple_of(pow);

	debug_assert!(n <= m);

	let (mut n_trans, mut zero_pivot) = lu_in_place_recursion(
		A.rb_mut().subcols_mut(start, n),
		0,
		block_size,
		col0 + start,
		&mut trans[..block_size],
		par,
		params,
	);

	{
		let mut win = A.rb_mut().subcols_mut(start, n);
		let (A00, mut A01, A10, mut A11) = win.rb_mut().split_at_mut(block_size, block_size);

		linalg::triangular_solve::solve_unit_lower_triangular_in_place(A00.rb(), A01.rb_mut(), par);
		linalg::matmul::matmul(A11.rb_mut(), Accum::Add, A10.rb(), A01.rb(), -one::<T>(), par);

		let (sub_trans, sub_zero) = lu_in_place_recursion(
			win.subrows_mut(block_size, m - block_size),
			block_size,
			n,
			col0 + start,
			&mut trans[block_size..n],
			par,
			params,
		);
		n_trans += sub_trans;
		if zero_pivot.is_none() {
			zero_pivot = sub_zero;
		}
	}

	// replay the panel's transpositions on the columns outside of it
	let (A_left, A_right) = A.split_at_col_mut(start);
	let A_right = A_right.subcols_mut(n, ncols - start - n);
	let par = if m * (ncols - n) > params.par_threshold { par } else { Par::Seq };
	join_raw(
		|_| apply_transpositions(A_left, &trans[..n]),
		|_| apply_transpositions(A_right, &trans[..n]),
		par,
	);

	(n_trans, zero_pivot)
}

/// computes the workspace requirement of [`lu_in_place`] for a `dim × dim`
/// matrix.
#[inline]
pub fn lu_in_place_scratch<T: ComplexField>(dim: usize) -> StackReq {
	StackReq::new::<usize>(dim)
}

/// computes the LU factorization of `A` with partial pivoting, in place, and
/// returns the row permutation together with the transposition count and the
/// location of the first zero pivot.
///
/// on return, the strictly lower triangle of `A` holds the multipliers of $L$
/// (unit diagonal implied) and its upper triangle holds $U$, such that
/// `P * A_original = L * U`.
///
/// a singular matrix is not an error; see [`LuInfo::zero_pivot`].
///
/// # panics
///
/// panics eagerly, before any write, if `A` is not a square full view.
#[track_caller]
pub fn lu_in_place<T: ComplexField>(A: MatMut<'_, T>, par: Par, stack: &mut MemStack, params: LuParams) -> (LuInfo, Perm) {
	assert!(all(A.nrows() == A.ncols(), A.structure().is_full()));

	#[cfg(feature = "perf-warn")]
	if A.row_stride().unsigned_abs() != 1 && A.col_stride().unsigned_abs() != 1 && crate::__perf_warn!(LU_WARN) {
		log::warn!(
			target: "stria_perf",
			"LU with partial pivoting prefers a column-major or row-major matrix. Found a matrix with generic strides."
		);
	}

	let mut A = A;
	let n = A.nrows();

	let (mut trans, _) = stack.make_with(n, |_| 0usize);
	let (n_trans, zero_pivot) = lu_in_place_recursion(A.rb_mut(), 0, n, 0, &mut trans, par, params);

	let mut perm = Perm::identity(n);
	for (k, &t) in trans.iter().enumerate() {
		if t != 0 {
			perm.push(k, k + t);
		}
	}

	(
		LuInfo {
			transposition_count: n_trans,
			zero_pivot,
		},
		perm,
	)
}
