//! Triangular rank-$k$ updates.
//!
//! [`rank_k_update`] computes `dst = [dst] + alpha * x * xᵀ` (or `x * xᴴ`),
//! writing only the requested triangle of `dst`. The kernel recurses by
//! splitting the triangle in two: the diagonal quadrants recurse, and the
//! off-diagonal quadrant is a plain rectangular product. The blocked
//! decompositions share this splitting scheme for their trailing updates.
//!
//! This is the one kernel that detects aliasing between its input and its
//! output: when `x` overlaps `dst`, the off-diagonal cross term would read
//! entries that an earlier recursion step already overwrote, so `x` is
//! materialized into the workspace first. Everywhere else in the library,
//! aliasing between distinct operands is a documented precondition instead of
//! a runtime check.

use crate::internal_prelude::*;

/// below this dimension the update is computed by the scalar kernel.
const RECURSION_THRESHOLD: usize = 16;

fn rank_k_update_base<T: ComplexField>(dst: MatMut<'_, T>, kind: TriangularKind, accum: Accum, alpha: T, x: MatRef<'_, T>, conj_x: Conj) {
	let mut dst = dst;
	let n = dst.nrows();
	let k = x.ncols();

	for j in 0..n {
		let (row_start, row_end) = if kind.is_lower() { (j, n) } else { (0, j + 1) };
		for i in row_start..row_end {
			let mut acc = zero::<T>();
			for depth in 0..k {
				acc = acc + x.read(i, depth) * conj_x.apply(x.read(j, depth));
			}
			acc = alpha * acc;
			if let Accum::Add = accum {
				acc = dst.read(i, j) + acc;
			}
			dst.write(i, j, acc);
		}
	}
}

fn rank_k_update_imp<T: ComplexField>(
	dst: MatMut<'_, T>,
	kind: TriangularKind,
	accum: Accum,
	alpha: T,
	x: MatRef<'_, T>,
	conj_x: Conj,
	par: Par,
) {
	let n = dst.nrows();
	if n <= RECURSION_THRESHOLD {
		return rank_k_update_base(dst, kind, accum, alpha, x, conj_x);
	}

	let bs = n / 2;
	let (dst_tl, dst_tr, dst_bl, dst_br) = dst.split_at_mut(bs, bs);
	let (x_top, x_bot) = x.split_at_row(bs);

	let cross = if conj_x.is_conj() { x_top.adjoint() } else { x_top.transpose() };
	let cross_bot = if conj_x.is_conj() { x_bot.adjoint() } else { x_bot.transpose() };

	if kind.is_lower() {
		let _ = dst_tr;
		linalg::matmul::matmul(dst_bl, accum, x_bot, cross, alpha, par);
		join_raw(
			|par| rank_k_update_imp(dst_tl, kind, accum, alpha, x_top, conj_x, par),
			|par| rank_k_update_imp(dst_br, kind, accum, alpha, x_bot, conj_x, par),
			par,
		);
	} else {
		let _ = dst_bl;
		linalg::matmul::matmul(dst_tr, accum, x_top, cross_bot, alpha, par);
		join_raw(
			|par| rank_k_update_imp(dst_tl, kind, accum, alpha, x_top, conj_x, par),
			|par| rank_k_update_imp(dst_br, kind, accum, alpha, x_bot, conj_x, par),
			par,
		);
	}
}

/// computes the workspace requirement of [`rank_k_update`]; only consumed
/// when the source overlaps the destination.
#[inline]
pub fn rank_k_update_scratch<T: ComplexField>(dim: usize, k: usize) -> StackReq {
	linalg::temp_mat_scratch::<T>(dim, k)
}

/// computes `dst = [dst] + alpha * x * xᵀ` (with `conj_x = Conj::Yes`,
/// `x * xᴴ`, the natural update of a Hermitian accumulator), writing only the
/// `kind` triangle of `dst`.
///
/// when `x` and `dst` reference overlapping memory, `x` is copied into the
/// workspace before the update.
///
/// # panics
///
/// panics eagerly, before any write, if `dst` is not square, its row count
/// differs from `x`'s, `dst` is not a full view, or `kind` is not `Lower` or
/// `Upper`.
#[track_caller]
pub fn rank_k_update<T: ComplexField>(
	dst: MatMut<'_, T>,
	kind: TriangularKind,
	accum: Accum,
	alpha: T,
	x: MatRef<'_, T>,
	conj_x: Conj,
	par: Par,
	stack: &mut MemStack,
) {
	assert!(all(
		dst.nrows() == dst.ncols(),
		dst.nrows() == x.nrows(),
		dst.structure().is_full(),
		x.structure().is_full(),
		matches!(kind, TriangularKind::Lower | TriangularKind::Upper),
	));

	if dst.nrows() == 0 {
		return;
	}

	if x.overlaps(&dst.rb()) {
		let (mut copy, _) = stack.make_with(x.nrows() * x.ncols(), |_| zero::<T>());
		let mut tmp = MatMut::from_column_major_slice_mut(&mut copy, x.nrows(), x.ncols());
		tmp.copy_from(x);
		return rank_k_update_imp(dst, kind, accum, alpha, tmp.rb(), conj_x, par);
	}

	rank_k_update_imp(dst, kind, accum, alpha, x, conj_x, par);
}
