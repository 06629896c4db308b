//! Column-pivoted Householder QR factorization.
//!
//! At each step the remaining column with the largest residual norm is moved
//! to the front, so the diagonal of $R$ decays with the numerical rank of the
//! input. Two pivot trackers are available:
//!
//! - strict: the residual norms are recomputed from the updated columns after
//!   every reflector, which guarantees `|R(i, i)| >= |R(i+1, i+1)|` for every
//!   `i`;
//! - non-strict (the default of [`QrpParams`]): the norms are downdated in
//!   O(1) per column with the classical cancellation guard, recomputing only
//!   when the downdate has lost half the digits. cheaper, and the diagonal is
//!   still non-increasing in all but pathological cases.

use crate::internal_prelude::*;
use crate::perm::swap_cols_idx;
use crate::linalg::householder;

/// column-pivoted QR factorization tuning parameters.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub struct QrpParams {
	/// trailing problem area below which the reflector applications stay
	/// sequential.
	pub par_threshold: usize,
}

impl Default for QrpParams {
	#[inline]
	fn default() -> Self {
		Self {
			par_threshold: 192 * 256,
		}
	}
}

/// information about a computed column-pivoted QR factorization.
#[derive(Copy, Clone, Debug)]
pub struct QrpInfo {
	/// number of proper column transpositions performed; determines the sign
	/// of the permutation.
	pub transposition_count: usize,
}

/// computes the workspace requirement of [`qrp_in_place`].
#[inline]
pub fn qrp_in_place_scratch<T: ComplexField>(nrows: usize, ncols: usize) -> StackReq {
	let _ = nrows;
	StackReq::all_of(&[StackReq::new::<T::Real>(ncols), StackReq::new::<T::Real>(ncols)])
}

/// computes the column-pivoted QR factorization of `A` in place, and returns
/// the column permutation such that `A_original * P = Q * R`.
///
/// the factors are packed exactly as in
/// [`qr_in_place`](super::super::no_pivoting::factor::qr_in_place). with
/// `strict` set, the diagonal of $R$ is guaranteed non-increasing in
/// magnitude; see the module docs for the trade-off.
///
/// a rank-deficient input is not an error; it shows up as small trailing
/// diagonal entries of $R$, countable with [`estimate_rank`].
///
/// # panics
///
/// panics eagerly, before any write, if `A` has fewer rows than columns, is
/// not a full view, or `taus` is not exactly `A.ncols()` long.
#[track_caller]
pub fn qrp_in_place<T: ComplexField>(
	A: MatMut<'_, T>,
	taus: &mut [T],
	strict: bool,
	par: Par,
	stack: &mut MemStack,
	params: QrpParams,
) -> (QrpInfo, Perm) {
	assert!(all(A.nrows() >= A.ncols(), A.structure().is_full(), taus.len() == A.ncols()));

	let mut A = A;
	let m = A.nrows();
	let n = A.ncols();

	let (mut norms, stack) = stack.make_with(n, |_| zero::<T::Real>());
	let (mut norms_orig, _) = stack.make_with(n, |_| zero::<T::Real>());

	for j in 0..n {
		let norm = A.rb().col(j).norm_l2();
		norms[j] = norm;
		norms_orig[j] = norm;
	}

	let mut perm = Perm::identity(n);
	let mut n_trans = 0;

	// norms that shrank below this fraction of their value at the last
	// recompute are considered unreliable
	let guard = eps::<T::Real>().sqrt();

	for k in 0..n {
		// select the residual column with the largest norm, lowest index on
		// ties
		let mut best = k;
		let mut best_norm = norms[k];
		for j in k + 1..n {
			if norms[j] > best_norm {
				best_norm = norms[j];
				best = j;
			}
		}
		if best != k {
			swap_cols_idx(A.rb_mut(), k, best);
			norms.swap(k, best);
			norms_orig.swap(k, best);
			perm.push(k, best);
			n_trans += 1;
		}

		let (left, right) = A.rb_mut().split_at_col_mut(k + 1);
		let mut panel = left.col_mut(k).subrows_mut(k, m - k);

		let info = householder::make_householder_in_place(panel.rb_mut());
		taus[k] = from_real(info.tau);

		let essential = panel.into_const().subrows(1, m - k - 1);
		let mut trailing = right.subrows_mut(k, m - k);

		let apply_par = if (m - k) * (n - k) < params.par_threshold { Par::Seq } else { par };
		householder::apply_householder_on_the_left_in_place(essential, info.tau, trailing.rb_mut(), apply_par);

		// track the residual norms of the remaining columns
		let trailing = trailing.into_const();
		for j in k + 1..n {
			let col = trailing.col(j - k - 1);
			if strict {
				norms[j] = col.subrows(1, m - k - 1).norm_l2();
				norms_orig[j] = norms[j];
			} else if norms[j] != zero::<T::Real>() {
				// downdate ‖c‖ after removing its first entry; recompute when
				// cancellation has eaten the result
				let t = col.read(0).abs() * norms[j].recip();
				let f = (one::<T::Real>() + t) * (one::<T::Real>() - t);
				let f = if f > zero::<T::Real>() { f } else { zero::<T::Real>() };
				let rel = norms[j] * norms_orig[j].recip();
				if f.sqrt() * rel <= guard {
					norms[j] = col.subrows(1, m - k - 1).norm_l2();
					norms_orig[j] = norms[j];
				} else {
					norms[j] = norms[j] * f.sqrt();
				}
			}
		}
	}

	(
		QrpInfo {
			transposition_count: n_trans,
		},
		perm,
	)
}

/// counts the diagonal entries of `R` with magnitude above `threshold`
/// relative to the leading one, a numerical rank estimate for a
/// rank-revealing factorization.
pub fn estimate_rank<T: ComplexField>(r: MatRef<'_, T>, threshold: T::Real) -> usize {
	let size = Ord::min(r.nrows(), r.ncols());
	if size == 0 {
		return 0;
	}
	let lead = r.read(0, 0).abs();
	if lead == zero::<T::Real>() {
		return 0;
	}
	let mut rank = 0;
	for i in 0..size {
		if r.read(i, i).abs() > threshold * lead {
			rank += 1;
		}
	}
	rank
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::linalg::householder::apply_householder_sequence_on_the_left_in_place;
	use crate::test_utils::*;
	use crate::Mat;
	use dyn_stack::{MemBuffer, MemStack};
	use rand::prelude::*;

	fn factor(a: &Mat<f64>, strict: bool) -> (Mat<f64>, Vec<f64>, Perm) {
		let m = a.nrows();
		let n = a.ncols();
		let mut qr = a.clone();
		let mut taus = vec![0.0f64; n];
		let (_, perm) = qrp_in_place(
			qr.as_mut(),
			&mut taus,
			strict,
			Par::Seq,
			MemStack::new(&mut MemBuffer::new(qrp_in_place_scratch::<f64>(m, n))),
			QrpParams::default(),
		);
		(qr, taus, perm)
	}

	#[test]
	fn test_qrp_reconstruction() {
		let rng = &mut StdRng::seed_from_u64(0);
		for (m, n) in [(1, 1), (5, 5), (40, 17), (80, 80)] {
			let a = rand_mat_f64(rng, m, n);
			for strict in [false, true] {
				let (qr, taus, perm) = factor(&a, strict);

				// Q R = A P
				let mut r = Mat::<f64>::zeros(m, n);
				for j in 0..n {
					for i in 0..=Ord::min(j, m - 1) {
						r[(i, j)] = qr[(i, j)];
					}
				}
				let mut prod = Mat::<f64>::zeros(m, n);
				prod.as_mut().copy_from(r.as_ref());
				apply_householder_sequence_on_the_left_in_place(qr.as_ref(), &taus, prod.as_mut(), Par::Seq);

				let mut ap = a.clone();
				perm.apply_to_cols(ap.as_mut());
				assert!((&prod - &ap).norm_max() < 1e-12 * (m as f64) * a.norm_max());
			}
		}
	}

	#[test]
	fn test_qrp_strict_diagonal_monotone() {
		let rng = &mut StdRng::seed_from_u64(1);
		for (m, n) in [(30, 30), (64, 50), (120, 120)] {
			let a = rand_mat_f64(rng, m, n);
			let (qr, _, _) = factor(&a, true);
			for i in 0..n - 1 {
				let r0 = qr[(i, i)].abs();
				let r1 = qr[(i + 1, i + 1)].abs();
				assert!(r1 <= r0 * (1.0 + 1e-10));
			}
		}
	}

	#[test]
	fn test_qrp_reveals_rank() {
		// build a matrix of rank 3 from a rank factorization
		let rng = &mut StdRng::seed_from_u64(2);
		let m = 50;
		let n = 35;
		let rank = 3;
		let left = rand_mat_f64(rng, m, rank);
		let right = rand_mat_f64(rng, rank, n);
		let mut a = Mat::<f64>::zeros(m, n);
		linalg::matmul::matmul(a.as_mut(), Accum::Replace, left.as_ref(), right.as_ref(), 1.0, Par::Seq);

		for strict in [false, true] {
			let (qr, _, _) = factor(&a, strict);
			assert!(estimate_rank(qr.as_ref(), 1e-10) == rank);
		}
	}

	#[test]
	fn test_qrp_first_pivot_is_largest_column() {
		let rng = &mut StdRng::seed_from_u64(3);
		let m = 20;
		let n = 12;
		let mut a = rand_mat_f64(rng, m, n);
		// make column 7 clearly dominant
		for i in 0..m {
			a[(i, 7)] *= 100.0;
		}
		let (_, _, perm) = factor(&a, true);
		let idx = perm.to_index_array();
		assert!(idx[0] == 7);
	}
}
