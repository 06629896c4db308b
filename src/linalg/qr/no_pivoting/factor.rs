//! Householder QR factorization.

use crate::internal_prelude::*;
use crate::linalg::householder;

/// QR factorization tuning parameters.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub struct QrParams {
	/// trailing problem area below which the reflector applications stay
	/// sequential.
	pub par_threshold: usize,
}

impl Default for QrParams {
	#[inline]
	fn default() -> Self {
		Self {
			par_threshold: 192 * 256,
		}
	}
}

/// computes the workspace requirement of [`qr_in_place`].
#[inline]
pub fn qr_in_place_scratch<T: ComplexField>(nrows: usize, ncols: usize) -> StackReq {
	let _ = nrows;
	let _ = ncols;
	StackReq::EMPTY
}

/// computes the QR factorization of `A` in place, column by column.
///
/// on return, the upper triangle of `A` holds $R$ and the strictly lower
/// trapezoid holds the essential parts of the Householder reflectors whose
/// scalars are written to `taus`, such that `A_original = Q * R`.
///
/// # panics
///
/// panics eagerly, before any write, if `A` has fewer rows than columns, is
/// not a full view, or `taus` is not exactly `A.ncols()` long.
#[track_caller]
pub fn qr_in_place<T: ComplexField>(A: MatMut<'_, T>, taus: &mut [T], par: Par, stack: &mut MemStack, params: QrParams) {
	assert!(all(A.nrows() >= A.ncols(), A.structure().is_full(), taus.len() == A.ncols()));
	let _ = stack;

	#[cfg(feature = "perf-warn")]
	if A.row_stride().unsigned_abs() != 1 && crate::__perf_warn!(QR_WARN) {
		if A.col_stride().unsigned_abs() == 1 {
			log::warn!(target: "stria_perf", "QR prefers a column-major matrix. Found a row-major matrix.");
		} else {
			log::warn!(target: "stria_perf", "QR prefers a column-major matrix. Found a matrix with generic strides.");
		}
	}

	let mut A = A;
	let m = A.nrows();
	let n = A.ncols();

	for k in 0..n {
		let (left, right) = A.rb_mut().split_at_col_mut(k + 1);
		let mut panel = left.col_mut(k).subrows_mut(k, m - k);

		let info = householder::make_householder_in_place(panel.rb_mut());
		taus[k] = from_real(info.tau);

		let essential = panel.into_const().subrows(1, m - k - 1);
		let trailing = right.subrows_mut(k, m - k);

		let par = if (m - k) * (n - k) < params.par_threshold { Par::Seq } else { par };
		householder::apply_householder_on_the_left_in_place(essential, info.tau, trailing, par);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::linalg::householder::apply_householder_sequence_on_the_left_in_place;
	use crate::test_utils::*;
	use crate::{c64, Mat};
	use dyn_stack::{MemBuffer, MemStack};
	use rand::prelude::*;

	fn stack() -> MemBuffer {
		MemBuffer::new(qr_in_place_scratch::<f64>(0, 0))
	}

	fn materialize_q_f64(qr: &Mat<f64>, taus: &[f64]) -> Mat<f64> {
		let m = qr.nrows();
		let mut q = Mat::<f64>::identity(m);
		apply_householder_sequence_on_the_left_in_place(qr.as_ref(), taus, q.as_mut(), Par::Seq);
		q
	}

	#[test]
	fn test_qr_reconstruction_and_orthogonality() {
		let rng = &mut StdRng::seed_from_u64(0);
		for (m, n) in [(1, 1), (4, 4), (10, 4), (64, 64), (129, 40), (131, 131)] {
			let a = rand_mat_f64(rng, m, n);

			for par in par_options() {
				let mut qr = a.clone();
				let mut taus = vec![0.0f64; n];
				qr_in_place(qr.as_mut(), &mut taus, par, MemStack::new(&mut stack()), QrParams::default());

				let q = materialize_q_f64(&qr, &taus);

				// Qᵀ Q = I
				let mut qtq = Mat::<f64>::zeros(m, m);
				linalg::matmul::matmul(qtq.as_mut(), Accum::Replace, q.as_ref().transpose(), q.as_ref(), 1.0, Par::Seq);
				let id = Mat::<f64>::identity(m);
				assert!((&qtq - &id).norm_max() < 1e-13 * (m as f64));

				// A = Q R
				let mut r = Mat::<f64>::zeros(m, n);
				for j in 0..n {
					for i in 0..=Ord::min(j, m - 1) {
						r[(i, j)] = qr[(i, j)];
					}
				}
				let mut prod = Mat::<f64>::zeros(m, n);
				linalg::matmul::matmul(prod.as_mut(), Accum::Replace, q.as_ref(), r.as_ref(), 1.0, Par::Seq);
				assert!((&prod - &a).norm_max() < 1e-13 * (m as f64) * a.norm_max());
			}
		}
	}

	#[test]
	fn test_qr_exchange_matrix() {
		// QR of [[0, 1], [1, 0]]: R has unit diagonal magnitudes and Q is a
		// signed permutation
		let a = crate::mat![
			[0.0, 1.0], //
			[1.0, 0.0],
		];
		let mut qr = a.clone();
		let mut taus = vec![0.0f64; 2];
		qr_in_place(qr.as_mut(), &mut taus, Par::Seq, MemStack::new(&mut stack()), QrParams::default());

		assert!((qr[(0, 0)].abs() - 1.0).abs() < 1e-14);
		assert!((qr[(1, 1)].abs() - 1.0).abs() < 1e-14);

		let q = materialize_q_f64(&qr, &taus);
		for j in 0..2 {
			for i in 0..2 {
				let expected = if i + j == 1 { 1.0 } else { 0.0 };
				assert!((q[(i, j)].abs() - expected).abs() < 1e-14);
			}
		}
	}

	#[test]
	fn test_qr_empty_is_noop() {
		let mut a = Mat::<f64>::zeros(5, 0);
		let mut taus = vec![0.0f64; 0];
		qr_in_place(a.as_mut(), &mut taus, Par::Seq, MemStack::new(&mut stack()), QrParams::default());

		let mut b = Mat::<f64>::zeros(0, 0);
		qr_in_place(b.as_mut(), &mut taus, Par::Seq, MemStack::new(&mut stack()), QrParams::default());
	}

	#[test]
	fn test_qr_complex_unitary() {
		let rng = &mut StdRng::seed_from_u64(1);
		let m = 24;
		let n = 16;
		let a = rand_mat_c64(rng, m, n);

		let mut qr = a.clone();
		let mut taus = vec![c64::new(0.0, 0.0); n];
		qr_in_place(qr.as_mut(), &mut taus, Par::Seq, MemStack::new(&mut stack()), QrParams::default());

		let mut q = Mat::<c64>::identity(m);
		apply_householder_sequence_on_the_left_in_place(qr.as_ref(), &taus, q.as_mut(), Par::Seq);

		let mut qhq = Mat::<c64>::zeros(m, m);
		linalg::matmul::matmul(
			qhq.as_mut(),
			Accum::Replace,
			q.as_ref().adjoint(),
			q.as_ref(),
			c64::new(1.0, 0.0),
			Par::Seq,
		);
		let id = Mat::<c64>::identity(m);
		assert!((&qhq - &id).norm_max() < 1e-13 * (m as f64));

		let r = {
			let mut r = Mat::<c64>::zeros(m, n);
			for j in 0..n {
				for i in 0..=Ord::min(j, m - 1) {
					r[(i, j)] = qr[(i, j)];
				}
			}
			r
		};
		let mut prod = Mat::<c64>::zeros(m, n);
		linalg::matmul::matmul(prod.as_mut(), Accum::Replace, q.as_ref(), r.as_ref(), c64::new(1.0, 0.0), Par::Seq);
		assert!((&prod - &a).norm_max() < 1e-13 * (m as f64) * a.norm_max());
	}
}
