//! Solving linear systems and least squares problems from packed QR factors.

use crate::internal_prelude::*;
use crate::linalg::householder;

/// solves `A * x = rhs` in place for a square `A`, where `qr` and `taus` are
/// the packed output of [`qr_in_place`](super::factor::qr_in_place).
///
/// # panics
///
/// panics eagerly if `qr` is not square or the dimensions do not match.
#[track_caller]
pub fn solve_in_place<T: ComplexField>(qr: MatRef<'_, T>, taus: &[T], rhs: MatMut<'_, T>, par: Par) {
	assert!(qr.nrows() == qr.ncols());
	solve_lstsq_in_place(qr, taus, rhs, par);
}

/// minimizes `‖A * x − rhs‖` in place, where `qr` and `taus` are the packed
/// output of [`qr_in_place`](super::factor::qr_in_place) for an `A` with at
/// least as many rows as columns. the solution is written to the top
/// `qr.ncols()` rows of `rhs`, the remaining rows hold the residual in the
/// orthogonal basis.
///
/// # panics
///
/// panics eagerly if the dimensions do not match.
#[track_caller]
pub fn solve_lstsq_in_place<T: ComplexField>(qr: MatRef<'_, T>, taus: &[T], rhs: MatMut<'_, T>, par: Par) {
	let n = qr.ncols();
	assert!(all(qr.nrows() >= n, rhs.nrows() == qr.nrows(), taus.len() == n));
	let mut rhs = rhs;

	// x = R⁻¹ (Qᴴ rhs)
	householder::apply_householder_sequence_adjoint_on_the_left_in_place(qr, taus, rhs.rb_mut(), par);
	let top = rhs.subrows_mut(0, n);
	linalg::triangular_solve::solve_upper_triangular_in_place(qr.submatrix(0, 0, n, n), top, par);
}

#[cfg(test)]
mod tests {
	use super::super::factor::{qr_in_place, qr_in_place_scratch, QrParams};
	use super::*;
	use crate::test_utils::*;
	use crate::Mat;
	use dyn_stack::{MemBuffer, MemStack};
	use rand::prelude::*;

	#[test]
	fn test_qr_solve_square() {
		let rng = &mut StdRng::seed_from_u64(0);
		for n in [1, 3, 24, 80] {
			let a = rand_mat_f64(rng, n, n);
			let x_true = rand_mat_f64(rng, n, 2);
			let mut rhs = Mat::<f64>::zeros(n, 2);
			linalg::matmul::matmul(rhs.as_mut(), Accum::Replace, a.as_ref(), x_true.as_ref(), 1.0, Par::Seq);

			let mut qr = a.clone();
			let mut taus = vec![0.0f64; n];
			qr_in_place(
				qr.as_mut(),
				&mut taus,
				Par::Seq,
				MemStack::new(&mut MemBuffer::new(qr_in_place_scratch::<f64>(n, n))),
				QrParams::default(),
			);
			solve_in_place(qr.as_ref(), &taus, rhs.as_mut(), Par::Seq);
			assert!((&rhs - &x_true).norm_max() < 1e-9 * (n as f64) * x_true.norm_max());
		}
	}

	#[test]
	fn test_qr_lstsq_overdetermined() {
		// a consistent overdetermined system is solved exactly
		let rng = &mut StdRng::seed_from_u64(1);
		let m = 60;
		let n = 23;
		let a = rand_mat_f64(rng, m, n);
		let x_true = rand_mat_f64(rng, n, 1);
		let mut rhs = Mat::<f64>::zeros(m, 1);
		linalg::matmul::matmul(rhs.as_mut(), Accum::Replace, a.as_ref(), x_true.as_ref(), 1.0, Par::Seq);

		let mut qr = a.clone();
		let mut taus = vec![0.0f64; n];
		qr_in_place(
			qr.as_mut(),
			&mut taus,
			Par::Seq,
			MemStack::new(&mut MemBuffer::new(qr_in_place_scratch::<f64>(m, n))),
			QrParams::default(),
		);
		solve_lstsq_in_place(qr.as_ref(), &taus, rhs.as_mut(), Par::Seq);

		let solution = rhs.as_ref().subrows(0, n).to_owned();
		assert!((&solution - &x_true).norm_max() < 1e-9 * x_true.norm_max());
	}
}
