//! Singular value decomposition by one-sided Jacobi rotations.
//!
//! The input `A` (with at least as many rows as columns) is repeatedly
//! multiplied on the right by plane rotations chosen to orthogonalize a pair
//! of columns, until every pair is orthogonal to working precision. At that
//! point `A` has become `U * diag(s)` and the accumulated rotations form `V`,
//! so that `A_original = U * diag(s) * Vᴴ`.
//!
//! Jacobi iteration converges unconditionally on the cyclic ordering used
//! here; the sweep limit is a safety net, not an expected failure mode, and
//! running out of sweeps is reported as a data property rather than an error.

use crate::internal_prelude::*;
use crate::perm::swap_cols_idx;

/// plane rotation orthogonalizing a column pair, with a real cosine and a
/// complex sine carrying the phase of the cross term.
#[derive(Copy, Clone, Debug)]
pub struct JacobiRotation<T: ComplexField> {
	pub c: T::Real,
	pub s: T,
}

impl<T: ComplexField> JacobiRotation<T> {
	/// identity rotation.
	#[inline]
	pub fn identity() -> Self {
		Self {
			c: one::<T::Real>(),
			s: zero::<T>(),
		}
	}

	/// builds the rotation diagonalizing the Hermitian Gram matrix
	/// `[[a, h], [conj(h), b]]`, with `a` and `b` the squared column norms and
	/// `h` the cross term.
	pub fn from_gram(a: T::Real, b: T::Real, h: T) -> Self {
		let habs = h.abs();
		if habs == zero::<T::Real>() {
			return Self::identity();
		}
		let phase = h.mul_real(habs.recip());

		let two = from_f64::<T::Real>(2.0);
		let tau = (a - b) * (two * habs).recip();
		let w = (tau * tau + one::<T::Real>()).sqrt();
		// stable root of t² − 2τt − 1 = 0 with the smaller magnitude, so the
		// rotation angle stays below π/4
		let t = if tau >= zero::<T::Real>() {
			-(tau + w).recip()
		} else {
			-(tau - w).recip()
		};

		let c = (t * t + one::<T::Real>()).sqrt().recip();
		let sigma = t * c;
		Self {
			c,
			s: phase.mul_real(sigma),
		}
	}

	/// applies the rotation to a column pair from the right:
	/// `p ← c p − conj(s) q`, `q ← s p + c q`.
	pub fn apply_to_col_pair(&self, p: ColMut<'_, T>, q: ColMut<'_, T>) {
		let mut p = p;
		let mut q = q;
		debug_assert!(p.nrows() == q.nrows());
		let s_conj = self.s.conj();
		for i in 0..p.nrows() {
			let xp = p.read(i);
			let xq = q.read(i);
			p.write(i, xp.mul_real(self.c) - s_conj * xq);
			q.write(i, self.s * xp + xq.mul_real(self.c));
		}
	}
}

/// SVD tuning parameters.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub struct SvdParams {
	/// maximum number of full sweeps over all column pairs.
	pub max_sweeps: usize,
}

impl Default for SvdParams {
	#[inline]
	fn default() -> Self {
		Self { max_sweeps: 30 }
	}
}

/// information about a computed SVD.
#[derive(Copy, Clone, Debug)]
pub struct SvdInfo {
	/// number of sweeps performed.
	pub sweep_count: usize,
	/// whether every column pair reached orthogonality within the sweep
	/// limit.
	pub converged: bool,
}

/// computes the thin singular value decomposition of `A` in place.
///
/// on return, the columns of `A` are the left singular vectors scaled to unit
/// norm, `s` holds the singular values in non-increasing order, and `v` (when
/// provided) holds the right singular vectors, such that
/// `A_original = A * diag(s) * vᴴ`.
///
/// # panics
///
/// panics eagerly, before any write, if `A` has fewer rows than columns, `s`
/// is not exactly `A.ncols()` long, or `v` is not square of dimension
/// `A.ncols()`.
#[track_caller]
pub fn jacobi_svd_in_place<T: ComplexField>(
	A: MatMut<'_, T>,
	v: Option<MatMut<'_, T>>,
	s: &mut [T::Real],
	par: Par,
	params: SvdParams,
) -> SvdInfo {
	let m = A.nrows();
	let n = A.ncols();
	assert!(all(m >= n, A.structure().is_full(), s.len() == n));
	if let Some(v) = &v {
		assert!(all(v.nrows() == n, v.ncols() == n));
	}

	let mut A = A;
	let mut v = v;

	if let Some(v) = &mut v {
		v.fill(zero());
		for j in 0..n {
			v.write(j, j, one());
		}
	}

	let tol = eps::<T::Real>() * from_f64::<T::Real>(m as f64).sqrt();

	let mut sweep_count = 0;
	let mut converged = n < 2;

	while sweep_count < params.max_sweeps && !converged {
		sweep_count += 1;
		let mut rotated = false;

		for p in 0..n {
			for q in p + 1..n {
				let col_p = A.rb().col(p);
				let col_q = A.rb().col(q);
				let a = col_p.norm_l2_sqr();
				let b = col_q.norm_l2_sqr();
				let h = linalg::matmul::dot::inner_prod(col_p.adjoint(), col_q);

				if h.abs() > tol * (a.sqrt() * b.sqrt()) {
					rotated = true;
					let rot = JacobiRotation::from_gram(a, b, h);

					let (pa, qa) = A.rb_mut().two_cols_mut(p, q);
					match &mut v {
						Some(v) => {
							let (pv, qv) = v.rb_mut().two_cols_mut(p, q);
							join_raw(
								|_| rot.apply_to_col_pair(pa, qa),
								|_| rot.apply_to_col_pair(pv, qv),
								if m > 512 { par } else { Par::Seq },
							);
						},
						None => rot.apply_to_col_pair(pa, qa),
					}
				}
			}
		}

		converged = !rotated;
	}

	// the columns are now mutually orthogonal; their norms are the singular
	// values
	for j in 0..n {
		s[j] = A.rb().col(j).norm_l2();
	}

	// sort non-increasing, dragging the singular vectors along
	for i in 0..n {
		let mut best = i;
		for j in i + 1..n {
			if s[j] > s[best] {
				best = j;
			}
		}
		if best != i {
			s.swap(i, best);
			swap_cols_idx(A.rb_mut(), i, best);
			if let Some(v) = &mut v {
				swap_cols_idx(v.rb_mut(), i, best);
			}
		}
	}

	// normalize the left singular vectors
	for j in 0..n {
		if s[j] > min_positive::<T::Real>() {
			let inv = s[j].recip();
			let mut col = A.rb_mut().col_mut(j);
			for i in 0..m {
				col.write(i, col.read(i).mul_real(inv));
			}
		}
	}

	SvdInfo { sweep_count, converged }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::*;
	use crate::{c64, Mat};
	use rand::prelude::*;

	fn reconstruct_f64(u: &Mat<f64>, s: &[f64], v: &Mat<f64>) -> Mat<f64> {
		let m = u.nrows();
		let n = u.ncols();
		let scaled = Mat::<f64>::from_fn(m, n, |i, j| u[(i, j)] * s[j]);
		let mut back = Mat::<f64>::zeros(m, n);
		linalg::matmul::matmul(back.as_mut(), Accum::Replace, scaled.as_ref(), v.as_ref().transpose(), 1.0, Par::Seq);
		back
	}

	#[test]
	fn test_svd_reconstruction() {
		let rng = &mut StdRng::seed_from_u64(0);
		for (m, n) in [(1, 1), (5, 5), (30, 14), (64, 64)] {
			let a = rand_mat_f64(rng, m, n);

			let mut u = a.clone();
			let mut v = Mat::<f64>::zeros(n, n);
			let mut s = vec![0.0f64; n];
			let info = jacobi_svd_in_place(u.as_mut(), Some(v.as_mut()), &mut s, Par::Seq, SvdParams::default());
			assert!(info.converged);

			// singular values are sorted and non-negative
			for j in 0..n {
				assert!(s[j] >= 0.0);
				if j > 0 {
					assert!(s[j] <= s[j - 1]);
				}
			}

			let back = reconstruct_f64(&u, &s, &v);
			assert!((&back - &a).norm_max() < 1e-12 * (m as f64) * a.norm_max());

			// U and V have orthonormal columns
			let mut utu = Mat::<f64>::zeros(n, n);
			linalg::matmul::matmul(utu.as_mut(), Accum::Replace, u.as_ref().transpose(), u.as_ref(), 1.0, Par::Seq);
			assert!((&utu - &Mat::identity(n)).norm_max() < 1e-12 * (n as f64));

			let mut vtv = Mat::<f64>::zeros(n, n);
			linalg::matmul::matmul(vtv.as_mut(), Accum::Replace, v.as_ref().transpose(), v.as_ref(), 1.0, Par::Seq);
			assert!((&vtv - &Mat::identity(n)).norm_max() < 1e-12 * (n as f64));
		}
	}

	#[test]
	fn test_svd_known_values() {
		// diag(3, 0, 1) padded with an extra row
		let a = crate::mat![
			[3.0, 0.0, 0.0],
			[0.0, 0.0, 0.0],
			[0.0, 0.0, 1.0],
			[0.0, 0.0, 0.0],
		];
		let mut u = a.clone();
		let mut s = vec![0.0f64; 3];
		let info = jacobi_svd_in_place(u.as_mut(), None, &mut s, Par::Seq, SvdParams::default());
		assert!(info.converged);
		assert!((s[0] - 3.0).abs() < 1e-14);
		assert!((s[1] - 1.0).abs() < 1e-14);
		assert!(s[2].abs() < 1e-14);
	}

	#[test]
	fn test_svd_complex() {
		let rng = &mut StdRng::seed_from_u64(1);
		let m = 20;
		let n = 11;
		let a = rand_mat_c64(rng, m, n);

		let mut u = a.clone();
		let mut v = Mat::<c64>::zeros(n, n);
		let mut s = vec![0.0f64; n];
		let info = jacobi_svd_in_place(u.as_mut(), Some(v.as_mut()), &mut s, Par::Seq, SvdParams::default());
		assert!(info.converged);

		// A V = U diag(s)
		let mut av = Mat::<c64>::zeros(m, n);
		linalg::matmul::matmul(av.as_mut(), Accum::Replace, a.as_ref(), v.as_ref(), c64::new(1.0, 0.0), Par::Seq);
		let us = Mat::<c64>::from_fn(m, n, |i, j| u[(i, j)].scale(s[j]));
		assert!((&av - &us).norm_max() < 1e-12 * (m as f64) * a.norm_max());
	}

	#[test]
	fn test_svd_matches_lu_singularity() {
		// a rank deficient matrix has a zero tail in its spectrum
		let rng = &mut StdRng::seed_from_u64(2);
		let n = 16;
		let left = rand_mat_f64(rng, n, 5);
		let right = rand_mat_f64(rng, 5, n);
		let mut a = Mat::<f64>::zeros(n, n);
		linalg::matmul::matmul(a.as_mut(), Accum::Replace, left.as_ref(), right.as_ref(), 1.0, Par::Seq);

		let mut u = a.clone();
		let mut s = vec![0.0f64; n];
		jacobi_svd_in_place(u.as_mut(), None, &mut s, Par::Seq, SvdParams::default());
		for j in 5..n {
			assert!(s[j] < 1e-10 * s[0]);
		}
	}
}
