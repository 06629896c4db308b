//! Householder reflections.
//!
//! A reflector is stored in the factored form $H = I - v v^H / \tau$, with
//! $v_0 = 1$ implied, the rest of $v$ (the essential part) stored in the
//! subcolumn it zeroed, and the real scalar $\tau$ in a side array. A packed
//! $Q$ is the ordered product of such reflectors and is applied without ever
//! being materialized.

use crate::internal_prelude::*;

/// scalars describing a freshly built reflector.
#[derive(Copy, Clone, Debug)]
pub struct HouseholderInfo<T: ComplexField> {
	/// reflector scaling factor. infinite when the column was already in the
	/// target form, in which case applying the reflector is a no-op.
	pub tau: T::Real,
	/// new leading entry of the reflected column.
	pub beta: T,
}

/// builds the reflector zeroing everything below the first element of `col`,
/// in place: on return the head holds $\beta$ and the tail holds the
/// essential part of $v$.
///
/// the sign of $\beta$ is chosen opposite to the head so that the leading
/// entry of $v$ is computed without cancellation.
pub fn make_householder_in_place<T: ComplexField>(col: ColMut<'_, T>) -> HouseholderInfo<T> {
	let mut col = col;
	let (mut head, mut tail) = col.rb_mut().split_at_mut(1);
	let head_val = head.read(0);

	let tail_norm = tail.rb().norm_l2();
	if tail_norm == zero::<T::Real>() {
		return HouseholderInfo {
			tau: infinity::<T::Real>(),
			beta: head_val,
		};
	}

	let head_norm = head_val.abs();
	let norm = head_norm.hypot(tail_norm);

	let sign = if head_norm != zero::<T::Real>() {
		head_val.mul_real(head_norm.recip())
	} else {
		one::<T>()
	};

	let signed_norm = sign.mul_real(norm);
	let head_with_beta = head_val + signed_norm;
	let head_with_beta_inv = head_with_beta.recip();
	debug_assert!(!head_with_beta.is_zero());

	for i in 0..tail.nrows() {
		tail.write(i, tail.read(i) * head_with_beta_inv);
	}

	let one_half = from_f64::<T::Real>(0.5);
	let t = tail_norm * head_with_beta_inv.abs();
	let tau = one_half * (one::<T::Real>() + t * t);
	let beta = -signed_norm;
	head.write(0, beta);

	HouseholderInfo { tau, beta }
}

/// applies $H = I - v v^H / \tau$ to `rhs` from the left, where $v = (1,
/// \text{essential})$ and `rhs` has one more row than `essential`.
pub fn apply_householder_on_the_left_in_place<T: ComplexField>(essential: ColRef<'_, T>, tau: T::Real, rhs: MatMut<'_, T>, par: Par) {
	debug_assert!(rhs.nrows() == essential.nrows() + 1);
	let mut rhs = rhs;

	if rhs.ncols() > 64 && par.degree() > 1 {
		let k = rhs.ncols();
		let (left, right) = rhs.split_at_col_mut(k / 2);
		join_raw(
			|par| apply_householder_on_the_left_in_place(essential, tau, left, par),
			|par| apply_householder_on_the_left_in_place(essential, tau, right, par),
			par,
		);
		return;
	}

	let tau_inv = tau.recip();
	let (mut first, mut rest) = rhs.split_at_row_mut(1);
	for j in 0..rest.ncols() {
		let head = first.read(0, j);
		let dot = head + linalg::matmul::dot::inner_prod(essential.adjoint(), rest.rb().col(j));
		let coeff = -dot.mul_real(tau_inv);

		first.write(0, j, head + coeff);
		let mut col = rest.rb_mut().col_mut(j);
		for i in 0..col.nrows() {
			col.write(i, col.read(i) + coeff * essential.read(i));
		}
	}
}

/// applies the packed $Q = H_0 H_1 \cdots H_{s-1}$ described by the lower
/// trapezoid of `essentials` and the scalars in `taus` to `rhs` from the
/// left.
///
/// # panics
///
/// panics eagerly if the dimensions do not match.
#[track_caller]
pub fn apply_householder_sequence_on_the_left_in_place<T: ComplexField>(
	essentials: MatRef<'_, T>,
	taus: &[T],
	rhs: MatMut<'_, T>,
	par: Par,
) {
	let m = essentials.nrows();
	let size = taus.len();
	assert!(all(rhs.nrows() == m, size <= Ord::min(m, essentials.ncols())));
	let mut rhs = rhs;

	// Q is applied with its leftmost reflector last
	for k in (0..size).rev() {
		let essential = essentials.col(k).subrows(k + 1, m - k - 1);
		let tau = taus[k].real();
		let block = rhs.rb_mut().subrows_mut(k, m - k);
		apply_householder_on_the_left_in_place(essential, tau, block, par);
	}
}

/// applies $Q^H = H_{s-1} \cdots H_1 H_0$ (each reflector is Hermitian and
/// unitary) to `rhs` from the left.
///
/// # panics
///
/// panics eagerly if the dimensions do not match.
#[track_caller]
pub fn apply_householder_sequence_adjoint_on_the_left_in_place<T: ComplexField>(
	essentials: MatRef<'_, T>,
	taus: &[T],
	rhs: MatMut<'_, T>,
	par: Par,
) {
	let m = essentials.nrows();
	let size = taus.len();
	assert!(all(rhs.nrows() == m, size <= Ord::min(m, essentials.ncols())));
	let mut rhs = rhs;

	for k in 0..size {
		let essential = essentials.col(k).subrows(k + 1, m - k - 1);
		let tau = taus[k].real();
		let block = rhs.rb_mut().subrows_mut(k, m - k);
		apply_householder_on_the_left_in_place(essential, tau, block, par);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::*;
	use crate::Mat;
	use rand::prelude::*;

	#[test]
	fn test_reflector_zeroes_column() {
		let rng = &mut StdRng::seed_from_u64(0);
		for n in [1, 2, 5, 31] {
			let mut col = rand_mat_f64(rng, n, 1);
			let original = col.clone();
			let norm = original.norm_l2();

			let info = make_householder_in_place(col.as_mut().col_mut(0));
			assert!((info.beta.abs() - norm).abs() < 1e-13 * norm);

			// applying the reflector to the original column yields beta e0
			let essential = col.as_ref().col(0).subrows(1, n - 1);
			let mut rhs = original.clone();
			apply_householder_on_the_left_in_place(essential, info.tau, rhs.as_mut(), Par::Seq);
			assert!((rhs[(0, 0)] - info.beta).abs() < 1e-13 * norm);
			for i in 1..n {
				assert!(rhs[(i, 0)].abs() < 1e-13 * norm);
			}
		}
	}

	#[test]
	fn test_reflector_no_tail_is_identity() {
		let mut col = Mat::<f64>::from_fn(3, 1, |i, _| if i == 0 { -2.0 } else { 0.0 });
		let info = make_householder_in_place(col.as_mut().col_mut(0));
		assert!(info.tau == f64::INFINITY);
		assert!(info.beta == -2.0);

		// tau = inf means applying the reflector is a no-op
		let essential = col.as_ref().col(0).subrows(1, 2);
		let mut rhs = Mat::<f64>::from_fn(3, 2, |i, j| (i + 3 * j) as f64);
		let expected = rhs.clone();
		apply_householder_on_the_left_in_place(essential, info.tau, rhs.as_mut(), Par::Seq);
		assert!(rhs == expected);
	}

	#[test]
	fn test_reflector_is_unitary_complex() {
		use crate::c64;
		let rng = &mut StdRng::seed_from_u64(1);
		let n = 6;
		let mut col = rand_mat_c64(rng, n, 1);
		let original = col.clone();

		let info = make_householder_in_place(col.as_mut().col_mut(0));
		let essential = col.as_ref().col(0).subrows(1, n - 1);

		// H applied twice is the identity
		let mut rhs = original.clone();
		apply_householder_on_the_left_in_place(essential, info.tau, rhs.as_mut(), Par::Seq);
		apply_householder_on_the_left_in_place(essential, info.tau, rhs.as_mut(), Par::Seq);
		assert!((&rhs - &original).norm_max() < 1e-13);

		let _ = info.beta;
		let _: c64 = original[(0, 0)];
	}
}
