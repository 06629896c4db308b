//! Norm reductions over matrix views.
//!
//! The euclidean norm is accumulated in three differently scaled sums so that
//! squaring cannot overflow for values near the representable maximum, nor
//! flush to zero for subnormal inputs. The exact scale factors cancel when the
//! final sum is unscaled, so the result is not biased by the protection.

use crate::internal_prelude::*;

#[inline]
fn for_each<T: ComplexField>(mat: MatRef<'_, T>, f: &mut impl FnMut(T)) {
	for j in 0..mat.ncols() {
		for i in 0..mat.nrows() {
			f(mat.read(i, j));
		}
	}
}

/// frobenius norm of the view, without undue overflow or underflow.
pub fn norm_l2<T: ComplexField>(mat: MatRef<'_, T>) -> T::Real {
	let sml = sqrt_min_positive::<T::Real>();
	let big = sqrt_max_positive::<T::Real>();

	let mut acc_sml = zero::<T::Real>();
	let mut acc_med = zero::<T::Real>();
	let mut acc_big = zero::<T::Real>();

	for_each(mat, &mut |x: T| {
		acc_sml = acc_sml + x.mul_real(sml).abs2();
		acc_med = acc_med + x.abs2();
		acc_big = acc_big + x.mul_real(big).abs2();
	});

	if acc_sml >= one() {
		// the downscaled accumulator saw a value of magnitude >= 1 / sml, so
		// the unscaled sum may have overflowed
		acc_sml.sqrt().mul_real(sml.recip())
	} else if acc_med >= min_positive() {
		acc_med.sqrt()
	} else {
		// everything is tiny, the upscaled accumulator is the only one that
		// retained the low-order contributions
		acc_big.sqrt().mul_real(big.recip())
	}
}

/// sum of the squared absolute values of the view, assuming it neither
/// overflows nor underflows.
pub fn norm_l2_sqr<T: ComplexField>(mat: MatRef<'_, T>) -> T::Real {
	let mut acc = zero::<T::Real>();
	for_each(mat, &mut |x: T| acc = acc + x.abs2());
	acc
}

/// maximum absolute value of the real and imaginary parts of the view.
pub fn norm_max<T: ComplexField>(mat: MatRef<'_, T>) -> T::Real {
	let mut acc = zero::<T::Real>();
	for_each(mat, &mut |x: T| {
		let re = x.real().abs();
		let im = x.imag().abs();
		if re > acc {
			acc = re;
		}
		if im > acc {
			acc = im;
		}
	});
	acc
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mat;

	#[test]
	fn test_norm_l2() {
		let m = mat![
			[3.0, 0.0], //
			[0.0, 4.0],
		];
		assert!((norm_l2(m.as_ref()) - 5.0).abs() < 1e-15);
		assert!(norm_l2(m.as_ref().transpose()) == norm_l2(m.as_ref()));
	}

	#[test]
	fn test_norm_l2_extreme_magnitudes() {
		let big = mat![[1e200, 1e200]];
		let norm = norm_l2(big.as_ref());
		assert!(norm.is_finite());
		assert!((norm - 1e200 * core::f64::consts::SQRT_2).abs() < 1e186);

		let tiny = mat![[1e-200, 1e-200]];
		let norm = norm_l2(tiny.as_ref());
		assert!(norm > 0.0);
		assert!((norm - 1e-200 * core::f64::consts::SQRT_2).abs() < 1e-214);
	}

	#[test]
	fn test_norm_max() {
		use crate::c64;
		let m = mat![[c64::new(1.0, -7.0), c64::new(2.0, 3.0)]];
		assert!(norm_max(m.as_ref()) == 7.0);
	}
}
