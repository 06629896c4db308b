//! Operator overloads for matrix views and owning matrices.
//!
//! These allocate their result and are meant for convenience (tests, examples,
//! small problems); the in-place kernels in [`crate::linalg`] are the
//! performance surface.

use crate::internal_prelude::*;
use core::ops::{Add, Mul, Neg, Sub};

#[track_caller]
fn add_impl<T: ComplexField>(lhs: MatRef<'_, T>, rhs: MatRef<'_, T>) -> Mat<T> {
	assert!(all(lhs.nrows() == rhs.nrows(), lhs.ncols() == rhs.ncols()));
	Mat::from_fn(lhs.nrows(), lhs.ncols(), |i, j| lhs.read(i, j) + rhs.read(i, j))
}

#[track_caller]
fn sub_impl<T: ComplexField>(lhs: MatRef<'_, T>, rhs: MatRef<'_, T>) -> Mat<T> {
	assert!(all(lhs.nrows() == rhs.nrows(), lhs.ncols() == rhs.ncols()));
	Mat::from_fn(lhs.nrows(), lhs.ncols(), |i, j| lhs.read(i, j) - rhs.read(i, j))
}

#[track_caller]
fn mul_impl<T: ComplexField>(lhs: MatRef<'_, T>, rhs: MatRef<'_, T>) -> Mat<T> {
	let mut out = Mat::zeros(lhs.nrows(), rhs.ncols());
	linalg::matmul::matmul(out.as_mut(), Accum::Replace, lhs, rhs, one::<T>(), Par::Seq);
	out
}

macro_rules! impl_binop {
	($trait: ident, $method: ident, $imp: ident) => {
		impl<T: ComplexField> $trait<MatRef<'_, T>> for MatRef<'_, T> {
			type Output = Mat<T>;

			#[track_caller]
			fn $method(self, rhs: MatRef<'_, T>) -> Mat<T> {
				$imp(self, rhs)
			}
		}

		impl<T: ComplexField> $trait<&Mat<T>> for MatRef<'_, T> {
			type Output = Mat<T>;

			#[track_caller]
			fn $method(self, rhs: &Mat<T>) -> Mat<T> {
				$imp(self, rhs.as_ref())
			}
		}

		impl<T: ComplexField> $trait<MatRef<'_, T>> for &Mat<T> {
			type Output = Mat<T>;

			#[track_caller]
			fn $method(self, rhs: MatRef<'_, T>) -> Mat<T> {
				$imp(self.as_ref(), rhs)
			}
		}

		impl<T: ComplexField> $trait<&Mat<T>> for &Mat<T> {
			type Output = Mat<T>;

			#[track_caller]
			fn $method(self, rhs: &Mat<T>) -> Mat<T> {
				$imp(self.as_ref(), rhs.as_ref())
			}
		}
	};
}

impl_binop!(Add, add, add_impl);
impl_binop!(Sub, sub, sub_impl);
impl_binop!(Mul, mul, mul_impl);

impl<T: ComplexField> Neg for MatRef<'_, T> {
	type Output = Mat<T>;

	fn neg(self) -> Mat<T> {
		Mat::from_fn(self.nrows(), self.ncols(), |i, j| -self.read(i, j))
	}
}

impl<T: ComplexField> Neg for &Mat<T> {
	type Output = Mat<T>;

	fn neg(self) -> Mat<T> {
		-self.as_ref()
	}
}

/// applies the permutation to the rows of the matrix.
impl<T: ComplexField> Mul<MatRef<'_, T>> for &Perm {
	type Output = Mat<T>;

	#[track_caller]
	fn mul(self, rhs: MatRef<'_, T>) -> Mat<T> {
		let mut out = rhs.to_owned();
		self.apply_to_rows(out.as_mut());
		out
	}
}

impl<T: ComplexField> Mul<&Mat<T>> for &Perm {
	type Output = Mat<T>;

	#[track_caller]
	fn mul(self, rhs: &Mat<T>) -> Mat<T> {
		self * rhs.as_ref()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mat;

	#[test]
	fn test_ops() {
		let a = mat![
			[1.0, 2.0], //
			[3.0, 4.0],
		];
		let b = mat![
			[0.0, 1.0], //
			[1.0, 0.0],
		];

		let sum = &a + &b;
		assert!(sum == mat![[1.0, 3.0], [4.0, 4.0]]);

		let diff = &sum - &b;
		assert!(diff == a);

		let prod = &a * &b;
		assert!(prod == mat![[2.0, 1.0], [4.0, 3.0]]);

		let neg = -&a;
		assert!(neg[(1, 0)] == -3.0);

		let perm = Perm::from_transpositions(2, [(0, 1)]);
		let swapped = &perm * &a;
		assert!(swapped == mat![[3.0, 4.0], [1.0, 2.0]]);
	}
}
