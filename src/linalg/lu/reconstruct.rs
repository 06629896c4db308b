//! Reconstructing the original matrix from packed LU factors.

use crate::internal_prelude::*;

/// computes `dst = P⁻¹ * L * U` from the packed output of
/// [`lu_in_place`](super::factor::lu_in_place), recovering the decomposed
/// matrix.
///
/// # panics
///
/// panics eagerly if the dimensions do not match.
#[track_caller]
pub fn reconstruct<T: ComplexField>(dst: MatMut<'_, T>, lu: MatRef<'_, T>, perm: &Perm, par: Par) {
	assert!(all(
		lu.nrows() == lu.ncols(),
		dst.nrows() == lu.nrows(),
		dst.ncols() == lu.ncols(),
		perm.len() == lu.nrows()
	));
	let mut dst = dst;

	let l = lu.as_triangular(TriangularKind::UnitLower);
	let u = lu.as_triangular(TriangularKind::Upper);
	linalg::matmul::matmul(dst.rb_mut(), Accum::Replace, l, u, one::<T>(), par);
	perm.apply_inverse_to_rows(dst);
}

#[cfg(test)]
mod tests {
	use super::super::factor::{lu_in_place, lu_in_place_scratch, LuParams};
	use super::*;
	use crate::test_utils::*;
	use crate::Mat;
	use dyn_stack::{MemBuffer, MemStack};
	use rand::prelude::*;

	#[test]
	fn test_reconstruct_round_trip() {
		let rng = &mut StdRng::seed_from_u64(0);
		for n in [1, 4, 19, 77] {
			let a = rand_mat_f64(rng, n, n);
			let mut lu = a.clone();
			let (_, perm) = lu_in_place(
				lu.as_mut(),
				Par::Seq,
				MemStack::new(&mut MemBuffer::new(lu_in_place_scratch::<f64>(n))),
				LuParams::default(),
			);

			let mut back = Mat::<f64>::zeros(n, n);
			reconstruct(back.as_mut(), lu.as_ref(), &perm, Par::Seq);
			assert!((&back - &a).norm_max() <= 1e-13 * (n as f64) * a.norm_max());
		}
	}
}
