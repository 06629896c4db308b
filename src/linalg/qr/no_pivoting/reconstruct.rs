//! Reconstructing the original matrix from packed QR factors.

use crate::internal_prelude::*;
use crate::linalg::householder;

/// computes `dst = Q * R` from the packed output of
/// [`qr_in_place`](super::factor::qr_in_place), recovering the decomposed
/// matrix.
///
/// # panics
///
/// panics eagerly if the dimensions do not match.
#[track_caller]
pub fn reconstruct<T: ComplexField>(dst: MatMut<'_, T>, qr: MatRef<'_, T>, taus: &[T], par: Par) {
	let m = qr.nrows();
	let n = qr.ncols();
	assert!(all(dst.nrows() == m, dst.ncols() == n, taus.len() == n));
	let mut dst = dst;

	// lay out R, then apply the packed Q to it
	dst.fill(zero());
	for j in 0..n {
		for i in 0..=Ord::min(j, m.saturating_sub(1)) {
			dst.write(i, j, qr.read(i, j));
		}
	}
	householder::apply_householder_sequence_on_the_left_in_place(qr, taus, dst, par);
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
	fn test_qr_reconstruct_round_trip() {
		let rng = &mut StdRng::seed_from_u64(0);
		for (m, n) in [(1, 1), (6, 6), (40, 13), (90, 90)] {
			let a = rand_mat_f64(rng, m, n);
			let mut qr = a.clone();
			let mut taus = vec![0.0f64; n];
			qr_in_place(
				qr.as_mut(),
				&mut taus,
				Par::Seq,
				MemStack::new(&mut MemBuffer::new(qr_in_place_scratch::<f64>(m, n))),
				QrParams::default(),
			);

			let mut back = Mat::<f64>::zeros(m, n);
			reconstruct(back.as_mut(), qr.as_ref(), &taus, Par::Seq);
			assert!((&back - &a).norm_max() <= 1e-13 * (m as f64) * a.norm_max());
		}
	}
}
