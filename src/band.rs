//! Owning band matrix container.
//!
//! A band matrix with `sub` subdiagonals and `sup` superdiagonals stores only
//! the `sub + sup + 1` diagonals, packed column by column: the entry at
//! `(i, j)` lives at row `sup + i - j` of column `j` of the packed buffer.
//! That mapping is affine in `i` and `j`, so the packed storage is just
//! another strided layout and the whole view machinery applies to it
//! unchanged: `row_stride = 1`, `col_stride = sub + sup`, with the pointer
//! offset to the main diagonal of the first column.

use crate::internal_prelude::*;
use crate::Mat;

/// owning band matrix in packed storage.
pub struct BandMat<T> {
	storage: Mat<T>,
	nrows: usize,
	ncols: usize,
	extent: BandExtent,
}

impl<T: ComplexField> BandMat<T> {
	/// creates a band matrix filled with zeros.
	#[track_caller]
	pub fn zeros(nrows: usize, ncols: usize, extent: BandExtent) -> Self {
		assert!(all(extent.sub < nrows.max(1), extent.sup < ncols.max(1)));
		Self {
			storage: Mat::zeros(extent.sub + extent.sup + 1, ncols),
			nrows,
			ncols,
			extent,
		}
	}

	/// creates a band matrix filled with the results of `f`, called once per
	/// stored entry.
	pub fn from_fn(nrows: usize, ncols: usize, extent: BandExtent, f: impl FnMut(usize, usize) -> T) -> Self {
		let mut f = f;
		let mut this = Self::zeros(nrows, ncols, extent);
		{
			let mut view = this.as_mut();
			for j in 0..ncols {
				let lo = j.saturating_sub(extent.sup);
				let hi = Ord::min(nrows, j + extent.sub + 1);
				for i in lo..hi {
					view.write(i, j, f(i, j));
				}
			}
		}
		this
	}

	#[inline]
	pub fn nrows(&self) -> usize {
		self.nrows
	}

	#[inline]
	pub fn ncols(&self) -> usize {
		self.ncols
	}

	#[inline]
	pub fn extent(&self) -> BandExtent {
		self.extent
	}

	/// view over the band matrix; entries outside the band read as zero.
	#[inline]
	pub fn as_ref(&self) -> MatRef<'_, T> {
		let ldab = (self.extent.sub + self.extent.sup + 1) as isize;
		let ptr = if self.ncols == 0 {
			self.storage.as_ptr()
		} else {
			unsafe { self.storage.as_ptr().offset(self.extent.sup as isize) }
		};
		// for a pure diagonal matrix the column stride degenerates to zero,
		// which is fine: only addresses with i == j are ever formed, and the
		// structure tag gates every other access
		unsafe { MatRef::from_raw_parts(ptr, self.nrows, self.ncols, 1, ldab - 1).as_band(self.extent) }
	}

	/// mutable view over the band matrix; writes outside the band are a
	/// programming error, checked in debug builds.
	#[inline]
	pub fn as_mut(&mut self) -> MatMut<'_, T> {
		let ldab = (self.extent.sub + self.extent.sup + 1) as isize;
		let extent = self.extent;
		let ptr = if self.ncols == 0 {
			self.storage.as_ptr_mut()
		} else {
			unsafe { self.storage.as_ptr_mut().offset(extent.sup as isize) }
		};
		unsafe {
			let mut full = MatMut::from_raw_parts_mut(ptr, self.nrows, self.ncols, 1, ldab - 1);
			full.structure = Structure::Band(extent);
			full
		}
	}

	/// copies the band matrix into a dense [`Mat`], with explicit zeros
	/// outside the band.
	#[inline]
	pub fn to_dense(&self) -> Mat<T> {
		self.as_ref().to_owned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_band_addressing() {
		// tridiagonal 5x5
		let extent = BandExtent { sub: 1, sup: 1 };
		let band = BandMat::from_fn(5, 5, extent, |i, j| (10 * i + j) as f64);
		let view = band.as_ref();

		for j in 0..5usize {
			for i in 0..5usize {
				let expected = if i.abs_diff(j) <= 1 { (10 * i + j) as f64 } else { 0.0 };
				assert!(view.read(i, j) == expected);
			}
		}

		// packed storage holds one column of the band per matrix column
		assert!(view.row_stride() == 1);
		assert!(view.col_stride() == 2);
	}

	#[test]
	fn test_band_to_dense_rectangular() {
		let extent = BandExtent { sub: 2, sup: 0 };
		let band = BandMat::from_fn(6, 4, extent, |i, j| (i + j) as f64 + 1.0);
		let dense = band.to_dense();
		assert!(dense[(0, 1)] == 0.0);
		assert!(dense[(2, 0)] == 3.0);
		assert!(dense[(5, 2)] == 0.0);
		assert!(dense[(4, 3)] == 8.0);
	}
}
