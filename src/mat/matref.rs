//! Immutable matrix views.

use crate::col::ColRef;
use crate::internal_prelude::*;
use crate::row::RowRef;
use core::marker::PhantomData;
use core::ptr::NonNull;

/// immutable view over a matrix, described by a pointer, extents, a strided
/// storage descriptor and a structure tag.
///
/// the view never owns the memory it references; its lifetime is bounded by
/// the owning container or by the caller-supplied buffer.
pub struct MatRef<'a, T> {
	pub(crate) ptr: NonNull<T>,
	pub(crate) nrows: usize,
	pub(crate) ncols: usize,
	pub(crate) layout: MatLayout,
	pub(crate) structure: Structure,
	pub(crate) __marker: PhantomData<&'a T>,
}

impl<T> Clone for MatRef<'_, T> {
	#[inline]
	fn clone(&self) -> Self {
		*self
	}
}
impl<T> Copy for MatRef<'_, T> {}

unsafe impl<T: Sync> Send for MatRef<'_, T> {}
unsafe impl<T: Sync> Sync for MatRef<'_, T> {}

impl<'short, T> Reborrow<'short> for MatRef<'_, T> {
	type Target = MatRef<'short, T>;

	#[inline]
	fn rb(&'short self) -> Self::Target {
		*self
	}
}
impl<'short, T> ReborrowMut<'short> for MatRef<'_, T> {
	type Target = MatRef<'short, T>;

	#[inline]
	fn rb_mut(&'short mut self) -> Self::Target {
		*self
	}
}
impl<T> IntoConst for MatRef<'_, T> {
	type Target = Self;

	#[inline]
	fn into_const(self) -> Self::Target {
		self
	}
}

impl<'a, T> MatRef<'a, T> {
	/// creates a full view over the strided region starting at `ptr`.
	///
	/// # Safety
	///
	/// every address reachable as `ptr + i * row_stride + j * col_stride` for
	/// `(i, j)` in `[0, nrows) × [0, ncols)` must be valid for reads for the
	/// lifetime `'a`.
	#[inline]
	pub unsafe fn from_raw_parts(ptr: *const T, nrows: usize, ncols: usize, row_stride: isize, col_stride: isize) -> Self {
		Self::from_raw_parts_with_conj(ptr, nrows, ncols, row_stride, col_stride, Conj::No)
	}

	#[inline]
	pub(crate) unsafe fn from_raw_parts_with_conj(ptr: *const T, nrows: usize, ncols: usize, row_stride: isize, col_stride: isize, conj: Conj) -> Self {
		Self {
			ptr: NonNull::new_unchecked(ptr as *mut T),
			nrows,
			ncols,
			layout: MatLayout::new(row_stride, col_stride, conj),
			structure: Structure::Full,
			__marker: PhantomData,
		}
	}

	/// creates a full column-major view over a slice.
	#[inline]
	#[track_caller]
	pub fn from_column_major_slice(slice: &'a [T], nrows: usize, ncols: usize) -> Self {
		assert!(nrows.checked_mul(ncols) == Some(slice.len()));
		unsafe { Self::from_raw_parts(slice.as_ptr(), nrows, ncols, 1, nrows.max(1) as isize) }
	}

	/// creates a full row-major view over a slice.
	#[inline]
	#[track_caller]
	pub fn from_row_major_slice(slice: &'a [T], nrows: usize, ncols: usize) -> Self {
		assert!(nrows.checked_mul(ncols) == Some(slice.len()));
		unsafe { Self::from_raw_parts(slice.as_ptr(), nrows, ncols, ncols.max(1) as isize, 1) }
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
	pub fn row_stride(&self) -> isize {
		self.layout.row_stride
	}

	#[inline]
	pub fn col_stride(&self) -> isize {
		self.layout.col_stride
	}

	#[inline]
	pub fn conj(&self) -> Conj {
		self.layout.conj
	}

	#[inline]
	pub fn layout(&self) -> MatLayout {
		self.layout
	}

	#[inline]
	pub fn structure(&self) -> Structure {
		self.structure
	}

	#[inline]
	pub fn order(&self) -> Order {
		self.layout.order()
	}

	/// whether the elements of each column are contiguous in memory.
	#[inline]
	pub fn is_col_contiguous(&self) -> bool {
		self.layout.is_col_contiguous()
	}

	/// whether the elements of each row are contiguous in memory.
	#[inline]
	pub fn is_row_contiguous(&self) -> bool {
		self.layout.is_row_contiguous()
	}

	#[inline]
	pub fn as_ptr(&self) -> *const T {
		self.ptr.as_ptr()
	}

	#[inline(always)]
	pub(crate) unsafe fn ptr_at(&self, i: usize, j: usize) -> *const T {
		self.ptr.as_ptr().offset(i as isize * self.layout.row_stride + j as isize * self.layout.col_stride)
	}

	/// swaps the roles of rows and columns. O(1), swaps the strides and
	/// transposes the structure tag.
	#[inline]
	pub fn transpose(self) -> Self {
		Self {
			nrows: self.ncols,
			ncols: self.nrows,
			layout: self.layout.transpose(),
			structure: self.structure.transpose(),
			..self
		}
	}

	/// toggles the conjugation flag without touching the data.
	#[inline]
	pub fn conjugate(self) -> Self {
		Self {
			layout: self.layout.conjugate(),
			..self
		}
	}

	/// conjugate transpose.
	#[inline]
	pub fn adjoint(self) -> Self {
		self.transpose().conjugate()
	}

	/// view over the same data with the rows in reverse order.
	#[inline]
	pub fn reverse_rows(self) -> Self {
		debug_assert!(self.structure.is_full());
		let ptr = if self.nrows == 0 {
			self.ptr
		} else {
			unsafe { NonNull::new_unchecked(self.ptr.as_ptr().offset((self.nrows - 1) as isize * self.layout.row_stride)) }
		};
		Self {
			ptr,
			layout: MatLayout::new(-self.layout.row_stride, self.layout.col_stride, self.layout.conj),
			..self
		}
	}

	/// view over the same data with the columns in reverse order.
	#[inline]
	pub fn reverse_cols(self) -> Self {
		debug_assert!(self.structure.is_full());
		let ptr = if self.ncols == 0 {
			self.ptr
		} else {
			unsafe { NonNull::new_unchecked(self.ptr.as_ptr().offset((self.ncols - 1) as isize * self.layout.col_stride)) }
		};
		Self {
			ptr,
			layout: MatLayout::new(self.layout.row_stride, -self.layout.col_stride, self.layout.conj),
			..self
		}
	}

	/// view over the rectangle starting at `(row_start, col_start)` with the
	/// given extents. O(1), adjusts the pointer and keeps the strides.
	#[inline]
	#[track_caller]
	pub fn submatrix(self, row_start: usize, col_start: usize, nrows: usize, ncols: usize) -> Self {
		debug_assert!(self.structure.is_full());
		debug_assert!(all(
			row_start <= self.nrows,
			col_start <= self.ncols,
			nrows <= self.nrows - row_start,
			ncols <= self.ncols - col_start,
		));
		Self {
			ptr: unsafe { NonNull::new_unchecked(self.ptr_at(row_start, col_start) as *mut T) },
			nrows,
			ncols,
			..self
		}
	}

	#[inline]
	#[track_caller]
	pub fn subrows(self, start: usize, nrows: usize) -> Self {
		self.submatrix(start, 0, nrows, self.ncols)
	}

	#[inline]
	#[track_caller]
	pub fn subcols(self, start: usize, ncols: usize) -> Self {
		self.submatrix(0, start, self.nrows, ncols)
	}

	/// splits the view into four quadrants at `(i, j)`, in the order
	/// (top-left, top-right, bottom-left, bottom-right).
	#[inline]
	#[track_caller]
	pub fn split_at(self, i: usize, j: usize) -> (Self, Self, Self, Self) {
		debug_assert!(all(i <= self.nrows, j <= self.ncols));
		(
			self.submatrix(0, 0, i, j),
			self.submatrix(0, j, i, self.ncols - j),
			self.submatrix(i, 0, self.nrows - i, j),
			self.submatrix(i, j, self.nrows - i, self.ncols - j),
		)
	}

	#[inline]
	#[track_caller]
	pub fn split_at_row(self, i: usize) -> (Self, Self) {
		(self.subrows(0, i), self.subrows(i, self.nrows - i))
	}

	#[inline]
	#[track_caller]
	pub fn split_at_col(self, j: usize) -> (Self, Self) {
		(self.subcols(0, j), self.subcols(j, self.ncols - j))
	}

	/// view over the `j`-th column.
	#[inline]
	#[track_caller]
	pub fn col(self, j: usize) -> ColRef<'a, T> {
		debug_assert!(self.structure.is_full());
		debug_assert!(j < self.ncols);
		ColRef {
			ptr: unsafe { NonNull::new_unchecked(self.ptr_at(0, j) as *mut T) },
			nrows: self.nrows,
			stride: self.layout.row_stride,
			conj: self.layout.conj,
			__marker: PhantomData,
		}
	}

	/// view over the `i`-th row.
	#[inline]
	#[track_caller]
	pub fn row(self, i: usize) -> RowRef<'a, T> {
		debug_assert!(self.structure.is_full());
		debug_assert!(i < self.nrows);
		RowRef {
			ptr: unsafe { NonNull::new_unchecked(self.ptr_at(i, 0) as *mut T) },
			ncols: self.ncols,
			stride: self.layout.col_stride,
			conj: self.layout.conj,
			__marker: PhantomData,
		}
	}

	/// view over the main diagonal.
	#[inline]
	pub fn diagonal(self) -> ColRef<'a, T> {
		debug_assert!(self.structure.is_full());
		ColRef {
			ptr: self.ptr,
			nrows: Ord::min(self.nrows, self.ncols),
			stride: self.layout.row_stride + self.layout.col_stride,
			conj: self.layout.conj,
			__marker: PhantomData,
		}
	}

	/// restricts the view to a triangle; entries outside it read as zero, or as
	/// one on an implicit unit diagonal. O(1).
	#[inline]
	#[track_caller]
	pub fn as_triangular(self, kind: TriangularKind) -> Self {
		debug_assert!(self.structure.is_full());
		debug_assert!(self.nrows == self.ncols);
		Self {
			structure: Structure::Triangular(kind),
			..self
		}
	}

	/// restricts the view to a band; entries outside it read as zero. O(1).
	#[inline]
	#[track_caller]
	pub fn as_band(self, extent: BandExtent) -> Self {
		debug_assert!(self.structure.is_full());
		Self {
			structure: Structure::Band(extent),
			..self
		}
	}

	/// reinterprets the view as a symmetric matrix storing the given triangle;
	/// reads of the other half are mirrored. O(1).
	#[inline]
	#[track_caller]
	pub fn as_symmetric(self, kind: TriangularKind) -> Self {
		debug_assert!(self.structure.is_full());
		debug_assert!(self.nrows == self.ncols);
		debug_assert!(matches!(kind, TriangularKind::Lower | TriangularKind::Upper));
		Self {
			structure: Structure::Symmetric(kind),
			..self
		}
	}

	/// reinterprets the view as a Hermitian matrix storing the given triangle;
	/// reads of the other half are mirrored and conjugated. O(1).
	#[inline]
	#[track_caller]
	pub fn as_hermitian(self, kind: TriangularKind) -> Self {
		debug_assert!(self.structure.is_full());
		debug_assert!(self.nrows == self.ncols);
		debug_assert!(matches!(kind, TriangularKind::Lower | TriangularKind::Upper));
		Self {
			structure: Structure::Hermitian(kind),
			..self
		}
	}

	/// inclusive byte address range spanned by the view.
	pub(crate) fn address_range(&self) -> (usize, usize) {
		let base = self.ptr.as_ptr() as usize;
		if self.nrows == 0 || self.ncols == 0 {
			return (base, base);
		}
		let size = core::mem::size_of::<T>();
		let r = (self.nrows - 1) as isize * self.layout.row_stride;
		let c = (self.ncols - 1) as isize * self.layout.col_stride;
		let mut lo = 0isize;
		let mut hi = 0isize;
		for off in [r, c, r + c] {
			lo = Ord::min(lo, off);
			hi = Ord::max(hi, off);
		}
		(
			base.wrapping_add_signed(lo * size as isize),
			base.wrapping_add_signed(hi * size as isize) + size - 1,
		)
	}

	/// whether the two views reference overlapping memory.
	pub(crate) fn overlaps<U>(&self, other: &MatRef<'_, U>) -> bool {
		if self.nrows == 0 || self.ncols == 0 || other.nrows == 0 || other.ncols == 0 {
			return false;
		}
		let (lo0, hi0) = self.address_range();
		let (lo1, hi1) = other.address_range();
		lo0 <= hi1 && lo1 <= hi0
	}
}

impl<'a, T: ComplexField> MatRef<'a, T> {
	/// reads the element at `(i, j)`, applying the conjugation flag and the
	/// structure tag (implicit zeros, unit diagonals and mirrored halves).
	///
	/// bounds are checked in debug builds only; out of range indices are
	/// undefined behavior in release builds.
	#[inline(always)]
	#[track_caller]
	pub fn read(&self, i: usize, j: usize) -> T {
		debug_assert!(all(i < self.nrows, j < self.ncols));
		match self.structure {
			Structure::Full => self.layout.conj.apply(unsafe { *self.ptr_at(i, j) }),
			Structure::Triangular(kind) => {
				if i == j && kind.has_unit_diag() {
					one()
				} else if kind.contains(i, j) {
					self.layout.conj.apply(unsafe { *self.ptr_at(i, j) })
				} else {
					zero()
				}
			},
			Structure::Band(extent) => {
				if extent.contains(i, j) {
					self.layout.conj.apply(unsafe { *self.ptr_at(i, j) })
				} else {
					zero()
				}
			},
			Structure::Symmetric(kind) => {
				let (i, j) = if kind.contains(i, j) { (i, j) } else { (j, i) };
				self.layout.conj.apply(unsafe { *self.ptr_at(i, j) })
			},
			Structure::Hermitian(kind) => {
				if kind.contains(i, j) {
					self.layout.conj.apply(unsafe { *self.ptr_at(i, j) })
				} else {
					self.layout.conj.apply(unsafe { *self.ptr_at(j, i) }).conj()
				}
			},
		}
	}

	/// copies the view into a newly allocated column-major [`Mat`], resolving
	/// the conjugation flag and the structure tag.
	pub fn to_owned(&self) -> Mat<T> {
		Mat::from_fn(self.nrows, self.ncols, |i, j| self.read(i, j))
	}

	/// frobenius norm, without undue overflow or underflow.
	#[inline]
	pub fn norm_l2(&self) -> T::Real {
		linalg::reductions::norm_l2(*self)
	}

	/// maximum absolute value of the real and imaginary parts.
	#[inline]
	pub fn norm_max(&self) -> T::Real {
		linalg::reductions::norm_max(*self)
	}
}

impl<T: ComplexField> PartialEq for MatRef<'_, T> {
	fn eq(&self, other: &Self) -> bool {
		if self.nrows != other.nrows || self.ncols != other.ncols {
			return false;
		}
		for j in 0..self.ncols {
			for i in 0..self.nrows {
				if self.read(i, j) != other.read(i, j) {
					return false;
				}
			}
		}
		true
	}
}

impl<T: ComplexField> core::fmt::Debug for MatRef<'_, T> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let mut rows = f.debug_list();
		for i in 0..self.nrows {
			rows.entry(&DebugRow { mat: *self, row: i });
		}
		rows.finish()
	}
}

struct DebugRow<'a, T> {
	mat: MatRef<'a, T>,
	row: usize,
}

impl<T: ComplexField> core::fmt::Debug for DebugRow<'_, T> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let mut row = f.debug_list();
		for j in 0..self.mat.ncols {
			row.entry(&self.mat.read(self.row, j));
		}
		row.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mat;

	#[test]
	fn test_view_algebra_idempotence() {
		let m = mat![
			[1.0, 2.0, 3.0], //
			[4.0, 5.0, 6.0],
		];
		let view = m.as_ref();

		let tt = view.transpose().transpose();
		assert!(tt.as_ptr() == view.as_ptr());
		assert!(all(
			tt.nrows() == view.nrows(),
			tt.ncols() == view.ncols(),
			tt.row_stride() == view.row_stride(),
			tt.col_stride() == view.col_stride(),
		));

		let cc = view.conjugate().conjugate();
		assert!(cc.as_ptr() == view.as_ptr());
		assert!(cc.conj() == Conj::No);

		assert!(view.transpose().read(2, 1) == 6.0);
	}

	#[test]
	fn test_subviews_share_storage() {
		let m = mat![
			[1.0, 2.0, 3.0], //
			[4.0, 5.0, 6.0],
			[7.0, 8.0, 9.0],
		];
		let view = m.as_ref();

		let sub = view.submatrix(1, 1, 2, 2);
		assert!(sub.read(0, 0) == 5.0);
		assert!(sub.read(1, 1) == 9.0);
		assert!(sub.row_stride() == view.row_stride());
		assert!(sub.col_stride() == view.col_stride());

		let rev = view.reverse_rows();
		assert!(rev.read(0, 0) == 7.0);
		assert!(rev.read(2, 2) == 3.0);
		assert!(rev.row_stride() == -view.row_stride());

		let (tl, tr, bl, br) = view.split_at(1, 2);
		assert!(tl.read(0, 1) == 2.0);
		assert!(tr.read(0, 0) == 3.0);
		assert!(bl.read(1, 0) == 7.0);
		assert!(br.read(1, 0) == 9.0);
	}

	#[test]
	fn test_structured_reads() {
		let m = mat![
			[1.0, 2.0, 3.0], //
			[4.0, 5.0, 6.0],
			[7.0, 8.0, 9.0],
		];
		let view = m.as_ref();

		let lower = view.as_triangular(TriangularKind::Lower);
		assert!(lower.read(0, 2) == 0.0);
		assert!(lower.read(2, 0) == 7.0);
		assert!(lower.read(1, 1) == 5.0);

		let unit = view.as_triangular(TriangularKind::UnitLower);
		assert!(unit.read(1, 1) == 1.0);
		assert!(unit.read(2, 1) == 8.0);

		let sym = view.as_symmetric(TriangularKind::Lower);
		assert!(sym.read(0, 2) == 7.0);
		assert!(sym.read(2, 0) == 7.0);

		let band = view.as_band(BandExtent { sub: 1, sup: 0 });
		assert!(band.read(0, 1) == 0.0);
		assert!(band.read(1, 0) == 4.0);
		assert!(band.read(2, 0) == 0.0);
	}

	#[test]
	fn test_hermitian_mirror() {
		use crate::c64;
		let m = mat![
			[c64::new(1.0, 0.0), c64::new(0.0, 0.0)], //
			[c64::new(2.0, 3.0), c64::new(4.0, 0.0)],
		];
		let herm = m.as_ref().as_hermitian(TriangularKind::Lower);
		assert!(herm.read(0, 1) == c64::new(2.0, -3.0));
		assert!(herm.read(1, 0) == c64::new(2.0, 3.0));
	}

	#[test]
	fn test_overlap_detection() {
		let m = mat![
			[1.0, 2.0, 3.0], //
			[4.0, 5.0, 6.0],
			[7.0, 8.0, 9.0],
		];
		let view = m.as_ref();
		let left = view.subcols(0, 2);
		let right = view.subcols(2, 1);
		assert!(!left.overlaps(&right));
		assert!(left.overlaps(&view.subcols(1, 2)));
		assert!(view.overlaps(&view.reverse_rows()));
	}
}
