//! Mutable matrix views.

use crate::col::ColMut;
use crate::internal_prelude::*;
use crate::row::RowMut;
use core::marker::PhantomData;
use core::ptr::NonNull;

/// mutable view over a matrix.
///
/// a mutable view is the unique handle over the memory it references for as
/// long as it lives; it is not `Copy`, and is reborrowed through the
/// [`reborrow`] traits instead.
pub struct MatMut<'a, T> {
	pub(crate) ptr: NonNull<T>,
	pub(crate) nrows: usize,
	pub(crate) ncols: usize,
	pub(crate) layout: MatLayout,
	pub(crate) structure: Structure,
	pub(crate) __marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for MatMut<'_, T> {}
unsafe impl<T: Sync> Sync for MatMut<'_, T> {}

impl<'short, T> Reborrow<'short> for MatMut<'_, T> {
	type Target = MatRef<'short, T>;

	#[inline]
	fn rb(&'short self) -> Self::Target {
		MatRef {
			ptr: self.ptr,
			nrows: self.nrows,
			ncols: self.ncols,
			layout: self.layout,
			structure: self.structure,
			__marker: PhantomData,
		}
	}
}
impl<'short, T> ReborrowMut<'short> for MatMut<'_, T> {
	type Target = MatMut<'short, T>;

	#[inline]
	fn rb_mut(&'short mut self) -> Self::Target {
		MatMut {
			ptr: self.ptr,
			nrows: self.nrows,
			ncols: self.ncols,
			layout: self.layout,
			structure: self.structure,
			__marker: PhantomData,
		}
	}
}
impl<'a, T> IntoConst for MatMut<'a, T> {
	type Target = MatRef<'a, T>;

	#[inline]
	fn into_const(self) -> Self::Target {
		MatRef {
			ptr: self.ptr,
			nrows: self.nrows,
			ncols: self.ncols,
			layout: self.layout,
			structure: self.structure,
			__marker: PhantomData,
		}
	}
}

impl<'a, T> MatMut<'a, T> {
	/// creates a full mutable view over the strided region starting at `ptr`.
	///
	/// # Safety
	///
	/// every address reachable as `ptr + i * row_stride + j * col_stride` for
	/// `(i, j)` in `[0, nrows) × [0, ncols)` must be valid for reads and writes
	/// for the lifetime `'a`, distinct indices must map to distinct addresses,
	/// and the region must not be aliased by any other live reference.
	#[inline]
	pub unsafe fn from_raw_parts_mut(ptr: *mut T, nrows: usize, ncols: usize, row_stride: isize, col_stride: isize) -> Self {
		Self::from_raw_parts_with_conj(ptr, nrows, ncols, row_stride, col_stride, Conj::No)
	}

	#[inline]
	pub(crate) unsafe fn from_raw_parts_with_conj(ptr: *mut T, nrows: usize, ncols: usize, row_stride: isize, col_stride: isize, conj: Conj) -> Self {
		Self {
			ptr: NonNull::new_unchecked(ptr),
			nrows,
			ncols,
			layout: MatLayout::new(row_stride, col_stride, conj),
			structure: Structure::Full,
			__marker: PhantomData,
		}
	}

	/// creates a full column-major mutable view over a slice.
	#[inline]
	#[track_caller]
	pub fn from_column_major_slice_mut(slice: &'a mut [T], nrows: usize, ncols: usize) -> Self {
		assert!(nrows.checked_mul(ncols) == Some(slice.len()));
		unsafe { Self::from_raw_parts_mut(slice.as_mut_ptr(), nrows, ncols, 1, nrows.max(1) as isize) }
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
	pub fn as_ptr_mut(&mut self) -> *mut T {
		self.ptr.as_ptr()
	}

	#[inline(always)]
	pub(crate) unsafe fn ptr_at_mut(&mut self, i: usize, j: usize) -> *mut T {
		self.ptr.as_ptr().offset(i as isize * self.layout.row_stride + j as isize * self.layout.col_stride)
	}

	#[inline]
	pub fn transpose_mut(self) -> Self {
		Self {
			nrows: self.ncols,
			ncols: self.nrows,
			layout: self.layout.transpose(),
			structure: self.structure.transpose(),
			..self
		}
	}

	#[inline]
	pub fn conjugate_mut(self) -> Self {
		Self {
			layout: self.layout.conjugate(),
			..self
		}
	}

	#[inline]
	#[track_caller]
	pub fn submatrix_mut(self, row_start: usize, col_start: usize, nrows: usize, ncols: usize) -> Self {
		debug_assert!(self.structure.is_full());
		debug_assert!(all(
			row_start <= self.nrows,
			col_start <= self.ncols,
			nrows <= self.nrows - row_start,
			ncols <= self.ncols - col_start,
		));
		let ptr = unsafe {
			NonNull::new_unchecked(
				self.ptr
					.as_ptr()
					.offset(row_start as isize * self.layout.row_stride + col_start as isize * self.layout.col_stride),
			)
		};
		Self {
			ptr,
			nrows,
			ncols,
			..self
		}
	}

	#[inline]
	#[track_caller]
	pub fn subrows_mut(self, start: usize, nrows: usize) -> Self {
		let ncols = self.ncols;
		self.submatrix_mut(start, 0, nrows, ncols)
	}

	#[inline]
	#[track_caller]
	pub fn subcols_mut(self, start: usize, ncols: usize) -> Self {
		let nrows = self.nrows;
		self.submatrix_mut(0, start, nrows, ncols)
	}

	/// splits the view into four disjoint mutable quadrants at `(i, j)`, in
	/// the order (top-left, top-right, bottom-left, bottom-right).
	#[inline]
	#[track_caller]
	pub fn split_at_mut(self, i: usize, j: usize) -> (Self, Self, Self, Self) {
		debug_assert!(self.structure.is_full());
		debug_assert!(all(i <= self.nrows, j <= self.ncols));
		let layout = self.layout;
		let structure = self.structure;
		let (nrows, ncols) = (self.nrows, self.ncols);
		let ptr = self.ptr.as_ptr();
		let quadrant = |r: usize, c: usize, m: usize, n: usize| unsafe {
			MatMut::<'a, T> {
				ptr: NonNull::new_unchecked(ptr.offset(r as isize * layout.row_stride + c as isize * layout.col_stride)),
				nrows: m,
				ncols: n,
				layout,
				structure,
				__marker: PhantomData,
			}
		};
		(
			quadrant(0, 0, i, j),
			quadrant(0, j, i, ncols - j),
			quadrant(i, 0, nrows - i, j),
			quadrant(i, j, nrows - i, ncols - j),
		)
	}

	#[inline]
	#[track_caller]
	pub fn split_at_row_mut(self, i: usize) -> (Self, Self) {
		let j = self.ncols;
		let (top, _, bot, _) = self.split_at_mut(i, j);
		(top, bot)
	}

	#[inline]
	#[track_caller]
	pub fn split_at_col_mut(self, j: usize) -> (Self, Self) {
		let i = self.nrows;
		let (left, right, _, _) = self.split_at_mut(i, j);
		(left, right)
	}

	/// mutable view over the `j`-th column.
	#[inline]
	#[track_caller]
	pub fn col_mut(self, j: usize) -> ColMut<'a, T> {
		debug_assert!(self.structure.is_full());
		debug_assert!(j < self.ncols);
		ColMut {
			ptr: unsafe { NonNull::new_unchecked(self.ptr.as_ptr().offset(j as isize * self.layout.col_stride)) },
			nrows: self.nrows,
			stride: self.layout.row_stride,
			conj: self.layout.conj,
			__marker: PhantomData,
		}
	}

	/// mutable view over the `i`-th row.
	#[inline]
	#[track_caller]
	pub fn row_mut(self, i: usize) -> RowMut<'a, T> {
		debug_assert!(self.structure.is_full());
		debug_assert!(i < self.nrows);
		RowMut {
			ptr: unsafe { NonNull::new_unchecked(self.ptr.as_ptr().offset(i as isize * self.layout.row_stride)) },
			ncols: self.ncols,
			stride: self.layout.col_stride,
			conj: self.layout.conj,
			__marker: PhantomData,
		}
	}

	/// two disjoint mutable views over the rows at `a` and `b`.
	#[inline]
	#[track_caller]
	pub fn two_rows_mut(self, a: usize, b: usize) -> (RowMut<'a, T>, RowMut<'a, T>) {
		assert!(all(a < self.nrows, b < self.nrows, a != b));
		let layout = self.layout;
		let ncols = self.ncols;
		let ptr = self.ptr.as_ptr();
		unsafe {
			let row = |i: usize| RowMut::<'a, T> {
				ptr: NonNull::new_unchecked(ptr.offset(i as isize * layout.row_stride)),
				ncols,
				stride: layout.col_stride,
				conj: layout.conj,
				__marker: PhantomData,
			};
			(row(a), row(b))
		}
	}

	/// two disjoint mutable views over the columns at `a` and `b`.
	#[inline]
	#[track_caller]
	pub fn two_cols_mut(self, a: usize, b: usize) -> (ColMut<'a, T>, ColMut<'a, T>) {
		assert!(all(a < self.ncols, b < self.ncols, a != b));
		let layout = self.layout;
		let nrows = self.nrows;
		let ptr = self.ptr.as_ptr();
		unsafe {
			let col = |j: usize| ColMut::<'a, T> {
				ptr: NonNull::new_unchecked(ptr.offset(j as isize * layout.col_stride)),
				nrows,
				stride: layout.row_stride,
				conj: layout.conj,
				__marker: PhantomData,
			};
			(col(a), col(b))
		}
	}
}

impl<'a, T: ComplexField> MatMut<'a, T> {
	/// reads the element at `(i, j)`, applying the conjugation flag and the
	/// structure tag.
	#[inline(always)]
	#[track_caller]
	pub fn read(&self, i: usize, j: usize) -> T {
		self.rb().read(i, j)
	}

	/// writes `value` at `(i, j)`, storing its conjugate when the view is
	/// conjugated so that a subsequent read returns `value`.
	///
	/// the position must be explicitly stored by the view's structure; this is
	/// checked in debug builds only.
	#[inline(always)]
	#[track_caller]
	pub fn write(&mut self, i: usize, j: usize, value: T) {
		debug_assert!(all(i < self.nrows, j < self.ncols));
		debug_assert!(self.structure.contains(i, j));
		let value = self.layout.conj.apply(value);
		unsafe { *self.ptr_at_mut(i, j) = value };
	}

	/// fills the view with `value`.
	#[inline]
	pub fn fill(&mut self, value: T) {
		debug_assert!(self.structure.is_full());
		for j in 0..self.ncols {
			for i in 0..self.nrows {
				self.write(i, j, value);
			}
		}
	}

	/// copies `src` into `self`, resolving the source's conjugation flag and
	/// structure tag.
	#[track_caller]
	pub fn copy_from(&mut self, src: MatRef<'_, T>) {
		assert!(all(self.nrows == src.nrows(), self.ncols == src.ncols()));
		debug_assert!(self.structure.is_full());
		for j in 0..self.ncols {
			for i in 0..self.nrows {
				self.write(i, j, src.read(i, j));
			}
		}
	}

	/// frobenius norm, without undue overflow or underflow.
	#[inline]
	pub fn norm_l2(&self) -> T::Real {
		linalg::reductions::norm_l2(self.rb())
	}

	/// maximum absolute value of the real and imaginary parts.
	#[inline]
	pub fn norm_max(&self) -> T::Real {
		linalg::reductions::norm_max(self.rb())
	}
}
