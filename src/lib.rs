//! `stria` is a dense linear algebra library for real and complex matrices in
//! full, band, triangular, symmetric and Hermitian storage.
//!
//! Every algorithm operates on non-owning strided views ([`MatRef`]/[`MatMut`]),
//! so row-major, column-major, transposed, conjugated, reversed and sub-ranged
//! matrices all go through a single uniform code path without copying. The
//! owning container [`Mat`] exposes exactly one such view over a cache-line
//! aligned column-major buffer.
//!
//! The decomposition engines live in [`linalg`]:
//! - [`linalg::lu`]: partial pivoting $PA = LU$,
//! - [`linalg::qr`]: Householder $A = QR$, with and without column pivoting,
//! - [`linalg::svd`]: one-sided Jacobi singular value decomposition,
//! - [`linalg::rank_update`]: triangular rank-$k$ updates,
//! - [`linalg::matmul`]: matrix products with runtime backend dispatch.
//!
//! Decompositions never fail: a singular or rank-deficient input runs to
//! completion and the deficiency is observable in the result (zero diagonal
//! entries of $U$, small trailing diagonal of $R$). Dimension mismatches, on
//! the other hand, are caller contract violations and panic eagerly at the
//! entry point of the violated operation, before any data is touched.
//!
//! # Example
//!
//! ```
//! use stria::prelude::*;
//! use stria::linalg::lu;
//! use dyn_stack::{MemBuffer, MemStack};
//!
//! let a = mat![
//! 	[4.0, 3.0], //
//! 	[6.0, 3.0],
//! ];
//!
//! let mut factors = a.clone();
//! let (info, perm) = lu::factor::lu_in_place(
//! 	factors.as_mut(),
//! 	Par::Seq,
//! 	MemStack::new(&mut MemBuffer::new(lu::factor::lu_in_place_scratch::<f64>(2))),
//! 	Default::default(),
//! );
//! assert!(info.zero_pivot.is_none());
//! assert!(lu::determinant(factors.as_ref(), &perm).abs() > 0.0);
//! ```
#![allow(non_snake_case)]
#![allow(clippy::too_many_arguments)]

pub(crate) use equator::{assert, debug_assert};

#[macro_use]
pub mod macros;

pub mod traits;

pub mod layout;

pub mod col;
pub mod row;

pub mod mat;

pub mod band;

pub mod perm;

pub mod linalg;

pub mod ops;

pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use band::BandMat;
pub use col::{ColMut, ColRef};
pub use layout::{BandExtent, MatLayout, Order, Structure, TriangularKind};
pub use mat::{Mat, MatMut, MatRef};
pub use perm::Perm;
pub use row::{RowMut, RowRef};
pub use traits::{ComplexField, RealField};

/// 32-bit complex floating point type.
#[allow(non_camel_case_types)]
pub type c32 = num_complex::Complex<f32>;
/// 64-bit complex floating point type.
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

/// whether a view's elements are implicitly conjugated when read or written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conj {
	No,
	Yes,
}

impl Conj {
	#[inline]
	pub fn is_conj(self) -> bool {
		matches!(self, Conj::Yes)
	}

	#[inline]
	pub fn compose(self, other: Conj) -> Conj {
		if self == other {
			Conj::No
		} else {
			Conj::Yes
		}
	}

	/// applies the conjugation to a scalar.
	#[inline(always)]
	pub fn apply<T: ComplexField>(self, value: T) -> T {
		match self {
			Conj::No => value,
			Conj::Yes => value.conj(),
		}
	}
}

/// whether a kernel overwrites its accumulator or adds to it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Accum {
	/// the accumulator is overwritten, its previous contents are never read.
	Replace,
	/// the result is added to the accumulator.
	Add,
}

/// parallelism policy threaded through the expensive entry points.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Par {
	/// sequential execution on the calling thread.
	Seq,
	/// execution on the global rayon pool with the given number of threads.
	#[cfg(feature = "rayon")]
	Rayon(core::num::NonZeroUsize),
}

impl Par {
	/// rayon parallelism with `nthreads` threads, or the pool's current thread
	/// count when `nthreads` is zero.
	#[cfg(feature = "rayon")]
	#[inline]
	pub fn rayon(nthreads: usize) -> Self {
		if nthreads == 0 {
			Par::Rayon(core::num::NonZeroUsize::new(rayon::current_num_threads()).unwrap())
		} else {
			Par::Rayon(core::num::NonZeroUsize::new(nthreads).unwrap())
		}
	}

	/// number of threads this policy may use.
	#[inline]
	pub fn degree(&self) -> usize {
		match self {
			Par::Seq => 1,
			#[cfg(feature = "rayon")]
			Par::Rayon(nthreads) => nthreads.get(),
		}
	}
}

/// commonly used items.
pub mod prelude {
	pub use crate::linalg::matmul::matmul;
	pub use crate::mat;
	pub use crate::traits::{ComplexField, RealField};
	pub use crate::{c32, c64, Accum, BandMat, ColMut, ColRef, Conj, Mat, MatMut, MatRef, Par, Perm, RowMut, RowRef};
}

pub(crate) mod internal_prelude {
	pub(crate) use crate::col::{ColMut, ColRef};
	pub(crate) use crate::layout::{BandExtent, MatLayout, Order, Structure, TriangularKind};
	pub(crate) use crate::mat::{Mat, MatMut, MatRef};
	#[allow(unused_imports)]
	pub(crate) use crate::perm::Perm;
	pub(crate) use crate::row::{RowMut, RowRef};
	#[allow(unused_imports)]
	pub(crate) use crate::traits::{
		eps, from_f64, from_real, infinity, min_positive, nan, one, sqrt_max_positive, sqrt_min_positive, zero, ComplexField, RealField,
	};
	#[allow(unused_imports)]
	pub(crate) use crate::utils::thread::join_raw;
	pub(crate) use crate::{assert, debug_assert};
	pub(crate) use crate::{linalg, Accum, Conj, Par};
	#[allow(unused_imports)]
	pub(crate) use dyn_stack::{MemStack, StackReq};
	pub(crate) use reborrow::*;
}
