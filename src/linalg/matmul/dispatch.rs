//! Backend dispatch policy.
//!
//! [`plan`] is a pure decision function from the layout tags of the operands
//! (contiguity, stride sign, conjugation, structure, scalar type) and the
//! problem size to a kernel choice: the native recursive-blocked kernel, the
//! external accelerated kernel, or the external kernel after packing an
//! incompatible operand into a contiguous temporary. The numeric work itself
//! always happens elsewhere; this module only decides, and (behind the `accel`
//! feature) adapts view-shaped calls to the external kernel's flat
//! pointer/leading-dimension contract.

use crate::internal_prelude::*;

/// backend selection strategy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Backend {
	/// pick the backend based on the layouts and the problem size.
	#[default]
	Auto,
	/// always use the native recursive-blocked kernel.
	Native,
	/// use the external kernel whenever the layouts can be adapted to it,
	/// falling back to the native kernel otherwise.
	External,
}

/// kernel requested from the dispatch policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KernelOp {
	MatMul,
	MatVec,
	RankKUpdate,
}

/// how the external kernel should read an operand, following the usual
/// column-major convention.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExternalOp {
	/// read as stored.
	N,
	/// read transposed.
	T,
	/// read conjugate-transposed.
	C,
}

/// layout summary of one operand, as consumed by the decision function.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OperandTags {
	pub layout: MatLayout,
	/// whether every entry of the operand is backed by memory.
	pub full: bool,
}

impl OperandTags {
	#[inline]
	pub fn new(layout: MatLayout, structure: Structure) -> Self {
		Self {
			layout,
			full: structure.is_full(),
		}
	}
}

/// fully resolved external kernel invocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExternalCall {
	/// compute the transposed product with the operand roles exchanged, so
	/// that a row-major accumulator becomes column-major.
	pub swap_operands: bool,
	pub op_a: ExternalOp,
	pub op_b: ExternalOp,
	/// pack the first operand into a fresh column-major temporary (resolving
	/// its conjugation) before the call.
	pub copy_a: bool,
	/// pack the second operand into a fresh column-major temporary before the
	/// call.
	pub copy_b: bool,
}

/// kernel choice produced by the policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatmulPlan {
	Native,
	External(ExternalCall),
}

/// below this many scalar multiplications the external kernel's call overhead
/// dominates and the native kernel wins.
const EXTERNAL_THRESHOLD: usize = 32 * 32 * 32;

#[inline]
fn is_native_scalar<T: ComplexField>() -> bool {
	T::IS_NATIVE_F32 || T::IS_NATIVE_F64 || T::IS_NATIVE_C32 || T::IS_NATIVE_C64
}

/// classifies one operand of the (already column-major-normalized) product,
/// where `nrows` is the operand's logical row count.
#[inline]
fn classify(layout: MatLayout, nrows: usize, ncols: usize) -> (ExternalOp, bool) {
	let conj = layout.conj.is_conj();
	if !conj && layout.row_stride == 1 && layout.col_stride >= nrows.max(1) as isize {
		(ExternalOp::N, false)
	} else if !conj && layout.col_stride == 1 && layout.row_stride >= ncols.max(1) as isize {
		(ExternalOp::T, false)
	} else if conj && layout.col_stride == 1 && layout.row_stride >= ncols.max(1) as isize {
		(ExternalOp::C, false)
	} else {
		// the contract has no conjugate-no-transpose operation and no
		// non-contiguous operands; pack into a column-major temporary
		(ExternalOp::N, true)
	}
}

/// decides how to execute `dst = beta * dst + alpha * lhs * rhs`, given only
/// layout tags, the aliasing of the operands, and the problem size. pure:
/// equal inputs produce equal plans.
pub fn plan<T: ComplexField>(
	op: KernelOp,
	backend: Backend,
	external_available: bool,
	operands_alias: bool,
	dst: OperandTags,
	lhs: OperandTags,
	rhs: OperandTags,
	m: usize,
	n: usize,
	k: usize,
) -> MatmulPlan {
	if !external_available || backend == Backend::Native || !is_native_scalar::<T>() {
		return MatmulPlan::Native;
	}
	// a triangular accumulator is not expressible in the flat contract
	if op == KernelOp::RankKUpdate {
		return MatmulPlan::Native;
	}
	// the external kernel requires an accumulator disjoint from its inputs
	if operands_alias {
		return MatmulPlan::Native;
	}
	if !(dst.full && lhs.full && rhs.full) {
		return MatmulPlan::Native;
	}
	if backend == Backend::Auto {
		let flops = m.checked_mul(n).and_then(|mn| mn.checked_mul(k)).unwrap_or(usize::MAX);
		if flops < EXTERNAL_THRESHOLD {
			return MatmulPlan::Native;
		}
	}
	// the accumulator is written through, so its conjugation flag cannot be
	// resolved by packing
	if dst.layout.conj.is_conj() {
		return MatmulPlan::Native;
	}

	let (swap_operands, a, b, a_dims, b_dims) = if dst.layout.row_stride == 1 && dst.layout.col_stride >= m.max(1) as isize {
		(false, lhs.layout, rhs.layout, (m, k), (k, n))
	} else if dst.layout.col_stride == 1 && dst.layout.row_stride >= n.max(1) as isize {
		// dstᵀ is column-major; compute dstᵀ = alpha * rhsᵀ * lhsᵀ + beta * dstᵀ
		(true, rhs.layout.transpose(), lhs.layout.transpose(), (n, k), (k, m))
	} else {
		// a strided or reversed accumulator would need a writeback pass on top
		// of the packing; not worth it
		return MatmulPlan::Native;
	};

	let (op_a, copy_a) = classify(a, a_dims.0, a_dims.1);
	let (op_b, copy_b) = classify(b, b_dims.0, b_dims.1);

	MatmulPlan::External(ExternalCall {
		swap_operands,
		op_a,
		op_b,
		copy_a,
		copy_b,
	})
}

/// adapter between view-shaped calls and the external kernel's flat
/// `(op, dims, alpha, a, lda, b, ldb, beta, c, ldc)` contract.
#[cfg(feature = "accel")]
pub(crate) mod external {
	use super::*;

	/// invokes the external kernel on raw column-major storage.
	///
	/// # Safety
	///
	/// the pointers must reference properly sized buffers for the given
	/// operations, dimensions and leading strides, and `c` must not alias `a`
	/// or `b`.
	pub unsafe fn gemm_flat<T: ComplexField>(
		op_a: ExternalOp,
		op_b: ExternalOp,
		m: usize,
		n: usize,
		k: usize,
		alpha: T,
		a: *const T,
		lda: usize,
		b: *const T,
		ldb: usize,
		read_c: bool,
		c: *mut T,
		ldc: usize,
		par: Par,
	) {
		let stride = |op: ExternalOp, ld: usize| -> (isize, isize, bool) {
			match op {
				ExternalOp::N => (1, ld as isize, false),
				ExternalOp::T => (ld as isize, 1, false),
				ExternalOp::C => (ld as isize, 1, true),
			}
		};
		let (a_rs, a_cs, conj_a) = stride(op_a, lda);
		let (b_rs, b_cs, conj_b) = stride(op_b, ldb);

		let parallelism = match par {
			Par::Seq => gemm::Parallelism::None,
			#[cfg(feature = "rayon")]
			Par::Rayon(nthreads) => gemm::Parallelism::Rayon(nthreads.get()),
		};

		macro_rules! gemm_call {
			($ty: ty) => {{
				gemm::gemm::<$ty>(
					m,
					n,
					k,
					c as *mut $ty,
					ldc as isize,
					1,
					read_c,
					a as *const $ty,
					a_cs,
					a_rs,
					b as *const $ty,
					b_cs,
					b_rs,
					if read_c { 1.0.into() } else { core::mem::zeroed() },
					core::mem::transmute_copy::<T, $ty>(&alpha),
					false,
					conj_a,
					conj_b,
					parallelism,
				);
				return;
			}};
		}

		if T::IS_NATIVE_F64 {
			gemm_call!(f64);
		}
		if T::IS_NATIVE_F32 {
			gemm_call!(f32);
		}
		if T::IS_NATIVE_C64 {
			gemm_call!(num_complex::Complex<f64>);
		}
		if T::IS_NATIVE_C32 {
			gemm_call!(num_complex::Complex<f32>);
		}
		unreachable!();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn col_major(conj: Conj) -> OperandTags {
		OperandTags::new(MatLayout::new(1, 64, conj), Structure::Full)
	}

	fn row_major(conj: Conj) -> OperandTags {
		OperandTags::new(MatLayout::new(64, 1, conj), Structure::Full)
	}

	fn strided() -> OperandTags {
		OperandTags::new(MatLayout::new(2, 128, Conj::No), Structure::Full)
	}

	#[test]
	fn test_plan_is_pure() {
		let args = (col_major(Conj::No), row_major(Conj::Yes), strided());
		let p0 = plan::<f64>(KernelOp::MatMul, Backend::Auto, true, false, args.0, args.1, args.2, 64, 64, 64);
		let p1 = plan::<f64>(KernelOp::MatMul, Backend::Auto, true, false, args.0, args.1, args.2, 64, 64, 64);
		assert!(p0 == p1);
	}

	#[test]
	fn test_plan_small_problems_stay_native() {
		let p = plan::<f64>(
			KernelOp::MatMul,
			Backend::Auto,
			true,
			false,
			col_major(Conj::No),
			col_major(Conj::No),
			col_major(Conj::No),
			4,
			4,
			4,
		);
		assert!(p == MatmulPlan::Native);
	}

	#[test]
	fn test_plan_layouts() {
		// compatible layouts go to the external kernel directly
		let p = plan::<f64>(
			KernelOp::MatMul,
			Backend::Auto,
			true,
			false,
			col_major(Conj::No),
			row_major(Conj::No),
			col_major(Conj::No),
			64,
			64,
			64,
		);
		assert!(
			p == MatmulPlan::External(ExternalCall {
				swap_operands: false,
				op_a: ExternalOp::T,
				op_b: ExternalOp::N,
				copy_a: false,
				copy_b: false,
			})
		);

		// a conjugated row-major operand maps to the conjugate-transpose op
		let p = plan::<crate::c64>(
			KernelOp::MatMul,
			Backend::Auto,
			true,
			false,
			col_major(Conj::No),
			row_major(Conj::Yes),
			col_major(Conj::No),
			64,
			64,
			64,
		);
		match p {
			MatmulPlan::External(call) => assert!(all(call.op_a == ExternalOp::C, !call.copy_a)),
			MatmulPlan::Native => panic!(),
		}

		// a conjugated column-major operand cannot be expressed and is packed
		let p = plan::<crate::c64>(
			KernelOp::MatMul,
			Backend::Auto,
			true,
			false,
			col_major(Conj::No),
			col_major(Conj::Yes),
			col_major(Conj::No),
			64,
			64,
			64,
		);
		match p {
			MatmulPlan::External(call) => assert!(call.copy_a),
			MatmulPlan::Native => panic!(),
		}

		// a row-major accumulator swaps the operand roles
		let p = plan::<f64>(
			KernelOp::MatMul,
			Backend::Auto,
			true,
			false,
			row_major(Conj::No),
			col_major(Conj::No),
			col_major(Conj::No),
			64,
			64,
			64,
		);
		match p {
			MatmulPlan::External(call) => assert!(call.swap_operands),
			MatmulPlan::Native => panic!(),
		}

		// non-native scalars and rank updates always stay native
		let p = plan::<f64>(
			KernelOp::RankKUpdate,
			Backend::External,
			true,
			false,
			col_major(Conj::No),
			col_major(Conj::No),
			col_major(Conj::No),
			512,
			512,
			512,
		);
		assert!(p == MatmulPlan::Native);
	}
}
