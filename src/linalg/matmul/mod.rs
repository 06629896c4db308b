//! Matrix multiplication.
//!
//! [`matmul`] computes `dst = [beta * dst] + alpha * lhs * rhs` over arbitrary
//! strided views. Each call is routed by the [`dispatch`] policy to either the
//! native recursive-blocked kernel or the external accelerated kernel; the
//! conjugation of each operand is carried by its view, so there is a single
//! entry point rather than one per conjugate/transpose combination.

use crate::internal_prelude::*;

pub mod dispatch;

pub use dispatch::Backend;

/// inner products.
pub mod dot {
	use super::*;

	/// computes `lhs * rhs`, honoring the conjugation flag of both views.
	#[inline]
	#[track_caller]
	pub fn inner_prod<T: ComplexField>(lhs: RowRef<'_, T>, rhs: ColRef<'_, T>) -> T {
		debug_assert!(lhs.ncols() == rhs.nrows());
		let mut acc = zero::<T>();
		for i in 0..lhs.ncols() {
			acc = acc + lhs.read(i) * rhs.read(i);
		}
		acc
	}
}

/// largest dimension below which the recursion bottoms out into the scalar
/// kernel.
const NATIVE_BASE: usize = 48;

/// problem area above which the native kernel may split work across threads.
const PAR_THRESHOLD: usize = 128 * 128;

#[inline(never)]
fn matmul_base<T: ComplexField>(dst: MatMut<'_, T>, beta: Accum, lhs: MatRef<'_, T>, rhs: MatRef<'_, T>, alpha: T) {
	let mut dst = dst;
	let m = dst.nrows();
	let n = dst.ncols();
	let k = lhs.ncols();

	for j in 0..n {
		for i in 0..m {
			let mut acc = zero::<T>();
			for depth in 0..k {
				acc = acc + lhs.read(i, depth) * rhs.read(depth, j);
			}
			acc = alpha * acc;
			if let Accum::Add = beta {
				acc = dst.read(i, j) + acc;
			}
			dst.write(i, j, acc);
		}
	}
}

fn matmul_native<T: ComplexField>(dst: MatMut<'_, T>, beta: Accum, lhs: MatRef<'_, T>, rhs: MatRef<'_, T>, alpha: T, par: Par) {
	let mut dst = dst;
	let m = dst.nrows();
	let n = dst.ncols();
	let k = lhs.ncols();

	// structured operands cannot be sub-viewed, so they take the scalar path
	if !(lhs.structure().is_full() && rhs.structure().is_full()) {
		return matmul_base(dst, beta, lhs, rhs, alpha);
	}

	let max = Ord::max(Ord::max(m, n), k);
	if max <= NATIVE_BASE {
		return matmul_base(dst, beta, lhs, rhs, alpha);
	}

	let par = if m * n < PAR_THRESHOLD { Par::Seq } else { par };

	if max == m {
		let half = m / 2;
		let (dst_top, dst_bot) = dst.split_at_row_mut(half);
		let (lhs_top, lhs_bot) = lhs.split_at_row(half);
		join_raw(
			|par| matmul_native(dst_top, beta, lhs_top, rhs, alpha, par),
			|par| matmul_native(dst_bot, beta, lhs_bot, rhs, alpha, par),
			par,
		);
	} else if max == n {
		let half = n / 2;
		let (dst_left, dst_right) = dst.split_at_col_mut(half);
		let (rhs_left, rhs_right) = rhs.split_at_col(half);
		join_raw(
			|par| matmul_native(dst_left, beta, lhs, rhs_left, alpha, par),
			|par| matmul_native(dst_right, beta, lhs, rhs_right, alpha, par),
			par,
		);
	} else {
		let half = k / 2;
		let (lhs_left, lhs_right) = lhs.split_at_col(half);
		let (rhs_top, rhs_bot) = rhs.split_at_row(half);
		matmul_native(dst.rb_mut(), beta, lhs_left, rhs_top, alpha, par);
		matmul_native(dst, Accum::Add, lhs_right, rhs_bot, alpha, par);
	}
}

#[cfg(feature = "accel")]
fn matmul_external<T: ComplexField>(
	call: dispatch::ExternalCall,
	dst: MatMut<'_, T>,
	beta: Accum,
	lhs: MatRef<'_, T>,
	rhs: MatRef<'_, T>,
	alpha: T,
	par: Par,
) {
	let (mut dst, a, b) = if call.swap_operands {
		(dst.transpose_mut(), rhs.transpose(), lhs.transpose())
	} else {
		(dst, lhs, rhs)
	};

	let a_packed;
	let a = if call.copy_a {
		a_packed = a.to_owned();
		a_packed.as_ref()
	} else {
		a
	};
	let b_packed;
	let b = if call.copy_b {
		b_packed = b.to_owned();
		b_packed.as_ref()
	} else {
		b
	};

	let ld = |op: dispatch::ExternalOp, mat: &MatRef<'_, T>| match op {
		dispatch::ExternalOp::N => mat.col_stride() as usize,
		dispatch::ExternalOp::T | dispatch::ExternalOp::C => mat.row_stride() as usize,
	};
	let lda = ld(call.op_a, &a);
	let ldb = ld(call.op_b, &b);
	let ldc = dst.col_stride() as usize;

	unsafe {
		dispatch::external::gemm_flat(
			call.op_a,
			call.op_b,
			dst.nrows(),
			dst.ncols(),
			a.ncols(),
			alpha,
			a.as_ptr(),
			lda,
			b.as_ptr(),
			ldb,
			beta == Accum::Add,
			dst.as_ptr_mut(),
			ldc,
			par,
		);
	}
}

/// computes `dst = [beta * dst] + alpha * lhs * rhs` with the given backend
/// strategy.
///
/// # panics
///
/// panics eagerly, before any write, if the dimensions are not compatible for
/// a matrix product or if `dst` is not a full view.
#[track_caller]
pub fn matmul_with_backend<T: ComplexField>(
	dst: MatMut<'_, T>,
	beta: Accum,
	lhs: MatRef<'_, T>,
	rhs: MatRef<'_, T>,
	alpha: T,
	par: Par,
	backend: Backend,
) {
	assert!(all(
		dst.nrows() == lhs.nrows(),
		dst.ncols() == rhs.ncols(),
		lhs.ncols() == rhs.nrows(),
		dst.structure().is_full(),
	));

	let mut dst = dst;
	let m = dst.nrows();
	let n = dst.ncols();
	let k = lhs.ncols();

	if m == 0 || n == 0 {
		return;
	}
	if k == 0 {
		if beta == Accum::Replace {
			dst.fill(zero());
		}
		return;
	}

	let op = if n == 1 { dispatch::KernelOp::MatVec } else { dispatch::KernelOp::MatMul };
	let operands_alias = lhs.overlaps(&dst.rb()) || rhs.overlaps(&dst.rb());
	let plan = dispatch::plan::<T>(
		op,
		backend,
		cfg!(feature = "accel"),
		operands_alias,
		dispatch::OperandTags::new(dst.layout(), dst.structure()),
		dispatch::OperandTags::new(lhs.layout(), lhs.structure()),
		dispatch::OperandTags::new(rhs.layout(), rhs.structure()),
		m,
		n,
		k,
	);

	match plan {
		dispatch::MatmulPlan::Native => matmul_native(dst, beta, lhs, rhs, alpha, par),
		#[cfg(feature = "accel")]
		dispatch::MatmulPlan::External(call) => matmul_external(call, dst, beta, lhs, rhs, alpha, par),
		#[cfg(not(feature = "accel"))]
		dispatch::MatmulPlan::External(_) => unreachable!(),
	}
}

/// computes `dst = [beta * dst] + alpha * lhs * rhs`.
///
/// # panics
///
/// panics eagerly, before any write, if the dimensions are not compatible for
/// a matrix product or if `dst` is not a full view.
#[track_caller]
#[inline]
pub fn matmul<T: ComplexField>(dst: MatMut<'_, T>, beta: Accum, lhs: MatRef<'_, T>, rhs: MatRef<'_, T>, alpha: T, par: Par) {
	matmul_with_backend(dst, beta, lhs, rhs, alpha, par, Backend::Auto);
}

/// computes `dst = [beta * dst] + alpha * lhs * rhs` for a column vector
/// right-hand side.
#[track_caller]
#[inline]
pub fn matvec<T: ComplexField>(dst: ColMut<'_, T>, beta: Accum, lhs: MatRef<'_, T>, rhs: ColRef<'_, T>, alpha: T, par: Par) {
	matmul(dst.as_mat_mut(), beta, lhs, rhs.as_mat(), alpha, par);
}
