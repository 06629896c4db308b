//! Threading helpers.

use crate::Par;

/// runs `op_a` and `op_b`, in parallel on the rayon pool when the policy
/// allows it.
#[inline]
pub fn join_raw(op_a: impl Send + FnOnce(Par), op_b: impl Send + FnOnce(Par), par: Par) {
	match par {
		Par::Seq => {
			op_a(Par::Seq);
			op_b(Par::Seq);
		},
		#[cfg(feature = "rayon")]
		Par::Rayon(nthreads) => {
			if nthreads.get() == 1 {
				op_a(Par::Seq);
				op_b(Par::Seq);
			} else {
				let sub = Par::Rayon(core::num::NonZeroUsize::new(nthreads.get().div_ceil(2)).unwrap());
				rayon::join(|| op_a(sub), || op_b(sub));
			}
		},
	}
}
