//! Convenience macros.

/// creates a [`Mat`](crate::Mat) containing the arguments, row by row.
///
/// ```
/// use stria::mat;
///
/// let m = mat![
/// 	[1.0, 2.0, 3.0], //
/// 	[4.0, 5.0, 6.0],
/// ];
///
/// assert_eq!(m[(1, 2)], 6.0);
/// ```
#[macro_export]
macro_rules! mat {
	($([$($expr: expr),* $(,)?]),* $(,)?) => {{
		let data = [$([$($expr),*]),*];
		let nrows = data.len();
		let ncols = if nrows == 0 { 0 } else { data[0].len() };
		$crate::Mat::from_fn(nrows, ncols, |i, j| data[i][j])
	}};
}

/// one-shot flag used by the `perf-warn` feature, so that each performance
/// warning fires at most once per process.
#[cfg(feature = "perf-warn")]
#[macro_export]
#[doc(hidden)]
macro_rules! __perf_warn {
	($name: ident) => {{
		#[allow(non_upper_case_globals)]
		static $name: ::core::sync::atomic::AtomicBool = ::core::sync::atomic::AtomicBool::new(false);
		!$name.fetch_or(true, ::core::sync::atomic::Ordering::Relaxed)
	}};
}
