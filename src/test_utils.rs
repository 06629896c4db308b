//! Shared helpers for the inline test modules.

use crate::{c64, Mat, Par};
use rand::prelude::*;
use rand_distr::StandardNormal;

pub fn rand_mat_f64(rng: &mut StdRng, nrows: usize, ncols: usize) -> Mat<f64> {
	Mat::from_fn(nrows, ncols, |_, _| rng.sample(StandardNormal))
}

pub fn rand_mat_c64(rng: &mut StdRng, nrows: usize, ncols: usize) -> Mat<c64> {
	Mat::from_fn(nrows, ncols, |_, _| c64::new(rng.sample(StandardNormal), rng.sample(StandardNormal)))
}

pub fn par_options() -> Vec<Par> {
	#[cfg(feature = "rayon")]
	{
		vec![Par::Seq, Par::rayon(4)]
	}
	#[cfg(not(feature = "rayon"))]
	{
		vec![Par::Seq]
	}
}
