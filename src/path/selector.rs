//! Downsampling of candidate path sets to keep the optimization tractable.

use super::generator::PathsPerClass;
use super::path::Path;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniformly samples up to `k` paths per class without replacement.
///
/// Classes with `k` or fewer paths keep all of them. Surviving paths keep their generation
/// order and ids.
pub fn choose_rand<R: Rng + ?Sized>(pptc: &PathsPerClass, k: usize, rng: &mut R) -> PathsPerClass {
    pptc.map_paths(|paths| {
        if paths.len() <= k {
            return paths.to_vec();
        }
        let mut picked = rand::seq::index::sample(&mut *rng, paths.len(), k).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| paths[i].clone()).collect()
    })
}

/// `choose_rand` with a `StdRng` seeded from `seed`, for reproducible selection.
pub fn choose_rand_seeded(pptc: &PathsPerClass, k: usize, seed: u64) -> PathsPerClass {
    let mut rng = StdRng::seed_from_u64(seed);
    choose_rand(pptc, k, &mut rng)
}

/// Keeps the first `k` paths per class, i.e. the shortest under generation order.
pub fn choose_shortest(pptc: &PathsPerClass, k: usize) -> PathsPerClass {
    pptc.map_paths(|paths| paths.iter().take(k).cloned().collect::<Vec<Path>>())
}
