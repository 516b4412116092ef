use crate::graph::*;
use rand::{Rng, seq::index::sample};
use rand_distr::{Geometric, Normal};

/// Generates random connected superpixel graphs.
///
/// The graph consists of a random recursive tree (node `i > 0` attaches to a uniform earlier
/// node) which guarantees connectivity, overlaid with a Gilbert graph `G(n,p)`. Every node picks
/// a base color from `palette` uniformly at random and adds Gaussian noise with standard deviation
/// `noise`; every edge receives a random boundary length in `1..=16`.
pub fn random_connected_superpixels<R: Rng>(
    rng: &mut R,
    n: NumNodes,
    p: f64,
    palette: &[f64],
    noise: f64,
) -> SuperpixelGraph {
    assert!(!palette.is_empty());
    let noise = Normal::new(0.0, noise).unwrap();

    let colors = (0..n)
        .map(|_| {
            let base = palette[rng.gen_range(0..palette.len())];
            base + rng.sample(noise)
        })
        .collect();

    let mut edges: Vec<WeightedEdge> = (1..n)
        .map(|v| WeightedEdge(rng.gen_range(0..v), v, None))
        .collect();

    // indirection via vector as we need a &mut for rng to sample the weights
    let gnp: Vec<_> = BernoulliSamplingRange::new(rng, 0, (n as i64) * (n as i64), p)
        .filter_map(|x| {
            let u = x / (n as i64);
            let v = x % (n as i64);
            (u < v).then_some((u as Node, v as Node))
        })
        .collect();
    edges.extend(gnp.into_iter().map(|(u, v)| WeightedEdge(u, v, None)));

    for edge in edges.iter_mut() {
        edge.2 = Some(rng.gen_range(1..=16) as f64);
    }

    SuperpixelGraph::try_new(colors, edges).expect("generated colors are finite")
}

/// Picks `k` distinct master nodes out of `0..n` uniformly at random (in random order)
pub fn random_master_nodes<R: Rng>(rng: &mut R, n: NumNodes, k: NumNodes) -> Vec<Node> {
    sample(rng, n as usize, k as usize)
        .into_iter()
        .map(|u| u as Node)
        .collect()
}

/// Provides an iterator similarly to Range, but
/// includes each element i.i.d. with probability of p
pub struct BernoulliSamplingRange<'a, R: Rng> {
    current: i64,
    end: i64,
    distr: Geometric,
    rng: &'a mut R,
}

impl<'a, R: Rng> BernoulliSamplingRange<'a, R> {
    pub fn new(rng: &'a mut R, begin: i64, end: i64, prob: f64) -> Self {
        debug_assert!(begin <= end);
        debug_assert!((0.0..=1.0).contains(&prob));
        Self {
            rng,
            current: begin - 1,
            end,
            distr: Geometric::new(prob).unwrap(),
        }
    }

    fn try_advance(&mut self) {
        if self.current >= self.end {
            return;
        }

        let skip = self.rng.sample(self.distr);
        if skip > i64::MAX as u64 {
            self.current = self.end;
        } else {
            self.current += 1;
            self.current = match self.current.checked_add(skip as i64) {
                Some(x) => x,
                None => self.end,
            }
        }
    }
}

impl<R: Rng> Iterator for BernoulliSamplingRange<'_, R> {
    type Item = i64;
    fn next(&mut self) -> Option<Self::Item> {
        self.try_advance();

        if self.current >= self.end {
            None
        } else {
            Some(self.current)
        }
    }
}
