//! Random-walk sampling over row-stochastic CSR matrices.

use crate::csr::{CsrMatrix, TransitionMatrix};
use crate::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalkConfig {
    /// Length of every walk, including the start node.
    pub walklen: usize,
    /// Passes over the node set; each epoch starts one walk per node.
    pub epochs: usize,
    /// Worker count: `0` runs sequentially, a positive value builds a rayon
    /// pool of exactly that size, a negative value uses the global pool.
    pub threads: i32,
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self { walklen: 80, epochs: 10, threads: -1, seed: 42 }
    }
}

/// A batch of fixed-length walks, stored row-major.
///
/// Row order carries no meaning; parallel execution may interleave worker
/// outputs, and consumers must treat the batch as a multiset of walks.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkBatch {
    walklen: usize,
    nodes: Vec<usize>,
}

impl WalkBatch {
    fn new(walklen: usize, nodes: Vec<usize>) -> Self {
        debug_assert!(walklen > 0);
        debug_assert_eq!(nodes.len() % walklen, 0);
        Self { walklen, nodes }
    }

    /// Number of walks in the batch.
    pub fn len(&self) -> usize {
        self.nodes.len() / self.walklen
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn walklen(&self) -> usize {
        self.walklen
    }

    pub fn walk(&self, i: usize) -> &[usize] {
        &self.nodes[i * self.walklen..(i + 1) * self.walklen]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.nodes.chunks_exact(self.walklen)
    }

    /// The final node of every walk, in batch order.
    pub fn last_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|w| w[self.walklen - 1])
    }
}

/// splitmix64 finalizer; decorrelates per-walk seeds derived from
/// (seed, epoch, node) so nearby walks do not share generator streams.
fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    x
}

fn walk_seed(seed: u64, epoch: u64, node: u64) -> u64 {
    mix64(seed ^ (epoch << 32) ^ node)
}

/// One weighted categorical draw from a normalized CSR row.
///
/// Rows are already stochastic, so a single uniform draw is walked down the
/// cumulative weights. Float undershoot (the cumulative sum landing slightly
/// below 1) falls back to the last entry.
fn step<R: Rng>(cols: &[usize], probs: &[f32], rng: &mut R) -> usize {
    if cols.len() == 1 {
        return cols[0];
    }
    let mut r = rng.random::<f32>();
    for (i, &p) in probs.iter().enumerate() {
        if r <= p {
            return cols[i];
        }
        r -= p;
    }
    *cols.last().unwrap()
}

fn walk_into<R: Rng>(
    transitions: &TransitionMatrix,
    start: usize,
    walklen: usize,
    rng: &mut R,
    out: &mut Vec<usize>,
) -> Result<()> {
    out.push(start);
    let mut curr = start;
    for _ in 1..walklen {
        let (cols, probs) = transitions.row(curr);
        if cols.is_empty() {
            return Err(Error::EmptyTransitionRow(curr));
        }
        curr = step(cols, probs, rng);
        out.push(curr);
    }
    Ok(())
}

fn check_walk_inputs(
    transitions: &TransitionMatrix,
    start_nodes: &[usize],
    walklen: usize,
) -> Result<()> {
    if walklen == 0 {
        return Err(Error::InvalidParameter("walklen must be at least 1".into()));
    }
    if !transitions.is_square() {
        return Err(Error::Shape(format!(
            "transition matrix must be square for walks, got {}x{}",
            transitions.n_nodes(),
            transitions.as_csr().n_cols()
        )));
    }
    if let Some(&bad) = start_nodes.iter().find(|&&s| s >= transitions.n_nodes()) {
        return Err(Error::InvalidParameter(format!(
            "start node {bad} out of range for {} nodes",
            transitions.n_nodes()
        )));
    }
    Ok(())
}

/// Sample one walk of exactly `walklen` nodes starting at `start`.
///
/// The generator is seeded from `seed` alone, so repeated calls with the
/// same arguments return the same walk.
pub fn sample_walk(
    transitions: &TransitionMatrix,
    start: usize,
    walklen: usize,
    seed: u64,
) -> Result<Vec<usize>> {
    check_walk_inputs(transitions, &[start], walklen)?;
    let mut rng = ChaCha8Rng::seed_from_u64(mix64(seed));
    let mut walk = Vec::with_capacity(walklen);
    walk_into(transitions, start, walklen, &mut rng, &mut walk)?;
    Ok(walk)
}

/// Sample one walk per start node, sequentially.
///
/// Each walk gets its own generator seeded from `(seed, position)`, matching
/// the per-walk seeding of [`make_walks`].
pub fn sample_walks(
    transitions: &TransitionMatrix,
    start_nodes: &[usize],
    walklen: usize,
    seed: u64,
) -> Result<WalkBatch> {
    check_walk_inputs(transitions, start_nodes, walklen)?;
    let mut nodes = Vec::with_capacity(start_nodes.len() * walklen);
    for (i, &start) in start_nodes.iter().enumerate() {
        let mut rng = ChaCha8Rng::seed_from_u64(walk_seed(seed, i as u64, start as u64));
        walk_into(transitions, start, walklen, &mut rng, &mut nodes)?;
    }
    Ok(WalkBatch::new(walklen, nodes))
}

/// Normalize `graph` and sample `epochs` walks from every node.
///
/// Returns `epochs * n` walks of exactly `config.walklen` nodes each. The
/// whole call fails before any walk is scheduled if normalization rejects a
/// row; a failure inside a worker discards the entire batch.
///
/// Output is identical for a given seed across all `threads` settings:
/// every (epoch, node) walk derives its generator from the pair, never from
/// scheduling order.
pub fn make_walks(graph: &CsrMatrix, config: WalkConfig) -> Result<WalkBatch> {
    if !graph.is_square() {
        return Err(Error::Shape(format!(
            "adjacency matrix must be square, got {}x{}",
            graph.n_rows(),
            graph.n_cols()
        )));
    }
    if config.walklen == 0 {
        return Err(Error::InvalidParameter("walklen must be at least 1".into()));
    }
    let transitions = graph.normalize_rows()?;
    walk_all_nodes(&transitions, config)
}

/// The fan-out half of [`make_walks`], for callers that already hold a
/// normalized matrix.
pub fn walk_all_nodes(transitions: &TransitionMatrix, config: WalkConfig) -> Result<WalkBatch> {
    check_walk_inputs(transitions, &[], config.walklen)?;
    let n = transitions.n_nodes();
    let jobs: Vec<(u32, usize)> = (0..config.epochs as u32)
        .flat_map(|epoch| (0..n).map(move |node| (epoch, node)))
        .collect();
    debug!(
        nodes = n,
        epochs = config.epochs,
        walklen = config.walklen,
        threads = config.threads,
        walks = jobs.len(),
        "sampling walk batch"
    );

    let one = |&(epoch, node): &(u32, usize)| -> Result<Vec<usize>> {
        let mut rng =
            ChaCha8Rng::seed_from_u64(walk_seed(config.seed, epoch as u64, node as u64));
        let mut walk = Vec::with_capacity(config.walklen);
        walk_into(transitions, node, config.walklen, &mut rng, &mut walk)?;
        Ok(walk)
    };

    let walks: Vec<Vec<usize>> = match config.threads {
        0 => jobs.iter().map(one).collect::<Result<_>>()?,
        t if t > 0 => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(t as usize)
                .build()
                .map_err(|e| Error::InvalidParameter(format!("thread pool: {e}")))?;
            pool.install(|| jobs.par_iter().map(one).collect::<Result<_>>())?
        }
        _ => jobs.par_iter().map(one).collect::<Result<_>>()?,
    };

    let mut nodes = Vec::with_capacity(jobs.len() * config.walklen);
    for walk in walks {
        nodes.extend_from_slice(&walk);
    }
    Ok(WalkBatch::new(config.walklen, nodes))
}
