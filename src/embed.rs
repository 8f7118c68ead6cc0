//! Trainer boundary: walk batches in, per-node vectors out.
//!
//! The sequence-embedding trainer (skip-gram or otherwise) is an injected
//! capability behind [`SequenceTrainer`]; this crate never implements the
//! training algorithm itself. [`Graph2Vec`] wires the pipeline together:
//! reweight edges, normalize, sample walks, hand the batch to the trainer,
//! then answer per-node lookups.

use crate::csr::CsrMatrix;
use crate::walks::{make_walks, WalkBatch, WalkConfig};
use crate::{Error, Result};
use std::collections::HashMap;

/// Options forwarded verbatim to the sequence trainer. The crate does not
/// interpret or validate them beyond carrying them across the boundary.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainParams {
    /// Context window size (each side).
    pub window: usize,
    /// Embedding dimensionality.
    pub dimensions: usize,
    /// Negative samples per positive.
    pub negative: usize,
    /// Training iterations over the walk corpus.
    pub iterations: usize,
    /// Minibatch size in tokens.
    pub batch_words: usize,
    /// Trainer-side worker count.
    pub workers: usize,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            window: 10,
            dimensions: 32,
            negative: 20,
            iterations: 10,
            batch_words: 128,
            workers: 6,
        }
    }
}

/// Per-node embedding vectors produced by a trainer.
///
/// Only nodes that appeared in at least one training sequence have vectors;
/// coverage is the caller's responsibility (enough epochs / long enough
/// walks for every node to be visited).
#[derive(Debug, Clone)]
pub struct Embedding {
    dimensions: usize,
    vectors: HashMap<usize, Vec<f32>>,
}

impl Embedding {
    /// Wrap trainer output, checking every vector has the declared length.
    pub fn new(dimensions: usize, vectors: HashMap<usize, Vec<f32>>) -> Result<Self> {
        if let Some((&node, v)) = vectors.iter().find(|(_, v)| v.len() != dimensions) {
            return Err(Error::InvalidParameter(format!(
                "vector for node {node} has {} dimensions, expected {dimensions}",
                v.len()
            )));
        }
        Ok(Self { dimensions, vectors })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of nodes with a trained vector.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vector(&self, node: usize) -> Option<&[f32]> {
        self.vectors.get(&node).map(Vec::as_slice)
    }
}

/// A black-box sequence-embedding trainer.
///
/// Input is a batch of uniform-length node-id sequences; output maps every
/// token observed during training to a vector of `params.dimensions` values.
pub trait SequenceTrainer {
    fn train(&self, walks: &WalkBatch, params: &TrainParams) -> Result<Embedding>;
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Graph2VecConfig {
    pub walklen: usize,
    pub epochs: usize,
    /// Bias toward edges a backtracking step could use; `1.0` is unbiased.
    pub return_weight: f32,
    /// Bias toward all other edges; `1.0` is unbiased.
    pub neighbor_weight: f32,
    /// Walk-sampling worker count (see [`WalkConfig::threads`]).
    pub threads: i32,
    pub seed: u64,
    pub train: TrainParams,
}

impl Default for Graph2VecConfig {
    fn default() -> Self {
        Self {
            walklen: 80,
            epochs: 10,
            return_weight: 1.0,
            neighbor_weight: 1.0,
            threads: -1,
            seed: 42,
            train: TrainParams::default(),
        }
    }
}

/// Whole-graph embedding model: fit on an adjacency matrix, predict per node.
pub struct Graph2Vec<T> {
    config: Graph2VecConfig,
    trainer: T,
    model: Option<Embedding>,
}

impl<T: SequenceTrainer> Graph2Vec<T> {
    pub fn new(config: Graph2VecConfig, trainer: T) -> Self {
        Self { config, trainer, model: None }
    }

    /// Sample walks over `graph` and train embeddings from them.
    ///
    /// Fails fast on a degenerate (zero-sum) row or a malformed matrix,
    /// before any walk is sampled. Refitting replaces the previous model.
    pub fn fit(&mut self, graph: &CsrMatrix) -> Result<()> {
        let reweighted = graph.reweight(self.config.return_weight, self.config.neighbor_weight);
        let walks = make_walks(
            &reweighted,
            WalkConfig {
                walklen: self.config.walklen,
                epochs: self.config.epochs,
                threads: self.config.threads,
                seed: self.config.seed,
            },
        )?;
        self.model = Some(self.trainer.train(&walks, &self.config.train)?);
        Ok(())
    }

    /// The trained vector for `node`.
    pub fn predict(&self, node: usize) -> Result<&[f32]> {
        let model = self.model.as_ref().ok_or(Error::NotFitted)?;
        model.vector(node).ok_or(Error::UnknownNode(node))
    }

    pub fn embedding(&self) -> Option<&Embedding> {
        self.model.as_ref()
    }
}
