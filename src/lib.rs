//! `nodevec`: sparse random-walk generation for node embeddings.
//!
//! Pipeline: a non-negative weighted adjacency matrix in compressed-row form
//! is normalized into a row-stochastic transition matrix, many fixed-length
//! random walks are sampled over it (in parallel), and the resulting node-id
//! sequences are handed to an injected sequence-embedding trainer.
//!
//! Public invariants (must not drift):
//! - **Node order**: nodes are dense indices \(0..n\); every walk entry is a
//!   valid index into the input matrix.
//! - **Determinism**: for a fixed seed the produced walks are identical
//!   regardless of worker count — each walk owns a generator seeded from
//!   (seed, epoch, start node).
//! - **No silent normalization**: the sampler only accepts
//!   [`TransitionMatrix`], which is only obtainable through
//!   [`CsrMatrix::normalize_rows`]; a matrix with an all-zero row is rejected
//!   there, never patched up.
//!
//! Swappable (allowed to change without breaking the contract):
//! - worker scheduling strategy (serial vs rayon pools)
//! - internal walk-batch storage (so long as row access semantics hold)

pub mod csr;
pub mod embed;
pub mod walks;

pub use csr::{CsrMatrix, TransitionMatrix};
pub use embed::{Embedding, Graph2Vec, Graph2VecConfig, SequenceTrainer, TrainParams};
pub use walks::{make_walks, sample_walk, sample_walks, walk_all_nodes, WalkBatch, WalkConfig};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A row of the adjacency matrix sums to zero and cannot be turned into a
    /// probability distribution. The caller must fix the input graph (e.g.
    /// add a self-loop for the isolated node) and retry.
    #[error("row {0} sums to zero and cannot be normalized")]
    InvalidRow(usize),
    /// The compressed-row arrays are structurally inconsistent, or the matrix
    /// is not square where walks require it.
    #[error("invalid matrix shape: {0}")]
    Shape(String),
    /// A walk reached a node whose transition row is empty. Normalization
    /// rejects such rows, so this means the matrix was corrupted between
    /// normalization and sampling; the whole batch is discarded.
    #[error("node {0} has no outgoing transitions")]
    EmptyTransitionRow(usize),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// `predict` was called for a node the trainer never observed in a walk.
    #[error("no embedding for node {0}; was it visited by any walk?")]
    UnknownNode(usize),
    #[error("model has not been fit")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, Error>;
