//! # Gazetteer Core
//!
//! Entity resolution over free-text postal addresses: given a corpus of
//! address records with noisy coordinates, partial structured claims, and
//! unnormalized text variants, decide which records denote the same
//! physical location and group them into clusters. Surfaces per-record
//! conflicts (claimed vs. inferred administrative area) along the way.
//!
//! This crate is the resolution engine only. It consumes two collaborator
//! traits — [`parser::AddressParser`] (raw text to structured fields) and
//! [`repository::Repository`] (tabular persistence) — and is agnostic to
//! their concrete implementations; `gazetteer-parser` and `gazetteer-db`
//! provide the ones this workspace ships.
//!
//! ## Pipeline
//!
//! ```ignore
//! use gazetteer_core::pipeline::Pipeline;
//!
//! let pipeline = Pipeline::new(
//!     repo, parser, canonicalizer, scorer, llm_arbitrator,
//!     grid_precision, candidate_max, candidate_topn_for_llm,
//! );
//! let summary = pipeline.run(/* use_llm = */ false).await?;
//! ```
//!
//! ## Stateless comparison
//!
//! ```ignore
//! let verdict = pipeline.compare_pair(addr1, addr2, use_llm).await?;
//! ```

#![warn(missing_docs)]
#![allow(clippy::too_many_arguments)]

/// Geographic anchor resolution for relative descriptions ("40m northwest
/// of X/Y intersection").
pub mod anchor;
/// Bidirectional alias indexes (canonical name <-> aliases).
pub mod alias;
/// Field-by-field canonicalization of parsed addresses.
pub mod canonicalize;
/// JSON-backed run configuration.
pub mod config;
/// Single-record and pairwise district-mismatch conflict detection.
pub mod conflict;
/// Evaluation: precision/recall/F1 and grid search over scorer configs.
pub mod evaluate;
/// Error types for the engine.
pub mod error;
/// Inverted-index candidate recall.
pub mod index;
/// Post-scoring arbitration (blacklist/whitelist/LLM/fallback).
pub mod judge;
/// Core data model: records, parsed addresses, match results, clusters.
pub mod model;
/// The `AddressParser` collaborator trait.
pub mod parser;
/// The resolution pipeline orchestrator.
pub mod pipeline;
/// The `Repository` collaborator trait.
pub mod repository;
/// Weighted-average feature scorer.
pub mod scoring;
/// Text normalization, n-gram similarity, and geometry helpers.
pub mod text;
/// Near-linear disjoint-set for transitive clustering.
pub mod unionfind;

/// Convenient re-exports of the most commonly used types.
pub mod prelude {
    //! ```ignore
    //! use gazetteer_core::prelude::*;
    //! ```
    pub use crate::config::Config;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::model::{AddressRecord, Anchor, Cluster, Conflict, Decision, MatchResult, ParsedAddress};
    pub use crate::pipeline::{CompareOutcome, Pipeline, PipelineSummary};
    pub use crate::repository::Repository;
    pub use crate::parser::AddressParser;
}

/// The version of the Gazetteer core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
