//! Run configuration for the bubble search.
//!
//! Everything here is fixed before traversal starts and read-only while
//! workers run. Validation happens once, up front, so that a bad k never
//! reaches the expander.

use std::str::FromStr;

use serde::Serialize;

use super::error::FinderError;
use crate::graph::MAX_KMER_SIZE;

/// Smallest accepted k-mer size.
pub const MIN_KMER_SIZE: usize = 5;

/// What to do with branching k-mers met along either arm of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchingPolicy {
    /// Any branching k-mer invalidates the bubble.
    Forbidden,
    /// Branching is tolerated; bubbles are tagged high/low and counted apart.
    AcceptedRecorded,
    /// Branching is tolerated without a class.
    AcceptedUnrecorded,
}

impl FromStr for BranchingPolicy {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forbidden" | "0" => Ok(Self::Forbidden),
            "accepted-recorded" | "1" => Ok(Self::AcceptedRecorded),
            "accepted-unrecorded" | "2" => Ok(Self::AcceptedUnrecorded),
            other => Err(FinderError::InvalidOption {
                option: "branching policy",
                value: other.to_string(),
            }),
        }
    }
}

/// How far flank extension may go once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionStyle {
    /// A side shorter than the minimum extension length is not extended.
    Strict,
    /// Extend as far as possible and report whatever was reached.
    Contig,
}

impl ExtensionStyle {
    /// Word used in record headers (`left_unitig_length_..`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Strict => "unitig",
            Self::Contig => "contig",
        }
    }
}

impl FromStr for ExtensionStyle {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" | "unitig" => Ok(Self::Strict),
            "contig" => Ok(Self::Contig),
            other => Err(FinderError::InvalidOption {
                option: "extension style",
                value: other.to_string(),
            }),
        }
    }
}

/// Closing check used by the expander, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingPolicy {
    /// Arms stay at `2k-1` symbols.
    Plain,
    /// Arms may gain one anchoring symbol per side (`2k` or `2k+1`), which
    /// marks the sides the extension builder will walk.
    WithAlternateClosure,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinderConfig {
    pub kmer_size: usize,
    /// Discard bubbles whose complexity score exceeds the ceiling.
    pub low_complexity_filter: bool,
    pub branching_policy: BranchingPolicy,
    pub extension_enabled: bool,
    pub extension_style: ExtensionStyle,
    pub min_extension_length: usize,
    /// Cap on symbols added per side, anchor included.
    pub max_extension_length: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            kmer_size: 31,
            low_complexity_filter: true,
            branching_policy: BranchingPolicy::Forbidden,
            extension_enabled: false,
            extension_style: ExtensionStyle::Strict,
            min_extension_length: 0,
            max_extension_length: 10_000,
        }
    }
}

impl FinderConfig {
    /// Check the configuration on its own.
    pub fn validate(&self) -> Result<(), FinderError> {
        let k = self.kmer_size;
        if k > MAX_KMER_SIZE {
            return Err(FinderError::KmerTooLarge {
                k,
                max: MAX_KMER_SIZE,
            });
        }
        if k < MIN_KMER_SIZE {
            return Err(FinderError::KmerTooSmall {
                k,
                min: MIN_KMER_SIZE,
            });
        }
        if k % 2 == 0 {
            return Err(FinderError::KmerEven { k });
        }
        if self.extension_enabled && self.max_extension_length == 0 {
            return Err(FinderError::ZeroExtensionLength);
        }
        if self.extension_enabled && self.min_extension_length > self.max_extension_length {
            return Err(FinderError::ExtensionBounds {
                min: self.min_extension_length,
                max: self.max_extension_length,
            });
        }
        Ok(())
    }

    /// Check the configuration against the graph it will run on.
    pub fn validate_for_graph(&self, graph_k: usize) -> Result<(), FinderError> {
        self.validate()?;
        if graph_k != self.kmer_size {
            return Err(FinderError::KmerMismatch {
                config: self.kmer_size,
                graph: graph_k,
            });
        }
        Ok(())
    }

    pub fn closing_policy(&self) -> ClosingPolicy {
        if self.extension_enabled {
            ClosingPolicy::WithAlternateClosure
        } else {
            ClosingPolicy::Plain
        }
    }

    /// Expansion steps allowed per successor pair.
    pub fn step_bound(&self) -> usize {
        4 * self.kmer_size
    }

    /// Highest complexity score still considered complex enough.
    pub fn complexity_ceiling(&self) -> u32 {
        (self.kmer_size * self.kmer_size / 4) as u32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
