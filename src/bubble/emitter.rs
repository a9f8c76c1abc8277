//! Canonical-orientation check, record formatting and the shared bank write.
//!
//! Every node is visited in both orientations, so each bubble is closed once
//! from each strand. Only the orientation whose higher arm starts with a
//! k-mer smaller than the reverse complement of its last k-mer is written.
//! When the `k-1` symbols on either side of the variant are reverse
//! complements of each other, that comparison only sees the variant symbol
//! and would accept both orientations; the tie is broken by comparing the
//! higher arm with the reverse complement of the lower arm, which is the
//! higher arm of the other orientation.
//!
//! A bubble becomes two records, higher arm first:
//!
//! ```text
//! >SNP_higher_path_12|P_1:30_A/G|score_7|branching_low|ext_3|left_unitig_length_10|right_unitig_length_10
//! acgtacgtacGATTACA...TTGACAtgcatgcatg
//! ```
//!
//! Core symbols are upper case, flank symbols lower case. The variant
//! position is 0-based within the record sequence.

use std::sync::{Mutex, PoisonError};

use super::config::{BranchingPolicy, ExtensionStyle, FinderConfig};
use super::error::FinderError;
use super::extension::Flanks;
use super::stats::BubbleStats;
use super::{BranchingClass, BubblePair};
use crate::graph::KmerCodec;
use crate::graph::kmer::reverse_complement;
use crate::io::SequenceBank;

pub struct BubbleEmitter<'a, B> {
    bank: &'a Mutex<B>,
    stats: &'a BubbleStats,
    codec: KmerCodec,
    policy: BranchingPolicy,
    extension: Option<ExtensionStyle>,
}

impl<'a, B: SequenceBank> BubbleEmitter<'a, B> {
    pub fn new(bank: &'a Mutex<B>, stats: &'a BubbleStats, config: &FinderConfig) -> Self {
        Self {
            bank,
            stats,
            codec: KmerCodec::new(config.kmer_size),
            policy: config.branching_policy,
            extension: config.extension_enabled.then_some(config.extension_style),
        }
    }

    /// Whether `pair` is in the orientation that gets written.
    pub fn is_canonical(&self, pair: &BubblePair) -> bool {
        let k = self.codec.k();
        if pair.higher.len() < k {
            return false;
        }
        match (
            self.codec.encode(&pair.higher),
            self.codec.encode(&pair.higher[pair.higher.len() - k..]),
        ) {
            (Some(first), Some(last)) => {
                let flank = first >> 2;
                let rc_flank = self.codec.reverse_complement(last) >> 2;
                if flank != rc_flank {
                    flank < rc_flank
                } else {
                    pair.higher < reverse_complement(&pair.lower)
                }
            }
            _ => false,
        }
    }

    pub fn branching_class(&self, pair: &BubblePair) -> Option<BranchingClass> {
        match self.policy {
            BranchingPolicy::Forbidden => Some(BranchingClass::Low),
            BranchingPolicy::AcceptedRecorded if pair.branching => Some(BranchingClass::High),
            BranchingPolicy::AcceptedRecorded => Some(BranchingClass::Low),
            BranchingPolicy::AcceptedUnrecorded => None,
        }
    }

    /// Format and write both records of `pair`; returns the bubble index.
    pub fn emit(
        &self,
        pair: &BubblePair,
        score: u32,
        flanks: Option<&Flanks>,
    ) -> Result<u64, FinderError> {
        let no_flanks = Flanks::default();
        let flanks = flanks.unwrap_or(&no_flanks);
        let class = self.branching_class(pair);
        let id = self.stats.next_id();

        let higher = self.format_record("higher", &pair.higher, id, pair, score, class, flanks);
        let lower = self.format_record("lower", &pair.lower, id, pair, score, class, flanks);

        {
            let mut bank = self.bank.lock().unwrap_or_else(PoisonError::into_inner);
            bank.append_record(&higher.0, &higher.1)
                .map_err(FinderError::Output)?;
            bank.append_record(&lower.0, &lower.1)
                .map_err(FinderError::Output)?;
        }

        self.stats.record_class(class);
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    fn format_record(
        &self,
        arm_name: &str,
        arm: &[u8],
        id: u64,
        pair: &BubblePair,
        score: u32,
        class: Option<BranchingClass>,
        flanks: &Flanks,
    ) -> (String, Vec<u8>) {
        let (a, b) = pair.alleles();
        let position = flanks.left_len() + pair.snp_offset();
        let mut header = format!(
            "SNP_{}_path_{}|P_1:{}_{}/{}|score_{}",
            arm_name, id, position, a as char, b as char, score
        );
        if let Some(class) = class {
            header.push_str(&format!("|branching_{}", class.label()));
        }
        if let Some(style) = self.extension {
            header.push_str(&format!(
                "|ext_{}|left_{}_length_{}|right_{}_length_{}",
                flanks.sides().code(),
                style.label(),
                flanks.left_len(),
                style.label(),
                flanks.right_len()
            ));
        }

        let mut sequence = Vec::with_capacity(flanks.left_len() + arm.len() + flanks.right_len());
        if let Some(left) = &flanks.left {
            sequence.extend(left.iter().map(u8::to_ascii_lowercase));
        }
        sequence.extend(arm.iter().map(u8::to_ascii_uppercase));
        if let Some(right) = &flanks.right {
            sequence.extend(right.iter().map(u8::to_ascii_lowercase));
        }
        (header, sequence)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
