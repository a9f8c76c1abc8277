//! 2-bit k-mer codec.
//!
//! K-mers are packed into a `u64` with the first symbol in the most
//! significant position (A=0, C=1, G=2, T=3), so numeric order equals
//! lexicographic order over `ACGT`. The complement of a symbol is `3 - x`,
//! i.e. `x ^ 3`.
//!
//! `CanonicalKmer` wraps the minimum of the forward and reverse-complement
//! encodings. Graph identity is always expressed through it so that a k-mer
//! and its reverse complement name the same node.
//!
//! Supports k <= 31 (62 bits). Odd k guarantees that no k-mer is its own
//! reverse complement.

/// Largest k-mer size that fits the `u64` packing.
pub const MAX_KMER_SIZE: usize = 31;

/// A canonical k-mer packed into a `u64`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalKmer(pub(crate) u64);

impl CanonicalKmer {
    /// Create from a raw packed value.
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw packed `u64` value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for CanonicalKmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CanonicalKmer(0x{:016x})", self.0)
    }
}

impl std::fmt::Display for CanonicalKmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Symbol helpers
// ---------------------------------------------------------------------------

/// 2-bit code of a nucleotide, case-insensitive. `None` for anything else.
#[inline]
pub fn encode_base(b: u8) -> Option<u64> {
    match b {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Upper-case nucleotide of a 2-bit code.
#[inline]
pub fn decode_base(code: u64) -> u8 {
    b"ACGT"[(code & 3) as usize]
}

/// Complement of an ASCII nucleotide, preserving case. Other bytes map to `N`.
#[inline]
pub fn complement_base(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        _ => b'N',
    }
}

/// Reverse complement of an ASCII sequence.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement_base(b)).collect()
}

// ---------------------------------------------------------------------------
// KmerCodec
// ---------------------------------------------------------------------------

/// Encoding, shifting and canonicalisation for k-mers of one fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerCodec {
    k: usize,
    mask: u64,
}

impl KmerCodec {
    /// Codec for k-mers of size `k` (1..=31).
    pub fn new(k: usize) -> Self {
        debug_assert!((1..=MAX_KMER_SIZE).contains(&k));
        Self {
            k,
            mask: (1u64 << (2 * k)) - 1,
        }
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Pack the first `k` symbols of `seq`. `None` if `seq` is too short or
    /// contains a non-ACGT symbol.
    pub fn encode(&self, seq: &[u8]) -> Option<u64> {
        if seq.len() < self.k {
            return None;
        }
        seq[..self.k]
            .iter()
            .try_fold(0u64, |acc, &b| Some((acc << 2) | encode_base(b)?))
    }

    /// Unpack into upper-case ASCII.
    pub fn decode(&self, kmer: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.k);
        self.decode_into(kmer, &mut out);
        out
    }

    /// Append the upper-case ASCII symbols of `kmer` to `out`.
    pub fn decode_into(&self, kmer: u64, out: &mut Vec<u8>) {
        for i in (0..self.k).rev() {
            out.push(decode_base(kmer >> (2 * i)));
        }
    }

    pub fn reverse_complement(&self, kmer: u64) -> u64 {
        let mut x = kmer;
        let mut rc = 0u64;
        for _ in 0..self.k {
            rc = (rc << 2) | ((x & 3) ^ 3);
            x >>= 2;
        }
        rc
    }

    #[inline]
    pub fn canonical(&self, kmer: u64) -> CanonicalKmer {
        CanonicalKmer(kmer.min(self.reverse_complement(kmer)))
    }

    /// Drop the first symbol and append `code` on the right.
    #[inline]
    pub fn push_right(&self, kmer: u64, code: u64) -> u64 {
        ((kmer << 2) | code) & self.mask
    }

    /// Drop the last symbol and prepend `code` on the left.
    #[inline]
    pub fn push_left(&self, code: u64, kmer: u64) -> u64 {
        (kmer >> 2) | (code << (2 * (self.k - 1)))
    }

    #[inline]
    pub fn first_symbol(&self, kmer: u64) -> u64 {
        (kmer >> (2 * (self.k - 1))) & 3
    }

    #[inline]
    pub fn last_symbol(&self, kmer: u64) -> u64 {
        kmer & 3
    }

    /// Rolling iterator over the canonical k-mers of `seq`. Non-ACGT symbols
    /// restart the window.
    pub fn canonical_kmers<'a>(&self, seq: &'a [u8]) -> CanonicalKmerIter<'a> {
        CanonicalKmerIter {
            codec: *self,
            seq,
            pos: 0,
            fw_kmer: 0,
            rc_kmer: 0,
            valid_bases: 0,
        }
    }
}

/// Iterator returned by [`KmerCodec::canonical_kmers`].
pub struct CanonicalKmerIter<'a> {
    codec: KmerCodec,
    seq: &'a [u8],
    pos: usize,
    fw_kmer: u64,
    rc_kmer: u64,
    valid_bases: usize,
}

impl Iterator for CanonicalKmerIter<'_> {
    type Item = CanonicalKmer;

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.codec.k;
        while self.pos < self.seq.len() {
            let b = self.seq[self.pos];
            self.pos += 1;
            let Some(bits) = encode_base(b) else {
                self.valid_bases = 0;
                self.fw_kmer = 0;
                self.rc_kmer = 0;
                continue;
            };
            self.fw_kmer = self.codec.push_right(self.fw_kmer, bits);
            self.rc_kmer = (self.rc_kmer >> 2) | ((bits ^ 3) << (2 * (k - 1)));
            self.valid_bases += 1;
            if self.valid_bases >= k {
                return Some(CanonicalKmer(self.fw_kmer.min(self.rc_kmer)));
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
