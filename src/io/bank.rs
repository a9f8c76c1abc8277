//! Append-only sequence banks for bubble records.
//!
//! A bank is shared by all worker threads behind a `Mutex`; the emitter
//! formats a complete record pair first and only then takes the lock, so
//! records never interleave.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Output store for formatted records.
pub trait SequenceBank: Send {
    /// Append one record. `header` excludes the leading `>`.
    fn append_record(&mut self, header: &str, sequence: &[u8]) -> std::io::Result<()>;

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FastaBank
// ---------------------------------------------------------------------------

/// FASTA writer, one line per sequence.
pub struct FastaBank<W: Write> {
    writer: W,
    num_records: u64,
}

impl FastaBank<BufWriter<File>> {
    /// Create (truncate) a FASTA file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FastaBank<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            num_records: 0,
        }
    }

    /// Number of records appended so far.
    pub fn num_records(&self) -> u64 {
        self.num_records
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> SequenceBank for FastaBank<W> {
    fn append_record(&mut self, header: &str, sequence: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(b">")?;
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.write_all(sequence)?;
        self.writer.write_all(b"\n")?;
        self.num_records += 1;
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// MemoryBank
// ---------------------------------------------------------------------------

/// A record held by [`MemoryBank`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub header: String,
    pub sequence: Vec<u8>,
}

/// Bank that keeps records in memory, in append order.
#[derive(Debug, Default)]
pub struct MemoryBank {
    records: Vec<SequenceRecord>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SequenceRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SequenceBank for MemoryBank {
    fn append_record(&mut self, header: &str, sequence: &[u8]) -> std::io::Result<()> {
        self.records.push(SequenceRecord {
            header: header.to_string(),
            sequence: sequence.to_vec(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
