//! FASTA/FASTQ input, read as `paraseq` record sets over `niffler` readers.
//!
//! Reads are consumed in record-set batches so the graph builder can hand
//! whole batches to counting threads; the simulator only needs the first
//! record of a genome file.

use anyhow::{Context, Result, anyhow, bail};
use crossbeam::channel;
use paraseq::Record;
use tracing::info;

/// A named sequence with an owned buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSequence {
    pub name: String,
    pub seq: Vec<u8>,
}

/// Open a single file with automatic decompression (gzip, zstd, etc.).
pub fn open_with_decompression(path: &str) -> Result<Box<dyn std::io::Read + Send>> {
    let (reader, _format) =
        niffler::send::from_path(path).with_context(|| format!("failed to open {}", path))?;
    Ok(reader)
}

fn open_fastx(path: &str) -> Result<paraseq::fastx::Reader<Box<dyn std::io::Read + Send>>> {
    paraseq::fastx::Reader::new(open_with_decompression(path)?)
        .map_err(|e| anyhow!("failed to open {}: {}", path, e))
}

/// Read every record of every file in `paths` and send the sequences in
/// batches. Stops early (without error) if the receiving side hangs up.
///
/// Returns the number of sequences sent.
pub fn read_sequence_batches(
    paths: &[String],
    sender: &channel::Sender<Vec<Vec<u8>>>,
) -> Result<u64> {
    let mut num_seqs = 0u64;
    for path in paths {
        info!("Reading sequences from {}", path);
        let mut reader = open_fastx(path)?;
        let mut rset = reader.new_record_set();
        while rset
            .fill(&mut reader)
            .map_err(|e| anyhow!("error reading {}: {}", path, e))?
        {
            let mut batch = Vec::new();
            for rec in rset.iter() {
                let rec = rec.map_err(|e| anyhow!("malformed record in {}: {}", path, e))?;
                batch.push(rec.seq().into_owned());
            }
            num_seqs += batch.len() as u64;
            if sender.send(batch).is_err() {
                return Ok(num_seqs);
            }
        }
    }
    Ok(num_seqs)
}

/// The first record of a FASTA/FASTQ file, upper-cased.
pub fn read_first_sequence(path: &str) -> Result<NamedSequence> {
    let mut reader = open_fastx(path)?;
    let mut rset = reader.new_record_set();
    if !rset
        .fill(&mut reader)
        .map_err(|e| anyhow!("error reading {}: {}", path, e))?
    {
        bail!("{} contains no sequence", path);
    }
    match rset.iter().next() {
        Some(rec) => {
            let rec = rec.map_err(|e| anyhow!("malformed record in {}: {}", path, e))?;
            Ok(NamedSequence {
                name: String::from_utf8_lossy(rec.id()).into_owned(),
                seq: rec.seq().to_ascii_uppercase(),
            })
        }
        None => bail!("{} contains no sequence", path),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
