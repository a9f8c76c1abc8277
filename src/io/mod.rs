pub mod bank;
pub mod fastx;
pub mod run_info;

pub use bank::{FastaBank, MemoryBank, SequenceBank, SequenceRecord};
