pub mod bubble;
pub mod cli;
pub mod graph;
pub mod io;
pub mod simulate;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
