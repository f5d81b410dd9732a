//! Wasmperf core library: trace ingestion, performance derivation, and
//! comparative reporting shared by the CLI.

mod analysis;
mod analyze_cmd;
mod config;
mod dataset;
mod derive;
mod error;
mod fit;
mod fsutil;
mod reader;
mod report;
mod schema;
mod trace;

pub use analysis::*;
pub use analyze_cmd::*;
pub use config::*;
pub use dataset::*;
pub use derive::*;
pub use error::*;
pub use fit::*;
pub use fsutil::*;
pub use reader::*;
pub use report::*;
pub use schema::*;
pub use trace::*;
