//! Transcript Store
//!
//! Tracks the turn-by-turn record of each active run in memory and
//! persists it when the run ends. Per-run state machine:
//!
//! ```text
//! not started ──start_run──► running ──end_run──► completed | failed | canceled
//! ```
//!
//! Only a running run accepts turns, tool calls and cost. Once ended, a run
//! is only ever read back from disk.

mod active;
mod filter;
mod persist;
mod store;

pub use active::{ActiveRun, ActiveRunTable, RunHandle};
pub use filter::RunFilter;
pub use persist::{load_transcript, save_transcript};
pub use store::TranscriptStore;
