// Commands module - entry points driven by the CLI

pub mod replay;

pub use replay::{replay_build, run_replay};
