// crates/platerec-cli/src/cmd/mod.rs

pub mod reconstruct;
