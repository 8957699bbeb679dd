// crates/platerec-cli/src/io/mod.rs

pub mod inputs;
