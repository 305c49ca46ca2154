//! Command-line QA tooling for the ansipage codec

pub mod cli;
