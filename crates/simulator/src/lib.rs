//! File formats and message sessions for the rotor cipher simulator.
//!
//! A [`config::MachineConfig`] is parsed once from a machine description and
//! then drives a [`session::Session`], which reads setting lines and messages
//! and writes the converted text in groups of five.

/// Machine description parsing.
pub mod config;
/// Ciphertext grouping.
pub mod output;
/// Line-oriented message sessions.
pub mod session;

#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
