//! Core of a rotor cipher machine simulator.
//!
//! The crate models the machine bottom-up: an [`Alphabet`] of symbols, a
//! [`Permutation`] in cycle notation, [`RotorTemplate`]s collected in a
//! [`RotorCatalog`], and the [`Machine`] that seats [`Rotor`] instances in its
//! slots and converts symbols one step at a time.

/// Symbol alphabets.
pub mod alphabet;
pub use alphabet::{Alphabet, LATIN_UPPERCASE};

/// Cycle-notation permutations.
pub mod permutation;
pub use permutation::Permutation;

/// Rotor templates and seated rotor instances.
pub mod rotor;
pub use rotor::{Rotor, RotorKind, RotorTemplate};

/// Named rotor template collections.
pub mod catalog;
pub use catalog::RotorCatalog;

/// Machine assembly, stepping and conversion.
pub mod machine;
pub use machine::{Machine, MachineShape, SlotRole};

/// Error taxonomy shared by every core operation.
pub mod error;
pub use error::{EnigmaError, ErrorClass};

#[cfg(test)]
use proptest as _;
