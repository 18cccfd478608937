use thiserror::Error;

use crate::machine::SlotRole;

/// Error classes used by callers to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Malformed alphabet, permutation, rotor, setting or plugboard description.
    Config,
    /// Symbol not present in the alphabet.
    Lookup,
    /// Index outside `0..size`.
    Range,
    /// Machine shape or lifecycle violation.
    Invariant,
}

/// Every failure the cipher core can report.
///
/// All operations returning this error are all-or-nothing: the receiver is
/// left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum EnigmaError {
    /// Alphabet with no symbols.
    #[error("alphabet must contain at least one symbol")]
    EmptyAlphabet,
    /// Alphabet symbol that would be ambiguous in cycle or setting notation.
    #[error("symbol {symbol:?} cannot be part of an alphabet")]
    ReservedSymbol {
        /// The rejected symbol.
        symbol: char,
    },
    /// Alphabet listing the same symbol twice.
    #[error("duplicate symbol {symbol:?} in alphabet")]
    DuplicateSymbol {
        /// The repeated symbol.
        symbol: char,
    },
    /// Cycle notation with unmatched or nested parentheses.
    #[error("unbalanced parentheses in cycle specification {spec:?}")]
    UnbalancedCycles {
        /// The offending specification.
        spec: String,
    },
    /// Single cycle that is empty or carries its own parentheses.
    #[error("cycle {cycle:?} must list at least one symbol and no parentheses")]
    MalformedCycle {
        /// The rejected cycle.
        cycle: String,
    },
    /// Symbol written outside of any parenthesised cycle.
    #[error("symbol {symbol:?} appears outside of a cycle")]
    StraySymbol {
        /// The stray symbol.
        symbol: char,
    },
    /// Cycle symbol that the alphabet does not contain.
    #[error("cycle symbol {symbol:?} is not in the alphabet")]
    CycleSymbolNotInAlphabet {
        /// The unknown symbol.
        symbol: char,
    },
    /// Symbol listed in more than one position across all cycles.
    #[error("symbol {symbol:?} appears in more than one cycle position")]
    CycleConflict {
        /// The repeated symbol.
        symbol: char,
    },
    /// Reflector whose permutation has a fixed point.
    #[error("reflector {name} must not map any symbol to itself")]
    NotADerangement {
        /// Reflector name.
        name: String,
    },
    /// Notch symbol that the alphabet does not contain.
    #[error("notch {symbol:?} of rotor {name} is not in the alphabet")]
    InvalidNotch {
        /// Rotor name.
        name: String,
        /// The unknown notch symbol.
        symbol: char,
    },
    /// Two catalog templates with the same name.
    #[error("rotor {name} is defined more than once")]
    DuplicateRotorName {
        /// The repeated name.
        name: String,
    },
    /// Permutation or template built over a different alphabet.
    #[error("permutation alphabet does not match the machine alphabet")]
    AlphabetMismatch,
    /// Rotor name list with the wrong number of entries.
    #[error("expected {expected} rotors, found {found}")]
    RotorCountMismatch {
        /// Number of slots in the machine.
        expected: usize,
        /// Number of names supplied.
        found: usize,
    },
    /// Rotor name with no catalog entry.
    #[error("unknown rotor {name}")]
    UnknownRotor {
        /// The unresolved name.
        name: String,
    },
    /// Same rotor named for two slots.
    #[error("rotor {name} is used more than once")]
    RepeatedRotor {
        /// The repeated name.
        name: String,
    },
    /// Rotor whose kind does not fit the slot it was placed in.
    #[error("rotor {name} cannot be placed in slot {slot}: slot requires a {expected} rotor")]
    MisplacedRotor {
        /// Rotor name.
        name: String,
        /// Zero-based slot index (0 is the reflector).
        slot: usize,
        /// Kind the slot requires.
        expected: SlotRole,
    },
    /// Setting string with the wrong number of symbols.
    #[error("expected {expected} setting symbols, found {found}")]
    SettingLength {
        /// Number of non-reflector slots.
        expected: usize,
        /// Number of symbols supplied.
        found: usize,
    },
    /// Symbol outside the alphabet.
    #[error("symbol {symbol:?} is not in the alphabet")]
    UnknownSymbol {
        /// The unknown symbol.
        symbol: char,
    },
    /// Index outside `0..size`.
    #[error("index {index} is out of range for alphabet of size {size}")]
    IndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// Alphabet size.
        size: usize,
    },
    /// Slot/pawl counts that cannot form a machine.
    #[error("invalid machine shape: {slots} slots with {pawls} pawls")]
    InvalidShape {
        /// Number of rotor slots.
        slots: usize,
        /// Number of pawls.
        pawls: usize,
    },
    /// Conversion or setting attempted before any rotors were inserted.
    #[error("no rotors have been inserted")]
    RotorsNotInserted,
}

impl EnigmaError {
    /// Returns the error class for this failure.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownSymbol { .. } => ErrorClass::Lookup,
            Self::IndexOutOfRange { .. } => ErrorClass::Range,
            Self::InvalidShape { .. } | Self::RotorsNotInserted => ErrorClass::Invariant,
            Self::EmptyAlphabet
            | Self::ReservedSymbol { .. }
            | Self::DuplicateSymbol { .. }
            | Self::UnbalancedCycles { .. }
            | Self::MalformedCycle { .. }
            | Self::StraySymbol { .. }
            | Self::CycleSymbolNotInAlphabet { .. }
            | Self::CycleConflict { .. }
            | Self::NotADerangement { .. }
            | Self::InvalidNotch { .. }
            | Self::DuplicateRotorName { .. }
            | Self::AlphabetMismatch
            | Self::RotorCountMismatch { .. }
            | Self::UnknownRotor { .. }
            | Self::RepeatedRotor { .. }
            | Self::MisplacedRotor { .. }
            | Self::SettingLength { .. } => ErrorClass::Config,
        }
    }
}
