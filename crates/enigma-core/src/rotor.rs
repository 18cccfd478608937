//! Rotor templates and per-machine rotor instances.
//!
//! A [`RotorTemplate`] is the immutable description of a physical rotor: its
//! name, wiring and kind. Templates are shared through [`Arc`] between every
//! machine that uses them. A [`Rotor`] pairs a template with the angular
//! setting owned by exactly one machine slot, so stepping one machine never
//! moves the rotors of another.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{Alphabet, EnigmaError, Permutation};

/// Behavioural variant of a rotor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RotorKind {
    /// Turnaround rotor at slot 0. Never advances.
    Reflector,
    /// Non-stepping rotor left of the pawls.
    Fixed,
    /// Stepping rotor driven by a pawl.
    Moving {
        /// Alphabet indices of the settings at which the notch engages.
        notches: BTreeSet<usize>,
    },
}

/// Immutable catalog entry describing one rotor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotorTemplate {
    name: String,
    permutation: Permutation,
    kind: RotorKind,
}

impl RotorTemplate {
    /// Creates a reflector.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::NotADerangement`] when `permutation` has a fixed
    /// point.
    pub fn reflector(
        name: impl Into<String>,
        permutation: Permutation,
    ) -> Result<Self, EnigmaError> {
        let name = name.into();
        if !permutation.derangement() {
            return Err(EnigmaError::NotADerangement { name });
        }
        Ok(Self {
            name,
            permutation,
            kind: RotorKind::Reflector,
        })
    }

    /// Creates a non-moving rotor.
    #[must_use]
    pub fn fixed(name: impl Into<String>, permutation: Permutation) -> Self {
        Self {
            name: name.into(),
            permutation,
            kind: RotorKind::Fixed,
        }
    }

    /// Creates a moving rotor whose notches sit at the symbols of `notches`.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::InvalidNotch`] when a notch symbol is not in the
    /// permutation's alphabet.
    pub fn moving(
        name: impl Into<String>,
        permutation: Permutation,
        notches: &str,
    ) -> Result<Self, EnigmaError> {
        let name = name.into();
        let alphabet = permutation.alphabet();
        let invalid = |symbol| EnigmaError::InvalidNotch {
            name: name.clone(),
            symbol,
        };
        let notches = notches
            .chars()
            .map(|symbol| alphabet.to_int(symbol).map_err(|_| invalid(symbol)))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            name,
            permutation,
            kind: RotorKind::Moving { notches },
        })
    }

    /// Returns the rotor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the wiring at setting 0.
    #[must_use]
    pub const fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    /// Returns the rotor kind.
    #[must_use]
    pub const fn kind(&self) -> &RotorKind {
        &self.kind
    }

    /// Returns the alphabet of the wiring.
    #[must_use]
    pub const fn alphabet(&self) -> &Arc<Alphabet> {
        self.permutation.alphabet()
    }

    /// Returns `true` for moving rotors.
    #[must_use]
    pub const fn rotates(&self) -> bool {
        matches!(self.kind, RotorKind::Moving { .. })
    }

    /// Returns `true` for reflectors.
    #[must_use]
    pub const fn reflecting(&self) -> bool {
        matches!(self.kind, RotorKind::Reflector)
    }
}

/// A rotor seated in a machine slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotor {
    template: Arc<RotorTemplate>,
    setting: usize,
}

impl Rotor {
    /// Creates an instance of `template` at setting 0.
    #[must_use]
    pub const fn new(template: Arc<RotorTemplate>) -> Self {
        Self {
            template,
            setting: 0,
        }
    }

    /// Returns the shared template.
    #[must_use]
    pub const fn template(&self) -> &Arc<RotorTemplate> {
        &self.template
    }

    /// Returns the rotor name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.template.name()
    }

    /// Returns the wiring at setting 0.
    #[must_use]
    pub fn permutation(&self) -> &Permutation {
        self.template.permutation()
    }

    /// Returns the size of the rotor alphabet.
    #[must_use]
    pub fn size(&self) -> usize {
        self.template.permutation().size()
    }

    /// Returns `true` when the rotor has a ratchet and can move.
    #[must_use]
    pub fn rotates(&self) -> bool {
        self.template.rotates()
    }

    /// Returns `true` when the rotor is a reflector.
    #[must_use]
    pub fn reflecting(&self) -> bool {
        self.template.reflecting()
    }

    /// Returns the current setting.
    #[must_use]
    pub const fn setting(&self) -> usize {
        self.setting
    }

    /// Returns the alphabet symbol of the current setting.
    ///
    /// # Errors
    ///
    /// Never fails for a rotor whose setting was assigned through
    /// [`Rotor::set`] or [`Rotor::set_char`].
    pub fn setting_char(&self) -> Result<char, EnigmaError> {
        self.template.alphabet().to_char(self.setting)
    }

    /// Sets the setting to `posn`.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::IndexOutOfRange`] when `posn >= size()`.
    pub fn set(&mut self, posn: usize) -> Result<(), EnigmaError> {
        let size = self.size();
        if posn >= size {
            return Err(EnigmaError::IndexOutOfRange { index: posn, size });
        }
        self.setting = posn;
        Ok(())
    }

    /// Sets the setting to the index of `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::UnknownSymbol`] when `symbol` is not in the
    /// alphabet.
    pub fn set_char(&mut self, symbol: char) -> Result<(), EnigmaError> {
        let posn = self.template.alphabet().to_int(symbol)?;
        self.set(posn)
    }

    /// Returns `true` when the rotor is positioned to let its left neighbour
    /// advance.
    #[must_use]
    pub fn at_notch(&self) -> bool {
        match &self.template.kind {
            RotorKind::Moving { notches } => notches.contains(&self.setting),
            RotorKind::Reflector | RotorKind::Fixed => false,
        }
    }

    /// Advances one position. Only moving rotors advance.
    pub fn advance(&mut self) {
        match self.template.kind {
            RotorKind::Moving { .. } => self.setting = (self.setting + 1) % self.size(),
            RotorKind::Reflector | RotorKind::Fixed => {}
        }
    }

    /// Converts `p` through the wiring, correcting for the current setting.
    #[must_use]
    pub fn convert_forward(&self, p: usize) -> usize {
        let size = self.size();
        let contact = self.permutation().permute((p + self.setting) % size);
        (contact + size - self.setting) % size
    }

    /// Converts `e` through the inverse wiring, correcting for the current
    /// setting.
    #[must_use]
    pub fn convert_backward(&self, e: usize) -> usize {
        let size = self.size();
        let contact = self.permutation().invert((e + self.setting) % size);
        (contact + size - self.setting) % size
    }
}
