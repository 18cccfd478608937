//! The assembled cipher machine: rotor stack, plugboard and stepping.
//!
//! Slot 0 always holds the reflector; slots `1..slots` run left to right.
//! The `pawls` rightmost slots hold moving rotors and every slot between the
//! reflector and the pawls holds a fixed rotor.
//!
//! Each call to [`Machine::convert`] is one atomic transition:
//!
//! 1. decide which slots advance, using only the settings before the step;
//! 2. advance them all at once;
//! 3. pass the signal through the plugboard, the rotors from right to left,
//!    the reflector, the rotors from left to right and the inverse plugboard.
//!
//! The advance rule reproduces the historical double step: the rightmost
//! rotor always advances, and any moving rotor whose right neighbour sits at
//! a notch advances together with that neighbour.

use std::fmt;
use std::sync::Arc;

use crate::{Alphabet, EnigmaError, Permutation, Rotor, RotorCatalog, RotorKind};

/// Kind of rotor a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SlotRole {
    /// Slot 0.
    Reflector,
    /// Slots between the reflector and the pawls.
    Fixed,
    /// The rightmost `pawls` slots.
    Moving,
}

impl SlotRole {
    /// Returns the role a rotor of `kind` can fill.
    #[must_use]
    pub const fn of(kind: &RotorKind) -> Self {
        match kind {
            RotorKind::Reflector => Self::Reflector,
            RotorKind::Fixed => Self::Fixed,
            RotorKind::Moving { .. } => Self::Moving,
        }
    }
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reflector => "reflector",
            Self::Fixed => "fixed",
            Self::Moving => "moving",
        })
    }
}

/// Slot and pawl counts of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "(usize, usize)", into = "(usize, usize)")
)]
pub struct MachineShape {
    slots: usize,
    pawls: usize,
}

impl MachineShape {
    /// Creates a shape with `slots` rotor slots and `pawls` pawls.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::InvalidShape`] unless `slots >= 2` and
    /// `pawls < slots`.
    pub const fn new(slots: usize, pawls: usize) -> Result<Self, EnigmaError> {
        if slots < 2 || pawls >= slots {
            return Err(EnigmaError::InvalidShape { slots, pawls });
        }
        Ok(Self { slots, pawls })
    }

    /// Returns the number of rotor slots, reflector included.
    #[must_use]
    pub const fn slots(self) -> usize {
        self.slots
    }

    /// Returns the number of pawls.
    #[must_use]
    pub const fn pawls(self) -> usize {
        self.pawls
    }

    /// Returns the leftmost slot driven by a pawl.
    #[must_use]
    pub const fn first_moving_slot(self) -> usize {
        self.slots - self.pawls
    }

    /// Returns the role of `slot`.
    #[must_use]
    pub const fn role(self, slot: usize) -> SlotRole {
        if slot == 0 {
            SlotRole::Reflector
        } else if slot < self.first_moving_slot() {
            SlotRole::Fixed
        } else {
            SlotRole::Moving
        }
    }
}

impl TryFrom<(usize, usize)> for MachineShape {
    type Error = EnigmaError;

    fn try_from((slots, pawls): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(slots, pawls)
    }
}

impl From<MachineShape> for (usize, usize) {
    fn from(shape: MachineShape) -> Self {
        (shape.slots, shape.pawls)
    }
}

/// A rotor cipher machine.
///
/// The machine owns its rotor instances; the catalog only supplies the
/// templates they are built from. Conversions take `&mut self` because every
/// symbol steps the rotors.
#[derive(Debug, Clone)]
pub struct Machine {
    shape: MachineShape,
    catalog: Arc<RotorCatalog>,
    rotors: Vec<Rotor>,
    plugboard: Option<Permutation>,
}

impl Machine {
    /// Creates a machine of the given shape with no rotors inserted.
    #[must_use]
    pub const fn new(shape: MachineShape, catalog: Arc<RotorCatalog>) -> Self {
        Self {
            shape,
            catalog,
            rotors: Vec::new(),
            plugboard: None,
        }
    }

    /// Returns the machine shape.
    #[must_use]
    pub const fn shape(&self) -> MachineShape {
        self.shape
    }

    /// Returns the rotor catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Arc<RotorCatalog> {
        &self.catalog
    }

    /// Returns the machine alphabet.
    #[must_use]
    pub fn alphabet(&self) -> &Arc<Alphabet> {
        self.catalog.alphabet()
    }

    /// Returns the inserted rotors, reflector first. Empty until
    /// [`Machine::insert_rotors`] succeeds.
    #[must_use]
    pub fn rotors(&self) -> &[Rotor] {
        &self.rotors
    }

    /// Returns the rotor in `slot`.
    #[must_use]
    pub fn rotor(&self, slot: usize) -> Option<&Rotor> {
        self.rotors.get(slot)
    }

    /// Returns the installed plugboard.
    #[must_use]
    pub const fn plugboard(&self) -> Option<&Permutation> {
        self.plugboard.as_ref()
    }

    /// Fills every slot with a fresh instance of the named rotor, reflector
    /// first. All settings start at 0; the plugboard is left as it is.
    ///
    /// # Errors
    ///
    /// Returns a config-class error when the number of names differs from the
    /// slot count, a name is unknown or repeated, or a rotor does not fit its
    /// slot. The previous rotors stay in place on error.
    pub fn insert_rotors<I, S>(&mut self, names: I) -> Result<(), EnigmaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        if names.len() != self.shape.slots() {
            return Err(EnigmaError::RotorCountMismatch {
                expected: self.shape.slots(),
                found: names.len(),
            });
        }

        let mut rotors: Vec<Rotor> = Vec::with_capacity(names.len());
        for (slot, name) in names.iter().map(AsRef::as_ref).enumerate() {
            if rotors.iter().any(|rotor| rotor.name() == name) {
                return Err(EnigmaError::RepeatedRotor {
                    name: name.to_string(),
                });
            }

            let rotor = self.catalog.instantiate(name)?;
            let expected = self.shape.role(slot);
            if SlotRole::of(rotor.template().kind()) != expected {
                return Err(EnigmaError::MisplacedRotor {
                    name: name.to_string(),
                    slot,
                    expected,
                });
            }
            rotors.push(rotor);
        }

        self.rotors = rotors;
        Ok(())
    }

    /// Sets the rotors right of the reflector from `setting`, one symbol per
    /// slot, leftmost first.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::RotorsNotInserted`] before the first
    /// [`Machine::insert_rotors`], [`EnigmaError::SettingLength`] when
    /// `setting` does not have one symbol per non-reflector slot, and
    /// [`EnigmaError::UnknownSymbol`] for a symbol outside the alphabet. No
    /// rotor changes on error.
    pub fn set_rotors(&mut self, setting: &str) -> Result<(), EnigmaError> {
        if self.rotors.is_empty() {
            return Err(EnigmaError::RotorsNotInserted);
        }

        let expected = self.shape.slots() - 1;
        let found = setting.chars().count();
        if found != expected {
            return Err(EnigmaError::SettingLength { expected, found });
        }

        let alphabet = self.catalog.alphabet();
        let positions = setting
            .chars()
            .map(|symbol| alphabet.to_int(symbol))
            .collect::<Result<Vec<_>, _>>()?;

        for (rotor, posn) in self.rotors[1..].iter_mut().zip(positions) {
            rotor.set(posn)?;
        }
        Ok(())
    }

    /// Installs `plugboard`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::AlphabetMismatch`] when the plugboard is defined
    /// over another alphabet.
    pub fn set_plugboard(&mut self, plugboard: Permutation) -> Result<(), EnigmaError> {
        if **plugboard.alphabet() != **self.alphabet() {
            return Err(EnigmaError::AlphabetMismatch);
        }
        self.plugboard = Some(plugboard);
        Ok(())
    }

    /// Removes the plugboard, so no symbols are swapped.
    pub fn clear_plugboard(&mut self) {
        self.plugboard = None;
    }

    /// Returns the current settings of the non-reflector rotors as symbols,
    /// leftmost first.
    #[must_use]
    pub fn settings(&self) -> String {
        self.rotors
            .iter()
            .skip(1)
            .filter_map(|rotor| rotor.setting_char().ok())
            .collect()
    }

    /// Steps the rotors and converts the symbol with index `index`.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::RotorsNotInserted`] before the first
    /// [`Machine::insert_rotors`] and [`EnigmaError::IndexOutOfRange`] for an
    /// index outside the alphabet. The rotors do not step on error.
    pub fn convert(&mut self, index: usize) -> Result<usize, EnigmaError> {
        if self.rotors.is_empty() {
            return Err(EnigmaError::RotorsNotInserted);
        }
        let size = self.alphabet().size();
        if index >= size {
            return Err(EnigmaError::IndexOutOfRange { index, size });
        }

        self.step();

        let mut signal = self
            .plugboard
            .as_ref()
            .map_or(index, |plugboard| plugboard.permute(index));
        for rotor in self.rotors.iter().rev() {
            signal = rotor.convert_forward(signal);
        }
        for rotor in &self.rotors[1..] {
            signal = rotor.convert_backward(signal);
        }
        Ok(self
            .plugboard
            .as_ref()
            .map_or(signal, |plugboard| plugboard.invert(signal)))
    }

    /// Converts every non-whitespace symbol of `msg` in order, stepping
    /// before each one.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::RotorsNotInserted`] before the first
    /// [`Machine::insert_rotors`] and [`EnigmaError::UnknownSymbol`] when any
    /// symbol is outside the alphabet. Every symbol is checked before the
    /// first one is converted, so the rotors do not move on error.
    pub fn convert_message(&mut self, msg: &str) -> Result<String, EnigmaError> {
        if self.rotors.is_empty() {
            return Err(EnigmaError::RotorsNotInserted);
        }

        let alphabet = Arc::clone(self.alphabet());
        let indices = msg
            .chars()
            .filter(|symbol| !symbol.is_whitespace())
            .map(|symbol| alphabet.to_int(symbol))
            .collect::<Result<Vec<_>, _>>()?;

        indices
            .into_iter()
            .map(|index| {
                self.convert(index)
                    .and_then(|converted| alphabet.to_char(converted))
            })
            .collect()
    }

    fn step(&mut self) {
        let slots = self.rotors.len();
        let mut advances = vec![false; slots];

        if self.shape.pawls() > 0 {
            advances[slots - 1] = true;
        }
        for slot in self.shape.first_moving_slot()..slots - 1 {
            if self.rotors[slot + 1].at_notch() {
                advances[slot] = true;
                advances[slot + 1] = true;
            }
        }

        for (rotor, advance) in self.rotors.iter_mut().zip(advances) {
            if advance {
                rotor.advance();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Machine, MachineShape, SlotRole};
    use crate::{Alphabet, EnigmaError, ErrorClass, Permutation, RotorCatalog, RotorTemplate};
    use rstest::rstest;

    const ROTORS: [(&str, &str, &str); 4] = [
        ("I", "(AELTPHQXRU) (BKNW) (CMOY) (DFG) (IV) (JZ) (S)", "Q"),
        (
            "II",
            "(FIXVYOMW) (CDKLHUP) (ESZ) (BJ) (GR) (NT) (A) (Q)",
            "E",
        ),
        ("III", "(ABDHPEJT) (CFLVMZOYQIRWUKXSG) (N)", "V"),
        ("IV", "(AEPLIYWCOXMRFZBSTGJQNH) (DV) (KU)", "J"),
    ];
    const BETA: &str = "(ALBEVFCYODJWUGNMQTZSKPR) (HIX)";
    const REFLECTOR_B: &str = "(AY) (BR) (CU) (DH) (EQ) (FS) (GL) (IP) (JX) (KN) (MO) (TZ) (VW)";

    fn catalog() -> Arc<RotorCatalog> {
        let alphabet = Arc::new(Alphabet::default());
        let mut catalog = RotorCatalog::new(&alphabet);
        for (name, cycles, notches) in ROTORS {
            let wiring = Permutation::new(cycles, &alphabet).expect("valid wiring");
            catalog
                .insert(RotorTemplate::moving(name, wiring, notches).expect("valid rotor"))
                .expect("unique name");
        }
        let beta = Permutation::new(BETA, &alphabet).expect("valid wiring");
        catalog
            .insert(RotorTemplate::fixed("Beta", beta))
            .expect("unique name");
        let b = Permutation::new(REFLECTOR_B, &alphabet).expect("valid wiring");
        catalog
            .insert(RotorTemplate::reflector("B", b).expect("derangement"))
            .expect("unique name");
        Arc::new(catalog)
    }

    fn assembled(slots: usize, pawls: usize, names: &[&str], setting: &str) -> Machine {
        let shape = MachineShape::new(slots, pawls).expect("valid shape");
        let mut machine = Machine::new(shape, catalog());
        machine.insert_rotors(names).expect("valid rotor stack");
        machine.set_rotors(setting).expect("valid setting");
        machine
    }

    fn step_once(machine: &mut Machine) {
        machine.convert(0).expect("valid conversion");
    }

    #[rstest]
    #[case(1, 0)]
    #[case(0, 0)]
    #[case(3, 3)]
    #[case(3, 4)]
    fn invalid_shapes_are_invariant_errors(#[case] slots: usize, #[case] pawls: usize) {
        let error = MachineShape::new(slots, pawls).expect_err("shape must be rejected");
        assert_eq!(error, EnigmaError::InvalidShape { slots, pawls });
        assert_eq!(error.class(), ErrorClass::Invariant);
    }

    #[test]
    fn shape_assigns_slot_roles() {
        let shape = MachineShape::new(5, 3).expect("valid shape");
        assert_eq!(shape.first_moving_slot(), 2);
        let roles: Vec<SlotRole> = (0..5).map(|slot| shape.role(slot)).collect();
        assert_eq!(
            roles,
            [
                SlotRole::Reflector,
                SlotRole::Fixed,
                SlotRole::Moving,
                SlotRole::Moving,
                SlotRole::Moving
            ]
        );
    }

    #[test]
    fn rightmost_rotor_steps_alone_away_from_notches() {
        let mut machine = assembled(3, 2, &["B", "II", "III"], "AA");
        step_once(&mut machine);
        assert_eq!(machine.settings(), "AB");
        assert_eq!(machine.rotor(0).map(crate::Rotor::setting), Some(0));
    }

    #[test]
    fn rightmost_notch_advances_its_left_neighbour() {
        let mut machine = assembled(3, 2, &["B", "II", "III"], "AV");
        step_once(&mut machine);
        assert_eq!(machine.settings(), "BW");
        assert_eq!(machine.rotor(0).map(crate::Rotor::setting), Some(0));
    }

    #[test]
    fn leftmost_moving_rotor_at_notch_does_not_move_the_reflector() {
        let mut machine = assembled(3, 2, &["B", "II", "III"], "EA");
        step_once(&mut machine);
        assert_eq!(machine.settings(), "EB");
    }

    #[test]
    fn middle_rotor_double_steps() {
        let mut machine = assembled(4, 3, &["B", "I", "II", "III"], "ADU");
        let mut trace = Vec::new();
        for _ in 0..3 {
            step_once(&mut machine);
            trace.push(machine.settings());
        }
        assert_eq!(trace, ["ADV", "AEW", "BFX"]);
    }

    #[test]
    fn fixed_rotor_left_of_pawls_never_steps() {
        let mut machine = assembled(5, 3, &["B", "Beta", "I", "II", "III"], "AQEV");
        step_once(&mut machine);
        assert_eq!(machine.settings(), "ARFW");
    }

    #[test]
    fn every_slot_advances_at_most_once_per_step() {
        let mut machine = assembled(5, 4, &["B", "I", "II", "III", "IV"], "AAVJ");
        step_once(&mut machine);
        assert_eq!(machine.settings(), "ABWK");

        let mut machine = assembled(5, 4, &["B", "I", "II", "III", "IV"], "QEVJ");
        step_once(&mut machine);
        assert_eq!(machine.settings(), "RFWK");
    }

    #[test]
    fn no_pawls_means_no_stepping() {
        let shape = MachineShape::new(2, 0).expect("valid shape");
        let mut machine = Machine::new(shape, catalog());
        machine.insert_rotors(["B", "Beta"]).expect("valid stack");
        machine.set_rotors("C").expect("valid setting");
        step_once(&mut machine);
        assert_eq!(machine.settings(), "C");
    }

    #[test]
    fn historical_three_rotor_message() {
        let mut machine = assembled(4, 3, &["B", "I", "II", "III"], "AAA");
        assert_eq!(machine.convert_message("AAAAA"), Ok("BDZGO".to_string()));
        assert_eq!(machine.settings(), "AAF");

        machine.set_rotors("AAA").expect("valid setting");
        assert_eq!(machine.convert_message("BDZ GO"), Ok("AAAAA".to_string()));
    }

    #[rstest]
    #[case(&["B", "I", "II"], EnigmaError::RotorCountMismatch { expected: 4, found: 3 })]
    #[case(&["B", "I", "II", "VIII"], EnigmaError::UnknownRotor { name: "VIII".into() })]
    #[case(&["B", "I", "I", "II"], EnigmaError::RepeatedRotor { name: "I".into() })]
    #[case(
        &["I", "B", "II", "III"],
        EnigmaError::MisplacedRotor { name: "I".into(), slot: 0, expected: SlotRole::Reflector }
    )]
    #[case(
        &["B", "Beta", "II", "III"],
        EnigmaError::MisplacedRotor { name: "Beta".into(), slot: 1, expected: SlotRole::Moving }
    )]
    fn insert_rotors_rejects_bad_stacks(#[case] names: &[&str], #[case] expected: EnigmaError) {
        let shape = MachineShape::new(4, 3).expect("valid shape");
        let mut machine = Machine::new(shape, catalog());
        let error = machine
            .insert_rotors(names)
            .expect_err("stack must be rejected");
        assert_eq!(error, expected);
        assert_eq!(error.class(), ErrorClass::Config);
        assert!(machine.rotors().is_empty());
    }

    #[test]
    fn moving_rotor_is_rejected_in_a_fixed_slot() {
        let shape = MachineShape::new(5, 3).expect("valid shape");
        let mut machine = Machine::new(shape, catalog());
        let error = machine
            .insert_rotors(["B", "IV", "I", "II", "III"])
            .expect_err("IV moves");
        assert_eq!(
            error,
            EnigmaError::MisplacedRotor {
                name: "IV".into(),
                slot: 1,
                expected: SlotRole::Fixed
            }
        );
    }

    #[test]
    fn failed_insert_keeps_previous_stack() {
        let mut machine = assembled(4, 3, &["B", "I", "II", "III"], "XYZ");
        machine
            .insert_rotors(["B", "I", "II", "Beta"])
            .expect_err("Beta cannot move");
        assert_eq!(machine.settings(), "XYZ");
    }

    #[test]
    fn insert_rotors_resets_settings_and_keeps_plugboard() {
        let mut machine = assembled(4, 3, &["B", "I", "II", "III"], "XYZ");
        let plugboard = Permutation::new("(AB)", machine.alphabet()).expect("valid");
        machine.set_plugboard(plugboard).expect("same alphabet");

        machine
            .insert_rotors(["B", "III", "II", "I"])
            .expect("valid stack");
        assert_eq!(machine.settings(), "AAA");
        assert!(machine.plugboard().is_some());
    }

    #[rstest]
    #[case("AA", EnigmaError::SettingLength { expected: 3, found: 2 })]
    #[case("AAAA", EnigmaError::SettingLength { expected: 3, found: 4 })]
    #[case("AaA", EnigmaError::UnknownSymbol { symbol: 'a' })]
    fn set_rotors_rejects_bad_settings(#[case] setting: &str, #[case] expected: EnigmaError) {
        let mut machine = assembled(4, 3, &["B", "I", "II", "III"], "MNO");
        assert_eq!(machine.set_rotors(setting), Err(expected));
        assert_eq!(machine.settings(), "MNO");
    }

    #[test]
    fn operations_before_insert_are_invariant_errors() {
        let shape = MachineShape::new(4, 3).expect("valid shape");
        let mut machine = Machine::new(shape, catalog());
        assert_eq!(
            machine.set_rotors("AAA"),
            Err(EnigmaError::RotorsNotInserted)
        );
        assert_eq!(machine.convert(0), Err(EnigmaError::RotorsNotInserted));
        assert_eq!(
            machine.convert_message("A"),
            Err(EnigmaError::RotorsNotInserted)
        );
    }

    #[test]
    fn out_of_range_index_does_not_step() {
        let mut machine = assembled(4, 3, &["B", "I", "II", "III"], "AAA");
        let error = machine.convert(26).expect_err("index out of range");
        assert_eq!(error.class(), ErrorClass::Range);
        assert_eq!(machine.settings(), "AAA");
    }

    #[test]
    fn unknown_symbol_aborts_message_before_any_step() {
        let mut machine = assembled(4, 3, &["B", "I", "II", "III"], "AAA");
        let error = machine
            .convert_message("HELLO WORLD!")
            .expect_err("! is not in the alphabet");
        assert_eq!(error, EnigmaError::UnknownSymbol { symbol: '!' });
        assert_eq!(error.class(), ErrorClass::Lookup);
        assert_eq!(machine.settings(), "AAA");
    }

    #[test]
    fn plugboard_must_share_the_machine_alphabet() {
        let mut machine = assembled(4, 3, &["B", "I", "II", "III"], "AAA");
        let other = Arc::new(Alphabet::new("AB").expect("valid"));
        let plugboard = Permutation::new("(AB)", &other).expect("valid");
        assert_eq!(
            machine.set_plugboard(plugboard),
            Err(EnigmaError::AlphabetMismatch)
        );
        assert!(machine.plugboard().is_none());
    }

    #[test]
    fn clear_plugboard_restores_identity_wiring() {
        let mut plain = assembled(4, 3, &["B", "I", "II", "III"], "AAA");
        let mut plugged = assembled(4, 3, &["B", "I", "II", "III"], "AAA");
        let plugboard = Permutation::new("(AQ) (EZ)", plugged.alphabet()).expect("valid");
        plugged.set_plugboard(plugboard).expect("same alphabet");
        plugged.clear_plugboard();

        assert_eq!(
            plain.convert_message("ENIGMA"),
            plugged.convert_message("ENIGMA")
        );
    }

    #[test]
    fn machines_sharing_a_catalog_do_not_share_settings() {
        let catalog = catalog();
        let shape = MachineShape::new(4, 3).expect("valid shape");
        let mut first = Machine::new(shape, Arc::clone(&catalog));
        let mut second = Machine::new(shape, catalog);
        first.insert_rotors(["B", "I", "II", "III"]).expect("valid");
        second
            .insert_rotors(["B", "I", "II", "III"])
            .expect("valid");

        first.convert_message("AAAAAAAAAA").expect("valid message");
        assert_eq!(first.settings(), "AAK");
        assert_eq!(second.settings(), "AAA");
        assert_eq!(second.convert_message("AAAAA"), Ok("BDZGO".to_string()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_applies_the_same_checks_as_new() {
        use serde::de::value::{Error, SeqDeserializer};
        use serde::Deserialize;

        let valid = SeqDeserializer::<_, Error>::new([5_usize, 3].into_iter());
        let shape = MachineShape::deserialize(valid).expect("valid shape");
        assert_eq!((shape.slots(), shape.pawls()), (5, 3));

        let crowded = SeqDeserializer::<_, Error>::new([2_usize, 2].into_iter());
        let error = MachineShape::deserialize(crowded).expect_err("2 pawls need 3 slots");
        assert!(error.to_string().contains("invalid machine shape"));
    }
}
