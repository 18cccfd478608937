#![no_main]

use std::sync::Arc;

use enigma_core::{Alphabet, Machine, MachineShape, Permutation, RotorCatalog, RotorTemplate};
use libfuzzer_sys::fuzz_target;

const REFLECTOR_B: &str = "(AY) (BR) (CU) (DH) (EQ) (FS) (GL) (IP) (JX) (KN) (MO) (TZ) (VW)";

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (spec, message) = text.split_once('|').unwrap_or((text, ""));

    let alphabet = Arc::new(Alphabet::default());
    let Ok(wiring) = Permutation::new(spec, &alphabet) else {
        return;
    };
    for index in 0..alphabet.size() {
        assert_eq!(wiring.invert(wiring.permute(index)), index);
    }

    let mut catalog = RotorCatalog::new(&alphabet);
    let Ok(reflector) = Permutation::new(REFLECTOR_B, &alphabet) else {
        return;
    };
    let Ok(reflector) = RotorTemplate::reflector("B", reflector) else {
        return;
    };
    let Ok(rotor) = RotorTemplate::moving("F", wiring.clone(), "AMZ") else {
        return;
    };
    if catalog.insert(reflector).is_err() || catalog.insert(rotor).is_err() {
        return;
    }
    let _ = catalog.insert(RotorTemplate::fixed("P", wiring));

    let Ok(shape) = MachineShape::new(3, 1) else {
        return;
    };
    let mut machine = Machine::new(shape, Arc::new(catalog));
    if machine.insert_rotors(["B", "P", "F"]).is_err() || machine.set_rotors("AA").is_err() {
        return;
    }

    if let Ok(cipher) = machine.convert_message(message) {
        let _ = machine.set_rotors("AA");
        let plain: String = message.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(machine.convert_message(&cipher).ok(), Some(plain));
    }
});
