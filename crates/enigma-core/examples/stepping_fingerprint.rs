//! Deterministic conversion fingerprint used for cross-host comparison.
//!
//! Every thread builds its own machine from one shared catalog, walks the
//! same sequence of settings and hashes the ciphertext and final rotor
//! positions. All threads must agree, and the printed hash must match across
//! hosts.
//!
//! ```sh
//! cargo run -p enigma-core --example stepping_fingerprint
//! ```

use std::sync::Arc;
use std::thread;

use enigma_core::{
    Alphabet, EnigmaError, Machine, MachineShape, Permutation, RotorCatalog, RotorTemplate,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const NUM_THREADS: usize = 4;
const MESSAGE: &str = "THEQUICKBROWNFOXJUMPSOVERTHELAZYDOG";

fn catalog() -> Result<Arc<RotorCatalog>, EnigmaError> {
    let alphabet = Arc::new(Alphabet::default());
    let mut catalog = RotorCatalog::new(&alphabet);
    let moving = [
        ("I", "(AELTPHQXRU) (BKNW) (CMOY) (DFG) (IV) (JZ) (S)", "Q"),
        (
            "II",
            "(FIXVYOMW) (CDKLHUP) (ESZ) (BJ) (GR) (NT) (A) (Q)",
            "E",
        ),
        ("III", "(ABDHPEJT) (CFLVMZOYQIRWUKXSG) (N)", "V"),
    ];
    for (name, cycles, notches) in moving {
        let wiring = Permutation::new(cycles, &alphabet)?;
        catalog.insert(RotorTemplate::moving(name, wiring, notches)?)?;
    }
    let reflector = Permutation::new(
        "(AY) (BR) (CU) (DH) (EQ) (FS) (GL) (IP) (JX) (KN) (MO) (TZ) (VW)",
        &alphabet,
    )?;
    catalog.insert(RotorTemplate::reflector("B", reflector)?)?;
    Ok(Arc::new(catalog))
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint(catalog: Arc<RotorCatalog>) -> Result<String, EnigmaError> {
    let shape = MachineShape::new(4, 3)?;
    let mut machine = Machine::new(shape, catalog);
    machine.insert_rotors(["B", "I", "II", "III"])?;
    let plugboard = Permutation::new("(AQ) (BW) (EZ)", machine.alphabet())?;
    machine.set_plugboard(plugboard)?;

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    let symbols: Vec<char> = machine.alphabet().symbols().collect();
    for (n, first) in symbols.iter().enumerate() {
        let second = symbols[(n * 7) % symbols.len()];
        let third = symbols[(n * 11) % symbols.len()];
        machine.set_rotors(&format!("{first}{second}{third}"))?;

        for _ in 0..40 {
            let cipher = machine.convert_message(MESSAGE)?;
            hash_bytes(&mut hash, cipher.as_bytes());
        }
        hash_bytes(&mut hash, machine.settings().as_bytes());
    }

    Ok(format!("{hash:016x}"))
}

fn main() -> Result<(), EnigmaError> {
    let catalog = catalog()?;
    let workers: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || fingerprint(catalog))
        })
        .collect();

    let mut results = Vec::with_capacity(NUM_THREADS);
    for worker in workers {
        match worker.join() {
            Ok(result) => results.push(result?),
            Err(_) => {
                eprintln!("error: fingerprint worker panicked");
                std::process::exit(1);
            }
        }
    }

    if results.windows(2).any(|pair| pair[0] != pair[1]) {
        eprintln!("error: threads disagree: {results:?}");
        std::process::exit(1);
    }
    println!("{}", results[0]);
    Ok(())
}
