//! Permutations over alphabet indices written in cycle notation.
//!
//! A specification such as `"(AELT) (BKNW) (S)"` lists disjoint cycles: each
//! symbol maps to the next one in its cycle and the last wraps to the first.
//! Symbols that appear in no cycle map to themselves. Whitespace is ignored.
//!
//! Lookups go through index tables rebuilt whenever cycles are added, so
//! [`Permutation::permute`] and [`Permutation::invert`] are constant time.

use std::fmt;
use std::sync::Arc;

use crate::{Alphabet, EnigmaError};

/// A bijection over the indices of one [`Alphabet`].
#[derive(Debug, Clone)]
pub struct Permutation {
    alphabet: Arc<Alphabet>,
    cycles: Vec<Vec<usize>>,
    forward: Vec<usize>,
    inverse: Vec<usize>,
}

impl Permutation {
    /// Parses `spec` in cycle notation over `alphabet`.
    ///
    /// # Errors
    ///
    /// Returns a config-class error when parentheses are unbalanced or
    /// nested, a symbol is written outside a cycle, a symbol is not in the
    /// alphabet, or a symbol occurs more than once.
    pub fn new(spec: &str, alphabet: &Arc<Alphabet>) -> Result<Self, EnigmaError> {
        let cycles = parse_cycles(spec, alphabet)?;
        Self::from_cycles(Arc::clone(alphabet), cycles)
    }

    /// Returns the permutation that maps every index to itself.
    #[must_use]
    pub fn identity(alphabet: &Arc<Alphabet>) -> Self {
        let size = alphabet.size();
        Self {
            alphabet: Arc::clone(alphabet),
            cycles: Vec::new(),
            forward: (0..size).collect(),
            inverse: (0..size).collect(),
        }
    }

    fn from_cycles(alphabet: Arc<Alphabet>, cycles: Vec<Vec<usize>>) -> Result<Self, EnigmaError> {
        let size = alphabet.size();
        let mut forward: Vec<usize> = (0..size).collect();
        let mut inverse: Vec<usize> = (0..size).collect();
        let mut seen = vec![false; size];

        for cycle in &cycles {
            for (position, &index) in cycle.iter().enumerate() {
                if std::mem::replace(&mut seen[index], true) {
                    return Err(EnigmaError::CycleConflict {
                        symbol: alphabet.to_char(index)?,
                    });
                }
                let next = cycle[(position + 1) % cycle.len()];
                forward[index] = next;
                inverse[next] = index;
            }
        }

        Ok(Self {
            alphabet,
            cycles,
            forward,
            inverse,
        })
    }

    /// Appends the cycle `c0 -> c1 -> ... -> cm -> c0`, given as the bare
    /// symbols `c0c1...cm`.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::MalformedCycle`] when `cycle` is blank or
    /// contains a parenthesis. Otherwise the same conditions as
    /// [`Permutation::new`] apply; in particular a symbol that already belongs
    /// to an existing cycle is a [`EnigmaError::CycleConflict`].
    /// The permutation is unchanged on error.
    pub fn add_cycle(&mut self, cycle: &str) -> Result<(), EnigmaError> {
        if cycle.trim().is_empty() || cycle.contains(['(', ')']) {
            return Err(EnigmaError::MalformedCycle {
                cycle: cycle.to_string(),
            });
        }
        self.add_cycles(&format!("({cycle})"))
    }

    /// Appends every cycle of `spec`, written in cycle notation.
    ///
    /// This is how multi-line rotor definitions are assembled.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Permutation::new`], checked against the union of
    /// existing and new cycles. The permutation is unchanged on error.
    pub fn add_cycles(&mut self, spec: &str) -> Result<(), EnigmaError> {
        let mut cycles = self.cycles.clone();
        cycles.extend(parse_cycles(spec, &self.alphabet)?);
        *self = Self::from_cycles(Arc::clone(&self.alphabet), cycles)?;
        Ok(())
    }

    /// Returns the size of the permuted alphabet.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.forward.len()
    }

    /// Returns the alphabet this permutation is defined over.
    #[must_use]
    pub const fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    /// Returns the cycles as index sequences, in definition order.
    #[must_use]
    pub fn cycles(&self) -> &[Vec<usize>] {
        &self.cycles
    }

    /// Applies the permutation to `index`, taken modulo the alphabet size.
    #[must_use]
    pub fn permute(&self, index: usize) -> usize {
        self.forward[index % self.size()]
    }

    /// Applies the inverse permutation to `index`, taken modulo the alphabet
    /// size.
    #[must_use]
    pub fn invert(&self, index: usize) -> usize {
        self.inverse[index % self.size()]
    }

    /// Applies the permutation to a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::UnknownSymbol`] when `symbol` is not in the
    /// alphabet.
    pub fn permute_char(&self, symbol: char) -> Result<char, EnigmaError> {
        let index = self.alphabet.to_int(symbol)?;
        self.alphabet.to_char(self.permute(index))
    }

    /// Applies the inverse permutation to a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::UnknownSymbol`] when `symbol` is not in the
    /// alphabet.
    pub fn invert_char(&self, symbol: char) -> Result<char, EnigmaError> {
        let index = self.alphabet.to_int(symbol)?;
        self.alphabet.to_char(self.invert(index))
    }

    /// Returns `true` when no symbol maps to itself.
    #[must_use]
    pub fn derangement(&self) -> bool {
        let covered: usize = self
            .cycles
            .iter()
            .filter(|cycle| cycle.len() >= 2)
            .map(Vec::len)
            .sum();
        covered == self.size()
    }

    /// Returns `true` when the permutation is its own inverse, i.e. every
    /// cycle swaps at most two symbols.
    #[must_use]
    pub fn is_involution(&self) -> bool {
        self.cycles.iter().all(|cycle| cycle.len() <= 2)
    }
}

impl PartialEq for Permutation {
    fn eq(&self, other: &Self) -> bool {
        self.alphabet == other.alphabet && self.forward == other.forward
    }
}

impl Eq for Permutation {}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, cycle) in self.cycles.iter().enumerate() {
            if n > 0 {
                f.write_str(" ")?;
            }
            f.write_str("(")?;
            for &index in cycle {
                let symbol = self.alphabet.to_char(index).map_err(|_| fmt::Error)?;
                write!(f, "{symbol}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

fn parse_cycles(spec: &str, alphabet: &Alphabet) -> Result<Vec<Vec<usize>>, EnigmaError> {
    let unbalanced = || EnigmaError::UnbalancedCycles {
        spec: spec.to_string(),
    };
    let mut cycles = Vec::new();
    let mut open: Option<Vec<usize>> = None;

    for symbol in spec.chars() {
        match symbol {
            c if c.is_whitespace() => {}
            '(' => {
                if open.replace(Vec::new()).is_some() {
                    return Err(unbalanced());
                }
            }
            ')' => {
                let cycle = open.take().ok_or_else(unbalanced)?;
                // `()` is accepted and contributes nothing.
                if !cycle.is_empty() {
                    cycles.push(cycle);
                }
            }
            _ => {
                let cycle = open.as_mut().ok_or(EnigmaError::StraySymbol { symbol })?;
                let index = alphabet
                    .to_int(symbol)
                    .map_err(|_| EnigmaError::CycleSymbolNotInAlphabet { symbol })?;
                cycle.push(index);
            }
        }
    }

    if open.is_some() {
        return Err(unbalanced());
    }
    Ok(cycles)
}
