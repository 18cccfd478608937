//! Symbol alphabet with dense index mapping.

use std::collections::HashMap;
use std::fmt;

use crate::EnigmaError;

/// Symbols of the default machine alphabet.
pub const LATIN_UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Symbols with a meaning of their own in cycle and setting notation.
const RESERVED_SYMBOLS: [char; 3] = ['(', ')', '*'];

/// An ordered set of encodable symbols.
///
/// Symbol number `k` has index `k`. The mapping is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "String", into = "String")
)]
pub struct Alphabet {
    symbols: Vec<char>,
    indices: HashMap<char, usize>,
}

impl Alphabet {
    /// Creates an alphabet from the symbols of `chars`, in order.
    ///
    /// # Errors
    ///
    /// Returns a config-class error when `chars` is empty, repeats a symbol,
    /// or contains whitespace, `(`, `)` or `*`.
    pub fn new(chars: &str) -> Result<Self, EnigmaError> {
        let mut symbols = Vec::with_capacity(chars.len());
        let mut indices = HashMap::with_capacity(chars.len());

        for symbol in chars.chars() {
            if symbol.is_whitespace() || RESERVED_SYMBOLS.contains(&symbol) {
                return Err(EnigmaError::ReservedSymbol { symbol });
            }
            if indices.insert(symbol, symbols.len()).is_some() {
                return Err(EnigmaError::DuplicateSymbol { symbol });
            }
            symbols.push(symbol);
        }

        if symbols.is_empty() {
            return Err(EnigmaError::EmptyAlphabet);
        }

        Ok(Self { symbols, indices })
    }

    /// Returns the number of symbols.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` when `symbol` belongs to this alphabet.
    #[must_use]
    pub fn contains(&self, symbol: char) -> bool {
        self.indices.contains_key(&symbol)
    }

    /// Returns the symbol at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::IndexOutOfRange`] when `index >= size()`.
    pub fn to_char(&self, index: usize) -> Result<char, EnigmaError> {
        self.symbols
            .get(index)
            .copied()
            .ok_or_else(|| EnigmaError::IndexOutOfRange {
                index,
                size: self.size(),
            })
    }

    /// Returns the index of `symbol`. Inverse of [`Alphabet::to_char`].
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::UnknownSymbol`] when `symbol` is absent.
    pub fn to_int(&self, symbol: char) -> Result<usize, EnigmaError> {
        self.indices
            .get(&symbol)
            .copied()
            .ok_or(EnigmaError::UnknownSymbol { symbol })
    }

    /// Iterates the symbols in index order.
    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.symbols.iter().copied()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        let symbols: Vec<char> = LATIN_UPPERCASE.chars().collect();
        let indices = symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (*symbol, index))
            .collect();
        Self { symbols, indices }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols
            .iter()
            .try_for_each(|symbol| write!(f, "{symbol}"))
    }
}

impl TryFrom<String> for Alphabet {
    type Error = EnigmaError;

    fn try_from(chars: String) -> Result<Self, Self::Error> {
        Self::new(&chars)
    }
}

impl From<Alphabet> for String {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.symbols.into_iter().collect()
    }
}
