//! Machine description files.
//!
//! A description is a stream of whitespace-separated tokens:
//!
//! ```text
//! ABCDEFGHIJKLMNOPQRSTUVWXYZ
//! 5 3
//! I     MQ  (AELTPHQXRU) (BKNW) (CMOY) (DFG) (IV) (JZ) (S)
//! Beta  N   (ALBEVFCYODJWUGNMQTZSKPR) (HIX)
//! B     R   (AY) (BR) (CU) (DH) (EQ) (FS) (GL) (IP) (JX) (KN) (MO) (TZ)
//!           (VW)
//! ```
//!
//! The alphabet comes first, then the slot and pawl counts, then one entry
//! per rotor: a name, a type (`M` followed by the notch symbols, `N` or `R`)
//! and the wiring cycles. Cycles may run on over several lines.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use enigma_core::{
    Alphabet, EnigmaError, Machine, MachineShape, Permutation, RotorCatalog, RotorTemplate,
};

/// A parsed machine description.
///
/// The configuration is immutable; every call to [`MachineConfig::machine`]
/// builds an independent machine over the shared catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    shape: MachineShape,
    catalog: Arc<RotorCatalog>,
}

impl MachineConfig {
    /// Creates a configuration from already validated parts.
    #[must_use]
    pub const fn new(shape: MachineShape, catalog: Arc<RotorCatalog>) -> Self {
        Self { shape, catalog }
    }

    /// Parses a machine description.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] carrying the line of the offending token.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut tokens = Tokens::new(text);

        let alphabet_token = tokens.require("alphabet")?;
        let alphabet = Alphabet::new(alphabet_token.text)
            .map(Arc::new)
            .map_err(|error| ConfigError::core(alphabet_token.line, error))?;

        let slots = tokens.require_count("slot count")?;
        let pawls = tokens.require_count("pawl count")?;
        let shape = MachineShape::new(slots.0, pawls.0)
            .map_err(|error| ConfigError::core(pawls.1, error))?;

        let mut catalog = RotorCatalog::new(&alphabet);
        while let Some(name) = tokens.next_token() {
            let line = name.line;
            let template = parse_rotor(name, &mut tokens, &alphabet)?;
            catalog
                .insert(template)
                .map_err(|error| ConfigError::core(line, error))?;
        }

        Ok(Self::new(shape, Arc::new(catalog)))
    }

    /// Returns the slot and pawl counts.
    #[must_use]
    pub const fn shape(&self) -> MachineShape {
        self.shape
    }

    /// Returns the rotors the description defines.
    #[must_use]
    pub const fn catalog(&self) -> &Arc<RotorCatalog> {
        &self.catalog
    }

    /// Returns the machine alphabet.
    #[must_use]
    pub fn alphabet(&self) -> &Arc<Alphabet> {
        self.catalog.alphabet()
    }

    /// Builds a fresh machine with no rotors inserted.
    #[must_use]
    pub fn machine(&self) -> Machine {
        Machine::new(self.shape, Arc::clone(&self.catalog))
    }
}

impl FromStr for MachineConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

fn parse_rotor(
    name: Token<'_>,
    tokens: &mut Tokens<'_>,
    alphabet: &Arc<Alphabet>,
) -> Result<RotorTemplate, ConfigError> {
    if name.text.starts_with('(') {
        return Err(ConfigError::new(
            name.line,
            ConfigErrorKind::ExpectedRotorName {
                token: name.text.to_string(),
            },
        ));
    }

    let kind = tokens.require("rotor type")?;
    let mut type_chars = kind.text.chars();
    let code = type_chars.next();
    let notches = type_chars.as_str();
    match code {
        Some('M') => {}
        Some('N' | 'R') if notches.is_empty() => {}
        Some('N' | 'R') => {
            return Err(ConfigError::new(
                kind.line,
                ConfigErrorKind::UnexpectedNotches {
                    name: name.text.to_string(),
                },
            ));
        }
        _ => {
            return Err(ConfigError::new(
                kind.line,
                ConfigErrorKind::InvalidRotorType {
                    name: name.text.to_string(),
                    token: kind.text.to_string(),
                },
            ));
        }
    }

    let mut wiring = String::new();
    let mut depth = 0_usize;
    while let Some(token) = tokens.next_if(|token| depth > 0 || token.text.starts_with('(')) {
        for symbol in token.text.chars() {
            match symbol {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        if !wiring.is_empty() {
            wiring.push(' ');
        }
        wiring.push_str(token.text);
    }

    let permutation =
        Permutation::new(&wiring, alphabet).map_err(|error| ConfigError::core(name.line, error))?;
    let template = match code {
        Some('M') => RotorTemplate::moving(name.text, permutation, notches),
        Some('R') => RotorTemplate::reflector(name.text, permutation),
        _ => Ok(RotorTemplate::fixed(name.text, permutation)),
    };
    template.map_err(|error| ConfigError::core(name.line, error))
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    line: usize,
    text: &'a str,
}

/// Whitespace tokens tagged with their 1-based line number.
struct Tokens<'a> {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token<'a>>>,
    last_line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let tokens: Vec<Token<'a>> = text
            .lines()
            .enumerate()
            .flat_map(|(n, line)| {
                line.split_whitespace()
                    .map(move |text| Token { line: n + 1, text })
            })
            .collect();
        Self {
            tokens: tokens.into_iter().peekable(),
            last_line: text.lines().count().max(1),
        }
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        self.tokens.next()
    }

    fn next_if(&mut self, accept: impl FnOnce(&Token<'a>) -> bool) -> Option<Token<'a>> {
        self.tokens.next_if(accept)
    }

    fn require(&mut self, expected: &'static str) -> Result<Token<'a>, ConfigError> {
        let line = self.last_line;
        self.next_token()
            .ok_or_else(|| ConfigError::new(line, ConfigErrorKind::UnexpectedEnd { expected }))
    }

    fn require_count(&mut self, expected: &'static str) -> Result<(usize, usize), ConfigError> {
        let token = self.require(expected)?;
        match token.text.parse::<usize>() {
            Ok(count) => Ok((count, token.line)),
            Err(_) => Err(ConfigError::new(
                token.line,
                ConfigErrorKind::InvalidCount {
                    token: token.text.to_string(),
                },
            )),
        }
    }
}

/// A machine description error with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Kind of error.
    pub kind: ConfigErrorKind,
    /// 1-based line where the error was detected.
    pub line: usize,
}

impl ConfigError {
    /// Creates an error at `line`.
    #[must_use]
    pub const fn new(line: usize, kind: ConfigErrorKind) -> Self {
        Self { kind, line }
    }

    const fn core(line: usize, error: EnigmaError) -> Self {
        Self::new(line, ConfigErrorKind::Core(error))
    }
}

/// Classification of machine description errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// The description ended early.
    UnexpectedEnd {
        /// What was still required.
        expected: &'static str,
    },
    /// Slot or pawl count that is not a non-negative integer.
    InvalidCount {
        /// The rejected token.
        token: String,
    },
    /// A cycle where a rotor name was required.
    ExpectedRotorName {
        /// The rejected token.
        token: String,
    },
    /// Rotor type other than `M`, `N` or `R`.
    InvalidRotorType {
        /// Rotor being described.
        name: String,
        /// The rejected token.
        token: String,
    },
    /// Notches given for a fixed rotor or reflector.
    UnexpectedNotches {
        /// Rotor being described.
        name: String,
    },
    /// The description was well formed but the core rejected it.
    Core(EnigmaError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd { expected } => {
                write!(f, "unexpected end of configuration, expected {expected}")
            }
            Self::InvalidCount { token } => write!(f, "invalid count '{token}'"),
            Self::ExpectedRotorName { token } => {
                write!(f, "expected a rotor name, found '{token}'")
            }
            Self::InvalidRotorType { name, token } => write!(
                f,
                "invalid type '{token}' for rotor {name} (expected M<notches>, N or R)"
            ),
            Self::UnexpectedNotches { name } => write!(f, "rotor {name} cannot have notches"),
            Self::Core(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ConfigErrorKind::Core(error) => Some(error),
            _ => None,
        }
    }
}
