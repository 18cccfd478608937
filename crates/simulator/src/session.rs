//! Line-oriented message sessions.
//!
//! Input is a sequence of lines. A line starting with `*` selects the rotors,
//! their settings and the plugboard for the messages that follow:
//!
//! ```text
//! * B Beta III IV I AXLE (YF) (ZH)
//! FROM HIS SHOULDER HIAWATHA
//! ```
//!
//! Every other line is a message, converted and written in groups of five.

use std::fmt;
use std::io::{self, BufRead, Write};

use enigma_core::{EnigmaError, Machine, Permutation};

use crate::config::MachineConfig;
use crate::output::{group_symbols, GROUP_SIZE};

/// Marker that opens a setting line.
pub const SETTING_MARKER: char = '*';

/// A parsed setting line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingLine {
    /// Rotor names, reflector first.
    pub rotors: Vec<String>,
    /// Initial settings of the non-reflector rotors, leftmost first.
    pub setting: String,
    /// Plugboard cycles, if any were given.
    pub plugboard: Option<String>,
}

impl SettingLine {
    /// Parses a setting line for a machine with `slots` rotor slots.
    ///
    /// Returns `Ok(None)` when `line` does not start with [`SETTING_MARKER`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionErrorKind::IncompleteSetting`] when fewer than
    /// `slots` rotor names and a setting follow the marker.
    pub fn parse(line: &str, slots: usize) -> Result<Option<Self>, SessionErrorKind> {
        let Some(rest) = line.trim_start().strip_prefix(SETTING_MARKER) else {
            return Ok(None);
        };

        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if tokens.len() <= slots {
            return Err(SessionErrorKind::IncompleteSetting {
                expected: slots + 1,
                found: tokens.len(),
            });
        }

        let (rotors, rest) = tokens.split_at(slots);
        let (setting, cycles) = rest.split_at(1);
        Ok(Some(Self {
            rotors: rotors.iter().map(ToString::to_string).collect(),
            setting: setting.concat(),
            plugboard: (!cycles.is_empty()).then(|| cycles.join(" ")),
        }))
    }
}

/// Observable steps of a session run, reported in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A setting line was applied.
    SettingApplied {
        /// Input line of the setting.
        line: usize,
        /// Rotor names, reflector first.
        rotors: Vec<String>,
        /// Rotor settings after the line was applied.
        settings: String,
        /// Plugboard cycles, normalised, if a plugboard is fitted.
        plugboard: Option<String>,
    },
    /// The plugboard moves some symbol in a cycle longer than a swap.
    PlugboardNotInvolution {
        /// Input line of the setting.
        line: usize,
        /// Plugboard cycles, normalised.
        plugboard: String,
    },
    /// A message line was converted.
    MessageConverted {
        /// Input line of the message.
        line: usize,
        /// Number of symbols converted.
        symbols: usize,
    },
}

/// Sink for session events.
pub trait SessionSink {
    /// Records an event in input order.
    fn on_event(&mut self, event: SessionEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SessionSink for NullSink {
    fn on_event(&mut self, _event: SessionEvent) {}
}

impl SessionSink for Vec<SessionEvent> {
    fn on_event(&mut self, event: SessionEvent) {
        self.push(event);
    }
}

/// A machine driven by setting lines and messages.
#[derive(Debug, Clone)]
pub struct Session {
    machine: Machine,
    configured: bool,
}

impl Session {
    /// Creates a session over a fresh machine built from `config`.
    #[must_use]
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            machine: config.machine(),
            configured: false,
        }
    }

    /// Returns the machine.
    #[must_use]
    pub const fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Returns `true` once a setting has been applied.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.configured
    }

    /// Replaces the rotors, settings and plugboard.
    ///
    /// The machine is left unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns the [`EnigmaError`] raised by rotor insertion, setting or
    /// plugboard parsing.
    pub fn apply_setting(&mut self, setting: &SettingLine) -> Result<(), EnigmaError> {
        let mut machine = self.machine.clone();
        machine.insert_rotors(&setting.rotors)?;
        machine.set_rotors(&setting.setting)?;
        match &setting.plugboard {
            Some(cycles) => {
                let plugboard = Permutation::new(cycles, machine.alphabet())?;
                machine.set_plugboard(plugboard)?;
            }
            None => machine.clear_plugboard(),
        }
        self.machine = machine;
        self.configured = true;
        Ok(())
    }

    /// Converts one message line and groups the result in fives.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::RotorsNotInserted`] before the first setting
    /// and [`EnigmaError::UnknownSymbol`] for symbols outside the alphabet.
    pub fn convert_line(&mut self, line: &str) -> Result<String, EnigmaError> {
        self.machine
            .convert_message(line)
            .map(|converted| group_symbols(&converted, GROUP_SIZE))
    }

    /// Processes every line of `input`, writing converted messages to
    /// `output`.
    ///
    /// Blank lines before the first setting line are skipped; later ones are
    /// copied as blank lines.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] for the first line that cannot be handled.
    /// Output written before that line is kept.
    pub fn run<R, W>(
        &mut self,
        input: R,
        mut output: W,
        sink: &mut dyn SessionSink,
    ) -> Result<(), SessionError>
    where
        R: BufRead,
        W: Write,
    {
        let slots = self.machine.shape().slots();
        for (n, line) in input.lines().enumerate() {
            let number = n + 1;
            let at = |kind| SessionError::new(number, kind);
            let line = line.map_err(|error| at(SessionErrorKind::Io(error.kind())))?;

            if let Some(setting) = SettingLine::parse(&line, slots).map_err(at)? {
                self.apply_setting(&setting)
                    .map_err(|error| at(SessionErrorKind::Core(error)))?;
                self.report_setting(number, sink);
                continue;
            }

            if line.trim().is_empty() {
                if self.configured {
                    writeln!(output).map_err(|error| at(SessionErrorKind::Io(error.kind())))?;
                }
                continue;
            }

            if !self.configured {
                return Err(at(SessionErrorKind::MissingSetting));
            }
            let converted = self
                .convert_line(&line)
                .map_err(|error| at(SessionErrorKind::Core(error)))?;
            writeln!(output, "{converted}")
                .map_err(|error| at(SessionErrorKind::Io(error.kind())))?;
            sink.on_event(SessionEvent::MessageConverted {
                line: number,
                symbols: converted.chars().filter(|c| !c.is_whitespace()).count(),
            });
        }
        output
            .flush()
            .map_err(|error| SessionError::new(0, SessionErrorKind::Io(error.kind())))
    }

    fn report_setting(&self, line: usize, sink: &mut dyn SessionSink) {
        let plugboard = self.machine.plugboard();
        sink.on_event(SessionEvent::SettingApplied {
            line,
            rotors: self
                .machine
                .rotors()
                .iter()
                .map(|rotor| rotor.name().to_string())
                .collect(),
            settings: self.machine.settings(),
            plugboard: plugboard.map(ToString::to_string),
        });
        if let Some(plugboard) = plugboard.filter(|plugboard| !plugboard.is_involution()) {
            sink.on_event(SessionEvent::PlugboardNotInvolution {
                line,
                plugboard: plugboard.to_string(),
            });
        }
    }
}

/// A session error with its input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    /// Kind of error.
    pub kind: SessionErrorKind,
    /// 1-based input line, or 0 when the error is not tied to a line.
    pub line: usize,
}

impl SessionError {
    /// Creates an error at `line`.
    #[must_use]
    pub const fn new(line: usize, kind: SessionErrorKind) -> Self {
        Self { kind, line }
    }
}

/// Classification of session errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// A message appeared before any setting line.
    MissingSetting,
    /// A setting line lacks rotor names or the setting.
    IncompleteSetting {
        /// Tokens required after the marker.
        expected: usize,
        /// Tokens present.
        found: usize,
    },
    /// Reading input or writing output failed.
    Io(io::ErrorKind),
    /// The machine rejected the setting or message.
    Core(EnigmaError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "line {}: {}", self.line, self.kind)
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting => {
                write!(f, "input must start with a '{SETTING_MARKER}' setting line")
            }
            Self::IncompleteSetting { expected, found } => write!(
                f,
                "setting line needs {expected} rotor names and settings, found {found}"
            ),
            Self::Io(kind) => write!(f, "i/o failure: {kind}"),
            Self::Core(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            SessionErrorKind::Core(error) => Some(error),
            _ => None,
        }
    }
}
