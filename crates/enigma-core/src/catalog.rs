//! Named collection of rotor templates available to a machine.

use std::sync::Arc;

use crate::{Alphabet, EnigmaError, Rotor, RotorTemplate};

/// The rotors a machine may be assembled from, in definition order.
///
/// Templates are immutable once inserted; machines only ever hold fresh
/// [`Rotor`] instances created by [`RotorCatalog::instantiate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotorCatalog {
    alphabet: Arc<Alphabet>,
    templates: Vec<Arc<RotorTemplate>>,
}

impl RotorCatalog {
    /// Creates an empty catalog over `alphabet`.
    #[must_use]
    pub fn new(alphabet: &Arc<Alphabet>) -> Self {
        Self {
            alphabet: Arc::clone(alphabet),
            templates: Vec::new(),
        }
    }

    /// Adds a template.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::DuplicateRotorName`] when the name is taken and
    /// [`EnigmaError::AlphabetMismatch`] when the template wiring uses a
    /// different alphabet.
    pub fn insert(&mut self, template: RotorTemplate) -> Result<(), EnigmaError> {
        if self.get(template.name()).is_some() {
            return Err(EnigmaError::DuplicateRotorName {
                name: template.name().to_string(),
            });
        }
        if **template.alphabet() != *self.alphabet {
            return Err(EnigmaError::AlphabetMismatch);
        }
        self.templates.push(Arc::new(template));
        Ok(())
    }

    /// Looks up a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<RotorTemplate>> {
        self.templates
            .iter()
            .find(|template| template.name() == name)
    }

    /// Creates a fresh rotor at setting 0 from the template called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EnigmaError::UnknownRotor`] when no template has that name.
    pub fn instantiate(&self, name: &str) -> Result<Rotor, EnigmaError> {
        self.get(name)
            .map(|template| Rotor::new(Arc::clone(template)))
            .ok_or_else(|| EnigmaError::UnknownRotor {
                name: name.to_string(),
            })
    }

    /// Returns the catalog alphabet.
    #[must_use]
    pub const fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    /// Returns the number of templates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` when no templates have been added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterates templates in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RotorTemplate>> {
        self.templates.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::RotorCatalog;
    use crate::{Alphabet, EnigmaError, Permutation, RotorTemplate};

    fn latin() -> Arc<Alphabet> {
        Arc::new(Alphabet::default())
    }

    #[test]
    fn instantiate_creates_independent_rotors() {
        let alphabet = latin();
        let mut catalog = RotorCatalog::new(&alphabet);
        let wiring = Permutation::new("(AB) (CD)", &alphabet).expect("valid");
        catalog
            .insert(RotorTemplate::moving("I", wiring, "A").expect("valid"))
            .expect("unique name");

        let mut first = catalog.instantiate("I").expect("known rotor");
        let second = catalog.instantiate("I").expect("known rotor");
        first.advance();

        assert_eq!(first.setting(), 1);
        assert_eq!(second.setting(), 0);
        assert!(Arc::ptr_eq(first.template(), second.template()));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let alphabet = latin();
        let mut catalog = RotorCatalog::new(&alphabet);
        let beta = RotorTemplate::fixed("Beta", Permutation::identity(&alphabet));
        catalog.insert(beta.clone()).expect("unique name");

        let error = catalog.insert(beta).expect_err("name already taken");
        assert_eq!(
            error,
            EnigmaError::DuplicateRotorName {
                name: "Beta".into(),
            }
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn templates_over_another_alphabet_are_rejected() {
        let mut catalog = RotorCatalog::new(&latin());
        let other = Arc::new(Alphabet::new("ABC").expect("valid"));
        let error = catalog
            .insert(RotorTemplate::fixed("X", Permutation::identity(&other)))
            .expect_err("alphabet differs");
        assert_eq!(error, EnigmaError::AlphabetMismatch);
        assert!(catalog.is_empty());
    }

    #[test]
    fn unknown_names_fail_to_instantiate() {
        let catalog = RotorCatalog::new(&latin());
        assert_eq!(
            catalog.instantiate("IX"),
            Err(EnigmaError::UnknownRotor { name: "IX".into() })
        );
    }

    #[test]
    fn iteration_preserves_definition_order() {
        let alphabet = latin();
        let mut catalog = RotorCatalog::new(&alphabet);
        for name in ["III", "I", "II"] {
            catalog
                .insert(RotorTemplate::fixed(name, Permutation::identity(&alphabet)))
                .expect("unique name");
        }
        let names: Vec<&str> = catalog.iter().map(|template| template.name()).collect();
        assert_eq!(names, ["III", "I", "II"]);
    }
}
