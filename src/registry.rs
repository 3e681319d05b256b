//! Flat name→algorithm mapping, populated once and read-only after
//! construction. The only mutable global this crate reaches for, and it is
//! built exactly once.

use crate::algorithm::{Algorithm, DwtDugadAlgorithm, LsbAlgorithm, RandomLsbAlgorithm};
use crate::error::{Namespace, StegError};
use std::collections::HashMap;

pub struct Registry {
    algorithms: HashMap<&'static str, Box<dyn Algorithm>>,
}

impl Registry {
    pub fn new() -> Registry {
        let mut algorithms: HashMap<&'static str, Box<dyn Algorithm>> = HashMap::new();
        algorithms.insert("LSB", Box::new(LsbAlgorithm));
        algorithms.insert("RandomLSB", Box::new(RandomLsbAlgorithm));
        algorithms.insert("DWTDugad", Box::new(DwtDugadAlgorithm::new()));
        Registry { algorithms }
    }

    pub fn get(&self, name: &str) -> Result<&dyn Algorithm, StegError> {
        self.algorithms
            .get(name)
            .map(|b| b.as_ref())
            .ok_or(StegError::NoPluginSpecified { namespace: Namespace::Steganos })
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut (dyn Algorithm + '_), StegError> {
        match self.algorithms.get_mut(name) {
            Some(b) => Ok(b.as_mut()),
            None => Err(StegError::NoPluginSpecified { namespace: Namespace::Steganos }),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_three_algorithms() {
        let registry = Registry::new();
        assert_eq!(registry.get("LSB").unwrap().name(), "LSB");
        assert_eq!(registry.get("RandomLSB").unwrap().name(), "RandomLSB");
        assert_eq!(registry.get("DWTDugad").unwrap().name(), "DWTDugad");
    }

    #[test]
    fn unknown_name_is_no_plugin_specified() {
        let registry = Registry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, StegError::NoPluginSpecified { .. }));
    }
}
