//! Collections holding at most one parameter of each kind.

use crate::identifier::SourceIdentifier;
use crate::parameter::{Parameter, ParameterKind};

/// At most one parameter per kind, in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
}

impl ParameterSet {
    /// Deduplicate `parameters` by kind. Later parameters overwrite earlier
    /// ones of the same kind but keep the earlier position.
    pub fn new(parameters: impl IntoIterator<Item = Parameter>) -> Self {
        let mut set = Self::default();
        for param in parameters {
            set.insert(param);
        }
        set
    }

    /// Explicit parameters, then defaults for every kind not given
    /// explicitly.
    pub fn merge(
        explicit: impl IntoIterator<Item = Parameter>,
        defaults: impl IntoIterator<Item = Parameter>,
    ) -> Self {
        let mut set = Self::new(explicit);
        for default in defaults {
            if !set.contains(default.kind()) {
                set.parameters.push(default);
            }
        }
        set
    }

    /// Add or replace the parameter of this kind.
    pub fn insert(&mut self, param: Parameter) {
        match self.position(param.kind()) {
            Some(index) => self.parameters[index] = param,
            None => self.parameters.push(param),
        }
    }

    /// Like a map update: every parameter in `other` is inserted,
    /// overwriting parameters of the same kind.
    pub fn update(&mut self, other: &ParameterSet) {
        for param in other {
            self.insert(param.clone());
        }
    }

    pub fn remove(&mut self, kind: ParameterKind) -> Option<Parameter> {
        self.position(kind).map(|index| self.parameters.remove(index))
    }

    pub fn get(&self, kind: ParameterKind) -> Option<&Parameter> {
        self.parameters.iter().find(|param| param.kind() == kind)
    }

    /// All parameters whose kind is in `kinds`, in set order.
    pub fn get_all(&self, kinds: &[ParameterKind]) -> Vec<&Parameter> {
        self.parameters
            .iter()
            .filter(|param| kinds.contains(&param.kind()))
            .collect()
    }

    pub fn contains(&self, kind: ParameterKind) -> bool {
        self.position(kind).is_some()
    }

    /// The source identifier, if this set has one.
    pub fn source(&self) -> Option<&SourceIdentifier> {
        self.get(ParameterKind::Source).and_then(Parameter::source)
    }

    /// Parameters that actually carry a path.
    pub fn paths(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|param| param.path().is_some())
    }

    /// If exactly one of pseudo id and pseudo name is present, add the other
    /// with the same value.
    pub fn fill_missing_parameters(&mut self) {
        let pseudo_id = self.get(ParameterKind::PseudoId).map(Parameter::value);
        let pseudo_name = self.get(ParameterKind::PseudoName).map(Parameter::value);
        match (pseudo_id, pseudo_name) {
            (Some(id), None) => self.insert(Parameter::PseudoName(id)),
            (None, Some(name)) => self.insert(Parameter::PseudoId(name)),
            _ => {}
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn into_vec(self) -> Vec<Parameter> {
        self.parameters
    }

    fn position(&self, kind: ParameterKind) -> Option<usize> {
        self.parameters.iter().position(|param| param.kind() == kind)
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

impl IntoIterator for ParameterSet {
    type Item = Parameter;
    type IntoIter = std::vec::IntoIter<Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.into_iter()
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = Parameter>>(iter: T) -> Self {
        Self::new(iter)
    }
}
