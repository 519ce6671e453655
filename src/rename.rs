//! Per-edge parallel assignment of symbolic values.

use std::collections::BTreeMap;
use std::fmt;

use crate::expr::SymbolicValue;

/// Maps an old symbolic value to the ordered list of values that carry it
/// after a control-flow edge.
///
/// All entries apply simultaneously: `{a → [b], b → [a]}` swaps `a` and `b`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renaming {
    map: BTreeMap<SymbolicValue, Vec<SymbolicValue>>,
}

impl Renaming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity renaming of `values`.
    pub fn identity(values: impl IntoIterator<Item = SymbolicValue>) -> Self {
        let mut renaming = Renaming::new();
        for v in values {
            renaming.insert(v, v);
        }
        renaming
    }

    /// Adds `new` to the targets of `old`.
    pub fn insert(&mut self, old: SymbolicValue, new: SymbolicValue) {
        let targets = self.map.entry(old).or_default();
        if !targets.contains(&new) {
            targets.push(new);
        }
    }

    pub fn with(mut self, old: SymbolicValue, new: SymbolicValue) -> Self {
        self.insert(old, new);
        self
    }

    pub fn targets(&self, old: &SymbolicValue) -> &[SymbolicValue] {
        self.map.get(old).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Name of `old` after the edge, used when rewriting operands.
    pub fn representative(&self, old: &SymbolicValue) -> Option<SymbolicValue> {
        self.targets(old).first().copied()
    }

    pub fn contains(&self, old: &SymbolicValue) -> bool {
        self.map.contains_key(old)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SymbolicValue, &[SymbolicValue])> {
        self.map.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(SymbolicValue, SymbolicValue)> for Renaming {
    fn from_iter<I: IntoIterator<Item = (SymbolicValue, SymbolicValue)>>(iter: I) -> Self {
        let mut renaming = Renaming::new();
        for (old, new) in iter {
            renaming.insert(old, new);
        }
        renaming
    }
}

impl fmt::Display for Renaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (old, targets)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> [", old)?;
            for (j, new) in targets.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", new)?;
            }
            write!(f, "]")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(id: u32) -> SymbolicValue {
        SymbolicValue::new(id)
    }

    #[test]
    fn test_fan_out() {
        let r = Renaming::new().with(s(1), s(10)).with(s(1), s(11)).with(s(1), s(10));
        assert_eq!(r.targets(&s(1)), &[s(10), s(11)]);
        assert_eq!(r.representative(&s(1)), Some(s(10)));
        assert_eq!(r.representative(&s(2)), None);
        assert_eq!(r.to_string(), "{s1 -> [s10, s11]}");
    }

    #[test]
    fn test_from_pairs() {
        let r: Renaming = [(s(1), s(2)), (s(2), s(1))].into_iter().collect();
        assert_eq!(r.len(), 2);
        assert_eq!(r.representative(&s(1)), Some(s(2)));
        assert_eq!(r.representative(&s(2)), Some(s(1)));
    }
}
