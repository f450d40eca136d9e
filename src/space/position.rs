use std::fmt;
use std::ops::Deref;

/// Integer index vector locating a candidate in the discretized space.
///
/// Canonical and hashable: two positions are the same candidate iff their
/// indices are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position(Vec<usize>);

impl Position {
    pub fn new(indices: Vec<usize>) -> Self {
        Position(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl Deref for Position {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Position {
    fn from(indices: Vec<usize>) -> Self {
        Position(indices)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "]")
    }
}
