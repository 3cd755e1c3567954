use yamldiff_common::{DiffKind, Difference};

/// Ordered, append-only accumulation of differences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffCollector {
    differences: Vec<Difference>,
}

impl DiffCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, difference: Difference) {
        self.differences.push(difference);
    }

    /// Append everything another collector gathered, keeping its order
    pub fn merge(&mut self, other: DiffCollector) {
        self.differences.extend(other.differences);
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Difference> {
        self.differences.iter()
    }

    pub fn count(&self, kind: DiffKind) -> usize {
        self.differences.iter().filter(|d| d.kind == kind).count()
    }

    pub fn as_slice(&self) -> &[Difference] {
        &self.differences
    }

    pub fn into_vec(self) -> Vec<Difference> {
        self.differences
    }
}

impl IntoIterator for DiffCollector {
    type Item = Difference;
    type IntoIter = std::vec::IntoIter<Difference>;

    fn into_iter(self) -> Self::IntoIter {
        self.differences.into_iter()
    }
}
