use srombox_target::RandomVector;

/// Ordered mapping from SROM size to a model (SROM or SROM surrogate).
///
/// Iteration follows insertion order, which is the order used to render
/// the series of a comparison.
#[derive(Default)]
pub struct SromSeries {
    entries: Vec<(usize, Box<dyn RandomVector>)>,
}

impl SromSeries {
    /// Constructor of an empty series
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a model for the given size. An existing model with the same size
    /// is replaced in place and returned.
    pub fn insert(
        &mut self,
        size: usize,
        model: Box<dyn RandomVector>,
    ) -> Option<Box<dyn RandomVector>> {
        match self.entries.iter_mut().find(|(m, _)| *m == size) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, model)),
            None => {
                self.entries.push((size, model));
                None
            }
        }
    }

    /// Returns the model of the given size if any
    pub fn get(&self, size: usize) -> Option<&dyn RandomVector> {
        self.entries
            .iter()
            .find(|(m, _)| *m == size)
            .map(|(_, model)| model.as_ref())
    }

    /// Sizes in insertion order
    pub fn sizes(&self) -> Vec<usize> {
        self.entries.iter().map(|(m, _)| *m).collect()
    }

    /// Iterates over (size, model) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &dyn RandomVector)> + '_ {
        self.entries.iter().map(|(m, model)| (*m, model.as_ref()))
    }

    /// Number of models
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for SromSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SromSeries")
            .field("sizes", &self.sizes())
            .finish()
    }
}
