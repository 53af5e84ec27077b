use socnet_core::SocNetError;

/// A collection of items accessible by index.
///
/// Items must be `Send + 'static` so loaders can hand them across threads
/// later without changing the trait.
pub trait Dataset {
    type Item: Send + 'static;

    /// Returns the item at `index`, or `IndexOutOfBounds`.
    fn get(&self, index: usize) -> Result<Self::Item, SocNetError>;

    /// Total number of items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory dataset over a plain `Vec`.
#[derive(Debug, Clone)]
pub struct VecDataset<T: Clone + Send + 'static> {
    items: Vec<T>,
}

impl<T: Clone + Send + 'static> VecDataset<T> {
    pub fn new(items: Vec<T>) -> Self {
        VecDataset { items }
    }
}

impl<T: Clone + Send + 'static> Dataset for VecDataset<T> {
    type Item = T;

    fn get(&self, index: usize) -> Result<T, SocNetError> {
        self.items
            .get(index)
            .cloned()
            .ok_or(SocNetError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            })
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_len() {
        let ds = VecDataset::new(vec![10, 20, 30]);
        assert_eq!(ds.len(), 3);
        assert!(!ds.is_empty());
        assert_eq!(ds.get(1).unwrap(), 20);
        assert!(ds.get(3).is_err());
    }

    #[test]
    fn empty_dataset() {
        let ds: VecDataset<f32> = VecDataset::new(vec![]);
        assert!(ds.is_empty());
        assert!(ds.get(0).is_err());
    }
}
