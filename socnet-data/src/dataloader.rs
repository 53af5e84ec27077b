use crate::dataset::{Dataset, VecDataset};
use socnet_core::tensor::create;
use socnet_core::{SocNetError, Tensor};

/// Sequential batching iterator over a dataset.
///
/// The final batch is kept even when shorter than `batch_size`, unless
/// `drop_last` is set.
pub struct DataLoader<'a, D: Dataset> {
    dataset: &'a D,
    batch_size: usize,
    drop_last: bool,
    cursor: usize,
}

impl<'a, D: Dataset> DataLoader<'a, D> {
    pub fn new(dataset: &'a D, batch_size: usize, drop_last: bool) -> Result<Self, SocNetError> {
        if batch_size == 0 {
            return Err(SocNetError::ConfigurationError(
                "DataLoader batch_size must be positive".to_string(),
            ));
        }
        Ok(DataLoader {
            dataset,
            batch_size,
            drop_last,
            cursor: 0,
        })
    }
}

impl<'a, D: Dataset> Iterator for DataLoader<'a, D> {
    type Item = Result<Vec<D::Item>, SocNetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.dataset.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.dataset.len());
        if self.drop_last && end - self.cursor < self.batch_size {
            self.cursor = self.dataset.len();
            return None;
        }
        let mut batch = Vec::with_capacity(end - self.cursor);
        for index in self.cursor..end {
            match self.dataset.get(index) {
                Ok(item) => batch.push(item),
                Err(e) => {
                    self.cursor = self.dataset.len();
                    return Some(Err(e));
                }
            }
        }
        self.cursor = end;
        Some(Ok(batch))
    }
}

/// A split of initial states, batched into tensors.
///
/// Each row holds one value vector per state variable; `batch(i)` stacks rows
/// into one `(batch, dim)` tensor per state variable, in declaration order.
#[derive(Debug, Clone)]
pub struct InitialConditions {
    rows: VecDataset<Vec<Vec<f32>>>,
    dims: Vec<usize>,
    batch_size: usize,
}

impl InitialConditions {
    /// `rows[r][v]` is the value vector of state variable `v` in row `r`;
    /// every row must match `dims`.
    pub fn new(
        rows: Vec<Vec<Vec<f32>>>,
        dims: Vec<usize>,
        batch_size: usize,
    ) -> Result<Self, SocNetError> {
        if dims.is_empty() {
            return Err(SocNetError::ConfigurationError(
                "InitialConditions needs at least one state variable".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(SocNetError::ConfigurationError(
                "InitialConditions batch_size must be positive".to_string(),
            ));
        }
        for row in &rows {
            if row.len() != dims.len() {
                return Err(SocNetError::DimensionMismatch {
                    expected: dims.len(),
                    actual: row.len(),
                });
            }
            for (values, &dim) in row.iter().zip(&dims) {
                if values.len() != dim {
                    return Err(SocNetError::DimensionMismatch {
                        expected: dim,
                        actual: values.len(),
                    });
                }
            }
        }
        Ok(InitialConditions {
            rows: VecDataset::new(rows),
            dims,
            batch_size,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_state_vars(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_batches(&self) -> usize {
        (self.rows.len() + self.batch_size - 1) / self.batch_size
    }

    /// Iterate batches; each item is one `(batch, dim)` tensor per state
    /// variable.
    pub fn batches(&self) -> impl Iterator<Item = Result<Vec<Tensor>, SocNetError>> + '_ {
        // batch_size was validated in the constructor
        let loader = DataLoader::new(&self.rows, self.batch_size, false);
        BatchIter {
            loader: loader.ok(),
            dims: &self.dims,
        }
    }
}

struct BatchIter<'a> {
    loader: Option<DataLoader<'a, VecDataset<Vec<Vec<f32>>>>>,
    dims: &'a [usize],
}

impl<'a> Iterator for BatchIter<'a> {
    type Item = Result<Vec<Tensor>, SocNetError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = match self.loader.as_mut()?.next()? {
            Ok(rows) => rows,
            Err(e) => return Some(Err(e)),
        };
        Some(stack_rows(&rows, self.dims))
    }
}

fn stack_rows(rows: &[Vec<Vec<f32>>], dims: &[usize]) -> Result<Vec<Tensor>, SocNetError> {
    let batch = rows.len();
    let mut tensors = Vec::with_capacity(dims.len());
    for (v, &dim) in dims.iter().enumerate() {
        let mut data = Vec::with_capacity(batch * dim);
        for row in rows {
            data.extend_from_slice(&row[v]);
        }
        tensors.push(create::from_vec(data, vec![batch, dim])?);
    }
    Ok(tensors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_short_batch_kept() {
        let ds = VecDataset::new((0..5).collect::<Vec<i32>>());
        let batches: Vec<_> = DataLoader::new(&ds, 2, false)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(batches, vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn drop_last_skips_short_batch() {
        let ds = VecDataset::new((0..5).collect::<Vec<i32>>());
        let batches: Vec<_> = DataLoader::new(&ds, 2, true)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(batches, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn zero_batch_size_rejected() {
        let ds = VecDataset::new(vec![1]);
        assert!(DataLoader::new(&ds, 0, false).is_err());
    }

    #[test]
    fn batches_stack_state_variables() {
        let rows = vec![
            vec![vec![1.0, 2.0], vec![10.0]],
            vec![vec![3.0, 4.0], vec![20.0]],
            vec![vec![5.0, 6.0], vec![30.0]],
        ];
        let conditions = InitialConditions::new(rows, vec![2, 1], 2).unwrap();
        assert_eq!(conditions.num_batches(), 2);

        let batches: Vec<_> = conditions.batches().collect::<Result<_, _>>().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0][0].shape(), vec![2, 2]);
        assert_eq!(batches[0][0].get_data(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(batches[0][1].get_data(), vec![10.0, 20.0]);
        assert_eq!(batches[1][0].shape(), vec![1, 2]);
        assert_eq!(batches[1][1].get_data(), vec![30.0]);
    }

    #[test]
    fn mismatched_row_dims_rejected() {
        let rows = vec![vec![vec![1.0, 2.0]], vec![vec![3.0]]];
        assert!(InitialConditions::new(rows, vec![2], 2).is_err());
    }
}
