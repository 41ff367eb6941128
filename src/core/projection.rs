// Column projection: which columns the scan coordinator wants materialized
//
// Column indices are table ordinals: partition-key columns occupy
// 0..num_partition_keys and never appear in the file, so the first file
// column of every tuple is asked about as index `num_partition_keys`.

/// Decides per column index whether a field location is recorded.
pub trait ColumnProjection {
    fn should_materialize(&self, column_idx: usize) -> bool;
}

/// Materialize every column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllColumns;

impl ColumnProjection for AllColumns {
    #[inline]
    fn should_materialize(&self, _column_idx: usize) -> bool {
        true
    }
}

/// Materialize only the listed column indices (sorted, deduplicated).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedColumns {
    indices: Vec<usize>,
}

impl SelectedColumns {
    pub fn new<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        SelectedColumns { indices }
    }
}

impl ColumnProjection for SelectedColumns {
    #[inline]
    fn should_materialize(&self, column_idx: usize) -> bool {
        self.indices.binary_search(&column_idx).is_ok()
    }
}

/// Either projection, for callers that pick one at runtime (NIF, streaming).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    Columns(SelectedColumns),
}

impl ColumnProjection for Projection {
    #[inline]
    fn should_materialize(&self, column_idx: usize) -> bool {
        match self {
            Projection::All => true,
            Projection::Columns(cols) => cols.should_materialize(column_idx),
        }
    }
}

impl<F: Fn(usize) -> bool> ColumnProjection for F {
    #[inline]
    fn should_materialize(&self, column_idx: usize) -> bool {
        self(column_idx)
    }
}
