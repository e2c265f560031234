use crate::domain::{Dataset, FilterSpec, Record};

/// Records of a dataset that passed a filter, in dataset order.
///
/// Borrows the dataset so the header row stays available for exports.
#[derive(Debug, Clone)]
pub struct FilteredDataset<'a> {
    dataset: &'a Dataset,
    records: Vec<&'a Record>,
}

impl<'a> FilteredDataset<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn headers(&self) -> &'a [String] {
        &self.dataset.headers
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Keep exactly the records whose order date lies in the inclusive range and
/// whose category and region are both allow-listed.
pub fn filter<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> FilteredDataset<'a> {
    let records: Vec<&Record> = dataset.records.iter().filter(|r| spec.matches(r)).collect();

    tracing::debug!(
        kept = records.len(),
        total = dataset.len(),
        from = %spec.date_start(),
        to = %spec.date_end(),
        "filtered dataset"
    );

    FilteredDataset { dataset, records }
}
