use crate::types::Coordinate;

/// A contiguous slice of the input locations sent in one request
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub index: usize,
    /// Position of the first location in the full input
    pub start: usize,
    /// One past the last location
    pub end: usize,
    pub locations: Vec<Coordinate>,
}

/// Split locations into batches of at most `batch_size`, in input order.
/// A `batch_size` of zero is treated as one.
pub fn plan_batches(locations: &[Coordinate], batch_size: usize) -> Vec<Batch> {
    let size = batch_size.max(1);
    locations
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            start: index * size,
            end: index * size + chunk.len(),
            locations: chunk.to_vec(),
        })
        .collect()
}
