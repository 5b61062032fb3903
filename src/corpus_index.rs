use std::path::Path;

use tracing::debug;

use crate::errors::{Result, StreamError};
use crate::files::read_input;

/// Global start offsets of every block of a partitioned corpus.
///
/// `barriers[i]` is where block `i` starts in global numbering and the last barrier is the
/// canonical corpus length. Built once, never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusIndex {
    barriers: Vec<usize>,
}

impl CorpusIndex {

    /// Builds the barriers from the ordered size files, one file per block.
    ///
    /// Every line of a size file is the length of one sub-chunk; the block length is their sum.
    pub fn build<P: AsRef<Path>>(size_files: &[P]) -> Result<CorpusIndex> {

        if size_files.is_empty() {
            return Err(StreamError::Config("no size files given".to_string()));
        }

        let mut barriers = Vec::with_capacity(size_files.len() + 1);
        let mut offset: usize = 0;
        barriers.push(offset);

        for size_file in size_files {
            let size_file = size_file.as_ref();
            let chunks = read_input::<Vec<usize>>(size_file).map_err(StreamError::into_config)?;
            let block_len = chunks
                .iter()
                .try_fold(0usize, |sum, chunk| sum.checked_add(*chunk))
                .ok_or_else(|| StreamError::Config(format!("{} declares a block too large to index", size_file.display())))?;
            if block_len == 0 {
                return Err(StreamError::Config(format!("{} declares an empty block", size_file.display())));
            }
            offset = offset
                .checked_add(block_len)
                .ok_or_else(|| StreamError::Config(format!("corpus size overflows at {}", size_file.display())))?;
            barriers.push(offset);
        }

        debug!("built {} barriers, corpus size {}", barriers.len(), offset);
        Ok(CorpusIndex { barriers })
    }

    pub fn barriers(&self) -> &[usize] {
        &self.barriers
    }

    pub fn block_count(&self) -> usize {
        self.barriers.len() - 1
    }

    /// Sum of the block sizes, the canonical corpus length.
    pub fn total_size(&self) -> usize {
        *self.barriers.last().unwrap_or(&0)
    }

    pub fn block_start(&self, block_id: usize) -> usize {
        self.barriers[block_id]
    }

    pub fn block_len(&self, block_id: usize) -> usize {
        self.barriers[block_id + 1] - self.barriers[block_id]
    }

    /// The block holding `global_index`, or `None` past the end of the corpus.
    pub fn locate_block(&self, global_index: usize) -> Option<usize> {
        if global_index >= self.total_size() {
            return None;
        }
        // barriers are strictly increasing and barriers[0] == 0, so this is at least 1
        let upto = self.barriers.partition_point(|&b| b <= global_index);
        Some(upto - 1)
    }

    /// Checks a total size read from a separate metadata file against the summed block sizes.
    pub fn validate_total(&self, declared_total: usize) -> Result<()> {
        if declared_total != self.total_size() {
            return Err(StreamError::Config(format!(
                "declared corpus size {} disagrees with the summed block sizes {}",
                declared_total,
                self.total_size()
            )));
        }
        Ok(())
    }

}

#[cfg(test)]
mod tests {

    use std::fs;
    use tempfile::tempdir;

    use super::CorpusIndex;
    use crate::errors::StreamError;

    #[test]
    fn barriers_from_sizes() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("size_00");
        let b = dir.path().join("size_01");
        fs::write(&a, "3\n").unwrap();
        fs::write(&b, "2\n").unwrap();

        let index = CorpusIndex::build(&[&a, &b]).unwrap();
        assert_eq!(index.barriers(), &[0, 3, 5]);
        assert_eq!(index.block_count(), 2);
        assert_eq!(index.total_size(), 5);

        // building again over the same files gives the same index
        let again = CorpusIndex::build(&[&a, &b]).unwrap();
        assert_eq!(index, again);
        assert_eq!(again.total_size(), index.total_size());
    }

    #[test]
    fn sub_chunks_sum_into_one_block() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("size_00");
        let b = dir.path().join("size_01");
        fs::write(&a, "3\n4\n").unwrap();
        fs::write(&b, "2\n").unwrap();

        let index = CorpusIndex::build(&[&a, &b]).unwrap();
        assert_eq!(index.barriers(), &[0, 7, 9]);
        assert_eq!(index.block_len(0), 7);
        assert_eq!(index.block_start(1), 7);
    }

    #[test]
    fn locate_block_boundaries() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("size_00");
        let b = dir.path().join("size_01");
        fs::write(&a, "3\n").unwrap();
        fs::write(&b, "2\n").unwrap();
        let index = CorpusIndex::build(&[&a, &b]).unwrap();

        let blocks: Vec<Option<usize>> = (0..6).map(|g| index.locate_block(g)).collect();
        assert_eq!(blocks, vec![Some(0), Some(0), Some(0), Some(1), Some(1), None]);
    }

    #[test]
    fn malformed_or_missing_size_files() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("size_00");
        fs::write(&bad, "3\nthree\n").unwrap();
        assert!(matches!(CorpusIndex::build(&[&bad]), Err(StreamError::Config(_))));

        let missing = dir.path().join("size_99");
        assert!(matches!(CorpusIndex::build(&[&missing]), Err(StreamError::Config(_))));

        let empty = dir.path().join("size_01");
        fs::write(&empty, "0\n").unwrap();
        assert!(matches!(CorpusIndex::build(&[&empty]), Err(StreamError::Config(_))));
    }

    #[test]
    fn oversized_blocks_are_config_errors() {
        let dir = tempdir().unwrap();
        let huge = dir.path().join("size_00");
        fs::write(&huge, format!("{}\n1\n", usize::MAX)).unwrap();
        assert!(matches!(CorpusIndex::build(&[&huge]), Err(StreamError::Config(_))));

        // each block fits on its own, their sum does not
        let a = dir.path().join("size_01");
        let b = dir.path().join("size_02");
        fs::write(&a, format!("{}\n", usize::MAX)).unwrap();
        fs::write(&b, "1\n").unwrap();
        assert!(matches!(CorpusIndex::build(&[&a, &b]), Err(StreamError::Config(_))));
    }

    #[test]
    fn declared_total_must_match() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("size_00");
        fs::write(&a, "10\n").unwrap();
        let index = CorpusIndex::build(&[&a]).unwrap();

        assert!(index.validate_total(10).is_ok());
        assert!(matches!(index.validate_total(11), Err(StreamError::Config(_))));
    }

}
