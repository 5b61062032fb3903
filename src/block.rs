use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::corpus_index::CorpusIndex;
use crate::errors::{Result, StreamError};
use crate::files::{read_input, Token};

/// Pages the corpus one block file at a time. Exactly one block is resident.
pub struct BlockLoader {
    files: Vec<PathBuf>,
    block: Vec<Token>,
    block_id: usize,
    block_start: usize,
}

impl BlockLoader {

    /// Loads block 0 of `files`, which must pair 1:1 with the blocks of `index`.
    pub fn new<P: AsRef<Path>>(files: &[P], index: &CorpusIndex) -> Result<BlockLoader> {

        if files.len() != index.block_count() {
            return Err(StreamError::Config(format!(
                "{} block files for {} declared blocks",
                files.len(),
                index.block_count()
            )));
        }

        let mut loader = BlockLoader {
            files: files.iter().map(|f| f.as_ref().to_path_buf()).collect(),
            block: Vec::new(),
            block_id: 0,
            block_start: 0,
        };
        loader.swap_in(0, index)?;
        Ok(loader)
    }

    /// Reads one block file, one token id per line. A bad line fails the whole block.
    pub fn load(path: &Path) -> Result<Vec<Token>> {
        debug!("reading integer file {}", path.display());
        read_input::<Vec<Token>>(path)
    }

    /// Moves to the next block, wrapping circularly.
    ///
    /// Returns `true` when the move wrapped past the last block back to block 0.
    pub fn advance(&mut self, index: &CorpusIndex) -> Result<bool> {

        let next = self.block_id + 1;
        info!("loading new block {} / {}", next, self.files.len());

        if next >= self.files.len() {
            info!("passed the last block, wrapping to block 0");
            self.rewind(index)?;
            return Ok(true);
        }

        self.swap_in(next, index)?;
        Ok(false)
    }

    /// Makes block 0 resident again, reading it only if another block is loaded.
    pub fn rewind(&mut self, index: &CorpusIndex) -> Result<()> {
        if self.block_id != 0 {
            self.swap_in(0, index)?;
        }
        Ok(())
    }

    fn swap_in(&mut self, block_id: usize, index: &CorpusIndex) -> Result<()> {

        let block = BlockLoader::load(&self.files[block_id])?;
        if block.len() != index.block_len(block_id) {
            return Err(StreamError::Config(format!(
                "{} holds {} tokens but its size file declares {}",
                self.files[block_id].display(),
                block.len(),
                index.block_len(block_id)
            )));
        }

        // the previous block is dropped here
        self.block = block;
        self.block_id = block_id;
        self.block_start = index.block_start(block_id);
        Ok(())
    }

    pub fn block(&self) -> &[Token] {
        &self.block
    }

    pub fn block_id(&self) -> usize {
        self.block_id
    }

    pub fn block_start(&self) -> usize {
        self.block_start
    }

    pub fn len(&self) -> usize {
        self.block.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

}
