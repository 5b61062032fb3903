use std::path::Path;

use tracing::{debug, info};

use crate::block::BlockLoader;
use crate::corpus_index::CorpusIndex;
use crate::errors::{Result, StreamError};
use crate::files::Token;

/// Global read position plus the offset of the resident block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    global_index: usize,
    block_start_offset: usize,
    current_block_id: usize,
    wrapped: bool,
}

impl Cursor {

    pub fn global_index(&self) -> usize {
        self.global_index
    }

    pub fn block_start_offset(&self) -> usize {
        self.block_start_offset
    }

    pub fn current_block_id(&self) -> usize {
        self.current_block_id
    }

    /// Offset into the resident block, if the cursor lies inside it.
    pub fn local_offset(&self, block_len: usize) -> Option<usize> {
        if self.wrapped {
            return None;
        }
        self.global_index
            .checked_sub(self.block_start_offset)
            .filter(|offset| *offset < block_len)
    }

    /// Steps the global index, wrapping modulo `total_size`.
    pub fn advance_cursor(&mut self, total_size: usize) {
        self.global_index += 1;
        if self.global_index >= total_size {
            self.global_index = 0;
            self.wrapped = true;
        }
    }

    fn rebase(&mut self, block_id: usize, block_start: usize) {
        self.current_block_id = block_id;
        self.block_start_offset = block_start;
        self.wrapped = false;
    }

}

/// One independent stream over a partitioned corpus.
///
/// Owns the barriers, the resident block and the cursor; every mutation goes through its
/// methods. Not internally synchronized: use one stream per worker.
pub struct CorpusStream {
    index: CorpusIndex,
    loader: BlockLoader,
    cursor: Cursor,
    epochs: usize,
}

impl CorpusStream {

    /// Builds the index from `size_files`, checks it against the declared total and loads block 0.
    pub fn open<P: AsRef<Path>>(data_files: &[P], size_files: &[P], declared_total: usize) -> Result<CorpusStream> {
        let index = CorpusIndex::build(size_files)?;
        index.validate_total(declared_total)?;
        CorpusStream::from_index(data_files, index)
    }

    pub fn from_index<P: AsRef<Path>>(data_files: &[P], index: CorpusIndex) -> Result<CorpusStream> {
        let loader = BlockLoader::new(data_files, &index)?;
        info!("corpus of {} tokens in {} blocks", index.total_size(), index.block_count());
        Ok(CorpusStream {
            index,
            loader,
            cursor: Cursor::default(),
            epochs: 0,
        })
    }

    /// Offset of the cursor inside the resident block, swapping blocks when it lies outside.
    ///
    /// The flag is `true` when the swap wrapped the corpus back to its first block.
    pub fn resolve_local_offset(&mut self) -> Result<(usize, bool)> {

        if let Some(offset) = self.cursor.local_offset(self.loader.len()) {
            return Ok((offset, false));
        }

        let exhausted = self.loader.advance(&self.index)?;
        self.cursor.rebase(self.loader.block_id(), self.loader.block_start());
        if exhausted {
            self.epochs += 1;
            info!("corpus exhausted, starting pass {}", self.epochs + 1);
        }

        match self.cursor.local_offset(self.loader.len()) {
            Some(offset) => Ok((offset, exhausted)),
            None => Err(StreamError::Config(format!(
                "global index {} is outside block {} (start {}, {} tokens) after a swap",
                self.cursor.global_index(),
                self.loader.block_id(),
                self.loader.block_start(),
                self.loader.len()
            ))),
        }
    }

    /// Reads the token under the cursor and steps past it.
    pub fn next_token(&mut self) -> Result<(Token, bool)> {
        let (offset, exhausted) = self.resolve_local_offset()?;
        let token = self.loader.block()[offset];
        self.cursor.advance_cursor(self.index.total_size());
        Ok((token, exhausted))
    }

    /// Back to the first token of block 0, as if freshly opened.
    pub fn reset(&mut self) -> Result<()> {
        debug!("resetting stream");
        self.loader.rewind(&self.index)?;
        self.cursor = Cursor::default();
        self.epochs = 0;
        Ok(())
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn global_index(&self) -> usize {
        self.cursor.global_index()
    }

    pub fn current_block_id(&self) -> usize {
        self.cursor.current_block_id()
    }

    pub fn current_block(&self) -> &[Token] {
        self.loader.block()
    }

    pub fn current_block_len(&self) -> usize {
        self.loader.len()
    }

    pub fn local_offset(&self) -> Option<usize> {
        self.cursor.local_offset(self.loader.len())
    }

    pub fn total_size(&self) -> usize {
        self.index.total_size()
    }

    /// Number of completed passes over the corpus.
    pub fn epochs(&self) -> usize {
        self.epochs
    }

}
