mod batch;
mod block;
mod config;
mod corpus_index;
mod cursor;
mod errors;
mod files;
mod inspect;
mod run;
mod vocab;

pub use batch::{Batch, SkipGramBatcher};
pub use block::BlockLoader;
pub use config::{BatchParams, Config, StreamParams};
pub use corpus_index::CorpusIndex;
pub use cursor::{CorpusStream, Cursor};
pub use errors::{Result, StreamError};
pub use files::{find_integer_files, read_input, ReadFile, Token};
pub use inspect::{Embeddings, Inspection};
pub use run::Run;
pub use vocab::{read_dictionary, read_frequency, read_total_size, read_unknown_count, Dictionary, Frequencies, UNK};
