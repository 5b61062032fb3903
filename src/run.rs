use std::env;
use std::error::Error;
use std::time::Instant;

use tracing::{info, warn};

use crate::batch::{Batch, SkipGramBatcher};
use crate::config::{Config, StreamParams};
use crate::cursor::CorpusStream;
use crate::files::find_integer_files;
use crate::vocab::{self, Dictionary};

pub struct Run {}

impl Run {

    // runs the batch stream end to end -
    // -> configuration of arguments
    // -> corpus discovery and validation
    // -> batch generation loop

    pub fn run() -> Result<(), Box<dyn Error>> {

        info!("entering program...");
        let args: Vec<String> = env::args().collect();

        info!("building parameters...");
        let params = Config::new(&args)?.get_params();
        info!("{}", params);

        let stream = Run::open_stream(&params)?;
        let dictionary = Run::read_vocabulary(&params)?;

        let timer = Instant::now();
        info!("starting batch generation...");
        let mut batcher = SkipGramBatcher::new(stream, params.batch.seed);
        let stats = Run::generate_batches(&mut batcher, &params, dictionary.as_ref())?;

        info!(
            "finished {} batches ({} valid, {} discarded, {} passes over the corpus), took {} seconds ...",
            stats.valid + stats.discarded,
            stats.valid,
            stats.discarded,
            batcher.stream().epochs(),
            timer.elapsed().as_secs()
        );
        Ok(())
    }

    fn open_stream(params: &StreamParams) -> Result<CorpusStream, Box<dyn Error>> {

        let timer = Instant::now();
        let (data_files, size_files) = find_integer_files(&params.data_dir)?;
        let declared_total = vocab::read_total_size(&params.total_size_file)?;
        let stream = CorpusStream::open(&data_files, &size_files, declared_total)?;

        info!("opened {} blocks, took {} ms", data_files.len(), timer.elapsed().as_millis());
        Ok(stream)
    }

    fn read_vocabulary(params: &StreamParams) -> Result<Option<Dictionary>, Box<dyn Error>> {

        if let Some(path) = &params.frequency_file {
            let frequencies = vocab::read_frequency(path, params.vocab_size)?;
            let top: Vec<&String> = frequencies.order.iter().take(5).collect();
            info!("most common tokens: {:?}", top);
        }

        if let Some(path) = &params.unknown_count_file {
            info!("corpus holds {} unknown tokens", vocab::read_unknown_count(path)?);
        }

        match &params.dictionary_file {
            Some(path) => {
                let dictionary = vocab::read_dictionary(path, params.dictionary_has_header)?;
                if dictionary.size != params.vocab_size {
                    warn!("dictionary holds {} tokens, configured vocab_size is {}", dictionary.size, params.vocab_size);
                }
                info!("loaded dictionary of {} tokens", dictionary.size);
                Ok(Some(dictionary))
            }
            None => Ok(None),
        }
    }

    fn generate_batches(batcher: &mut SkipGramBatcher, params: &StreamParams, dictionary: Option<&Dictionary>) -> Result<BatchStats, Box<dyn Error>> {

        let batch_params = &params.batch;
        let mut stats = BatchStats::default();

        for i in 0..batch_params.num_batches {

            let batch = batcher.generate(batch_params.batch_size, batch_params.num_skips, batch_params.skip_window)?;
            if !batch.valid {
                // the corpus wrapped while this batch was built
                info!("discarding batch {}, corpus wrapped", i);
                stats.discarded += 1;
                continue;
            }
            stats.valid += 1;

            if batch_params.log_every > 0 && i % batch_params.log_every == 0 {
                info!(
                    "batch {} / {}, global index {} in block {}",
                    i,
                    batch_params.num_batches,
                    batcher.stream().global_index(),
                    batcher.stream().current_block_id()
                );
                if let Some(dictionary) = dictionary {
                    Run::log_pairs(&batch, dictionary);
                }
            }
        }

        Ok(stats)
    }

    fn log_pairs(batch: &Batch, dictionary: &Dictionary) {
        for (center, context) in batch.pairs().take(4) {
            let word = |id: u32| dictionary.token(id as usize).unwrap_or("?").to_string();
            info!("    {} -> {}", word(center), word(context));
        }
    }

}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct BatchStats {
    valid: usize,
    discarded: usize,
}
