use serde_json::Value;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;

use crate::errors::{Result, StreamError};

#[derive(Clone, Debug, PartialEq)]
pub struct BatchParams {
    pub batch_size: usize,
    pub num_skips: usize,
    pub skip_window: usize,
    pub num_batches: usize,
    pub log_every: usize,
    pub seed: Option<u64>,
}

impl Display for BatchParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch parameters:
        batch_size: {},
        num_skips: {},
        skip_window: {},
        num_batches: {},
        log_every: {},
        seed: {:?}",
        self.batch_size, self.num_skips, self.skip_window, self.num_batches, self.log_every, self.seed
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StreamParams {
    pub data_dir: PathBuf,
    pub total_size_file: PathBuf,
    pub dictionary_file: Option<PathBuf>,
    pub dictionary_has_header: bool,
    pub frequency_file: Option<PathBuf>,
    pub unknown_count_file: Option<PathBuf>,
    pub vocab_size: usize,
    pub batch: BatchParams,
}

impl Display for StreamParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using parameters:
        data_dir: {}
        total_size_file: {}
        dictionary_file: {:?}
        dictionary_has_header: {}
        frequency_file: {:?}
        unknown_count_file: {:?}
        vocab_size: {}
        Using {}",
        self.data_dir.display(), self.total_size_file.display(), self.dictionary_file, self.dictionary_has_header,
        self.frequency_file, self.unknown_count_file, self.vocab_size, self.batch)
    }
}

pub struct Config {
    params: StreamParams
}

fn required_path(json: &Value, key: &str) -> Result<PathBuf> {
    match json.get(key) {
        Some(value) => value
            .as_str()
            .map(PathBuf::from)
            .ok_or_else(|| StreamError::Config(format!("{} must be a string", key))),
        None => Err(StreamError::Config(format!("{} was not supplied through json", key))),
    }
}

fn optional_path(json: &Value, key: &str) -> Result<Option<PathBuf>> {
    match json.get(key) {
        Some(_) => required_path(json, key).map(Some),
        None => Ok(None),
    }
}

fn count_or(json: &Value, key: &str, default: usize) -> Result<usize> {
    match json.get(key) {
        Some(value) => value
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| StreamError::Config(format!("given {} is not a non-negative integer", key))),
        None => Ok(default),
    }
}

impl Config {

    pub fn get_params(&self) -> StreamParams {
        self.params.clone()
    }

    /// Expects the program name followed by a path to a json file.
    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(StreamError::Config("input should be a path to json file only".to_string()));
        }

        let text = fs::read_to_string(&args[1])
            .map_err(|e| StreamError::Config(format!("cannot open json file {}: {}", args[1], e)))?;
        Config::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Config> {

        let json: Value = serde_json::from_str(text)
            .map_err(|e| StreamError::Config(format!("cannot read json file: {}", e)))?;

        // corpus location is mandatory, the rest falls back to defaults
        let data_dir = required_path(&json, "data_dir")?;
        let total_size_file = required_path(&json, "total_size_file")?;

        let dictionary_has_header = match json.get("dictionary_has_header") {
            Some(flag) => flag
                .as_bool()
                .ok_or_else(|| StreamError::Config("given dictionary_has_header is not boolean".to_string()))?,
            None => true,
        };
        let seed = match json.get("seed") {
            Some(seed) => Some(
                seed.as_u64()
                    .ok_or_else(|| StreamError::Config("given seed is not a non-negative integer".to_string()))?,
            ),
            None => None,
        };

        let params = StreamParams {
            data_dir,
            total_size_file,
            dictionary_file: optional_path(&json, "dictionary_file")?,
            dictionary_has_header,
            frequency_file: optional_path(&json, "frequency_file")?,
            unknown_count_file: optional_path(&json, "unknown_count_file")?,
            vocab_size: count_or(&json, "vocab_size", 50000)?,
            batch: BatchParams {
                batch_size: count_or(&json, "batch_size", 128)?,
                num_skips: count_or(&json, "num_skips", 2)?,
                skip_window: count_or(&json, "skip_window", 1)?,
                num_batches: count_or(&json, "num_batches", 1000)?,
                log_every: count_or(&json, "log_every", 100)?,
                seed,
            },
        };

        Ok(Self { params })
    }

}
