use std::ops::Range;
use std::path::Path;

use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use rand::{thread_rng, Rng};

use crate::errors::{Result, StreamError};
use crate::files::read_input;
use crate::vocab::{read_dictionary, Dictionary};

pub const STANDARD_FILE: &str = "final_standard_embeddings.npy";
pub const NORMALIZED_FILE: &str = "final_normalized_embeddings.npy";
pub const DICTIONARY_FILE: &str = "dictionary.txt";

/// Which of the two saved embedding arrays to look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Embeddings {
    Standard,
    Normalized,
}

/// Read-only view over trained embeddings and the dictionary they were trained with.
pub struct Inspection {
    standard: Array2<f32>,
    normalized: Array2<f32>,
    dictionary: Dictionary,
}

impl Inspection {

    pub fn new(standard: Array2<f32>, normalized: Array2<f32>, dictionary: Dictionary) -> Result<Inspection> {
        if standard.dim() != normalized.dim() {
            return Err(StreamError::Config(format!(
                "standard embeddings {:?} and normalized embeddings {:?} differ in shape",
                standard.dim(),
                normalized.dim()
            )));
        }
        Ok(Inspection { standard, normalized, dictionary })
    }

    /// Loads both arrays and the header-prefixed dictionary from `base_dir`.
    pub fn open(base_dir: &Path) -> Result<Inspection> {
        let standard = read_input::<Array2<f32>>(&base_dir.join(STANDARD_FILE))?;
        let normalized = read_input::<Array2<f32>>(&base_dir.join(NORMALIZED_FILE))?;
        let dictionary = read_dictionary(&base_dir.join(DICTIONARY_FILE), true)?;
        Inspection::new(standard, normalized, dictionary)
    }

    fn array(&self, which: Embeddings) -> &Array2<f32> {
        match which {
            Embeddings::Standard => &self.standard,
            Embeddings::Normalized => &self.normalized,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.standard.dim()
    }

    pub fn size(&self) -> usize {
        self.standard.len()
    }

    /// Rows `rows` of the chosen array, clamped to the rows that exist.
    pub fn subset(&self, which: Embeddings, rows: Range<usize>) -> Array2<f32> {
        let n = self.shape().0;
        let start = rows.start.min(n);
        let end = rows.end.clamp(start, n);
        self.array(which).slice(s![start..end, ..]).to_owned()
    }

    /// Euclidean length of the vector of token `id`.
    pub fn vector_norm(&self, which: Embeddings, id: usize) -> Result<f32> {
        let w = self.array(which);
        if id >= w.dim().0 {
            return Err(StreamError::Config(format!("token id {} is outside {} embeddings", id, w.dim().0)));
        }
        Ok(w.row(id).mapv(|a| a.powi(2)).sum().sqrt())
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.dictionary.token(id)
    }

    pub fn vec_from_word(&self, which: Embeddings, token: &str) -> Result<Array1<f32>> {
        match self.dictionary.id(token) {
            Some(i) if i < self.shape().0 => Ok(self.array(which).row(i).to_owned()),
            _ => Err(StreamError::Config(format!("token: {} has no embedding", token))),
        }
    }

    /// A dictionary id that also has an embedding row.
    pub fn random_id(&self) -> Option<usize> {
        let n = self.dictionary.size.min(self.shape().0);
        if n == 0 {
            return None;
        }
        Some(thread_rng().gen_range(0..n))
    }

    /// Smallest and largest row norm of the chosen array.
    pub fn norm_summary(&self, which: Embeddings) -> Result<(f32, f32)> {
        let norms: Array1<f32> = self
            .array(which)
            .axis_iter(Axis(0))
            .map(|row| row.mapv(|a| a.powi(2)).sum().sqrt())
            .collect();
        let min = *norms.min().map_err(|e| StreamError::Config(format!("no norms: {}", e)))?;
        let max = *norms.max().map_err(|e| StreamError::Config(format!("no norms: {}", e)))?;
        Ok((min, max))
    }

}
