use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::errors::{Result, StreamError};
use crate::files::{open_lines, read_first_integer};

/// Key of the unknown-token sentinel in the frequency table.
pub const UNK: &str = "UNK";
/// Sentinel frequency of `UNK`, lower than any real count so it orders last.
pub const UNK_FREQUENCY: i64 = -1;

/// Token/id lookups read from a dictionary file.
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    pub token_to_id: HashMap<String, usize>,
    pub id_to_token: HashMap<usize, String>,
    pub size: usize,
}

impl Dictionary {

    pub fn id(&self, token: &str) -> Option<usize> {
        self.token_to_id.get(token).copied()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.id_to_token.get(&id).map(|t| t.as_str())
    }

}

/// Reads one token per line; the line number is the token id.
///
/// With `skip_header` the first line is dropped and ids start at the second line.
pub fn read_dictionary(path: &Path, skip_header: bool) -> Result<Dictionary> {

    let mut dictionary = Dictionary::default();
    let lines = open_lines(path).map_err(StreamError::into_config)?;

    for line in lines.skip(usize::from(skip_header)) {
        let token = line.map_err(|e| StreamError::Config(format!("could not read {}: {}", path.display(), e)))?;
        let id = dictionary.size;
        dictionary.size += 1;

        if dictionary.token_to_id.contains_key(&token) {
            warn!("duplicate dictionary token '{}' at id {}, keeping the first id", token, id);
        } else {
            dictionary.token_to_id.insert(token.clone(), id);
        }
        dictionary.id_to_token.insert(id, token);
    }

    Ok(dictionary)
}

/// Token frequencies plus the tokens ordered from most to least frequent.
#[derive(Clone, Debug, Default)]
pub struct Frequencies {
    pub counts: HashMap<String, i64>,
    pub order: Vec<String>,
}

/// Reads `token, count` lines and appends the `UNK` sentinel.
///
/// Lines that do not split into exactly two fields are ignored.
pub fn read_frequency(path: &Path, vocab_size: usize) -> Result<Frequencies> {

    let mut counts: HashMap<String, i64> = HashMap::new();
    let lines = open_lines(path).map_err(StreamError::into_config)?;

    for (i, line) in lines.enumerate() {
        let line = line.map_err(|e| StreamError::Config(format!("could not read {}: {}", path.display(), e)))?;
        let fields: Vec<&str> = line.split(", ").collect();
        if fields.len() != 2 {
            continue;
        }
        let key = fields[0].replace(' ', "");
        let count = fields[1].trim().parse::<i64>().map_err(|_| {
            StreamError::Config(format!("{}:{}: bad frequency '{}'", path.display(), i + 1, fields[1]))
        })?;
        counts.insert(key, count);
    }

    counts.insert(UNK.to_string(), UNK_FREQUENCY);

    if counts.len() != vocab_size {
        warn!("frequency table holds {} entries for a vocabulary of {}", counts.len(), vocab_size);
    }

    let mut order: Vec<(&String, &i64)> = counts.iter().collect();
    order.sort_by(|(a, x), (b, y)| y.cmp(x).then_with(|| a.cmp(b)));
    let order = order.into_iter().map(|(token, _)| token.to_owned()).collect();

    Ok(Frequencies { counts, order })
}

/// Number of out-of-vocabulary occurrences, the integer on the first line.
pub fn read_unknown_count(path: &Path) -> Result<usize> {
    read_first_integer(path).map_err(StreamError::into_config)
}

/// Declared corpus length, the integer on the first line.
pub fn read_total_size(path: &Path) -> Result<usize> {
    read_first_integer(path).map_err(StreamError::into_config)
}
