use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::Array2;
use ndarray_npy::read_npy;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{Result, StreamError};

/// A corpus token id.
pub type Token = u32;

const DATA_FILE_MARKER: &str = "integers_";
const SIZE_FILE_MARKER: &str = "size_";

pub fn read_input<R: ReadFile>(file_path: &Path) -> Result<<R as ReadFile>::Item> {
    let input = <R as ReadFile>::read_file(file_path)?;
    Ok(input)
}

pub trait ReadFile {
    type Item;
    fn read_file(file_path: &Path) -> Result<Self::Item>;
}

// block files, one token id per line
impl ReadFile for Vec<Token> {
    type Item = Self;
    fn read_file(file_path: &Path) -> Result<Self::Item> {
        parse_lines(file_path)
    }
}

// size files, one chunk length per line
impl ReadFile for Vec<usize> {
    type Item = Self;
    fn read_file(file_path: &Path) -> Result<Self::Item> {
        parse_lines(file_path)
    }
}

impl ReadFile for Array2<f32> {
    type Item = Self;
    fn read_file(file_path: &Path) -> Result<Self::Item> {
        read_npy(file_path).map_err(|e| {
            StreamError::Config(format!("could not read array {}: {}", file_path.display(), e))
        })
    }
}

pub(crate) fn open_lines(file_path: &Path) -> Result<std::io::Lines<BufReader<File>>> {
    match File::open(file_path) {
        Ok(f) => Ok(BufReader::new(f).lines()),
        Err(e) => Err(StreamError::Io { path: file_path.to_path_buf(), source: e }),
    }
}

/// Parses every line of `file_path` as one integer. A bad line fails the whole file.
pub(crate) fn parse_lines<T: FromStr>(file_path: &Path) -> Result<Vec<T>> {
    let mut values = Vec::new();
    for (i, line) in open_lines(file_path)?.enumerate() {
        let line = line.map_err(|e| StreamError::Io { path: file_path.to_path_buf(), source: e })?;
        let value = line.trim().parse::<T>().map_err(|_| StreamError::Parse {
            path: file_path.to_path_buf(),
            line: i + 1,
            content: line.clone(),
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Reads the integer on the first line of a metadata file.
pub(crate) fn read_first_integer<T: FromStr>(file_path: &Path) -> Result<T> {
    let first = match open_lines(file_path)?.next() {
        Some(line) => line.map_err(|e| StreamError::Io { path: file_path.to_path_buf(), source: e })?,
        None => return Err(StreamError::Config(format!("{} is empty", file_path.display()))),
    };
    first.trim().parse::<T>().map_err(|_| StreamError::Parse {
        path: file_path.to_path_buf(),
        line: 1,
        content: first.clone(),
    })
}

/// Walks `dir` for block files (`integers_*`) and their size files (`size_*`).
///
/// Both lists come back sorted so the n-th data file pairs with the n-th size file.
pub fn find_integer_files(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut data_files = Vec::new();
    let mut size_files = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            StreamError::Config(format!("could not walk {}: {}", dir.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with(DATA_FILE_MARKER) {
            data_files.push(entry.path().to_path_buf());
        } else if name.starts_with(SIZE_FILE_MARKER) {
            size_files.push(entry.path().to_path_buf());
        }
    }

    data_files.sort();
    size_files.sort();

    if data_files.is_empty() {
        return Err(StreamError::Config(format!("no {}* files under {}", DATA_FILE_MARKER, dir.display())));
    }
    if data_files.len() != size_files.len() {
        return Err(StreamError::Config(format!(
            "found {} data files but {} size files under {}",
            data_files.len(),
            size_files.len(),
            dir.display()
        )));
    }

    debug!("found {} blocks under {}", data_files.len(), dir.display());
    Ok((data_files, size_files))
}

#[cfg(test)]
mod tests {

    use std::fs;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parse_lines_rejects_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("integers_00");
        fs::write(&path, "4\n7\nseven\n1\n").unwrap();

        match read_input::<Vec<Token>>(&path) {
            Err(StreamError::Parse { line, content, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(content, "seven");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = read_input::<Vec<Token>>(&dir.path().join("integers_missing"));
        assert!(matches!(result, Err(StreamError::Io { .. })));
    }

    #[test]
    fn discovery_pairs_sorted_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("integers_01"), "1\n").unwrap();
        fs::write(dir.path().join("integers_00"), "1\n").unwrap();
        fs::write(dir.path().join("size_01"), "1\n").unwrap();
        fs::write(dir.path().join("size_00"), "1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored\n").unwrap();
        // metadata kept next to the blocks is not a block
        fs::write(dir.path().join("total_size_file"), "2\n").unwrap();
        fs::write(dir.path().join("old_integers_00"), "1\n").unwrap();

        let (data, sizes) = find_integer_files(dir.path()).unwrap();
        let names = |v: &[PathBuf]| {
            v.iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                .collect::<Vec<String>>()
        };
        assert_eq!(names(&data), vec!["integers_00", "integers_01"]);
        assert_eq!(names(&sizes), vec!["size_00", "size_01"]);
    }

    #[test]
    fn discovery_rejects_unpaired_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("integers_00"), "1\n").unwrap();
        fs::write(dir.path().join("integers_01"), "1\n").unwrap();
        fs::write(dir.path().join("size_00"), "1\n").unwrap();

        assert!(matches!(find_integer_files(dir.path()), Err(StreamError::Config(_))));
    }
}
