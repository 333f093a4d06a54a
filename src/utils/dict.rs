//! Character dictionary loading for CTC recognition.
//!
//! The recognition model emits class indices over a fixed vocabulary whose
//! layout is an interface contract with the model file: index 0 is reserved
//! for the CTC blank label, the dictionary file contents occupy indices
//! 1..=N in file order, and a space character sits at index N+1. Decoding
//! maps class index to token; class 0 is never emitted.

use crate::core::OCRError;
use std::path::Path;

/// Loads the character dictionary and builds the CTC vocabulary around it.
///
/// The file is UTF-8 with one token per line; a trailing newline is
/// tolerated. Interior empty lines are kept as empty tokens so file order
/// and class indices stay aligned.
///
/// # Arguments
///
/// * `path` - The path to the dictionary file.
///
/// # Returns
///
/// A Result containing the vocabulary (blank, file tokens, space) or an
/// OCRError when the file is missing or unreadable.
pub fn load_dictionary(path: impl AsRef<Path>) -> Result<Vec<String>, OCRError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        OCRError::config(format!(
            "failed to read character dictionary {}: {e}",
            path.display()
        ))
    })?;

    let mut lines: Vec<&str> = contents.split('\n').collect();
    if let Some(last) = lines.last() {
        if last.is_empty() {
            lines.pop();
        }
    }

    let mut vocabulary = Vec::with_capacity(lines.len() + 2);
    vocabulary.push(String::new());
    vocabulary.extend(lines.iter().map(|line| line.trim_end_matches('\r').to_string()));
    vocabulary.push(" ".to_string());

    Ok(vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_dict(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "mobile-ocr-dict-{}-{}.txt",
            std::process::id(),
            contents.len()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_dictionary_layout() {
        let path = write_dict("a\nb\nc\n");
        let vocab = load_dictionary(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // Blank at 0, file tokens at 1..=3, space appended last.
        assert_eq!(vocab.len(), 5);
        assert_eq!(vocab[0], "");
        assert_eq!(vocab[1], "a");
        assert_eq!(vocab[3], "c");
        assert_eq!(vocab[4], " ");
    }

    #[test]
    fn test_dictionary_without_trailing_newline() {
        let path = write_dict("x\ny");
        let vocab = load_dictionary(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab[2], "y");
    }

    #[test]
    fn test_missing_dictionary_is_config_error() {
        let result = load_dictionary("/definitely/not/here.txt");
        assert!(matches!(result, Err(OCRError::ConfigError { .. })));
    }
}
