//! Loading formula files from disk.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// File extension of formula sources.
pub const FORMULA_EXTENSION: &str = "nyaa";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaFile {
    /// Path relative to the directory that was searched.
    pub path: PathBuf,
    pub contents: String,
}

/// Collect every `*.nyaa` file below `root`, sorted by path.
///
/// Entries that cannot be visited are skipped; a formula file that cannot
/// be read is an error.
pub fn load_formula_files(root: impl AsRef<Path>) -> Result<Vec<FormulaFile>, std::io::Error> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == FORMULA_EXTENSION)
        {
            let contents = fs::read_to_string(path)?;
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            files.push(FormulaFile {
                path: relative,
                contents,
            });
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_formula_files_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("pricing")).expect("mkdir");
        fs::write(dir.path().join("b.nyaa"), "1 + 2").expect("write b");
        fs::write(dir.path().join("a.nyaa"), "{price}").expect("write a");
        fs::write(dir.path().join("pricing/discount.nyaa"), "{price} * 0.9").expect("write nested");
        fs::write(dir.path().join("notes.txt"), "not a formula").expect("write txt");

        let files = load_formula_files(dir.path()).expect("load");
        let paths: Vec<_> = files.iter().map(|file| file.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.nyaa"),
                PathBuf::from("b.nyaa"),
                PathBuf::from("pricing/discount.nyaa"),
            ]
        );
        assert_eq!(files[0].contents, "{price}");
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_formula_files(dir.path()).expect("load").is_empty());
    }
}
