//! Interactive CSV picker.
//!
//! Used when no `--data` path is given (flag, `SUPERSTORE_DATA` or config):
//! lists the `*.csv` files below the working directory and asks which to load.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::ingest::is_csv_path;

const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Prompt on stdin/stdout for a CSV file.
///
/// Accepts a list number or an explicit path; `q` cancels.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files(Path::new("."));
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found. Pass one with `--data <file.csv>` or set SUPERSTORE_DATA.",
        ));
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    pick_from(&files, &mut stdin.lock(), &mut stdout.lock())
}

fn pick_from<R: BufRead, W: Write>(files: &[PathBuf], input: &mut R, out: &mut W) -> Result<PathBuf, AppError> {
    let io_err = |e: io::Error| AppError::new(2, format!("Terminal I/O failed: {e}"));

    writeln!(out, "Found {} CSV file(s):", files.len()).map_err(io_err)?;
    for (idx, path) in files.iter().enumerate() {
        writeln!(out, "{:>3}) {}", idx + 1, pretty_path(path)).map_err(io_err)?;
    }

    loop {
        write!(out, "Select a file by number (1-{}) or type a path (q to quit): ", files.len()).map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(AppError::new(2, "No input received. Pass a CSV with `--data <file.csv>`."));
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(choice) = line.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_csv_path(&files[choice - 1]);
            }
            writeln!(out, "Invalid choice: {choice}. Enter a number between 1 and {}.", files.len())
                .map_err(io_err)?;
            continue;
        }

        match validate_csv_path(Path::new(line)) {
            Ok(path) => return Ok(path),
            Err(err) => writeln!(out, "{err}").map_err(io_err)?,
        }
    }
}

/// Check that `path` is an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !is_csv_path(path) {
        return Err(AppError::new(2, format!("Expected a .csv file (got: {})", path.display())));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under `root`, sorted by display path.
pub fn discover_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, 0, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > DEFAULT_SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                walk(&path, depth + 1, out);
            }
        } else if file_type.is_file() && is_csv_path(&path) {
            out.push(path);
        }
    }
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules" | "screenshots")
}

fn pretty_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, "Order Date,Category,Region,Sales,Profit\n").unwrap();
    }

    #[test]
    fn discovers_csv_files_and_skips_output_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        touch(&dir.path().join("data/superstore.csv"));
        touch(&dir.path().join("b.CSV"));
        touch(&dir.path().join("target/ignored.csv"));
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let found = discover_csv_files(dir.path());
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"superstore.csv".to_string()));
        assert!(names.contains(&"b.CSV".to_string()));
    }

    #[test]
    fn picks_by_number_after_invalid_choice() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        touch(&a);
        let files = vec![a.clone()];

        let mut input = io::Cursor::new("9\n1\n");
        let mut out = Vec::new();
        let picked = pick_from(&files, &mut input, &mut out).unwrap();
        assert_eq!(picked, a);
        assert!(String::from_utf8(out).unwrap().contains("Invalid choice: 9"));
    }

    #[test]
    fn quit_and_eof_cancel() {
        let files = vec![PathBuf::from("a.csv")];
        let mut out = Vec::new();
        let err = pick_from(&files, &mut io::Cursor::new("q\n"), &mut out).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(pick_from(&files, &mut io::Cursor::new(""), &mut out).is_err());
    }

    #[test]
    fn validate_rejects_non_csv() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "x").unwrap();
        assert!(validate_csv_path(&txt).is_err());
        assert!(validate_csv_path(dir.path()).is_err());
        assert!(validate_csv_path(&dir.path().join("missing.csv")).is_err());
    }
}
