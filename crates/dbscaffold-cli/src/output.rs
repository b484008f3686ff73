use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Write `value` as pretty JSON through a temp file and a rename.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name")
    })?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_pretty_json_and_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join(format!("dbscaffold_out_{}", std::process::id()));
        let path = dir.join("nested").join("definitions.json");

        write_json_atomic(&path, &serde_json::json!({ "definitions": [] })).expect("write json");

        let contents = std::fs::read_to_string(&path).expect("read output");
        assert!(contents.contains("\"definitions\": []"));
        assert!(!path.with_file_name("definitions.json.tmp").exists());
        std::fs::remove_dir_all(&dir).expect("cleanup");
    }
}
