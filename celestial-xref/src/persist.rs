//! Whole-file rewrites for the reference files.

use crate::error::XrefResult;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Rewrites `path` completely.
///
/// Content goes to a sibling `.tmp` file which is then renamed over the
/// target, so a reader never sees a half-written reference file.
pub(crate) fn replace_file<F>(path: &Path, write: F) -> XrefResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> XrefResult<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let temp_path = temp_path_for(path);
    let file = File::create(&temp_path)?;
    let mut writer = BufWriter::new(file);
    if let Err(e) = write(&mut writer).and_then(|_| writer.flush().map_err(Into::into)) {
        drop(writer);
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    drop(writer);
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XrefError;

    #[test]
    fn test_replace_creates_parent_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ref.txt");
        replace_file(&path, |w| {
            w.write_all(b"HD 1\n")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "HD 1\n");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.txt");
        fs::write(&path, "old\n").unwrap();
        let result = replace_file(&path, |w| {
            w.write_all(b"partial")?;
            Err(XrefError::InvariantViolation("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\n");
        assert!(!temp_path_for(&path).exists());
    }
}
