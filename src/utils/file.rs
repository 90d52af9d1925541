use std::fs;
use std::path::{Path, PathBuf};

use crate::config::defs::{PipelineError, StepName};

/// Resolves a user-supplied path against the working directory.
pub fn absolute_path(path: &str, cwd: &Path) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// File stem used when deriving step output filenames.
pub fn input_basename(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

/// Creates the root output directory.
///
/// A run can take hours, so an existing directory is refused unless `force`
/// is set. A forced rerun reuses the directory without removing anything
/// already in it.
pub fn prepare_output_dir(root: &Path, force: bool) -> Result<(), PipelineError> {
    if root.exists() && !force {
        return Err(PipelineError::DirectoryConflict(root.to_path_buf()));
    }
    fs::create_dir_all(root)?;
    Ok(())
}

/// The step's output subdirectory, named after the step.
pub fn step_dir(root: &Path, step: StepName) -> PathBuf {
    root.join(step.as_str())
}

/// Creates the step's subdirectory. Called as each step's command is
/// constructed, so steps that end up skipped leave no directory behind.
pub fn ensure_step_dir(root: &Path, step: StepName) -> Result<PathBuf, PipelineError> {
    let dir = step_dir(root, step);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_refuses_existing_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wf");
        fs::create_dir(&root).unwrap();

        let err = prepare_output_dir(&root, false).unwrap_err();
        assert!(matches!(err, PipelineError::DirectoryConflict(_)));
    }

    #[test]
    fn test_prepare_with_force_reuses_existing_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wf");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("keep.txt"), "old output").unwrap();

        prepare_output_dir(&root, true).unwrap();
        assert!(root.join("keep.txt").exists());
    }

    #[test]
    fn test_prepare_creates_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wf");

        prepare_output_dir(&root, false).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_ensure_step_dir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = ensure_step_dir(tmp.path(), StepName::PickOtus).unwrap();
        let again = ensure_step_dir(tmp.path(), StepName::PickOtus).unwrap();
        assert_eq!(dir, again);
        assert_eq!(dir, tmp.path().join("pick_otus"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_input_basename_strips_extension() {
        assert_eq!(input_basename(Path::new("/data/inseqs1.fasta")), "inseqs1");
        assert_eq!(input_basename(Path::new("denoised_seqs.fasta")), "denoised_seqs");
    }
}
