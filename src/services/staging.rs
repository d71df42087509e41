//! Temporary file staging for a single conversion.
//!
//! Both files are `NamedTempFile`s: they are removed when `StagedFiles` is
//! dropped, which happens on every exit path of the request that owns them.

use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::error::AppError;

/// The uploaded document and the converter's output location.
#[derive(Debug)]
pub struct StagedFiles {
    input: NamedTempFile,
    output: NamedTempFile,
}

impl StagedFiles {
    /// Allocate uniquely named `in*.md` and `out*.pdf` files inside `dir`.
    pub fn create(dir: &Path) -> Result<Self, AppError> {
        let input = Builder::new()
            .prefix("in")
            .suffix(".md")
            .tempfile_in(dir)
            .map_err(AppError::StageInput)?;
        let output = Builder::new()
            .prefix("out")
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(AppError::StageOutput)?;

        Ok(Self { input, output })
    }

    pub fn input_path(&self) -> &Path {
        self.input.path()
    }

    pub fn output_path(&self) -> &Path {
        self.output.path()
    }

    /// Write the uploaded bytes verbatim.
    pub async fn write_input(&self, bytes: &[u8]) -> Result<(), AppError> {
        tokio::fs::write(self.input.path(), bytes)
            .await
            .map_err(AppError::WriteInput)
    }

    /// Read back whatever the converter produced. An empty file counts as no output.
    pub async fn read_output(&self) -> Result<Vec<u8>, AppError> {
        let bytes = tokio::fs::read(self.output.path())
            .await
            .map_err(AppError::ReadOutput)?;
        if bytes.is_empty() {
            return Err(AppError::EmptyOutput);
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn files_are_named_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFiles::create(dir.path()).unwrap();

        let input = staged.input_path().to_path_buf();
        let output = staged.output_path().to_path_buf();
        let input_name = input.file_name().unwrap().to_string_lossy().into_owned();
        let output_name = output.file_name().unwrap().to_string_lossy().into_owned();
        assert!(input_name.starts_with("in") && input_name.ends_with(".md"));
        assert!(output_name.starts_with("out") && output_name.ends_with(".pdf"));

        staged.write_input(b"# Hello\n\nWorld").await.unwrap();
        assert_eq!(std::fs::read(&input).unwrap(), b"# Hello\n\nWorld");

        drop(staged);
        assert!(!input.exists());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn empty_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFiles::create(dir.path()).unwrap();
        assert!(matches!(
            staged.read_output().await,
            Err(AppError::EmptyOutput)
        ));
    }

    #[tokio::test]
    async fn output_written_by_converter_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFiles::create(dir.path()).unwrap();
        std::fs::write(staged.output_path(), b"%PDF-1.7").unwrap();
        assert_eq!(staged.read_output().await.unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn missing_directory_fails_input_allocation() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(matches!(
            StagedFiles::create(&gone),
            Err(AppError::StageInput(_))
        ));
    }
}
