// src/mdm/archive.rs
use super::model::AnalysisReport;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Application export not found: {0}")]
    NotFound(PathBuf),

    #[error("Error loading application export {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error loading application export: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("No JSON files found in export")]
    NoJsonDocument,

    #[error("Error parsing application document {entry}: {source}")]
    Json {
        entry: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write report: {0}")]
    Report(#[source] serde_json::Error),
}

/// Parse the first `.json` entry (archive order) of an export.
pub fn load_application_document(path: &Path) -> Result<Value, ScanError> {
    if !path.exists() {
        return Err(ScanError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if !entry.name().ends_with(".json") {
            continue;
        }

        let entry_name = entry.name().to_string();
        debug!("Loading application document {}", entry_name);
        return serde_json::from_reader(entry).map_err(|source| ScanError::Json {
            entry: entry_name,
            source,
        });
    }

    Err(ScanError::NoJsonDocument)
}

pub fn write_report(report: &AnalysisReport, path: &Path) -> Result<(), ScanError> {
    let io_err = |source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, report).map_err(ScanError::Report)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    info!("Analysis report saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    pub(crate) fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_first_json_entry_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.zip");
        write_archive(
            &path,
            &[
                ("appDefinition.xml", "<app/>"),
                ("app/appDefinition.json", r#"{"appId":"farmers"}"#),
                ("app/other.json", r#"{"appId":"other"}"#),
            ],
        );

        let doc = load_application_document(&path).unwrap();
        assert_eq!(doc["appId"], "farmers");
    }

    #[test]
    fn test_archive_without_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.zip");
        write_archive(&path, &[("appDefinition.xml", "<app/>")]);

        assert!(matches!(
            load_application_document(&path),
            Err(ScanError::NoJsonDocument)
        ));
    }

    #[test]
    fn test_invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.zip");
        write_archive(&path, &[("app.json", "{broken")]);

        assert!(matches!(
            load_application_document(&path),
            Err(ScanError::Json { .. })
        ));
    }

    #[test]
    fn test_not_a_zip_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.zip");
        std::fs::write(&path, "plain text").unwrap();

        assert!(matches!(
            load_application_document(&path),
            Err(ScanError::Archive(_))
        ));
    }

    #[test]
    fn test_missing_archive() {
        assert!(matches!(
            load_application_document(Path::new("/definitely/not/here.zip")),
            Err(ScanError::NotFound(_))
        ));
    }
}
