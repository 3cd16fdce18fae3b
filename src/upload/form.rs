//! Threat report form validation.
//!
//! Mirrors a classic server-side form: every field is checked, all failures
//! are collected per field, and the result serializes as
//! `{"field": ["message", ...]}`.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use serde::Serialize;

/// Multipart field carrying the CSV file.
pub const CSV_FILE_FIELD: &str = "csv_file";

/// Required free-text name of the report.
pub const REPORT_NAME_FIELD: &str = "report_name";

/// Optional free-text notes.
pub const NOTES_FIELD: &str = "notes";

/// Maximum length of `report_name` in characters.
pub const MAX_REPORT_NAME_LENGTH: usize = 100;

/// Maximum length of `notes` in characters.
pub const MAX_NOTES_LENGTH: usize = 1000;

/// Maximum length of the uploaded file name in characters.
pub const MAX_FILE_NAME_LENGTH: usize = 100;

/// File extensions accepted for `csv_file` (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv"];

const REQUIRED_MESSAGE: &str = "This field is required.";
const EMPTY_FILE_MESSAGE: &str = "The submitted file is empty.";

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name
    pub file_name: String,

    /// Client-supplied content type, if any
    pub content_type: Option<String>,

    /// File contents
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Lowercased extension of the file name, if it has one.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        Some(ext.to_lowercase())
    }
}

/// Per-field validation errors, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// A submission whose fields all passed validation.
#[derive(Debug, Clone)]
pub struct ThreatReport {
    pub report_name: String,
    pub notes: Option<String>,
    pub csv_file: UploadedFile,
}

/// Unvalidated threat report submission.
#[derive(Debug, Clone)]
pub struct ThreatReportForm {
    fields: HashMap<String, String>,
    csv_file: UploadedFile,
}

impl ThreatReportForm {
    pub fn new(fields: HashMap<String, String>, csv_file: UploadedFile) -> Self {
        Self { fields, csv_file }
    }

    /// Validate every field, returning all failures at once.
    pub fn validate(self) -> Result<ThreatReport, FormErrors> {
        let mut errors = FormErrors::new();

        let report_name = self.text_field(REPORT_NAME_FIELD);
        match report_name.as_deref() {
            None => errors.add(REPORT_NAME_FIELD, REQUIRED_MESSAGE),
            Some(name) => {
                check_length(&mut errors, REPORT_NAME_FIELD, name, MAX_REPORT_NAME_LENGTH)
            }
        }

        let notes = self.text_field(NOTES_FIELD);
        if let Some(notes) = notes.as_deref() {
            check_length(&mut errors, NOTES_FIELD, notes, MAX_NOTES_LENGTH);
        }

        self.check_file(&mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ThreatReport {
            // Checked above: a missing name is recorded as an error.
            report_name: report_name.unwrap_or_default(),
            notes,
            csv_file: self.csv_file,
        })
    }

    /// Trimmed text value, `None` when absent or blank.
    fn text_field(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// File checks stop at the first failure: name length, then emptiness,
    /// then extension.
    fn check_file(&self, errors: &mut FormErrors) {
        let file = &self.csv_file;

        let name_length = file.file_name.chars().count();
        if name_length > MAX_FILE_NAME_LENGTH {
            errors.add(
                CSV_FILE_FIELD,
                format!(
                    "Ensure this filename has at most {} characters (it has {}).",
                    MAX_FILE_NAME_LENGTH, name_length
                ),
            );
            return;
        }

        if file.data.is_empty() {
            errors.add(CSV_FILE_FIELD, EMPTY_FILE_MESSAGE);
            return;
        }

        let extension = file.extension().unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            errors.add(
                CSV_FILE_FIELD,
                format!(
                    "File extension “{}” is not allowed. Allowed extensions are: {}.",
                    extension,
                    ALLOWED_EXTENSIONS.join(", ")
                ),
            );
        }
    }
}

fn check_length(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let length = value.chars().count();
    if length > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, length
            ),
        );
    }
}
