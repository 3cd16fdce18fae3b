//! Upload handling: multipart parsing, form validation and storage.
//!
//! # Components
//!
//! - [`read_submission`]: drains a multipart body into text fields and files
//! - [`ThreatReportForm`]: validates a submission, collecting per-field errors
//! - [`UploadStore`]: writes validated uploads under the media root

mod form;
mod store;

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use tracing::debug;

use crate::error::UploadError;

pub use form::{
    FormErrors, ThreatReport, ThreatReportForm, UploadedFile, ALLOWED_EXTENSIONS, CSV_FILE_FIELD,
    MAX_FILE_NAME_LENGTH, MAX_NOTES_LENGTH, MAX_REPORT_NAME_LENGTH, NOTES_FIELD,
    REPORT_NAME_FIELD,
};
pub use store::{
    sanitize_file_name, StoredUpload, UploadStore, FALLBACK_FILE_NAME, UPLOAD_SUBDIR,
};

/// Raw contents of a multipart request.
#[derive(Debug, Default)]
pub struct Submission {
    /// Text fields by name (last value wins)
    pub fields: HashMap<String, String>,

    /// File parts by field name (last file wins)
    pub files: HashMap<String, UploadedFile>,
}

impl Submission {
    /// Build the threat report form, failing when no CSV file was attached.
    pub fn into_form(mut self) -> Result<ThreatReportForm, UploadError> {
        let csv_file = self
            .files
            .remove(CSV_FILE_FIELD)
            .ok_or(UploadError::MissingFile(CSV_FILE_FIELD))?;
        Ok(ThreatReportForm::new(self.fields, csv_file))
    }
}

fn multipart_error(e: MultipartError) -> UploadError {
    UploadError::Multipart {
        status: e.status(),
        message: e.body_text(),
    }
}

/// Read every part of a multipart body.
///
/// Parts with a file name are files; everything else is a text field. A file
/// part with a blank file name is what a browser sends when no file was
/// chosen, so it is skipped as if absent.
pub async fn read_submission(multipart: &mut Multipart) -> Result<Submission, UploadError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) if file_name.trim().is_empty() => {
                debug!(field = %name, "Skipping file part without a file name");
            }
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                debug!(
                    field = %name,
                    file_name = %file_name,
                    size = data.len(),
                    "Received file part"
                );
                submission.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                submission.fields.insert(name, value);
            }
        }
    }

    Ok(submission)
}
