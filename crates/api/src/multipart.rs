//! Multipart form parsing for the upload endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::ApiError;

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// Client-side filename.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

/// A fully buffered multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<FilePart>,
}

impl FormData {
    /// Reads every part of the request.
    ///
    /// File inputs left empty by the browser (no filename, no bytes) are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns a 400 if the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            match filename {
                Some(filename) => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::validation(e.body_text()))?;
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.push(FilePart {
                        field: name,
                        filename,
                        content_type,
                        data,
                    });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(e.body_text()))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// A text field, trimmed; `None` when absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }

    /// A text field that must be present.
    ///
    /// # Errors
    ///
    /// Returns a 400 naming the field when it is missing or blank.
    pub fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.text(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::validation(format!("{name} is required")))
    }

    /// A text field holding JSON.
    ///
    /// # Errors
    ///
    /// Returns a 400 when the field is present but not valid JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApiError> {
        self.text(name)
            .filter(|v| !v.is_empty())
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| ApiError::validation(format!("Invalid {name}: {e}")))
            })
            .transpose()
    }

    /// Takes the files uploaded under a field name.
    pub fn take_files(&mut self, field: &str) -> Vec<FilePart> {
        let (taken, rest): (Vec<FilePart>, Vec<FilePart>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = rest;
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> FormData {
        let mut form = FormData::default();
        form.fields.insert("name".into(), "  Chair ".into());
        form.fields.insert("blank".into(), "   ".into());
        form.fields.insert("imageUrls".into(), r#"["https://cdn.test/a.png"]"#.into());
        form.files.push(FilePart {
            field: "images".into(),
            filename: "a.png".into(),
            content_type: "image/png".into(),
            data: Bytes::from_static(b"png"),
        });
        form.files.push(FilePart {
            field: "logo".into(),
            filename: "l.png".into(),
            content_type: "image/png".into(),
            data: Bytes::from_static(b"png"),
        });
        form
    }

    #[test]
    fn test_text_fields() {
        let form = form();
        assert_eq!(form.text("name"), Some("Chair"));
        assert_eq!(form.required("name").expect("present"), "Chair");
        assert!(form.required("blank").is_err());
        assert!(form.required("missing").is_err());
    }

    #[test]
    fn test_json_field() {
        let form = form();
        let urls: Option<Vec<String>> = form.json("imageUrls").expect("valid json");
        assert_eq!(urls, Some(vec!["https://cdn.test/a.png".to_string()]));
        assert_eq!(form.json::<Vec<String>>("missing").expect("absent"), None);
        assert!(form.json::<Vec<String>>("name").is_err());
    }

    #[test]
    fn test_take_files_by_field() {
        let mut form = form();
        let images = form.take_files("images");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].filename, "a.png");
        assert!(form.take_files("images").is_empty());
        assert_eq!(form.take_files("logo").len(), 1);
    }
}
