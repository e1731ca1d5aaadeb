use crate::{Error, FilterKind, FilterSelection, Result};
use bytes::Bytes;
use derivative::Derivative;
use derive_setters::Setters;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_", into)]
#[serde(default)]
pub struct ServiceConfig {
    #[derivative(Default(value = "\"http://127.0.0.1:5000\".to_string()"))]
    pub base_url: String,

    /// Multipart field holding the image bytes.
    #[derivative(Default(value = "\"image\".to_string()"))]
    pub image_field: String,

    #[derivative(Default(value = "\"uploaded-image.jpg\".to_string()"))]
    pub upload_filename: String,

    #[derivative(Default(value = "30"))]
    pub timeout_secs: u64,
}

impl ServiceConfig {
    pub fn endpoint_url(&self, kind: FilterKind) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), kind.endpoint())
    }
}

/// Everything needed to issue one filter call, detached from the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    pub url: String,
    pub kind: FilterKind,
    pub image: Bytes,
    pub content_type: String,
    pub image_field: String,
    pub upload_filename: String,
    pub fields: Vec<(&'static str, String)>,
}

impl FilterRequest {
    pub fn new(
        config: &ServiceConfig,
        selection: &FilterSelection,
        image: Bytes,
        content_type: impl ToString,
    ) -> FilterRequest {
        FilterRequest {
            url: config.endpoint_url(selection.kind()),
            kind: selection.kind(),
            image,
            content_type: content_type.to_string(),
            image_field: config.image_field.clone(),
            upload_filename: config.upload_filename.clone(),
            fields: selection.form_fields(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn into_form(self) -> Result<Form> {
        let part = Part::bytes(self.image.to_vec())
            .file_name(self.upload_filename)
            .mime_str(&self.content_type)
            .map_err(|_| Error::InvalidContentType(self.content_type.clone()))?;

        let mut form = Form::new().part(self.image_field, part);
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        Ok(form)
    }
}
