//! The object storage seam: upload limits, media-type allow-lists and the
//! HTTP adapter for the external storage service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::Error;

/// The largest upload accepted by the server, in bytes.
///
/// Clients check this limit before uploading, but the server enforces its
/// own ceiling rather than trusting them.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A set of media types accepted for an upload, with the message returned
/// when a file falls outside it.
///
/// Allow-lists are data so call sites select one instead of hardcoding
/// their own checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedMediaTypes {
    types: &'static [&'static str],
    rejection: &'static str,
}

/// The base allow-list for image uploads.
pub const ALLOWED_IMAGE_TYPES: AllowedMediaTypes = AllowedMediaTypes {
    types: &["image/jpeg", "image/png"],
    rejection: "Only JPG and PNG images are allowed",
};

/// The allow-list for the profile-picture flow, which additionally accepts
/// GIFs.
pub const ALLOWED_PROFILE_PICTURE_TYPES: AllowedMediaTypes = AllowedMediaTypes {
    types: &["image/jpeg", "image/png", "image/gif"],
    rejection: "Only JPG, PNG and GIF images are allowed",
};

impl AllowedMediaTypes {
    /// Whether `media_type` is in the allow-list.
    pub fn allows(&self, media_type: &str) -> bool {
        self.types.contains(&media_type)
    }

    /// The message to return when a file falls outside the allow-list.
    pub fn rejection(&self) -> &'static str {
        self.rejection
    }
}

/// The upload rules applied by the image upload route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadConfig {
    /// The media types accepted.
    pub allowed_types: AllowedMediaTypes,
    /// The largest accepted file, in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_types: ALLOWED_IMAGE_TYPES,
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadConfig {
    /// The upload rules for the profile-picture flow.
    pub fn profile_pictures() -> Self {
        Self {
            allowed_types: ALLOWED_PROFILE_PICTURE_TYPES,
            ..Self::default()
        }
    }
}

/// The stable location external storage assigned to an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// The URL the object is served from.
    pub url: String,
}

/// Uploads bytes to an external object-storage/CDN service.
///
/// Implementations must be safe to call concurrently and must never be
/// invoked while a database lock or transaction is held; the route layer
/// uploads first and persists after.
#[async_trait]
pub trait ObjectStorage: Clone + Send + Sync + 'static {
    /// Upload `bytes` and return the stable URL assigned by the service.
    ///
    /// # Errors
    /// Returns [Error::ObjectStorage] if the upload fails; the message is
    /// logged server-side and never surfaced to clients.
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject, Error>;
}

/// The fields read from the storage service's upload response.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// An [ObjectStorage] backed by an unsigned-upload HTTP endpoint.
///
/// This adapter owns transport details only: request serialization, the
/// request timeout and the mapping of HTTP errors onto [Error].
#[derive(Debug, Clone)]
pub struct HttpObjectStorage {
    client: reqwest::Client,
    endpoint: String,
    upload_preset: String,
}

impl HttpObjectStorage {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    /// Returns [Error::ObjectStorage] when the HTTP client cannot be
    /// constructed.
    pub fn new(endpoint: String, upload_preset: String, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::ObjectStorage(error.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            upload_preset,
        })
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject, Error> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("upload")
            .mime_str(content_type)
            .map_err(|error| Error::ObjectStorage(error.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|error| Error::ObjectStorage(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::ObjectStorage(format!(
                "storage service responded with status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|error| Error::ObjectStorage(error.to_string()))?;

        Ok(StoredObject {
            url: body.secure_url,
        })
    }
}
