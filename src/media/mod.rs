//! The media upload pipeline: multipart ingestion, external object storage
//! and the image records linking uploads to users.

mod image;
mod routes;
mod storage;

pub use image::{Image, create_images_table, insert_image, list_images_for_user};
pub use routes::{get_images, upload_image};
pub use storage::{
    ALLOWED_IMAGE_TYPES, ALLOWED_PROFILE_PICTURE_TYPES, AllowedMediaTypes, HttpObjectStorage,
    MAX_UPLOAD_BYTES, ObjectStorage, StoredObject, UploadConfig,
};
