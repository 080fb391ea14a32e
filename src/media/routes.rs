//! Route handlers for uploading and listing images.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

use crate::{
    Error,
    auth::Claims,
    state::{DbState, MediaState},
};

use super::{
    image::{Image, insert_image, list_images_for_user},
    storage::ObjectStorage,
};

/// The parts read out of the upload form.
struct UploadForm {
    bytes: Vec<u8>,
    content_type: String,
    caption: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, Error> {
    let mut file: Option<(Vec<u8>, String)> = None;
    let mut caption: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| Error::MalformedRequest)?
    {
        let name = field.name().map(str::to_owned);

        match name.as_deref() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .map(str::to_owned)
                    .unwrap_or_default();
                let bytes = field.bytes().await.map_err(|_| Error::MalformedRequest)?;
                file = Some((bytes.to_vec(), content_type));
            }
            Some("caption") => {
                caption = Some(field.text().await.map_err(|_| Error::MalformedRequest)?);
            }
            _ => {}
        }
    }

    let (bytes, content_type) = file.ok_or(Error::MissingUploadFile)?;

    Ok(UploadForm {
        bytes,
        content_type,
        caption,
    })
}

/// Route handler for uploading an image.
///
/// The file is checked against the configured media-type allow-list and size
/// ceiling, uploaded to external storage, and only then recorded in the
/// database; the storage call never runs while the database lock is held.
pub async fn upload_image<S: ObjectStorage>(
    State(state): State<MediaState<S>>,
    claims: Claims,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Image>), Error> {
    let form = read_upload_form(multipart).await?;

    let config = &state.upload_config;
    if !config.allowed_types.allows(&form.content_type) {
        return Err(Error::UnsupportedMediaType(config.allowed_types.rejection()));
    }
    if form.bytes.len() > config.max_bytes {
        return Err(Error::UploadTooLarge(config.max_bytes));
    }

    let stored = state
        .object_storage
        .upload(form.bytes, &form.content_type)
        .await
        .map_err(|error| {
            // The raw upstream message is for the log only.
            tracing::error!("image upload failed: {}", error);
            error
        })?;

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    let image = insert_image(claims.id, &stored.url, form.caption.as_deref(), &connection)?;

    Ok((StatusCode::CREATED, Json(image)))
}

/// Route handler for listing the caller's own images, newest first.
///
/// There is no admin override here: every principal, admin or not, sees
/// only their own uploads.
pub async fn get_images(
    State(state): State<DbState>,
    claims: Claims,
) -> Result<Json<Vec<Image>>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    list_images_for_user(claims.id, &connection).map(Json)
}

#[cfg(test)]
mod media_route_tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::Value;

    use crate::test_utils::TestApp;

    fn png_upload(caption: Option<&str>) -> MultipartForm {
        let part = Part::bytes(vec![0x89, b'P', b'N', b'G'])
            .file_name("mynd.png")
            .mime_type("image/png");

        let form = MultipartForm::new().add_part("file", part);
        match caption {
            Some(caption) => form.add_text("caption", caption),
            None => form,
        }
    }

    #[tokio::test]
    async fn upload_requires_a_bearer_token() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/auth/images/upload")
            .multipart(png_upload(None))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_stores_image_and_returns_record() {
        let app = TestApp::new();
        let token = app.register_and_login("a", "a@x.com", "pw123456").await;

        let response = app
            .server
            .post("/auth/images/upload")
            .authorization_bearer(&token)
            .multipart(png_upload(Some("profile picture")))
            .await;

        response.assert_status(StatusCode::CREATED);

        let body = response.json::<Value>();
        assert_eq!(body["user_id"], 1);
        assert_eq!(body["caption"], "profile picture");
        assert_eq!(
            body["image_url"].as_str().unwrap(),
            app.object_storage.last_url().unwrap()
        );
    }

    #[tokio::test]
    async fn upload_rejects_disallowed_media_type() {
        let app = TestApp::new();
        let token = app.register_and_login("a", "a@x.com", "pw123456").await;

        let part = Part::bytes(b"GIF89a".to_vec())
            .file_name("mynd.gif")
            .mime_type("image/gif");
        let form = MultipartForm::new().add_part("file", part);

        let response = app
            .server
            .post("/auth/images/upload")
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "Only JPG and PNG images are allowed"
        );
        assert!(app.object_storage.is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_file_over_the_size_ceiling() {
        // A tiny ceiling keeps the test fast; the rule is the same at 5 MB.
        let app = TestApp::with_max_upload_bytes(16);
        let token = app.register_and_login("a", "a@x.com", "pw123456").await;

        let part = Part::bytes(vec![0_u8; 17])
            .file_name("mynd.png")
            .mime_type("image/png");
        let form = MultipartForm::new().add_part("file", part);

        let response = app
            .server
            .post("/auth/images/upload")
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(app.object_storage.is_empty());
    }

    #[tokio::test]
    async fn upload_without_file_part_is_rejected() {
        let app = TestApp::new();
        let token = app.register_and_login("a", "a@x.com", "pw123456").await;

        let form = MultipartForm::new().add_text("caption", "no file");

        let response = app
            .server
            .post("/auth/images/upload")
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "No file provided");
    }

    #[tokio::test]
    async fn upstream_failure_is_surfaced_as_generic_500() {
        let app = TestApp::with_failing_storage();
        let token = app.register_and_login("a", "a@x.com", "pw123456").await;

        let response = app
            .server
            .post("/auth/images/upload")
            .authorization_bearer(&token)
            .multipart(png_upload(None))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        // The upstream error message is suppressed.
        assert_eq!(
            response.json::<Value>()["error"],
            "Internal server error"
        );
    }

    #[tokio::test]
    async fn listing_returns_only_the_callers_images() {
        let app = TestApp::new();
        let token = app.register_and_login("a", "a@x.com", "pw123456").await;
        let other_token = app.register_and_login("b", "b@x.com", "pw123456").await;

        app.server
            .post("/auth/images/upload")
            .authorization_bearer(&token)
            .multipart(png_upload(None))
            .await
            .assert_status(StatusCode::CREATED);

        app.server
            .post("/auth/images/upload")
            .authorization_bearer(&other_token)
            .multipart(png_upload(None))
            .await
            .assert_status(StatusCode::CREATED);

        let body = app
            .server
            .get("/auth/images")
            .authorization_bearer(&token)
            .await
            .json::<Value>();

        let images = body.as_array().unwrap();
        assert_eq!(images.len(), 1);
        assert!(images.iter().all(|image| image["user_id"] == 1));
    }

    #[tokio::test]
    async fn admins_have_no_override_on_image_listings() {
        let app = TestApp::new();
        let token = app.register_and_login("a", "a@x.com", "pw123456").await;
        let admin_token = app.seed_admin_and_login("stjornandi").await;

        app.server
            .post("/auth/images/upload")
            .authorization_bearer(&token)
            .multipart(png_upload(None))
            .await
            .assert_status(StatusCode::CREATED);

        let body = app
            .server
            .get("/auth/images")
            .authorization_bearer(&admin_token)
            .await
            .json::<Value>();

        assert_eq!(body.as_array().unwrap().len(), 0);
    }
}
