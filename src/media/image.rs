//! The image records linking uploaded files to the users that own them.

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{DatabaseId, Error, UserId};

/// An uploaded image: the stable URL external storage assigned to it, the
/// owner and an optional caption.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    /// The ID of the image record.
    pub id: DatabaseId,
    /// The user that uploaded the image.
    pub user_id: UserId,
    /// The URL the image is served from.
    pub image_url: String,
    /// An optional caption supplied with the upload.
    pub caption: Option<String>,
    /// When the image was uploaded.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

/// Create the table for storing image records.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_images_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS images (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                image_url TEXT NOT NULL,
                caption TEXT,
                created TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_image_row(row: &Row) -> Result<Image, rusqlite::Error> {
    Ok(Image {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        image_url: row.get(2)?,
        caption: row.get(3)?,
        created: row.get(4)?,
    })
}

/// Persist an image record for `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn insert_image(
    user_id: UserId,
    image_url: &str,
    caption: Option<&str>,
    connection: &Connection,
) -> Result<Image, Error> {
    let created = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO images (user_id, image_url, caption, created) VALUES (?1, ?2, ?3, ?4)",
        (user_id.as_i64(), image_url, caption, created),
    )?;

    Ok(Image {
        id: connection.last_insert_rowid(),
        user_id,
        image_url: image_url.to_owned(),
        caption: caption.map(str::to_owned),
        created,
    })
}

/// List the images owned by `user_id`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_images_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Image>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, image_url, caption, created FROM images
                 WHERE user_id = :user_id
                 ORDER BY created DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_image_row)?
        .map(|maybe_image| maybe_image.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod image_tests {
    use rusqlite::Connection;

    use crate::UserId;

    use super::{create_images_table, insert_image, list_images_for_user};

    fn init_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_images_table(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_image_records_owner_url_and_caption() {
        let conn = init_db();

        let image = insert_image(
            UserId::new(1),
            "https://cdn.example.com/a.png",
            Some("profile picture"),
            &conn,
        )
        .unwrap();

        assert!(image.id > 0);
        assert_eq!(image.user_id, UserId::new(1));
        assert_eq!(image.image_url, "https://cdn.example.com/a.png");
        assert_eq!(image.caption.as_deref(), Some("profile picture"));
    }

    #[test]
    fn caption_is_optional() {
        let conn = init_db();

        let image = insert_image(UserId::new(1), "https://cdn.example.com/a.png", None, &conn)
            .unwrap();

        assert_eq!(image.caption, None);
    }

    #[test]
    fn listing_is_scoped_to_the_owner_and_newest_first() {
        let conn = init_db();

        let first = insert_image(UserId::new(1), "https://cdn.example.com/a.png", None, &conn)
            .unwrap();
        let second = insert_image(UserId::new(1), "https://cdn.example.com/b.png", None, &conn)
            .unwrap();
        insert_image(UserId::new(2), "https://cdn.example.com/c.png", None, &conn).unwrap();

        let images = list_images_for_user(UserId::new(1), &conn).unwrap();

        assert_eq!(images, vec![second, first]);
    }
}
