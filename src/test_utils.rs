//! Common helpers for tests: a fully wired test server, seed data and a test
//! double for object storage.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use email_address::EmailAddress;
use rusqlite::Connection;
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::{
    AppState, Error, PasswordHash, UserId,
    account::{Account, NewAccount, insert_account},
    build_router,
    category::insert_category,
    media::{ObjectStorage, StoredObject, UploadConfig},
    payment_method::insert_payment_method,
    user::{NewUser, User, insert_user},
};

/// The password used by every seeded and registered test user.
pub const TEST_PASSWORD: &str = "pw123456";

/// The bcrypt cost used for seeded users; the minimum keeps tests fast.
const TEST_HASH_COST: u32 = 4;

/// A [NewUser] with placeholder fields, for store-level tests that never
/// sign in.
pub fn new_test_user(username: &str, admin: bool) -> NewUser {
    NewUser {
        username: username.to_owned(),
        email: EmailAddress::new_unchecked(format!("{username}@example.com")),
        password: PasswordHash::new_unchecked("$2b$04$notarealhash"),
        admin,
    }
}

/// An unpersisted [User], for token tests that only need a principal.
pub fn test_user(id: i64, username: &str, admin: bool) -> User {
    User {
        id: UserId::new(id),
        username: username.to_owned(),
        email: EmailAddress::new_unchecked(format!("{username}@example.com")),
        password: PasswordHash::new_unchecked("$2b$04$notarealhash"),
        admin,
        created: OffsetDateTime::now_utc(),
        slug: format!("user_{id}"),
    }
}

/// An [ObjectStorage] double that hands out fake CDN URLs, records every
/// upload, and can be told to fail like an upstream outage.
#[derive(Debug, Clone, Default)]
pub struct FakeObjectStorage {
    uploads: Arc<Mutex<Vec<StoredObject>>>,
    fail: bool,
}

impl FakeObjectStorage {
    /// A storage double whose uploads all fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// The URL assigned to the most recent upload.
    pub fn last_url(&self) -> Option<String> {
        self.uploads
            .lock()
            .unwrap()
            .last()
            .map(|object| object.url.clone())
    }

    /// Whether nothing has been uploaded.
    pub fn is_empty(&self) -> bool {
        self.uploads.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl ObjectStorage for FakeObjectStorage {
    async fn upload(&self, _bytes: Vec<u8>, _content_type: &str) -> Result<StoredObject, Error> {
        if self.fail {
            return Err(Error::ObjectStorage("simulated upstream outage".to_owned()));
        }

        let mut uploads = self.uploads.lock().unwrap();
        let object = StoredObject {
            url: format!("https://cdn.test/upload_{}", uploads.len() + 1),
        };
        uploads.push(object.clone());

        Ok(object)
    }
}

/// A test server wired with an in-memory database, seeded reference data
/// and a [FakeObjectStorage].
pub struct TestApp {
    /// The server under test.
    pub server: TestServer,
    /// The shared database connection, for seeding rows directly.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The storage double behind the upload pipeline.
    pub object_storage: FakeObjectStorage,
}

impl TestApp {
    /// An app with the default upload rules.
    pub fn new() -> Self {
        Self::build(UploadConfig::default(), FakeObjectStorage::default())
    }

    /// An app whose upload ceiling is `max_bytes`.
    pub fn with_max_upload_bytes(max_bytes: usize) -> Self {
        Self::build(
            UploadConfig {
                max_bytes,
                ..UploadConfig::default()
            },
            FakeObjectStorage::default(),
        )
    }

    /// An app whose object storage fails every upload.
    pub fn with_failing_storage() -> Self {
        Self::build(UploadConfig::default(), FakeObjectStorage::failing())
    }

    fn build(upload_config: UploadConfig, object_storage: FakeObjectStorage) -> Self {
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");

        let state = AppState::new(
            connection,
            "foobar",
            3600,
            upload_config,
            object_storage.clone(),
        )
        .expect("Could not initialize the application state.");

        let db_connection = state.db_connection.clone();

        {
            let connection = db_connection.lock().unwrap();
            insert_payment_method("Reiðufé", "reidufe", &connection).unwrap();
            insert_payment_method("Kreditkort", "kreditkort", &connection).unwrap();
            insert_category("Matur", "matur", &connection).unwrap();
            insert_category("Samgöngur", "samgongur", &connection).unwrap();
        }

        let server =
            TestServer::try_new(build_router(state)).expect("Could not create test server.");

        Self {
            server,
            db_connection,
            object_storage,
        }
    }

    /// Register a user through the API and return the response body.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Value {
        let response = self
            .server
            .post("/auth/users/register")
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .await;

        response.assert_status_success();
        response.json::<Value>()
    }

    /// Sign in through the API and return the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .server
            .post("/auth/users/login")
            .json(&json!({ "username": username, "password": password }))
            .await;

        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .expect("login response carries a token")
            .to_owned()
    }

    /// Register a user and sign them in, returning the bearer token.
    pub async fn register_and_login(&self, username: &str, email: &str, password: &str) -> String {
        self.register(username, email, password).await;
        self.login(username, password).await
    }

    /// Insert an admin user directly (registration cannot create admins) and
    /// sign them in, returning the bearer token.
    pub async fn seed_admin_and_login(&self, username: &str) -> String {
        {
            let connection = self.db_connection.lock().unwrap();
            insert_user(
                NewUser {
                    username: username.to_owned(),
                    email: EmailAddress::new_unchecked(format!("{username}@example.com")),
                    password: PasswordHash::new(TEST_PASSWORD, TEST_HASH_COST).unwrap(),
                    admin: true,
                },
                &connection,
            )
            .unwrap();
        }

        self.login(username, TEST_PASSWORD).await
    }

    /// Insert an account owned by `user_id` directly.
    pub fn seed_account(&self, user_id: i64, account_name: &str) -> Account {
        let connection = self.db_connection.lock().unwrap();

        insert_account(
            NewAccount {
                user_id: UserId::new(user_id),
                account_name: account_name.to_owned(),
                balance: 1000.0,
            },
            &connection,
        )
        .unwrap()
    }
}
