//! Test helpers: build AppState and router for integration tests.
//!
//! Stores are in memory and storage is a local directory, so no database is
//! needed. Run with `cargo test -p albums-api`.

#![allow(dead_code)]

pub mod fixtures;

use albums_api::constants;
use albums_api::setup::routes;
use albums_api::state::AppState;
use albums_core::{AlbumsConfig, BaseConfig, Config, OwnerRef, StorageBackend};
use albums_db::test_helpers::MemoryAttachmentStore;
use albums_storage::{LocalStorage, Storage};
use axum_test::TestServer;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const OWNER_TYPE: &str = "user";

/// API path of an album route, e.g. `album_path(id, "/zip")`
pub fn album_path(owner_id: Uuid, suffix: &str) -> String {
    format!(
        "{}/albums/{}/{}{}",
        constants::API_PREFIX,
        OWNER_TYPE,
        owner_id,
        suffix
    )
}

/// Test application: server, in-memory store and the storage root
pub struct TestApp {
    pub server: TestServer,
    pub store: MemoryAttachmentStore,
    pub state: Arc<AppState>,
    pub owner: OwnerRef,
    pub user_id: Uuid,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn path(&self, suffix: &str) -> String {
        album_path(self.owner.owner_id, suffix)
    }

    pub fn user_header(&self) -> String {
        self.user_id.to_string()
    }

    /// Files left in the staging directory
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(&self.state.albums.temp_dir)
            .map(|d| d.count())
            .unwrap_or(0)
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.state.albums.storage
    }
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let media = temp_dir.path().join("media");
    let config = create_test_config(&temp_dir);

    let storage = LocalStorage::new(media, "http://localhost/media".to_string())
        .await
        .expect("Failed to create local storage");
    let store = MemoryAttachmentStore::new();

    let state = AppState::new(
        config.clone(),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(storage),
    )
    .expect("Failed to build app state");
    let state = Arc::new(state);

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        store,
        state,
        owner: OwnerRef::new(OWNER_TYPE, Uuid::new_v4()),
        user_id: Uuid::new_v4(),
        _temp_dir: temp_dir,
    }
}

fn create_test_config(temp_dir: &TempDir) -> Config {
    let base = BaseConfig {
        server_port: 4000,
        cors_origins: vec!["*".to_string()],
        db_max_connections: 5,
        db_timeout_seconds: 30,
        environment: "test".to_string(),
    };

    Config(Box::new(AlbumsConfig {
        base,
        database_url: "postgresql://unused@localhost/albums".to_string(),
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(temp_dir.path().join("media").display().to_string()),
        local_storage_base_url: Some("http://localhost/media".to_string()),
        max_image_size_bytes: 1024 * 1024,
        max_archive_size_bytes: 4 * 1024 * 1024,
        import_chunk_size_bytes: 64 * 1024,
        import_temp_dir: Some(temp_dir.path().join("imports")),
        image_extensions: vec!["jpg".into(), "jpeg".into(), "png".into(), "gif".into()],
        owner_types: vec![OWNER_TYPE.to_string()],
    }))
}
