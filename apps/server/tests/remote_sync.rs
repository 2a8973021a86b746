//! End-to-end sync: caches driven through `HttpStore` against a live server.

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use atlas_cache::{CoordinateCache, ProjectCache};
use atlas_server::{create_app, AppState, ServerConfig};
use atlas_store::{
    CoordinateFilter, CoordinateRepository, HttpStore, JsonFileStore, ProjectRepository,
    Repositories, StoreResult, TaskFilter,
};
use entities::{Category, Coordinate, CoordinateDraft, ProjectDraft};
use tempfile::TempDir;
use tokio::net::TcpListener;
use uuid::Uuid;

struct TestServer {
    url: String,
    backend: Arc<JsonFileStore>,
    _dir: TempDir,
}

async fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
    let state = AppState::with_repositories(
        Repositories::from_shared(backend.clone()),
        ServerConfig::default(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_app(state)).await.unwrap();
    });

    TestServer {
        url: format!("http://{addr}"),
        backend,
        _dir: dir,
    }
}

fn client(url: &str) -> Arc<HttpStore> {
    Arc::new(HttpStore::new(url, Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn test_coordinate_cache_over_http() {
    let server = spawn_server().await;
    let cache = CoordinateCache::new(client(&server.url));

    cache.refresh().await;
    assert!(cache.entities().is_empty());
    assert_eq!(cache.error(), None);

    let base = cache
        .add(CoordinateDraft::new(
            "Nether Base",
            (10.0, 64.0, -5.0),
            Category::Base,
            "shelter",
            "neo",
        ))
        .await
        .unwrap();
    let spawn = cache
        .add(CoordinateDraft::new(
            "Spawn",
            (0.0, 70.0, 0.0),
            Category::Biome,
            "plains",
            "neo",
        ))
        .await
        .unwrap();

    // The server persisted both, newest first.
    assert_eq!(
        server.backend.list_all_coordinates().await.unwrap(),
        vec![spawn.clone(), base.clone()]
    );

    // A second client sees the same collection.
    let other = CoordinateCache::new(client(&server.url));
    other.refresh().await;
    assert_eq!(other.entities(), cache.entities());
    assert_eq!(other.bases(), vec![base.clone()]);
    assert_eq!(other.biomes(), vec![spawn]);

    assert!(cache.remove(base.id).await.unwrap());
    assert!(!other.remove(base.id).await.unwrap());
    assert_eq!(server.backend.list_all_coordinates().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_validation_error_crosses_the_wire() {
    let server = spawn_server().await;
    let store = client(&server.url);

    let mut draft = CoordinateDraft::new("Portal", (1.0, 2.0, 3.0), Category::Base, "gate", "neo");
    draft.kind = String::new();

    let err = store.create_coordinate(draft).await.unwrap_err();
    assert!(matches!(err, atlas_store::StoreError::ValidationFailed(_)));
}

#[tokio::test]
async fn test_project_cache_over_http() {
    let server = spawn_server().await;
    let cache = ProjectCache::new(client(&server.url));
    cache.refresh().await;

    let project = cache
        .add_project(ProjectDraft::new("Railway", "trinity"))
        .await
        .unwrap();
    let task = cache.add_task(project.id, "Gather iron").await.unwrap();

    let toggled = cache.toggle_task(task.id, project.id).await.unwrap().unwrap();
    assert!(toggled.completed);
    let toggled = cache.toggle_project(project.id).await.unwrap().unwrap();
    assert!(toggled.completed);

    let fresh = ProjectCache::new(client(&server.url));
    fresh.refresh().await;
    let projects = fresh.entities();
    assert_eq!(projects.len(), 1);
    assert!(projects[0].completed);
    assert_eq!(projects[0].tasks.len(), 1);
    assert!(projects[0].tasks[0].completed);

    // Deleting the project orphans its task until the purge.
    assert!(cache.remove_project(project.id).await.unwrap());
    fresh.refresh().await;
    assert!(fresh.entities().is_empty());
    assert_eq!(
        server.backend.list_tasks(TaskFilter::new()).await.unwrap().len(),
        1
    );
    assert_eq!(cache.purge_orphans().await.unwrap(), 1);
    assert!(server
        .backend
        .list_tasks(TaskFilter::new())
        .await
        .unwrap()
        .is_empty());
}

/// Coordinate repository whose remote can be swapped mid-test.
struct SwitchableStore {
    current: RwLock<Arc<HttpStore>>,
}

impl SwitchableStore {
    fn new(store: Arc<HttpStore>) -> Self {
        Self {
            current: RwLock::new(store),
        }
    }

    fn point_at(&self, store: Arc<HttpStore>) {
        *self.current.write().unwrap() = store;
    }

    fn current(&self) -> Arc<HttpStore> {
        self.current.read().unwrap().clone()
    }
}

#[async_trait]
impl CoordinateRepository for SwitchableStore {
    async fn list_coordinates(&self, filter: CoordinateFilter) -> StoreResult<Vec<Coordinate>> {
        self.current().list_coordinates(filter).await
    }

    async fn create_coordinate(&self, draft: CoordinateDraft) -> StoreResult<Coordinate> {
        self.current().create_coordinate(draft).await
    }

    async fn delete_coordinate(&self, id: Uuid) -> StoreResult<bool> {
        self.current().delete_coordinate(id).await
    }
}

fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

#[tokio::test]
async fn test_unreachable_server_keeps_stale_state() {
    let server = spawn_server().await;
    let live = client(&server.url);
    let store = Arc::new(SwitchableStore::new(live.clone()));
    let cache = CoordinateCache::new(store.clone());

    let kept = cache
        .add(CoordinateDraft::new(
            "Nether Base",
            (10.0, 64.0, -5.0),
            Category::Base,
            "shelter",
            "neo",
        ))
        .await
        .unwrap();
    cache.refresh().await;
    assert_eq!(cache.entities(), vec![kept.clone()]);
    assert_eq!(cache.error(), None);

    // The same cache loses its server.
    store.point_at(client(&dead_url()));
    cache.refresh().await;
    assert_eq!(cache.entities(), vec![kept.clone()]);
    assert!(cache.error().unwrap().starts_with("store unavailable"));
    assert!(!cache.is_loading());

    store.point_at(live);
    cache.refresh().await;
    assert_eq!(cache.entities(), vec![kept]);
    assert_eq!(cache.error(), None);
}

#[tokio::test]
async fn test_fresh_cache_against_dead_server_is_empty() {
    let offline = CoordinateCache::new(client(&dead_url()));
    offline.refresh().await;
    assert!(offline.entities().is_empty());
    assert!(offline.error().unwrap().starts_with("store unavailable"));
}
