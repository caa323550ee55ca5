#![cfg(feature = "pg-tests")]

mod support;

use std::sync::Arc;

use sqlx::PgPool;

use cinesync_core::StoreError;
use cinesync_core::database::{
    CatalogReader, CatalogStore, ContentRepository, DimensionRepository, LinkInsert,
    LinkRepository, PostgresCatalogStore,
};
use cinesync_core::sync::{HierarchyImporter, UpsertKind};
use cinesync_model::{
    AssetLocators, CatalogFilter, ContentDraft, ContentKind, DimensionKind,
};

use support::fakes::{FakeProvider, FakeStorage};
use support::{cast, movie, movie_ref, names, test_settings};

fn draft(external_id: &str, title: &str) -> ContentDraft {
    ContentDraft {
        external_id: external_id.to_string(),
        provider_id: Some(1),
        kind: ContentKind::Movie,
        title: title.to_string(),
        synopsis: None,
        release_date: None,
        rating: Some(7.5),
        duration: Some("120 min".into()),
        assets: AssetLocators::default(),
        trailer_url: None,
        quality: "HD".into(),
        total_seasons: None,
        country_summary: None,
    }
}

#[sqlx::test(migrator = "cinesync_core::MIGRATOR")]
async fn duplicate_external_id_is_a_benign_conflict(pool: PgPool) {
    let store = PostgresCatalogStore::new(pool);

    store.insert_content(&draft("tt0133093", "The Matrix")).await.unwrap();
    let err = store
        .insert_content(&draft("tt0133093", "The Matrix"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StoreError::ConflictBenign {
            constraint: "contents_external_id_key".into()
        }
    );
}

#[sqlx::test(migrator = "cinesync_core::MIGRATOR")]
async fn relinking_an_existing_pair_is_already_present(pool: PgPool) {
    let store = PostgresCatalogStore::new(pool);
    let content = store.insert_content(&draft("tt0133093", "The Matrix")).await.unwrap();
    let genre = store
        .upsert_dimension(DimensionKind::Genre, "Action", None)
        .await
        .unwrap();

    let first = store
        .insert_link(DimensionKind::Genre, content, genre, None)
        .await
        .unwrap();
    let second = store
        .insert_link(DimensionKind::Genre, content, genre, None)
        .await
        .unwrap();

    assert_eq!(first, LinkInsert::Inserted);
    assert_eq!(second, LinkInsert::AlreadyPresent);
}

#[sqlx::test(migrator = "cinesync_core::MIGRATOR")]
async fn rewound_serial_is_classified_and_reseeded(pool: PgPool) {
    let store = PostgresCatalogStore::new(pool.clone());
    let content = store.insert_content(&draft("tt0133093", "The Matrix")).await.unwrap();
    let action = store
        .upsert_dimension(DimensionKind::Genre, "Action", None)
        .await
        .unwrap();
    let drama = store
        .upsert_dimension(DimensionKind::Genre, "Drama", None)
        .await
        .unwrap();
    store
        .insert_link(DimensionKind::Genre, content, action, None)
        .await
        .unwrap();

    sqlx::query("SELECT setval(pg_get_serial_sequence('content_genres', 'id'), 1, false)")
        .execute(&pool)
        .await
        .unwrap();

    let err = store
        .insert_link(DimensionKind::Genre, content, drama, None)
        .await
        .unwrap_err();
    assert!(err.is_surrogate_conflict(), "{err:?}");

    store.reseed_link_sequence(DimensionKind::Genre).await.unwrap();
    let retried = store
        .insert_link(DimensionKind::Genre, content, drama, None)
        .await
        .unwrap();
    assert_eq!(retried, LinkInsert::Inserted);
}

#[sqlx::test(migrator = "cinesync_core::MIGRATOR")]
async fn actor_photo_is_only_backfilled_when_empty(pool: PgPool) {
    let store = PostgresCatalogStore::new(pool);

    let id = store.upsert_actor("Keanu Reeves", None).await.unwrap();
    assert!(
        store
            .backfill_actor_photo(id, "/uploads/actors/actor-6384.jpg")
            .await
            .unwrap()
    );
    assert!(
        !store
            .backfill_actor_photo(id, "/uploads/actors/other.jpg")
            .await
            .unwrap()
    );

    let row = store
        .find_dimension(DimensionKind::Actor, "Keanu Reeves")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.photo.as_deref(), Some("/uploads/actors/actor-6384.jpg"));
}

#[sqlx::test(migrator = "cinesync_core::MIGRATOR")]
async fn full_import_round_trips_through_postgres(pool: PgPool) {
    let provider = Arc::new(FakeProvider::new());
    let storage = Arc::new(FakeStorage::new());
    let store: Arc<dyn CatalogStore> = Arc::new(PostgresCatalogStore::new(pool));
    let importer = HierarchyImporter::new(
        provider.clone(),
        Arc::clone(&store),
        storage,
        test_settings(),
    );

    let mut upstream = movie(100, "ext:100", "Heat");
    upstream.genres = names(&["Action", "Drama"]);
    upstream.cast = cast(2);
    provider.put_content(movie_ref(100), upstream.clone());

    let first = importer.import_reference(movie_ref(100), "HD").await.unwrap();
    assert_eq!(first.outcome, UpsertKind::Created);

    upstream.genres = names(&["Action"]);
    provider.put_content(movie_ref(100), upstream);
    let second = importer.import_reference(movie_ref(100), "HD").await.unwrap();
    assert_eq!(second.outcome, UpsertKind::Updated);

    let genres = store
        .linked_names(DimensionKind::Genre, second.content_id)
        .await
        .unwrap();
    assert_eq!(genres, names(&["Action"]));
    let actors = store
        .linked_names(DimensionKind::Actor, second.content_id)
        .await
        .unwrap();
    assert_eq!(actors.len(), 2);

    let page = store
        .list_catalog(&CatalogFilter {
            genre: Some("act".into()),
            ..CatalogFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].external_id, "ext:100");
}

#[sqlx::test(migrator = "cinesync_core::MIGRATOR")]
async fn imported_ids_fall_back_to_the_external_id(pool: PgPool) {
    let store = PostgresCatalogStore::new(pool);

    store.insert_content(&draft("tt0133093", "The Matrix")).await.unwrap();
    let mut legacy = draft("tmdb:604", "The Matrix Reloaded");
    legacy.provider_id = None;
    store.insert_content(&legacy).await.unwrap();

    let ids = store.imported_provider_ids(ContentKind::Movie).await.unwrap();
    assert_eq!(ids, vec![604, 1]);
    assert!(
        store
            .imported_provider_ids(ContentKind::Series)
            .await
            .unwrap()
            .is_empty()
    );

    let mut found = store
        .find_imported_provider_ids(ContentKind::Movie, &[1, 604, 605])
        .await
        .unwrap();
    found.sort_unstable();
    assert_eq!(found, vec![1, 604]);
}

#[sqlx::test(migrator = "cinesync_core::MIGRATOR")]
async fn trailer_backlog_pages_and_counts(pool: PgPool) {
    let store = PostgresCatalogStore::new(pool);

    let first = store.insert_content(&draft("tt1", "One")).await.unwrap();
    store.insert_content(&draft("tt2", "Two")).await.unwrap();
    let mut with_trailer = draft("tt3", "Three");
    with_trailer.trailer_url = Some("https://www.youtube.com/embed/x".into());
    store.insert_content(&with_trailer).await.unwrap();

    let backlog = store.contents_missing_trailer(None, 1).await.unwrap();
    assert_eq!(backlog.total, 2);
    assert_eq!(backlog.items.len(), 1);
    assert_eq!(backlog.items[0].id, first);

    store
        .update_trailer(first, "https://www.youtube.com/embed/y")
        .await
        .unwrap();
    let backlog = store
        .contents_missing_trailer(Some(ContentKind::Movie), 10)
        .await
        .unwrap();
    assert_eq!(backlog.total, 1);
    assert_eq!(backlog.items[0].external_id, "tt2");
}
