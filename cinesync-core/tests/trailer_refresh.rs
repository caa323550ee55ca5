mod support;

use std::sync::Arc;
use std::time::Duration;

use cinesync_core::database::{CatalogStore, ContentRepository};
use cinesync_core::sync::{TrailerRefresher, TrailerStatus};
use cinesync_model::ContentKind;

use support::{Harness, movie, movie_ref, series, series_ref};

const EMBED: &str = "https://www.youtube.com/embed/";

fn refresher(h: &Harness) -> TrailerRefresher {
    let store: Arc<dyn CatalogStore> = h.store.clone();
    TrailerRefresher::new(
        h.provider.clone(),
        store,
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .with_pause(Duration::ZERO)
}

async fn import_movie(h: &Harness, id: i64, trailer: Option<&str>) {
    let mut upstream = movie(id, &format!("tt{id}"), &format!("Movie {id}"));
    upstream.trailer_url = trailer.map(str::to_string);
    h.provider.put_content(movie_ref(id), upstream);
    h.importer
        .import_reference(movie_ref(id), "HD")
        .await
        .unwrap();
}

#[tokio::test]
async fn refresh_fills_missing_trailers_and_reports_each_record() {
    let h = Harness::new();
    import_movie(&h, 1, None).await;
    import_movie(&h, 2, None).await;
    import_movie(&h, 3, None).await;
    import_movie(&h, 4, Some("https://www.youtube.com/embed/kept")).await;

    h.provider
        .put_trailer(movie_ref(1), Some(&format!("{EMBED}one")));
    h.provider.put_trailer(movie_ref(2), None);

    let report = refresher(&h).run(None, 200).await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.total_remaining, 0);
    assert_eq!((report.updated, report.skipped, report.failed), (1, 1, 1));
    let statuses: Vec<_> = report.details.iter().map(|d| d.status).collect();
    assert_eq!(
        statuses,
        vec![
            TrailerStatus::Updated,
            TrailerStatus::Skipped,
            TrailerStatus::Failed
        ]
    );
    assert_eq!(
        report.details[0].trailer_url.as_deref(),
        Some("https://www.youtube.com/embed/one")
    );

    let updated = h.store.content("tt1").await.unwrap();
    assert_eq!(
        updated.trailer_url.as_deref(),
        Some("https://www.youtube.com/embed/one")
    );
    assert!(!h.provider.trailer_calls().contains(&movie_ref(4)));
}

#[tokio::test]
async fn limit_caps_the_run_and_counts_the_rest_as_remaining() {
    let h = Harness::new();
    for id in 1..=5 {
        import_movie(&h, id, None).await;
        h.provider
            .put_trailer(movie_ref(id), Some(&format!("{EMBED}{id}")));
    }

    let report = refresher(&h).run(None, 2).await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.updated, 2);
    assert_eq!(report.total_remaining, 3);

    let next = refresher(&h).run(None, 200).await.unwrap();
    assert_eq!(next.total, 3);
    assert_eq!(next.total_remaining, 0);
}

#[tokio::test]
async fn kind_filter_leaves_other_kinds_alone() {
    let h = Harness::new();
    import_movie(&h, 1, None).await;
    h.provider.put_content(series_ref(9), series(9, "Dark", 0));
    h.importer
        .import_reference(series_ref(9), "HD")
        .await
        .unwrap();
    h.provider.put_trailer(movie_ref(1), Some(&format!("{EMBED}m")));
    h.provider.put_trailer(series_ref(9), Some(&format!("{EMBED}s")));

    let report = refresher(&h)
        .run(Some(ContentKind::Series), 200)
        .await
        .unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(h.provider.trailer_calls(), vec![series_ref(9)]);
    assert_eq!(h.store.content("tt1").await.unwrap().trailer_url, None);
}

#[tokio::test]
async fn failed_trailer_write_is_reported_not_raised() {
    let h = Harness::new();
    import_movie(&h, 1, None).await;
    h.provider.put_trailer(movie_ref(1), Some(&format!("{EMBED}x")));
    h.store.fail_content_writes(true).await;

    let report = refresher(&h).run(None, 200).await.unwrap();

    assert_eq!(report.failed, 1);
    assert!(report.details[0].reason.is_some());
}

#[tokio::test]
async fn imported_ids_are_newest_first_and_checked_per_kind() {
    let h = Harness::new();
    import_movie(&h, 11, None).await;
    import_movie(&h, 12, None).await;
    h.provider.put_content(series_ref(11), series(11, "Same Id", 0));
    h.importer
        .import_reference(series_ref(11), "HD")
        .await
        .unwrap();

    let movies = h
        .store
        .imported_provider_ids(ContentKind::Movie)
        .await
        .unwrap();
    assert_eq!(movies, vec![12, 11]);

    let series_ids = h
        .store
        .imported_provider_ids(ContentKind::Series)
        .await
        .unwrap();
    assert_eq!(series_ids, vec![11]);

    let mut found = h
        .store
        .find_imported_provider_ids(ContentKind::Movie, &[12, 13, 11])
        .await
        .unwrap();
    found.sort_unstable();
    assert_eq!(found, vec![11, 12]);
}
