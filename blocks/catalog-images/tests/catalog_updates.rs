mod common;

use catalog_images_block::catalogs::{create_catalog, update_catalog};
use common::Harness;
use std::sync::atomic::Ordering;
use vitrine_atoms::catalogs::{CreateCatalogPayload, UpdateCatalogPayload};
use vitrine_atoms::events::{ChangeEvent, ChangeKind};
use vitrine_atoms::AtomError;

const COVER: &str = "https://cdn.test/cover.jpg";
const SOFA: &str = "https://cdn.test/sofa.jpg";
const LAMP: &str = "https://cdn.test/lamp.png";
const RUG: &str = "https://cdn.test/rug.webp";

fn urls(list: &[&str]) -> UpdateCatalogPayload {
    UpdateCatalogPayload {
        content_image_urls: Some(list.iter().map(|u| u.to_string()).collect()),
        ..Default::default()
    }
}

#[tokio::test]
async fn dropping_a_featured_image_unfeatures_it() {
    let h = Harness::new();
    h.catalogs.seed("c1", "Living room", None, &[SOFA, LAMP]);
    h.featured.feature(SOFA);
    let mut rx = h.services.bus.subscribe();

    let updated = update_catalog(&h.services, "c1", urls(&[LAMP]), None).await.unwrap();

    assert_eq!(h.catalogs.urls("c1"), vec![LAMP.to_string()]);
    assert!(h.featured.item(SOFA).is_none());
    assert_eq!(updated.version, 2);
    assert_eq!(rx.recv().await.unwrap(), ChangeEvent::featured(SOFA, ChangeKind::Deleted));
    assert_eq!(rx.recv().await.unwrap(), ChangeEvent::catalog("c1", ChangeKind::Updated));
}

#[tokio::test]
async fn kept_images_keep_their_slot_ids() {
    let h = Harness::new();
    h.catalogs.seed("c1", "Living room", None, &[SOFA, LAMP]);

    let updated = update_catalog(&h.services, "c1", urls(&[LAMP, RUG, SOFA]), None)
        .await
        .unwrap();

    let ids: Vec<&str> = updated.content_images.iter().map(|s| s.image_id.as_str()).collect();
    assert_eq!(ids[0], "c1-1");
    assert_eq!(ids[2], "c1-0");
    assert!(!ids[1].starts_with("c1-"));
}

#[tokio::test]
async fn images_still_used_elsewhere_stay_featured() {
    let h = Harness::new();
    h.catalogs.seed("c1", "Living room", Some(COVER), &[SOFA, LAMP]);
    h.catalogs.seed("c2", "Office", None, &[SOFA]);
    h.featured.feature(SOFA);
    h.featured.feature(COVER);

    let patch = UpdateCatalogPayload {
        cover_image_url: Some(None),
        ..urls(&[LAMP])
    };
    let updated = update_catalog(&h.services, "c1", patch, None).await.unwrap();

    assert_eq!(updated.cover_image_url, None);
    assert!(h.featured.item(SOFA).is_some());
    assert!(h.featured.item(COVER).is_none());
}

#[tokio::test]
async fn failed_write_restores_the_featured_items() {
    let h = Harness::new();
    h.catalogs.seed("c1", "Living room", None, &[SOFA, LAMP]);
    h.featured.feature(SOFA);
    h.catalogs.fail_updates();

    let err = update_catalog(&h.services, "c1", urls(&[LAMP]), None).await.unwrap_err();

    assert!(matches!(err, AtomError::Repository(_)));
    assert_eq!(h.catalogs.urls("c1"), vec![SOFA.to_string(), LAMP.to_string()]);
    assert!(h.featured.item(SOFA).is_some());
}

#[tokio::test]
async fn stale_version_touches_nothing() {
    let h = Harness::new();
    h.catalogs.seed("c1", "Living room", None, &[SOFA]);
    h.featured.feature(SOFA);

    let err = update_catalog(&h.services, "c1", urls(&[]), Some(7)).await.unwrap_err();

    assert!(matches!(err, AtomError::Conflict(_)));
    assert!(h.featured.item(SOFA).is_some());
    assert_eq!(h.catalogs.update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_title_is_rejected_before_any_write() {
    let h = Harness::new();
    h.catalogs.seed("c1", "Living room", None, &[]);

    let patch = UpdateCatalogPayload {
        title: Some("  ".to_string()),
        ..Default::default()
    };
    let err = update_catalog(&h.services, "c1", patch, None).await.unwrap_err();
    assert!(matches!(err, AtomError::Validation(_)));

    let err = create_catalog(
        &h.services,
        CreateCatalogPayload {
            title: String::new(),
            description: String::new(),
            cover_image_url: None,
            content_image_urls: Vec::new(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AtomError::Validation(_)));
}

#[tokio::test]
async fn create_announces_the_new_catalog() {
    let h = Harness::new();
    let mut rx = h.services.bus.subscribe();

    let catalog = create_catalog(
        &h.services,
        CreateCatalogPayload {
            title: "Garden".to_string(),
            description: String::new(),
            cover_image_url: None,
            content_image_urls: vec![RUG.to_string()],
        },
    )
    .await
    .unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        ChangeEvent::catalog(catalog.catalog_id.as_str(), ChangeKind::Created)
    );
}

#[tokio::test]
async fn unknown_catalog_update_is_not_found() {
    let h = Harness::new();

    let err = update_catalog(&h.services, "missing", urls(&[SOFA]), None).await.unwrap_err();
    assert!(matches!(err, AtomError::NotFound(_)));
}
