//! End-to-end sync tests: a `wiremock` listing site, a real `ListingClient`,
//! and in-memory blob and catalog stores.

use std::collections::HashMap;
use std::sync::Mutex;

use appsync_core::{PersistedAppliance, ProductRecord, SyncSettings};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appsync_scraper::{
    BlobStore, CatalogStore, ListingClient, ScraperError, SyncDriver, SyncEvent, Visibility,
};

const LISTING_PATH: &str = "/search/small-appliances";

#[derive(Default)]
struct MemoryBlobs {
    blobs: Mutex<HashMap<String, (Vec<u8>, Visibility)>>,
}

impl BlobStore for MemoryBlobs {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        visibility: Visibility,
    ) -> Result<(), ScraperError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_owned(), (bytes.to_vec(), visibility));
        Ok(())
    }
}

#[derive(Default)]
struct MemoryCatalog {
    entries: Mutex<HashMap<String, (i64, ProductRecord)>>,
}

impl MemoryCatalog {
    fn get(&self, external_id: &str) -> Option<ProductRecord> {
        self.entries
            .lock()
            .unwrap()
            .get(external_id)
            .map(|(_, r)| r.clone())
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl CatalogStore for MemoryCatalog {
    async fn upsert(&self, record: &ProductRecord) -> Result<PersistedAppliance, ScraperError> {
        let mut entries = self.entries.lock().unwrap();
        let next_id = i64::try_from(entries.len()).unwrap() + 1;
        let (id, inserted) = match entries.get(&record.external_id) {
            Some((id, _)) => (*id, false),
            None => (next_id, true),
        };
        entries.insert(record.external_id.clone(), (id, record.clone()));
        Ok(PersistedAppliance {
            id,
            external_id: record.external_id.clone(),
            title: record.title.clone(),
            inserted,
        })
    }
}

fn card(id: u32, title: &str, features: &[&str], price: &str) -> String {
    let items: String = features.iter().map(|f| format!("<li>{f}</li>")).collect();
    format!(
        r#"<div class="search-results-product">
             <div class="product-image"><img class="img-responsive" src="/img/{id}.jpg"></div>
             <h4><a href="/product/{title}/{id}">{title}</a></h4>
             <ul class="result-list-item-desc-list">{items}</ul>
             <h3>{price}</h3>
           </div>"#
    )
}

fn listing(cards: &[String]) -> String {
    format!(
        "<html><body><div class=\"results\">{}</div></body></html>",
        cards.concat()
    )
}

async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, id: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/img/{id}.jpg")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("jpeg-{id}").into_bytes()))
        .mount(server)
        .await;
}

/// Two populated pages (three products) followed by an empty page 3.
async fn listing_site() -> MockServer {
    let server = MockServer::start().await;

    mount_page(
        &server,
        1,
        listing(&[
            card(9981, "Kettle", &["1.7L", "3000W"], "€1,234.50"),
            card(1002, "Toaster", &[], "€29.99"),
        ]),
    )
    .await;
    mount_page(
        &server,
        2,
        listing(&[card(5550, "Blender", &["Glass jug"], "€ 49")]),
    )
    .await;
    mount_page(&server, 3, listing(&[])).await;

    for id in [9981, 1002, 5550] {
        mount_image(&server, id).await;
    }
    server
}

fn driver(
    server: &MockServer,
) -> SyncDriver<ListingClient, MemoryBlobs, MemoryCatalog> {
    let client = ListingClient::new(5, "appsync-test/0.1", 0, 0).unwrap();
    let settings = SyncSettings {
        base_url: format!("{}{LISTING_PATH}", server.uri()),
        ..SyncSettings::default()
    };
    SyncDriver::new(client, MemoryBlobs::default(), MemoryCatalog::default(), settings)
}

async fn collect_events(mut rx: mpsc::UnboundedReceiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn sync_persists_every_product_with_normalized_fields() {
    let server = listing_site().await;
    let driver = driver(&server);
    let (tx, _rx) = mpsc::unbounded_channel();

    let summary = driver.run(tx).await.unwrap();

    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.items_processed, 3);
    assert_eq!(summary.items_inserted, 3);
    assert_eq!(driver.catalog().len(), 3);

    let kettle = driver.catalog().get("9981").unwrap();
    assert_eq!(kettle.title, "Kettle");
    assert_eq!(kettle.product_url, "/product/Kettle/9981");
    assert_eq!(kettle.description, "<ul><li>1.7L</li><li>3000W</li></ul>");
    assert_eq!(kettle.price_amount, 123_450);
    assert_eq!(kettle.price_currency, "EUR");
    assert_eq!(kettle.category, "small_appliance");
    assert_eq!(kettle.image_asset_key, "9981");
    assert_eq!(kettle.image_source_url, "/img/9981.jpg");

    let toaster = driver.catalog().get("1002").unwrap();
    assert_eq!(toaster.description, "");
    assert_eq!(toaster.price_amount, 2999);

    let blender = driver.catalog().get("5550").unwrap();
    assert_eq!(blender.price_amount, 4900);
}

#[tokio::test]
async fn images_are_stored_publicly_under_external_id() {
    let server = listing_site().await;
    let driver = driver(&server);
    let (tx, _rx) = mpsc::unbounded_channel();

    driver.run(tx).await.unwrap();

    let blobs = driver.blobs().blobs.lock().unwrap();
    assert_eq!(blobs.len(), 3);
    let (bytes, visibility) = &blobs["9981"];
    assert_eq!(bytes, b"jpeg-9981");
    assert_eq!(*visibility, Visibility::Public);
}

#[tokio::test]
async fn second_run_updates_without_duplicating() {
    let server = listing_site().await;
    let driver = driver(&server);

    let (tx, _rx) = mpsc::unbounded_channel();
    let first = driver.run(tx).await.unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();
    let second = driver.run(tx).await.unwrap();

    assert_eq!(first.items_inserted, 3);
    assert_eq!(second.items_processed, 3);
    assert_eq!(second.items_inserted, 0);
    assert_eq!(driver.catalog().len(), 3);
    assert_eq!(driver.blobs().blobs.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn events_arrive_in_walk_order_and_channel_closes() {
    let server = listing_site().await;
    let driver = driver(&server);
    let (tx, rx) = mpsc::unbounded_channel();

    let (result, events) = tokio::join!(driver.run(tx), collect_events(rx));
    result.unwrap();

    let trace: Vec<String> = events
        .iter()
        .map(|e| match e {
            SyncEvent::PageLoaded { page, .. } => format!("page {page}"),
            SyncEvent::ItemProcessed { appliance, .. } => format!("item {}", appliance.external_id),
            SyncEvent::ItemSkipped { reason, .. } => format!("skip {reason}"),
        })
        .collect();
    assert_eq!(
        trace,
        vec![
            "page 1", "item 9981", "item 1002", "page 2", "item 5550", "page 3",
        ]
    );
}

#[tokio::test]
async fn missing_image_fails_the_run_after_earlier_products() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        listing(&[
            card(1, "Iron", &[], "€15.00"),
            card(2, "Fan", &[], "€25.00"),
        ]),
    )
    .await;
    mount_image(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/img/2.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let driver = driver(&server);
    let (tx, _rx) = mpsc::unbounded_channel();
    let err = driver.run(tx).await.unwrap_err();

    assert!(
        matches!(err, ScraperError::NotFound { ref url } if url.ends_with("/img/2.jpg")),
        "unexpected error: {err:?}"
    );
    assert!(driver.catalog().get("1").is_some());
    assert!(driver.catalog().get("2").is_none());
}
