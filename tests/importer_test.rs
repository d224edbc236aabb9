//! End-to-end import runs against an in-memory entity store.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use salesboard_api::entities::{client, locality, order, product};
use salesboard_api::errors::ServiceError;
use salesboard_api::importer::{self, ImportError, ImportSummary};
use salesboard_api::repositories::{
    EntityStore, NewClient, NewLocality, NewOrder, NewOrderLine, NewProduct,
};

const HEADER: &str = "Code_postal;Ville;Etat;Region;ID_Client;Nom_Client;Segment;ID_Produit;Nom_Produit;Categorie;Sous_Categorie;ID_Commande;Date_Commande;Date_Livraison;Mode_Livraison;Quantite;Ventes;Remise;Benefice";

#[derive(Default)]
struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    clients: HashMap<String, client::Model>,
    localities: HashMap<i64, locality::Model>,
    products: HashMap<String, product::Model>,
    orders: HashMap<String, order::Model>,
    lines: Vec<NewOrderLine>,
    next_locality_id: i32,
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_client(&self, id: &str) -> Result<Option<client::Model>, ServiceError> {
        Ok(self.inner.lock().unwrap().clients.get(id).cloned())
    }

    async fn create_client_if_absent(&self, new: NewClient) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.clients.entry(new.id.clone()).or_insert(client::Model {
            id: new.id,
            name: new.name,
            segment: new.segment.as_str().to_string(),
        });
        Ok(())
    }

    async fn find_locality(
        &self,
        postal_code: i64,
    ) -> Result<Option<locality::Model>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .localities
            .get(&postal_code)
            .cloned())
    }

    async fn create_locality_if_absent(&self, new: NewLocality) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.localities.contains_key(&new.postal_code) {
            inner.next_locality_id += 1;
            let id = inner.next_locality_id;
            inner.localities.insert(
                new.postal_code,
                locality::Model {
                    id,
                    postal_code: new.postal_code,
                    city: new.city,
                    state: new.state,
                    region: new.region.as_str().to_string(),
                },
            );
        }
        Ok(())
    }

    async fn find_product(&self, id: &str) -> Result<Option<product::Model>, ServiceError> {
        Ok(self.inner.lock().unwrap().products.get(id).cloned())
    }

    async fn create_product_if_absent(&self, new: NewProduct) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .products
            .entry(new.id.clone())
            .or_insert(product::Model {
                id: new.id,
                name: new.name,
                category: new.category.as_str().to_string(),
                subcategory: new.subcategory,
            });
        Ok(())
    }

    async fn find_order(&self, id: &str) -> Result<Option<order::Model>, ServiceError> {
        Ok(self.inner.lock().unwrap().orders.get(id).cloned())
    }

    async fn create_order_if_absent(&self, new: NewOrder) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.orders.entry(new.id.clone()).or_insert(order::Model {
            id: new.id,
            order_date: new.order_date,
            delivery_date: new.delivery_date,
            delivery_mode: new.delivery_mode,
        });
        Ok(())
    }

    async fn create_order_line(&self, line: NewOrderLine) -> Result<(), ServiceError> {
        self.inner.lock().unwrap().lines.push(line);
        Ok(())
    }
}

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn row(client_id: &str, order_id: &str, quantity: &str) -> String {
    format!(
        "42420;Lorette;Loire;Central;{client};Marie Payre;Consumer;P-100;Stapler;Office Supplies;Fasteners;{order};2017-11-08;2017-11-12;Standard;{quantity};12,5;0,0;3,2",
        client = client_id,
        order = order_id,
        quantity = quantity,
    )
}

#[tokio::test]
async fn counts_good_and_bad_rows() {
    let store = MemoryStore::default();
    let file = write_csv(&[
        &row("C-1", "O-1", "2"),
        &row("C-2", "O-2", "beaucoup"),
        &row("C-3", "O-3", "1"),
    ]);

    let summary = importer::run(file.path(), &store).await.unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            lines_read: 3,
            lines_created: 2,
            errors: 1,
        }
    );
    assert_eq!(store.inner.lock().unwrap().lines.len(), 2);
}

#[tokio::test]
async fn short_record_is_counted_not_fatal() {
    let store = MemoryStore::default();
    let file = write_csv(&[
        &row("C-1", "O-1", "2"),
        "42420;Lorette;Loire",
        &row("C-3", "O-3", "1"),
    ]);

    let summary = importer::run(file.path(), &store).await.unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            lines_read: 3,
            lines_created: 2,
            errors: 1,
        }
    );
    let inner = store.inner.lock().unwrap();
    assert_eq!(inner.lines.len(), 2);
    assert!(inner.clients.contains_key("C-1"));
    assert!(inner.clients.contains_key("C-3"));
}

#[tokio::test]
async fn repeated_keys_create_one_parent() {
    let store = MemoryStore::default();
    let file = write_csv(&[&row("C-1", "O-1", "2"), &row("C-1", "O-1", "5")]);

    let summary = importer::run(file.path(), &store).await.unwrap();

    let inner = store.inner.lock().unwrap();
    assert_eq!(summary.lines_created, 2);
    assert_eq!(inner.clients.len(), 1);
    assert_eq!(inner.orders.len(), 1);
    assert_eq!(inner.products.len(), 1);
    assert_eq!(inner.localities.len(), 1);
    assert_eq!(inner.lines.len(), 2);
}

#[tokio::test]
async fn first_occurrence_fixes_parent_attributes() {
    let store = MemoryStore::default();
    let first = "42420;Lorette;Loire;Central;C-1;Marie Payre;Consumer;P-100;Stapler;Office Supplies;Fasteners;O-1;2017-11-08;2017-11-12;Standard;2;12,5;0,0;3,2";
    let second = "42420;Lorette;Loire;Central;C-1;Someone Else;Corporate;P-100;Stapler;Office Supplies;Fasteners;O-2;2017-11-09;2017-11-13;Standard;1;8,0;0,0;1,0";
    let file = write_csv(&[first, second]);

    importer::run(file.path(), &store).await.unwrap();

    let inner = store.inner.lock().unwrap();
    let client = &inner.clients["C-1"];
    assert_eq!(client.name, "Marie Payre");
    assert_eq!(client.segment, "Consumer");
}

#[tokio::test]
async fn later_row_can_still_create_a_parent() {
    // The first sighting of C-1 has an unparseable segment; the second
    // is well formed. The client must come from the second row, and
    // both lines still resolve their parents.
    let store = MemoryStore::default();
    let bad = "42420;Lorette;Loire;Central;C-1;Marie Payre;Wholesale;P-100;Stapler;Office Supplies;Fasteners;O-1;2017-11-08;2017-11-12;Standard;2;12,5;0,0;3,2";
    let good = "42420;Lorette;Loire;Central;C-1;Marie Payre;Corporate;P-100;Stapler;Office Supplies;Fasteners;O-2;2017-11-09;2017-11-13;Standard;1;8,0;0,0;1,0";
    let file = write_csv(&[bad, good]);

    let summary = importer::run(file.path(), &store).await.unwrap();

    let inner = store.inner.lock().unwrap();
    assert_eq!(inner.clients["C-1"].segment, "Corporate");
    assert_eq!(summary.lines_created, 2);
    assert_eq!(summary.errors, 0);
}

#[tokio::test]
async fn day_first_dates_are_accepted() {
    let store = MemoryStore::default();
    let line = "42420;Lorette;Loire;Central;C-1;Marie Payre;Consumer;P-100;Stapler;Office Supplies;Fasteners;O-1;08/11/2017;12/11/2017;Standard;2;12,5;0,0;3,2";
    let file = write_csv(&[line]);

    let summary = importer::run(file.path(), &store).await.unwrap();

    assert_eq!(summary.errors, 0);
    let inner = store.inner.lock().unwrap();
    assert_eq!(
        inner.orders["O-1"].order_date,
        chrono::NaiveDate::from_ymd_opt(2017, 11, 8).unwrap()
    );
}

#[tokio::test]
async fn cp1252_export_is_decoded() {
    let store = MemoryStore::default();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    file.write_all(b"42420;Li\xe8ge;Loire;Central;C-1;Marie Payre;Consumer;P-100;Stapler;Office Supplies;Fasteners;O-1;2017-11-08;2017-11-12;Standard;2;12,5;0,0;3,2\n").unwrap();
    file.flush().unwrap();

    let summary = importer::run(file.path(), &store).await.unwrap();

    assert_eq!(summary.lines_created, 1);
    let inner = store.inner.lock().unwrap();
    assert_eq!(inner.localities[&42420].city, "Liège");
}

#[tokio::test]
async fn missing_file_is_terminal() {
    let store = MemoryStore::default();
    let result = importer::run(std::path::Path::new("/nonexistent/orders.csv"), &store).await;
    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
}
