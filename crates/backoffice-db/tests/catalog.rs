//! Seeding, stock-row uniqueness and grouped stock options.

use backoffice_core::{NewProduct, NewStockItem};
use backoffice_db::{Database, DbConfig, DbError, SeedOutcome};

async fn empty_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seeded_db() -> Database {
    let db = empty_db().await;
    db.seed_catalog_if_empty().await.unwrap();
    db
}

async fn product_id(db: &Database, name: &str) -> i64 {
    db.products().get_by_name(name).await.unwrap().unwrap().id
}

#[tokio::test]
async fn seeding_twice_keeps_five_products_and_fourteen_rows() {
    let db = empty_db().await;

    assert!(matches!(
        db.seed_catalog_if_empty().await.unwrap(),
        SeedOutcome::Seeded { .. }
    ));
    assert_eq!(
        db.seed_catalog_if_empty().await.unwrap(),
        SeedOutcome::AlreadySeeded
    );

    assert_eq!(db.products().count().await.unwrap(), 5);
    assert_eq!(db.stock().count().await.unwrap(), 14);
}

#[tokio::test]
async fn failed_seed_leaves_nothing_behind() {
    let db = empty_db().await;
    sqlx::query(
        r#"
        CREATE TRIGGER reject_yogurt_stock
        BEFORE INSERT ON stock_items
        WHEN NEW.product_id = (SELECT id FROM products WHERE name = 'Yogurt')
        BEGIN
            SELECT RAISE(ABORT, 'yogurt stock rejected');
        END
        "#,
    )
    .execute(db.pool())
    .await
    .unwrap();

    assert!(db.seed_catalog_if_empty().await.is_err());
    assert_eq!(db.products().count().await.unwrap(), 0);
    assert_eq!(db.stock().count().await.unwrap(), 0);

    sqlx::query("DROP TRIGGER reject_yogurt_stock")
        .execute(db.pool())
        .await
        .unwrap();

    assert_eq!(
        db.seed_catalog_if_empty().await.unwrap(),
        SeedOutcome::Seeded {
            products: 5,
            stock_items: 14,
        }
    );
    assert_eq!(db.products().count().await.unwrap(), 5);
    assert_eq!(db.stock().count().await.unwrap(), 14);
}

#[tokio::test]
async fn existing_products_block_seeding() {
    let db = empty_db().await;
    db.products()
        .create(&NewProduct {
            name: "Cheese".to_string(),
            category: "Dairy".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        db.seed_catalog_if_empty().await.unwrap(),
        SeedOutcome::AlreadySeeded
    );
    assert_eq!(db.products().count().await.unwrap(), 1);
    assert_eq!(db.stock().count().await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_sub_type_row_is_rejected() {
    let db = seeded_db().await;
    let butter = product_id(&db, "Butter").await;

    let err = db
        .stock()
        .create_stock_item(
            &NewStockItem {
                product_id: butter,
                sub_type: Some("Salted".to_string()),
                unit: None,
                unit_price: 0.0,
            },
            Some("admin"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::UniqueViolation { .. }));
    assert_eq!(db.stock().count().await.unwrap(), 14);
}

#[tokio::test]
async fn second_standard_row_is_rejected() {
    let db = seeded_db().await;
    let yogurt = product_id(&db, "Yogurt").await;

    let err = db
        .stock()
        .create_stock_item(
            &NewStockItem {
                product_id: yogurt,
                sub_type: None,
                unit: None,
                unit_price: 0.0,
            },
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::UniqueViolation { .. }));
}

#[tokio::test]
async fn new_sub_type_row_is_added_with_history() {
    let db = seeded_db().await;
    let butter = product_id(&db, "Butter").await;

    let item = db
        .stock()
        .create_stock_item(
            &NewStockItem {
                product_id: butter,
                sub_type: Some("Cultured".to_string()),
                unit: None,
                unit_price: 1400.0,
            },
            Some("admin"),
        )
        .await
        .unwrap();

    assert_eq!(item.quantity, 0.0);
    assert_eq!(item.unit, "kg");

    let history = db.stock().history(Some(butter), 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sub_type.as_deref(), Some("Cultured"));
    assert_eq!(history[0].quantity, 0.0);

    let options = db.stock().grouped_options().await.unwrap();
    assert_eq!(options["Butter"].len(), 10);
}

#[tokio::test]
async fn grouped_options_follow_catalog() {
    let db = seeded_db().await;

    let options = db.stock().grouped_options().await.unwrap();

    let products: Vec<&str> = options.keys().map(String::as_str).collect();
    assert_eq!(
        products,
        vec!["Butter", "Desi Ghee", "Vinegar", "Whipping Cream", "Yogurt"]
    );

    let butter: Vec<&str> = options["Butter"].iter().map(|o| o.label.as_str()).collect();
    assert_eq!(
        butter,
        vec![
            "Baking Butter",
            "Blend Butter",
            "Butterify",
            "Local Butter",
            "Premium Butter",
            "Salted",
            "Unsalted",
            "White Butter",
            "Yellow Butter",
        ]
    );

    let ghee: Vec<&str> = options["Desi Ghee"].iter().map(|o| o.label.as_str()).collect();
    assert_eq!(ghee, vec!["Authentic Ghee", "Blend Ghee"]);

    for product in ["Whipping Cream", "Vinegar", "Yogurt"] {
        assert_eq!(options[product].len(), 1, "{product}");
        assert_eq!(options[product][0].label, "Standard");
    }
}

#[tokio::test]
async fn standard_row_sorts_before_sub_types() {
    let db = seeded_db().await;
    let ghee = product_id(&db, "Desi Ghee").await;

    db.stock()
        .create_stock_item(
            &NewStockItem {
                product_id: ghee,
                sub_type: None,
                unit: None,
                unit_price: 0.0,
            },
            None,
        )
        .await
        .unwrap();

    let options = db.stock().grouped_options().await.unwrap();
    let labels: Vec<&str> = options["Desi Ghee"].iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Standard", "Authentic Ghee", "Blend Ghee"]);
}

#[tokio::test]
async fn grouped_options_empty_before_seeding() {
    let db = empty_db().await;
    assert!(db.stock().grouped_options().await.unwrap().is_empty());
}
