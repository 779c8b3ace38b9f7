use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;

/// Create the demo database file and its tables, seeding them once
pub async fn setup(path: &Path) -> Result<(), sqlx::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut connection = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await?;

    // Primary key assigned by the database
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE,
            "signed up" DATE,
            active BOOLEAN DEFAULT 1
        )
        "#,
    )
    .execute(&mut connection)
    .await?;

    // Composite natural key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stock (
            warehouse TEXT NOT NULL,
            sku TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0,
            price REAL,
            PRIMARY KEY (warehouse, sku)
        )
        "#,
    )
    .execute(&mut connection)
    .await?;

    // No primary key at all: rows are identified by their values
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tickets (
            subject TEXT,
            status TEXT DEFAULT 'open',
            priority INTEGER,
            "2nd reviewer" TEXT
        )
        "#,
    )
    .execute(&mut connection)
    .await?;

    seed_sample_data(&mut connection).await?;

    connection.close().await
}

async fn seed_sample_data(connection: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let customer_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
        .fetch_one(&mut *connection)
        .await?;

    if customer_count.0 > 0 {
        // Data already seeded
        return Ok(());
    }

    let first_names = ["Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Frances", "Ken"];
    let last_names = ["Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Allen", "Thompson"];

    for index in 0..40 {
        let first = first_names[index % first_names.len()];
        let last = last_names[(index / first_names.len()) % last_names.len()];
        let email = format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), index);
        let signed_up = format!("2024-{:02}-{:02}", index % 12 + 1, index % 28 + 1);

        sqlx::query(
            r#"INSERT INTO customers (name, email, "signed up", active) VALUES (?, ?, ?, ?)"#,
        )
        .bind(format!("{} {}", first, last))
        .bind(email)
        .bind(signed_up)
        .bind(index % 5 != 0)
        .execute(&mut *connection)
        .await?;
    }

    let warehouses = ["north", "south", "east"];
    let products = ["bolt", "nut", "washer", "gear", "spring", "bearing"];

    for (warehouse_index, warehouse) in warehouses.iter().enumerate() {
        for (product_index, product) in products.iter().enumerate() {
            let quantity = (warehouse_index * 37 + product_index * 11) % 100;
            let price = 0.25 + product_index as f64 * 1.75;

            sqlx::query("INSERT INTO stock (warehouse, sku, quantity, price) VALUES (?, ?, ?, ?)")
                .bind(*warehouse)
                .bind(format!("{}-{:03}", product, product_index + 1))
                .bind(quantity as i64)
                .bind(price)
                .execute(&mut *connection)
                .await?;
        }
    }

    let statuses = ["open", "open", "closed", "waiting"];
    let subjects = ["Login fails", "Slow export", "Typo on invoice", "Crash on save"];

    for index in 0..24 {
        sqlx::query(
            r#"INSERT INTO tickets (subject, status, priority, "2nd reviewer") VALUES (?, ?, ?, ?)"#,
        )
        .bind(subjects[index % subjects.len()])
        .bind(statuses[index % statuses.len()])
        .bind((index % 3 + 1) as i64)
        .bind(if index % 2 == 0 { Some("Grace") } else { None })
        .execute(&mut *connection)
        .await?;
    }

    tracing::info!("Sample data seeded: 40 customers, 18 stock rows, 24 tickets");
    Ok(())
}
