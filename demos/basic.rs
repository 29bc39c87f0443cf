use sqlx::{Connection, SqliteConnection};
use sqlx_transaction_scope::{with_transaction, Error, TransactionPolicy, TransactionalResource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let conn = SqliteConnection::connect(&database_url).await?;
    let mut resource = TransactionalResource::new(conn);

    sqlx::query("CREATE TABLE IF NOT EXISTS todo (id INTEGER PRIMARY KEY, todo TEXT NOT NULL)")
        .execute(resource.connection())
        .await?;

    println!("=== Basic Transaction Scope Example ===\n");

    // Example 1: a Required scope commits on success
    println!("1. Inserting a todo under a Required scope...");
    with_transaction(&mut resource, TransactionPolicy::Required, |res| {
        Box::pin(async move {
            sqlx::query("INSERT INTO todo (id, todo) VALUES (?, ?)")
                .bind(999)
                .bind("write the weekly report")
                .execute(res.connection())
                .await?;
            Ok::<_, Error>(())
        })
    })
    .await?;
    println!("   ✓ Committed\n");

    // Example 2: a failing unit of work rolls the scope back
    println!("2. Failing work rolls the insert back...");
    let result = with_transaction(&mut resource, TransactionPolicy::Required, |res| {
        Box::pin(async move {
            sqlx::query("INSERT INTO todo (id, todo) VALUES (?, ?)")
                .bind(1000)
                .bind("never persisted")
                .execute(res.connection())
                .await?;

            // This will cause a rollback
            sqlx::query("SELECT * FROM non_existent_table")
                .execute(res.connection())
                .await?;

            Ok::<_, Error>(())
        })
    })
    .await;

    match result {
        Ok(_) => println!("   ✗ Should have failed!"),
        Err(e) => println!("   ✓ Rolled back: {e}\n"),
    }

    // Example 3: returning values from a scope
    println!("3. Returning values from a scope...");
    let count: i64 = with_transaction(&mut resource, TransactionPolicy::Required, |res| {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todo")
                .fetch_one(res.connection())
                .await?;
            Ok::<_, Error>(count)
        })
    })
    .await?;
    println!("   Todos in table: {count} (the failed insert is gone)\n");

    println!("=== All examples completed successfully ===");
    println!("Final depth: {}", resource.depth());

    Ok(())
}
