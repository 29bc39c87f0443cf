use sqlx::{Connection, SqliteConnection};
use sqlx_transaction_scope::{
    Error, TransactionPolicy, TransactionScope, TransactionalResource,
};

async fn todo_text(
    resource: &mut TransactionalResource<SqliteConnection>,
    id: i64,
) -> Result<Option<String>, Error> {
    let text = sqlx::query_scalar("SELECT todo FROM todo WHERE id = ?")
        .bind(id)
        .fetch_optional(resource.connection())
        .await?;
    Ok(text)
}

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

    println!("=== Nested Transaction Scope Example ===\n");

    // Example 1: RequiresNew gives the nested scope its own boundary.
    // A failure inside it rolls back to the savepoint only.
    println!("1. RequiresNew: nested failure keeps the outer write...");
    TransactionScope::new(&mut resource, TransactionPolicy::RequiresNew)
        .run_into(|res| {
            Box::pin(async move {
                sqlx::query("INSERT INTO todo (id, todo) VALUES (999, 'book flights')")
                    .execute(res.connection())
                    .await?;
                println!("   Outer: inserted todo 999 (depth {})", res.depth());

                let nested = TransactionScope::new(res, TransactionPolicy::RequiresNew)
                    .run_into(|res| {
                        Box::pin(async move {
                            sqlx::query("INSERT INTO todo (id, todo) VALUES (888, 'doomed')")
                                .execute(res.connection())
                                .await?;
                            println!("   Nested: inserted todo 888 (depth {})", res.depth());

                            // This will cause a rollback to the savepoint
                            sqlx::query("SELECT * FROM non_existent_table")
                                .execute(res.connection())
                                .await?;
                            Ok::<_, Error>(())
                        })
                    })
                    .await;

                match nested {
                    Ok(_) => println!("   ✗ Nested should have failed!"),
                    Err(e) => println!("   Nested: failed ({e})"),
                }

                println!(
                    "   Outer: todo 999 still here: {:?}",
                    todo_text(res, 999).await?
                );
                println!(
                    "   Outer: todo 888 rolled back: {:?}",
                    todo_text(res, 888).await?
                );
                Ok::<_, Error>(())
            })
        })
        .await?;
    println!("   ✓ Outer scope committed\n");

    // Example 2: Required joins the ambient transaction. A joined scope
    // resolves nothing, so a caught failure rolls back nothing at all.
    println!("2. Required: joined scope failure rolls back nothing...");
    TransactionScope::new(&mut resource, TransactionPolicy::Required)
        .run_into(|res| {
            Box::pin(async move {
                sqlx::query("INSERT INTO todo (id, todo) VALUES (1, 'outer write')")
                    .execute(res.connection())
                    .await?;

                let joined = TransactionScope::new(res, TransactionPolicy::Required)
                    .run_into(|res| {
                        Box::pin(async move {
                            sqlx::query("INSERT INTO todo (id, todo) VALUES (2, 'joined write')")
                                .execute(res.connection())
                                .await?;

                            sqlx::query("SELECT * FROM non_existent_table")
                                .execute(res.connection())
                                .await?;
                            Ok::<_, Error>(())
                        })
                    })
                    .await;

                match joined {
                    Ok(_) => println!("   ✗ Joined scope should have failed!"),
                    Err(e) => println!("   Joined: failed ({e})"),
                }

                // Both writes are still in place: the joined scope owned no
                // boundary and performed no rollback.
                println!(
                    "   Outer: todo 1 present: {}, todo 2 present: {}",
                    todo_text(res, 1).await?.is_some(),
                    todo_text(res, 2).await?.is_some()
                );
                Ok::<_, Error>(())
            })
        })
        .await?;
    println!("   ✓ Outer scope committed, both writes persisted\n");

    println!("=== All nested scope examples completed ===");
    println!("Final depth: {}", resource.depth());

    Ok(())
}
