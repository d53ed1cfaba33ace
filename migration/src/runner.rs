use colored::*;
use futures::FutureExt;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 72;

pub async fn run_all_migrations(url: &str) {
    let db = sea_orm::Database::connect(url)
        .await
        .expect("DB connection failed");

    let schema_manager = SchemaManager::new(&db);
    let migrations = <migration::Migrator as MigratorTrait>::migrations();
    println!("Applying {} migration(s)...", migrations.len());

    for m in migrations {
        apply(&schema_manager, m).await;
    }

    println!("{}", "All migrations applied".green());
}

async fn apply(schema_manager: &SchemaManager<'_>, migration: Box<dyn MigrationTrait>) {
    let label = migration.name().bold().to_string();
    let dots = ".".repeat(STATUS_COLUMN.saturating_sub(migration.name().len()));
    print!("  {label}{dots} ");
    io::stdout().flush().ok();

    let start = Instant::now();
    let outcome = std::panic::AssertUnwindSafe(migration.up(schema_manager))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {
            let elapsed = format!("({:.2?})", start.elapsed()).dimmed();
            println!("{} {elapsed}", "ok".green());
        }
        Ok(Err(e)) => {
            println!("{}", "failed".red());
            eprintln!("{e}");
            std::process::exit(1);
        }
        Err(_) => {
            println!("{}", "panicked".red());
            std::process::exit(1);
        }
    }
}
