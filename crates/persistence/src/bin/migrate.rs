#![deny(warnings)]

use persistence::{default_sqlite_url, ensure_db_dir, init_db, list_slots};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    ensure_db_dir(&url)?;
    let pool = init_db(&url).await?;
    let slots = list_slots(&pool).await?;
    println!("DB migrated at {} ({} save slots)", url, slots.len());
    for slot in slots {
        println!(
            "  {} day={} schema={} updated={}",
            slot.slot, slot.day, slot.schema_version, slot.updated_at
        );
    }
    Ok(())
}
