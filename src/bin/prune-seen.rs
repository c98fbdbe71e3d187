use clap::Parser;
use promo_watch::persistent::SeenStore;
use std::path::PathBuf;

/// Forgets listings notified more than `days` days ago so they can be
/// reported again.
#[derive(Debug, Parser)]
#[command(name = "prune-seen")]
struct Args {
    #[arg(long, env = "PROMO_SEEN_DB")]
    db: PathBuf,

    #[arg(long, default_value_t = 90)]
    days: u32,
}

async fn prune_seen(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let store = SeenStore::new(&args.db).await?;
    let deleted = store.prune_older_than(args.days).await?;
    println!("Deleted {}, {} left", deleted, store.count().await?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    prune_seen(Args::parse()).await
}
