use promo_watch::aggregate::build_message;
use promo_watch::config::Args;
use promo_watch::persistent::SeenStore;
use promo_watch::{run_extractors, sites, Fetcher};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::load();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    // Everything that can be misconfigured fails here, before any request.
    let policy = args.policy();
    let notifier = args.notifier()?;
    let extractors = sites::extractors(&args.sites()?)?;
    let http = Fetcher::new(args.fetch_config())?;
    let seen = match &args.seen_db {
        Some(path) => Some(SeenStore::new(path).await?),
        None => None,
    };

    info!(
        "Looking for {:?} up to {}€ with at least {} bedrooms",
        policy.desired_locations(),
        policy.max_price,
        policy.min_bedrooms
    );

    let mut reports = run_extractors(&extractors, &http, &policy).await;
    if let Some(seen) = &seen {
        for report in reports.iter_mut() {
            let accepted = std::mem::take(&mut report.accepted);
            report.accepted = seen.unseen(accepted).await?;
        }
    }

    let message = build_message(&reports);
    notifier.deliver(&message).await?;

    if let Some(seen) = &seen {
        if !args.dry_run {
            for record in reports.iter().flat_map(|r| r.accepted.iter()) {
                seen.insert(record).await?;
            }
            info!("{} listings known", seen.count().await?);
        }
    }

    Ok(())
}
