use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use deal_scout::config::Config;
use deal_scout::deal_scout::DealScout;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting deal-scout");

    let config = Config::from_env()?;
    let scout = DealScout::new(config).await?;

    // Run once immediately
    if let Err(e) = scout.check_for_deals().await {
        error!("Error during initial check: {}", e);
    }

    // Set up scheduler to run every 30 minutes
    let sched = JobScheduler::new().await?;

    let job_scout = scout.clone();
    sched
        .add(Job::new_async("0 */30 * * * *", move |_uuid, _l| {
            let scout = job_scout.clone();
            Box::pin(async move {
                if let Err(e) = scout.check_for_deals().await {
                    error!("Error checking for deals: {}", e);
                }
            })
        })?)
        .await?;

    info!("Scheduler started - checking every 30 minutes");
    sched.start().await?;

    // Keep the program running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    }
}
