use anyhow::{Context, Result};
use nestory::{report_lines, Credentials, EnergyHistory, HistoryProcessor, SnapshotCache};

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    let cache = SnapshotCache::from_env();
    let today = SnapshotCache::today();

    let raw = match cache.load(today)? {
        Some(raw) => raw,
        None => {
            let mut client = nestory::Client::new()?;
            client
                .login(&Credentials::from_env()?)
                .await
                .with_context(|| "initial login failed")?;
            client.fetch_energy_history().await?
        }
    };

    let history = EnergyHistory::from_value(raw.clone())?;
    let reports = HistoryProcessor::default().process(&history)?;
    for line in report_lines(&reports) {
        println!("{}", line);
    }

    cache.save(today, &raw)?;

    println!("Done!");
    Ok(())
}
