use std::fs;

use anyhow::{bail, Context, Result};
use nestory::{EnergyHistory, HistoryProcessor};

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let path = match args.as_slice() {
        [path] => path,
        _ => bail!("usage: decode-history <history.json>"),
    };
    let json = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let history = EnergyHistory::from_json(&json)?;
    for report in HistoryProcessor::default().process_parallel(&history)? {
        println!("{}:", report.date);
        print!("{}", report);
        if report.skipped_events > 0 {
            println!("({} events skipped)", report.skipped_events);
        }
    }
    Ok(())
}
