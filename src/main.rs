use std::path::Path;

use tracing::{info, warn};

use tickoo::config::load_runner_config;
use tickoo::logging::init_logging;
use tickoo::session::AnalyticsSession;

fn main() {
    if let Err(e) = run() {
        eprintln!("tickoo failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_runner_config("config.toml")?;
    init_logging(&config.logging)?;
    info!("🎟️ Tickoo analytics pipeline starting");

    let bytes = std::fs::read(&config.application.csv_path)?;
    let mut session = AnalyticsSession::new(config.pipeline.clone());
    session.set_event_params(config.application.event_params());

    let summary = session.load_csv(&bytes)?;
    info!(
        "📥 {} rows read, {} after validity filter, {} after outlier filter",
        summary.rows_read, summary.rows_after_validity, summary.rows_after_outliers
    );
    if !summary.has_zone {
        warn!("Zone column not found; zone breakdowns will be empty");
    }

    let view = session.recompute(&config.filter)?;
    info!("🎫 Total tickets sold: {}", view.kpis.total_tickets);
    if let Some(average) = view.kpis.average_price {
        info!("💰 Average ticket price: ${:.2}", average);
    }
    if let Some(highest) = view.kpis.max_price {
        info!("🏆 Highest ticket price: ${:.2}", highest);
    }
    if let Some(peak) = &view.peak_day {
        info!("📈 Peak day: {} ({} tickets)", peak.date, peak.tickets);
    }
    if let Some(split) = &view.sale_phase {
        info!(
            "🎟️ Presale sold: {}, general sale sold: {}",
            split.presale_sold, split.general_sale_sold
        );
    }
    if let Some(pct) = view.sell_through_pct {
        info!("📊 Sell-through: {:.1}%", pct);
    }
    for signal in &view.signals {
        info!("🚨 Signal: {}", signal);
    }

    if let Some(dir) = &config.application.export_dir {
        let base = config
            .application
            .export_basename
            .as_deref()
            .unwrap_or("filtered_tickets");
        let path = session.export_filtered(&config.filter, Path::new(dir), base)?;
        info!("💾 Filtered export written to {}", path.display());
    }

    Ok(())
}
