mod bootstrap;
mod render;

use anyhow::{Context, Result};
use dl_core::settings::Settings;
use dl_data::aggregator::GroupingPolicy;
use dl_runtime::data_manager::{DatasetManager, DEFAULT_CACHE_TTL_SECS};
use dl_runtime::pages::{build_page, Page, PageOptions};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Bank DL dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Page: {}, Format: {}, Baseline: {}",
        settings.page,
        settings.format,
        settings.baseline
    );

    let data_path = settings
        .data
        .clone()
        .or_else(bootstrap::discover_data_path)
        .context("no data found: pass --data, or place Schema.csv in the working directory or files under ~/.bank-dl/data/")?;

    let policy = if settings.strict_grouping {
        GroupingPolicy::Strict
    } else {
        GroupingPolicy::FirstWins
    };

    let page: Page = settings.page.parse()?;
    let options = PageOptions::from_settings(&settings)?;

    let mut manager = DatasetManager::new(DEFAULT_CACHE_TTL_SECS, data_path, policy);
    let dataset = manager
        .get_dataset(false)
        .with_context(|| format!("loading {}", manager.data_path().display()))?;

    let report = build_page(page, &dataset, &options)?;

    match settings.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{json}");
        }
        _ => print!("{}", render::render_page(&report)),
    }

    Ok(())
}
