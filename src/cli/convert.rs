use super::ui::{self, ConsolePresenter};
use crate::core::conversion::ConversionRequest;
use crate::resolver::{RateResolver, RateSource};
use anyhow::Result;
use tracing::debug;

const PROGRESS_MESSAGE: &str = "conversion in progress, please wait...";

pub async fn run(resolver: &RateResolver, amount: &str, from: &str, to: &str) -> Result<()> {
    // Invalid input never reaches the network or the cache
    let request = ConversionRequest::parse(amount, from, to)?;

    let presenter = ConsolePresenter::new(PROGRESS_MESSAGE);
    let resolution = resolver.resolve(&request, &presenter).await;
    presenter.finish();
    debug!(?resolution, "Conversion resolved");

    if resolution.source == RateSource::Cache {
        println!(
            "{}",
            ui::style_text(
                "Network unavailable, showing the last cached rate.",
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}
