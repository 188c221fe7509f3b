use super::ui;
use crate::store::{CacheGateway, CacheStats};
use anyhow::Result;
use comfy_table::Cell;

pub fn run(cache: &CacheGateway) -> Result<()> {
    match cache.stats() {
        Some(stats) => println!("{}", display_as_table(&stats)),
        None => println!(
            "{}",
            ui::style_text(
                "Local cache is unavailable, running network-only.",
                ui::StyleType::Error
            )
        ),
    }
    Ok(())
}

fn display_as_table(stats: &CacheStats) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Cache"), ui::header_cell("Value")]);

    table.add_row(vec![
        Cell::new("Currencies"),
        Cell::new(format!("{}/{}", stats.currencies, stats.currency_capacity)),
    ]);
    table.add_row(vec![
        Cell::new("Exchange rates"),
        Cell::new(format!("{}/{}", stats.rates, stats.rate_capacity)),
    ]);
    table.add_row(vec![
        Cell::new("Schema version"),
        Cell::new(stats.schema_version),
    ]);
    table.add_row(vec![
        Cell::new("Created"),
        ui::format_optional_cell(stats.created_at, |t| t.format("%Y-%m-%d %H:%M").to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Last updated"),
        ui::format_optional_cell(stats.last_updated, |t| {
            t.format("%Y-%m-%d %H:%M").to_string()
        }),
    ]);
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_table() {
        let table = display_as_table(&CacheStats {
            schema_version: 4,
            currencies: 12,
            currency_capacity: 160,
            rates: 3,
            rate_capacity: 50,
            created_at: None,
            last_updated: None,
        });

        assert!(table.contains("12/160"));
        assert!(table.contains("3/50"));
        assert!(table.contains("N/A"));
    }
}
