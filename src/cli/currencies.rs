use super::ui::{self, ConsolePresenter};
use crate::core::currency::CurrencyRecord;
use crate::sync::{CurrencyListSynchronizer, ListSource};
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(synchronizer: &CurrencyListSynchronizer) -> Result<()> {
    let presenter = ConsolePresenter::new("Fetching currencies...");
    let list = synchronizer.synchronize(&presenter).await;
    presenter.finish();

    // The presenter has already rendered the list
    let source = match list.source {
        ListSource::Network => "network",
        ListSource::Cache => "local cache",
        ListSource::Unavailable => return Ok(()),
    };
    println!(
        "{}",
        ui::style_text(
            &format!("{} currencies from {source}", list.currencies.len()),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

pub(crate) fn display_as_table(currencies: &[CurrencyRecord]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Id"), ui::header_cell("Currency")]);

    for currency in currencies {
        table.add_row(vec![Cell::new(&currency.id), Cell::new(currency.label())]);
    }
    table.to_string()
}
