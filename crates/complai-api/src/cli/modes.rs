//! `complai modes`: show the retrieval-mode catalogue.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use complai_core::mode::ModeSelector;
use complai_types::mode::MODE_CATALOGUE;

use crate::state::AppState;

pub fn list_modes(state: &AppState, json: bool) -> Result<()> {
    let active = state.modes.retrieval_mode().to_string();

    if json {
        let entries: Vec<_> = MODE_CATALOGUE
            .iter()
            .map(|option| {
                serde_json::json!({
                    "label": option.label,
                    "value": option.value,
                    "group": option.group.to_string(),
                    "active": option.value == active,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Group").fg(Color::White),
        Cell::new("Label").fg(Color::White),
        Cell::new("Value").fg(Color::White),
        Cell::new("").fg(Color::White),
    ]);

    for option in MODE_CATALOGUE {
        let marker = if option.value == active { "default" } else { "" };
        table.add_row(vec![
            Cell::new(option.group),
            Cell::new(option.label),
            Cell::new(option.value).fg(Color::Cyan),
            Cell::new(marker).fg(Color::Green),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {}",
        style("Any '<type>/<mode>' value is accepted; these are the common ones.").dim()
    );
    println!();
    Ok(())
}
