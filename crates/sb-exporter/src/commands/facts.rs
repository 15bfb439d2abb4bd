use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use sb_metrics::derive_power_facts;

pub fn run(path: &Path) -> Result<(), String> {
    let world = super::load_world(path)?;
    let facts = derive_power_facts(&world);

    if facts.is_empty() {
        println!("  No power facts found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Series", "Circuit", "Building", "Type", "MW"]);

    for fact in &facts {
        table.add_row(vec![
            fact.series.to_string(),
            fact.labels.circuit.clone(),
            fact.labels.building_id.clone(),
            fact.labels.building_type.clone(),
            format!("{:.2}", fact.value_mw),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} fact{}",
        facts.len(),
        if facts.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
