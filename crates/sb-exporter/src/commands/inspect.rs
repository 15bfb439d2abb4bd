use std::path::Path;

use comfy_table::{ContentArrangement, Table};

const TOP_TYPES: usize = 10;

pub fn run(path: &Path) -> Result<(), String> {
    let world = super::load_world(path)?;
    let header = world.header();

    println!("  Save:     {}", header.save_name);
    if !header.session_name.is_empty() {
        println!("  Session:  {}", header.session_name);
    }
    if !header.map_name.is_empty() {
        println!("  Map:      {}", header.map_name);
    }
    if let Some(saved_at) = header.save_date_time {
        println!("  Saved at: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Levels:   {}", world.document().levels.len());
    println!("  Objects:  {}", world.object_count());
    println!(
        "  Circuits: {} ({} member components)",
        world.circuits().count(),
        world.circuit_member_count()
    );

    let mut counts: Vec<_> = world.type_counts().into_iter().collect();
    if counts.is_empty() {
        return Ok(());
    }
    counts.sort_by(|(a_type, a), (b_type, b)| b.cmp(a).then_with(|| a_type.cmp(b_type)));

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Type", "Count"]);
    for (simple_type, count) in counts.iter().take(TOP_TYPES) {
        table.add_row(vec![simple_type.to_string(), count.to_string()]);
    }

    println!();
    println!("{table}");

    Ok(())
}
