use std::path::Path;

use sb_metrics::{Registry, update_power_metrics};

pub fn run(path: &Path) -> Result<(), String> {
    let world = super::load_world(path)?;
    let registry = Registry::new();
    update_power_metrics(&world, &registry);
    print!("{}", registry.render());
    Ok(())
}
