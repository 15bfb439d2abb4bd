pub mod facts;
pub mod inspect;
pub mod metrics;
pub mod serve;

use std::path::Path;

use sb_core::World;

/// Load and index a converted save document.
fn load_world(path: &Path) -> Result<World, String> {
    World::load(path).map_err(|e| e.to_string())
}
