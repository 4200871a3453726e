pub mod align;
pub mod captions;
pub mod check;
pub mod info;
pub mod init;
pub mod plan;
pub mod render;
pub mod validate;

use std::path::Path;

use voxreel_project_model::LoadedComposition;

pub(crate) fn load_composition(path: &Path) -> anyhow::Result<LoadedComposition> {
    LoadedComposition::load(path).map_err(|e| anyhow::anyhow!("Failed to load composition: {e}"))
}
