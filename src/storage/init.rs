//! First-run setup of the data directory

use crate::config::paths::TallyPaths;
use crate::error::TallyError;

use super::file_io::write_json_atomic;

/// Create the directory layout and empty data files that do not exist yet
///
/// Existing files are left untouched, so running this twice is harmless.
pub fn initialize_storage(paths: &TallyPaths) -> Result<(), TallyError> {
    paths.ensure_directories()?;

    let empty = [
        (paths.expenses_file(), "expenses"),
        (paths.limits_file(), "limits"),
        (paths.groups_file(), "groups"),
        (paths.rules_file(), "rules"),
    ];

    for (path, key) in empty {
        if !path.exists() {
            write_json_atomic(&path, &serde_json::json!({ key: [] }))?;
        }
    }

    Ok(())
}
