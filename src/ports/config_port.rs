//! Configuration access port trait.

use std::path::PathBuf;

/// Read-only access to sectioned key/value settings.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// A filesystem path setting. Adapters that know where the settings came
    /// from may resolve relative values against that location.
    fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_string(section, key).map(PathBuf::from)
    }
}
