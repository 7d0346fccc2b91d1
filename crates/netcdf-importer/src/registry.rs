//! Registry of importers exposed to the nowcasting host.
//!
//! The host looks importers up by entry-point name within
//! [`IMPORTER_GROUP`] and stores them under the name with the
//! `importer_` prefix removed.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::importer::{import_pincast_netcdf, ImportOptions, ImportedField};
use crate::postprocess::{postprocess, ImportedPrecipitation};

/// Entry-point group importers are registered under
pub const IMPORTER_GROUP: &str = "pysteps.plugins.importers";

/// Prefix every importer entry-point name carries
pub const IMPORTER_PREFIX: &str = "importer_";

/// Signature shared by all importers.
pub type ImporterFn = fn(&Path, &ImportOptions) -> ImportResult<ImportedField>;

/// A registered importer.
#[derive(Clone, Copy)]
pub struct ImporterEntry {
    /// Entry-point name, e.g. `importer_pincast_netcdf`
    pub name: &'static str,
    /// Path of the function the entry point resolves to
    pub reference: &'static str,
    pub importer: ImporterFn,
}

impl fmt::Debug for ImporterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImporterEntry")
            .field("name", &self.name)
            .field("reference", &self.reference)
            .finish()
    }
}

impl ImporterEntry {
    /// Name the host files the importer under.
    pub fn short_name(&self) -> &'static str {
        self.name.strip_prefix(IMPORTER_PREFIX).unwrap_or(self.name)
    }

    /// Run the importer, then post-process its output.
    pub fn import(&self, path: &Path, options: &ImportOptions) -> ImportResult<ImportedPrecipitation> {
        debug!(importer = self.name, path = %path.display(), "Running importer");
        let field = (self.importer)(path, options)?;
        Ok(postprocess(field, &options.postprocess))
    }
}

static IMPORTERS: &[ImporterEntry] = &[ImporterEntry {
    name: "importer_pincast_netcdf",
    reference: "netcdf_importer::importer::import_pincast_netcdf",
    importer: import_pincast_netcdf,
}];

/// All importers in [`IMPORTER_GROUP`].
pub fn discover() -> &'static [ImporterEntry] {
    debug!(group = IMPORTER_GROUP, count = IMPORTERS.len(), "Discovered importers");
    IMPORTERS
}

/// Short names of the registered importers.
pub fn importer_methods() -> Vec<&'static str> {
    discover().iter().map(ImporterEntry::short_name).collect()
}

/// Look up an importer by entry-point name or short name.
pub fn find_importer(name: &str) -> ImportResult<&'static ImporterEntry> {
    discover()
        .iter()
        .find(|entry| entry.name == name || entry.short_name() == name)
        .ok_or_else(|| ImportError::UnknownImporter(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pincast_importer_registered() {
        let entries = discover();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "importer_pincast_netcdf");
        assert_eq!(
            entries[0].reference,
            "netcdf_importer::importer::import_pincast_netcdf"
        );
    }

    #[test]
    fn test_importer_methods_strip_prefix() {
        assert_eq!(importer_methods(), vec!["pincast_netcdf"]);
    }

    #[test]
    fn test_find_importer_by_either_name() {
        let full = find_importer("importer_pincast_netcdf").unwrap();
        let short = find_importer("pincast_netcdf").unwrap();
        assert_eq!(full.name, short.name);
    }

    #[test]
    fn test_find_unknown_importer() {
        let err = find_importer("importer_odim_hdf5").unwrap_err();
        assert_eq!(err.to_string(), "Unknown importer: importer_odim_hdf5");
    }
}
