use crate::host::ExportSettings;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub metadata_file_name: String,
    /// Up-axis tag the runtime reads from the metadata.
    pub coordinate_system: String,
    pub settings: ExportSettings,
}

impl ExportConfig {
    pub fn bundle_extension(&self) -> &'static str {
        self.settings.format.extension()
    }

    /// File name of the bundle produced for the group rooted at `root`.
    pub fn bundle_file_name(&self, root: &str) -> String {
        format!("{}.{}", root, self.bundle_extension())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            metadata_file_name: "metadata.json".to_string(),
            coordinate_system: "Y_UP".to_string(),
            settings: ExportSettings::bundle(),
        }
    }
}
