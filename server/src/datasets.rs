//! Static registry of downloadable boundary datasets.
//!
//! Each dataset declares the remote resources it is built from and a file
//! prefix that namespaces the stored copies inside the data directory. The
//! download at index `n` backs boundary level `n`.

pub const NATURAL_EARTH: &str = "NATURAL_EARTH";

#[derive(Clone, Debug)]
pub struct Download {
    pub url: String,
    pub filename: String,
    pub description: String,
}

#[derive(Clone, Debug)]
pub struct Dataset {
    pub key: String,
    pub name: String,
    pub description: String,
    pub file_prefix: String,
    pub downloads: Vec<Download>,
}

impl Dataset {
    /// Name the file is stored under inside the data directory.
    pub fn stored_filename(&self, download: &Download) -> String {
        format!("{}{}", self.file_prefix, download.filename)
    }

    pub fn level_download(&self, level: u8) -> Option<&Download> {
        self.downloads.get(level as usize)
    }
}

#[derive(Clone, Debug)]
pub struct Registry {
    datasets: Vec<Dataset>,
}

impl Registry {
    /// Registry with custom datasets, used by the tests.
    pub fn with_datasets(datasets: Vec<Dataset>) -> Self {
        Self { datasets }
    }

    pub fn get(&self, key: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.key == key)
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Boundary levels resolve against the Natural Earth dataset.
    pub fn boundary_dataset(&self) -> &Dataset {
        self.get(NATURAL_EARTH)
            .unwrap_or_else(|| &self.datasets[0])
    }
}

impl Default for Registry {
    fn default() -> Self {
        let base = "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson";

        Self {
            datasets: vec![Dataset {
                key: NATURAL_EARTH.to_string(),
                name: "Natural Earth Boundaries".to_string(),
                description: "Global country, state/province, and county boundaries \
                              from Natural Earth. Public domain data optimized for web mapping."
                    .to_string(),
                file_prefix: "naturalearth_".to_string(),
                downloads: vec![
                    Download {
                        url: format!("{base}/ne_110m_admin_0_countries.geojson"),
                        filename: "countries.json".to_string(),
                        description: "Country boundaries (110m scale)".to_string(),
                    },
                    Download {
                        url: format!("{base}/ne_50m_admin_1_states_provinces_lakes.geojson"),
                        filename: "states.json".to_string(),
                        description: "State/province boundaries (50m scale)".to_string(),
                    },
                    Download {
                        url: format!("{base}/ne_10m_admin_2_counties.geojson"),
                        filename: "counties.json".to_string(),
                        description: "County boundaries (10m scale, limited coverage)".to_string(),
                    },
                ],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_resolves_to_prefixed_filename() {
        let registry = Registry::default();
        let dataset = registry.boundary_dataset();

        let countries = dataset.level_download(0).unwrap();
        assert_eq!(dataset.stored_filename(countries), "naturalearth_countries.json");

        let counties = dataset.level_download(2).unwrap();
        assert_eq!(dataset.stored_filename(counties), "naturalearth_counties.json");

        assert!(dataset.level_download(3).is_none());
    }

    #[test]
    fn unknown_key_is_none() {
        let registry = Registry::default();
        assert!(registry.get("OPENSTREETMAP").is_none());
        assert!(registry.get(NATURAL_EARTH).is_some());
    }
}
