//! Regions registry: the map areas that carry flowline and FIM layers.

use std::path::Path;

use fim_common::{FimError, FimResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REST_ROOT: &str = "https://arcgis.cuahsi.org/arcgis/rest/services/CIROH-ComRes";

/// One selectable region and its ArcGIS service layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Service folder name, e.g. `RoaringRiver`.
    pub name: String,
    pub title: String,
    /// FeatureServer layer holding the reach flowlines.
    pub flowlines_layer: u32,
    /// MapServer layer hidden while a region is displayed.
    pub erase_layer: u32,
    pub default_zoom: u8,
}

impl Region {
    fn new(name: &str, title: &str, flowlines_layer: u32, erase_layer: u32, default_zoom: u8) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            flowlines_layer,
            erase_layer,
            default_zoom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionsConfig {
    #[serde(default = "default_rest_root")]
    pub rest_root: String,
    pub regions: Vec<Region>,
}

fn default_rest_root() -> String {
    DEFAULT_REST_ROOT.to_string()
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            rest_root: default_rest_root(),
            regions: vec![
                Region::new("RoaringRiver", "Roaring River State Park", 13, 4, 11),
                Region::new("DeSoto", "DeSoto", 0, 3, 11),
                Region::new("SpringfieldGreeneCounty", "Springfield Greene County", 1, 2, 10),
                Region::new("MountAscutney", "Mount Ascutney", 0, 1, 10),
                Region::new("TwoRiversOttauquechee", "Two Rivers Ottauquechee", 0, 3, 10),
                Region::new("Windham", "Windham", 0, 3, 10),
            ],
        }
    }
}

impl RegionsConfig {
    pub fn from_yaml_str(yaml: &str) -> FimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| FimError::Config(format!("Invalid regions YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> FimResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            FimError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Names must be unique and non-empty.
    pub fn validate(&self) -> FimResult<()> {
        for (i, region) in self.regions.iter().enumerate() {
            if region.name.trim().is_empty() {
                return Err(FimError::Config(format!("region {} has no name", i)));
            }
            if self.regions[..i].iter().any(|r| r.name == region.name) {
                return Err(FimError::Config(format!(
                    "duplicate region '{}'",
                    region.name
                )));
            }
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    fn root(&self) -> &str {
        self.rest_root.trim_end_matches('/')
    }

    pub fn map_server_url(&self, region: &Region) -> String {
        format!("{}/{}/MapServer", self.root(), region.name)
    }

    /// Layer listing queried to build the WMS overlays.
    pub fn map_server_layers_url(&self, region: &Region) -> String {
        format!("{}/layers?f=json", self.map_server_url(region))
    }

    pub fn flowlines_url(&self, region: &Region) -> String {
        format!(
            "{}/{}/FeatureServer/{}",
            self.root(),
            region.name,
            region.flowlines_layer
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_regions() {
        let config = RegionsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.regions.len(), 6);

        let roaring = config.find("RoaringRiver").unwrap();
        assert_eq!(roaring.flowlines_layer, 13);
        assert_eq!(roaring.erase_layer, 4);
        assert_eq!(roaring.default_zoom, 11);
        assert!(config.find("Atlantis").is_none());
    }

    #[test]
    fn test_service_urls() {
        let config = RegionsConfig::default();
        let region = config.find("SpringfieldGreeneCounty").unwrap();
        assert_eq!(
            config.flowlines_url(region),
            "https://arcgis.cuahsi.org/arcgis/rest/services/CIROH-ComRes/SpringfieldGreeneCounty/FeatureServer/1"
        );
        assert_eq!(
            config.map_server_layers_url(region),
            "https://arcgis.cuahsi.org/arcgis/rest/services/CIROH-ComRes/SpringfieldGreeneCounty/MapServer/layers?f=json"
        );
    }

    #[test]
    fn test_yaml_with_default_root() {
        let yaml = r#"
regions:
  - name: Windham
    title: Windham
    flowlines_layer: 0
    erase_layer: 3
    default_zoom: 10
"#;
        let config = RegionsConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.rest_root, DEFAULT_REST_ROOT);
        assert_eq!(config.regions[0].erase_layer, 3);
    }

    #[test]
    fn test_yaml_duplicate_rejected() {
        let yaml = r#"
rest_root: https://gis.example.org/rest/
regions:
  - { name: A, title: A, flowlines_layer: 0, erase_layer: 1, default_zoom: 10 }
  - { name: A, title: B, flowlines_layer: 0, erase_layer: 1, default_zoom: 10 }
"#;
        assert!(matches!(
            RegionsConfig::from_yaml_str(yaml),
            Err(FimError::Config(_))
        ));
    }
}
