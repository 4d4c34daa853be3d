//! Per-reach catalog of flood inundation rasters and stage selection.
//!
//! The catalog endpoint returns three parallel arrays: `files`, `flows_cms`
//! and `stages_m`. Entry `i` of `files` is the raster (or group of rasters)
//! produced for `stages_m[i]` / `flows_cms[i]`. A group may also list extra
//! stage values it is valid for, which is how one raster is shared across
//! several stages.

use serde::{Deserialize, Serialize};

use crate::error::{FimError, FimResult};

/// A single `files[i]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileEntry {
    Url(String),
    Group(Vec<GroupMember>),
}

/// A member of a grouped file entry: either a URL or a stage it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupMember {
    Url(String),
    Stage(f64),
}

impl FileEntry {
    /// URLs carried by this entry, in order.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            FileEntry::Url(url) => vec![url.as_str()],
            FileEntry::Group(members) => members
                .iter()
                .filter_map(|m| match m {
                    GroupMember::Url(url) => Some(url.as_str()),
                    GroupMember::Stage(_) => None,
                })
                .collect(),
        }
    }

    /// True when this is a group listing `stage` exactly.
    pub fn group_contains_stage(&self, stage: f64) -> bool {
        match self {
            FileEntry::Url(_) => false,
            FileEntry::Group(members) => members
                .iter()
                .any(|m| matches!(m, GroupMember::Stage(s) if *s == stage)),
        }
    }
}

/// Catalog record for one reach.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReachCatalog {
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub flows_cms: Vec<f64>,
    #[serde(default)]
    pub stages_m: Vec<f64>,
}

/// Result of resolving a stage against a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSelection {
    pub stage_m: f64,
    pub flow_cms: Option<f64>,
    pub urls: Vec<String>,
}

impl ReachCatalog {
    /// Check that the parallel arrays line up.
    ///
    /// `flows_cms` may be empty; otherwise it must match `stages_m`.
    pub fn validate(&self) -> FimResult<()> {
        if self.files.len() != self.stages_m.len() {
            return Err(FimError::InvalidCatalog(format!(
                "{} files for {} stages",
                self.files.len(),
                self.stages_m.len()
            )));
        }
        if !self.flows_cms.is_empty() && self.flows_cms.len() != self.stages_m.len() {
            return Err(FimError::InvalidCatalog(format!(
                "{} flows for {} stages",
                self.flows_cms.len(),
                self.stages_m.len()
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.stages_m.is_empty()
    }

    /// Index of the stage equal to `stage`. Matching is exact, there is no
    /// nearest-stage fallback.
    pub fn stage_index(&self, stage: f64) -> Option<usize> {
        self.stages_m.iter().position(|s| *s == stage)
    }

    /// URLs of every raster that applies to `stage`.
    ///
    /// Collects `files[i]` for the matching index plus any grouped entry that
    /// lists `stage`, in catalog order and without duplicates. An unknown
    /// stage yields an empty list.
    pub fn select_stage_files(&self, stage: f64) -> Vec<String> {
        let Some(index) = self.stage_index(stage) else {
            return Vec::new();
        };

        let mut urls: Vec<String> = Vec::new();
        for (i, entry) in self.files.iter().enumerate() {
            if i != index && !entry.group_contains_stage(stage) {
                continue;
            }
            for url in entry.urls() {
                if !urls.iter().any(|u| u == url) {
                    urls.push(url.to_string());
                }
            }
        }
        urls
    }

    /// Like [`select_stage_files`](Self::select_stage_files) but also reports
    /// the matched flow. `None` when the stage is not cataloged.
    pub fn select_stage(&self, stage: f64) -> Option<StageSelection> {
        let index = self.stage_index(stage)?;
        Some(StageSelection {
            stage_m: stage,
            flow_cms: self.flows_cms.get(index).copied(),
            urls: self.select_stage_files(stage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(json: &str) -> ReachCatalog {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_select_exact_stage() {
        let c = catalog(r#"{"files":["a.tif","b.tif"],"flows_cms":[10,20],"stages_m":[1,2]}"#);
        assert_eq!(c.select_stage_files(2.0), vec!["b.tif".to_string()]);
    }

    #[test]
    fn test_unknown_stage_is_empty() {
        let c = catalog(r#"{"files":["a.tif","b.tif"],"flows_cms":[10,20],"stages_m":[1,2]}"#);
        assert!(c.select_stage_files(1.5).is_empty());
        assert!(c.select_stage(1.5).is_none());
    }

    #[test]
    fn test_group_shared_across_stages() {
        let c = catalog(
            r#"{"files":["a.tif",["shared.tif", 1, 3],"c.tif"],
                "flows_cms":[5,6,7],"stages_m":[1,2,3]}"#,
        );
        assert_eq!(
            c.select_stage_files(3.0),
            vec!["shared.tif".to_string(), "c.tif".to_string()]
        );
        assert_eq!(
            c.select_stage_files(1.0),
            vec!["a.tif".to_string(), "shared.tif".to_string()]
        );
    }

    #[test]
    fn test_validate_mismatched_lengths() {
        let c = catalog(r#"{"files":["a.tif"],"flows_cms":[],"stages_m":[1,2]}"#);
        assert!(matches!(c.validate(), Err(FimError::InvalidCatalog(_))));
    }
}
