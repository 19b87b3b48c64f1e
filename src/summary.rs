//! Tree summary and mutation JSON inputs.

use crate::error::SummaryError;
use crate::selector::ShapeIndices;
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Summary of every sampled tree, keyed by tree index
#[derive(Debug, Clone, Deserialize)]
pub struct TreeSummary {
    pub trees: HashMap<String, Tree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub linearity_index: f64,
    pub branching_index: f64,
    #[serde(default)]
    pub populations: HashMap<String, Population>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Population {
    #[serde(default)]
    pub cellular_prevalence: Vec<f64>,
    #[serde(default)]
    pub num_ssms: u64,
    #[serde(default)]
    pub num_cnvs: u64,
}

/// Simple somatic mutations with per-sample read counts
#[derive(Debug, Clone, Deserialize)]
pub struct Mutations {
    pub ssms: HashMap<String, Ssm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ssm {
    pub ref_reads: Vec<u64>,
    pub total_reads: Vec<u64>,
}

impl TreeSummary {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SummaryError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, SummaryError> {
        info!("Loading tree summary from {:?}...", path);
        let file = File::open(path)?;
        let summary = Self::from_reader(BufReader::new(file))?;
        info!("Found {} trees", summary.trees.len());
        Ok(summary)
    }

    /// Trees in ascending numeric order of their keys.
    pub fn ordered_trees(&self) -> Result<Vec<(u64, &Tree)>, SummaryError> {
        let mut trees = self
            .trees
            .iter()
            .map(|(key, tree)| {
                key.trim()
                    .parse::<u64>()
                    .map(|idx| (idx, tree))
                    .map_err(|_| SummaryError::InvalidTreeKey(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        trees.sort_by_key(|(idx, _)| *idx);
        Ok(trees)
    }
}

impl Tree {
    pub fn shape(&self) -> ShapeIndices {
        ShapeIndices::new(self.linearity_index, self.branching_index)
    }

    /// Populations ordered by key: numeric keys ascending, then any others.
    pub fn ordered_populations(&self) -> Vec<&Population> {
        let mut keyed: Vec<(&String, &Population)> = self.populations.iter().collect();
        keyed.sort_by(|(a, _), (b, _)| {
            match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            }
        });
        keyed.into_iter().map(|(_, pop)| pop).collect()
    }
}

impl Population {
    pub fn mean_cellular_prevalence(&self) -> f64 {
        if self.cellular_prevalence.is_empty() {
            return 0.0;
        }
        self.cellular_prevalence.iter().sum::<f64>() / self.cellular_prevalence.len() as f64
    }
}

impl Mutations {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SummaryError> {
        let muts: Mutations = serde_json::from_reader(reader)?;
        for (id, ssm) in &muts.ssms {
            if ssm.ref_reads.len() != ssm.total_reads.len() {
                return Err(SummaryError::ReadCountMismatch {
                    id: id.clone(),
                    ref_len: ssm.ref_reads.len(),
                    total_len: ssm.total_reads.len(),
                });
            }
        }
        Ok(muts)
    }

    pub fn from_path(path: &Path) -> Result<Self, SummaryError> {
        info!("Loading mutations from {:?}...", path);
        let file = File::open(path)?;
        let muts = Self::from_reader(BufReader::new(file))?;
        info!("Found {} SSMs", muts.ssms.len());
        Ok(muts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{
        "params": {"ignored": true},
        "trees": {
            "10": {"linearity_index": 0.1, "branching_index": 0.6, "populations": {}},
            "2": {
                "linearity_index": 0.5,
                "branching_index": 0.2,
                "populations": {
                    "1": {"cellular_prevalence": [0.4, 0.6], "num_ssms": 12, "num_cnvs": 0},
                    "0": {"cellular_prevalence": [1.0, 1.0], "num_ssms": 0, "num_cnvs": 0}
                }
            },
            "0": {"linearity_index": 0.9, "branching_index": 0.0}
        }
    }"#;

    #[test]
    fn test_trees_in_numeric_order() {
        let summary = TreeSummary::from_reader(SUMMARY.as_bytes()).unwrap();
        let ids: Vec<u64> = summary.ordered_trees().unwrap().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 2, 10]);
    }

    #[test]
    fn test_populations_and_means() {
        let summary = TreeSummary::from_reader(SUMMARY.as_bytes()).unwrap();
        let tree = &summary.trees["2"];
        assert_eq!(tree.shape(), ShapeIndices::new(0.5, 0.2));

        let pops = tree.ordered_populations();
        assert_eq!(pops.len(), 2);
        assert_eq!(pops[0].mean_cellular_prevalence(), 1.0);
        assert!((pops[1].mean_cellular_prevalence() - 0.5).abs() < 1e-12);
        assert_eq!(pops[1].num_ssms, 12);

        assert!(summary.trees["0"].populations.is_empty());
    }

    #[test]
    fn test_invalid_tree_key() {
        let json = r#"{"trees": {"first": {"linearity_index": 0.1, "branching_index": 0.1}}}"#;
        let summary = TreeSummary::from_reader(json.as_bytes()).unwrap();
        match summary.ordered_trees() {
            Err(SummaryError::InvalidTreeKey(key)) => assert_eq!(key, "first"),
            other => panic!("expected InvalidTreeKey, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_mutations_read_mismatch() {
        let json = r#"{"ssms": {"s0": {"ref_reads": [1, 2], "total_reads": [10]}}}"#;
        let err = Mutations::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, SummaryError::ReadCountMismatch { ref_len: 2, total_len: 1, .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = TreeSummary::from_reader("{\"trees\": ".as_bytes()).unwrap_err();
        assert!(matches!(err, SummaryError::Json(_)));
    }
}
