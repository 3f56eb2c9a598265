//! JSON files in and out.
//!
//! Network: `{"nodes": [{"id": .., "attrs": {..}}], "edges": [{"a": .., "b": .., "attrs": {..}}]}`.
//! Regions: `[{"key": .., "geometry": {"type": "Polygon", "exterior": [[x, y], ..], "holes": []}}]`.
//! Boundary: a single geometry object.

use anyhow::{Context, Result};
use geojitter::geom::Geometry;
use geojitter::region::{RegionKey, RegionSet};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize)]
pub struct RegionEntry {
    pub key: RegionKey,
    pub geometry: Geometry,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Pretty-print `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}

pub fn load_regions(path: &Path) -> Result<RegionSet> {
    let entries: Vec<RegionEntry> = read_json(path)?;
    Ok(entries.into_iter().map(|e| (e.key, e.geometry)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojitter::geom::Coord;
    use geojitter::network::{Network, NodeId};
    use tempfile::tempdir;

    #[test]
    fn network_file_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/net.json");
        let mut net = Network::new();
        net.add_node_at(1i64, 0.5, 0.25);
        net.add_node_at("depot", 2.0, 3.0);
        net.add_edge(1i64, "depot", Default::default()).unwrap();
        write_json(&path, &net).unwrap();
        let back: Network = read_json(&path).unwrap();
        assert_eq!(back, net);
        assert!(back.has_edge(&NodeId::from("depot"), &NodeId::Int(1)));
    }

    #[test]
    fn edges_to_unknown_nodes_fail_to_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"nodes":[{"id":1,"attrs":{"x":0.0,"y":0.0}}],"edges":[{"a":1,"b":2}]}"#,
        )
        .unwrap();
        assert!(read_json::<Network>(&path).is_err());
    }

    #[test]
    fn regions_load_in_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("regions.json");
        fs::write(
            &path,
            r#"[
                {"key": "east", "geometry": {"type": "Polygon",
                    "exterior": [[1,0],[2,0],[2,1],[1,1]]}},
                {"key": 0, "geometry": {"type": "Polygon",
                    "exterior": [[0,0],[1,0],[1,1],[0,1]], "holes": []}}
            ]"#,
        )
        .unwrap();
        let regions = load_regions(&path).unwrap();
        let keys: Vec<String> = regions.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["east", "#0"]);
        assert_eq!(
            regions.first_containing(Coord::new(1.5, 0.5)),
            Some(&RegionKey::Name("east".into()))
        );
    }
}
