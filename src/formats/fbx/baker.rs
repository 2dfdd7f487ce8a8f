//! Per-file orchestration: discovers model and geometry nodes, maps them
//! through the connections table, and drives the bake over each mesh.

use std::collections::BTreeMap;

use crate::error::Error;

use super::{
    geometry, number,
    text::{self, Block},
    transform::{self, NodeTransforms},
};

/// A model node of the Objects section. `properties` is the line range of
/// its property block; a model without one carries no bakeable transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModelEntry {
    name: String,
    properties: Option<(usize, usize)>,
}

/// Bakes every mesh of one file buffer and returns how many meshes changed.
/// Meshes connected to models whose transforms are already neutral are left
/// byte-identical.
pub fn bake_buffer(lines: &mut Vec<String>) -> Result<usize, Error> {
    let Some(objects) = text::find_section(lines, "Objects") else {
        return Ok(0);
    };

    let (models, geometries) = scan_objects(lines, &objects);
    let connections = text::find_section(lines, "Connections");
    let pairs = map_connections(lines, connections.as_ref(), &models, &geometries);

    let mut baked = 0;
    for (&geometry_id, &model_id) in &pairs {
        let block = &geometries[&geometry_id];
        let model = &models[&model_id];
        let Some((start, end)) = model.properties else {
            continue;
        };

        let transforms = NodeTransforms::read(lines, start, end);
        if !transforms.requires_bake() {
            continue;
        }

        let bake = match transforms.bake_matrix() {
            Ok(matrix) => matrix,
            Err(error) => {
                log::warn!("skipping mesh of \"{}\": {}", model.name, error);
                continue;
            }
        };

        log::debug!("baking geometry {} of model \"{}\"", geometry_id, model.name);
        match geometry::bake_mesh(lines, block, bake) {
            Ok(stats) => {
                transform::reset(lines, start, end);
                if stats.mirrored {
                    log::debug!("reversed winding of mirrored mesh of \"{}\"", model.name);
                }
                if stats.fixed_normals > 0 {
                    log::info!(
                        "fixed {} normals in mesh of \"{}\"",
                        stats.fixed_normals,
                        model.name
                    );
                }
                baked += 1;
            }
            Err(error) => log::warn!("skipping mesh of \"{}\": {}", model.name, error),
        }
    }

    Ok(baked)
}

/// One pass over the Objects section collecting the model table and the
/// mesh-bearing geometry table. Nodes with unparseable identifiers are
/// skipped individually.
fn scan_objects(
    lines: &[String],
    objects: &Block,
) -> (BTreeMap<i64, ModelEntry>, BTreeMap<i64, Block>) {
    let mut models = BTreeMap::new();
    let mut geometries = BTreeMap::new();

    let mut cursor = objects.body_start();
    while let Some(node) = text::next_block(lines, cursor, objects.last, |header| {
        header.starts_with("Model:") || header.starts_with("Geometry:")
    }) {
        cursor = node.last + 1;

        let header = &lines[node.header];
        let Some(id) = text::node_id(header) else {
            log::warn!("skipping node without an identifier: {}", header.trim());
            continue;
        };

        if header.trim_start().starts_with("Model:") {
            let properties =
                text::next_block(lines, node.body_start(), node.last, |child| {
                    child.starts_with("Properties")
                })
                .map(|block| (block.header, block.last));
            models.insert(
                id,
                ModelEntry {
                    name: text::node_name(header),
                    properties,
                },
            );
        } else if header.contains("\"Mesh\"") {
            geometries.insert(id, node);
        }
    }

    (models, geometries)
}

/// Builds the geometry-to-model mapping from `OO` connection rows. Rows of
/// other shapes or with unknown identifiers are ignored. Keying by geometry
/// id makes the bake order reproducible.
fn map_connections(
    lines: &[String],
    section: Option<&Block>,
    models: &BTreeMap<i64, ModelEntry>,
    geometries: &BTreeMap<i64, Block>,
) -> BTreeMap<i64, i64> {
    let mut pairs = BTreeMap::new();
    let Some(section) = section else {
        return pairs;
    };

    for line in lines
        .get(section.body_start()..section.last)
        .unwrap_or_default()
    {
        let Some((child, parent)) = parse_connection(line) else {
            continue;
        };
        if geometries.contains_key(&child) && models.contains_key(&parent) {
            pairs.insert(child, parent);
        }
    }
    pairs
}

/// Parses a `C: "OO",<childId>,<parentId>` row.
fn parse_connection(line: &str) -> Option<(i64, i64)> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with("C:") && !trimmed.starts_with("Connect:") {
        return None;
    }

    let tail = &trimmed[trimmed.find(':')? + 1..];
    let mut fields = tail.split(',');
    if fields.next()?.trim().trim_matches('"') != "OO" {
        return None;
    }

    let child = number::parse_i64(fields.next()?)?;
    let parent = number::parse_i64(fields.next()?)?;
    Some((child, parent))
}
