//! In-place mutation of one mesh's arrays under a bake matrix: positions,
//! directional layers, mirrored winding, and normal hygiene.

use glam::{DMat3, DMat4, DVec3};

use crate::{error::Error, math};

use super::{
    array::{self, DoubleArray, IntArray},
    text::{self, Block},
    transform,
};

/// Components smaller than this are treated as numeric noise in normals.
const COMPONENT_EPSILON: f64 = 1e-6;
/// Normals shorter than this are degenerate and get replaced outright.
const DEGENERATE_EPSILON: f64 = 1e-6;
/// Normals within this distance of unit length are left untouched.
const UNIT_TOLERANCE: f64 = 1e-3;
/// Transformed directions shorter than this cannot be renormalized.
const DIRECTION_EPSILON: f64 = 1e-14;

/// A recognized layer-element kind: its header token, the names of its data
/// and companion index arrays, the per-slot value stride, and whether its
/// values are directions.
struct LayerKind {
    header: &'static str,
    data: &'static str,
    index: &'static str,
    stride: usize,
    directional: bool,
}

static LAYER_KINDS: [LayerKind; 5] = [
    LayerKind {
        header: "LayerElementNormal:",
        data: "Normals",
        index: "NormalsIndex",
        stride: 3,
        directional: true,
    },
    LayerKind {
        header: "LayerElementTangent:",
        data: "Tangents",
        index: "TangentsIndex",
        stride: 3,
        directional: true,
    },
    LayerKind {
        header: "LayerElementBinormal:",
        data: "Binormals",
        index: "BinormalsIndex",
        stride: 3,
        directional: true,
    },
    LayerKind {
        header: "LayerElementUV:",
        data: "UV",
        index: "UVIndex",
        stride: 2,
        directional: false,
    },
    LayerKind {
        header: "LayerElementColor:",
        data: "Colors",
        index: "ColorIndex",
        stride: 4,
        directional: false,
    },
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MeshStats {
    pub fixed_normals: usize,
    pub mirrored: bool,
}

/// Applies the bake matrix to every array of one geometry block. Arrays that
/// fail to parse are skipped individually; the rest of the mesh is still
/// processed.
pub fn bake_mesh(lines: &mut [String], geometry: &Block, bake: DMat4) -> Result<MeshStats, Error> {
    let mut stats = MeshStats {
        mirrored: transform::is_mirrored(bake),
        ..Default::default()
    };
    let from = geometry.body_start();
    let to = geometry.last;

    if let Some(block) = array::find_array(lines, from, to, "Vertices") {
        match DoubleArray::read(lines, &block) {
            Ok(mut vertices) => {
                transform_positions(&mut vertices.values, bake);
                vertices.write(lines)?;
            }
            Err(error) => log::warn!("skipping Vertices array: {}", error),
        }
    }

    // Winding only changes under a mirroring bake; the polygon table built
    // here also drives the per-polygon-vertex layer reorder.
    let mut polygons = Vec::new();
    if stats.mirrored {
        if let Some(block) = array::find_array(lines, from, to, "PolygonVertexIndex") {
            match IntArray::read(lines, &block) {
                Ok(mut indices) => {
                    polygons = split_polygons(&indices.values);
                    reverse_winding(&mut indices.values, &polygons);
                    indices.write(lines)?;
                }
                Err(error) => log::warn!("skipping PolygonVertexIndex array: {}", error),
            }
        }
    }

    let normal = math::normal_matrix(bake).ok();
    if normal.is_none() {
        log::warn!("bake matrix is singular; directional layers are left untransformed");
    }

    for kind in &LAYER_KINDS {
        let mut cursor = from;
        while let Some(layer) = text::next_block(lines, cursor, to, |header| {
            header.starts_with(kind.header)
        }) {
            process_layer(lines, &layer, kind, normal, &polygons, &mut stats)?;
            cursor = layer.last + 1;
        }
    }

    Ok(stats)
}

fn process_layer(
    lines: &mut [String],
    layer: &Block,
    kind: &LayerKind,
    normal: Option<DMat3>,
    polygons: &[(usize, usize)],
    stats: &mut MeshStats,
) -> Result<(), Error> {
    let mapping = text::quoted_value(lines, layer, "MappingInformationType").unwrap_or_default();
    let reference = text::quoted_value(lines, layer, "ReferenceInformationType").unwrap_or_default();
    let by_polygon_vertex = mapping.contains("ByPolygonVertex");
    let index_to_direct = reference.contains("IndexToDirect");

    if let Some(block) = array::find_array(lines, layer.body_start(), layer.last, kind.data) {
        match DoubleArray::read(lines, &block) {
            Ok(mut data) => {
                if kind.directional {
                    if let Some(matrix) = normal {
                        transform_directions(&mut data.values, matrix);
                    }
                }
                if by_polygon_vertex && !index_to_direct {
                    if let Err(error) = reorder_slots(&mut data.values, polygons, kind.stride) {
                        log::warn!("{} layer not reordered: {}", kind.data, error);
                    }
                }
                if kind.data == "Normals" {
                    stats.fixed_normals += fix_normals(&mut data.values);
                }
                data.write(lines)?;
            }
            Err(error) => log::warn!("skipping {} array: {}", kind.data, error),
        }
    }

    if by_polygon_vertex && index_to_direct && !polygons.is_empty() {
        if let Some(block) = array::find_array(lines, layer.body_start(), layer.last, kind.index) {
            match IntArray::read(lines, &block) {
                Ok(mut indices) => {
                    if let Err(error) = reorder_slots(&mut indices.values, polygons, 1) {
                        log::warn!("{} layer not reordered: {}", kind.index, error);
                    } else {
                        indices.write(lines)?;
                    }
                }
                Err(error) => log::warn!("skipping {} array: {}", kind.index, error),
            }
        }
    }

    Ok(())
}

fn transform_positions(values: &mut [f64], matrix: DMat4) {
    for triple in values.chunks_exact_mut(3) {
        let transformed = matrix.transform_point3(DVec3::new(triple[0], triple[1], triple[2]));
        triple.copy_from_slice(&transformed.to_array());
    }
}

fn transform_directions(values: &mut [f64], matrix: DMat3) {
    for triple in values.chunks_exact_mut(3) {
        let mut transformed = matrix * DVec3::new(triple[0], triple[1], triple[2]);
        if transformed.length() > DIRECTION_EPSILON {
            transformed = transformed.normalize();
        }
        triple.copy_from_slice(&transformed.to_array());
    }
}

/// Groups the polygon-vertex-index array into per-polygon runs. Each run is
/// closed by a negatively encoded entry; a trailing run without one is
/// dropped.
fn split_polygons(values: &[i64]) -> Vec<(usize, usize)> {
    let mut polygons = Vec::new();
    let mut start = 0;
    for (position, &value) in values.iter().enumerate() {
        if value < 0 {
            polygons.push((start, position));
            start = position + 1;
        }
    }
    polygons
}

/// Flips each polygon's winding while keeping its leading vertex: the
/// closing entry is decoded, the tail of the run is reversed, and the new
/// closing entry is re-encoded as `-(v + 1)`.
fn reverse_winding(values: &mut [i64], polygons: &[(usize, usize)]) {
    for &(start, end) in polygons {
        values[end] = -values[end] - 1;
        values[start + 1..=end].reverse();
        values[end] = -values[end] - 1;
    }
}

/// Applies the winding permutation to a per-polygon-vertex array: within
/// each polygon the leading slot stays and the remaining slots reverse,
/// `stride` values per slot.
fn reorder_slots<T>(values: &mut [T], polygons: &[(usize, usize)], stride: usize) -> Result<(), Error> {
    if let Some(&(_, end)) = polygons.iter().max_by_key(|&&(_, end)| end) {
        if (end + 1) * stride > values.len() {
            return Err(Error::Parse(format!(
                "array holds {} values but polygons span {}",
                values.len(),
                (end + 1) * stride
            )));
        }
    }

    for &(start, end) in polygons {
        let len = end - start + 1;
        for offset in 1..=(len - 1) / 2 {
            let left = start + offset;
            let right = start + len - offset;
            for component in 0..stride {
                values.swap(left * stride + component, right * stride + component);
            }
        }
    }
    Ok(())
}

/// Coerces noise components to zero, replaces degenerate normals with the
/// up axis, and renormalizes normals that drifted off unit length. Returns
/// the number of adjusted normals.
fn fix_normals(values: &mut [f64]) -> usize {
    let mut fixed = 0;
    for triple in values.chunks_exact_mut(3) {
        for component in triple.iter_mut() {
            if component.abs() < COMPONENT_EPSILON {
                *component = 0.;
            }
        }

        let length = DVec3::new(triple[0], triple[1], triple[2]).length();
        if length < DEGENERATE_EPSILON {
            triple.copy_from_slice(&[0., 1., 0.]);
            fixed += 1;
        } else if (length - 1.).abs() > UNIT_TOLERANCE {
            for component in triple.iter_mut() {
                *component /= length;
            }
            fixed += 1;
        }
    }
    fixed
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn polygons_are_split_on_negative_entries() {
        let values = vec![0, 1, -3, 2, 3, 4, -6];

        assert_eq!(vec![(0, 2), (3, 6)], split_polygons(&values));
        assert_eq!(Vec::<(usize, usize)>::new(), split_polygons(&[0, 1, 2]));
    }

    #[test]
    fn winding_reversal_keeps_the_leading_vertex() {
        let mut values = vec![0, 1, -3, 2, 3, 4, -6];
        let polygons = split_polygons(&values);
        reverse_winding(&mut values, &polygons);

        // Triangle 0,1,2 becomes 0,2,1; quad 2,3,4,5 becomes 2,5,4,3.
        assert_eq!(vec![0, 2, -2, 2, 5, 4, -4], values);
    }

    #[test]
    fn winding_reversal_is_an_involution() {
        let original = vec![0, 1, -3, 2, 3, 4, -6];
        let mut values = original.clone();
        let polygons = split_polygons(&values);

        reverse_winding(&mut values, &polygons);
        reverse_winding(&mut values, &polygons);

        assert_eq!(original, values);
    }

    #[test]
    fn slot_reorder_follows_the_winding_permutation() {
        let polygons = [(0, 2)];

        let mut indices = vec![7, 8, 9];
        reorder_slots(&mut indices, &polygons, 1).unwrap();
        assert_eq!(vec![7, 9, 8], indices);

        let mut uvs = vec![0.0, 0.1, 1.0, 1.1, 2.0, 2.1];
        reorder_slots(&mut uvs, &polygons, 2).unwrap();
        assert_eq!(vec![0.0, 0.1, 2.0, 2.1, 1.0, 1.1], uvs);
    }

    #[test]
    fn slot_reorder_rejects_short_arrays() {
        let polygons = [(0, 3)];
        let mut values = vec![1., 2., 3.];

        assert!(reorder_slots(&mut values, &polygons, 3).is_err());
    }

    #[test]
    fn degenerate_normals_become_the_up_axis() {
        let mut values = vec![1e-8, 1e-8, 1e-8];

        assert_eq!(1, fix_normals(&mut values));
        assert_eq!(vec![0., 1., 0.], values);
    }

    #[test]
    fn oversized_normals_are_renormalized() {
        let mut values = vec![2., 0., 0.];

        assert_eq!(1, fix_normals(&mut values));
        assert_eq!(vec![1., 0., 0.], values);
    }

    #[test]
    fn unit_normals_are_left_untouched() {
        let mut values = vec![0.6, 0.8, 0.];

        assert_eq!(0, fix_normals(&mut values));
        assert_eq!(vec![0.6, 0.8, 0.], values);
    }
}
