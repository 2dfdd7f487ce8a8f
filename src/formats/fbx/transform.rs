//! The transform properties of a model node and the matrix chain that folds
//! them into geometry.

use glam::{DMat4, DVec3};

use crate::{
    error::Error,
    math::{self, RotationOrder},
};

use super::property;

/// The full set of transform properties the engine composes for one node.
/// Missing properties hold their neutral values.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTransforms {
    pub translation: DVec3,
    pub rotation: DVec3,
    pub scaling: DVec3,
    pub pre_rotation: DVec3,
    pub post_rotation: DVec3,
    pub rotation_offset: DVec3,
    pub rotation_pivot: DVec3,
    pub scaling_offset: DVec3,
    pub scaling_pivot: DVec3,
    pub geometric_translation: DVec3,
    pub geometric_rotation: DVec3,
    pub geometric_scaling: DVec3,
    pub rotation_order: RotationOrder,
}

impl NodeTransforms {
    /// Reads the transform properties out of a model's property block.
    pub fn read(lines: &[String], start: usize, end: usize) -> Self {
        let zero = |name| property::read_vec3(lines, start, end, name, DVec3::ZERO);
        let one = |name| property::read_vec3(lines, start, end, name, DVec3::ONE);

        Self {
            translation: zero("Lcl Translation"),
            rotation: zero("Lcl Rotation"),
            scaling: one("Lcl Scaling"),
            pre_rotation: zero("PreRotation"),
            post_rotation: zero("PostRotation"),
            rotation_offset: zero("RotationOffset"),
            rotation_pivot: zero("RotationPivot"),
            scaling_offset: zero("ScalingOffset"),
            scaling_pivot: zero("ScalingPivot"),
            geometric_translation: zero("GeometricTranslation"),
            geometric_rotation: zero("GeometricRotation"),
            geometric_scaling: one("GeometricScaling"),
            rotation_order: RotationOrder::from_index(property::read_index(
                lines,
                start,
                end,
                "RotationOrder",
                0,
            )),
        }
    }

    /// Whether any property that baking folds away is non-neutral. Local
    /// translation, offsets, and pivots alone never require a bake; they
    /// stay on the node as the clean residue.
    pub fn requires_bake(&self) -> bool {
        self.rotation != DVec3::ZERO
            || self.scaling != DVec3::ONE
            || self.pre_rotation != DVec3::ZERO
            || self.post_rotation != DVec3::ZERO
            || self.geometric_translation != DVec3::ZERO
            || self.geometric_rotation != DVec3::ZERO
            || self.geometric_scaling != DVec3::ONE
    }

    /// The node's full local matrix under the engine convention. Each pivot
    /// and offset is its own affine step; the chain must not be collapsed.
    pub fn node_matrix(&self) -> DMat4 {
        let translate = DMat4::from_translation;

        translate(self.translation)
            * translate(self.rotation_offset)
            * translate(self.rotation_pivot)
            * math::euler_matrix(self.pre_rotation, RotationOrder::Xyz)
            * math::euler_matrix(self.rotation, self.rotation_order)
            * math::euler_matrix(self.post_rotation, RotationOrder::Xyz).inverse()
            * translate(-self.rotation_pivot)
            * translate(self.scaling_offset)
            * translate(self.scaling_pivot)
            * DMat4::from_scale(self.scaling)
            * translate(-self.scaling_pivot)
    }

    /// The transform between the node and its mesh data; never propagated to
    /// children.
    pub fn geometric_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.geometric_translation)
            * math::euler_matrix(self.geometric_rotation, RotationOrder::Xyz)
            * DMat4::from_scale(self.geometric_scaling)
    }

    /// The translation-only residue left on the node after baking, so the
    /// mesh origin keeps its world-space position.
    pub fn clean_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.translation)
            * DMat4::from_translation(self.rotation_offset)
            * DMat4::from_translation(self.scaling_offset)
    }

    /// The matrix applied to the mesh geometry.
    pub fn bake_matrix(&self) -> Result<DMat4, Error> {
        Ok(math::checked_inverse(self.clean_matrix())?
            * self.node_matrix()
            * self.geometric_matrix())
    }
}

impl Default for NodeTransforms {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scaling: DVec3::ONE,
            pre_rotation: DVec3::ZERO,
            post_rotation: DVec3::ZERO,
            rotation_offset: DVec3::ZERO,
            rotation_pivot: DVec3::ZERO,
            scaling_offset: DVec3::ZERO,
            scaling_pivot: DVec3::ZERO,
            geometric_translation: DVec3::ZERO,
            geometric_rotation: DVec3::ZERO,
            geometric_scaling: DVec3::ONE,
            rotation_order: RotationOrder::Xyz,
        }
    }
}

/// Whether the bake matrix mirrors the mesh.
pub fn is_mirrored(bake: DMat4) -> bool {
    math::rotation_determinant(bake) < 0.
}

/// Writes neutral values back into the properties whose effect was baked
/// into the geometry. Local translation, offsets, and pivots keep their
/// values; they form the clean residue left on the node.
pub fn reset(lines: &mut [String], start: usize, end: usize) {
    property::write_vec3(lines, start, end, "Lcl Rotation", DVec3::ZERO);
    property::write_vec3(lines, start, end, "Lcl Scaling", DVec3::ONE);
    property::write_vec3(lines, start, end, "PreRotation", DVec3::ZERO);
    property::write_vec3(lines, start, end, "PostRotation", DVec3::ZERO);
    property::write_vec3(lines, start, end, "GeometricTranslation", DVec3::ZERO);
    property::write_vec3(lines, start, end, "GeometricRotation", DVec3::ZERO);
    property::write_vec3(lines, start, end, "GeometricScaling", DVec3::ONE);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn neutral_transforms_do_not_require_baking() {
        let transforms = NodeTransforms::default();

        assert!(!transforms.requires_bake());
        assert_eq!(DMat4::IDENTITY, transforms.bake_matrix().unwrap());
    }

    #[test]
    fn translation_and_offsets_alone_stay_on_the_node() {
        let transforms = NodeTransforms {
            translation: DVec3::new(1., 2., 3.),
            rotation_offset: DVec3::new(0.5, 0., 0.),
            scaling_offset: DVec3::new(0., 0.5, 0.),
            rotation_pivot: DVec3::new(4., 4., 4.),
            ..Default::default()
        };

        assert!(!transforms.requires_bake());
        // With neutral rotation and scaling the pivots cancel out and the
        // node matrix collapses onto the clean residue.
        assert!(transforms
            .bake_matrix()
            .unwrap()
            .abs_diff_eq(DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn pre_and_post_rotation_compose_with_the_post_inverted() {
        let transforms = NodeTransforms {
            pre_rotation: DVec3::new(0., 90., 0.),
            post_rotation: DVec3::new(0., 0., 45.),
            ..Default::default()
        };

        let expected = math::euler_matrix(transforms.pre_rotation, RotationOrder::Xyz)
            * math::euler_matrix(transforms.post_rotation, RotationOrder::Xyz).inverse();

        assert!(transforms.requires_bake());
        assert!(transforms.bake_matrix().unwrap().abs_diff_eq(expected, 1e-12));
    }

    #[test]
    fn baking_preserves_world_positions() {
        let transforms = NodeTransforms {
            translation: DVec3::new(10., 0., 0.),
            rotation: DVec3::new(90., 0., 0.),
            rotation_pivot: DVec3::new(1., 2., 3.),
            scaling: DVec3::new(2., 1., 1.),
            scaling_pivot: DVec3::new(-1., 0., 1.),
            geometric_translation: DVec3::new(0., 5., 0.),
            ..Default::default()
        };

        let vertex = DVec3::new(0.25, -1., 2.);
        let baked = transforms.bake_matrix().unwrap().transform_point3(vertex);
        let world_before = (transforms.node_matrix() * transforms.geometric_matrix())
            .transform_point3(vertex);
        let world_after = transforms.clean_matrix().transform_point3(baked);

        assert!(world_after.abs_diff_eq(world_before, 1e-9));
    }

    #[test]
    fn negative_scale_mirrors() {
        let transforms = NodeTransforms {
            scaling: DVec3::new(-1., 1., 1.),
            ..Default::default()
        };

        assert!(is_mirrored(transforms.bake_matrix().unwrap()));
        assert!(!is_mirrored(DMat4::IDENTITY));
    }
}
