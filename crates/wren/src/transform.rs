//! # Local/World Transforms — Lazy Resolution
//!
//! The spatial half of the [`Scene`] API. Every node stores a local
//! [`Transform`](crate::math::Transform) plus a cached world matrix guarded
//! by a dirty flag:
//!
//! - Mutating a local field marks the node **and its whole subtree** dirty
//!   immediately; recomputing matrices is deferred.
//! - A dirty world matrix is recomputed on read, resolving ancestors first
//!   (`world = parent_world * TRS(local)`, root is just `TRS(local)`).
//! - [`resolve_transforms`](Scene::resolve_transforms) is the eager
//!   breadth-first sweep the frame loop runs once per frame, so steady-state
//!   cost stays bounded; on-demand resolution covers any query made before
//!   the sweep.
//!
//! World **rotation** and **scale** are the deliberate exception: they are
//! recomputed by walking the parent chain on every call instead of reading
//! the cached matrix. Correct but uncached; kept as-is so that queries made
//! between a mutation and the sweep never decompose a stale matrix.
//!
//! Getters return `None` for dead handles; mutators on dead handles are
//! silent no-ops.

use crate::math::{EulerRot, Mat4, Quat, Vec3};
use crate::node::{NodeId, Space};
use crate::scene::Scene;

impl Scene {
    // ── Local space ─────────────────────────────────────────────────

    /// Overwrite the node's local position and dirty its subtree.
    pub fn set_local_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(n) = self.node_mut(node) {
            n.local.translation = position;
            self.mark_subtree_dirty(node);
        }
    }

    /// Overwrite the node's local rotation and dirty its subtree.
    pub fn set_local_rotation(&mut self, node: NodeId, rotation: Quat) {
        if let Some(n) = self.node_mut(node) {
            n.local.rotation = rotation;
            self.mark_subtree_dirty(node);
        }
    }

    /// Set the local rotation from intrinsic XYZ Euler angles (radians).
    pub fn set_local_rotation_euler(&mut self, node: NodeId, x: f32, y: f32, z: f32) {
        self.set_local_rotation(node, Quat::from_euler(EulerRot::XYZ, x, y, z));
    }

    /// Overwrite the node's local scale and dirty its subtree.
    pub fn set_local_scale(&mut self, node: NodeId, scale: Vec3) {
        if let Some(n) = self.node_mut(node) {
            n.local.scale = scale;
            self.mark_subtree_dirty(node);
        }
    }

    /// The node's local position.
    pub fn local_position(&self, node: NodeId) -> Option<Vec3> {
        Some(self.node(node)?.local.translation)
    }

    /// The node's local rotation.
    pub fn local_rotation(&self, node: NodeId) -> Option<Quat> {
        Some(self.node(node)?.local.rotation)
    }

    /// The node's local scale.
    pub fn local_scale(&self, node: NodeId) -> Option<Vec3> {
        Some(self.node(node)?.local.scale)
    }

    // ── World matrix ────────────────────────────────────────────────

    /// The node's local-to-world matrix, recomputing it (and any stale
    /// ancestors) if dirty.
    pub fn world_matrix(&mut self, node: NodeId) -> Option<Mat4> {
        self.resolve_world_matrix(node);
        Some(self.node(node)?.world_matrix)
    }

    /// Recompute the cached world matrix if stale. Ancestors resolve first;
    /// a clean parent's cache is trusted (dirtiness propagates downward on
    /// mutation, so a clean parent is truly current).
    fn resolve_world_matrix(&mut self, node: NodeId) {
        let Some(n) = self.node(node) else {
            return;
        };
        if !n.dirty {
            return;
        }
        let parent = n.parent;
        let parent_world = match parent {
            Some(p) => {
                self.resolve_world_matrix(p);
                self.node(p).map(|pn| pn.world_matrix)
            }
            None => None,
        };
        if let Some(n) = self.node_mut(node) {
            let local = n.local.matrix();
            n.world_matrix = match parent_world {
                Some(parent_world) => parent_world * local,
                None => local,
            };
            n.dirty = false;
        }
    }

    /// Eagerly resolve every stale world matrix in the tree, breadth-first
    /// from the root, clearing all dirty flags. Run once per frame by the
    /// application loop.
    pub fn resolve_transforms(&mut self) {
        for id in self.collect_bfs(self.root()) {
            let Some(n) = self.node(id) else {
                continue;
            };
            if !n.dirty {
                continue;
            }
            // Breadth-first order: the parent was resolved earlier in this
            // sweep (or was already clean).
            let parent_world = n
                .parent
                .and_then(|p| self.node(p))
                .map(|pn| pn.world_matrix);
            if let Some(n) = self.node_mut(id) {
                let local = n.local.matrix();
                n.world_matrix = match parent_world {
                    Some(parent_world) => parent_world * local,
                    None => local,
                };
                n.dirty = false;
            }
        }
    }

    // ── World position ──────────────────────────────────────────────

    /// The node's position in world space. The root answers straight from
    /// its local position; parented nodes go through the resolved matrix.
    pub fn world_position(&mut self, node: NodeId) -> Option<Vec3> {
        let n = self.node(node)?;
        if n.parent.is_none() {
            return Some(n.local.translation);
        }
        Some(self.world_matrix(node)?.transform_point3(Vec3::ZERO))
    }

    /// Place the node at a world-space position by rewriting its local
    /// position through the inverse of the parent's world matrix.
    pub fn set_world_position(&mut self, node: NodeId, position: Vec3) {
        let Some(n) = self.node(node) else {
            return;
        };
        match n.parent {
            Some(parent) => {
                if let Some(parent_world) = self.world_matrix(parent) {
                    self.set_local_position(node, parent_world.inverse().transform_point3(position));
                }
            }
            None => self.set_local_position(node, position),
        }
    }

    /// Map a local-space offset on `node` into world space.
    pub fn transform_point(&mut self, node: NodeId, offset: Vec3) -> Option<Vec3> {
        let n = self.node(node)?;
        if n.parent.is_none() {
            return Some(n.local.translation + offset);
        }
        Some(self.world_matrix(node)?.transform_point3(offset))
    }

    // ── World rotation / scale (uncached) ───────────────────────────

    /// The node's rotation in world space, composed up the parent chain on
    /// every call.
    pub fn world_rotation(&self, node: NodeId) -> Option<Quat> {
        let n = self.node(node)?;
        let mut rotation = n.local.rotation;
        let mut current = n.parent;
        while let Some(id) = current {
            let parent = self.node(id)?;
            rotation = parent.local.rotation * rotation;
            current = parent.parent;
        }
        Some(rotation)
    }

    /// Set the node's world-space rotation by rewriting its local rotation
    /// through the inverse of the parent's world rotation.
    pub fn set_world_rotation(&mut self, node: NodeId, rotation: Quat) {
        let Some(n) = self.node(node) else {
            return;
        };
        match n.parent {
            Some(parent) => {
                if let Some(parent_world) = self.world_rotation(parent) {
                    self.set_local_rotation(node, parent_world.inverse() * rotation);
                }
            }
            None => self.set_local_rotation(node, rotation),
        }
    }

    /// The node's scale in world space: the component-wise product of every
    /// local scale up the parent chain.
    pub fn world_scale(&self, node: NodeId) -> Option<Vec3> {
        let n = self.node(node)?;
        let mut scale = n.local.scale;
        let mut current = n.parent;
        while let Some(id) = current {
            let parent = self.node(id)?;
            scale *= parent.local.scale;
            current = parent.parent;
        }
        Some(scale)
    }

    /// Set the node's world-space scale by dividing component-wise by the
    /// parent's world scale.
    pub fn set_world_scale(&mut self, node: NodeId, scale: Vec3) {
        let Some(n) = self.node(node) else {
            return;
        };
        match n.parent {
            Some(parent) => {
                if let Some(parent_world) = self.world_scale(parent) {
                    self.set_local_scale(node, scale / parent_world);
                }
            }
            None => self.set_local_scale(node, scale),
        }
    }

    // ── Relative operations ─────────────────────────────────────────

    /// Move the node by `delta` in the chosen space.
    pub fn translate(&mut self, node: NodeId, delta: Vec3, space: Space) {
        match space {
            Space::World => {
                if let Some(position) = self.world_position(node) {
                    self.set_world_position(node, position + delta);
                }
            }
            Space::Local => {
                if let Some(position) = self.local_position(node) {
                    self.set_local_position(node, position + delta);
                }
            }
        }
    }

    /// Apply an additional rotation to the node in the chosen space.
    pub fn rotate(&mut self, node: NodeId, rotation: Quat, space: Space) {
        match space {
            Space::World => {
                if let Some(current) = self.world_rotation(node) {
                    self.set_world_rotation(node, current * rotation);
                }
            }
            Space::Local => {
                if let Some(current) = self.local_rotation(node) {
                    self.set_local_rotation(node, current * rotation);
                }
            }
        }
    }

    /// Add `delta` to the node's scale in the chosen space.
    pub fn scale(&mut self, node: NodeId, delta: Vec3, space: Space) {
        match space {
            Space::World => {
                if let Some(current) = self.world_scale(node) {
                    self.set_world_scale(node, current + delta);
                }
            }
            Space::Local => {
                if let Some(current) = self.local_scale(node) {
                    self.set_local_scale(node, current + delta);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn grandchild_world_position_composes() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(a).unwrap();
        scene.set_local_position(a, Vec3::new(1.0, 0.0, 0.0));
        scene.set_local_position(b, Vec3::new(0.0, 1.0, 0.0));
        assert_vec3_eq(scene.world_position(b).unwrap(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn world_matrix_matches_trs_composition() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(a).unwrap();
        scene.set_local_position(a, Vec3::new(2.0, -1.0, 3.0));
        scene.set_local_rotation(a, Quat::from_rotation_y(0.7));
        scene.set_local_scale(a, Vec3::splat(2.0));
        scene.set_local_position(b, Vec3::new(0.5, 0.5, 0.0));
        scene.resolve_transforms();

        let a_world = scene.world_matrix(a).unwrap();
        let b_world = scene.world_matrix(b).unwrap();
        let a_local = scene.node(a).unwrap().local_transform().matrix();
        let b_local = scene.node(b).unwrap().local_transform().matrix();
        let root_world = scene.world_matrix(root).unwrap();

        assert!((a_world - root_world * a_local).abs_diff_eq(Mat4::ZERO, 1e-5));
        assert!((b_world - a_world * b_local).abs_diff_eq(Mat4::ZERO, 1e-5));
    }

    #[test]
    fn dirty_propagates_down_and_clears_on_resolve() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(a).unwrap();
        let c = scene.add_child(b).unwrap();
        scene.resolve_transforms();
        assert!(!scene.node(b).unwrap().is_dirty());

        scene.set_local_position(a, Vec3::X);
        assert!(scene.node(a).unwrap().is_dirty());
        assert!(scene.node(b).unwrap().is_dirty());
        assert!(scene.node(c).unwrap().is_dirty());
        assert!(!scene.node(root).unwrap().is_dirty());

        scene.resolve_transforms();
        for id in [root, a, b, c] {
            assert!(!scene.node(id).unwrap().is_dirty());
        }
    }

    #[test]
    fn on_demand_resolution_before_the_sweep() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        scene.set_local_position(a, Vec3::new(4.0, 0.0, 0.0));
        // No resolve_transforms() yet; the read resolves lazily.
        assert_vec3_eq(scene.world_position(a).unwrap(), Vec3::new(4.0, 0.0, 0.0));
        assert!(!scene.node(a).unwrap().is_dirty());
    }

    #[test]
    fn set_world_position_round_trips() {
        let mut scene = Scene::new();
        let root = scene.root();
        let parent = scene.add_child(root).unwrap();
        let child = scene.add_child(parent).unwrap();
        scene.set_local_position(parent, Vec3::new(3.0, 1.0, 0.0));
        scene.set_local_rotation(parent, Quat::from_rotation_z(FRAC_PI_2));
        scene.set_local_position(child, Vec3::new(1.0, 2.0, 3.0));

        let before_local = scene.local_position(child).unwrap();
        let world = scene.world_position(child).unwrap();
        scene.set_world_position(child, world);
        assert_vec3_eq(scene.local_position(child).unwrap(), before_local);
        assert_vec3_eq(scene.world_position(child).unwrap(), world);
    }

    #[test]
    fn set_world_position_inverts_the_parent() {
        let mut scene = Scene::new();
        let root = scene.root();
        let parent = scene.add_child(root).unwrap();
        let child = scene.add_child(parent).unwrap();
        scene.set_local_position(parent, Vec3::new(5.0, 0.0, 0.0));
        scene.set_world_position(child, Vec3::new(7.0, 0.0, 0.0));
        assert_vec3_eq(scene.local_position(child).unwrap(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn reparenting_keeps_local_values() {
        let mut scene = Scene::new();
        let root = scene.root();
        let x = scene.add_child(root).unwrap();
        let p = scene.add_child(root).unwrap();
        scene.set_local_position(x, Vec3::new(2.0, 0.0, 0.0));
        scene.set_local_position(p, Vec3::new(5.0, 0.0, 0.0));
        assert_vec3_eq(scene.world_position(x).unwrap(), Vec3::new(2.0, 0.0, 0.0));

        assert!(scene.set_parent(x, p));
        // Local position is untouched; the world position shifts.
        assert_vec3_eq(scene.local_position(x).unwrap(), Vec3::new(2.0, 0.0, 0.0));
        assert_vec3_eq(scene.world_position(x).unwrap(), Vec3::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn world_rotation_composes_up_the_chain() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(a).unwrap();
        let qa = Quat::from_rotation_z(FRAC_PI_2);
        let qb = Quat::from_rotation_y(0.3);
        scene.set_local_rotation(a, qa);
        scene.set_local_rotation(b, qb);
        let world = scene.world_rotation(b).unwrap();
        assert!(world.angle_between(qa * qb) < 1e-5);
    }

    #[test]
    fn set_world_rotation_cancels_the_parent() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(a).unwrap();
        scene.set_local_rotation(a, Quat::from_rotation_z(FRAC_PI_2));
        scene.set_world_rotation(b, Quat::IDENTITY);
        let world = scene.world_rotation(b).unwrap();
        assert!(world.angle_between(Quat::IDENTITY) < 1e-5);
    }

    #[test]
    fn world_scale_multiplies_and_divides() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        let b = scene.add_child(a).unwrap();
        scene.set_local_scale(a, Vec3::new(2.0, 2.0, 2.0));
        scene.set_local_scale(b, Vec3::new(3.0, 1.0, 1.0));
        assert_vec3_eq(scene.world_scale(b).unwrap(), Vec3::new(6.0, 2.0, 2.0));

        scene.set_world_scale(b, Vec3::new(4.0, 4.0, 4.0));
        assert_vec3_eq(scene.local_scale(b).unwrap(), Vec3::new(2.0, 2.0, 2.0));
        assert_vec3_eq(scene.world_scale(b).unwrap(), Vec3::new(4.0, 4.0, 4.0));
    }

    #[test]
    fn transform_point_applies_the_world_matrix() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        scene.set_local_position(a, Vec3::new(1.0, 0.0, 0.0));
        scene.set_local_rotation(a, Quat::from_rotation_z(FRAC_PI_2));
        // +X in local space points along +Y after the rotation.
        let p = scene.transform_point(a, Vec3::X).unwrap();
        assert_vec3_eq(p, Vec3::new(1.0, 1.0, 0.0));

        // The root short-circuits: local position + offset, no matrix.
        scene.set_local_position(root, Vec3::new(0.0, 0.0, 2.0));
        let q = scene.transform_point(root, Vec3::Y).unwrap();
        assert_vec3_eq(q, Vec3::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn translate_in_world_space_ignores_parent_rotation() {
        let mut scene = Scene::new();
        let root = scene.root();
        let parent = scene.add_child(root).unwrap();
        let child = scene.add_child(parent).unwrap();
        scene.set_local_rotation(parent, Quat::from_rotation_z(FRAC_PI_2));

        scene.translate(child, Vec3::X, Space::World);
        assert_vec3_eq(scene.world_position(child).unwrap(), Vec3::new(1.0, 0.0, 0.0));
        // In the parent's rotated frame that is -Y locally.
        assert_vec3_eq(scene.local_position(child).unwrap(), Vec3::new(0.0, -1.0, 0.0));

        scene.translate(child, Vec3::X, Space::Local);
        // A local +X step leaves the rotated frame along world +Y.
        assert_vec3_eq(scene.world_position(child).unwrap(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn scale_is_additive_on_the_read_value() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        scene.scale(a, Vec3::splat(0.5), Space::Local);
        assert_vec3_eq(scene.local_scale(a).unwrap(), Vec3::splat(1.5));
    }

    #[test]
    fn dead_handles_are_silent() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_child(root).unwrap();
        scene.remove_child(root, a);
        assert!(scene.world_position(a).is_none());
        assert!(scene.world_rotation(a).is_none());
        scene.set_local_position(a, Vec3::X); // no-op, no panic
        scene.translate(a, Vec3::X, Space::World);
    }
}
