//! Transform component and the arena that resolves parent chains.
//!
//! A right-handed coordinate system is used throughout:
//! +X forward, +Y left, +Z up (matching the camera basis in
//! [`super::camera`]).

use glam::{Affine3A, Mat4, Quat, Vec3};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle into a [`TransformArena`].
    pub struct TransformId;
}

/// Position, rotation, and scale of a node, with a lazily-recomputed local
/// matrix and an optional parent link.
///
/// World matrices are not cached on the node itself: `world()` on the owning
/// arena always recomputes by walking the parent chain, which keeps the
/// invariant "`world()` never returns stale data after any ancestor
/// mutation" trivially true instead of requiring dirty-bit propagation
/// across nodes.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub parent: Option<TransformId>,

    local_matrix: Affine3A,
    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,

            local_matrix: Affine3A::IDENTITY,
            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    /// Adds `translation` to the current position.
    ///
    /// The original engine's `translate_by` doubled the position
    /// (`_position += _position`, ignoring the argument). This is the
    /// intended behavior: add the argument.
    pub fn translate_by(&mut self, translation: Vec3) {
        self.position += translation;
        self.mark_dirty();
    }

    pub fn rotate_by(&mut self, delta: Quat) {
        self.rotation = delta * self.rotation;
        self.mark_dirty();
    }

    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
        self.mark_dirty();
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.mark_dirty();
    }

    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }

    /// Recomputes the local matrix if any TRS field changed since the last
    /// call. Returns whether a recomputation happened.
    fn update_local_matrix(&mut self) -> bool {
        let changed = self.force_update
            || self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale;

        if changed {
            self.local_matrix =
                Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);
            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }
        changed
    }

    /// Local transform relative to the parent (identity parent if none).
    pub fn local(&mut self) -> Affine3A {
        self.update_local_matrix();
        self.local_matrix
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns a set of [`Transform`]s and resolves `world()` queries by walking
/// each node's parent chain.
#[derive(Debug, Default)]
pub struct TransformArena {
    slots: SlotMap<TransformId, Transform>,
}

impl TransformArena {
    #[must_use]
    pub fn new() -> Self {
        Self { slots: SlotMap::with_key() }
    }

    pub fn insert(&mut self, transform: Transform) -> TransformId {
        self.slots.insert(transform)
    }

    pub fn remove(&mut self, id: TransformId) -> Option<Transform> {
        self.slots.remove(id)
    }

    pub fn get(&self, id: TransformId) -> Option<&Transform> {
        self.slots.get(id)
    }

    pub fn get_mut(&mut self, id: TransformId) -> Option<&mut Transform> {
        self.slots.get_mut(id)
    }

    /// World matrix for `id`: `parent.world() * local()`, or just `local()`
    /// at a root. Always walks the chain; there is no stale cache to
    /// invalidate.
    pub fn world(&mut self, id: TransformId) -> Affine3A {
        let parent = self.slots[id].parent;
        let parent_world = parent.map(|p| self.world(p));
        let local = self.slots[id].local();
        match parent_world {
            Some(pw) => pw * local,
            None => local,
        }
    }

    #[must_use]
    pub fn world_as_mat4(&mut self, id: TransformId) -> Mat4 {
        Mat4::from(self.world(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Affine3A, b: Affine3A) -> bool {
        let (am, bm) = (Mat4::from(a), Mat4::from(b));
        am.to_cols_array()
            .iter()
            .zip(bm.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn root_world_equals_local() {
        let mut arena = TransformArena::new();
        let mut t = Transform::new();
        t.set_position(Vec3::new(1.0, 2.0, 3.0));
        let id = arena.insert(t);
        let local = arena.get_mut(id).unwrap().local();
        assert!(approx_eq(arena.world(id), local));
    }

    #[test]
    fn child_world_is_parent_times_local() {
        let mut arena = TransformArena::new();
        let mut a = Transform::new();
        a.set_position(Vec3::new(10.0, 0.0, 0.0));
        let a_id = arena.insert(a);

        let mut b = Transform::new();
        b.set_position(Vec3::new(0.0, 5.0, 0.0));
        b.parent = Some(a_id);
        let b_id = arena.insert(b);

        let expected = arena.world(a_id) * arena.get_mut(b_id).unwrap().local();
        assert!(approx_eq(arena.world(b_id), expected));
    }

    #[test]
    fn mutating_child_after_read_is_observed() {
        let mut arena = TransformArena::new();
        let a_id = arena.insert(Transform::new());
        let mut b = Transform::new();
        b.parent = Some(a_id);
        let b_id = arena.insert(b);

        let _ = arena.world(b_id);
        arena.get_mut(b_id).unwrap().set_position(Vec3::new(7.0, 0.0, 0.0));
        let world = arena.world(b_id);
        assert!((world.translation.x - 7.0).abs() < 1e-5);
    }

    #[test]
    fn translate_by_adds_argument_not_doubles_position() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(1.0, 1.0, 1.0));
        t.translate_by(Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(t.position, Vec3::new(3.0, 1.0, 1.0));
    }
}
