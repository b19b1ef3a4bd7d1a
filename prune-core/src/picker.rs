//! Pointer picking over a [`SceneGraph`].

use crate::scene::{NodeTag, Primitive, SceneGraph, SceneId};
use glam::Vec3;

/// Half-line `origin + t * dir`, `t >= 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    pub node: SceneId,
    pub tag: NodeTag,
    /// Distance along the ray in world units.
    pub distance: f32,
}

/// Ray intersection in a shape's local frame.
///
/// `dir` need not be unit length; the returned `t` is in units of `dir`.
pub trait Intersect {
    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32>;
}

impl Intersect for Primitive {
    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        match self {
            Primitive::Marker { center, size } => sphere(origin, dir, *center, size * 0.5),
            Primitive::Cluster { center, radius } => sphere(origin, dir, *center, *radius),
            Primitive::Cylinder { radius, length } => cylinder(origin, dir, *radius, *length),
            Primitive::Template { shape, scale } => {
                aabb(origin, dir, shape.min * *scale, shape.max * *scale)
            }
        }
    }
}

fn nearest(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let a = dir.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t0 = (-b - sq) / a;
    let t1 = (-b + sq) / a;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        // Ray starts inside.
        Some(0.0)
    } else {
        None
    }
}

/// Upright capped cylinder spanning `y = 0..length`.
fn cylinder(origin: Vec3, dir: Vec3, radius: f32, length: f32) -> Option<f32> {
    let r2 = radius * radius;
    let mut best = None;

    let a = dir.x * dir.x + dir.z * dir.z;
    if a > f32::EPSILON {
        let b = origin.x * dir.x + origin.z * dir.z;
        let c = origin.x * origin.x + origin.z * origin.z - r2;
        let disc = b * b - a * c;
        if disc >= 0.0 {
            let sq = disc.sqrt();
            for t in [(-b - sq) / a, (-b + sq) / a] {
                let y = origin.y + dir.y * t;
                if t >= 0.0 && (0.0..=length).contains(&y) {
                    best = nearest(best, Some(t));
                }
            }
        }
    }

    if dir.y.abs() > f32::EPSILON {
        for cap in [0.0, length] {
            let t = (cap - origin.y) / dir.y;
            let p = origin + dir * t;
            if t >= 0.0 && p.x * p.x + p.z * p.z <= r2 {
                best = nearest(best, Some(t));
            }
        }
    }

    best
}

/// Slab test against an axis-aligned box.
fn aabb(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_min = 0.0_f32;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let (o, d) = (origin[axis], dir[axis]);
        let (lo, hi) = (min[axis].min(max[axis]), min[axis].max(max[axis]));
        if d.abs() <= f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (mut t0, mut t1) = ((lo - o) / d, (hi - o) / d);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

/// Nearest tagged primitive hit by `ray`, if any.
pub fn pick(graph: &SceneGraph, ray: &Ray) -> Option<PickHit> {
    let worlds = graph.world_transforms();
    let mut best: Option<PickHit> = None;

    for (node_id, node) in graph.nodes.iter().enumerate() {
        let (Some(tag), Some(primitive)) = (node.tag, &node.primitive) else {
            continue;
        };
        let inv = worlds[node_id].inverse();
        let origin = inv.transform_point3(ray.origin);
        let dir = inv.transform_vector3(ray.dir);
        let Some(distance) = primitive.intersect(origin, dir) else {
            continue;
        };
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(PickHit {
                node: node_id,
                tag,
                distance,
            });
        }
    }
    best
}

/// Tracks the single highlighted scene node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Highlight {
    current: Option<SceneId>,
}

impl Highlight {
    pub fn current(&self) -> Option<SceneId> {
        self.current
    }

    /// Removes the emissive tint from the highlighted node, if any.
    pub fn clear(&mut self, graph: &mut SceneGraph) {
        if let Some(node) = self.current.take().and_then(|id| graph.node_mut(id)) {
            node.material.emissive = 0;
        }
    }

    /// Forgets the highlighted node without touching any graph, for when the
    /// graph it pointed into has been dropped.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Makes `id` the highlighted node, clearing any previous one.
    pub fn select(&mut self, graph: &mut SceneGraph, id: SceneId, emissive: u32) {
        self.clear(graph);
        if let Some(node) = graph.node_mut(id) {
            node.material.emissive = emissive;
            self.current = Some(id);
        }
    }

    /// Clears the previous highlight, then highlights whatever `ray` hits.
    pub fn update(&mut self, graph: &mut SceneGraph, ray: &Ray, emissive: u32) -> Option<PickHit> {
        self.clear(graph);
        let hit = pick(graph, ray)?;
        self.select(graph, hit.node, emissive);
        Some(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prune::PruneSet;
    use crate::scene::{Material, NodeKind, SCENE_ROOT, SceneNode};
    use crate::template::SegmentTemplate;
    use crate::tree::Tree;
    use crate::view::{BranchDims, Solid, build_view};
    use glam::Affine3A;
    use std::sync::Arc;

    #[test]
    fn sphere_hits_front_surface() {
        let t = sphere(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec3::ZERO, 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!(sphere(Vec3::new(0.0, 3.0, -5.0), Vec3::Z, Vec3::ZERO, 1.0).is_none());
        assert!(sphere(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn cylinder_hits_side_and_caps() {
        let side = cylinder(Vec3::new(-5.0, 0.5, 0.0), Vec3::X, 0.5, 1.0).unwrap();
        assert!((side - 4.5).abs() < 1e-5);

        let cap = cylinder(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y, 0.5, 1.0).unwrap();
        assert!((cap - 4.0).abs() < 1e-5);

        // Passes above the top cap.
        assert!(cylinder(Vec3::new(-5.0, 1.5, 0.0), Vec3::X, 0.5, 1.0).is_none());
    }

    #[test]
    fn box_slab_test() {
        let t = aabb(Vec3::new(-3.0, 0.5, 0.0), Vec3::X, Vec3::splat(-1.0), Vec3::ONE).unwrap();
        assert!((t - 2.0).abs() < 1e-5);
        assert!(aabb(Vec3::new(-3.0, 2.0, 0.0), Vec3::X, Vec3::splat(-1.0), Vec3::ONE).is_none());
    }

    #[test]
    fn picks_the_trunk_from_the_side() {
        let tree = Tree::generate(12345);
        let graph = build_view(&tree, &PruneSet::new(), &Solid::default());
        let y = BranchDims::for_level(0).segment_length * 0.5;
        let ray = Ray::new(Vec3::new(-0.5, y, 0.0), Vec3::X);

        let hit = pick(&graph, &ray).unwrap();
        assert_eq!(hit.tag.id, tree.root().segments[0].id);
        assert_eq!(hit.tag.kind, NodeKind::Segment { branch: 0, index: 0 });
        assert!((hit.distance - 0.3).abs() < 1e-4);
    }

    #[test]
    fn untagged_primitives_are_not_pickable() {
        let mut graph = SceneGraph::default();
        graph.add(
            SCENE_ROOT,
            SceneNode::shape(
                Affine3A::IDENTITY,
                Primitive::Marker {
                    center: Vec3::ZERO,
                    size: 1.0,
                },
                Material::new(0xffffff),
            ),
        );
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(pick(&graph, &ray).is_none());
    }

    #[test]
    fn template_bounds_are_scaled() {
        let (shape, _) = SegmentTemplate::tapered(8, 0.5).unwrap();
        let prim = Primitive::Template {
            shape: Arc::new(shape),
            scale: Vec3::new(2.0, 3.0, 2.0),
        };
        assert!(prim.intersect(Vec3::new(-5.0, 2.5, 0.0), Vec3::X).is_some());
        assert!(prim.intersect(Vec3::new(-5.0, 3.5, 0.0), Vec3::X).is_none());
    }

    #[test]
    fn only_one_node_is_highlighted() {
        let tree = Tree::generate(12345);
        let mut graph = build_view(&tree, &PruneSet::new(), &Solid::default());
        let mut hl = Highlight::default();
        let y = BranchDims::for_level(0).segment_length * 0.5;

        let first = hl
            .update(&mut graph, &Ray::new(Vec3::new(-0.5, y, 0.0), Vec3::X), 0xffff00)
            .unwrap();
        assert_eq!(graph.nodes[first.node].material.emissive, 0xffff00);

        let miss = hl.update(
            &mut graph,
            &Ray::new(Vec3::new(-20.0, -50.0, 0.0), Vec3::X),
            0xffff00,
        );
        assert!(miss.is_none());
        assert_eq!(hl.current(), None);
        assert!(graph.nodes.iter().all(|n| n.material.emissive == 0));
    }
}
