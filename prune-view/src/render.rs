//! Paints scene graphs with the egui painter.
//!
//! There is no depth buffer: every primitive becomes one draw item tagged
//! with its view depth, and items are painted back to front.

use crate::camera::OrbitCamera;
use glam::{Affine3A, Vec3};
use prune_core::scene::{Material, Primitive, SceneGraph};

const SKY: u32 = 0x87ceeb;
const GROUND: u32 = 0x228b22;
const GROUND_HALF_EXTENT: f32 = 25.0;

/// Converts `0xRRGGBB` to an egui colour.
pub fn color(hex: u32) -> egui::Color32 {
    egui::Color32::from_rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Base colour with the emissive tint added on top.
pub fn material_color(m: &Material) -> egui::Color32 {
    let add = |shift: u32| {
        let base = (m.color >> shift) & 0xff;
        let glow = (m.emissive >> shift) & 0xff;
        (base + glow).min(0xff) as u8
    };
    egui::Color32::from_rgb(add(16), add(8), add(0))
}

fn scaled(c: egui::Color32, k: f32) -> egui::Color32 {
    let f = |v: u8| (v as f32 * k).clamp(0.0, 255.0) as u8;
    egui::Color32::from_rgb(f(c.r()), f(c.g()), f(c.b()))
}

struct DrawItem {
    depth: f32,
    shape: egui::Shape,
}

/// Projects and paints scene graphs for one frame.
pub struct SceneRenderer<'a> {
    camera: &'a OrbitCamera,
    rect: egui::Rect,
    focal: f32,
    light: Vec3,
    items: Vec<DrawItem>,
}

impl<'a> SceneRenderer<'a> {
    pub fn new(camera: &'a OrbitCamera, rect: egui::Rect) -> Self {
        Self {
            camera,
            rect,
            focal: camera.focal_px(rect),
            light: Vec3::new(5.0, 15.0, 10.0).normalize(),
            items: Vec::with_capacity(4096),
        }
    }

    fn project(&self, p: Vec3) -> Option<(egui::Pos2, f32)> {
        self.camera.world_to_screen(p, self.rect)
    }

    fn px(&self, world_size: f32, depth: f32) -> f32 {
        world_size * self.focal / depth
    }

    /// Queues every primitive of `graph`.
    pub fn add_graph(&mut self, graph: &SceneGraph) {
        let worlds = graph.world_transforms();
        for (node, world) in graph.nodes.iter().zip(worlds) {
            if let Some(primitive) = &node.primitive {
                self.add_primitive(primitive, &world, &node.material);
            }
        }
    }

    fn add_primitive(&mut self, primitive: &Primitive, world: &Affine3A, material: &Material) {
        let fill = material_color(material);
        match primitive {
            Primitive::Marker { center, size } => {
                let Some((p, depth)) = self.project(world.transform_point3(*center)) else {
                    return;
                };
                let r = self.px(size * 0.5, depth).max(1.5);
                self.items.push(DrawItem {
                    depth,
                    shape: egui::Shape::circle_filled(p, r, fill),
                });
            }

            Primitive::Cluster { center, radius } => {
                let Some((p, depth)) = self.project(world.transform_point3(*center)) else {
                    return;
                };
                let r = self.px(*radius, depth).max(1.0);
                self.items.push(DrawItem {
                    depth,
                    shape: egui::Shape::Vec(vec![
                        egui::Shape::circle_filled(p, r, fill),
                        egui::Shape::circle_stroke(p, r, egui::Stroke::new(1.0, scaled(fill, 0.6))),
                    ]),
                });
            }

            Primitive::Cylinder { radius, length } => {
                let base = world.transform_point3(Vec3::ZERO);
                let top = world.transform_point3(Vec3::new(0.0, *length, 0.0));
                let (Some((a, da)), Some((b, db))) = (self.project(base), self.project(top))
                else {
                    return;
                };
                let depth = (da + db) * 0.5;
                let width = self.px(radius * 2.0, depth).max(1.0);
                self.items.push(DrawItem {
                    depth,
                    shape: egui::Shape::Vec(vec![
                        egui::Shape::line_segment([a, b], egui::Stroke::new(width, fill)),
                        egui::Shape::circle_filled(a, width * 0.5, fill),
                        egui::Shape::circle_filled(b, width * 0.5, fill),
                    ]),
                });
            }

            Primitive::Template { shape, scale } => {
                for tri in shape.triangles() {
                    let w = tri.map(|v| world.transform_point3(v * *scale));
                    let (Some(a), Some(b), Some(c)) =
                        (self.project(w[0]), self.project(w[1]), self.project(w[2]))
                    else {
                        continue;
                    };
                    let normal = (w[1] - w[0]).cross(w[2] - w[0]).normalize_or_zero();
                    let lit = 0.45 + 0.55 * normal.dot(self.light).abs();
                    self.items.push(DrawItem {
                        depth: (a.1 + b.1 + c.1) / 3.0,
                        shape: egui::Shape::convex_polygon(
                            vec![a.0, b.0, c.0],
                            scaled(fill, lit),
                            egui::Stroke::NONE,
                        ),
                    });
                }
            }
        }
    }

    fn ground(&self) -> Option<egui::Shape> {
        let h = GROUND_HALF_EXTENT;
        let corners = [
            Vec3::new(-h, 0.0, -h),
            Vec3::new(h, 0.0, -h),
            Vec3::new(h, 0.0, h),
            Vec3::new(-h, 0.0, h),
        ];
        let points = corners
            .iter()
            .map(|&c| self.project(c).map(|(p, _)| p))
            .collect::<Option<Vec<_>>>()?;
        Some(egui::Shape::convex_polygon(
            points,
            color(GROUND),
            egui::Stroke::NONE,
        ))
    }

    /// Paints sky, ground and all queued items, farthest first.
    pub fn finish(mut self, painter: &egui::Painter) -> usize {
        painter.rect_filled(self.rect, 0.0, color(SKY));
        if let Some(ground) = self.ground() {
            painter.add(ground);
        }
        self.items.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        let count = self.items.len();
        painter.extend(self.items.into_iter().map(|item| item.shape));
        count
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prune_core::prune::PruneSet;
    use prune_core::tree::Tree;
    use prune_core::view::{Solid, build_view};

    #[test]
    fn hex_colors_convert() {
        assert_eq!(color(0x8b4513), egui::Color32::from_rgb(0x8b, 0x45, 0x13));
    }

    #[test]
    fn emissive_saturates() {
        let m = Material {
            color: 0x8b4513,
            emissive: 0xffff00,
        };
        assert_eq!(material_color(&m), egui::Color32::from_rgb(0xff, 0xff, 0x13));
    }

    #[test]
    fn every_visible_primitive_is_queued() {
        let camera = OrbitCamera {
            distance: 150.0,
            ..OrbitCamera::default()
        };
        let rect = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));
        let tree = Tree::generate(12345);
        let graph = build_view(&tree, &PruneSet::new(), &Solid::default());

        let mut r = SceneRenderer::new(&camera, rect);
        r.add_graph(&graph);
        // Far enough out that nothing reaches the near plane.
        assert_eq!(r.len(), graph.primitive_count());
    }
}
