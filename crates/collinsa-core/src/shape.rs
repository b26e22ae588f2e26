//! Shape variants and their geometric capabilities.
//!
//! [`Shape`] is a tagged enum over the supported geometries. Every
//! geometric question the rest of the kernel asks (area, second moment,
//! bounding radius, world-space AABB, outline for drawing) is a method on
//! the enum, so adding a shape means adding one arm per method.
//!
//! All geometry is local: a shape is centred on its entity's position,
//! which is the centroid for polygons.

use std::f64::consts::PI;

use crate::aabb::Aabb;
use crate::entity::CollisionType;
use crate::error::ShapeError;
use crate::material::Material;
use crate::math::{Vec2Ext, Vec2d, Vec2f};

/// Number of segments used to outline a circle.
pub const CIRCLE_SEGMENTS: usize = 24;

/// Upper bound on entities one emitter releases in a single step.
pub const MAX_EMISSIONS_PER_STEP: u32 = 64;

/// Discriminant of [`Shape`], for callers that only need the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// [`Shape::Circle`].
    Circle,
    /// [`Shape::Rect`].
    Rect,
    /// [`Shape::ConvexPoly`].
    ConvexPoly,
    /// [`Shape::ConcavePoly`].
    ConcavePoly,
    /// [`Shape::Emitter`].
    Emitter,
}

/// A disk.
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    /// Radius.
    pub radius: f64,
}

/// An axis-aligned (before rotation) rectangle centred on the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    /// Extent along local x.
    pub width: f64,
    /// Extent along local y.
    pub height: f64,
}

/// A simple polygon whose centroid is the local origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2d>,
    area: f64,
    second_moment: f64,
}

impl Polygon {
    /// Build from vertices in either winding order.
    ///
    /// The vertices are translated so the centroid sits at the origin.
    /// Returns the polygon and the centroid of the input vertices, so
    /// callers placing a polygon given in world coordinates can use it as
    /// the entity position.
    pub fn new(vertices: Vec<Vec2d>) -> Result<(Self, Vec2d), ShapeError> {
        if vertices.len() < 3 {
            return Err(ShapeError::TooFewVertices {
                count: vertices.len(),
            });
        }
        let n = vertices.len();
        let mut twice_area = 0.0;
        let mut c = Vec2d::ZERO;
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let cross = a.cross(b);
            twice_area += cross;
            c += (a + b) * cross;
        }
        if twice_area.abs() < 1e-12 || !twice_area.is_finite() {
            return Err(ShapeError::DegeneratePolygon);
        }
        let centroid = c / (3.0 * twice_area);
        let local: Vec<Vec2d> = vertices.iter().map(|v| *v - centroid).collect();

        // Triangle-fan integration of r² about the centroid. The signed sum
        // is exact for any simple polygon, convex or not.
        let mut moment = 0.0;
        for i in 0..n {
            let a = local[i];
            let b = local[(i + 1) % n];
            moment += a.cross(b) * (a.dot(a) + a.dot(b) + b.dot(b));
        }
        Ok((
            Self {
                vertices: local,
                area: twice_area.abs() * 0.5,
                second_moment: (moment / 12.0).abs(),
            },
            centroid,
        ))
    }

    /// Regular polygon with `sides` vertices on a circle of `radius`.
    pub fn regular(radius: f64, sides: usize) -> Result<Self, ShapeError> {
        check_dimension("radius", radius)?;
        let verts = (0..sides)
            .map(|i| {
                let theta = 2.0 * PI * i as f64 / sides as f64;
                Vec2d::new(radius * theta.cos(), radius * theta.sin())
            })
            .collect();
        Self::new(verts).map(|(p, _)| p)
    }

    /// Local vertices, centroid at the origin.
    pub fn vertices(&self) -> &[Vec2d] {
        &self.vertices
    }

    /// Index of the first reflex vertex, if any.
    fn first_reflex_vertex(&self) -> Option<usize> {
        let n = self.vertices.len();
        let mut sign = 0.0f64;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let c = self.vertices[(i + 2) % n];
            let turn = (b - a).cross(c - b);
            if turn.abs() < 1e-12 {
                continue;
            }
            if sign == 0.0 {
                sign = turn.signum();
            } else if turn.signum() != sign {
                return Some((i + 1) % n);
            }
        }
        None
    }
}

/// What an [`Emitter`] spawns.
#[derive(Clone, Debug, PartialEq)]
pub struct EmitterTemplate {
    /// Shape of each spawned entity. Must not itself be an emitter.
    pub shape: Box<Shape>,
    /// Material of each spawned entity.
    pub material: Material,
    /// Collision type of each spawned entity.
    pub collision: CollisionType,
    /// Lifespan of each spawned entity in seconds.
    pub lifespan: Option<f64>,
}

/// A small disk that periodically spawns template entities along its
/// facing direction.
#[derive(Clone, Debug, PartialEq)]
pub struct Emitter {
    radius: f64,
    template: EmitterTemplate,
    rate: f64,
    speed: f64,
    accumulator: f64,
}

impl Emitter {
    /// Emitter of the given body radius spawning `rate` entities per
    /// second at `speed` along its rotation angle.
    pub fn new(
        radius: f64,
        template: EmitterTemplate,
        rate: f64,
        speed: f64,
    ) -> Result<Self, ShapeError> {
        check_dimension("radius", radius)?;
        if matches!(*template.shape, Shape::Emitter(_)) {
            return Err(ShapeError::NestedEmitter);
        }
        if !rate.is_finite() || rate < 0.0 {
            return Err(ShapeError::InvalidEmission {
                reason: format!("rate must be finite and >= 0, got {rate}"),
            });
        }
        if !speed.is_finite() || speed < 0.0 {
            return Err(ShapeError::InvalidEmission {
                reason: format!("speed must be finite and >= 0, got {speed}"),
            });
        }
        Ok(Self {
            radius,
            template,
            rate,
            speed,
            accumulator: 0.0,
        })
    }

    /// Body radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Spawn template.
    pub fn template(&self) -> &EmitterTemplate {
        &self.template
    }

    /// Spawns per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Launch speed of spawned entities.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Advance the emission clock by `dt` and return how many entities
    /// are due. Fractional emissions carry over to the next call; whole
    /// emissions beyond [`MAX_EMISSIONS_PER_STEP`] are discarded.
    pub fn advance(&mut self, dt: f64) -> u32 {
        self.accumulator += self.rate * dt.max(0.0);
        let due = self.accumulator.floor();
        self.accumulator -= due;
        if due > f64::from(MAX_EMISSIONS_PER_STEP) {
            log::warn!("emitter capped at {MAX_EMISSIONS_PER_STEP} of {due} due spawns");
            return MAX_EMISSIONS_PER_STEP;
        }
        due as u32
    }
}

/// The geometry of an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// A disk.
    Circle(Circle),
    /// A rectangle.
    Rect(Rect),
    /// A convex polygon.
    ConvexPoly(Polygon),
    /// A simple, possibly concave polygon.
    ConcavePoly(Polygon),
    /// A spawner of other entities.
    Emitter(Emitter),
}

fn check_dimension(name: &'static str, value: f64) -> Result<(), ShapeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ShapeError::InvalidDimension { name, value })
    }
}

impl Shape {
    /// Disk of the given radius.
    pub fn circle(radius: f64) -> Result<Self, ShapeError> {
        check_dimension("radius", radius)?;
        Ok(Self::Circle(Circle { radius }))
    }

    /// Rectangle of the given size.
    pub fn rect(width: f64, height: f64) -> Result<Self, ShapeError> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        Ok(Self::Rect(Rect { width, height }))
    }

    /// Convex polygon. Rejects polygons with a reflex vertex.
    pub fn convex_polygon(vertices: Vec<Vec2d>) -> Result<Self, ShapeError> {
        let (poly, _) = Polygon::new(vertices)?;
        if let Some(vertex) = poly.first_reflex_vertex() {
            return Err(ShapeError::NotConvex { vertex });
        }
        Ok(Self::ConvexPoly(poly))
    }

    /// Simple polygon, convex or concave. Self-intersection is not checked.
    pub fn concave_polygon(vertices: Vec<Vec2d>) -> Result<Self, ShapeError> {
        let (poly, _) = Polygon::new(vertices)?;
        Ok(Self::ConcavePoly(poly))
    }

    /// Regular convex polygon.
    pub fn regular_polygon(radius: f64, sides: usize) -> Result<Self, ShapeError> {
        Ok(Self::ConvexPoly(Polygon::regular(radius, sides)?))
    }

    /// Emitter body; see [`Emitter::new`].
    pub fn emitter(
        radius: f64,
        template: EmitterTemplate,
        rate: f64,
        speed: f64,
    ) -> Result<Self, ShapeError> {
        Ok(Self::Emitter(Emitter::new(radius, template, rate, speed)?))
    }

    /// The variant tag.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Circle(_) => ShapeKind::Circle,
            Self::Rect(_) => ShapeKind::Rect,
            Self::ConvexPoly(_) => ShapeKind::ConvexPoly,
            Self::ConcavePoly(_) => ShapeKind::ConcavePoly,
            Self::Emitter(_) => ShapeKind::Emitter,
        }
    }

    /// Area (the 2D "volume").
    pub fn area(&self) -> f64 {
        match self {
            Self::Circle(c) => PI * c.radius * c.radius,
            Self::Rect(r) => r.width * r.height,
            Self::ConvexPoly(p) | Self::ConcavePoly(p) => p.area,
            Self::Emitter(e) => PI * e.radius * e.radius,
        }
    }

    /// Polar second moment of area about the centroid, `∫ r² dA`.
    ///
    /// Multiplied by density this is the rotational inertia J.
    pub fn second_moment(&self) -> f64 {
        match self {
            Self::Circle(c) => 0.5 * PI * c.radius.powi(4),
            Self::Rect(r) => r.width * r.height * (r.width * r.width + r.height * r.height) / 12.0,
            Self::ConvexPoly(p) | Self::ConcavePoly(p) => p.second_moment,
            Self::Emitter(e) => 0.5 * PI * e.radius.powi(4),
        }
    }

    /// Distance from the centre to the farthest point of the shape.
    pub fn maximum_size(&self) -> f64 {
        match self {
            Self::Circle(c) => c.radius,
            Self::Rect(r) => 0.5 * (r.width * r.width + r.height * r.height).sqrt(),
            Self::ConvexPoly(p) | Self::ConcavePoly(p) => p
                .vertices
                .iter()
                .map(|v| v.length())
                .fold(0.0, f64::max),
            Self::Emitter(e) => e.radius,
        }
    }

    /// World-space bounding box at `position`, rotated by `rotation`.
    pub fn aabb(&self, position: Vec2d, rotation: f64) -> Aabb {
        match self {
            Self::Circle(Circle { radius }) | Self::Emitter(Emitter { radius, .. }) => {
                Aabb::from_center(position, Vec2d::splat(*radius))
            }
            Self::Rect(r) => {
                let (sin, cos) = rotation.sin_cos();
                let hw = 0.5 * r.width;
                let hh = 0.5 * r.height;
                let half = Vec2d::new(
                    (hw * cos).abs() + (hh * sin).abs(),
                    (hw * sin).abs() + (hh * cos).abs(),
                );
                Aabb::from_center(position, half)
            }
            Self::ConvexPoly(p) | Self::ConcavePoly(p) => {
                Aabb::from_points(p.vertices.iter().map(|v| position + v.rotated(rotation)))
                    .unwrap_or(Aabb::from_center(position, Vec2d::ZERO))
            }
        }
    }

    /// Closed outline in world space at render precision.
    ///
    /// Circles are approximated by [`CIRCLE_SEGMENTS`] points; polygons
    /// and rectangles return their corners in order.
    pub fn outline(&self, position: Vec2d, rotation: f64) -> Vec<Vec2f> {
        match self {
            Self::Circle(Circle { radius }) | Self::Emitter(Emitter { radius, .. }) => {
                (0..CIRCLE_SEGMENTS)
                    .map(|i| {
                        let theta = rotation + 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
                        (position + Vec2d::new(theta.cos(), theta.sin()) * *radius).to_render()
                    })
                    .collect()
            }
            Self::Rect(r) => {
                let hw = 0.5 * r.width;
                let hh = 0.5 * r.height;
                [
                    Vec2d::new(-hw, -hh),
                    Vec2d::new(hw, -hh),
                    Vec2d::new(hw, hh),
                    Vec2d::new(-hw, hh),
                ]
                .iter()
                .map(|c| (position + c.rotated(rotation)).to_render())
                .collect()
            }
            Self::ConvexPoly(p) | Self::ConcavePoly(p) => p
                .vertices
                .iter()
                .map(|v| (position + v.rotated(rotation)).to_render())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Vec2d> {
        vec![
            Vec2d::new(0.0, 0.0),
            Vec2d::new(side, 0.0),
            Vec2d::new(side, side),
            Vec2d::new(0.0, side),
        ]
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            Shape::circle(0.0),
            Err(ShapeError::InvalidDimension { name: "radius", .. })
        ));
        assert!(Shape::circle(f64::NAN).is_err());
        assert!(Shape::rect(1.0, -2.0).is_err());
    }

    #[test]
    fn polygon_is_recentred_on_centroid() {
        let (poly, centroid) = Polygon::new(square(2.0)).unwrap();
        assert!((centroid - Vec2d::new(1.0, 1.0)).length() < 1e-12);
        let sum: Vec2d = poly.vertices().iter().copied().sum();
        assert!(sum.length() < 1e-12);
    }

    #[test]
    fn square_polygon_matches_rect_moments() {
        let poly = Shape::convex_polygon(square(2.0)).unwrap();
        let rect = Shape::rect(2.0, 2.0).unwrap();
        assert!((poly.area() - rect.area()).abs() < 1e-12);
        assert!((poly.second_moment() - rect.second_moment()).abs() < 1e-9);
    }

    #[test]
    fn winding_order_does_not_matter() {
        let mut cw = square(3.0);
        cw.reverse();
        let a = Shape::convex_polygon(square(3.0)).unwrap();
        let b = Shape::convex_polygon(cw).unwrap();
        assert!((a.area() - b.area()).abs() < 1e-12);
        assert!((a.second_moment() - b.second_moment()).abs() < 1e-9);
    }

    #[test]
    fn concave_polygon_rejected_as_convex() {
        let arrow = vec![
            Vec2d::new(0.0, 0.0),
            Vec2d::new(4.0, 0.0),
            Vec2d::new(4.0, 4.0),
            Vec2d::new(2.0, 1.0),
            Vec2d::new(0.0, 4.0),
        ];
        assert!(matches!(
            Shape::convex_polygon(arrow.clone()),
            Err(ShapeError::NotConvex { .. })
        ));
        let concave = Shape::concave_polygon(arrow).unwrap();
        assert_eq!(concave.kind(), ShapeKind::ConcavePoly);
        // 16 minus the notch triangle (base 4, height 3).
        assert!((concave.area() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_polygons_rejected() {
        assert!(matches!(
            Polygon::new(vec![Vec2d::ZERO, Vec2d::X]),
            Err(ShapeError::TooFewVertices { count: 2 })
        ));
        assert!(matches!(
            Polygon::new(vec![Vec2d::ZERO, Vec2d::X, Vec2d::X * 2.0]),
            Err(ShapeError::DegeneratePolygon)
        ));
    }

    #[test]
    fn rotated_rect_aabb_grows() {
        let r = Shape::rect(2.0, 2.0).unwrap();
        let flat = r.aabb(Vec2d::ZERO, 0.0);
        let diag = r.aabb(Vec2d::ZERO, std::f64::consts::FRAC_PI_4);
        assert!((flat.width() - 2.0).abs() < 1e-12);
        assert!((diag.width() - 2.0 * 2f64.sqrt()).abs() < 1e-9);
        assert!(diag.width() <= 2.0 * r.maximum_size() + 1e-9);
    }

    #[test]
    fn outline_points_lie_on_circle() {
        let c = Shape::circle(3.0).unwrap();
        let pts = c.outline(Vec2d::new(10.0, 10.0), 0.0);
        assert_eq!(pts.len(), CIRCLE_SEGMENTS);
        for p in pts {
            assert!(((p - Vec2f::new(10.0, 10.0)).length() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn emitter_accumulates_fractional_emissions() {
        let template = EmitterTemplate {
            shape: Box::new(Shape::circle(1.0).unwrap()),
            material: Material::default(),
            collision: CollisionType::Classic,
            lifespan: Some(1.0),
        };
        let mut e = Emitter::new(2.0, template, 10.0, 5.0).unwrap();
        let total: u32 = (0..60).map(|_| e.advance(1.0 / 60.0)).sum();
        // 10/s for one second, allowing for float rounding on the boundary.
        assert!((9..=10).contains(&total), "{total}");
    }

    #[test]
    fn emitter_caps_spawns_per_step() {
        let template = EmitterTemplate {
            shape: Box::new(Shape::circle(1.0).unwrap()),
            material: Material::default(),
            collision: CollisionType::Classic,
            lifespan: None,
        };
        let mut e = Emitter::new(2.0, template, 1e12, 5.0).unwrap();
        assert_eq!(e.advance(1.0), MAX_EMISSIONS_PER_STEP);
        assert_eq!(e.advance(0.0), 0);
    }

    #[test]
    fn emitter_cannot_nest() {
        let inner = Emitter::new(
            1.0,
            EmitterTemplate {
                shape: Box::new(Shape::circle(1.0).unwrap()),
                material: Material::default(),
                collision: CollisionType::Classic,
                lifespan: None,
            },
            1.0,
            1.0,
        )
        .unwrap();
        let nested = EmitterTemplate {
            shape: Box::new(Shape::Emitter(inner)),
            material: Material::default(),
            collision: CollisionType::Classic,
            lifespan: None,
        };
        assert_eq!(
            Emitter::new(1.0, nested, 1.0, 1.0),
            Err(ShapeError::NestedEmitter)
        );
    }
}
