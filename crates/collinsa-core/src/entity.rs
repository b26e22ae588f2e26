//! The entity record: shape, material, inertia and kinematic state.

use crate::aabb::Aabb;
use crate::error::ShapeError;
use crate::id::EntityId;
use crate::inertia::Inertia;
use crate::material::Material;
use crate::math::{Vec2Ext, Vec2d, Vec2f};
use crate::shape::{Polygon, Shape};

/// How an entity takes part in collision processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollisionType {
    /// Ordinary dynamic body.
    #[default]
    Classic,
    /// Immune to forces and impulses, but still moves with its own
    /// velocity and still collides with others.
    Kinematic,
    /// Integrated and drawn but never produces collision candidates.
    Ignore,
}

/// A simulated body.
///
/// Fields are private so that every change to position, rotation or shape
/// goes through a method that refreshes the cached [`Aabb`]. Cloning keeps
/// the [`EntityId`]: a clone is the same entity in another tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    shape: Shape,
    material: Material,
    mass_override: Option<f64>,
    inertia: Inertia,
    collision: CollisionType,
    position: Vec2d,
    velocity: Vec2d,
    acceleration: Vec2d,
    rotation: f64,
    angular_velocity: f64,
    angular_acceleration: f64,
    aabb: Aabb,
    active: bool,
    lifespan: Option<f64>,
}

impl Entity {
    /// New entity at rest at `position`, with a fresh id and inertia
    /// derived from the shape and the material density.
    pub fn new(shape: Shape, material: Material, position: Vec2d) -> Self {
        let inertia = Inertia::from_shape(&shape, material.density);
        let aabb = shape.aabb(position, 0.0);
        Self {
            id: EntityId::next(),
            shape,
            material,
            mass_override: None,
            inertia,
            collision: CollisionType::Classic,
            position,
            velocity: Vec2d::ZERO,
            acceleration: Vec2d::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            aabb,
            active: true,
            lifespan: None,
        }
    }

    /// Circle of `radius` centred at `position`.
    pub fn circle(radius: f64, material: Material, position: Vec2d) -> Result<Self, ShapeError> {
        Ok(Self::new(Shape::circle(radius)?, material, position))
    }

    /// Rectangle centred at `position`.
    pub fn rect(
        width: f64,
        height: f64,
        material: Material,
        position: Vec2d,
    ) -> Result<Self, ShapeError> {
        Ok(Self::new(Shape::rect(width, height)?, material, position))
    }

    /// Polygon from world-space vertices. The entity is placed at the
    /// polygon's centroid; convexity picks the shape variant.
    pub fn polygon(vertices: Vec<Vec2d>, material: Material) -> Result<Self, ShapeError> {
        let (_, centroid) = Polygon::new(vertices.clone())?;
        let shape = match Shape::convex_polygon(vertices.clone()) {
            Ok(shape) => shape,
            Err(ShapeError::NotConvex { .. }) => Shape::concave_polygon(vertices)?,
            Err(e) => return Err(e),
        };
        Ok(Self::new(shape, material, centroid))
    }

    // ── Builders ────────────────────────────────────────────────

    /// Set the initial velocity.
    pub fn with_velocity(mut self, velocity: Vec2d) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the initial rotation angle.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.set_rotation(rotation);
        self
    }

    /// Set the initial angular velocity.
    pub fn with_angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Set the collision type.
    pub fn with_collision(mut self, collision: CollisionType) -> Self {
        self.set_collision(collision);
        self
    }

    /// Override the density-derived mass. Rotational inertia is scaled to
    /// keep the same distribution over the shape.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass_override = Some(mass);
        self.refresh_inertia();
        self
    }

    /// Give the entity a finite lifespan in seconds.
    pub fn with_lifespan(mut self, seconds: f64) -> Self {
        self.lifespan = Some(seconds);
        self
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Geometry.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Material.
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Mass properties.
    pub fn inertia(&self) -> &Inertia {
        &self.inertia
    }

    /// Collision type.
    pub fn collision(&self) -> CollisionType {
        self.collision
    }

    /// Centre of mass in world space.
    pub fn position(&self) -> Vec2d {
        self.position
    }

    /// Linear velocity.
    pub fn velocity(&self) -> Vec2d {
        self.velocity
    }

    /// Linear acceleration accumulated this step.
    pub fn acceleration(&self) -> Vec2d {
        self.acceleration
    }

    /// Rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Angular velocity in radians per second.
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Angular acceleration accumulated this step.
    pub fn angular_acceleration(&self) -> f64 {
        self.angular_acceleration
    }

    /// Cached world-space bounding box.
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Whether the entity is simulated. Inactive entities stay in the
    /// world and are drawn, but neither move nor react to forces.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remaining lifespan in seconds, `None` if immortal.
    pub fn lifespan(&self) -> Option<f64> {
        self.lifespan
    }

    /// Whether the collision type is [`CollisionType::Kinematic`].
    pub fn is_kinematic(&self) -> bool {
        self.collision == CollisionType::Kinematic
    }

    /// Whether forces currently have any effect on this entity.
    pub fn responds_to_forces(&self) -> bool {
        self.active && !self.is_kinematic()
    }

    /// Whether the lifespan has run out.
    pub fn is_expired(&self) -> bool {
        self.lifespan.is_some_and(|l| l <= 0.0)
    }

    // ── Mutators ────────────────────────────────────────────────

    /// Move the entity.
    pub fn set_position(&mut self, position: Vec2d) {
        self.position = position;
        self.refresh_aabb();
    }

    /// Replace the linear velocity.
    pub fn set_velocity(&mut self, velocity: Vec2d) {
        self.velocity = velocity;
    }

    /// Rotate the entity to an absolute angle.
    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
        self.refresh_aabb();
    }

    /// Replace the angular velocity.
    pub fn set_angular_velocity(&mut self, angular_velocity: f64) {
        self.angular_velocity = angular_velocity;
    }

    /// Replace the geometry. Inertia and AABB follow.
    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
        self.refresh_inertia();
        self.refresh_aabb();
    }

    /// Replace the material. Inertia follows the new density unless the
    /// mass was overridden.
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
        self.refresh_inertia();
    }

    /// Change the collision type.
    pub fn set_collision(&mut self, collision: CollisionType) {
        self.collision = collision;
        self.refresh_inertia();
    }

    /// Freeze or unfreeze the entity.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Accumulate a force through the centre of mass.
    pub fn add_force(&mut self, force: Vec2d) {
        self.acceleration += force * self.inertia.mass_inverse;
    }

    /// Accumulate a torque.
    pub fn add_torque(&mut self, torque: f64) {
        self.angular_acceleration += torque * self.inertia.j_inverse;
    }

    /// Accumulate a force applied at `offset` from the centre of mass.
    pub fn add_force_at(&mut self, force: Vec2d, offset: Vec2d) {
        self.add_force(force);
        self.add_torque(offset.cross(force));
    }

    /// Advance by `dt` with symplectic Euler, then clear the per-step
    /// accelerations and refresh the AABB.
    ///
    /// Inactive entities keep their state; only accumulated accelerations
    /// are discarded. Lifespan counts down only while active.
    pub fn update(&mut self, dt: f64) {
        if self.active {
            self.velocity += self.acceleration * dt;
            self.position += self.velocity * dt;
            self.angular_velocity += self.angular_acceleration * dt;
            self.rotation += self.angular_velocity * dt;
            if let Some(l) = self.lifespan.as_mut() {
                *l -= dt;
            }
            self.refresh_aabb();
        }
        self.acceleration = Vec2d::ZERO;
        self.angular_acceleration = 0.0;
    }

    /// Run the emitter clock and build any entities due this step.
    ///
    /// Spawned entities leave from the emitter's rim along its rotation
    /// angle at the emitter's speed plus its own velocity. Non-emitters and
    /// inactive emitters return nothing.
    pub fn emit(&mut self, dt: f64) -> Vec<Entity> {
        if !self.active {
            return Vec::new();
        }
        let Shape::Emitter(emitter) = &mut self.shape else {
            return Vec::new();
        };
        let due = emitter.advance(dt);
        if due == 0 {
            return Vec::new();
        }
        let template = emitter.template();
        let direction = Vec2d::X.rotated(self.rotation);
        let offset = emitter.radius() + template.shape.maximum_size();
        let spawn_at = self.position + direction * offset;
        let spawn_velocity = self.velocity + direction * emitter.speed();
        // Several spawns in one step are staggered as if released evenly
        // across it, the earliest furthest along.
        let spacing = dt.max(0.0) / f64::from(due);
        (0..due)
            .map(|k| {
                let mut e = Entity::new(
                    (*template.shape).clone(),
                    template.material.clone(),
                    spawn_at + spawn_velocity * (spacing * f64::from(k)),
                )
                .with_velocity(spawn_velocity)
                .with_rotation(self.rotation)
                .with_collision(template.collision);
                e.lifespan = template.lifespan;
                e
            })
            .collect()
    }

    /// World-space outline at render precision.
    pub fn outline(&self) -> Vec<Vec2f> {
        self.shape.outline(self.position, self.rotation)
    }

    /// Distance from the centre of mass to `point`.
    pub fn distance_to(&self, point: Vec2d) -> f64 {
        self.position.distance(point)
    }

    fn refresh_aabb(&mut self) {
        self.aabb = self.shape.aabb(self.position, self.rotation);
    }

    fn refresh_inertia(&mut self) {
        let base = Inertia::from_shape(&self.shape, self.material.density);
        let inertia = match self.mass_override {
            Some(mass) if base.mass > 0.0 => Inertia::new(mass, base.j * mass / base.mass),
            Some(mass) => Inertia::new(mass, 0.0),
            None => base,
        };
        self.inertia = if self.is_kinematic() {
            inertia.pinned()
        } else {
            inertia
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Emitter, EmitterTemplate};

    fn ball(x: f64, y: f64) -> Entity {
        Entity::circle(5.0, Material::default(), Vec2d::new(x, y)).unwrap()
    }

    #[test]
    fn new_entity_has_fresh_aabb_and_id() {
        let a = ball(100.0, 100.0);
        let b = ball(100.0, 100.0);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.aabb().min, Vec2d::new(95.0, 95.0));
        assert_eq!(a.aabb().max, Vec2d::new(105.0, 105.0));
    }

    #[test]
    fn clone_keeps_id() {
        let a = ball(0.0, 0.0);
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn setters_refresh_aabb() {
        let mut e = Entity::rect(4.0, 2.0, Material::default(), Vec2d::ZERO).unwrap();
        e.set_position(Vec2d::new(10.0, 0.0));
        assert_eq!(e.aabb().center(), Vec2d::new(10.0, 0.0));
        e.set_rotation(std::f64::consts::FRAC_PI_2);
        assert!((e.aabb().width() - 2.0).abs() < 1e-9);
        assert!((e.aabb().height() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn update_is_symplectic_euler() {
        let mut e = ball(0.0, 0.0);
        e.acceleration = Vec2d::new(1.0, 0.0);
        e.update(1.0);
        // Velocity first, then position uses the new velocity.
        assert_eq!(e.velocity(), Vec2d::new(1.0, 0.0));
        assert_eq!(e.position(), Vec2d::new(1.0, 0.0));
        assert_eq!(e.acceleration(), Vec2d::ZERO);
    }

    #[test]
    fn constant_velocity_one_second() {
        let mut e = ball(100.0, 100.0).with_velocity(Vec2d::new(50.0, 0.0));
        for _ in 0..60 {
            e.update(1.0 / 60.0);
        }
        assert!((e.position() - Vec2d::new(150.0, 100.0)).length() < 1e-9);
        assert!((e.aabb().center() - e.position()).length() < 1e-12);
    }

    #[test]
    fn kinematic_ignores_forces_but_moves() {
        let mut e = ball(0.0, 0.0)
            .with_collision(CollisionType::Kinematic)
            .with_velocity(Vec2d::new(1.0, 0.0));
        assert!(e.inertia().mass > 0.0);
        e.add_force(Vec2d::new(0.0, 1e6));
        e.add_torque(1e6);
        e.update(1.0);
        assert_eq!(e.velocity(), Vec2d::new(1.0, 0.0));
        assert_eq!(e.position(), Vec2d::new(1.0, 0.0));
        assert_eq!(e.angular_velocity(), 0.0);
    }

    #[test]
    fn inactive_entity_is_frozen() {
        let mut e = ball(0.0, 0.0)
            .with_velocity(Vec2d::new(3.0, 0.0))
            .with_lifespan(1.0);
        e.set_active(false);
        e.add_force(Vec2d::new(10.0, 0.0));
        e.update(0.5);
        assert_eq!(e.position(), Vec2d::ZERO);
        assert_eq!(e.lifespan(), Some(1.0));
        assert_eq!(e.acceleration(), Vec2d::ZERO);
    }

    #[test]
    fn lifespan_expires() {
        let mut e = ball(0.0, 0.0).with_lifespan(0.1);
        assert!(!e.is_expired());
        for _ in 0..7 {
            e.update(1.0 / 60.0);
        }
        assert!(e.is_expired());
    }

    #[test]
    fn with_mass_keeps_distribution() {
        let e = ball(0.0, 0.0).with_mass(10.0);
        assert_eq!(e.inertia().mass, 10.0);
        assert!((e.inertia().j - 0.5 * 10.0 * 25.0).abs() < 1e-9);
    }

    #[test]
    fn polygon_entity_sits_at_centroid() {
        let e = Entity::polygon(
            vec![
                Vec2d::new(10.0, 10.0),
                Vec2d::new(14.0, 10.0),
                Vec2d::new(14.0, 14.0),
                Vec2d::new(10.0, 14.0),
            ],
            Material::default(),
        )
        .unwrap();
        assert!((e.position() - Vec2d::new(12.0, 12.0)).length() < 1e-9);
        assert!((e.aabb().min - Vec2d::new(10.0, 10.0)).length() < 1e-9);
    }

    #[test]
    fn emitter_spawns_along_facing() {
        let template = EmitterTemplate {
            shape: Box::new(Shape::circle(1.0).unwrap()),
            material: Material::default(),
            collision: CollisionType::Ignore,
            lifespan: Some(2.0),
        };
        let emitter = Emitter::new(3.0, template, 60.0, 10.0).unwrap();
        let mut e = Entity::new(Shape::Emitter(emitter), Material::default(), Vec2d::ZERO);
        let spawned = e.emit(1.0 / 60.0 + 1e-9);
        assert_eq!(spawned.len(), 1);
        let child = &spawned[0];
        assert_ne!(child.id(), e.id());
        assert_eq!(child.position(), Vec2d::new(4.0, 0.0));
        assert_eq!(child.velocity(), Vec2d::new(10.0, 0.0));
        assert_eq!(child.collision(), CollisionType::Ignore);
        assert_eq!(child.lifespan(), Some(2.0));
        assert!(ball(0.0, 0.0).emit(1.0).is_empty());
    }

    #[test]
    fn burst_spawns_are_staggered_along_velocity() {
        let template = EmitterTemplate {
            shape: Box::new(Shape::circle(1.0).unwrap()),
            material: Material::default(),
            collision: CollisionType::Classic,
            lifespan: None,
        };
        let emitter = Emitter::new(3.0, template, 4.0, 10.0).unwrap();
        let mut e = Entity::new(Shape::Emitter(emitter), Material::default(), Vec2d::ZERO);
        let spawned = e.emit(1.0);
        assert_eq!(spawned.len(), 4);
        let xs: Vec<f64> = spawned.iter().map(|c| c.position().x).collect();
        for (k, x) in xs.iter().enumerate() {
            assert!((x - (4.0 + 2.5 * k as f64)).abs() < 1e-12, "{xs:?}");
        }
    }
}
