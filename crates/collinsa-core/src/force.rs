//! Force generators.
//!
//! A [`Force`] names the entities it acts on by [`EntityId`] and resolves
//! them through a [`BodyLookup`] at apply time. A force whose target (or
//! required source) is missing simply does nothing, so forces can outlive
//! the entities they were created for without dangling.
//!
//! Forces with no target are *global*: the caller applies them to every
//! live entity with [`Force::apply_to`].

use indexmap::IndexMap;

use crate::entity::Entity;
use crate::id::{EntityId, ForceId};
use crate::math::Vec2d;

/// Newton's gravitational constant in SI units.
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674e-11;

/// Separations below this are treated as coincident and produce no force.
pub const MIN_DISTANCE: f64 = 1e-6;

/// Resolves entity ids to entities.
pub trait BodyLookup {
    /// Shared access to an entity.
    fn body(&self, id: EntityId) -> Option<&Entity>;
    /// Exclusive access to an entity.
    fn body_mut(&mut self, id: EntityId) -> Option<&mut Entity>;
}

impl BodyLookup for IndexMap<EntityId, Entity> {
    fn body(&self, id: EntityId) -> Option<&Entity> {
        self.get(&id)
    }

    fn body_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.get_mut(&id)
    }
}

/// The physics a [`Force`] computes.
#[derive(Clone, Debug, PartialEq)]
pub enum ForceKind {
    /// Newtonian attraction between source and target.
    Gravity,
    /// Uniform acceleration field, e.g. a planet's surface gravity.
    /// Acts on the target only.
    PlanetGravity {
        /// Acceleration imparted regardless of mass.
        acceleration: Vec2d,
    },
    /// Damped spring between source and target.
    Spring {
        /// Length at which the spring exerts no force.
        rest_length: f64,
        /// Hooke constant.
        stiffness: f64,
        /// Damping coefficient along the spring axis.
        damping: f64,
    },
    /// Constant torque on the target.
    Motor {
        /// Torque in N·m.
        torque: f64,
    },
}

impl ForceKind {
    /// Whether the source receives the reaction force.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Self::Gravity | Self::Spring { .. })
    }

    /// Whether the force needs a source entity to compute anything.
    pub fn needs_source(&self) -> bool {
        matches!(self, Self::Gravity | Self::Spring { .. })
    }
}

/// A force generator.
#[derive(Clone, Debug, PartialEq)]
pub struct Force {
    id: ForceId,
    kind: ForceKind,
    target: Option<EntityId>,
    source: Option<EntityId>,
}

impl Force {
    fn build(kind: ForceKind, target: Option<EntityId>, source: Option<EntityId>) -> Self {
        Self {
            id: ForceId::next(),
            kind,
            target,
            source,
        }
    }

    /// Mutual attraction between two entities.
    pub fn gravity(source: EntityId, target: EntityId) -> Self {
        Self::build(ForceKind::Gravity, Some(target), Some(source))
    }

    /// Attraction of every entity towards `source`.
    pub fn global_gravity(source: EntityId) -> Self {
        Self::build(ForceKind::Gravity, None, Some(source))
    }

    /// Uniform acceleration on one entity.
    pub fn planet_gravity(target: EntityId, acceleration: Vec2d) -> Self {
        Self::build(ForceKind::PlanetGravity { acceleration }, Some(target), None)
    }

    /// Uniform acceleration on every entity.
    pub fn global_planet_gravity(acceleration: Vec2d) -> Self {
        Self::build(ForceKind::PlanetGravity { acceleration }, None, None)
    }

    /// Damped spring joining two entities.
    pub fn spring(
        source: EntityId,
        target: EntityId,
        rest_length: f64,
        stiffness: f64,
        damping: f64,
    ) -> Self {
        Self::build(
            ForceKind::Spring {
                rest_length,
                stiffness,
                damping,
            },
            Some(target),
            Some(source),
        )
    }

    /// Constant torque on one entity.
    pub fn motor(target: EntityId, torque: f64) -> Self {
        Self::build(ForceKind::Motor { torque }, Some(target), None)
    }

    /// Identifier.
    pub fn id(&self) -> ForceId {
        self.id
    }

    /// What the force computes.
    pub fn kind(&self) -> &ForceKind {
        &self.kind
    }

    /// Entity acted upon, `None` for global forces.
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Entity the force originates from, if any.
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    /// The same force with its target cleared, so it applies to every
    /// entity. The id and source are kept.
    pub fn into_global(self) -> Self {
        Self {
            target: None,
            ..self
        }
    }

    /// Whether the force applies to every entity.
    pub fn is_global(&self) -> bool {
        self.target.is_none()
    }

    /// Whether every entity the force names is present in `bodies`.
    pub fn is_resolvable(&self, bodies: &impl BodyLookup) -> bool {
        self.target.is_none_or(|t| bodies.body(t).is_some())
            && self.source.is_none_or(|s| bodies.body(s).is_some())
    }

    /// Apply to the stored target. Global forces return false; use
    /// [`apply_to`](Self::apply_to) for them.
    pub fn apply(&self, bodies: &mut impl BodyLookup) -> bool {
        match self.target {
            Some(target) => self.apply_to(target, bodies),
            None => false,
        }
    }

    /// Apply with `target` substituted for the stored target.
    ///
    /// Returns false, leaving every entity untouched, when the target or a
    /// needed source is missing, when source and target coincide, or when
    /// neither side can respond (kinematic or inactive).
    pub fn apply_to(&self, target: EntityId, bodies: &mut impl BodyLookup) -> bool {
        let Some(t) = bodies.body(target) else {
            return false;
        };
        let (t_pos, t_vel, t_mass, t_responds) =
            (t.position(), t.velocity(), t.inertia().mass, t.responds_to_forces());

        let source = match self.source {
            Some(s) if s == target => return false,
            Some(s) if self.kind.needs_source() => match bodies.body(s) {
                Some(body) => Some((
                    s,
                    body.position(),
                    body.velocity(),
                    body.inertia().mass,
                    body.responds_to_forces(),
                )),
                None => return false,
            },
            _ => None,
        };

        let source_responds =
            self.kind.is_symmetric() && source.is_some_and(|(.., responds)| responds);
        if !t_responds && !source_responds {
            return false;
        }

        let (force, moment) = match (&self.kind, source) {
            (ForceKind::Gravity, Some((_, s_pos, _, s_mass, _))) => {
                let d = t_pos - s_pos;
                let r = d.length();
                if r < MIN_DISTANCE {
                    (Vec2d::ZERO, 0.0)
                } else {
                    let magnitude = GRAVITATIONAL_CONSTANT * s_mass * t_mass / (r * r);
                    (-d / r * magnitude, 0.0)
                }
            }
            (
                ForceKind::Spring {
                    rest_length,
                    stiffness,
                    damping,
                },
                Some((_, s_pos, s_vel, _, _)),
            ) => {
                let d = t_pos - s_pos;
                let r = d.length();
                if r < MIN_DISTANCE {
                    (Vec2d::ZERO, 0.0)
                } else {
                    let dir = d / r;
                    let stretch = r - rest_length;
                    let closing = (t_vel - s_vel).dot(dir);
                    (dir * (-stiffness * stretch - damping * closing), 0.0)
                }
            }
            (ForceKind::PlanetGravity { acceleration }, _) => (*acceleration * t_mass, 0.0),
            (ForceKind::Motor { torque }, _) => (Vec2d::ZERO, *torque),
            // Source-needing kinds always resolved a source above.
            (ForceKind::Gravity | ForceKind::Spring { .. }, None) => return false,
        };

        if t_responds {
            if let Some(t) = bodies.body_mut(target) {
                t.add_force(force);
                t.add_torque(moment);
            }
        }
        if source_responds {
            if let Some(s) = source.and_then(|(id, ..)| bodies.body_mut(id)) {
                s.add_force(-force);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::CollisionType;
    use crate::material::Material;
    use proptest::prelude::*;

    fn world(entities: impl IntoIterator<Item = Entity>) -> IndexMap<EntityId, Entity> {
        entities.into_iter().map(|e| (e.id(), e)).collect()
    }

    fn ball(x: f64, y: f64) -> Entity {
        Entity::circle(1.0, Material::default(), Vec2d::new(x, y)).unwrap()
    }

    #[test]
    fn gravity_attracts_both_bodies() {
        let a = ball(0.0, 0.0).with_mass(1e12);
        let b = ball(10.0, 0.0).with_mass(1e12);
        let (ia, ib) = (a.id(), b.id());
        let mut bodies = world([a, b]);
        assert!(Force::gravity(ia, ib).apply(&mut bodies));
        assert!(bodies[&ib].acceleration().x < 0.0);
        assert!(bodies[&ia].acceleration().x > 0.0);
    }

    #[test]
    fn into_global_clears_target_only() {
        let (a, b) = (EntityId::next(), EntityId::next());
        let f = Force::gravity(a, b);
        let id = f.id();
        let g = f.into_global();
        assert!(g.is_global());
        assert_eq!(g.id(), id);
        assert_eq!(g.source(), Some(a));
        assert_eq!(g.kind(), &ForceKind::Gravity);
    }

    #[test]
    fn missing_target_or_source_is_noop() {
        let a = ball(0.0, 0.0);
        let ia = a.id();
        let ghost = EntityId::next();
        let mut bodies = world([a]);
        assert!(!Force::gravity(ghost, ia).apply(&mut bodies));
        assert!(!Force::motor(ghost, 1.0).apply(&mut bodies));
        assert_eq!(bodies[&ia].acceleration(), Vec2d::ZERO);
    }

    #[test]
    fn both_kinematic_is_noop() {
        let a = ball(0.0, 0.0).with_collision(CollisionType::Kinematic);
        let b = ball(5.0, 0.0).with_collision(CollisionType::Kinematic);
        let (ia, ib) = (a.id(), b.id());
        let mut bodies = world([a, b]);
        assert!(!Force::spring(ia, ib, 1.0, 10.0, 0.0).apply(&mut bodies));
    }

    #[test]
    fn kinematic_source_gets_no_reaction() {
        let a = ball(0.0, 0.0).with_collision(CollisionType::Kinematic);
        let b = ball(5.0, 0.0);
        let (ia, ib) = (a.id(), b.id());
        let mut bodies = world([a, b]);
        assert!(Force::spring(ia, ib, 1.0, 10.0, 0.0).apply(&mut bodies));
        assert_eq!(bodies[&ia].acceleration(), Vec2d::ZERO);
        assert!(bodies[&ib].acceleration().x < 0.0);
    }

    #[test]
    fn coincident_bodies_yield_zero_force() {
        let a = ball(3.0, 3.0).with_mass(1e20);
        let b = ball(3.0, 3.0);
        let (ia, ib) = (a.id(), b.id());
        let mut bodies = world([a, b]);
        Force::gravity(ia, ib).apply(&mut bodies);
        Force::spring(ia, ib, 2.0, 5.0, 1.0).apply(&mut bodies);
        for e in bodies.values() {
            assert!(e.acceleration().is_finite());
            assert_eq!(e.acceleration(), Vec2d::ZERO);
        }
    }

    #[test]
    fn planet_gravity_is_mass_independent() {
        let light = ball(0.0, 0.0).with_mass(1.0);
        let heavy = ball(10.0, 0.0).with_mass(1000.0);
        let (il, ih) = (light.id(), heavy.id());
        let mut bodies = world([light, heavy]);
        let g = Force::global_planet_gravity(Vec2d::new(0.0, 9.81));
        assert!(g.is_global());
        assert!(!g.apply(&mut bodies));
        assert!(g.apply_to(il, &mut bodies));
        assert!(g.apply_to(ih, &mut bodies));
        assert!((bodies[&il].acceleration().y - 9.81).abs() < 1e-9);
        assert!((bodies[&ih].acceleration().y - 9.81).abs() < 1e-9);
    }

    #[test]
    fn motor_spins_without_translating() {
        let e = ball(0.0, 0.0);
        let id = e.id();
        let j_inv = e.inertia().j_inverse;
        let mut bodies = world([e]);
        assert!(Force::motor(id, 2.0).apply(&mut bodies));
        assert_eq!(bodies[&id].acceleration(), Vec2d::ZERO);
        assert!((bodies[&id].angular_acceleration() - 2.0 * j_inv).abs() < 1e-12);
    }

    #[test]
    fn global_gravity_skips_its_own_source() {
        let sun = ball(0.0, 0.0).with_mass(1e15);
        let sun_id = sun.id();
        let mut bodies = world([sun]);
        let f = Force::global_gravity(sun_id);
        assert!(!f.apply_to(sun_id, &mut bodies));
    }

    #[test]
    fn resolvable_tracks_membership() {
        let a = ball(0.0, 0.0);
        let b = ball(1.0, 0.0);
        let (ia, ib) = (a.id(), b.id());
        let f = Force::spring(ia, ib, 1.0, 1.0, 0.0);
        let mut bodies = world([a, b]);
        assert!(f.is_resolvable(&bodies));
        bodies.shift_remove(&ia);
        assert!(!f.is_resolvable(&bodies));
    }

    proptest! {
        #[test]
        fn spring_impulses_are_equal_and_opposite(
            ax in -500.0f64..500.0, ay in -500.0f64..500.0,
            bx in -500.0f64..500.0, by in -500.0f64..500.0,
            vx in -50.0f64..50.0, vy in -50.0f64..50.0,
            ma in 0.1f64..1e4, mb in 0.1f64..1e4,
            rest in 0.0f64..100.0, k in 0.0f64..1e3, c in 0.0f64..10.0,
        ) {
            prop_assume!((Vec2d::new(ax, ay) - Vec2d::new(bx, by)).length() > 1e-3);
            let a = ball(ax, ay).with_mass(ma).with_velocity(Vec2d::new(vx, vy));
            let b = ball(bx, by).with_mass(mb);
            let (ia, ib) = (a.id(), b.id());
            let mut bodies = world([a, b]);
            prop_assert!(Force::spring(ia, ib, rest, k, c).apply(&mut bodies));
            let fa = bodies[&ia].acceleration() * ma;
            let fb = bodies[&ib].acceleration() * mb;
            let scale = fa.length().max(fb.length()).max(1.0);
            prop_assert!((fa + fb).length() / scale < 1e-9);
        }
    }
}
