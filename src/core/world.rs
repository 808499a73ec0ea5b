use log::{debug, trace, warn};

use crate::bodies::{DampingFlags, RigidBody};
use crate::collision::{
    ArbiterKey, ArbiterMap, BodyRayHit, BroadPhase, CollisionFilter, CollisionReport, NarrowPhase,
    SweepAndPruneBroadPhase,
};
use crate::constraints::Constraint;
use crate::core::{
    BodyEventType, BodyHandle, BodyStorage, CollisionEventType, CollisionIsland, ConstraintHandle,
    ConstraintStorage, DebugDrawer, EventQueue, IslandId, IslandManager, SimulationConfig, Storage,
};
use crate::error::PhysicsError;
use crate::math::{Quaternion, Vector3};
use crate::Result;

/// Owns the bodies, constraints and contact state of one simulation and
/// advances them in time.
///
/// A step runs these stages in order: contact refresh, broad phase,
/// narrow phase and manifold merge, sleeping check, force integration,
/// island solve, then position integration.
pub struct World {
    bodies: BodyStorage<RigidBody>,
    constraints: ConstraintStorage<Box<dyn Constraint>>,
    config: SimulationConfig,
    events: EventQueue,
    arbiters: ArbiterMap,
    island_manager: IslandManager,
    broad_phase: Box<dyn BroadPhase>,
    filter: Option<Box<dyn CollisionFilter>>,
    narrow_phase: NarrowPhase,
    accumulator: f32,
    time: f32,
    pairs: Vec<(BodyHandle, BodyHandle)>,
    reports: Vec<CollisionReport>,
}

impl World {
    /// Creates a world with the default configuration
    pub fn new() -> Self {
        Self::build(SimulationConfig::default())
    }

    /// Creates a world with a validated configuration
    pub fn with_config(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SimulationConfig) -> Self {
        debug!(
            "creating world: gravity {}, {} iterations, deactivation {}",
            config.gravity, config.iterations, config.allow_deactivation
        );
        Self {
            bodies: Storage::new(),
            constraints: Storage::new(),
            narrow_phase: NarrowPhase::from_config(&config),
            config,
            events: EventQueue::new(),
            arbiters: ArbiterMap::new(),
            island_manager: IslandManager::new(),
            broad_phase: Box::new(SweepAndPruneBroadPhase::new()),
            filter: None,
            accumulator: 0.0,
            time: 0.0,
            pairs: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Edits the configuration. Narrow-phase switches are re-read on the
    /// next step.
    pub fn config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    /// Simulated time so far, in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_broad_phase(&mut self, broad_phase: Box<dyn BroadPhase>) {
        self.broad_phase = broad_phase;
    }

    pub fn set_collision_filter(&mut self, filter: Option<Box<dyn CollisionFilter>>) {
        self.filter = filter;
    }

    /// Adds a body and gives it an island unless it is static
    pub fn add_body(&mut self, mut body: RigidBody) -> BodyHandle {
        body.update();
        let handle = self.bodies.add(body);
        self.island_manager.add_body(&mut self.bodies, handle);
        self.events.body(BodyEventType::Added, handle);
        debug!("added body {:?}", handle);
        handle
    }

    /// Removes a body together with its constraints and contacts
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let (arbiters, constraints) = {
            let body = self.bodies.try_get(handle)?;
            let arbiters: Vec<ArbiterKey> = body.arbiters.iter().copied().collect();
            let constraints: Vec<ConstraintHandle> = body.constraints.iter().copied().collect();
            (arbiters, constraints)
        };

        for constraint in constraints {
            self.remove_constraint(constraint)?;
        }

        for key in arbiters {
            if self.arbiters.remove(key.first(), key.second()).is_some() {
                self.island_manager.arbiter_removed(&mut self.bodies, key);
                self.events
                    .collision(CollisionEventType::End, key.first(), key.second(), None);
                trace!("arbiter {:?} removed with body {:?}", key, handle);
            }
        }

        self.island_manager.remove_body(&mut self.bodies, handle);

        let body = self
            .bodies
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{:?} not found", handle)))?;
        self.events.body(BodyEventType::Removed, handle);
        debug!("removed body {:?}", handle);
        Ok(body)
    }

    pub fn body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.try_get(handle)
    }

    /// Mutable access to a body. Changing the static flag here is picked
    /// up on the next step; [`set_body_static`](Self::set_body_static)
    /// applies it immediately.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.try_get_mut(handle)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Adds a constraint between bodies already in the world
    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<ConstraintHandle> {
        let (body1, body2) = constraint.bodies();
        self.bodies.try_get(body1)?;
        if let Some(body2) = body2 {
            self.bodies.try_get(body2)?;
        }

        let handle = self.constraints.add(constraint);
        self.island_manager
            .constraint_created(&mut self.bodies, handle, body1, body2);
        debug!(
            "added constraint {:?} between {:?} and {:?}",
            handle, body1, body2
        );
        Ok(handle)
    }

    /// Removes a constraint and wakes the bodies it held
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<Box<dyn Constraint>> {
        let (body1, body2) = self.constraints.try_get(handle)?.bodies();

        self.island_manager
            .constraint_removed(&mut self.bodies, handle, body1, body2);
        let constraint = self
            .constraints
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{:?} not found", handle)))?;

        for body in std::iter::once(body1).chain(body2) {
            if self.bodies.get(body).is_some() {
                self.activate_body(body)?;
            }
        }
        debug!("removed constraint {:?}", handle);
        Ok(constraint)
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Result<&dyn Constraint> {
        self.constraints.try_get(handle).map(|c| &**c)
    }

    pub fn constraint_mut(&mut self, handle: ConstraintHandle) -> Result<&mut dyn Constraint> {
        self.constraints.try_get_mut(handle).map(|c| &mut **c)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Wakes the island of a body. Static bodies have no island and are
    /// left alone.
    pub fn activate_body(&mut self, handle: BodyHandle) -> Result<()> {
        let island = self.bodies.try_get(handle)?.island;
        if let Some(id) = island {
            self.wake_island(id);
        }
        Ok(())
    }

    fn wake_island(&mut self, id: IslandId) {
        let Some(island) = self.island_manager.island(id) else {
            return;
        };
        let mut woken = 0;
        for handle in island.bodies() {
            if self.bodies.get(handle).is_some_and(|body| !body.is_active) {
                self.events.body(BodyEventType::Activated, handle);
                woken += 1;
            }
        }
        if woken > 0 {
            island.set_status(&mut self.bodies, true);
        }
    }

    /// Turns a body static or dynamic and rebuilds the islands around it
    pub fn set_body_static(&mut self, handle: BodyHandle, is_static: bool) -> Result<()> {
        let was_static = self.bodies.try_get(handle)?.is_static;
        if was_static == is_static {
            return Ok(());
        }

        if is_static {
            self.rehome_as_static(handle);
        } else {
            self.rehome_as_dynamic(handle);
        }
        debug!("{:?} static: {}", handle, is_static);
        Ok(())
    }

    /// Takes a body out of the island graph, flags it static and links its
    /// contacts and constraints again so its neighbours split correctly.
    fn rehome_as_static(&mut self, handle: BodyHandle) {
        // The flag may already be set when the body was edited directly.
        if let Some(body) = self.bodies.get_mut(handle) {
            body.is_static = false;
        }
        self.relink(handle, |islands, bodies| {
            islands.make_body_static(bodies, handle);
            if let Some(body) = bodies.get_mut(handle) {
                body.set_static(true);
            }
        });
    }

    fn rehome_as_dynamic(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.is_static = true;
        }
        self.relink(handle, |islands, bodies| {
            if let Some(body) = bodies.get_mut(handle) {
                body.set_static(false);
                body.set_active(true);
            }
            islands.add_body(bodies, handle);
        });
    }

    /// Unlinks every arbiter and constraint of `handle`, runs `change`, and
    /// links them again under the body's new state
    fn relink(
        &mut self,
        handle: BodyHandle,
        change: impl FnOnce(&mut IslandManager, &mut BodyStorage<RigidBody>),
    ) {
        let Some(body) = self.bodies.get(handle) else {
            return;
        };
        let arbiters: Vec<ArbiterKey> = body.arbiters.iter().copied().collect();
        let constraints: Vec<(ConstraintHandle, BodyHandle, Option<BodyHandle>)> = body
            .constraints
            .iter()
            .filter_map(|&c| {
                self.constraints.get(c).map(|constraint| {
                    let (b1, b2) = constraint.bodies();
                    (c, b1, b2)
                })
            })
            .collect();

        for &key in &arbiters {
            self.island_manager.arbiter_removed(&mut self.bodies, key);
        }
        for &(c, b1, b2) in &constraints {
            self.island_manager.constraint_removed(&mut self.bodies, c, b1, b2);
        }

        change(&mut self.island_manager, &mut self.bodies);

        for &key in &arbiters {
            self.island_manager.arbiter_created(&mut self.bodies, key);
        }
        for &(c, b1, b2) in &constraints {
            self.island_manager.constraint_created(&mut self.bodies, c, b1, b2);
        }
    }

    pub fn islands(&self) -> impl Iterator<Item = (IslandId, &CollisionIsland)> {
        self.island_manager.islands()
    }

    pub fn island_manager(&self) -> &IslandManager {
        &self.island_manager
    }

    pub fn arbiters(&self) -> &ArbiterMap {
        &self.arbiters
    }

    /// Events raised since the last drain. The queue is never cleared by
    /// stepping.
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Takes every pending event, leaving an empty queue behind
    pub fn drain_events(&mut self) -> EventQueue {
        std::mem::take(&mut self.events)
    }

    /// Removes every body and constraint
    pub fn clear(&mut self) {
        self.island_manager.clear(&mut self.bodies);
        self.arbiters.clear();
        self.constraints.clear();
        self.bodies.clear();
        self.events.clear();
        self.accumulator = 0.0;
        self.time = 0.0;
    }

    /// Advances by fixed `time_step` increments, carrying the remainder to
    /// the next call. When more than `max_substeps` steps are owed the
    /// backlog is dropped. Returns the number of steps taken.
    pub fn step_accumulated(&mut self, elapsed: f32) -> u32 {
        if !elapsed.is_finite() || elapsed < 0.0 {
            warn!("ignoring elapsed time {}", elapsed);
            return 0;
        }

        let fixed = self.config.time_step;
        self.accumulator += elapsed;

        let mut steps = 0;
        while self.accumulator > fixed {
            self.step(fixed);
            self.accumulator -= fixed;
            steps += 1;
            if steps >= self.config.max_substeps {
                self.accumulator = 0.0;
                break;
            }
        }
        steps
    }

    /// Runs one simulation step of `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            warn!("ignoring time step {}", dt);
            return;
        }
        if dt == 0.0 {
            return;
        }

        self.narrow_phase.speculative_contacts = self.config.speculative_contacts;
        self.narrow_phase.use_terrain_normal = self.config.use_terrain_normal;
        self.narrow_phase.use_triangle_mesh_normal = self.config.use_triangle_mesh_normal;

        self.sync_islands();
        self.update_contacts();
        self.detect_collisions();
        self.check_deactivation(dt);
        self.integrate_forces(dt);
        self.solve(dt);
        self.integrate(dt);

        self.time += dt;
        trace!(
            "step {}: {} pairs, {} arbiters, {} islands",
            dt,
            self.pairs.len(),
            self.arbiters.len(),
            self.island_manager.len()
        );
    }

    /// Catches up with static flags changed through `body_mut`
    fn sync_islands(&mut self) {
        let mut to_static = Vec::new();
        let mut to_dynamic = Vec::new();
        for (handle, body) in self.bodies.iter() {
            if body.is_static && body.island.is_some() {
                to_static.push(handle);
            } else if !body.is_static && body.island.is_none() {
                to_dynamic.push(handle);
            }
        }

        for handle in to_static {
            self.rehome_as_static(handle);
        }
        for handle in to_dynamic {
            self.rehome_as_dynamic(handle);
        }
    }

    /// Moves cached contacts with their bodies and drops the ones that
    /// drifted apart. Arbiters left empty are removed.
    fn update_contacts(&mut self) {
        let break_threshold = self.config.contact.break_threshold;
        let max_drift_sq = break_threshold * break_threshold * 100.0;
        let mut empty = Vec::new();

        for (key, arbiter) in self.arbiters.iter_mut() {
            let (Some(body1), Some(body2)) =
                (self.bodies.get(arbiter.body1()), self.bodies.get(arbiter.body2()))
            else {
                empty.push(*key);
                continue;
            };

            arbiter.contacts_mut().retain(|contact| {
                contact.update_position(body1, body2);
                if contact.penetration < -break_threshold {
                    return false;
                }
                let diff = contact.p1 - contact.p2;
                let along = diff.dot(&contact.normal);
                let drift = diff - contact.normal * along;
                drift.length_squared() <= max_drift_sq
            });

            if arbiter.is_empty() {
                empty.push(*key);
            }
        }

        for key in empty {
            self.arbiters.remove(key.first(), key.second());
            self.island_manager.arbiter_removed(&mut self.bodies, key);
            self.events
                .collision(CollisionEventType::End, key.first(), key.second(), None);
            trace!("arbiter {:?} lost its last contact", key);
        }
    }

    fn detect_collisions(&mut self) {
        self.broad_phase.update(&self.bodies);
        self.pairs.clear();
        self.broad_phase.find_pairs(&mut self.pairs);

        if let Some(filter) = &self.filter {
            let bodies = &self.bodies;
            self.pairs.retain(|&(a, b)| match (bodies.get(a), bodies.get(b)) {
                (Some(body_a), Some(body_b)) => filter.should_collide(a, body_a, b, body_b),
                _ => false,
            });
        }

        self.reports.clear();
        self.run_narrow_phase();

        let reports = std::mem::take(&mut self.reports);
        for report in &reports {
            self.merge_report(report);
        }
        self.reports = reports;
    }

    #[cfg(feature = "parallel")]
    fn run_narrow_phase(&mut self) {
        use rayon::prelude::*;

        if !self.config.multithreaded {
            return self.run_narrow_phase_serial();
        }

        let bodies = &self.bodies;
        let narrow_phase = &self.narrow_phase;
        let found: Vec<Vec<CollisionReport>> = self
            .pairs
            .par_iter()
            .map(|&(a, b)| {
                let mut out = Vec::new();
                if let (Some(body_a), Some(body_b)) = (bodies.get(a), bodies.get(b)) {
                    narrow_phase.detect_into(a, body_a, b, body_b, &mut out);
                }
                out
            })
            .collect();
        self.reports.extend(found.into_iter().flatten());
    }

    #[cfg(not(feature = "parallel"))]
    fn run_narrow_phase(&mut self) {
        self.run_narrow_phase_serial();
    }

    fn run_narrow_phase_serial(&mut self) {
        for &(a, b) in &self.pairs {
            if let (Some(body_a), Some(body_b)) = (self.bodies.get(a), self.bodies.get(b)) {
                self.narrow_phase
                    .detect_into(a, body_a, b, body_b, &mut self.reports);
            }
        }
    }

    /// Feeds one narrow-phase contact into the pair's arbiter, creating the
    /// arbiter on first touch
    fn merge_report(&mut self, report: &CollisionReport) {
        // An active body touching a sleeping one wakes its island first so
        // the new contact sees two movable bodies.
        let sleeping = {
            let (Some(a), Some(b)) = (self.bodies.get(report.body1), self.bodies.get(report.body2))
            else {
                return;
            };
            match (a.is_static_or_inactive(), b.is_static_or_inactive()) {
                (false, true) if !b.is_static => b.island,
                (true, false) if !a.is_static => a.island,
                _ => None,
            }
        };
        if let Some(id) = sleeping {
            self.wake_island(id);
        }

        let (arbiter, created) = self.arbiters.get_or_insert(report.body1, report.body2);
        let (body1, body2) = (arbiter.body1(), arbiter.body2());
        let key = arbiter.key();

        let (Some(b1), Some(b2)) = (self.bodies.get(body1), self.bodies.get(body2)) else {
            return;
        };
        let (point1, point2, normal) = report.oriented_for(body1);
        let contact = arbiter.add_contact(
            b1,
            b2,
            point1,
            point2,
            normal,
            report.penetration,
            &self.config.contact,
        );

        if created {
            self.island_manager.arbiter_created(&mut self.bodies, key);
            self.events.collision(
                CollisionEventType::Begin,
                body1,
                body2,
                contact.map(|c| c.contact_point()),
            );
            trace!("arbiter {:?} created", key);
        }
        if let Some(contact) = contact {
            self.events.collision(
                CollisionEventType::ContactCreated,
                body1,
                body2,
                Some(contact.contact_point()),
            );
        }
    }

    /// Puts islands to sleep once every body rested for
    /// `deactivation_time`, and wakes islands that got moving again
    fn check_deactivation(&mut self, dt: f32) {
        let config = &self.config;
        let bodies = &mut self.bodies;
        let events = &mut self.events;

        for (_, island) in self.island_manager.islands() {
            let mut deactivate = config.allow_deactivation;

            if deactivate {
                for handle in island.bodies() {
                    let Some(body) = bodies.get_mut(handle) else {
                        continue;
                    };
                    let resting = body.allow_deactivation
                        && body.linear_velocity.length_squared() < config.inactive_linear_threshold_sq
                        && body.angular_velocity.length_squared() < config.inactive_angular_threshold_sq;
                    if resting {
                        body.inactive_time += dt;
                        if body.inactive_time < config.deactivation_time {
                            deactivate = false;
                        }
                    } else {
                        body.inactive_time = 0.0;
                        deactivate = false;
                    }
                }
            }

            for handle in island.bodies() {
                match bodies.get(handle) {
                    Some(body) if deactivate && body.is_active => {
                        events.body(BodyEventType::Deactivated, handle)
                    }
                    Some(body) if !deactivate && !body.is_active => {
                        events.body(BodyEventType::Activated, handle)
                    }
                    _ => {}
                }
            }
            island.set_status(bodies, !deactivate);
        }
    }

    fn integrate_forces(&mut self, dt: f32) {
        let gravity = self.config.gravity;

        for (_, body) in self.bodies.iter_mut() {
            if body.is_static || !body.is_active {
                continue;
            }

            body.linear_velocity += body.force * (body.inverse_mass * dt);
            if !body.is_particle {
                body.angular_velocity += body.inv_inertia_world.multiply_vector(body.torque * dt);
            }
            if body.affected_by_gravity {
                body.linear_velocity += gravity * dt;
            }

            body.force = Vector3::ZERO;
            body.torque = Vector3::ZERO;
        }
    }

    /// Runs the sequential-impulse solver on every awake island
    fn solve(&mut self, dt: f32) {
        let bodies = &mut self.bodies;
        let arbiters = &mut self.arbiters;
        let constraints = &mut self.constraints;
        let config = &self.config;

        for (_, island) in self.island_manager.islands() {
            if !island.is_active(bodies) {
                continue;
            }

            let iterations = if island.body_count() + island.constraint_count() > 3 {
                config.iterations
            } else {
                config.small_iterations
            };

            let keys: Vec<ArbiterKey> = island.arbiters().collect();
            let joints: Vec<ConstraintHandle> = island
                .constraints()
                .filter(|&c| {
                    constraints.get(c).is_some_and(|constraint| {
                        let (b1, b2) = constraint.bodies();
                        std::iter::once(b1)
                            .chain(b2)
                            .any(|h| bodies.get(h).is_some_and(|b| !b.is_static_or_inactive()))
                    })
                })
                .collect();

            for key in &keys {
                for_each_contact(arbiters, bodies, key, |contact, body1, body2| {
                    contact.prepare_for_iteration(body1, body2, dt);
                });
            }
            for &c in &joints {
                if let Some(constraint) = constraints.get_mut(c) {
                    constraint.prepare_for_iteration(bodies, dt);
                }
            }

            for _ in 0..iterations {
                for key in &keys {
                    for_each_contact(arbiters, bodies, key, |contact, body1, body2| {
                        contact.iterate(body1, body2);
                    });
                }
                for &c in &joints {
                    if let Some(constraint) = constraints.get_mut(c) {
                        constraint.iterate(bodies);
                    }
                }
            }
        }
    }

    fn integrate(&mut self, dt: f32) {
        let linear_factor = self.config.linear_damping.powf(dt);
        let angular_factor = self.config.angular_damping.powf(dt);
        let speculative = self.config.speculative_contacts;

        for (_, body) in self.bodies.iter_mut() {
            if body.is_static || !body.is_active {
                continue;
            }

            body.position += body.linear_velocity * dt;

            if !body.is_particle {
                let w = body.angular_velocity;
                let angle = w.length();
                let axis = if angle < 0.001 {
                    // Taylor expansion of sin(x) / x around zero
                    w * (0.5 * dt - dt * dt * dt * 0.020_833_334 * angle * angle)
                } else {
                    w * ((0.5 * angle * dt).sin() / angle)
                };

                let spin = Quaternion::new((angle * dt * 0.5).cos(), axis.x, axis.y, axis.z);
                let current = Quaternion::from_rotation_matrix(&body.orientation);
                body.orientation = (spin * current).normalize().to_rotation_matrix();
            }

            if body.damping.contains(DampingFlags::LINEAR) {
                body.linear_velocity *= linear_factor;
            }
            if body.damping.contains(DampingFlags::ANGULAR) {
                body.angular_velocity *= angular_factor;
            }

            body.update();

            if speculative || body.enable_speculative_contacts {
                body.swept_expand_bounding_box(dt);
            }
        }
    }

    /// Casts a segment from `origin` to `origin + direction` and returns
    /// the nearest body hit. `filter` can reject bodies before they are
    /// tested.
    pub fn raycast(
        &self,
        origin: Vector3,
        direction: Vector3,
        filter: Option<&dyn Fn(BodyHandle, &RigidBody) -> bool>,
    ) -> Option<BodyRayHit> {
        let mut best: Option<BodyRayHit> = None;

        for (handle, body) in self.bodies.iter() {
            if filter.is_some_and(|accept| !accept(handle, body)) {
                continue;
            }
            if !body.bounding_box.segment_intersect(origin, direction) {
                continue;
            }

            let Some(hit) = self.narrow_phase.raycast_body(body, origin, direction) else {
                continue;
            };
            if best.map_or(true, |b| hit.fraction < b.fraction) {
                best = Some(BodyRayHit {
                    body: handle,
                    fraction: hit.fraction,
                    normal: hit.normal,
                });
            }
        }

        best
    }

    /// Describes bodies with debug drawing enabled, every contact and
    /// every constraint to `drawer`
    pub fn debug_draw(&self, drawer: &mut dyn DebugDrawer) {
        for (_, body) in self.bodies.iter() {
            if body.is_debug_draw_enabled() {
                body.debug_draw(drawer);
            }
        }
        for (_, arbiter) in self.arbiters.iter() {
            for contact in arbiter.contacts().iter() {
                contact.debug_draw(drawer);
            }
        }
        for (_, constraint) in self.constraints.iter() {
            constraint.debug_draw(&self.bodies, drawer);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` on every contact of an arbiter with both bodies borrowed
fn for_each_contact(
    arbiters: &mut ArbiterMap,
    bodies: &mut BodyStorage<RigidBody>,
    key: &ArbiterKey,
    mut f: impl FnMut(&mut crate::collision::Contact, &mut RigidBody, &mut RigidBody),
) {
    let Some(arbiter) = arbiters.get_mut(key.first(), key.second()) else {
        return;
    };
    let Ok((body1, body2)) = bodies.get_pair_mut(arbiter.body1(), arbiter.body2()) else {
        return;
    };
    for contact in arbiter.contacts_mut().iter_mut() {
        f(contact, body1, body2);
    }
}
