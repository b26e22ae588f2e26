//! Queued world mutations.
//!
//! External callers never touch the open tick. They send [`Ingress`]
//! messages through a [`WorldHandle`]; the simulation loop drains the
//! channel once per step, before integration, and applies each message to
//! the tick it owns.

use collinsa_core::{Entity, EntityId, Force, ForceId};
use collinsa_space::GridGeometry;
use crossbeam_channel::{Receiver, Sender};

use crate::machine::TickMachine;

/// Error submitting a mutation to a running world.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The simulation loop has shut down.
    Shutdown,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "simulation loop has shut down"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// One queued mutation.
#[derive(Debug)]
pub enum Ingress {
    /// Place an entity into the open tick.
    Insert(Entity),
    /// Remove an entity when the open tick closes.
    Remove(EntityId),
    /// Register a targeted force.
    AddForce(Force),
    /// Register a force applied to every entity.
    AddGlobalForce(Force),
    /// Unregister a force.
    RemoveForce(ForceId),
    /// Freeze or unfreeze an entity.
    SetActive(EntityId, bool),
    /// Replace the chunk layout.
    Resize(GridGeometry),
}

/// Counts from applying one batch of [`Ingress`] messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngressStats {
    /// Messages applied.
    pub applied: usize,
    /// Insertions refused because the id was already placed.
    pub rejected_insertions: usize,
}

/// Apply a batch of messages to the machine's open tick, in order.
pub(crate) fn apply_batch(
    machine: &mut TickMachine,
    batch: impl IntoIterator<Item = Ingress>,
) -> IngressStats {
    let mut stats = IngressStats::default();
    for msg in batch {
        stats.applied += 1;
        match msg {
            Ingress::Insert(entity) => {
                if let Err(e) = machine.current_mut().place(entity) {
                    log::warn!("rejected insertion: {e}");
                    stats.rejected_insertions += 1;
                }
            }
            Ingress::Remove(id) => {
                if !machine.current_mut().queue_removal(id) {
                    log::debug!("removal of unknown entity {id}");
                }
            }
            Ingress::AddForce(force) => {
                machine.current_mut().add_force(force);
            }
            Ingress::AddGlobalForce(force) => {
                machine.current_mut().add_global_force(force);
            }
            Ingress::RemoveForce(id) => {
                machine.current_mut().remove_force(id);
            }
            Ingress::SetActive(id, active) => {
                if let Some(e) = machine.current_mut().entity_mut(id) {
                    e.set_active(active);
                }
            }
            Ingress::Resize(geometry) => {
                machine.resize(geometry);
            }
        }
    }
    stats
}

/// Cloneable, non-blocking sender of world mutations.
///
/// Every method returns immediately. Mutations are applied at the start
/// of the next simulation step, in send order per handle.
#[derive(Clone, Debug)]
pub struct WorldHandle {
    tx: Sender<Ingress>,
}

/// A handle and the receiving end the simulation loop drains.
pub(crate) fn channel() -> (WorldHandle, Receiver<Ingress>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (WorldHandle { tx }, rx)
}

impl WorldHandle {
    /// Send a raw message.
    pub fn send(&self, msg: Ingress) -> Result<(), SubmitError> {
        self.tx.send(msg).map_err(|_| SubmitError::Shutdown)
    }

    /// Queue an entity for placement. Returns its id.
    pub fn place_entity(&self, entity: Entity) -> Result<EntityId, SubmitError> {
        let id = entity.id();
        self.send(Ingress::Insert(entity))?;
        Ok(id)
    }

    /// Queue an entity's removal.
    pub fn remove_entity(&self, id: EntityId) -> Result<(), SubmitError> {
        self.send(Ingress::Remove(id))
    }

    /// Queue a targeted force. Returns its id.
    pub fn add_force(&self, force: Force) -> Result<ForceId, SubmitError> {
        let id = force.id();
        self.send(Ingress::AddForce(force))?;
        Ok(id)
    }

    /// Queue a force for every entity. A stored target is dropped.
    /// Returns its id.
    pub fn add_global_force(&self, force: Force) -> Result<ForceId, SubmitError> {
        let id = force.id();
        self.send(Ingress::AddGlobalForce(force))?;
        Ok(id)
    }

    /// Queue a force's removal.
    pub fn remove_force(&self, id: ForceId) -> Result<(), SubmitError> {
        self.send(Ingress::RemoveForce(id))
    }

    /// Queue a freeze/unfreeze.
    pub fn set_active(&self, id: EntityId, active: bool) -> Result<(), SubmitError> {
        self.send(Ingress::SetActive(id, active))
    }

    /// Queue a chunk layout change.
    pub fn resize(&self, geometry: GridGeometry) -> Result<(), SubmitError> {
        self.send(Ingress::Resize(geometry))
    }
}
