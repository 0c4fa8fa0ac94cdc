//! Capacity pool: per-model concurrency accounting.
//!
//! Each task kind owns an ordered list of resource models. Selection and the
//! counter increment happen under one lock, so two callers can never both
//! take the last slot of a model.
//!
//! # Overcommit
//!
//! [`CapacityPool::select_model`] never fails for lack of capacity. When every
//! model is saturated it picks the one with the lowest absolute load and
//! increments it anyway, so `current` may exceed `max_concurrent` until the
//! extra lease is released. The dispatcher only uses [`CapacityPool::try_acquire`],
//! which refuses instead of overcommitting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use anchordesk_core::settings::ModelPoolConfig;
use anchordesk_core::{StudioError, StudioResult, TaskKind};

/// A named, capacity-bounded worker for one task kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceModel {
    pub id: String,
    pub max_concurrent: u32,
    pub current: u32,
}

impl ResourceModel {
    pub fn new(id: impl Into<String>, max_concurrent: u32) -> Self {
        Self {
            id: id.into(),
            max_concurrent,
            current: 0,
        }
    }

    pub const fn has_spare(&self) -> bool {
        self.current < self.max_concurrent
    }

    /// `self.current / self.max_concurrent < other.current / other.max_concurrent`
    /// without floating point.
    const fn less_loaded_than(&self, other: &Self) -> bool {
        (self.current as u64) * (other.max_concurrent as u64)
            < (other.current as u64) * (self.max_concurrent as u64)
    }
}

/// Load figures for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLoad {
    pub kind: TaskKind,
    pub id: String,
    pub current: u32,
    pub max_concurrent: u32,
    /// `"current/max"`.
    pub load: String,
    /// Percent of capacity in use; exceeds 100 while overcommitted.
    pub utilization: u32,
}

impl ModelLoad {
    fn of(kind: TaskKind, model: &ResourceModel) -> Self {
        Self {
            kind,
            id: model.id.clone(),
            current: model.current,
            max_concurrent: model.max_concurrent,
            load: format!("{}/{}", model.current, model.max_concurrent),
            utilization: model.current.saturating_mul(100) / model.max_concurrent.max(1),
        }
    }
}

type Registry = HashMap<TaskKind, Vec<ResourceModel>>;

/// Shared per-kind model registry. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CapacityPool {
    models: Arc<Mutex<Registry>>,
}

impl CapacityPool {
    pub fn new(config: &ModelPoolConfig) -> Self {
        let models = TaskKind::ALL
            .into_iter()
            .map(|kind| {
                let specs = config
                    .models_for(kind)
                    .iter()
                    .map(|spec| ResourceModel::new(spec.id.clone(), spec.max_concurrent))
                    .collect();
                (kind, specs)
            })
            .collect();
        Self {
            models: Arc::new(Mutex::new(models)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.models.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Choose a model for `kind` and take a slot on it.
    ///
    /// Lowest `current / max_concurrent` among models with spare capacity,
    /// first registered wins ties. With no spare capacity anywhere, falls
    /// back to the lowest absolute `current` (overcommit).
    pub fn select_model(&self, kind: TaskKind) -> StudioResult<String> {
        let mut registry = self.lock();
        let models = registry
            .get_mut(&kind)
            .filter(|models| !models.is_empty())
            .ok_or_else(|| StudioError::internal(format!("no {kind} models registered")))?;

        let index = match least_loaded_with_spare(models) {
            Some(index) => index,
            None => {
                let index = lowest_absolute_load(models);
                warn!(
                    target: "anchordesk.dispatch",
                    %kind,
                    model_id = %models[index].id,
                    "All models saturated, overcommitting"
                );
                index
            }
        };

        let model = &mut models[index];
        model.current += 1;
        debug!(target: "anchordesk.dispatch", %kind, model_id = %model.id, load = model.current, "Slot acquired");
        Ok(model.id.clone())
    }

    /// Give back a slot taken by [`select_model`](Self::select_model).
    ///
    /// Floors at zero; unknown ids are ignored.
    pub fn release(&self, kind: TaskKind, model_id: &str) {
        let mut registry = self.lock();
        if let Some(model) = registry
            .get_mut(&kind)
            .and_then(|models| models.iter_mut().find(|m| m.id == model_id))
        {
            model.current = model.current.saturating_sub(1);
            debug!(target: "anchordesk.dispatch", %kind, model_id, load = model.current, "Slot released");
        }
    }

    /// Select with overcommit, wrapped in a lease that releases on drop.
    pub fn acquire(&self, kind: TaskKind) -> StudioResult<Lease> {
        let model_id = self.select_model(kind)?;
        Ok(Lease::new(self.clone(), kind, model_id))
    }

    /// Take a slot only if some model has spare capacity.
    pub fn try_acquire(&self, kind: TaskKind) -> Option<Lease> {
        let model_id = {
            let mut registry = self.lock();
            let models = registry.get_mut(&kind)?;
            let index = least_loaded_with_spare(models)?;
            let model = &mut models[index];
            model.current += 1;
            model.id.clone()
        };
        Some(Lease::new(self.clone(), kind, model_id))
    }

    pub fn has_capacity(&self, kind: TaskKind) -> bool {
        self.lock()
            .get(&kind)
            .is_some_and(|models| models.iter().any(ResourceModel::has_spare))
    }

    /// Slots in use across every kind.
    pub fn in_use(&self) -> u32 {
        self.lock()
            .values()
            .flat_map(|models| models.iter().map(|m| m.current))
            .sum()
    }

    /// Per-model load, dialogue models first, in registration order.
    pub fn snapshot(&self) -> Vec<ModelLoad> {
        let registry = self.lock();
        TaskKind::ALL
            .into_iter()
            .flat_map(|kind| {
                registry
                    .get(&kind)
                    .into_iter()
                    .flatten()
                    .map(move |model| ModelLoad::of(kind, model))
            })
            .collect()
    }
}

fn least_loaded_with_spare(models: &[ResourceModel]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, model) in models.iter().enumerate() {
        if !model.has_spare() {
            continue;
        }
        match best {
            Some(current_best) if !model.less_loaded_than(&models[current_best]) => {}
            _ => best = Some(index),
        }
    }
    best
}

fn lowest_absolute_load(models: &[ResourceModel]) -> usize {
    let mut best = 0;
    for (index, model) in models.iter().enumerate().skip(1) {
        if model.current < models[best].current {
            best = index;
        }
    }
    best
}

/// A held slot. Dropping it releases the slot exactly once.
#[derive(Debug)]
pub struct Lease {
    pool: CapacityPool,
    kind: TaskKind,
    model_id: String,
}

impl Lease {
    const fn new(pool: CapacityPool, kind: TaskKind, model_id: String) -> Self {
        Self {
            pool,
            kind,
            model_id,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub const fn kind(&self) -> TaskKind {
        self.kind
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.pool.release(self.kind, &self.model_id);
    }
}
