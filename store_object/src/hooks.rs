//! Model lifecycle hooks
//!
//! Hooks are plain callbacks registered against a lifecycle event and phase.
//! The store and query builder invoke them at fixed points, in registration
//! order. A hook cannot cancel the operation it observes.

use crate::query_builder::ModelQueryBuilder;
use crate::traits::Model;
use std::fmt;
use std::sync::Arc;

/// Hook receiving a query before it runs
pub type QueryHook<M> = Arc<dyn Fn(&mut ModelQueryBuilder<M>) + Send + Sync>;

/// Hook receiving the count query and the main query of a paginated call
pub type PaginateHook<M> =
    Arc<dyn Fn(&mut ModelQueryBuilder<M>, &mut ModelQueryBuilder<M>) + Send + Sync>;

/// Hook receiving a single model instance
pub type InstanceHook<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Hook receiving the models a query returned
pub type ResultsHook<M> = Arc<dyn Fn(&[M]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Single row lookups (`first`, `find`)
    Find,
    /// Multi row queries (`exec`, `all`, `count`)
    Fetch,
    Paginate,
    Save,
    Delete,
}

enum Hook<M: Model> {
    Query(QueryHook<M>),
    Paginate(PaginateHook<M>),
    Instance(InstanceHook<M>),
    Results(ResultsHook<M>),
}

impl<M: Model> Clone for Hook<M> {
    fn clone(&self) -> Self {
        match self {
            Hook::Query(hook) => Hook::Query(Arc::clone(hook)),
            Hook::Paginate(hook) => Hook::Paginate(Arc::clone(hook)),
            Hook::Instance(hook) => Hook::Instance(Arc::clone(hook)),
            Hook::Results(hook) => Hook::Results(Arc::clone(hook)),
        }
    }
}

struct Registration<M: Model> {
    phase: HookPhase,
    event: LifecycleEvent,
    hook: Hook<M>,
}

/// Ordered list of hooks for one model type
pub struct HookRegistry<M: Model> {
    registrations: Vec<Registration<M>>,
}

impl<M: Model> fmt::Debug for HookRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("model", &M::model_name())
            .field("hook_count", &self.len())
            .finish()
    }
}

impl<M: Model> Clone for HookRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            registrations: self
                .registrations
                .iter()
                .map(|registration| Registration {
                    phase: registration.phase,
                    event: registration.event,
                    hook: registration.hook.clone(),
                })
                .collect(),
        }
    }
}

impl<M: Model> Default for HookRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> HookRegistry<M> {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    fn register(&mut self, phase: HookPhase, event: LifecycleEvent, hook: Hook<M>) -> &mut Self {
        self.registrations.push(Registration { phase, event, hook });
        self
    }

    pub fn before_find<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut ModelQueryBuilder<M>) + Send + Sync + 'static,
    {
        self.register(HookPhase::Before, LifecycleEvent::Find, Hook::Query(Arc::new(hook)))
    }

    pub fn before_fetch<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut ModelQueryBuilder<M>) + Send + Sync + 'static,
    {
        self.register(HookPhase::Before, LifecycleEvent::Fetch, Hook::Query(Arc::new(hook)))
    }

    /// The first argument is the count query, the second the main query
    pub fn before_paginate<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut ModelQueryBuilder<M>, &mut ModelQueryBuilder<M>) + Send + Sync + 'static,
    {
        self.register(
            HookPhase::Before,
            LifecycleEvent::Paginate,
            Hook::Paginate(Arc::new(hook)),
        )
    }

    pub fn after_find<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.register(HookPhase::After, LifecycleEvent::Find, Hook::Instance(Arc::new(hook)))
    }

    pub fn after_fetch<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&[M]) + Send + Sync + 'static,
    {
        self.register(HookPhase::After, LifecycleEvent::Fetch, Hook::Results(Arc::new(hook)))
    }

    pub fn after_paginate<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&[M]) + Send + Sync + 'static,
    {
        self.register(
            HookPhase::After,
            LifecycleEvent::Paginate,
            Hook::Results(Arc::new(hook)),
        )
    }

    pub fn before_save<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.register(HookPhase::Before, LifecycleEvent::Save, Hook::Instance(Arc::new(hook)))
    }

    pub fn after_save<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.register(HookPhase::After, LifecycleEvent::Save, Hook::Instance(Arc::new(hook)))
    }

    pub fn before_delete<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.register(HookPhase::Before, LifecycleEvent::Delete, Hook::Instance(Arc::new(hook)))
    }

    pub fn after_delete<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.register(HookPhase::After, LifecycleEvent::Delete, Hook::Instance(Arc::new(hook)))
    }

    fn matching(
        &self,
        phase: HookPhase,
        event: LifecycleEvent,
    ) -> impl Iterator<Item = &Hook<M>> + '_ {
        self.registrations
            .iter()
            .filter(move |registration| registration.phase == phase && registration.event == event)
            .map(|registration| &registration.hook)
    }

    pub(crate) fn run_query(&self, event: LifecycleEvent, query: &mut ModelQueryBuilder<M>) {
        for hook in self.matching(HookPhase::Before, event) {
            if let Hook::Query(hook) = hook {
                hook(query);
            }
        }
    }

    pub(crate) fn run_paginate(
        &self,
        count_query: &mut ModelQueryBuilder<M>,
        query: &mut ModelQueryBuilder<M>,
    ) {
        for hook in self.matching(HookPhase::Before, LifecycleEvent::Paginate) {
            if let Hook::Paginate(hook) = hook {
                hook(count_query, query);
            }
        }
    }

    pub(crate) fn run_instance(&self, phase: HookPhase, event: LifecycleEvent, model: &M) {
        for hook in self.matching(phase, event) {
            if let Hook::Instance(hook) = hook {
                hook(model);
            }
        }
    }

    pub(crate) fn run_results(&self, event: LifecycleEvent, models: &[M]) {
        for hook in self.matching(HookPhase::After, event) {
            if let Hook::Results(hook) = hook {
                hook(models);
            }
        }
    }

    /// Number of hooks registered for an event and phase
    pub fn count(&self, phase: HookPhase, event: LifecycleEvent) -> usize {
        self.matching(phase, event).count()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
