//! The resolution algorithm
//!
//! Turns a [`ServiceDefinition`] (plus optional runtime constructor
//! arguments) into a live instance, recursing depth-first through nested
//! argument references. Resolution is synchronous: one top-level call
//! either completes or fails atomically, and a failure anywhere mid-build
//! (constructor, setter call, property assignment) discards the half-built
//! instance and propagates.
//!
//! Cycle detection: each top-level call carries a [`ResolveCtx`] holding
//! the names currently being resolved. Re-entering a name on that stack is
//! a hard [`DiError::CircularDependency`], never a silent truncation.

use crate::class::Blueprint;
use crate::definition::{Argument, DefinitionKind, Instance, ServiceDefinition};
use crate::events::{EventOutcome, ResolveEvent};
use crate::{Container, DiError, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// In-progress name stack for one top-level `get`/`get_shared` call.
///
/// Created fresh per top-level call and unwound on completion or failure,
/// so independent calls never see each other's state.
pub(crate) struct ResolveCtx {
    stack: Vec<String>,
}

impl ResolveCtx {
    pub(crate) fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Push a name, failing if it is already being resolved in this call
    fn enter(&mut self, name: &str) -> Result<()> {
        if self.stack.iter().any(|n| n == name) {
            let mut chain = self.stack.clone();
            chain.push(name.to_string());
            return Err(DiError::circular(name, chain));
        }
        self.stack.push(name.to_string());
        Ok(())
    }

    fn exit(&mut self) {
        self.stack.pop();
    }
}

impl Container {
    /// Resolve one named service: cycle guard, before/after events,
    /// definition dispatch, and post-construction capability injection.
    pub(crate) fn resolve_named(
        &self,
        name: &str,
        definition: &ServiceDefinition,
        args: Option<&[Instance]>,
        ctx: &mut ResolveCtx,
    ) -> Result<Instance> {
        ctx.enter(name)?;
        let result = self.resolve_guarded(name, definition, args, ctx);
        ctx.exit();
        result
    }

    fn resolve_guarded(
        &self,
        name: &str,
        definition: &ServiceDefinition,
        args: Option<&[Instance]>,
        ctx: &mut ResolveCtx,
    ) -> Result<Instance> {
        if let Some(dispatcher) = self.dispatcher() {
            let before = ResolveEvent::BeforeResolve { name, args };
            if dispatcher.notify(&before) == EventOutcome::Stop {
                return Err(DiError::aborted(name));
            }
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "servitor",
            service = %name,
            shared = definition.shared,
            "Resolving service"
        );

        let instance = self.resolve_definition(definition, args, ctx)?;

        // Capability injection happens once, right after construction;
        // cached returns never re-inject.
        if let Some(aware) = self.classes().container_aware(&*instance) {
            #[cfg(feature = "logging")]
            trace!(
                target: "servitor",
                service = %name,
                "Injecting container into container-aware instance"
            );
            aware.set_container(self.clone());
        }

        if let Some(dispatcher) = self.dispatcher() {
            let after = ResolveEvent::AfterResolve {
                name,
                instance: &instance,
                args,
            };
            // A Stop answer after the fact has nothing left to stop.
            let _ = dispatcher.notify(&after);
        }

        Ok(instance)
    }

    /// One branch per registration style.
    fn resolve_definition(
        &self,
        definition: &ServiceDefinition,
        args: Option<&[Instance]>,
        ctx: &mut ResolveCtx,
    ) -> Result<Instance> {
        match &definition.kind {
            DefinitionKind::Literal(value) => Ok(Instance::clone(value)),

            DefinitionKind::ClassRef { class_name } => {
                let blueprint = self.blueprint(class_name)?;
                let built = blueprint.construct(args.unwrap_or(&[]))?;
                Ok(Arc::from(built))
            }

            DefinitionKind::Factory(builder) => Ok(builder()),

            DefinitionKind::Complex(recipe) => {
                let blueprint = self.blueprint(&recipe.class_name)?;

                let ctor_args = self.resolve_arguments(&recipe.arguments, ctx)?;
                let mut built = blueprint.construct(&ctor_args)?;

                for call in &recipe.calls {
                    let call_args = self.resolve_arguments(&call.arguments, ctx)?;
                    blueprint.call(&mut built, &call.method, &call_args)?;
                }

                for assignment in &recipe.properties {
                    let value = self.resolve_argument(&assignment.value, ctx)?;
                    blueprint.set_property(&mut built, &assignment.name, value)?;
                }

                Ok(Arc::from(built))
            }
        }
    }

    fn resolve_arguments(
        &self,
        arguments: &[Argument],
        ctx: &mut ResolveCtx,
    ) -> Result<Vec<Instance>> {
        let mut resolved = Vec::with_capacity(arguments.len());
        for argument in arguments {
            resolved.push(self.resolve_argument(argument, ctx)?);
        }
        Ok(resolved)
    }

    fn resolve_argument(&self, argument: &Argument, ctx: &mut ResolveCtx) -> Result<Instance> {
        match argument {
            Argument::Parameter { value } => Ok(Instance::clone(value)),

            // Nested references resolve through the registry only: no
            // bare-class fallback, unknown names are hard errors.
            Argument::Service { name } => {
                let definition = self
                    .registry()
                    .lookup(name)
                    .ok_or_else(|| DiError::unresolvable_argument(name))?;

                if definition.shared {
                    if let Some(cached) = self.registry().cached(name) {
                        return Ok(cached);
                    }
                }

                let instance = self.resolve_named(name, &definition, None, ctx)?;
                if definition.shared {
                    self.registry().cache(name, Instance::clone(&instance));
                }
                Ok(instance)
            }

            Argument::Instance {
                class_name,
                arguments,
            } => {
                let blueprint = self.blueprint(class_name)?;
                let nested = self.resolve_arguments(arguments, ctx)?;
                let built = blueprint.construct(&nested)?;
                Ok(Arc::from(built))
            }
        }
    }

    fn blueprint(&self, class_name: &str) -> Result<Arc<dyn Blueprint>> {
        self.classes()
            .resolve(class_name)
            .ok_or_else(|| DiError::class_not_found(class_name))
    }
}
