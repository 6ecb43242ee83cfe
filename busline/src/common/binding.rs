/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::any::{type_name, Any, TypeId};
use std::fmt::{self, Debug, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, trace};

use crate::common::types::{ErasedInvoker, Invoker};
use crate::message::{BusError, InvocationError, MessageId, Payload};
use crate::traits::{HandlerOutcome, MessageHandler};

/// How a handler method is marked: delivered inline on the dispatch thread, or
/// handed to the asynchronous worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marking {
    /// Runs on the dispatch thread (or the caller's thread for immediate posts).
    Sync,
    /// Runs on a worker of the asynchronous executor.
    Async,
}

/// A raw handler declaration, validated when its type is first registered.
///
/// The [`Bindings`] helper methods build well-formed declarations. Raw
/// declarations exist so that generated code can describe methods exactly as
/// written, including ones the bus will reject: a method carrying both
/// markings, or one taking more than a single parameter.
pub struct BindingDecl<T> {
    method: &'static str,
    message_id: MessageId,
    markings: Vec<Marking>,
    arity: usize,
    param: Option<&'static str>,
    invoker: Invoker<T>,
}

impl<T: MessageHandler> BindingDecl<T> {
    /// Declares `method` as a handler for `message_id`.
    ///
    /// The declaration starts with zero parameters; use
    /// [`with_param`](Self::with_param) or [`with_arity`](Self::with_arity)
    /// to describe the method signature.
    pub fn new(
        method: &'static str,
        message_id: MessageId,
        marking: Marking,
        invoker: impl Fn(&T, Option<&Payload>) -> Result<(), InvocationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            method,
            message_id,
            markings: vec![marking],
            arity: 0,
            param: None,
            invoker: Arc::new(invoker),
        }
    }

    /// Declares a method that can never be called, only described.
    ///
    /// Used for signatures the bus rejects at registration time.
    pub fn uncallable(method: &'static str, message_id: MessageId, marking: Marking) -> Self {
        Self::new(method, message_id, marking, move |_, _| {
            Err(InvocationError::Handler(anyhow::anyhow!(
                "{method} has no callable form"
            )))
        })
    }

    /// Adds another marking to the method.
    #[must_use]
    pub fn also_marked(mut self, marking: Marking) -> Self {
        if !self.markings.contains(&marking) {
            self.markings.push(marking);
        }
        self
    }

    /// Records the declared parameter type `P` (arity one).
    #[must_use]
    pub fn with_param<P: Any>(mut self) -> Self {
        self.param = Some(type_name::<P>());
        self.arity = 1;
        self
    }

    /// Records the number of parameters the method declares.
    #[must_use]
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }
}

/// Collects the handler bindings of one type.
///
/// Passed to [`MessageHandler::declare`]. Every method returns `&mut Self` so
/// declarations chain.
pub struct Bindings<T> {
    decls: Vec<BindingDecl<T>>,
}

impl<T: MessageHandler> Bindings<T> {
    pub(crate) const fn new() -> Self {
        Self { decls: Vec::new() }
    }

    /// Binds a parameterless synchronous handler to `message_id`.
    ///
    /// Any payload posted with the message is ignored.
    pub fn handle<F, R>(&mut self, message_id: MessageId, method: &'static str, handler: F) -> &mut Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        self.bind(Marking::Sync, message_id, method, handler)
    }

    /// Binds a synchronous handler that receives the payload as `&P`.
    pub fn handle_with<P, F, R>(&mut self, message_id: MessageId, method: &'static str, handler: F) -> &mut Self
    where
        P: Any + Send + Sync,
        F: Fn(&T, &P) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        self.bind_with(Marking::Sync, message_id, method, handler)
    }

    /// Binds a parameterless handler that runs on the worker pool.
    pub fn handle_async<F, R>(&mut self, message_id: MessageId, method: &'static str, handler: F) -> &mut Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        self.bind(Marking::Async, message_id, method, handler)
    }

    /// Binds a worker-pool handler that receives the payload as `&P`.
    pub fn handle_async_with<P, F, R>(&mut self, message_id: MessageId, method: &'static str, handler: F) -> &mut Self
    where
        P: Any + Send + Sync,
        F: Fn(&T, &P) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        self.bind_with(Marking::Async, message_id, method, handler)
    }

    /// Adds a raw declaration.
    pub fn declare(&mut self, decl: BindingDecl<T>) -> &mut Self {
        self.decls.push(decl);
        self
    }

    fn bind<F, R>(&mut self, marking: Marking, message_id: MessageId, method: &'static str, handler: F) -> &mut Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        self.declare(BindingDecl::new(method, message_id, marking, move |this, _payload| {
            handler(this).into_result().map_err(InvocationError::Handler)
        }))
    }

    fn bind_with<P, F, R>(&mut self, marking: Marking, message_id: MessageId, method: &'static str, handler: F) -> &mut Self
    where
        P: Any + Send + Sync,
        F: Fn(&T, &P) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        let decl = BindingDecl::new(method, message_id, marking, move |this, payload| {
            let value = payload
                .and_then(|payload| payload.downcast_ref::<P>())
                .ok_or_else(|| InvocationError::PayloadTypeMismatch {
                    expected: type_name::<P>(),
                    found: payload.map_or("<none>", Payload::type_name),
                })?;
            handler(this, value).into_result().map_err(InvocationError::Handler)
        })
        .with_param::<P>();
        self.declare(decl)
    }

    /// Validates every declaration and erases its owner type.
    ///
    /// Fails on the first invalid declaration. Declarations naming a method
    /// already seen for this type are dropped, so each method is bound once.
    pub(crate) fn into_bindings(self) -> Result<Vec<Arc<HandlerBinding>>, BusError> {
        let mut bindings: Vec<Arc<HandlerBinding>> = Vec::with_capacity(self.decls.len());
        for decl in self.decls {
            let binding = HandlerBinding::from_decl(decl)?;
            if bindings.iter().any(|existing| **existing == binding) {
                trace!(owner = binding.owner_name, method = binding.method, "Skipping duplicate binding");
                continue;
            }
            bindings.push(Arc::new(binding));
        }
        Ok(bindings)
    }
}

/// A validated, type-erased handler binding.
///
/// Two bindings are equal when they name the same method on the same type,
/// whatever message id they handle.
pub(crate) struct HandlerBinding {
    pub(crate) owner: TypeId,
    pub(crate) owner_name: &'static str,
    pub(crate) method: &'static str,
    pub(crate) message_id: MessageId,
    pub(crate) param: Option<&'static str>,
    pub(crate) asynchronous: bool,
    invoker: ErasedInvoker,
}

impl HandlerBinding {
    fn from_decl<T: MessageHandler>(decl: BindingDecl<T>) -> Result<Self, BusError> {
        let owner_name = type_name::<T>();
        let asynchronous = decl.markings.contains(&Marking::Async);
        if asynchronous && decl.markings.contains(&Marking::Sync) {
            return Err(BusError::ConflictingBinding {
                owner: owner_name,
                method: decl.method,
            });
        }
        if decl.arity > 1 {
            return Err(BusError::InvalidBindingSignature {
                owner: owner_name,
                method: decl.method,
                arity: decl.arity,
            });
        }

        let typed = decl.invoker;
        let invoker: ErasedInvoker = Arc::new(move |instance: &(dyn Any + Send + Sync), payload| {
            let this = instance
                .downcast_ref::<T>()
                .ok_or(InvocationError::InstanceMismatch { expected: owner_name })?;
            typed(this, payload)
        });

        Ok(Self {
            owner: TypeId::of::<T>(),
            owner_name,
            method: decl.method,
            message_id: decl.message_id,
            param: decl.param,
            asynchronous,
            invoker,
        })
    }

    /// Calls the handler on `instance`, converting a panic into an error.
    pub(crate) fn invoke(
        &self,
        instance: &(dyn Any + Send + Sync),
        payload: Option<&Payload>,
    ) -> Result<(), InvocationError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.invoker)(instance, payload))) {
            Ok(result) => result,
            Err(panic) => Err(InvocationError::Panicked(panic_message(panic.as_ref()))),
        }
    }

    /// Calls the handler and logs any failure instead of returning it.
    pub(crate) fn invoke_logged(&self, instance: &(dyn Any + Send + Sync), payload: Option<&Payload>) {
        trace!(message_id = self.message_id, owner = self.owner_name, method = self.method, "Invoking handler");
        if let Err(err) = self.invoke(instance, payload) {
            error!(
                message_id = self.message_id,
                owner = self.owner_name,
                method = self.method,
                "Handler invocation failed: {err}"
            );
        }
    }
}

impl PartialEq for HandlerBinding {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.method == other.method
    }
}

impl Eq for HandlerBinding {}

impl Debug for HandlerBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("owner", &self.owner_name)
            .field("method", &self.method)
            .field("message_id", &self.message_id)
            .field("param", &self.param)
            .field("asynchronous", &self.asynchronous)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
