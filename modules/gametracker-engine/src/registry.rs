//! TypeRegistry: type identifier → (decode, apply) handler table.
//!
//! Built once at startup with `TypeRegistry::builder()` and read-only after
//! `build()`. Share it by reference (or `Arc`); nothing mutates it while
//! events are being processed.

use std::collections::HashMap;
use std::fmt;

use gametracker_common::GameTrackerError;
use serde::de::DeserializeOwned;

/// Why a registered handler could not finish.
pub(crate) enum HandlerError {
    Decode(serde_json::Error),
    Apply(GameTrackerError),
}

pub(crate) type Handler<T> = Box<dyn Fn(&[u8], &mut T) -> Result<(), HandlerError> + Send + Sync>;

/// Handler table for payloads applied to targets of type `T`.
pub struct TypeRegistry<T> {
    handlers: HashMap<String, Handler<T>>,
}

impl<T: 'static> TypeRegistry<T> {
    pub fn builder() -> TypeRegistryBuilder<T> {
        TypeRegistryBuilder {
            handlers: HashMap::new(),
        }
    }
}

impl<T> TypeRegistry<T> {
    /// `None` for unregistered identifiers. That is an expected outcome, not
    /// an error: producers may be ahead of this build.
    pub(crate) fn lookup(&self, type_id: &str) -> Option<&Handler<T>> {
        self.handlers.get(type_id)
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.handlers.contains_key(type_id)
    }

    /// Registered identifiers, sorted.
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T> fmt::Debug for TypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("type_ids", &self.type_ids())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct TypeRegistryBuilder<T> {
    handlers: HashMap<String, Handler<T>>,
}

impl<T: 'static> TypeRegistryBuilder<T> {
    /// Associate `type_id` with a decoder and an apply function.
    ///
    /// # Panics
    ///
    /// If `type_id` is already registered. Registration happens at startup,
    /// so a duplicate is a wiring bug.
    pub fn register<P, D, A>(mut self, type_id: &str, decode: D, apply: A) -> Self
    where
        P: 'static,
        D: Fn(&[u8]) -> Result<P, serde_json::Error> + Send + Sync + 'static,
        A: Fn(P, &mut T) -> Result<(), GameTrackerError> + Send + Sync + 'static,
    {
        assert!(
            !self.handlers.contains_key(type_id),
            "payload type {type_id:?} registered twice"
        );

        let handler: Handler<T> = Box::new(move |bytes: &[u8], target: &mut T| {
            let value = decode(bytes).map_err(HandlerError::Decode)?;
            apply(value, target).map_err(HandlerError::Apply)
        });
        self.handlers.insert(type_id.to_string(), handler);
        self
    }

    /// Register a payload whose bytes are a JSON body.
    pub fn register_json<P, A>(self, type_id: &str, apply: A) -> Self
    where
        P: DeserializeOwned + 'static,
        A: Fn(P, &mut T) -> Result<(), GameTrackerError> + Send + Sync + 'static,
    {
        self.register(type_id, |bytes: &[u8]| serde_json::from_slice::<P>(bytes), apply)
    }

    pub fn build(self) -> TypeRegistry<T> {
        TypeRegistry {
            handlers: self.handlers,
        }
    }
}
