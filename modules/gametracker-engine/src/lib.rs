//! Typed payload dispatch and mode-data persistence.
//!
//! A `TypeRegistry` maps payload type identifiers to decode/apply handlers and
//! is built once at startup. The `Dispatcher` runs an envelope's content
//! through it against a target aggregate. The `codec` module is the only place
//! that knows how `ModeData` variants are tagged in the document store.

pub mod codec;
pub mod dispatch;
pub mod payloads;
pub mod persist;
pub mod registry;
pub mod traits;

pub use codec::{CodecError, HistoricGameDocument, LiveGameDocument, ModeDataDocument};
pub use dispatch::{Coverage, DispatchError, Dispatcher};
pub use payloads::{historic_registry, live_registry};
pub use persist::{MemoryGameRepository, PgGameRepository};
pub use registry::{TypeRegistry, TypeRegistryBuilder};
pub use traits::{GameRepository, RepositoryError};
