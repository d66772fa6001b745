//! voxreader-ax — Typed facade over the OS accessibility API.
//!
//! Provides the value and error taxonomies, the attribute/role/notification
//! vocabularies, the `Gateway` trait that platform shims implement, element
//! tree dumps, and the `MockGateway` used by tests across the workspace.
//! Platform bindings (the raw FFI shims) live outside this workspace; every
//! consumer programs against `Gateway`.

pub mod attr;
pub mod dump;
pub mod element;
pub mod error;
pub mod event;
pub mod gateway;
pub mod mock;
pub mod notification;
pub mod role;
pub mod value;

pub use attr::{Attr, ParamAttr};
pub use dump::{dump, DumpNode};
pub use element::Element;
pub use error::{AxCode, AxError, AxResult};
pub use event::AxEvent;
pub use gateway::{Gateway, Observer};
pub use mock::MockGateway;
pub use notification::Notification;
pub use role::Role;
pub use value::{AxPoint, AxRange, AxRect, AxSize, AxValue};
