//! The gateway trait — the seam between the engine and the OS.

use crossbeam_channel::Receiver;

use crate::attr::{Attr, ParamAttr};
use crate::element::Element;
use crate::error::AxResult;
use crate::event::AxEvent;
use crate::notification::Notification;
use crate::role::Role;
use crate::value::{AxRange, AxValue};

/// Strongly-typed facade over the OS accessibility API.
///
/// Platform shims implement this; everything else in the workspace programs
/// against it. Every call is a blocking OS round-trip bounded by the
/// process-wide timeout (`set_timeout`, default 5.0 s), so callers run on
/// the dedicated accessibility thread, never the main loop.
///
/// Degradable result codes (missing values, unsupported attributes and
/// friends) never escape an implementation: they come back as `Ok(None)` or
/// a silent no-op. Only `InvalidElement`, `ApiDisabled`, `Timeout`, and
/// `NotImplemented` surface as errors.
pub trait Gateway: Send + Sync {
    /// The system-wide element (the root of everything).
    fn system_wide(&self) -> Element;

    /// The application element for a process id.
    fn application(&self, pid: i32) -> Element;

    /// Rehydrate a handle from its raw OS identity.
    fn from_opaque(&self, raw: u64) -> Element;

    /// Read an attribute by raw name. `Ok(None)` when absent or unsupported.
    fn raw_attribute(&self, element: Element, name: &str) -> AxResult<Option<AxValue>>;

    /// Write an attribute. Unsupported writes are a silent no-op.
    fn set_attribute(&self, element: Element, attr: Attr, value: AxValue) -> AxResult<()>;

    /// Run a parameterized query by raw name.
    fn raw_parameterized(
        &self,
        element: Element,
        name: &str,
        input: AxValue,
    ) -> AxResult<Option<AxValue>>;

    /// Names of every readable attribute on the element.
    fn list_attributes(&self, element: Element) -> AxResult<Vec<String>>;

    /// Names of every parameterized attribute on the element.
    fn list_parameterized_attributes(&self, element: Element) -> AxResult<Vec<String>>;

    /// `(id, description)` pairs for every action the element supports.
    fn list_actions(&self, element: Element) -> AxResult<Vec<(String, String)>>;

    fn perform_action(&self, element: Element, action: &str) -> AxResult<()>;

    /// Process-wide deadline for all gateway round-trips, in seconds.
    fn set_timeout(&self, seconds: f64);

    /// Ask the OS whether this process holds the accessibility-client
    /// privilege, prompting the user if not. Called exactly once at startup;
    /// on `false` the program exits cleanly.
    fn confirm_trusted(&self) -> bool;

    /// Create an observer attached to the element's process.
    fn observe(&self, element: Element) -> AxResult<Box<dyn Observer>>;

    // ── Typed convenience reads ────────────────────────────────────────────

    fn attribute(&self, element: Element, attr: Attr) -> AxResult<Option<AxValue>> {
        self.raw_attribute(element, attr.as_str())
    }

    fn parameterized(
        &self,
        element: Element,
        query: ParamAttr,
        input: AxValue,
    ) -> AxResult<Option<AxValue>> {
        self.raw_parameterized(element, query.as_str(), input)
    }

    /// Non-empty text content of a string-valued attribute.
    fn string_attr(&self, element: Element, attr: Attr) -> AxResult<Option<String>> {
        Ok(self
            .attribute(element, attr)?
            .and_then(|v| v.as_text().map(str::to_string))
            .filter(|s| !s.is_empty()))
    }

    fn bool_attr(&self, element: Element, attr: Attr) -> AxResult<bool> {
        Ok(self.attribute(element, attr)?.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    fn element_attr(&self, element: Element, attr: Attr) -> AxResult<Option<Element>> {
        Ok(self.attribute(element, attr)?.and_then(|v| v.as_element()))
    }

    fn elements_attr(&self, element: Element, attr: Attr) -> AxResult<Vec<Element>> {
        Ok(self
            .attribute(element, attr)?
            .and_then(|v| {
                v.as_array()
                    .map(|items| items.iter().filter_map(AxValue::as_element).collect())
            })
            .unwrap_or_default())
    }

    fn range_attr(&self, element: Element, attr: Attr) -> AxResult<Option<AxRange>> {
        Ok(self.attribute(element, attr)?.and_then(|v| v.as_range()))
    }

    /// Children in the order the user navigates them, preferring the
    /// dedicated navigation-order attribute and falling back to the plain
    /// children list.
    fn children_in_navigation_order(&self, element: Element) -> AxResult<Vec<Element>> {
        let ordered = self.elements_attr(element, Attr::ChildrenInNavigationOrder)?;
        if !ordered.is_empty() {
            return Ok(ordered);
        }
        self.elements_attr(element, Attr::Children)
    }

    fn role(&self, element: Element) -> AxResult<Role> {
        Ok(self
            .attribute(element, Attr::Role)?
            .and_then(|v| v.as_text().map(Role::from_ax))
            .unwrap_or(Role::Other))
    }
}

/// A per-process event subscription.
///
/// Subscribing registers interest in a notification kind; events arrive on
/// the receiver in OS delivery order. Dropping the observer finishes the
/// stream, so consumers can observe termination as a channel disconnect.
pub trait Observer: Send {
    fn subscribe(&mut self, kind: Notification) -> AxResult<()>;
    fn unsubscribe(&mut self, kind: Notification) -> AxResult<()>;

    /// The event stream. The receiver may be cloned; delivery is in OS order.
    fn events(&self) -> Receiver<AxEvent>;
}
