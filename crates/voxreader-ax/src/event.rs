//! Accessibility events delivered through observers.

use std::collections::BTreeMap;

use crate::element::Element;
use crate::notification::Notification;
use crate::value::AxValue;

/// Payload key carrying the text of an announcement request.
pub const PAYLOAD_ANNOUNCEMENT: &str = "announcement";

/// One observed change: what happened, to which element, with what extras.
#[derive(Debug, Clone, PartialEq)]
pub struct AxEvent {
    pub kind: Notification,
    pub element: Element,
    pub payload: Option<BTreeMap<String, AxValue>>,
}

impl AxEvent {
    pub fn new(kind: Notification, element: Element) -> Self {
        AxEvent { kind, element, payload: None }
    }

    pub fn with_payload(kind: Notification, element: Element, payload: BTreeMap<String, AxValue>) -> Self {
        AxEvent { kind, element, payload: Some(payload) }
    }

    /// The announcement text, for `AnnouncementRequested` events.
    pub fn announcement(&self) -> Option<&str> {
        self.payload.as_ref()?.get(PAYLOAD_ANNOUNCEMENT)?.as_text()
    }
}
