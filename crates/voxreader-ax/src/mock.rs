//! In-memory gateway for tests: synthetic trees, injected events, scripted
//! failures. Every crate in the workspace drives its tests through this.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::attr::{Attr, ParamAttr};
use crate::element::Element;
use crate::error::{AxCode, AxError, AxResult};
use crate::event::AxEvent;
use crate::gateway::{Gateway, Observer};
use crate::notification::Notification;
use crate::role::Role;
use crate::value::{AxRange, AxValue};

const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct Node {
    attrs: HashMap<String, AxValue>,
    actions: Vec<(String, String)>,
    performed: Vec<String>,
}

struct ObserverSlot {
    sender: Sender<AxEvent>,
    kinds: HashSet<Notification>,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<u64, Node>,
    next_id: u64,
    system_wide: u64,
    apps: HashMap<i32, u64>,
    trusted: bool,
    timeout: f64,
    observers: HashMap<u64, ObserverSlot>,
    next_observer: u64,
    fail: HashMap<u64, AxCode>,
    refuse_focus: HashSet<u64>,
}

/// A gateway backed by an in-memory tree instead of the OS.
#[derive(Clone)]
pub struct MockGateway {
    inner: Arc<Mutex<Inner>>,
}

impl MockGateway {
    pub fn new() -> Self {
        let mut inner = Inner { next_id: 1, trusted: true, timeout: 5.0, ..Inner::default() };
        let system_wide = inner.next_id;
        inner.next_id += 1;
        inner.nodes.insert(system_wide, Node::default());
        inner.system_wide = system_wide;
        MockGateway { inner: Arc::new(Mutex::new(inner)) }
    }

    // ── Tree construction ──────────────────────────────────────────────────

    /// Register an application element under a pid, titled `name`.
    pub fn add_application(&self, pid: i32, name: &str) -> Element {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.alloc();
        let node = inner.nodes.get_mut(&id).unwrap();
        node.attrs.insert(Attr::Role.as_str().into(), AxValue::String(Role::Application.as_ax().into()));
        node.attrs.insert(Attr::Title.as_str().into(), AxValue::String(name.into()));
        inner.apps.insert(pid, id);
        Element::from_raw(id)
    }

    /// Create a child with the given role, appended to the parent's children.
    pub fn add_child(&self, parent: Element, role: Role) -> Element {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.alloc();
        {
            let node = inner.nodes.get_mut(&id).unwrap();
            node.attrs.insert(Attr::Role.as_str().into(), AxValue::String(role.as_ax().into()));
            node.attrs.insert(Attr::Parent.as_str().into(), AxValue::Element(parent));
        }
        let parent_node = inner
            .nodes
            .get_mut(&parent.raw())
            .expect("add_child: parent not in tree");
        match parent_node
            .attrs
            .entry(Attr::Children.as_str().into())
            .or_insert_with(|| AxValue::Array(Vec::new()))
        {
            AxValue::Array(items) => items.push(AxValue::Element(Element::from_raw(id))),
            other => panic!("children attribute holds non-array {other:?}"),
        }
        Element::from_raw(id)
    }

    pub fn set_attr(&self, element: Element, attr: Attr, value: AxValue) {
        self.set_raw_attr(element, attr.as_str(), value);
    }

    pub fn set_raw_attr(&self, element: Element, name: &str, value: AxValue) {
        let mut inner = self.inner.lock().unwrap();
        let node = inner
            .nodes
            .get_mut(&element.raw())
            .expect("set_attr: element not in tree");
        node.attrs.insert(name.into(), value);
    }

    pub fn add_action(&self, element: Element, id: &str, description: &str) {
        let mut inner = self.inner.lock().unwrap();
        let node = inner
            .nodes
            .get_mut(&element.raw())
            .expect("add_action: element not in tree");
        node.actions.push((id.into(), description.into()));
    }

    // ── Scripted behavior ──────────────────────────────────────────────────

    pub fn set_trusted(&self, trusted: bool) {
        self.inner.lock().unwrap().trusted = trusted;
    }

    /// Make every subsequent call against `element` report `code`.
    pub fn fail_with(&self, element: Element, code: AxCode) {
        self.inner.lock().unwrap().fail.insert(element.raw(), code);
    }

    pub fn clear_failure(&self, element: Element) {
        self.inner.lock().unwrap().fail.remove(&element.raw());
    }

    /// Make `element` ignore writes to its `Focused` attribute (elements
    /// that refuse keyboard focus, to exercise the focusable-ancestor path).
    pub fn refuse_focus(&self, element: Element) {
        self.inner.lock().unwrap().refuse_focus.insert(element.raw());
    }

    /// Remove an element and its subtree; later calls on the removed handles
    /// report `InvalidElement`. Subscribed observers see `ElementDestroyed`
    /// for the removed root.
    pub fn destroy_element(&self, element: Element) {
        let senders = {
            let mut inner = self.inner.lock().unwrap();
            let mut doomed = vec![element.raw()];
            let mut queue = vec![element.raw()];
            while let Some(id) = queue.pop() {
                if let Some(node) = inner.nodes.get(&id) {
                    if let Some(AxValue::Array(kids)) = node.attrs.get(Attr::Children.as_str()) {
                        for kid in kids.iter().filter_map(AxValue::as_element) {
                            doomed.push(kid.raw());
                            queue.push(kid.raw());
                        }
                    }
                }
            }
            for id in &doomed {
                inner.nodes.remove(id);
            }
            // Detach from the surviving parent's children list.
            for node in inner.nodes.values_mut() {
                if let Some(AxValue::Array(kids)) = node.attrs.get_mut(Attr::Children.as_str()) {
                    kids.retain(|v| v.as_element() != Some(element));
                }
            }
            inner.senders_for(Notification::ElementDestroyed)
        };
        for sender in senders {
            let _ = sender.try_send(AxEvent::new(Notification::ElementDestroyed, element));
        }
    }

    /// Deliver an event to every observer subscribed to its kind.
    pub fn emit(&self, event: AxEvent) {
        let senders = self.inner.lock().unwrap().senders_for(event.kind);
        for sender in senders {
            let _ = sender.try_send(event.clone());
        }
    }

    /// Actions performed on an element, in order.
    pub fn performed_actions(&self, element: Element) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .nodes
            .get(&element.raw())
            .map(|n| n.performed.clone())
            .unwrap_or_default()
    }

    pub fn timeout(&self) -> f64 {
        self.inner.lock().unwrap().timeout
    }

    fn check(&self, inner: &Inner, element: Element) -> AxResult<()> {
        if let Some(&code) = inner.fail.get(&element.raw()) {
            if code.is_surfaced() {
                return Err(AxError::new(code));
            }
        }
        if inner.nodes.contains_key(&element.raw()) {
            Ok(())
        } else {
            Err(AxError::new(AxCode::InvalidElement))
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, Node::default());
        id
    }

    fn senders_for(&self, kind: Notification) -> Vec<Sender<AxEvent>> {
        self.observers
            .values()
            .filter(|slot| slot.kinds.contains(&kind))
            .map(|slot| slot.sender.clone())
            .collect()
    }
}

impl Gateway for MockGateway {
    fn system_wide(&self) -> Element {
        Element::from_raw(self.inner.lock().unwrap().system_wide)
    }

    fn application(&self, pid: i32) -> Element {
        let mut inner = self.inner.lock().unwrap();
        if let Some(&id) = inner.apps.get(&pid) {
            return Element::from_raw(id);
        }
        // The OS hands out a handle for any pid; an unregistered one just
        // behaves as an application nobody populated.
        let id = inner.alloc();
        let node = inner.nodes.get_mut(&id).unwrap();
        node.attrs.insert(Attr::Role.as_str().into(), AxValue::String(Role::Application.as_ax().into()));
        inner.apps.insert(pid, id);
        Element::from_raw(id)
    }

    fn from_opaque(&self, raw: u64) -> Element {
        Element::from_raw(raw)
    }

    fn raw_attribute(&self, element: Element, name: &str) -> AxResult<Option<AxValue>> {
        let inner = self.inner.lock().unwrap();
        self.check(&inner, element)?;
        if inner.fail.contains_key(&element.raw()) {
            // A scripted degradable code: the read degrades to no value.
            return Ok(None);
        }
        Ok(inner.nodes[&element.raw()].attrs.get(name).cloned())
    }

    fn set_attribute(&self, element: Element, attr: Attr, value: AxValue) -> AxResult<()> {
        let mut inner = self.inner.lock().unwrap();
        self.check(&inner, element)?;
        if attr == Attr::Focused && inner.refuse_focus.contains(&element.raw()) {
            return Ok(());
        }
        inner
            .nodes
            .get_mut(&element.raw())
            .unwrap()
            .attrs
            .insert(attr.as_str().into(), value);
        Ok(())
    }

    fn raw_parameterized(
        &self,
        element: Element,
        name: &str,
        input: AxValue,
    ) -> AxResult<Option<AxValue>> {
        let inner = self.inner.lock().unwrap();
        self.check(&inner, element)?;
        let Some(text) = inner.nodes[&element.raw()]
            .attrs
            .get(Attr::Value.as_str())
            .and_then(|v| v.as_text().map(str::to_string))
        else {
            return Ok(None);
        };
        let chars: Vec<char> = text.chars().collect();

        if name == ParamAttr::StringForRange.as_str() {
            let Some(range) = input.as_range() else { return Ok(None) };
            let start = range.start.max(0) as usize;
            let end = (range.end().max(0) as usize).min(chars.len());
            if start > end {
                return Ok(None);
            }
            return Ok(Some(AxValue::String(chars[start..end].iter().collect())));
        }

        if name == ParamAttr::LineForIndex.as_str() {
            let Some(index) = input.as_int() else { return Ok(None) };
            let index = (index.max(0) as usize).min(chars.len());
            let line = chars[..index].iter().filter(|&&c| c == '\n').count() as i64;
            return Ok(Some(AxValue::Int(line)));
        }

        if name == ParamAttr::RangeForLine.as_str() {
            let Some(line) = input.as_int() else { return Ok(None) };
            let mut start = 0usize;
            let mut current = 0i64;
            for (i, &c) in chars.iter().enumerate() {
                if current == line {
                    break;
                }
                if c == '\n' {
                    current += 1;
                    start = i + 1;
                }
            }
            if current != line {
                return Ok(None);
            }
            let len = chars[start..].iter().take_while(|&&c| c != '\n').count();
            return Ok(Some(AxValue::Range(AxRange::new(start as i64, len as i64))));
        }

        Ok(None)
    }

    fn list_attributes(&self, element: Element) -> AxResult<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        self.check(&inner, element)?;
        let mut names: Vec<String> = inner.nodes[&element.raw()].attrs.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn list_parameterized_attributes(&self, element: Element) -> AxResult<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        self.check(&inner, element)?;
        let has_text = inner.nodes[&element.raw()]
            .attrs
            .get(Attr::Value.as_str())
            .is_some_and(|v| v.as_text().is_some());
        if has_text {
            Ok(vec![
                ParamAttr::LineForIndex.as_str().into(),
                ParamAttr::RangeForLine.as_str().into(),
                ParamAttr::StringForRange.as_str().into(),
            ])
        } else {
            Ok(Vec::new())
        }
    }

    fn list_actions(&self, element: Element) -> AxResult<Vec<(String, String)>> {
        let inner = self.inner.lock().unwrap();
        self.check(&inner, element)?;
        Ok(inner.nodes[&element.raw()].actions.clone())
    }

    fn perform_action(&self, element: Element, action: &str) -> AxResult<()> {
        let mut inner = self.inner.lock().unwrap();
        self.check(&inner, element)?;
        inner
            .nodes
            .get_mut(&element.raw())
            .unwrap()
            .performed
            .push(action.to_string());
        Ok(())
    }

    fn set_timeout(&self, seconds: f64) {
        self.inner.lock().unwrap().timeout = seconds;
    }

    fn confirm_trusted(&self) -> bool {
        self.inner.lock().unwrap().trusted
    }

    fn observe(&self, element: Element) -> AxResult<Box<dyn Observer>> {
        let mut inner = self.inner.lock().unwrap();
        self.check(&inner, element)?;
        let (sender, receiver) = bounded(EVENT_CAPACITY);
        let id = inner.next_observer;
        inner.next_observer += 1;
        inner.observers.insert(id, ObserverSlot { sender, kinds: HashSet::new() });
        Ok(Box::new(MockObserver { id, inner: Arc::clone(&self.inner), receiver }))
    }
}

struct MockObserver {
    id: u64,
    inner: Arc<Mutex<Inner>>,
    receiver: Receiver<AxEvent>,
}

impl Observer for MockObserver {
    fn subscribe(&mut self, kind: Notification) -> AxResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(slot) = inner.observers.get_mut(&self.id) {
            slot.kinds.insert(kind);
        }
        Ok(())
    }

    fn unsubscribe(&mut self, kind: Notification) -> AxResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(slot) = inner.observers.get_mut(&self.id) {
            slot.kinds.remove(&kind);
        }
        Ok(())
    }

    fn events(&self) -> Receiver<AxEvent> {
        self.receiver.clone()
    }
}

impl Drop for MockObserver {
    fn drop(&mut self) {
        // Removing the slot drops the sender, finishing subscriber streams.
        self.inner.lock().unwrap().observers.remove(&self.id);
    }
}

/// Convenience payload builder for announcement events.
pub fn announcement_payload(text: &str) -> BTreeMap<String, AxValue> {
    BTreeMap::from([(crate::event::PAYLOAD_ANNOUNCEMENT.to_string(), AxValue::String(text.into()))])
}
