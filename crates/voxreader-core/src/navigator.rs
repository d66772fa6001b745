//! Tree navigation and focus tracking.
//!
//! The navigator owns the current focus (an interesting element plus its
//! reader) and implements the focus moves over the raw OS tree, filtered by
//! the interestingness predicate. It runs on the dedicated accessibility
//! thread; every gateway call here is a blocking OS round-trip.

use std::sync::Arc;

use crossbeam_channel::Receiver;

use voxreader_ax::{
    dump, Attr, AxCode, AxError, AxEvent, AxRange, AxResult, AxValue, DumpNode, Element, Gateway,
    Notification, Observer, Role,
};

use crate::input::keys::KeyStateProbe;
use crate::reader::{selection, Reader};
use crate::speech::SpeechScheduler;
use crate::tokens::OutputToken;

/// One navigator operation, as dispatched from the shortcut table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    ReadFocus,
    FocusParent,
    FocusFirstChild,
    FocusNextSibling { backwards: bool },
    Refocus { pid: i32 },
    DumpSystemWide,
    DumpApplication,
    DumpFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpKind {
    SystemWide,
    Application,
    Focus,
}

/// Consumer of finished element dumps (the file sink in the binary).
pub type DumpSink = Box<dyn FnMut(DumpKind, &DumpNode) + Send>;

// ── Interestingness ────────────────────────────────────────────────────────

/// Whether the user can land on this element: keyboard-focused, titled,
/// described, or of a navigable role; inside web content, only leaf roles
/// qualify (the containers there are structure, not content).
pub fn is_interesting(gw: &dyn Gateway, element: Element) -> AxResult<bool> {
    let role = gw.role(element)?;
    let base = gw.bool_attr(element, Attr::Focused)?
        || gw.string_attr(element, Attr::Title)?.is_some()
        || gw.string_attr(element, Attr::Description)?.is_some()
        || role.is_interesting_role();
    if !base {
        return Ok(false);
    }
    if has_web_area_ancestor(gw, element)? {
        Ok(role.is_leaf())
    } else {
        Ok(true)
    }
}

fn has_web_area_ancestor(gw: &dyn Gateway, element: Element) -> AxResult<bool> {
    let mut current = element;
    while let Some(parent) = gw.element_attr(current, Attr::Parent)? {
        if gw.role(parent)? == Role::WebArea {
            return Ok(true);
        }
        current = parent;
    }
    Ok(false)
}

// ── Filtered tree walks ────────────────────────────────────────────────────

/// First interesting element in the subtree below `element`, in navigation
/// order (reversed when `backwards`). Leaf-role children are skipped, not
/// descended into.
pub fn first_interesting_descendant(
    gw: &dyn Gateway,
    element: Element,
    backwards: bool,
) -> AxResult<Option<Element>> {
    let mut children = gw.children_in_navigation_order(element)?;
    if backwards {
        children.reverse();
    }
    for child in children {
        if is_interesting(gw, child)? {
            return Ok(Some(child));
        }
        if gw.role(child)?.is_leaf() {
            continue;
        }
        if let Some(found) = first_interesting_descendant(gw, child, backwards)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Next interesting element among the siblings of `element`, bubbling up
/// through uninteresting non-root ancestors when the row runs out.
pub fn next_interesting_sibling(
    gw: &dyn Gateway,
    element: Element,
    backwards: bool,
) -> AxResult<Option<Element>> {
    let Some(parent) = gw.element_attr(element, Attr::Parent)? else {
        return Ok(None);
    };
    let children = gw.children_in_navigation_order(parent)?;
    let Some(index) = children.iter().position(|c| *c == element) else {
        return Ok(None);
    };

    let remaining: Vec<Element> = if backwards {
        children[..index].iter().rev().copied().collect()
    } else {
        children[index + 1..].to_vec()
    };
    for candidate in remaining {
        if is_interesting(gw, candidate)? {
            return Ok(Some(candidate));
        }
        if let Some(found) = first_interesting_descendant(gw, candidate, backwards)? {
            return Ok(Some(found));
        }
    }

    let parent_role = gw.role(parent)?;
    if !parent_role.is_root() && !is_interesting(gw, parent)? {
        return next_interesting_sibling(gw, parent, backwards);
    }
    Ok(None)
}

/// First interesting ancestor. The climb stops short of root-role elements:
/// navigation never crosses a window or menu upward.
pub fn first_interesting_ancestor(gw: &dyn Gateway, element: Element) -> AxResult<Option<Element>> {
    let mut current = element;
    loop {
        let Some(parent) = gw.element_attr(current, Attr::Parent)? else {
            return Ok(None);
        };
        if gw.role(parent)?.is_root() {
            return Ok(None);
        }
        if is_interesting(gw, parent)? {
            return Ok(Some(parent));
        }
        current = parent;
    }
}

// ── Entity ────────────────────────────────────────────────────────────────

/// An element wrapped with the behavior the navigator needs from it.
#[derive(Clone)]
pub struct Entity {
    element: Element,
    gateway: Arc<dyn Gateway>,
}

impl Entity {
    pub fn new(gateway: Arc<dyn Gateway>, element: Element) -> Self {
        Entity { element, gateway }
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn get_parent(&self) -> AxResult<Option<Element>> {
        first_interesting_ancestor(&*self.gateway, self.element)
    }

    pub fn get_first_child(&self, backwards: bool) -> AxResult<Option<Element>> {
        first_interesting_descendant(&*self.gateway, self.element, backwards)
    }

    pub fn get_next_sibling(&self, backwards: bool) -> AxResult<Option<Element>> {
        next_interesting_sibling(&*self.gateway, self.element, backwards)
    }

    /// Push the OS keyboard focus onto this element, best effort. Elements
    /// that refuse the write get it routed to their focusable ancestor.
    pub fn set_keyboard_focus(&self) {
        let gw = &*self.gateway;
        let Ok(role) = gw.role(self.element) else { return };
        if !role.wants_keyboard_focus() {
            return;
        }
        let _ = gw.set_attribute(self.element, Attr::Focused, AxValue::Bool(true));
        if gw.bool_attr(self.element, Attr::Focused).unwrap_or(false) {
            return;
        }
        if let Ok(Some(ancestor)) = gw.element_attr(self.element, Attr::FocusableAncestor) {
            let _ = gw.set_attribute(ancestor, Attr::Focused, AxValue::Bool(true));
        }
    }

    /// Focus-group membership is the opaque focusable-ancestor attribute:
    /// two elements share a group iff their ancestors resolve to the same
    /// element.
    pub fn is_in_focus_group(&self, other: Element) -> AxResult<bool> {
        let mine = self.gateway.element_attr(self.element, Attr::FocusableAncestor)?;
        let theirs = self.gateway.element_attr(other, Attr::FocusableAncestor)?;
        Ok(matches!((mine, theirs), (Some(a), Some(b)) if a == b))
    }
}

/// The current focus: an entity, its reader, and the caches incremental
/// updates diff against.
pub struct Focus {
    pub entity: Entity,
    pub reader: Reader,
    last_selection: Option<AxRange>,
    last_selected_text: Option<String>,
    last_value: Option<String>,
    last_title: Option<String>,
}

impl Focus {
    fn new(entity: Entity, reader: Reader) -> Self {
        Focus {
            entity,
            reader,
            last_selection: None,
            last_selected_text: None,
            last_value: None,
            last_title: None,
        }
    }
}

enum Move {
    Parent,
    FirstChild,
    NextSibling { backwards: bool },
}

// ── Navigator ─────────────────────────────────────────────────────────────

pub struct Navigator {
    gateway: Arc<dyn Gateway>,
    scheduler: SpeechScheduler,
    probe: Arc<dyn KeyStateProbe>,
    dump_sink: Option<DumpSink>,
    app_pid: Option<i32>,
    app_element: Option<Element>,
    observer: Option<Box<dyn Observer>>,
    focus: Option<Focus>,
    announced_app: bool,
    awaiting_created: bool,
}

impl Navigator {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        scheduler: SpeechScheduler,
        probe: Arc<dyn KeyStateProbe>,
    ) -> Self {
        Navigator {
            gateway,
            scheduler,
            probe,
            dump_sink: None,
            app_pid: None,
            app_element: None,
            observer: None,
            focus: None,
            announced_app: false,
            awaiting_created: false,
        }
    }

    pub fn set_dump_sink(&mut self, sink: DumpSink) {
        self.dump_sink = Some(sink);
    }

    pub fn focused_element(&self) -> Option<Element> {
        self.focus.as_ref().map(|f| f.entity.element())
    }

    /// The current observer's event stream; a never-ready channel before the
    /// first retarget.
    pub fn event_receiver(&self) -> Receiver<AxEvent> {
        match &self.observer {
            Some(observer) => observer.events(),
            None => crossbeam_channel::never(),
        }
    }

    pub fn handle_command(&mut self, command: NavCommand) {
        match command {
            NavCommand::ReadFocus => self.read_focus(),
            NavCommand::FocusParent => self.focus_parent(),
            NavCommand::FocusFirstChild => self.focus_first_child(),
            NavCommand::FocusNextSibling { backwards } => self.focus_next_sibling(backwards),
            NavCommand::Refocus { pid } => self.refocus(pid),
            NavCommand::DumpSystemWide => self.dump_system_wide(),
            NavCommand::DumpApplication => self.dump_application(),
            NavCommand::DumpFocus => self.dump_focus(),
        }
    }

    // ── Public operations (error-bounded) ─────────────────────────────────

    pub fn read_focus(&mut self) {
        let result = self.read_focus_impl();
        self.absorb(result);
    }

    pub fn focus_parent(&mut self) {
        let result = self.move_impl(Move::Parent);
        self.absorb(result);
    }

    pub fn focus_first_child(&mut self) {
        let result = self.move_impl(Move::FirstChild);
        self.absorb(result);
    }

    pub fn focus_next_sibling(&mut self, backwards: bool) {
        let result = self.move_impl(Move::NextSibling { backwards });
        self.absorb(result);
    }

    /// Record the frontmost application without retargeting yet; the next
    /// operation that needs a target (a read with no focus, a stale-element
    /// recovery) performs the deferred retarget.
    pub fn set_frontmost(&mut self, pid: i32) {
        self.app_pid = Some(pid);
    }

    /// Retarget onto the frontmost application.
    pub fn refocus(&mut self, pid: i32) {
        let result = self.refocus_impl(pid);
        self.absorb(result);
    }

    pub fn dump_system_wide(&mut self) {
        let root = self.gateway.system_wide();
        let result = self.dump_impl(DumpKind::SystemWide, root);
        self.absorb(result);
    }

    pub fn dump_application(&mut self) {
        let Some(app) = self.app_element else { return };
        let result = self.dump_impl(DumpKind::Application, app);
        self.absorb(result);
    }

    pub fn dump_focus(&mut self) {
        let Some(element) = self.focused_element() else { return };
        let result = self.dump_impl(DumpKind::Focus, element);
        self.absorb(result);
    }

    pub fn handle_event(&mut self, event: AxEvent) {
        let result = self.handle_event_impl(&event);
        self.absorb(result);
    }

    // ── Error boundary ────────────────────────────────────────────────────

    /// The propagation policy: a stale element forces an immediate
    /// retarget; the other surfaced codes become their tokens. Degradable
    /// codes never reach here.
    fn absorb(&mut self, result: AxResult<()>) {
        let Err(err) = result else { return };
        match err.code() {
            AxCode::InvalidElement => {
                log::debug!("stale element; retargeting");
                self.focus = None;
                if let Some(pid) = self.app_pid {
                    if let Err(err) = self.refocus_impl(pid) {
                        self.emit_error(err);
                    }
                }
            }
            _ => self.emit_error(err),
        }
    }

    fn emit_error(&self, err: AxError) {
        let token = match err.code() {
            AxCode::ApiDisabled => OutputToken::ApiDisabled,
            AxCode::Timeout => OutputToken::Timeout,
            AxCode::NotImplemented => OutputToken::NotAccessible,
            code => {
                log::error!("unhandled surfaced code {code:?}");
                return;
            }
        };
        self.scheduler.convey(&[token]);
    }

    // ── Operations ────────────────────────────────────────────────────────

    fn read_focus_impl(&mut self) -> AxResult<()> {
        if self.focus.is_none() {
            if let Some(pid) = self.app_pid {
                return self.refocus_impl(pid);
            }
            self.scheduler.convey(&[OutputToken::NoFocus]);
            return Ok(());
        }
        let focus = self.focus.as_ref().unwrap();
        let tokens = focus.reader.read(&*self.gateway, focus.entity.element())?;
        self.refresh_caches()?;
        self.scheduler.convey(&tokens);
        Ok(())
    }

    fn refocus_impl(&mut self, pid: i32) -> AxResult<()> {
        self.app_pid = Some(pid);
        let app = self.gateway.application(pid);
        self.app_element = Some(app);

        let mut observer = self.gateway.observe(app)?;
        for kind in [
            Notification::AnnouncementRequested,
            Notification::ElementDestroyed,
            Notification::FocusedElementChanged,
            Notification::TitleChanged,
            Notification::ValueChanged,
            Notification::SelectedTextChanged,
            Notification::RowCountChanged,
        ] {
            observer.subscribe(kind)?;
        }
        self.observer = Some(observer);
        self.awaiting_created = false;

        let mut tokens = Vec::new();
        if !self.announced_app {
            if let Some(name) = self.gateway.string_attr(app, Attr::Title)? {
                tokens.push(OutputToken::Application(name));
            }
            self.announced_app = true;
        }

        let Some(seed) = self.resolve_seed(app)? else {
            self.focus = None;
            tokens.push(OutputToken::NoFocus);
            self.scheduler.convey(&tokens);
            // Watch for something to appear so focus can seed later;
            // unsubscribed again on the first successful retarget.
            if let Some(observer) = &mut self.observer {
                observer.subscribe(Notification::ElementCreated)?;
            }
            self.awaiting_created = true;
            return Ok(());
        };

        if let Some(window) = self.window_of(seed, app)? {
            if let Some(title) = self.gateway.string_attr(window, Attr::Title)? {
                tokens.push(OutputToken::Window(title));
            }
        }

        let reader = Reader::for_role(self.gateway.role(seed)?);
        self.focus = Some(Focus::new(Entity::new(Arc::clone(&self.gateway), seed), reader));
        tokens.extend(reader.read(&*self.gateway, seed)?);
        self.refresh_caches()?;
        self.scheduler.convey(&tokens);
        Ok(())
    }

    /// Seed preference: the application's reported focused element, else the
    /// focused window's first interesting descendant.
    fn resolve_seed(&self, app: Element) -> AxResult<Option<Element>> {
        if let Some(focused) = self.gateway.element_attr(app, Attr::FocusedElement)? {
            return Ok(Some(focused));
        }
        if let Some(window) = self.gateway.element_attr(app, Attr::FocusedWindow)? {
            return first_interesting_descendant(&*self.gateway, window, false);
        }
        Ok(None)
    }

    fn window_of(&self, element: Element, app: Element) -> AxResult<Option<Element>> {
        if let Some(window) = self.gateway.element_attr(element, Attr::Window)? {
            return Ok(Some(window));
        }
        if let Some(window) = self.gateway.element_attr(app, Attr::FocusedWindow)? {
            return Ok(Some(window));
        }
        // Fall back to climbing for a window-role ancestor.
        let mut current = element;
        while let Some(parent) = self.gateway.element_attr(current, Attr::Parent)? {
            if self.gateway.role(parent)? == Role::Window {
                return Ok(Some(parent));
            }
            current = parent;
        }
        Ok(None)
    }

    fn move_impl(&mut self, movement: Move) -> AxResult<()> {
        let Some(focus) = &self.focus else {
            self.scheduler.convey(&[OutputToken::NoFocus]);
            return Ok(());
        };
        let current = focus.entity.element();
        let current_reader = focus.reader;

        let target = match movement {
            Move::Parent => first_interesting_ancestor(&*self.gateway, current)?,
            Move::FirstChild => first_interesting_descendant(&*self.gateway, current, false)?,
            Move::NextSibling { backwards } => {
                next_interesting_sibling(&*self.gateway, current, backwards)?
            }
        };

        match target {
            Some(element) => {
                let lead = match movement {
                    Move::Parent => OutputToken::Exiting,
                    Move::FirstChild => OutputToken::Entering,
                    Move::NextSibling { backwards: false } => OutputToken::Next,
                    Move::NextSibling { backwards: true } => OutputToken::Previous,
                };
                let reader = Reader::for_role(self.gateway.role(element)?);
                let entity = Entity::new(Arc::clone(&self.gateway), element);
                entity.set_keyboard_focus();
                self.focus = Some(Focus::new(entity, reader));
                let mut tokens = vec![lead];
                tokens.extend(reader.read(&*self.gateway, element)?);
                self.refresh_caches()?;
                self.scheduler.convey(&tokens);
            }
            None => {
                let mut tokens = vec![OutputToken::Boundary];
                tokens.extend(current_reader.read(&*self.gateway, current)?);
                self.scheduler.convey(&tokens);
            }
        }
        Ok(())
    }

    fn dump_impl(&mut self, kind: DumpKind, element: Element) -> AxResult<()> {
        let Some(node) = dump(&*self.gateway, element, false, true)? else {
            return Ok(());
        };
        match &mut self.dump_sink {
            Some(sink) => sink(kind, &node),
            None => log::info!("dump of {kind:?} produced with no sink attached"),
        }
        Ok(())
    }

    // ── Event handling ────────────────────────────────────────────────────

    fn handle_event_impl(&mut self, event: &AxEvent) -> AxResult<()> {
        match event.kind {
            Notification::AnnouncementRequested => {
                if let Some(text) = event.announcement() {
                    self.scheduler.announce(text);
                }
                Ok(())
            }
            Notification::ElementDestroyed => self.on_destroyed(event.element),
            Notification::FocusedElementChanged => self.on_focus_changed(event.element),
            Notification::ElementCreated => self.on_created(),
            Notification::TitleChanged => self.on_title_changed(event.element),
            Notification::ValueChanged => self.on_value_changed(event.element),
            Notification::SelectedTextChanged => self.on_selection_changed(event.element),
            Notification::RowCountChanged => self.on_row_count_changed(event.element),
            Notification::FocusedWindowChanged => Ok(()),
        }
    }

    fn on_destroyed(&mut self, subject: Element) -> AxResult<()> {
        let Some(focus) = &self.focus else { return Ok(()) };
        if focus.entity.element() != subject {
            return Ok(());
        }
        // If the focus group's ancestor survived the teardown, the focus is
        // still anchored; otherwise reseed from the application.
        let survives = match self.gateway.element_attr(subject, Attr::FocusableAncestor) {
            Ok(Some(ancestor)) => self.gateway.role(ancestor).is_ok(),
            _ => false,
        };
        if survives {
            return Ok(());
        }
        self.focus = None;
        if let Some(pid) = self.app_pid {
            self.refocus_impl(pid)?;
        }
        Ok(())
    }

    fn on_focus_changed(&mut self, subject: Element) -> AxResult<()> {
        if let Some(focus) = &self.focus {
            if focus.entity.element() == subject {
                return Ok(());
            }
            if focus.entity.is_in_focus_group(subject)? {
                return Ok(());
            }
        }
        let reader = Reader::for_role(self.gateway.role(subject)?);
        self.focus = Some(Focus::new(Entity::new(Arc::clone(&self.gateway), subject), reader));
        let tokens = reader.read(&*self.gateway, subject)?;
        self.refresh_caches()?;
        self.scheduler.convey(&tokens);
        Ok(())
    }

    fn on_created(&mut self) -> AxResult<()> {
        if !self.awaiting_created {
            return Ok(());
        }
        let Some(pid) = self.app_pid else { return Ok(()) };
        // A successful retarget installs a fresh observer without the
        // element-created subscription, which is the unsubscribe.
        self.refocus_impl(pid)
    }

    fn on_title_changed(&mut self, subject: Element) -> AxResult<()> {
        if self.focused_element() != Some(subject) {
            return Ok(());
        }
        let title = self.gateway.string_attr(subject, Attr::Title)?;
        let focus = self.focus.as_mut().unwrap();
        if title == focus.last_title {
            return Ok(());
        }
        focus.last_title = title.clone();
        if let Some(title) = title {
            self.scheduler.convey(&[OutputToken::UpdatedLabel(title)]);
        }
        Ok(())
    }

    fn on_value_changed(&mut self, subject: Element) -> AxResult<()> {
        if self.focused_element() != Some(subject) {
            return Ok(());
        }
        let new_value = self
            .gateway
            .attribute(subject, Attr::Value)?
            .and_then(|v| v.as_text().map(str::to_string));
        let new_selected = self.gateway.string_attr(subject, Attr::SelectedText)?;

        let mut tokens = Vec::new();
        {
            let focus = self.focus.as_ref().unwrap();
            if let Some(new_value) = &new_value {
                let old = focus.last_value.as_deref().unwrap_or("");
                tokens.extend(selection::value_diff(old, new_value));
            }
            let old_selected = focus.last_selected_text.as_deref().unwrap_or("");
            if let Some(token) =
                selection::selected_text_delta(old_selected, new_selected.as_deref().unwrap_or(""))
            {
                tokens.push(token);
            }
        }

        let focus = self.focus.as_mut().unwrap();
        focus.last_value = new_value;
        focus.last_selected_text = new_selected;
        if !tokens.is_empty() {
            self.scheduler.convey(&tokens);
        }
        Ok(())
    }

    fn on_selection_changed(&mut self, subject: Element) -> AxResult<()> {
        if self.focused_element() != Some(subject) {
            return Ok(());
        }
        let Some(new) = self.gateway.range_attr(subject, Attr::SelectedTextRange)? else {
            return Ok(());
        };
        let old = self
            .focus
            .as_ref()
            .unwrap()
            .last_selection
            .unwrap_or(AxRange::new(new.start, 0));
        let tokens = selection::selection_delta(&*self.gateway, subject, old, new, &*self.probe)?;

        let focus = self.focus.as_mut().unwrap();
        focus.last_selection = Some(new);
        focus.last_selected_text = self.gateway.string_attr(subject, Attr::SelectedText)?;
        if !tokens.is_empty() {
            self.scheduler.convey(&tokens);
        }
        Ok(())
    }

    fn on_row_count_changed(&mut self, subject: Element) -> AxResult<()> {
        if self.focused_element() != Some(subject) {
            return Ok(());
        }
        if let Some(rows) = self
            .gateway
            .attribute(subject, Attr::Rows)?
            .and_then(|v| v.as_array().map(|items| items.len() as i64))
        {
            self.scheduler.convey(&[OutputToken::RowCount(rows)]);
        }
        Ok(())
    }

    fn refresh_caches(&mut self) -> AxResult<()> {
        let Some(focus) = &self.focus else { return Ok(()) };
        let element = focus.entity.element();
        let last_selection = self.gateway.range_attr(element, Attr::SelectedTextRange)?;
        let last_selected_text = self.gateway.string_attr(element, Attr::SelectedText)?;
        let last_value = self
            .gateway
            .attribute(element, Attr::Value)?
            .and_then(|v| v.as_text().map(str::to_string));
        let last_title = self.gateway.string_attr(element, Attr::Title)?;

        let focus = self.focus.as_mut().unwrap();
        focus.last_selection = last_selection;
        focus.last_selected_text = last_selected_text;
        focus.last_value = last_value;
        focus.last_title = last_title;
        Ok(())
    }
}
