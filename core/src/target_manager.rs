//! Tree of CDP targets/sessions and their lifecycle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::cdp::messages::{SessionId, TargetId, TargetInfo};
use crate::thread::Thread;

const ATTACHABLE_TYPES: &[&str] = &["page", "iframe", "worker", "node"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEvent {
    Attached,
    /// `was_main` is set when the detached target was the session's main
    /// target — the signal that ends the whole debug session.
    Detached { was_main: bool },
}

pub struct Target {
    pub target_id: TargetId,
    pub session_id: SessionId,
    pub info: RefCell<TargetInfo>,
    pub parent: Option<Weak<Target>>,
    pub children: RefCell<Vec<Rc<Target>>>,
    pub thread: RefCell<Option<Rc<Thread>>>,
}

impl Target {
    pub fn is_attachable(type_: &str) -> bool {
        ATTACHABLE_TYPES.contains(&type_)
    }
}

#[derive(Default)]
pub struct TargetManager {
    by_session: RefCell<HashMap<SessionId, Rc<Target>>>,
    by_target_id: RefCell<HashMap<TargetId, Rc<Target>>>,
    main_target: RefCell<Option<TargetId>>,
    listeners: RefCell<Vec<Box<dyn Fn(TargetEvent, &Rc<Target>)>>>,
}

impl TargetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&self, listener: impl Fn(TargetEvent, &Rc<Target>) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    fn notify(&self, event: TargetEvent, target: &Rc<Target>) {
        for listener in self.listeners.borrow().iter() {
            listener(event, target);
        }
    }

    /// Registers a newly attached target from `Target.attachedToTarget`.
    /// The first page target ever attached becomes the "main target" —
    /// an imperfect heuristic (a page that reloads into a new target id
    /// is not re-detected as main) accepted as a known limitation.
    pub fn attach(
        &self,
        info: TargetInfo,
        session_id: SessionId,
        parent_session: Option<&SessionId>,
        thread: Option<Rc<Thread>>,
    ) -> Rc<Target> {
        let parent = parent_session.and_then(|s| self.by_session.borrow().get(s).cloned());

        let target = Rc::new(Target {
            target_id: info.target_id.clone(),
            session_id: session_id.clone(),
            info: RefCell::new(info.clone()),
            parent: parent.as_ref().map(Rc::downgrade),
            children: RefCell::new(Vec::new()),
            thread: RefCell::new(thread),
        });

        if let Some(parent) = &parent {
            parent.children.borrow_mut().push(target.clone());
        }

        if info.type_ == "page" && self.main_target.borrow().is_none() {
            *self.main_target.borrow_mut() = Some(info.target_id.clone());
        }

        self.by_session.borrow_mut().insert(session_id, target.clone());
        self.by_target_id
            .borrow_mut()
            .insert(info.target_id.clone(), target.clone());

        self.notify(TargetEvent::Attached, &target);
        target
    }

    pub fn target_by_session(&self, session_id: &SessionId) -> Option<Rc<Target>> {
        self.by_session.borrow().get(session_id).cloned()
    }

    pub fn target_by_id(&self, target_id: &TargetId) -> Option<Rc<Target>> {
        self.by_target_id.borrow().get(target_id).cloned()
    }

    pub fn is_main_target(&self, target_id: &TargetId) -> bool {
        self.main_target.borrow().as_deref() == Some(target_id.as_str())
    }

    /// Depth-first detach: children are detached and torn down before
    /// their parent, which is itself removed from the global tables and
    /// from its own parent's children list.
    pub fn detach(&self, session_id: &SessionId) {
        let Some(target) = self.by_session.borrow().get(session_id).cloned() else {
            return;
        };

        let children: Vec<Rc<Target>> = target.children.borrow().clone();
        for child in children {
            self.detach(&child.session_id);
        }

        if let Some(parent) = target.parent.as_ref().and_then(|p| p.upgrade()) {
            parent.children.borrow_mut().retain(|c| !Rc::ptr_eq(c, &target));
        }

        self.by_session.borrow_mut().remove(session_id);
        self.by_target_id.borrow_mut().remove(&target.target_id);

        let was_main = self.main_target.borrow().as_deref() == Some(target.target_id.as_str());
        if was_main {
            *self.main_target.borrow_mut() = None;
        }

        // Notified with the thread still attached so listeners can read
        // which Thread owned this target before it's disposed.
        self.notify(TargetEvent::Detached { was_main }, &target);

        if let Some(thread) = target.thread.borrow_mut().take() {
            thread.dispose();
        }
    }

    pub fn update_info(&self, target_id: &TargetId, info: TargetInfo) {
        if let Some(target) = self.target_by_id(target_id) {
            *target.info.borrow_mut() = info;
        }
    }

    pub fn targets(&self) -> Vec<Rc<Target>> {
        self.by_target_id.borrow().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str, type_: &str) -> TargetInfo {
        TargetInfo {
            target_id: id.to_string(),
            type_: type_.to_string(),
            title: String::new(),
            url: "http://localhost/".to_string(),
            attached: true,
            opener_id: None,
            browser_context_id: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn first_page_target_becomes_main() {
        let manager = TargetManager::new();
        manager.attach(info("t1", "page"), SessionId("s1".into()), None, None);
        assert!(manager.is_main_target(&"t1".to_string()));
    }

    #[test]
    fn subsequent_page_targets_do_not_steal_main() {
        let manager = TargetManager::new();
        manager.attach(info("t1", "page"), SessionId("s1".into()), None, None);
        manager.attach(info("t2", "page"), SessionId("s2".into()), None, None);
        assert!(manager.is_main_target(&"t1".to_string()));
        assert!(!manager.is_main_target(&"t2".to_string()));
    }

    #[test]
    fn detach_is_depth_first_and_removes_child_from_parent() {
        let manager = TargetManager::new();
        let parent_session = SessionId("parent".into());
        manager.attach(info("parent", "page"), parent_session.clone(), None, None);
        manager.attach(
            info("child", "iframe"),
            SessionId("child".into()),
            Some(&parent_session),
            None,
        );

        let parent = manager.target_by_id(&"parent".to_string()).unwrap();
        assert_eq!(parent.children.borrow().len(), 1);

        manager.detach(&parent_session);
        assert!(manager.target_by_id(&"parent".to_string()).is_none());
        assert!(manager.target_by_id(&"child".to_string()).is_none());
    }

    #[test]
    fn detaching_main_target_clears_main() {
        let manager = TargetManager::new();
        let session = SessionId("s1".into());
        manager.attach(info("t1", "page"), session.clone(), None, None);
        manager.detach(&session);
        assert!(!manager.is_main_target(&"t1".to_string()));
    }

    #[test]
    fn detach_event_flags_the_main_target() {
        let manager = TargetManager::new();
        let seen = Rc::new(RefCell::new(None));
        let seen_write = seen.clone();
        manager.on_event(move |event, _| {
            if let TargetEvent::Detached { was_main } = event {
                *seen_write.borrow_mut() = Some(was_main);
            }
        });

        let session = SessionId("s1".into());
        manager.attach(info("t1", "page"), session.clone(), None, None);
        manager.detach(&session);
        assert_eq!(*seen.borrow(), Some(true));
    }

    #[test]
    fn detach_event_does_not_flag_a_non_main_target() {
        let manager = TargetManager::new();
        let seen = Rc::new(RefCell::new(None));
        let seen_write = seen.clone();
        manager.on_event(move |event, _| {
            if let TargetEvent::Detached { was_main } = event {
                *seen_write.borrow_mut() = Some(was_main);
            }
        });

        let main_session = SessionId("s1".into());
        manager.attach(info("t1", "page"), main_session, None, None);
        let other_session = SessionId("s2".into());
        manager.attach(info("t2", "page"), other_session.clone(), None, None);
        manager.detach(&other_session);
        assert_eq!(*seen.borrow(), Some(false));
    }
}
