//! Lazy, async-linked call-stack materialization.
//!
//! A CDP pause hands over the synchronous call frames eagerly; anything
//! beyond that (frames from an `async function` caller) is only fetched
//! once the client asks for more frames than are already on hand, via
//! `Debugger.getStackTrace` for the referenced parent id.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cdp::messages::{AsyncStackTrace, CallFrame, RuntimeCallFrame, StackTraceId};
use crate::source_container::UiLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub i64);

#[derive(Debug, Clone)]
pub struct StackFrame {
    pub id: FrameId,
    pub name: String,
    pub location: Option<UiLocation>,
    pub call_frame_id: Option<String>,
    pub is_async_separator: bool,
}

/// One materialized segment of the call stack: the frames known so far,
/// plus (optionally) a parent chain id CDP can expand on demand.
#[derive(Debug, Default)]
pub struct StackTrace {
    frames: RefCell<Vec<StackFrame>>,
    pending_parent: RefCell<Option<AsyncStackTrace>>,
    /// Set once the inlined `pending_parent` chain runs out but the pause
    /// (or the last expanded segment) still named a continuation id;
    /// `expand`'s caller resolves it via `Debugger.getStackTrace`.
    pending_parent_id: RefCell<Option<StackTraceId>>,
    exhausted: RefCell<bool>,
}

impl StackTrace {
    /// Builds the initial segment from a pause's synchronous call frames,
    /// translating each to an allocated [`FrameId`] and [`UiLocation`] via
    /// `locate`. `parent` is the pause's `asyncStackTrace`, expanded lazily.
    pub fn from_paused(
        call_frames: &[CallFrame],
        parent: Option<AsyncStackTrace>,
        parent_id: Option<StackTraceId>,
        mut allocate_id: impl FnMut() -> FrameId,
        mut locate: impl FnMut(&CallFrame) -> Option<UiLocation>,
    ) -> Self {
        let frames = call_frames
            .iter()
            .map(|cf| StackFrame {
                id: allocate_id(),
                name: if cf.function_name.is_empty() {
                    "(anonymous)".to_string()
                } else {
                    cf.function_name.clone()
                },
                location: locate(cf),
                call_frame_id: Some(cf.call_frame_id.clone()),
                is_async_separator: false,
            })
            .collect();
        Self {
            frames: RefCell::new(frames),
            pending_parent: RefCell::new(parent),
            pending_parent_id: RefCell::new(parent_id),
            exhausted: RefCell::new(false),
        }
    }

    /// A continuation id the caller should resolve via
    /// `Debugger.getStackTrace` before the inlined chain is exhausted but
    /// after `pending_parent` itself has none left to hand back directly.
    pub fn pending_parent_id(&self) -> Option<StackTraceId> {
        self.pending_parent_id.borrow().clone()
    }

    pub fn materialized_count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn frames(&self) -> Vec<StackFrame> {
        self.frames.borrow().clone()
    }

    pub fn has_more(&self) -> bool {
        !*self.exhausted.borrow()
    }

    /// Expands one more async-linked segment, prepending a synthetic
    /// separator frame and dropping the first call frame of a consecutive
    /// "async function" segment to avoid a duplicated entry.
    ///
    /// `fetch_more` resolves `Debugger.getStackTrace({stackTraceId})` for a
    /// deferred parent id when the inlined chain runs out; it returns
    /// `None` once there is truly nothing left.
    pub async fn expand(
        &self,
        mut allocate_id: impl FnMut() -> FrameId,
        mut locate: impl FnMut(&RuntimeCallFrame) -> Option<UiLocation>,
        fetch_more: impl std::future::Future<Output = Option<AsyncStackTrace>>,
    ) {
        let Some(segment) = self.pending_parent.borrow_mut().take() else {
            if !*self.exhausted.borrow() {
                if let Some(more) = fetch_more.await {
                    self.append_segment(more, &mut allocate_id, &mut locate);
                    return;
                }
            }
            *self.exhausted.borrow_mut() = true;
            return;
        };
        self.append_segment(segment, &mut allocate_id, &mut locate);
    }

    fn append_segment(
        &self,
        segment: AsyncStackTrace,
        allocate_id: &mut impl FnMut() -> FrameId,
        locate: &mut impl FnMut(&RuntimeCallFrame) -> Option<UiLocation>,
    ) {
        let was_async_function = self
            .frames
            .borrow()
            .last()
            .map(|f| f.name.starts_with("async "))
            .unwrap_or(false);

        let mut frames = self.frames.borrow_mut();
        frames.push(StackFrame {
            id: allocate_id(),
            name: segment.description.clone().unwrap_or_else(|| "async".to_string()),
            location: None,
            call_frame_id: None,
            is_async_separator: true,
        });

        let mut call_frames = segment.call_frames.iter();
        if was_async_function {
            call_frames.next();
        }
        for cf in call_frames {
            frames.push(StackFrame {
                id: allocate_id(),
                name: if cf.function_name.is_empty() {
                    "(anonymous)".to_string()
                } else {
                    cf.function_name.clone()
                },
                // Async parent frames carry only a script/line/column, not
                // a full synchronous CallFrame, so there is no call-frame
                // id to resolve scopes against.
                location: locate(cf),
                call_frame_id: None,
                is_async_separator: false,
            });
        }

        *self.pending_parent_id.borrow_mut() = segment.parent_id.clone();
        *self.pending_parent.borrow_mut() = segment.parent.map(|b| *b);
        if self.pending_parent.borrow().is_none() && self.pending_parent_id.borrow().is_none() {
            *self.exhausted.borrow_mut() = true;
        }
    }
}

pub type SharedStackTrace = Rc<StackTrace>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::messages::RemoteObject;

    fn sample_call_frame(name: &str) -> CallFrame {
        CallFrame {
            call_frame_id: format!("{{\"frame\":\"{name}\"}}"),
            function_name: name.to_string(),
            location: crate::cdp::messages::Location {
                script_id: "1".into(),
                line_number: 0,
                column_number: Some(0),
            },
            url: "file:///a.js".into(),
            scope_chain: vec![],
            this_obj: RemoteObject::default(),
            return_value: None,
        }
    }

    #[test]
    fn allocates_monotone_frame_ids_for_initial_frames() {
        let mut next = 0i64;
        let frames = [sample_call_frame("a"), sample_call_frame("b")];
        let trace = StackTrace::from_paused(
            &frames,
            None,
            None,
            || {
                next += 1;
                FrameId(next)
            },
            |_| None,
        );
        let ids: Vec<i64> = trace.frames().iter().map(|f| f.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn anonymous_function_name_is_substituted() {
        let frames = [sample_call_frame("")];
        let trace = StackTrace::from_paused(&frames, None, None, || FrameId(1), |_| None);
        assert_eq!(trace.frames()[0].name, "(anonymous)");
    }

    #[test]
    fn has_more_until_expand_finds_nothing() {
        let frames = [sample_call_frame("a")];
        let trace = StackTrace::from_paused(&frames, None, None, || FrameId(1), |_| None);
        assert!(trace.has_more());
    }
}
