//! Process-wide id allocation, folded into one explicit context instead of
//! free-floating globals (see spec "Design Notes: Global mutable state").

use std::cell::Cell;
use std::rc::Rc;

use crate::breakpoints::BreakpointId;
use crate::source_container::SourceReference;
use crate::stack_trace::FrameId;

/// Owns every monotone counter the adapter hands out during one debug
/// session's lifetime. Cloning is cheap (`Rc`) and all clones share the same
/// counters, so every component that needs an id takes a clone of this
/// rather than reaching for a global.
#[derive(Debug, Clone)]
pub struct AdapterContext {
    inner: Rc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    last_breakpoint_id: Cell<i64>,
    last_frame_id: Cell<i64>,
    last_source_reference: Cell<i64>,
    last_variables_reference: Cell<i64>,
    last_dap_seq: Cell<i64>,
}

impl Default for AdapterContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterContext {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Counters::default()),
        }
    }

    pub fn next_breakpoint_id(&self) -> BreakpointId {
        BreakpointId(Self::next(&self.inner.last_breakpoint_id))
    }

    pub fn next_frame_id(&self) -> FrameId {
        FrameId(Self::next(&self.inner.last_frame_id))
    }

    pub fn next_source_reference(&self) -> SourceReference {
        SourceReference(Self::next(&self.inner.last_source_reference))
    }

    pub fn next_variables_reference(&self) -> i64 {
        Self::next(&self.inner.last_variables_reference)
    }

    pub fn next_dap_seq(&self) -> i64 {
        Self::next(&self.inner.last_dap_seq)
    }

    fn next(cell: &Cell<i64>) -> i64 {
        let v = cell.get() + 1;
        cell.set(v);
        v
    }
}
