// src/hooks/mod.rs

//! Lifecycle hook handlers.
//!
//! A handler is a shell-syntax command string run at one of five lifecycle
//! points. Each category has a synchronous list (run in order) and an
//! asynchronous list (run concurrently, joined before dispatch returns).
//! Handlers read the JSON report on stdin.
//!
//! Handlers also see marker variables, all under the `JOBGUARD_` prefix:
//! `JOBGUARD_HANDLER_TYPE` (the category), `JOBGUARD_OVERLAP=1` (overlap
//! rejection) and `JOBGUARD_TIMEOUT=<secs>` (timed out). Scripts written
//! against the bare `HANDLER_TYPE`, `OVERLAP` or `TIMEOUT` names need the
//! prefix added.

pub mod dispatcher;

use std::fmt;

pub use dispatcher::{DispatchSummary, HookDispatcher};

/// Marker telling a handler which category invoked it.
pub const HANDLER_TYPE_ENV: &str = "JOBGUARD_HANDLER_TYPE";
/// Set to `1` when the overlap guard rejected the run.
pub const OVERLAP_ENV: &str = "JOBGUARD_OVERLAP";
/// Set to the configured limit (seconds) when the run timed out.
pub const TIMEOUT_ENV: &str = "JOBGUARD_TIMEOUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerCategory {
    Pre,
    Notice,
    Success,
    Failure,
    Post,
}

impl HandlerCategory {
    pub const ALL: [HandlerCategory; 5] = [
        HandlerCategory::Pre,
        HandlerCategory::Notice,
        HandlerCategory::Success,
        HandlerCategory::Failure,
        HandlerCategory::Post,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HandlerCategory::Pre => "pre",
            HandlerCategory::Notice => "notice",
            HandlerCategory::Success => "success",
            HandlerCategory::Failure => "failure",
            HandlerCategory::Post => "post",
        }
    }
}

impl fmt::Display for HandlerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two handler lists of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    pub sync_handlers: Vec<String>,
    pub async_handlers: Vec<String>,
}

impl HookSet {
    pub fn new(sync_handlers: Vec<String>, async_handlers: Vec<String>) -> Self {
        Self {
            sync_handlers,
            async_handlers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sync_handlers.is_empty() && self.async_handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sync_handlers.len() + self.async_handlers.len()
    }
}

/// All ten handler lists of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookLists {
    pub pre: HookSet,
    pub notice: HookSet,
    pub success: HookSet,
    pub failure: HookSet,
    pub post: HookSet,
}

impl HookLists {
    pub fn get(&self, category: HandlerCategory) -> &HookSet {
        match category {
            HandlerCategory::Pre => &self.pre,
            HandlerCategory::Notice => &self.notice,
            HandlerCategory::Success => &self.success,
            HandlerCategory::Failure => &self.failure,
            HandlerCategory::Post => &self.post,
        }
    }

    pub fn get_mut(&mut self, category: HandlerCategory) -> &mut HookSet {
        match category {
            HandlerCategory::Pre => &mut self.pre,
            HandlerCategory::Notice => &mut self.notice,
            HandlerCategory::Success => &mut self.success,
            HandlerCategory::Failure => &mut self.failure,
            HandlerCategory::Post => &mut self.post,
        }
    }

    pub fn is_empty(&self) -> bool {
        HandlerCategory::ALL.iter().all(|c| self.get(*c).is_empty())
    }
}
