// src/exec/environment.rs

//! Explicit environment tables for spawned processes.
//!
//! The supervisor never mutates its own process environment. Instead the
//! wrapped command and every handler get a table built from the inherited
//! environment plus the job's overrides (and, for handlers, the marker
//! variables).

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

use tokio::process::Command;

use crate::config::validate::validate_env_var;
use crate::errors::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildEnvironment {
    vars: BTreeMap<OsString, OsString>,
}

impl ChildEnvironment {
    /// Snapshot of the supervisor's own environment.
    pub fn inherited() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
        }
    }

    /// Inherited environment with `overrides` merged on top.
    pub fn inherit_with(overrides: &BTreeMap<String, String>) -> Result<Self> {
        let mut env = Self::inherited();
        for (key, value) in overrides {
            validate_env_var(key, value)?;
            env.set(key, value);
        }
        Ok(env)
    }

    pub fn set(&mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) {
        self.vars
            .insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
    }

    /// Copy of this table with extra `KEY=VALUE` pairs applied.
    pub fn with_vars<K, V>(&self, extra: &[(K, V)]) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let mut env = self.clone();
        for (key, value) in extra {
            env.set(key, value);
        }
        env
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.vars
            .get(OsStr::new(key))
            .map(|v| v.to_string_lossy().into_owned())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Replace the command's environment with this table.
    pub fn apply(&self, cmd: &mut Command) {
        cmd.env_clear();
        cmd.envs(self.vars.iter());
    }
}
