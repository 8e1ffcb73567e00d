//! Per-RPC path spec sets.
//!
//! Which request fields carry wire values depends on the RPC's message
//! schema, so each RPC wire path maps to a [`SpecSet`]. RPCs without a
//! registered set fall back to an optional default set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::path::PathSpec;

/// RPCs that historically transcoded a fixed set of shallow fields.
pub const ALLOW_LIST_RPCS: &[&str] = &[
    "/components.Operations/Create",
    "/components.Operations/Update",
];

/// Fields transcoded for [`ALLOW_LIST_RPCS`].
pub const ALLOW_LIST_SPECS: &[&str] = &[
    "operation.payload.$ANY.data",
    "operation.input.format_function.$ANY.value.data",
    "operation.input.redis_functions.$ANY.value.data",
    "operation.output.format_function.$ANY.value.data",
    "operation.output.redis_functions.$ANY.value.data",
];

/// Fields transcoded for every RPC in path mode.
pub const DEFAULT_SPECS: &[&str] = &[
    "operation.payload.$ANY.data",
    "operation.input.format_function.$ANY.value.data",
    "operation.input.redis_functions.$ANY.value.data",
    "operation.output.format_function.$ANY.value.data",
    "operation.output.redis_functions.$ANY.value.data",
    "records.$ANY.payload.$ANY.data",
    "records.$ANY.payload.$ANY.default.data",
    "records.$ANY.payload.$ANY.default.vars.$ANY.data",
    "records.$ANY.payload.$ANY.vars.$ANY.data",
    "records.$ANY.payload.$ANY.vars.$ANY.default.data",
    "records.$ANY.input.format_function.$ANY.value.data",
    "records.$ANY.input.format_function.$ANY.value.vars.$ANY.data",
    "records.$ANY.input.format_function.$ANY.value.default.data",
    "records.$ANY.input.redis_functions.$ANY.value.data",
    "records.$ANY.input.redis_functions.$ANY.value.vars.$ANY.data",
    "records.$ANY.input.redis_functions.$ANY.value.default.data",
    "records.$ANY.output.format_function.$ANY.value.data",
    "records.$ANY.output.format_function.$ANY.value.vars.$ANY.data",
    "records.$ANY.output.format_function.$ANY.value.default.data",
    "records.$ANY.output.redis_functions.$ANY.value.data",
    "records.$ANY.output.redis_functions.$ANY.value.vars.$ANY.data",
    "records.$ANY.output.redis_functions.$ANY.value.default.data",
    "app.request.headers.$ANY.data",
    "app.request.query.$ANY.data",
    "app.request.body.$ANY.data",
    "app_action.request.headers.$ANY.data",
    "app_action.request.query.$ANY.data",
    "app_action.request.body.$ANY.data",
];

/// How request payloads select the fields to transcode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeMode {
    /// [`DEFAULT_SPECS`] for every RPC.
    #[default]
    Paths,
    /// [`ALLOW_LIST_SPECS`] for [`ALLOW_LIST_RPCS`] only.
    AllowList,
}

/// A non-overlapping list of path specs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecSet {
    specs: Vec<PathSpec>,
}

impl SpecSet {
    /// Parses `specs`, rejecting any pair that may address the same leaf.
    ///
    /// `rpc` only labels errors.
    pub fn parse<I, S>(rpc: &str, specs: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for spec in specs {
            set.push(rpc, PathSpec::parse(spec.as_ref())?)?;
        }
        Ok(set)
    }

    fn push(&mut self, rpc: &str, spec: PathSpec) -> Result<(), SpecError> {
        if let Some(existing) = self.specs.iter().find(|s| s.overlaps(&spec)) {
            return Err(SpecError::Overlap {
                rpc: rpc.to_string(),
                first: existing.to_string(),
                second: spec.to_string(),
            });
        }
        self.specs.push(spec);
        Ok(())
    }

    /// Returns the specs in registration order.
    pub fn specs(&self) -> &[PathSpec] {
        &self.specs
    }

    /// Returns the number of specs.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if the set holds no specs.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Spec sets keyed by RPC wire path.
#[derive(Debug, Clone, Default)]
pub struct SpecRegistry {
    by_rpc: HashMap<String, SpecSet>,
    fallback: SpecSet,
}

impl SpecRegistry {
    /// Creates an empty registry that transcodes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the built-in registry for `mode`.
    pub fn builtin(mode: TranscodeMode) -> Result<Self, SpecError> {
        let mut registry = Self::new();
        match mode {
            TranscodeMode::Paths => {
                registry.fallback = SpecSet::parse("*", DEFAULT_SPECS)?;
            }
            TranscodeMode::AllowList => {
                for rpc in ALLOW_LIST_RPCS {
                    registry.register(*rpc, ALLOW_LIST_SPECS)?;
                }
            }
        }
        Ok(registry)
    }

    /// Adds specs for `rpc`.
    ///
    /// Once an RPC has a registered set, the fallback no longer applies to
    /// it. Registering again extends the set; overlaps with specs already
    /// registered for the same RPC are rejected.
    pub fn register<I, S>(&mut self, rpc: impl Into<String>, specs: I) -> Result<(), SpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rpc = rpc.into();
        let mut set = self.by_rpc.get(&rpc).cloned().unwrap_or_default();
        for spec in specs {
            set.push(&rpc, PathSpec::parse(spec.as_ref())?)?;
        }
        self.by_rpc.insert(rpc, set);
        Ok(())
    }

    /// Returns the specs to apply to requests of `rpc`.
    pub fn specs_for(&self, rpc: &str) -> &[PathSpec] {
        self.by_rpc
            .get(rpc)
            .map(SpecSet::specs)
            .unwrap_or_else(|| self.fallback.specs())
    }

    /// Returns true if `rpc` has its own registered set.
    pub fn is_registered(&self, rpc: &str) -> bool {
        self.by_rpc.contains_key(rpc)
    }

    /// Returns the fallback set.
    pub fn fallback(&self) -> &SpecSet {
        &self.fallback
    }
}
