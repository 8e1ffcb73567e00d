//! Wildcard path specs over JSON trees.
//!
//! A path spec is a dotted route such as `operation.payload.$ANY.data`.
//! Each segment is either a literal (an object key, or an array index when
//! the node is an array) or the wildcard token `$ANY`, which matches every
//! key or index at that level. The last segment names the leaf to rewrite.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::{Diagnostic, Diagnostics, child_location};
use crate::error::PathError;

/// Token matching every key or index at one level.
pub const WILDCARD: &str = "$ANY";

/// One step of a path spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal object key, or array index if the node is an array.
    Key(String),
    /// Every key of an object or every index of an array.
    Wildcard,
}

impl Segment {
    fn matches_any(&self, other: &Segment) -> bool {
        match (self, other) {
            (Self::Key(a), Self::Key(b)) => a == b,
            _ => true,
        }
    }
}

/// A parsed path spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSpec {
    raw: String,
    segments: Vec<Segment>,
}

impl PathSpec {
    /// Parses a dotted spec. Empty specs and empty segments are rejected.
    pub fn parse(spec: &str) -> Result<Self, PathError> {
        if spec.is_empty() {
            return Err(PathError::InvalidSpec {
                spec: spec.to_string(),
                reason: "spec is empty".into(),
            });
        }

        let segments = spec
            .split('.')
            .enumerate()
            .map(|(i, part)| match part {
                "" => Err(PathError::InvalidSpec {
                    spec: spec.to_string(),
                    reason: format!("segment {} is empty", i),
                }),
                WILDCARD => Ok(Segment::Wildcard),
                key => Ok(Segment::Key(key.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: spec.to_string(),
            segments,
        })
    }

    /// Returns the spec as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true if both specs may reach the same location, or one may
    /// reach a location nested under the other's target.
    pub fn overlaps(&self, other: &PathSpec) -> bool {
        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| a.matches_any(b))
    }
}

impl FromStr for PathSpec {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What to do when a spec addresses a location that does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPath {
    /// Skip the branch and record a [`Diagnostic::PathNoMatch`].
    #[default]
    Lenient,
    /// Fail with [`PathError::Missing`].
    Strict,
}

struct Walk<'a> {
    spec: &'a PathSpec,
    mode: MissingPath,
}

/// Applies `transform` to every existing leaf `spec` addresses in `root`,
/// replacing each leaf with the returned value.
///
/// The transform receives the old leaf and its dotted location. Returns the
/// number of leaves transformed. Wildcard expansion follows the tree's own
/// iteration order.
pub fn resolve<F>(
    root: &mut Value,
    spec: &PathSpec,
    mode: MissingPath,
    diagnostics: &mut Diagnostics,
    transform: &mut F,
) -> Result<usize, PathError>
where
    F: FnMut(Value, &str) -> Value,
{
    let walk = Walk { spec, mode };
    walk_node(root, spec.segments(), "", &walk, diagnostics, transform)
}

/// Applies [`resolve`] for each spec in order, returning the total number of
/// leaves transformed.
pub fn resolve_all<F>(
    root: &mut Value,
    specs: &[PathSpec],
    mode: MissingPath,
    diagnostics: &mut Diagnostics,
    transform: &mut F,
) -> Result<usize, PathError>
where
    F: FnMut(Value, &str) -> Value,
{
    let mut total = 0;
    for spec in specs {
        total += resolve(root, spec, mode, diagnostics, transform)?;
    }
    Ok(total)
}

fn walk_node<F>(
    node: &mut Value,
    segments: &[Segment],
    location: &str,
    walk: &Walk<'_>,
    diagnostics: &mut Diagnostics,
    transform: &mut F,
) -> Result<usize, PathError>
where
    F: FnMut(Value, &str) -> Value,
{
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(0);
    };

    match segment {
        Segment::Wildcard => {
            let mut count = 0;
            match node {
                Value::Object(map) => {
                    for (key, child) in map.iter_mut() {
                        let loc = child_location(location, key);
                        count += step(child, rest, &loc, walk, diagnostics, transform)?;
                    }
                }
                Value::Array(items) => {
                    for (i, child) in items.iter_mut().enumerate() {
                        let loc = child_location(location, &i.to_string());
                        count += step(child, rest, &loc, walk, diagnostics, transform)?;
                    }
                }
                _ => return miss(walk, location, diagnostics),
            }
            Ok(count)
        }
        Segment::Key(key) => {
            let loc = child_location(location, key);
            let child = match node {
                Value::Object(map) => map.get_mut(key),
                Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
                _ => None,
            };
            match child {
                Some(child) => step(child, rest, &loc, walk, diagnostics, transform),
                None => miss(walk, &loc, diagnostics),
            }
        }
    }
}

fn step<F>(
    child: &mut Value,
    rest: &[Segment],
    location: &str,
    walk: &Walk<'_>,
    diagnostics: &mut Diagnostics,
    transform: &mut F,
) -> Result<usize, PathError>
where
    F: FnMut(Value, &str) -> Value,
{
    if rest.is_empty() {
        let old = std::mem::take(child);
        *child = transform(old, location);
        Ok(1)
    } else {
        walk_node(child, rest, location, walk, diagnostics, transform)
    }
}

fn miss(walk: &Walk<'_>, at: &str, diagnostics: &mut Diagnostics) -> Result<usize, PathError> {
    match walk.mode {
        MissingPath::Lenient => {
            diagnostics.push(Diagnostic::PathNoMatch {
                spec: walk.spec.to_string(),
                at: at.to_string(),
            });
            Ok(0)
        }
        MissingPath::Strict => Err(PathError::Missing {
            spec: walk.spec.to_string(),
            at: at.to_string(),
        }),
    }
}
