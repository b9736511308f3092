//! Property paths from the clone root
//!
//! Paths are only built in verbose log mode, where they make degradation
//! reports point at the offending value (`$.a[2]<map value #0>`).

use std::fmt;
use std::sync::Arc;

use replica_value::PropertyKey;

/// One step from a parent value to a child
#[derive(Debug, Clone)]
pub enum Segment {
    /// Own property
    Key(PropertyKey),
    /// Key of the n-th map entry
    MapKey(usize),
    /// Value of the n-th map entry
    MapValue(usize),
    /// n-th set member
    SetEntry(usize),
    /// n-th additional value of a customizer transform
    Additional(usize),
    /// The object's prototype (fully mode)
    Prototype,
    /// Fulfilment value or rejection reason of a promise
    Settled,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(PropertyKey::Index(i)) => write!(f, "[{i}]"),
            Segment::Key(PropertyKey::String(s)) => write!(f, ".{s}"),
            Segment::Key(PropertyKey::Symbol(sym)) => write!(f, "[{sym:?}]"),
            Segment::MapKey(i) => write!(f, "<map key #{i}>"),
            Segment::MapValue(i) => write!(f, "<map value #{i}>"),
            Segment::SetEntry(i) => write!(f, "<set entry #{i}>"),
            Segment::Additional(i) => write!(f, "<additional #{i}>"),
            Segment::Prototype => write!(f, "<prototype>"),
            Segment::Settled => write!(f, "<settled>"),
        }
    }
}

struct PathNode {
    parent: ClonePath,
    segment: Segment,
}

/// Path from the root to a value, shared between siblings
#[derive(Clone, Default)]
pub struct ClonePath(Option<Arc<PathNode>>);

impl ClonePath {
    /// The root (`$`)
    pub fn root() -> Self {
        Self(None)
    }

    /// Check if this is the root
    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// Extend by one segment
    pub fn child(&self, segment: Segment) -> Self {
        Self(Some(Arc::new(PathNode {
            parent: self.clone(),
            segment,
        })))
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = &self.0;
        while let Some(n) = node {
            depth += 1;
            node = &n.parent.0;
        }
        depth
    }

    /// Segments from the root down
    pub fn segments(&self) -> Vec<Segment> {
        let mut out = Vec::with_capacity(self.depth());
        let mut node = &self.0;
        while let Some(n) = node {
            out.push(n.segment.clone());
            node = &n.parent.0;
        }
        out.reverse();
        out
    }
}

impl Drop for PathNode {
    // A path as deep as the graph would otherwise drop recursively.
    fn drop(&mut self) {
        let mut next = self.parent.0.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut owned) => next = owned.parent.0.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Display for ClonePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in self.segments() {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ClonePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClonePath({self})")
    }
}

/// Extend an optional path; `None` stays `None`
pub(crate) fn extend(path: &Option<ClonePath>, segment: Segment) -> Option<ClonePath> {
    path.as_ref().map(|p| p.child(segment))
}
