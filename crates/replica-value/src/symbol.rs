//! Symbols
//!
//! Every symbol gets a process-unique id; equality and hashing use the id only.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

static TO_STRING_TAG: LazyLock<Arc<Symbol>> =
    LazyLock::new(|| Symbol::new(Some("Symbol.toStringTag")));

static CLONING_METHOD: LazyLock<Arc<Symbol>> =
    LazyLock::new(|| Symbol::new(Some("Symbol.cloningMethod")));

/// A symbol
pub struct Symbol {
    description: Option<String>,
    id: u64,
}

impl Symbol {
    /// Create a fresh, unique symbol
    pub fn new(description: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            description: description.map(str::to_owned),
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// `Symbol.toStringTag`: an object's self-reported kind name
    pub fn to_string_tag() -> Arc<Self> {
        TO_STRING_TAG.clone()
    }

    /// Well-known key of a self-cloning method
    pub fn cloning_method() -> Arc<Self> {
        CLONING_METHOD.clone()
    }

    /// Symbol description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Unique id
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}
