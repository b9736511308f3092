//! RegExp slot
//!
//! Only the pattern source, flags and `lastIndex` match state are modelled;
//! matching itself is the host's business.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{ValueError, ValueResult};

const VALID_FLAGS: &str = "dgimsuvy";

/// RegExp slot
#[derive(Debug)]
pub struct JsRegExp {
    source: String,
    flags: String,
    last_index: AtomicU32,
}

impl JsRegExp {
    /// Create a RegExp; flags must be distinct members of `dgimsuvy`
    pub fn new(source: &str, flags: &str) -> ValueResult<Self> {
        let mut seen = String::with_capacity(flags.len());
        for flag in flags.chars() {
            if !VALID_FLAGS.contains(flag) || seen.contains(flag) {
                return Err(ValueError::InvalidFlags(flags.to_owned()));
            }
            seen.push(flag);
        }
        if seen.contains('u') && seen.contains('v') {
            return Err(ValueError::InvalidFlags(flags.to_owned()));
        }
        Ok(Self {
            source: source.to_owned(),
            flags: flags.to_owned(),
            last_index: AtomicU32::new(0),
        })
    }

    /// Pattern source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Flags as written
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Check a flag
    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }

    /// `lastIndex`
    pub fn last_index(&self) -> u32 {
        self.last_index.load(Ordering::Relaxed)
    }

    /// Update `lastIndex`
    pub fn set_last_index(&self, index: u32) {
        self.last_index.store(index, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_validated() {
        assert!(JsRegExp::new("a+", "gi").is_ok());
        assert!(JsRegExp::new("a+", "gg").is_err());
        assert!(JsRegExp::new("a+", "x").is_err());
        assert!(JsRegExp::new("a+", "uv").is_err());
    }
}
