//! Native functions
//!
//! Functions are opaque to cloning: they are shared by reference (accessors,
//! methods) and never copied. A body is optional so that a function can stand
//! in for script closures the model cannot represent.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Native function body: `(this, args) -> Ok(return) | Err(thrown)`
pub type NativeFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, Value> + Send + Sync>;

/// Function slot of a callable object
#[derive(Clone)]
pub struct JsFunction {
    name: String,
    body: Option<NativeFn>,
}

impl JsFunction {
    /// Create a function with an optional body
    pub fn new(name: impl Into<String>, body: Option<NativeFn>) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke with the given receiver; a bodiless function returns undefined
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, Value> {
        match &self.body {
            Some(body) => body(this, args),
            None => Ok(Value::Undefined),
        }
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}
