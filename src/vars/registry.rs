//! Config-time variable table.
//!
//! Maps variable names to slot indices so templates can hold plain indices
//! instead of name strings. Built-in request variables are registered up
//! front; `http_*` names materialize lazily as header lookups; `request`
//! directives declare bound variables whose getter runs their template.

use std::sync::Arc;

use axum::http::header::HOST;
use axum::http::HeaderName;
use bytes::Bytes;

use crate::error::CompileError;
use crate::template::RequestTemplate;
use crate::vars::context::RequestContext;

/// Getter for a built-in variable. `None` means the value is not
/// resolvable for this request.
pub type BuiltinFn = fn(&RequestContext) -> Option<Bytes>;

/// How a variable slot produces its value.
pub enum VarKind {
    /// Computed directly from the inbound request.
    Builtin(BuiltinFn),
    /// Value of one inbound request header (the `http_*` family).
    Header(HeaderName),
    /// Bound to a template by a `request` directive; every read runs the
    /// executor for that template. Never cached.
    Bound(Arc<RequestTemplate>),
}

impl std::fmt::Debug for VarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarKind::Builtin(_) => f.write_str("Builtin"),
            VarKind::Header(name) => write!(f, "Header({name})"),
            VarKind::Bound(_) => f.write_str("Bound"),
        }
    }
}

/// One registered variable.
#[derive(Debug)]
pub struct VarSlot {
    pub name: String,
    pub kind: VarKind,
}

/// Name → index table, mutable during compilation and frozen afterward.
#[derive(Debug)]
pub struct VariableRegistry {
    slots: Vec<VarSlot>,
}

impl VariableRegistry {
    /// Create a registry holding the built-in request variables.
    pub fn with_builtins() -> Self {
        let mut reg = Self { slots: Vec::new() };
        reg.push_builtin("request_uri", |ctx| {
            Some(Bytes::from(ctx.uri().to_string()))
        });
        reg.push_builtin("request_method", |ctx| {
            Some(Bytes::copy_from_slice(ctx.method().as_str().as_bytes()))
        });
        reg.push_builtin("request_body", |ctx| Some(ctx.body().clone()));
        reg.push_builtin("args", |ctx| {
            Some(Bytes::copy_from_slice(
                ctx.uri().query().unwrap_or("").as_bytes(),
            ))
        });
        reg.push_builtin("host", |ctx| {
            if let Some(host) = ctx.headers().get(HOST) {
                return Some(Bytes::copy_from_slice(host.as_bytes()));
            }
            ctx.uri().host().map(|h| Bytes::from(h.to_string()))
        });
        reg.push_builtin("remote_addr", |ctx| {
            ctx.remote_addr().map(|a| Bytes::from(a.ip().to_string()))
        });
        reg
    }

    fn push_builtin(&mut self, name: &str, f: BuiltinFn) {
        self.slots.push(VarSlot {
            name: name.to_string(),
            kind: VarKind::Builtin(f),
        });
    }

    /// Resolve a referenced name to its slot index at configuration time.
    ///
    /// Names matching the `http_*` prefix are registered on first use as
    /// header lookups; any other unknown name is a configuration error.
    pub fn index_of(&mut self, name: &str) -> Result<usize, CompileError> {
        if let Some(i) = self.lookup(name) {
            return Ok(i);
        }
        if let Some(rest) = name.strip_prefix("http_") {
            let header = HeaderName::try_from(rest.replace('_', "-"))
                .map_err(|_| CompileError::UnknownVariable(name.to_string()))?;
            self.slots.push(VarSlot {
                name: name.to_string(),
                kind: VarKind::Header(header),
            });
            return Ok(self.slots.len() - 1);
        }
        Err(CompileError::UnknownVariable(name.to_string()))
    }

    /// Declare the changeable target variable of a `request` directive.
    ///
    /// Redeclaring an existing bound variable rebinds it (the last
    /// declaration wins); shadowing a built-in or header variable is a
    /// configuration error.
    pub fn declare_bound(
        &mut self,
        name: &str,
        template: Arc<RequestTemplate>,
    ) -> Result<usize, CompileError> {
        match self.lookup(name) {
            Some(i) => match self.slots[i].kind {
                VarKind::Bound(_) => {
                    self.slots[i].kind = VarKind::Bound(template);
                    Ok(i)
                }
                _ => Err(CompileError::VariableCollision(name.to_string())),
            },
            None => {
                self.slots.push(VarSlot {
                    name: name.to_string(),
                    kind: VarKind::Bound(template),
                });
                Ok(self.slots.len() - 1)
            }
        }
    }

    /// Find an already-registered variable by name.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&VarSlot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FieldSource;

    fn dummy_template() -> Arc<RequestTemplate> {
        Arc::new(RequestTemplate {
            method: None,
            uri: FieldSource::Literal("http://127.0.0.1:1/".into()),
            body: None,
            headers: Vec::new(),
            agent: None,
            echo: false,
        })
    }

    #[test]
    fn builtins_are_known() {
        let mut reg = VariableRegistry::with_builtins();
        for name in [
            "request_uri",
            "request_method",
            "request_body",
            "args",
            "host",
            "remote_addr",
        ] {
            assert!(reg.index_of(name).is_ok(), "missing builtin {name}");
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        let mut reg = VariableRegistry::with_builtins();
        assert!(matches!(
            reg.index_of("no_such_var"),
            Err(CompileError::UnknownVariable(_))
        ));
    }

    #[test]
    fn http_prefix_materializes_header_lookup() {
        let mut reg = VariableRegistry::with_builtins();
        let i = reg.index_of("http_x_target").unwrap();
        // Same name resolves to the same slot on later references.
        assert_eq!(reg.index_of("http_x_target").unwrap(), i);
        match &reg.slot(i).unwrap().kind {
            VarKind::Header(h) => assert_eq!(h.as_str(), "x-target"),
            other => panic!("expected header slot, got {other:?}"),
        }
    }

    #[test]
    fn bound_redeclaration_rebinds() {
        let mut reg = VariableRegistry::with_builtins();
        let a = reg.declare_bound("result", dummy_template()).unwrap();
        let b = reg.declare_bound("result", dummy_template()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bound_cannot_shadow_builtin() {
        let mut reg = VariableRegistry::with_builtins();
        assert!(matches!(
            reg.declare_bound("request_uri", dummy_template()),
            Err(CompileError::VariableCollision(_))
        ));
    }
}
