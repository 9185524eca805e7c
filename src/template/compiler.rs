//! Directive compilation.
//!
//! Turns the raw ordered argument lists of `request` / `request_echo`
//! directives into immutable [`RequestTemplate`]s. `$name` references are
//! resolved to variable-table indices here, at configuration time, so an
//! unknown name fails startup instead of a live request.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use url::Url;

use crate::config::schema::{DirectiveConfig, GatewayConfig, ScopeDefaults};
use crate::error::CompileError;
use crate::template::{FieldSource, HeaderLine, LocationTemplates, RequestTemplate};
use crate::vars::registry::VariableRegistry;

/// Leading tokens recognized as a method; anything else starts the URI.
const METHOD_VOCAB: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

/// The fully compiled configuration: every location's templates plus the
/// variable registry they index into. Immutable once built.
pub struct CompiledGateway {
    pub locations: Vec<Arc<LocationTemplates>>,
    pub registry: VariableRegistry,
}

/// Location defaults parsed into their typed form, cloned into each
/// template created for the location.
#[derive(Debug)]
pub(crate) struct TemplateSeed {
    method: Option<Method>,
    agent: Option<HeaderValue>,
    headers: Vec<HeaderLine>,
}

impl TemplateSeed {
    pub(crate) fn from_defaults(defaults: &ScopeDefaults) -> Result<Self, CompileError> {
        let method = match defaults.method.as_deref() {
            None | Some("") => None,
            Some(m) => Some(
                Method::from_bytes(m.as_bytes())
                    .map_err(|_| CompileError::InvalidMethod(m.to_string()))?,
            ),
        };
        let agent = match defaults.agent.as_deref() {
            None | Some("") => None,
            Some(a) => Some(
                HeaderValue::from_str(a).map_err(|_| CompileError::InvalidAgent(a.to_string()))?,
            ),
        };
        let headers = defaults
            .params
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|line| HeaderLine::parse(line))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            method,
            agent,
            headers,
        })
    }
}

/// Compile a whole configuration: merge scope defaults per location,
/// compile every directive in declaration order, and compute each
/// location's `has_echo` flag once all of its directives are parsed.
pub fn compile(config: &GatewayConfig) -> Result<CompiledGateway, CompileError> {
    let mut registry = VariableRegistry::with_builtins();
    let mut locations = Vec::with_capacity(config.locations.len());
    for loc in &config.locations {
        let defaults = ScopeDefaults::merge(&config.defaults, &loc.defaults);
        let seed = TemplateSeed::from_defaults(&defaults)?;
        let mut templates = Vec::with_capacity(loc.directives.len());
        for directive in &loc.directives {
            let template = match directive {
                DirectiveConfig::Request { args } => compile_request(args, &seed, &mut registry)?,
                DirectiveConfig::RequestEcho { args } => compile_echo(args, &seed, &mut registry)?,
            };
            templates.push(template);
        }
        let has_echo = templates.iter().any(|t| t.echo);
        locations.push(Arc::new(LocationTemplates {
            path: loc.path.clone(),
            templates,
            has_echo,
        }));
    }
    Ok(CompiledGateway {
        locations,
        registry,
    })
}

/// Compile the value-producing form. The trailing token names the target
/// variable, declared changeable and bound to the new template.
pub(crate) fn compile_request(
    args: &[String],
    seed: &TemplateSeed,
    registry: &mut VariableRegistry,
) -> Result<Arc<RequestTemplate>, CompileError> {
    let (template, i) = parse_template(args, seed, registry, 1, false)?;
    let target = args.get(i).ok_or(CompileError::MissingTarget)?;
    let name = match target.strip_prefix('$') {
        Some(name) if !name.is_empty() => name,
        _ => return Err(CompileError::BadTargetVariable(target.clone())),
    };
    if let Some(extra) = args.get(i + 1) {
        return Err(CompileError::TrailingArgument(extra.clone()));
    }
    let template = Arc::new(template);
    registry.declare_bound(name, Arc::clone(&template))?;
    Ok(template)
}

/// Compile the echo form. No trailing token; the template's result is
/// streamed into the inbound response body.
pub(crate) fn compile_echo(
    args: &[String],
    seed: &TemplateSeed,
    registry: &mut VariableRegistry,
) -> Result<Arc<RequestTemplate>, CompileError> {
    let (template, i) = parse_template(args, seed, registry, 0, true)?;
    if let Some(extra) = args.get(i) {
        return Err(CompileError::TrailingArgument(extra.clone()));
    }
    Ok(Arc::new(template))
}

/// Shared prefix grammar of both directive forms:
/// `[METHOD] <uri-or-$var> [<body-or-$var>]`.
///
/// `reserve` is the number of trailing tokens the caller still requires
/// (one for the value form's target, zero for echo). A body token is
/// consumed only if more tokens than `reserve` remain after the URI; this
/// is the single arity rule shared by both forms.
fn parse_template(
    args: &[String],
    seed: &TemplateSeed,
    registry: &mut VariableRegistry,
    reserve: usize,
    echo: bool,
) -> Result<(RequestTemplate, usize), CompileError> {
    let mut i = 0;

    // Method
    let mut method = seed.method.clone();
    if let Some(tok) = args.first() {
        if METHOD_VOCAB.contains(&tok.as_str()) {
            method = Some(
                Method::from_bytes(tok.as_bytes())
                    .map_err(|_| CompileError::InvalidMethod(tok.clone()))?,
            );
            i += 1;
        }
    }

    // Request URI
    let uri_tok = args.get(i).ok_or(CompileError::MissingUri)?;
    let uri = match reference_name(uri_tok)? {
        Some(name) => FieldSource::Var(registry.index_of(name)?),
        None => {
            Url::parse(uri_tok).map_err(|e| CompileError::InvalidLiteralUri {
                uri: uri_tok.clone(),
                reason: e.to_string(),
            })?;
            FieldSource::Literal(uri_tok.clone())
        }
    };
    i += 1;

    // Request body
    let mut body = None;
    if args.len() > i + reserve {
        let tok = &args[i];
        body = Some(match reference_name(tok)? {
            Some(name) => FieldSource::Var(registry.index_of(name)?),
            None => FieldSource::Literal(tok.clone()),
        });
        i += 1;
    }

    Ok((
        RequestTemplate {
            method,
            uri,
            body,
            headers: seed.headers.clone(),
            agent: seed.agent.clone(),
            echo,
        },
        i,
    ))
}

/// `$name` → `Some(name)`; a bare `$` is malformed; anything else is a
/// literal.
fn reference_name(token: &str) -> Result<Option<&str>, CompileError> {
    match token.strip_prefix('$') {
        Some("") => Err(CompileError::MalformedReference(token.to_string())),
        Some(name) => Ok(Some(name)),
        None => Ok(None),
    }
}
