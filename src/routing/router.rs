//! Route table and lookup.
//!
//! # Responsibilities
//! - Store routes in registration order
//! - Look up the first route matching a method and path
//! - Expose a read-only view of routes for introspection (index page)
//!
//! # Design Decisions
//! - Append-only; there is no deregistration
//! - O(n) linear scan, first match wins; specificity is the registering
//!   code's responsibility (catch-alls go last)
//! - No de-duplication: a repeated (method, pattern) is shadowed by the first

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::http::request::IncomingRequest;
use crate::http::response::HandlerResult;
use crate::routing::matcher::CompiledPattern;
use crate::routing::RouteError;

/// Everything a handler gets to see besides the shared state.
pub struct HandlerContext<'a, S> {
    pub request: &'a IncomingRequest,
    /// Positional captures of the matched pattern.
    pub params: &'a [String],
    /// The table the route was found in.
    pub routes: &'a RouteTable<S>,
}

impl<S> HandlerContext<'_, S> {
    /// Capture at `index`, or `""` if the pattern has fewer groups.
    pub fn param(&self, index: usize) -> &str {
        self.params.get(index).map(String::as_str).unwrap_or_default()
    }
}

/// A route handler. Runs with exclusive access to the shared state.
pub type Handler<S> =
    Arc<dyn Fn(&mut S, &HandlerContext<'_, S>) -> HandlerResult + Send + Sync>;

/// A body field a route requires, with a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredField {
    pub name: String,
    pub description: String,
}

/// Build an ordered required-field list from `(name, description)` pairs.
pub fn required_fields(fields: &[(&str, &str)]) -> Vec<RequiredField> {
    fields
        .iter()
        .map(|(name, description)| RequiredField {
            name: (*name).to_string(),
            description: (*description).to_string(),
        })
        .collect()
}

/// Introspectable description of a registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    /// Pattern source text as registered.
    pub pattern: String,
    pub required_fields: Option<Vec<RequiredField>>,
}

/// A registered route.
pub struct Route<S> {
    info: RouteInfo,
    compiled: CompiledPattern,
    handler: Handler<S>,
}

impl<S> Route<S> {
    pub fn info(&self) -> &RouteInfo {
        &self.info
    }

    pub fn required_fields(&self) -> Option<&[RequiredField]> {
        self.info.required_fields.as_deref()
    }

    pub(crate) fn handler(&self) -> &Handler<S> {
        &self.handler
    }
}

impl<S> fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("info", &self.info).finish()
    }
}

/// Ordered, append-only registry of routes.
pub struct RouteTable<S> {
    routes: Vec<Route<S>>,
}

impl<S> RouteTable<S> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a route. Fails only if the pattern does not compile.
    pub fn register<F>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: F,
        required_fields: Option<Vec<RequiredField>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut S, &HandlerContext<'_, S>) -> HandlerResult + Send + Sync + 'static,
    {
        let compiled = CompiledPattern::new(pattern)?;
        tracing::debug!(
            method = %method,
            pattern = %pattern,
            captures = compiled.capture_count(),
            "Route registered"
        );
        self.routes.push(Route {
            info: RouteInfo {
                method,
                pattern: pattern.to_string(),
                required_fields,
            },
            compiled,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    pub fn add<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut S, &HandlerContext<'_, S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(method, pattern, handler, None)
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut S, &HandlerContext<'_, S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::GET, pattern, handler, None)
    }

    pub fn options<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut S, &HandlerContext<'_, S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::OPTIONS, pattern, handler, None)
    }

    /// Register a POST route; an empty `fields` slice declares no required fields.
    pub fn post<F>(
        &mut self,
        pattern: &str,
        fields: &[(&str, &str)],
        handler: F,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut S, &HandlerContext<'_, S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::POST, pattern, handler, declared(fields))
    }

    /// Register a DELETE route; an empty `fields` slice declares no required fields.
    pub fn delete<F>(
        &mut self,
        pattern: &str,
        fields: &[(&str, &str)],
        handler: F,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut S, &HandlerContext<'_, S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::DELETE, pattern, handler, declared(fields))
    }

    /// Find the first route for `method` whose pattern matches `path`.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<(&Route<S>, Vec<String>)> {
        self.routes
            .iter()
            .filter(|route| route.info.method == *method)
            .find_map(|route| route.compiled.try_match(path).map(|params| (route, params)))
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteInfo> {
        self.routes.iter().map(|route| &route.info)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn declared(fields: &[(&str, &str)]) -> Option<Vec<RequiredField>> {
    if fields.is_empty() {
        None
    } else {
        Some(required_fields(fields))
    }
}

impl<S> Default for RouteTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for RouteTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(table: &RouteTable<u32>, state: &mut u32, method: Method, path: &str) -> Option<HandlerResult> {
        let request = IncomingRequest::new(method.clone(), path);
        let (route, params) = table.match_route(&method, path)?;
        let ctx = HandlerContext {
            request: &request,
            params: &params,
            routes: table,
        };
        Some((route.handler())(state, &ctx))
    }

    #[test]
    fn test_first_match_wins() {
        let mut table: RouteTable<u32> = RouteTable::new();
        table
            .get(r"^/api/items/(\d+)/?$", |hits, _| {
                *hits += 1;
                json!("specific").into()
            })
            .unwrap()
            .get(r"^/api/items/(\w+)/?$", |hits, _| {
                *hits += 100;
                json!("general").into()
            })
            .unwrap();

        let mut hits = 0;
        for _ in 0..3 {
            let result = call(&table, &mut hits, Method::GET, "/api/items/5").unwrap();
            assert_eq!(result, HandlerResult::Plain(json!("specific")));
        }
        assert_eq!(hits, 3);

        // Only the later route covers non-digit ids
        let result = call(&table, &mut hits, Method::GET, "/api/items/abc").unwrap();
        assert_eq!(result, HandlerResult::Plain(json!("general")));
    }

    #[test]
    fn test_duplicate_registration_shadows() {
        let mut table: RouteTable<u32> = RouteTable::new();
        table.get("^/x$", |_, _| json!(1).into()).unwrap();
        table.get("^/x$", |_, _| json!(2).into()).unwrap();
        assert_eq!(table.len(), 2);

        let result = call(&table, &mut 0, Method::GET, "/x").unwrap();
        assert_eq!(result, HandlerResult::Plain(json!(1)));
    }

    #[test]
    fn test_method_must_match_exactly() {
        let mut table: RouteTable<u32> = RouteTable::new();
        table.get("^/x$", |_, _| json!("get").into()).unwrap();

        assert!(table.match_route(&Method::POST, "/x").is_none());
        assert!(table.match_route(&Method::GET, "/x").is_some());
    }

    #[test]
    fn test_params_passed_positionally() {
        let mut table: RouteTable<u32> = RouteTable::new();
        table
            .get(r"^/a/(\w+)/b/(\d+)$", |_, ctx| {
                json!([ctx.param(0), ctx.param(1), ctx.param(2)]).into()
            })
            .unwrap();

        let result = call(&table, &mut 0, Method::GET, "/a/left/b/9").unwrap();
        assert_eq!(result, HandlerResult::Plain(json!(["left", "9", ""])));
    }

    #[test]
    fn test_routes_enumeration_preserves_order_and_fields() {
        let mut table: RouteTable<u32> = RouteTable::new();
        table.get("^/first$", |_, _| json!(null).into()).unwrap();
        table
            .post("^/second$", &[("user", "Who"), ("text", "What")], |_, _| json!(null).into())
            .unwrap();
        table.delete("^/third$", &[], |_, _| json!(null).into()).unwrap();

        let infos: Vec<&RouteInfo> = table.routes().collect();
        assert_eq!(infos.len(), 3);
        assert_eq!(infos[0].pattern, "^/first$");
        assert_eq!(infos[1].method, Method::POST);
        let fields = infos[1].required_fields.as_ref().unwrap();
        assert_eq!(fields[0].name, "user");
        assert_eq!(fields[1].description, "What");
        assert!(infos[2].required_fields.is_none());
    }

    #[test]
    fn test_invalid_pattern_not_appended() {
        let mut table: RouteTable<u32> = RouteTable::new();
        assert!(table.get("^/broken(", |_, _| json!(null).into()).is_err());
        assert!(table.is_empty());
    }
}
