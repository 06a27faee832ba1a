//! Request dispatch.
//!
//! # Responsibilities
//! - Select the first matching route for a request
//! - Parse the JSON body and enforce declared required fields
//! - Run the handler against the shared state
//! - Normalize the handler result into an [`ApiResponse`]
//! - Invoke the mutation notifier once a handler has run
//!
//! # Design Decisions
//! - The shared state sits behind one mutex, held only for the handler call
//! - Rejections before the handler (no route, bad body, missing field) never
//!   notify; anything that reached a handler always does
//! - Handler-authored errors are ordinary results and pass through untouched

use std::sync::{Arc, Mutex};

use axum::http::Method;

use crate::http::request::IncomingRequest;
use crate::http::response::ApiResponse;
use crate::routing::router::{HandlerContext, Route, RouteTable};
use crate::routing::DispatchError;

/// Hook run after every request that reached a handler.
pub trait MutationNotifier: Send + Sync {
    fn notify(&self);
}

impl<F> MutationNotifier for F
where
    F: Fn() + Send + Sync,
{
    fn notify(&self) {
        self()
    }
}

/// Object-safe entry point used by the HTTP layer.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, request: IncomingRequest) -> ApiResponse;
}

/// Routes requests to handlers operating on shared state `S`.
pub struct Dispatcher<S> {
    routes: RouteTable<S>,
    state: Arc<Mutex<S>>,
    notifier: Arc<dyn MutationNotifier>,
}

impl<S> Dispatcher<S> {
    pub fn new(routes: RouteTable<S>, state: Arc<Mutex<S>>, notifier: Arc<dyn MutationNotifier>) -> Self {
        Self {
            routes,
            state,
            notifier,
        }
    }

    pub fn routes(&self) -> &RouteTable<S> {
        &self.routes
    }

    pub fn state(&self) -> &Arc<Mutex<S>> {
        &self.state
    }

    /// Handle one request end to end.
    pub fn handle(&self, mut request: IncomingRequest) -> ApiResponse {
        let (route, params) = match self.prepare(&mut request) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(
                    request_id = request.request_id().unwrap_or("unknown"),
                    method = %request.method,
                    path = %request.path,
                    error = %e,
                    "Request rejected before handler"
                );
                return e.into();
            }
        };

        let ctx = HandlerContext {
            request: &request,
            params: &params,
            routes: &self.routes,
        };

        let response = {
            let mut state = self.state.lock().unwrap_or_else(|poisoned| {
                tracing::error!("Shared state mutex poisoned by an earlier handler panic; recovering");
                poisoned.into_inner()
            });
            ApiResponse::from((route.handler())(&mut *state, &ctx))
        };

        tracing::debug!(
            request_id = request.request_id().unwrap_or("unknown"),
            pattern = %route.info().pattern,
            status = response.status.as_u16(),
            "Handler completed"
        );

        self.notifier.notify();
        response
    }

    /// Steps before the handler: match, parse, validate.
    fn prepare(&self, request: &mut IncomingRequest) -> Result<(&Route<S>, Vec<String>), DispatchError> {
        let (route, params) = self
            .routes
            .match_route(&request.method, &request.path)
            .ok_or_else(|| DispatchError::NoRouteMatched {
                method: request.method.clone(),
                path: request.path.clone(),
            })?;

        let parsed = request.parse_json();

        let Some(fields) = route.required_fields() else {
            return Ok((route, params));
        };

        if carries_body(&request.method) {
            if let Err(e) = parsed {
                return Err(DispatchError::InvalidBody(e.to_string()));
            }
            if request.json.is_none() {
                return Err(DispatchError::InvalidBody("request body is empty".to_string()));
            }
        }

        if let Some(missing) = fields.iter().find(|field| request.json_field(&field.name).is_none()) {
            return Err(DispatchError::MissingRequiredField {
                field: missing.name.clone(),
                description: missing.description.clone(),
            });
        }

        Ok((route, params))
    }
}

fn carries_body(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

impl<S: Send> Dispatch for Dispatcher<S> {
    fn dispatch(&self, request: IncomingRequest) -> ApiResponse {
        self.handle(request)
    }
}
