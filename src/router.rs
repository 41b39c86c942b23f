//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Register a path, get a
//! handler; every handler also receives the shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::{Instrument, info, info_span};

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::{Response, ResponseBody};

/// The application router.
///
/// Build it once at startup with the shared state, then pass it to
/// [`Server::serve`](crate::Server::serve). Each registration returns `self`
/// so calls chain.
pub struct Router<S> {
    state: Arc<S>,
    routes: HashMap<Method, MatchitRouter<BoxedHandler<S>>>,
}

enum Lookup<S> {
    Found(BoxedHandler<S>, HashMap<String, String>),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl<S: Send + Sync + 'static> Router<S> {
    pub fn new(state: S) -> Self {
        Self { state: Arc::new(state), routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` reads them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with an existing route.
    /// Routes are fixed at startup, so this is a programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::GET, path, handler)
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup<S> {
        if let Some(matched) = self.routes.get(method).and_then(|tree| tree.at(path).ok()) {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Lookup::Found(Arc::clone(matched.value), params);
        }

        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect();
        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            Lookup::MethodNotAllowed(allowed)
        }
    }

    /// Routes one request and produces one response.
    ///
    /// The request body is dropped unread. Every outcome, including an
    /// unknown path, is a response; this never fails.
    pub async fn dispatch<B>(&self, req: http::Request<B>) -> http::Response<ResponseBody> {
        let (parts, _body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();
        let span = info_span!("request", %method, %path);

        async move {
            let started = Instant::now();
            let response = match self.lookup(&method, &path) {
                Lookup::Found(handler, params) => {
                    handler.call(Arc::clone(&self.state), Request::new(parts, params)).await
                }
                Lookup::MethodNotAllowed(allowed) => method_not_allowed(&allowed),
                Lookup::NotFound => Response::error(StatusCode::NOT_FOUND, "Not Found"),
            };

            info!(
                status = response.status_code().as_u16(),
                elapsed_ms = millis_saturating(started.elapsed()),
                "request completed"
            );
            response.into_inner()
        }
        .instrument(span)
        .await
    }
}

fn millis_saturating(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn method_not_allowed(allowed: &[Method]) -> Response {
    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    let mut builder = Response::builder().status(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(&allow) {
        builder = builder.header(header::ALLOW, value);
    }
    builder.json(r#"{"error":"Method Not Allowed"}"#)
}
