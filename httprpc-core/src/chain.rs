//! Middleware composition.
//!
//! A middleware wraps an [`Invoker`], the unit of request execution shared
//! by client transports and server handlers. Chains compose by folding the
//! middleware list from the last element to the first, so element 0 ends up
//! outermost: it sees the request first and the response last.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Request, Response};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One step of request execution: takes the HTTP request, returns the
/// HTTP response or the transport error `E`.
pub type Invoker<E> =
    Arc<dyn Fn(Request<Bytes>) -> BoxFuture<'static, Result<Response<Bytes>, E>> + Send + Sync>;

/// Wraps an invoker to produce a new invoker.
pub trait Middleware<E>: Send + Sync {
    fn wrap(&self, next: Invoker<E>) -> Invoker<E>;
}

impl<E, F> Middleware<E> for F
where
    F: Fn(Invoker<E>) -> Invoker<E> + Send + Sync,
{
    fn wrap(&self, next: Invoker<E>) -> Invoker<E> {
        self(next)
    }
}

/// An ordered middleware list.
///
/// Composition is a plain iterative fold, so arbitrarily long chains build
/// without recursion.
pub struct Chain<E> {
    middlewares: Vec<Arc<dyn Middleware<E>>>,
}

impl<E> Default for Chain<E> {
    fn default() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }
}

impl<E> Chain<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware<E>>) {
        self.middlewares.push(middleware);
    }

    pub fn with(mut self, middleware: Arc<dyn Middleware<E>>) -> Self {
        self.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Compose the chain around `terminal`. The first middleware pushed is
    /// outermost; an empty chain returns `terminal` unchanged.
    pub fn compose(&self, terminal: Invoker<E>) -> Invoker<E> {
        let mut invoker = terminal;
        for middleware in self.middlewares.iter().rev() {
            invoker = middleware.wrap(invoker);
        }
        invoker
    }
}

/// Middleware that merges a fixed set of headers into every outgoing
/// request before delegating.
pub struct HeaderMiddleware {
    headers: HeaderMap,
}

impl HeaderMiddleware {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

impl<E: 'static> Middleware<E> for HeaderMiddleware {
    fn wrap(&self, next: Invoker<E>) -> Invoker<E> {
        let headers = self.headers.clone();
        Arc::new(move |mut req: Request<Bytes>| {
            crate::copy_headers(req.headers_mut(), &headers);
            next(req)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn tracing_middleware(log: Log, label: &'static str) -> Arc<dyn Middleware<String>> {
        struct Trace {
            log: Log,
            before: &'static str,
            after: &'static str,
        }
        impl Middleware<String> for Trace {
            fn wrap(&self, next: Invoker<String>) -> Invoker<String> {
                let log = self.log.clone();
                let before = self.before;
                let after = self.after;
                Arc::new(move |req| {
                    let log = log.clone();
                    let next = next.clone();
                    Box::pin(async move {
                        log.lock().unwrap().push(before);
                        let resp = next(req).await;
                        log.lock().unwrap().push(after);
                        resp
                    })
                })
            }
        }
        let (before, after) = match label {
            "a" => ("a-before", "a-after"),
            _ => ("b-before", "b-after"),
        };
        Arc::new(Trace { log, before, after })
    }

    fn terminal(log: Log) -> Invoker<String> {
        Arc::new(move |_req| {
            let log = log.clone();
            Box::pin(async move {
                log.lock().unwrap().push("terminal");
                Ok(Response::new(Bytes::new()))
            })
        })
    }

    #[tokio::test]
    async fn test_first_middleware_is_outermost() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new()
            .with(tracing_middleware(log.clone(), "a"))
            .with(tracing_middleware(log.clone(), "b"));

        let invoker = chain.compose(terminal(log.clone()));
        invoker(Request::new(Bytes::new())).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a-before", "b-before", "terminal", "b-after", "a-after"]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_is_identity() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let invoker = Chain::<String>::new().compose(terminal(log.clone()));
        invoker(Request::new(Bytes::new())).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["terminal"]);
    }

    #[tokio::test]
    async fn test_header_middleware_merges_headers() {
        let mut extra = HeaderMap::new();
        extra.insert("x-client", "httprpc".parse().unwrap());
        let chain = Chain::<String>::new().with(Arc::new(HeaderMiddleware::new(extra)));

        let seen: Arc<Mutex<Option<HeaderMap>>> = Arc::new(Mutex::new(None));
        let seen_inner = seen.clone();
        let terminal: Invoker<String> = Arc::new(move |req| {
            let seen = seen_inner.clone();
            Box::pin(async move {
                *seen.lock().unwrap() = Some(req.headers().clone());
                Ok(Response::new(Bytes::new()))
            })
        });

        let invoker = chain.compose(terminal);
        invoker(Request::new(Bytes::new())).await.unwrap();

        let headers = seen.lock().unwrap().take().unwrap();
        assert_eq!(headers.get("x-client").unwrap(), "httprpc");
    }
}
