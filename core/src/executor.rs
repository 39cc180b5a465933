//! The seam between request building and the network.

use crate::http::HttpRequest;

/// Performs the HTTP round-trip for a built request.
///
/// The core never looks at `Handle`: it may be a finished `HttpResponse`, a
/// `Result` carrying transport errors, a future, or a join handle. Whatever
/// the executor returns is passed back to the caller unchanged.
pub trait RequestExecutor {
    type Handle;

    fn execute(&self, request: HttpRequest) -> Self::Handle;
}

/// Plain closures work as executors, which keeps tests and one-off hosts
/// free of wrapper types.
impl<F, H> RequestExecutor for F
where
    F: Fn(HttpRequest) -> H,
{
    type Handle = H;

    fn execute(&self, request: HttpRequest) -> H {
        self(request)
    }
}
