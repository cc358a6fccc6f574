//! Body type shared by the server, the executor and the outbound client.

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use std::convert::Infallible;

/// Boxed error carried by [`ProxyBody`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body used for every request and response that crosses the executor.
pub type ProxyBody = BoxBody<Bytes, BoxError>;

/// Box any body into a [`ProxyBody`].
pub fn boxed_body<B>(body: B) -> ProxyBody
where
    B: Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed()
}

/// Extension trait for `Response<Full<Bytes>>` providing common transformations.
pub trait ResponseExt {
    /// Convert the response body into a [`ProxyBody`].
    fn into_boxed(self) -> Response<ProxyBody>;
}

impl ResponseExt for Response<Full<Bytes>> {
    fn into_boxed(self) -> Response<ProxyBody> {
        self.map(|b| b.map_err(|never: Infallible| match never {}).boxed())
    }
}

/// Same conversion for requests, so any body can be handed to the executor.
pub trait RequestExt {
    fn into_boxed(self) -> Request<ProxyBody>;
}

impl<B> RequestExt for Request<B>
where
    B: Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<BoxError>,
{
    fn into_boxed(self) -> Request<ProxyBody> {
        self.map(boxed_body)
    }
}
