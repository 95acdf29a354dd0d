//! Response relay back to the caller.
//!
//! # Responsibilities
//! - Copy upstream status and headers verbatim
//! - Stream the upstream body through without buffering
//! - Finish the exchange record when the body ends or is abandoned
//! - Render locally generated plaintext errors
//!
//! # Design Decisions
//! - The upstream body is owned by the relayed body; dropping it on any exit
//!   path releases the upstream connection
//! - Write failures toward the caller are not retried or classified

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::observability::ExchangeRecord;

/// Plaintext response in the shape callers of the proxy expect for local errors.
pub fn plain_text(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// Turn an upstream response into the caller's response.
pub fn relay<B>(upstream: Response<B>, record: ExchangeRecord) -> Response<Body>
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (parts, body) = upstream.into_parts();
    Response::from_parts(parts, Body::new(RelayBody::new(Body::new(body), record)))
}

/// Body wrapper that finishes its [`ExchangeRecord`] at end of stream, on a
/// stream error, or when dropped early.
pub struct RelayBody {
    inner: Body,
    record: Option<ExchangeRecord>,
}

impl RelayBody {
    pub fn new(inner: Body, record: ExchangeRecord) -> Self {
        Self {
            inner,
            record: Some(record),
        }
    }

    fn finish(&mut self) {
        self.record.take();
    }
}

impl HttpBody for RelayBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => this.finish(),
            Poll::Ready(Some(Err(e))) => {
                tracing::debug!(error = %e, "Upstream body ended with error");
                this.finish();
            }
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
