use http::header;
use http::request::Parts;
use http::uri::Authority;
use http::uri::Scheme;
use http::HeaderMap;
use http::Method;
use http::Uri;

use crate::Error;
use crate::Result;

/// Marks a request path as already percent-encoded.
///
/// Insert it into the request extensions to make signers use the path
/// verbatim instead of decoding and re-encoding it:
///
/// ```
/// use awsign_core::OpaquePath;
///
/// let mut req = http::Request::new(());
/// req.extensions_mut().insert(OpaquePath);
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct OpaquePath;

/// Signing context for request.
///
/// It's an owned copy of everything a signer reads from the request, so
/// building the signature never touches the caller's [`Parts`].
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority, absent for origin-form uris like `/key`.
    pub authority: Option<Authority>,
    /// HTTP path, as it appears in the request uri.
    pub path: String,
    /// Whether `path` is already encoded and must be used verbatim.
    pub opaque_path: bool,
    /// HTTP query parameters, percent decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &Parts) -> Result<Self> {
        let uri = &parts.uri;
        let authority = uri.authority().cloned();
        if authority.is_none() && !parts.headers.contains_key(header::HOST) {
            return Err(Error::request_invalid(
                "request without authority or host header is invalid for signing",
            ));
        }
        let path = match uri.path() {
            "" => "/".to_string(),
            v => v.to_string(),
        };

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme().cloned().unwrap_or(Scheme::HTTP),
            authority,
            path,
            opaque_path: parts.extensions.get::<OpaquePath>().is_some(),
            query: uri
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),
            headers: parts.headers.clone(),
        })
    }

    /// The host this request is addressed to.
    ///
    /// Uses the `Host` header if present, otherwise the uri authority.
    pub fn host(&self) -> Result<&str> {
        match (self.headers.get(header::HOST), &self.authority) {
            (Some(v), _) => Ok(v.to_str()?),
            (None, Some(authority)) => Ok(authority.as_str()),
            (None, None) => Err(Error::request_invalid("request has no host")),
        }
    }

    /// Push a new query pair into query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Remove all query pairs with given key.
    pub fn query_remove(&mut self, key: &str) {
        self.query.retain(|(k, _)| k != key);
    }

    /// Build a uri with the same scheme, authority and path but the given
    /// (already encoded) query string.
    ///
    /// Fails if the request uri carries no authority.
    pub fn uri_with_query(&self, query: &str) -> Result<Uri> {
        let authority = self.authority.clone().ok_or_else(|| {
            Error::request_invalid("request without authority can't be turned into an url")
        })?;
        let paq = if query.is_empty() {
            self.path.clone()
        } else {
            let mut s = String::with_capacity(self.path.len() + query.len() + 1);
            s.push_str(&self.path);
            s.push('?');
            s.push_str(query);
            s
        };

        Ok(Uri::builder()
            .scheme(self.scheme.clone())
            .authority(authority)
            .path_and_query(paq)
            .build()?)
    }
}
