//! Canonicalization of http requests.
//!
//! A canonical request looks like:
//!
//! ```text
//! <METHOD>\n
//! <CANONICAL_URI>\n
//! <CANONICAL_QUERY>\n
//! <CANONICAL_HEADERS>\n
//! <SIGNED_HEADERS>\n
//! <PAYLOAD_HASH>
//! ```
//!
//! where every canonical header line already ends with `\n`, so the header
//! block is always followed by an empty line.
//!
//! - [Create a canonical request](https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html#create-canonical-request)

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;
use std::fmt::Write;

use awsign_core::hash::hex_sha256;
use awsign_core::Error;
use awsign_core::Result;
use awsign_core::SigningRequest;
use http::header;
use http::HeaderMap;
use http::Method;
use percent_encoding::utf8_percent_encode;

use crate::constants::AWS_QUERY_ENCODE_SET;
use crate::constants::AWS_URI_ENCODE_SET;
use crate::constants::X_AMZN_TRACE_ID;
use crate::constants::X_AMZ_DATE;
use crate::constants::X_AMZ_PREFIX;
use crate::constants::X_AMZ_SECURITY_TOKEN;

/// SigningMethod is where the signature will be carried.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SigningMethod {
    /// Signing with the `Authorization` header.
    Header,
    /// Signing with query parameters, also known as presigning.
    Query,
}

/// Build the canonical uri of given path.
///
/// Opaque paths are already encoded and used verbatim. Others get decoded
/// once and then encoded with [`AWS_URI_ENCODE_SET`], so `%20` in the request
/// stays `%20` instead of becoming `%2520`.
pub fn canonical_uri(path: &str, opaque: bool) -> Result<Cow<'_, str>> {
    if path.is_empty() {
        return Ok(Cow::Borrowed("/"));
    }
    if opaque {
        return Ok(Cow::Borrowed(path));
    }

    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|e| {
            Error::request_invalid(format!("path is not valid utf-8: {path}")).with_source(e)
        })?;
    Ok(Cow::Owned(
        utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string(),
    ))
}

/// Build the canonical query string of given (decoded) query pairs.
///
/// Names and values are encoded with [`AWS_QUERY_ENCODE_SET`] and then sorted
/// by name, then by value.
pub fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    pairs.sort();

    let mut s = String::with_capacity(pairs.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
    for (idx, (k, v)) in pairs.iter().enumerate() {
        if idx > 0 {
            s.push('&');
        }
        s.push_str(k);
        s.push('=');
        s.push_str(v);
    }
    s
}

/// Trim the value and collapse every whitespace run into a single space.
pub fn normalize_header_value(value: &str) -> String {
    let mut s = String::with_capacity(value.len());
    for (idx, part) in value.split_ascii_whitespace().enumerate() {
        if idx > 0 {
            s.push(' ');
        }
        s.push_str(part);
    }
    s
}

/// CanonicalHeaders is the sorted set of headers covered by a signature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanonicalHeaders {
    headers: BTreeMap<String, String>,
}

impl CanonicalHeaders {
    /// Select and normalize the headers to sign.
    ///
    /// `host`, every `x-amz-*` header and every header in `include` are
    /// signed. `authorization` and `x-amzn-trace-id` never are. In
    /// [`SigningMethod::Query`], `x-amz-date` and `x-amz-security-token` are
    /// skipped too since they travel in the query instead.
    pub fn build(
        headers: &HeaderMap,
        host: &str,
        include: &[String],
        method: SigningMethod,
    ) -> Result<Self> {
        let mut signed = BTreeMap::new();
        signed.insert(
            header::HOST.as_str().to_string(),
            normalize_header_value(host),
        );

        for name in headers.keys() {
            let name = name.as_str();
            if !should_sign(name, include, method) {
                continue;
            }

            let mut value = String::new();
            for (idx, v) in headers.get_all(name).iter().enumerate() {
                if idx > 0 {
                    value.push(',');
                }
                let v = v.to_str().map_err(|e| {
                    Error::request_invalid(format!("header {name} has unreadable value"))
                        .with_source(e)
                })?;
                value.push_str(&normalize_header_value(v));
            }
            signed.insert(name.to_string(), value);
        }

        Ok(Self { headers: signed })
    }

    /// Signed header names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.headers.keys().map(|k| k.as_str())
    }

    /// The normalized value of a signed header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    /// Semicolon joined signed header names, like `host;x-amz-date`.
    pub fn signed_headers(&self) -> String {
        self.names().collect::<Vec<_>>().join(";")
    }
}

impl Display for CanonicalHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in self.headers.iter() {
            writeln!(f, "{k}:{v}")?;
        }
        Ok(())
    }
}

fn should_sign(name: &str, include: &[String], method: SigningMethod) -> bool {
    if name == header::AUTHORIZATION.as_str()
        || name == X_AMZN_TRACE_ID
        || name == header::HOST.as_str()
    {
        return false;
    }
    if method == SigningMethod::Query && (name == X_AMZ_DATE || name == X_AMZ_SECURITY_TOKEN) {
        return false;
    }

    name.starts_with(X_AMZ_PREFIX) || include.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// CanonicalRequest is the normalized form of a request that gets hashed
/// into the string to sign.
#[derive(Debug)]
pub struct CanonicalRequest<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// Canonical uri.
    pub uri: Cow<'a, str>,
    /// Canonical query string.
    pub query: String,
    /// Signed headers.
    pub headers: &'a CanonicalHeaders,
    /// Hex encoded payload hash.
    pub payload_hash: &'a str,
}

impl<'a> CanonicalRequest<'a> {
    /// Build canonical request from the signing context and its selected headers.
    pub fn build(
        req: &'a SigningRequest,
        headers: &'a CanonicalHeaders,
        payload_hash: &'a str,
    ) -> Result<Self> {
        Ok(Self {
            method: &req.method,
            uri: canonical_uri(&req.path, req.opaque_path)?,
            query: canonical_query(&req.query),
            headers,
            payload_hash,
        })
    }

    /// Hex encoded SHA256 of the canonical request.
    pub fn hash(&self) -> Result<String> {
        // Fits most requests without reallocating.
        let mut f = String::with_capacity(256);
        write!(f, "{self}")?;
        Ok(hex_sha256(f.as_bytes()))
    }
}

impl Display for CanonicalRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.uri)?;
        writeln!(f, "{}", self.query)?;
        write!(f, "{}", self.headers)?;
        writeln!(f)?;
        writeln!(f, "{}", self.headers.signed_headers())?;
        write!(f, "{}", self.payload_hash)
    }
}
