use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use awsign_core::hash::hex_hmac_sha256;
use awsign_core::time::Clock;
use awsign_core::time::SigningTime;
use awsign_core::time::SystemClock;
use awsign_core::Error;
use awsign_core::Result;
use awsign_core::SigningRequest;
use http::header;
use http::request::Parts;
use http::HeaderMap;
use http::HeaderValue;
use http::Uri;
use log::debug;

use crate::canonical::canonical_query;
use crate::canonical::CanonicalHeaders;
use crate::canonical::CanonicalRequest;
use crate::canonical::SigningMethod;
use crate::constants::*;
use crate::Config;
use crate::Credential;
use crate::DerivedKeyCache;

/// Builder for [`Signer`].
#[derive(Debug, Default)]
pub struct Builder {
    credential: Option<Credential>,
    region: Option<String>,
    service: Option<String>,
    signed_headers: Vec<String>,
    key_cache: Option<Arc<DerivedKeyCache>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Builder {
    /// Seed a builder with everything the config carries.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::default();
        if let (Some(ak), Some(sk)) = (&config.access_key_id, &config.secret_access_key) {
            builder.credential = Some(Credential::new(
                ak.as_str(),
                sk.as_str(),
                config.session_token.clone(),
            ));
        }
        builder.region = config.region.clone();
        builder.service = config.service.clone();
        builder
    }

    /// Set the credential to sign with.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the signing region, like `us-east-1`.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the signing service, like `s3` or `dynamodb`.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set region and service at once.
    pub fn region_service(self, region: impl Into<String>, service: impl Into<String>) -> Self {
        self.region(region).service(service)
    }

    /// Force extra headers into the signature when the request carries them.
    ///
    /// `host` and `x-amz-*` headers are always signed. `authorization` and
    /// `x-amzn-trace-id` are never signed even if listed here.
    pub fn signed_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signed_headers = headers
            .into_iter()
            .map(|h| h.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Share a derived key cache with other signers.
    pub fn key_cache(mut self, cache: Arc<DerivedKeyCache>) -> Self {
        self.key_cache = Some(cache);
        self
    }

    /// Use given clock for [`Signer::now`].
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Validate the input and build a signer.
    pub fn build(self) -> Result<Signer> {
        let credential = match self.credential {
            Some(cred) if cred.is_valid() => cred,
            Some(_) => {
                return Err(Error::config_invalid(
                    "access key id and secret access key must not be empty",
                ))
            }
            None => return Err(Error::config_invalid("credential is required")),
        };
        let region = match self.region {
            Some(v) if !v.is_empty() => v,
            _ => return Err(Error::config_invalid("region is required")),
        };
        let service = match self.service {
            Some(v) if !v.is_empty() => v,
            _ => return Err(Error::config_invalid("service is required")),
        };

        Ok(Signer {
            credential,
            region,
            service,
            signed_headers: self.signed_headers,
            key_cache: self.key_cache.unwrap_or_default(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}

/// Signer that implements AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// A signer is immutable after [`Builder::build`] and can be shared across
/// threads; the only shared mutable state is its [`DerivedKeyCache`].
#[derive(Debug)]
pub struct Signer {
    credential: Credential,
    region: String,
    service: String,
    signed_headers: Vec<String>,
    key_cache: Arc<DerivedKeyCache>,
    clock: Arc<dyn Clock>,
}

impl Signer {
    /// Create a builder.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The current time according to this signer's clock.
    pub fn now(&self) -> SigningTime {
        SigningTime::new(self.clock.now())
    }

    /// Sign the request by adding `X-Amz-Date`, `X-Amz-Security-Token` (if
    /// the credential has a session token) and `Authorization` headers.
    ///
    /// Nothing else in the request changes. On error the request is left
    /// untouched.
    pub fn sign(&self, parts: &mut Parts, payload_hash: &str, time: &SigningTime) -> Result<()> {
        let mut req = SigningRequest::build(parts)?;

        let date = HeaderValue::from_str(time.iso8601())?;
        req.headers.insert(X_AMZ_DATE, date.clone());
        let token = match &self.credential.session_token {
            Some(token) => {
                let mut value = HeaderValue::from_str(token)?;
                value.set_sensitive(true);
                req.headers.insert(X_AMZ_SECURITY_TOKEN, value.clone());
                Some(value)
            }
            None => None,
        };

        let signed = CanonicalHeaders::build(
            &req.headers,
            req.host()?,
            &self.signed_headers,
            SigningMethod::Header,
        )?;
        let signature = self.calculate(&req, &signed, payload_hash, time)?;

        let mut authorization = HeaderValue::from_str(&format!(
            "{AWS4_HMAC_SHA256} Credential={}/{}, SignedHeaders={}, Signature={signature}",
            self.credential.access_key_id,
            self.scope(time),
            signed.signed_headers(),
        ))?;
        authorization.set_sensitive(true);

        // Every fallible step is done, apply the changes.
        parts.headers.insert(X_AMZ_DATE, date);
        if let Some(token) = token {
            parts.headers.insert(X_AMZ_SECURITY_TOKEN, token);
        }
        parts.headers.insert(header::AUTHORIZATION, authorization);

        Ok(())
    }

    /// Presign the request, returning the signed url and the headers that
    /// must be sent along with it.
    ///
    /// The request itself is not modified. Any `X-Amz-Expires` already in
    /// the request query is signed as is.
    ///
    /// `x-amz-*` headers other than `x-amz-meta-*` move into the url query,
    /// so they are neither signed headers nor part of the returned headers.
    pub fn presign(
        &self,
        parts: &Parts,
        payload_hash: &str,
        time: &SigningTime,
    ) -> Result<(Uri, HeaderMap)> {
        self.presign_inner(parts, payload_hash, time, None)
    }

    /// Presign the request with `X-Amz-Expires` set to `expires`.
    ///
    /// `expires` must be between 1 second and 7 days.
    pub fn presign_with_expires(
        &self,
        parts: &Parts,
        payload_hash: &str,
        time: &SigningTime,
        expires: Duration,
    ) -> Result<(Uri, HeaderMap)> {
        let secs = expires.as_secs();
        if secs == 0 || secs > MAX_PRESIGN_EXPIRES_SECS {
            return Err(Error::request_invalid(format!(
                "presign expires must be between 1 and {MAX_PRESIGN_EXPIRES_SECS} seconds, got {secs}"
            )));
        }
        self.presign_inner(parts, payload_hash, time, Some(secs))
    }

    fn presign_inner(
        &self,
        parts: &Parts,
        payload_hash: &str,
        time: &SigningTime,
        expires: Option<u64>,
    ) -> Result<(Uri, HeaderMap)> {
        let mut req = SigningRequest::build(parts)?;
        let host = req.host()?.to_string();

        // Move `x-amz-*` headers (except user metadata) into the query.
        let hoisted = req
            .headers
            .keys()
            .filter(|name| should_hoist(name.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        for name in hoisted {
            let values = req
                .headers
                .get_all(&name)
                .iter()
                .map(|v| v.to_str().map(str::to_string))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let key = title_case(name.as_str());
            for value in values {
                req.query_push(key.as_str(), value);
            }
            req.headers.remove(&name);
        }

        let signed = CanonicalHeaders::build(
            &req.headers,
            &host,
            &self.signed_headers,
            SigningMethod::Query,
        )?;

        for name in [
            X_AMZ_ALGORITHM_QUERY,
            X_AMZ_CREDENTIAL_QUERY,
            X_AMZ_DATE_QUERY,
            X_AMZ_SIGNED_HEADERS_QUERY,
            X_AMZ_SECURITY_TOKEN_QUERY,
            X_AMZ_SIGNATURE_QUERY,
        ] {
            req.query_remove(name);
        }
        if let Some(secs) = expires {
            req.query_remove(X_AMZ_EXPIRES_QUERY);
            req.query_push(X_AMZ_EXPIRES_QUERY, secs.to_string());
        }
        req.query_push(X_AMZ_ALGORITHM_QUERY, AWS4_HMAC_SHA256);
        req.query_push(
            X_AMZ_CREDENTIAL_QUERY,
            format!("{}/{}", self.credential.access_key_id, self.scope(time)),
        );
        req.query_push(X_AMZ_DATE_QUERY, time.iso8601());
        req.query_push(X_AMZ_SIGNED_HEADERS_QUERY, signed.signed_headers());
        if let Some(token) = &self.credential.session_token {
            req.query_push(X_AMZ_SECURITY_TOKEN_QUERY, token.as_str());
        }

        let signature = self.calculate(&req, &signed, payload_hash, time)?;
        req.query_push(X_AMZ_SIGNATURE_QUERY, signature);

        let uri = req.uri_with_query(&canonical_query(&req.query))?;

        let mut headers = HeaderMap::new();
        for (name, value) in req.headers.iter() {
            if name != header::HOST && signed.get(name.as_str()).is_some() {
                headers.append(name.clone(), value.clone());
            }
        }
        headers.insert(header::HOST, HeaderValue::from_str(&host)?);

        Ok((uri, headers))
    }

    /// Credential scope: `<date>/<region>/<service>/aws4_request`.
    fn scope(&self, time: &SigningTime) -> String {
        format!(
            "{}/{}/{}/{AWS4_REQUEST}",
            time.short_date(),
            self.region,
            self.service
        )
    }

    /// Calculate the hex encoded signature of the request.
    fn calculate(
        &self,
        req: &SigningRequest,
        signed: &CanonicalHeaders,
        payload_hash: &str,
        time: &SigningTime,
    ) -> Result<String> {
        let creq = CanonicalRequest::build(req, signed, payload_hash)?;
        let encoded_req = creq.hash()?;
        debug!(
            "calculated canonical request hash: {encoded_req}, signed headers: {}",
            signed.signed_headers()
        );

        let scope = self.scope(time);
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20220313T072004Z
        // 20220313/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = {
            let mut f = String::with_capacity(128);
            writeln!(f, "{AWS4_HMAC_SHA256}")?;
            writeln!(f, "{}", time.iso8601())?;
            writeln!(f, "{scope}")?;
            write!(f, "{encoded_req}")?;
            f
        };
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = self.key_cache.get(
            &self.credential.access_key_id,
            &self.credential.secret_access_key,
            &self.service,
            &self.region,
            time,
        );
        Ok(hex_hmac_sha256(&signing_key, string_to_sign.as_bytes()))
    }
}

/// Headers carried in the query instead of the header map when presigning.
fn should_hoist(name: &str) -> bool {
    name.starts_with(X_AMZ_PREFIX)
        && !name.starts_with(X_AMZ_META_PREFIX)
        && name != X_AMZ_DATE
        && name != X_AMZ_SECURITY_TOKEN
}

/// `x-amz-target` => `X-Amz-Target`
fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
