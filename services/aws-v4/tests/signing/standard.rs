use super::*;
use awsign_core::OpaquePath;
use awsign_v4::EMPTY_STRING_SHA256;
use http::header;
use http::HeaderValue;
use pretty_assertions::assert_eq;

#[test]
fn test_sign_fixed_vector() {
    init();

    let mut parts = empty_request();
    fixed_signer(None)
        .sign(&mut parts, EMPTY_STRING_SHA256, &epoch())
        .expect("must sign");

    assert_eq!(parts.headers["x-amz-date"], "19700101T000000Z");
    assert_eq!(
        parts.headers[header::AUTHORIZATION],
        "AWS4-HMAC-SHA256 Credential=AKIA0123456789/19700101/us-east-1/dynamodb/aws4_request, SignedHeaders=host;x-amz-date, Signature=97afaccd6bb80fd0b79089a895eba5097231dfd469ad60c277e68c66ff80cae9"
    );
}

#[test]
fn test_sign_with_session_token() {
    init();

    let mut parts = empty_request();
    fixed_signer(Some("SESSION"))
        .sign(&mut parts, EMPTY_STRING_SHA256, &epoch())
        .expect("must sign");

    let authorization = parts.headers[header::AUTHORIZATION].to_str().unwrap();
    assert_eq!(
        signed_headers_of(authorization),
        "host;x-amz-date;x-amz-security-token"
    );
    assert_eq!(
        signature_of(authorization),
        "d1033fe3a5a1adf7ad394b71017d851b7d9300fba7d83527be52ef5088c638f1"
    );
    assert_eq!(parts.headers["x-amz-security-token"], "SESSION");
}

#[test]
fn test_sign_with_host_header() {
    init();

    let mut parts = empty_request();
    parts
        .headers
        .insert(header::HOST, HeaderValue::from_static("myhost"));
    fixed_signer(None)
        .sign(&mut parts, EMPTY_STRING_SHA256, &epoch())
        .expect("must sign");

    let authorization = parts.headers[header::AUTHORIZATION].to_str().unwrap();
    assert_eq!(signed_headers_of(authorization), "host;x-amz-date");
    assert_eq!(
        signature_of(authorization),
        "46062c232e1f5baf1e339d5d1690938bdb50032042f59fe647d33eb78c6c422d"
    );
    assert_eq!(parts.headers[header::HOST], "myhost");
}

#[test]
fn test_sign_request() {
    init();

    let mut parts = dynamodb_request("");
    let before = parts.headers.clone();
    let uri = parts.uri.clone();
    session_signer()
        .sign(&mut parts, &payload_hash(b"{}"), &epoch())
        .expect("must sign");

    let authorization = parts.headers[header::AUTHORIZATION].to_str().unwrap();
    assert_eq!(
        authorization,
        "AWS4-HMAC-SHA256 Credential=AKID/19700101/us-east-1/dynamodb/aws4_request, SignedHeaders=host;x-amz-date;x-amz-meta-other-header;x-amz-meta-other-header_with_underscore;x-amz-security-token;x-amz-target, Signature=77e6a45e2a6912ca37f8e941408eebcecb9f22ad6711e418f67448296aa91bf1"
    );

    // Only the signing headers are added, the rest stays as is.
    assert_eq!(parts.uri, uri);
    for name in before.keys() {
        assert_eq!(
            parts.headers.get_all(name).iter().collect::<Vec<_>>(),
            before.get_all(name).iter().collect::<Vec<_>>(),
            "{name}"
        );
    }
    let mut added = parts
        .headers
        .keys()
        .filter(|name| !before.contains_key(*name))
        .map(|name| name.as_str())
        .collect::<Vec<_>>();
    added.sort();
    assert_eq!(added, ["authorization", "x-amz-date", "x-amz-security-token"]);
}

#[test]
fn test_sign_request_with_opaque_path() {
    init();

    let mut parts = dynamodb_request("");
    parts.extensions.insert(OpaquePath);
    session_signer()
        .sign(&mut parts, &payload_hash(b"{}"), &epoch())
        .expect("must sign");

    let authorization = parts.headers[header::AUTHORIZATION].to_str().unwrap();
    assert_eq!(
        signature_of(authorization),
        "41b5234f4cac9febfa8f06032206d0290afe51269d2e134e71e44709cb64c5ca"
    );
}

#[test]
fn test_sign_request_with_forced_headers() {
    init();

    let signer = Signer::builder()
        .credential(Credential::new("AKID", "SECRET", Some("SESSION".to_string())))
        .region_service("us-east-1", "dynamodb")
        .signed_headers(["Content-Type", "Authorization", "X-Amzn-Trace-Id"])
        .build()
        .expect("signer must build");

    let mut parts = dynamodb_request("");
    parts
        .headers
        .insert("x-amzn-trace-id", HeaderValue::from_static("Root=1-5759e988"));
    signer
        .sign(&mut parts, &payload_hash(b"{}"), &epoch())
        .expect("must sign");

    let authorization = parts.headers[header::AUTHORIZATION].to_str().unwrap();
    assert_eq!(
        signed_headers_of(authorization),
        "content-type;host;x-amz-date;x-amz-meta-other-header;x-amz-meta-other-header_with_underscore;x-amz-security-token;x-amz-target"
    );
    assert_eq!(
        signature_of(authorization),
        "17d244a1a0dfe216f6edcff52f7f3e7eaf4f7a91df07c2e478fd2c886fd90686"
    );
}

#[test]
fn test_sign_is_deterministic() {
    init();

    let signer = session_signer();
    let sign = || {
        let mut parts = dynamodb_request("");
        signer
            .sign(&mut parts, &payload_hash(b"{}"), &epoch())
            .expect("must sign");
        parts.headers[header::AUTHORIZATION].clone()
    };

    assert_eq!(sign(), sign());
}

#[test]
fn test_sign_s3_request_with_query() {
    init();

    let signer = Signer::builder()
        .credential(Credential::new("access_key_id", "secret_access_key", None))
        .region_service("test", "s3")
        .build()
        .expect("signer must build");
    let mut parts = Request::get(
        "http://127.0.0.1:9000/hello?list-type=2&max-keys=3&prefix=CI/&start-after=ExampleGuide.pdf",
    )
    .body(())
    .expect("request must be valid")
    .into_parts()
    .0;
    let time: SigningTime = "20220313T072004Z".parse().expect("time must be valid");

    signer
        .sign(&mut parts, EMPTY_STRING_SHA256, &time)
        .expect("must sign");

    assert_eq!(parts.headers["x-amz-date"], "20220313T072004Z");
    assert_eq!(
        parts.headers[header::AUTHORIZATION],
        "AWS4-HMAC-SHA256 Credential=access_key_id/20220313/test/s3/aws4_request, SignedHeaders=host;x-amz-date, Signature=9d5763e8ef736dc9b21c7f55b7a9a4a6e6c687784af57c9cf44673bed68c618e"
    );
}

#[test]
fn test_sign_origin_form_request_with_host_header() {
    init();

    let mut parts = Request::post("/")
        .header("Host", "dynamodb.us-east-1.amazonaws.com")
        .body(())
        .expect("request must be valid")
        .into_parts()
        .0;
    fixed_signer(None)
        .sign(&mut parts, EMPTY_STRING_SHA256, &epoch())
        .expect("host header is enough to sign");

    let authorization = parts.headers[header::AUTHORIZATION].to_str().unwrap();
    assert_eq!(signed_headers_of(authorization), "host;x-amz-date");
    assert_eq!(
        signature_of(authorization),
        "97afaccd6bb80fd0b79089a895eba5097231dfd469ad60c277e68c66ff80cae9"
    );
}

#[test]
fn test_sign_request_without_host() {
    init();

    let mut parts = Request::post("/")
        .body(())
        .expect("request must be valid")
        .into_parts()
        .0;
    let err = fixed_signer(None)
        .sign(&mut parts, EMPTY_STRING_SHA256, &epoch())
        .expect_err("no host to sign");
    assert_eq!(err.kind(), awsign_core::ErrorKind::RequestInvalid);
    assert!(parts.headers.is_empty());
}
