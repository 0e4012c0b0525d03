use anyhow::Result;
use awsign_core::hash::hex_sha256;
use awsign_core::OsEnv;
use awsign_v4::Builder;
use awsign_v4::Config;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Configure AWS credentials, falling back to demo values when the env is empty.
    let mut config = Config::default().with_service("dynamodb").from_env(&OsEnv);
    config.access_key_id.get_or_insert_with(|| "AKIA0123456789".to_string());
    config.secret_access_key.get_or_insert_with(|| "MY_SECRET".to_string());
    config.region.get_or_insert_with(|| "us-east-1".to_string());

    // Create the signer
    let signer = Builder::from_config(&config)
        .signed_headers(["content-type"])
        .build()?;

    println!("Signing a DynamoDB ListTables request");

    let body = br#"{}"#;
    let req = http::Request::post("https://dynamodb.us-east-1.amazonaws.com/")
        .header("content-type", "application/x-amz-json-1.0")
        .header("x-amz-target", "DynamoDB_20120810.ListTables")
        .body(body.to_vec())?;

    let (mut parts, body) = req.into_parts();
    signer.sign(&mut parts, &hex_sha256(&body), &signer.now())?;

    let req = http::Request::from_parts(parts, body);
    println!("{} {}", req.method(), req.uri());
    for (name, value) in req.headers() {
        if value.is_sensitive() {
            println!("{name}: <sensitive>");
        } else {
            println!("{name}: {}", value.to_str()?);
        }
    }

    Ok(())
}
