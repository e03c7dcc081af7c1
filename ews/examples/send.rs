use std::env;

use ews::{Client, EwsConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let identity = env::var("EWS_IDENTITY").expect("Missing the EWS_IDENTITY environment variable");
    let token = env::var("EWS_TOKEN").expect("Missing the EWS_TOKEN environment variable");
    let endpoint = env::var("EWS_ENDPOINT").expect("Missing the EWS_ENDPOINT environment variable");
    let to = env::var("EWS_TO").expect("Missing the EWS_TO environment variable");

    let mut config = EwsConfig::new(identity, token, endpoint)
        .with_insecure_skip_verify(env::var("EWS_INSECURE").is_ok());

    if let Ok(password) = env::var("EWS_NTLM_PASSWORD") {
        config = config.with_ntlm_password(password);
    }

    let client = Client::new(config);

    let mut res = client
        .send_mail(
            &to.split(',').map(ToOwned::to_owned).collect::<Vec<_>>(),
            &[],
            "Hello from ews-lib",
            "Hello, world!",
        )
        .unwrap();

    println!("status: {}", res.status());
    println!("{}", String::from_utf8_lossy(&ews::http::read_body(&mut res).unwrap()));
}
