use std::time::Duration;
use tradepost::application_impl::{JwtHs256Codec, TokenConfig};
use tradepost::application_port::TokenCodec;
use tradepost::domain_model::UserId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let codec = JwtHs256Codec::new(TokenConfig {
        issuer: "tradepost.auth".to_string(),
        audience: "tradepost-dashboard".to_string(),
        ttl: Duration::from_secs(60),
        signing_key: b"demo-signing-key".to_vec(),
    });

    let user_id = UserId::generate();
    let (token, expires_at) = codec.issue(user_id, "demo").await?;
    println!("issued for {user_id}, expires {expires_at}");
    println!("{}", token.0);

    let claims = codec.verify(&token.0).await?;
    println!(
        "verified: user_id={} username={}",
        claims.user_id, claims.username
    );

    // Expected to fail
    let is_err = codec.verify("not-a-token").await.is_err();
    println!("Error on malformed token: {:?}", is_err);

    Ok(())
}
