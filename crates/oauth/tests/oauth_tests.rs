#![allow(clippy::unwrap_used, clippy::expect_used)]
use {
    mockito::Matcher,
    redwind_oauth::{
        ConsumerCredentials, OAuth1Config, OAuth1Service, OAuthParams, TokenPair,
        authorization_header, signature_base_string, signing::sign,
    },
    url::Url,
};

// Worked example from Twitter's "Creating a signature" documentation.
const CONSUMER_KEY: &str = "xvz1evFS4wEEPTGEFPHBog";
const CONSUMER_SECRET: &str = "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw";
const TOKEN: &str = "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb";
const TOKEN_SECRET: &str = "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE";
const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
const TIMESTAMP: u64 = 1318622958;
const STATUS: &str = "Hello Ladies + Gentlemen, a signed OAuth request!";

fn documented_params() -> Vec<(String, String)> {
    vec![
        ("status".into(), STATUS.into()),
        ("oauth_consumer_key".into(), CONSUMER_KEY.into()),
        ("oauth_nonce".into(), NONCE.into()),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), TIMESTAMP.to_string()),
        ("oauth_token".into(), TOKEN.into()),
        ("oauth_version".into(), "1.0".into()),
    ]
}

#[test]
fn signature_base_string_matches_documented_example() {
    let url =
        Url::parse("https://api.twitter.com/1.1/statuses/update.json?include_entities=true")
            .unwrap();
    let base = signature_base_string("POST", &url, &documented_params());
    assert_eq!(
        base,
        "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
    );
}

#[test]
fn signature_matches_documented_example() {
    let url =
        Url::parse("https://api.twitter.com/1.1/statuses/update.json?include_entities=true")
            .unwrap();
    let base = signature_base_string("POST", &url, &documented_params());
    let signature = sign(&base, CONSUMER_SECRET, TOKEN_SECRET).unwrap();
    assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
}

#[test]
fn authorization_header_embeds_documented_signature() {
    let url =
        Url::parse("https://api.twitter.com/1.1/statuses/update.json?include_entities=true")
            .unwrap();
    let consumer = ConsumerCredentials::new(CONSUMER_KEY, CONSUMER_SECRET);
    let token = TokenPair::new(TOKEN, TOKEN_SECRET);
    let oauth = OAuthParams {
        nonce: NONCE.into(),
        timestamp: TIMESTAMP,
        extra: Vec::new(),
    };
    let header = authorization_header(
        "POST",
        &url,
        &[("status".into(), STATUS.into())],
        &consumer,
        Some(&token),
        &oauth,
    )
    .unwrap();
    assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
    assert!(header.contains(&format!("oauth_token=\"{TOKEN}\"")));
}

fn service_for(server: &mockito::ServerGuard) -> OAuth1Service {
    OAuth1Service::new(OAuth1Config {
        consumer: ConsumerCredentials::new("ck", "cs"),
        request_token_url: format!("{}/oauth/request_token", server.url()),
        access_token_url: format!("{}/oauth/access_token", server.url()),
        authorize_url: format!("{}/oauth/authorize", server.url()),
        base_url: format!("{}/1.1/", server.url()),
    })
}

#[tokio::test]
async fn request_token_then_authorize_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth/request_token")
        .match_header(
            "authorization",
            Matcher::Regex(r#"^OAuth oauth_callback="http%3A%2F%2Fblog%2Fcb", .*oauth_signature="#.into()),
        )
        .with_status(200)
        .with_body("oauth_token=req&oauth_token_secret=reqsecret&oauth_callback_confirmed=true")
        .create_async()
        .await;

    let service = service_for(&server);
    let token = service.get_request_token("http://blog/cb").await.unwrap();
    assert_eq!(token.token, "req");
    assert_eq!(token.secret(), "reqsecret");

    let url = service.authorize_url(&token.token).unwrap();
    assert_eq!(url, format!("{}/oauth/authorize?oauth_token=req", server.url()));
    mock.assert_async().await;
}

#[tokio::test]
async fn access_token_exchange_sends_verifier_and_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth/access_token")
        .match_header(
            "authorization",
            Matcher::AllOf(vec![
                Matcher::Regex(r#"oauth_token="req""#.into()),
                Matcher::Regex(r#"oauth_verifier="v3r""#.into()),
            ]),
        )
        .with_status(200)
        .with_body("oauth_token=acc&oauth_token_secret=accsecret&user_id=1&screen_name=kylewm")
        .create_async()
        .await;

    let service = service_for(&server);
    let access = service
        .get_access_token(&TokenPair::new("req", ""), "v3r")
        .await
        .unwrap();
    assert_eq!(access.token, "acc");
    assert_eq!(access.secret(), "accsecret");
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_token_request_reports_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/oauth/request_token")
        .with_status(401)
        .with_body("Failed to validate oauth signature and token")
        .create_async()
        .await;

    let err = service_for(&server)
        .get_request_token("http://blog/cb")
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("401"));
    assert!(msg.contains("Failed to validate oauth signature"));
}

#[tokio::test]
async fn session_signs_form_posts() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/1.1/statuses/update.json")
        .match_header("authorization", Matcher::Regex(r#"oauth_token="acc""#.into()))
        .match_body(Matcher::UrlEncoded("status".into(), "hi there".into()))
        .with_status(200)
        .with_body(r#"{"id_str":"1"}"#)
        .create_async()
        .await;

    let session = service_for(&server)
        .session(TokenPair::new("acc", "accsecret"))
        .unwrap();
    let resp = session
        .post_form("statuses/update.json", &[("status".into(), "hi there".into())])
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    mock.assert_async().await;
}
