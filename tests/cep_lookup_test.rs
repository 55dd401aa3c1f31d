//! CEP lookup integration tests
//!
//! Exercises the provider fallback chain against mock HTTP servers. The
//! cache is backed by an unreachable Redis instance on purpose: cache
//! failures must degrade to the providers, never break the lookup.

use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path};

use admissio::config::Settings;
use admissio::services::{CacheService, CepService};

fn settings_for(primary: &MockServer, fallback: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.cep.primary_url = primary.uri();
    settings.cep.fallback_url = fallback.uri();
    settings.cep.timeout_seconds = 2;
    // nothing listens here; cache reads and writes must fail soft
    settings.redis.url = "redis://127.0.0.1:1".to_string();
    settings
}

fn service(primary: &MockServer, fallback: &MockServer) -> CepService {
    let settings = settings_for(primary, fallback);
    let cache = CacheService::new(settings.clone()).unwrap();
    CepService::new(cache, settings).unwrap()
}

#[tokio::test]
async fn primary_provider_resolves() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/01310100/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": "01310-100",
            "logradouro": "Avenida Paulista",
            "complemento": "",
            "bairro": "Bela Vista",
            "localidade": "Sao Paulo",
            "uf": "SP"
        })))
        .expect(1)
        .mount(&primary)
        .await;

    let address = service(&primary, &fallback).lookup("01310-100").await.unwrap();
    assert_eq!(address.city, "Sao Paulo");
    assert_eq!(address.state, "SP");
    assert_eq!(address.street, "Avenida Paulista");

    // the fallback must not have been consulted
    assert!(fallback.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn fallback_used_when_primary_errors() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/01310100/json/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .and(path("/01310100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": "01310100",
            "state": "SP",
            "city": "Sao Paulo",
            "neighborhood": "Bela Vista",
            "street": "Avenida Paulista",
            "service": "correios"
        })))
        .expect(1)
        .mount(&fallback)
        .await;

    let address = service(&primary, &fallback).lookup("01310100").await.unwrap();
    assert_eq!(address.state, "SP");
    assert_eq!(address.complement, "");
}

#[tokio::test]
async fn fallback_used_when_primary_misses() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    // ViaCEP reports unknown codes with 200 + erro marker
    Mock::given(method("GET"))
        .and(path("/99999999/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "erro": true })))
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .and(path("/99999999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": "99999999",
            "state": "RJ",
            "city": "Rio de Janeiro",
            "neighborhood": "Centro",
            "street": "Rua Qualquer"
        })))
        .mount(&fallback)
        .await;

    let address = service(&primary, &fallback).lookup("99999999").await.unwrap();
    assert_eq!(address.city, "Rio de Janeiro");
}

#[tokio::test]
async fn both_providers_failing_is_not_found() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/11111111/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "erro": true })))
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .and(path("/11111111"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fallback)
        .await;

    let err = service(&primary, &fallback).lookup("11111111").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn malformed_code_rejected_without_any_request() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    let err = service(&primary, &fallback).lookup("123").await.unwrap_err();
    assert!(err.is_validation());

    assert!(primary.received_requests().await.unwrap().is_empty());
    assert!(fallback.received_requests().await.unwrap().is_empty());
}
