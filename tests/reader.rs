//! Read-back tests against an instrumented ledger and a mock JSON-RPC node.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use selfconfig_core::{
    abi::{self, OnChainConfig, EXISTS_SELECTOR, GET_CONFIG_SELECTOR},
    codec::pack,
    config_id,
    service::ValidationStatus,
    ChainConfigReader, ConfigId, ConfigIdRequest, ConfigService, Digest32, JsonRpcClient, LedgerClient,
    NetworkDescriptor, NetworkRegistry, PolicyInput, ReadConfigRequest, ReadOutcome, ReaderConfig,
    ReaderError, RpcError, SanctionsTiers, ScopeHashRequest, VerificationPolicy,
};

/// In-memory registry keyed by config id, counting every remote call.
#[derive(Default)]
struct CountingLedger {
    stored: HashMap<ConfigId, OnChainConfig>,
    calls: AtomicU32,
    fail: bool,
}

impl CountingLedger {
    fn with(id: ConfigId, config: OnChainConfig) -> Self {
        let mut ledger = Self::default();
        ledger.stored.insert(id, config);
        ledger
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for CountingLedger {
    async fn call(&self, network: &NetworkDescriptor, calldata: &[u8]) -> Result<Vec<u8>, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RpcError::Timeout {
                endpoint: network.rpc_url.clone(),
            });
        }

        let mut id = [0u8; 32];
        id.copy_from_slice(&calldata[4..36]);
        let stored = self.stored.get(&Digest32(id));
        match (&calldata[..4], stored) {
            (s, found) if s == EXISTS_SELECTOR => Ok(abi::bool_word(found.is_some()).to_vec()),
            (s, Some(config)) if s == GET_CONFIG_SELECTOR => Ok(config.encode()),
            _ => Err(RpcError::JsonRpc {
                endpoint: network.rpc_url.clone(),
                message: "execution reverted".to_string(),
            }),
        }
    }
}

fn mainnet() -> NetworkDescriptor {
    NetworkRegistry::builtin().get("mainnet").unwrap().clone()
}

fn deployed(policy: &VerificationPolicy) -> OnChainConfig {
    OnChainConfig {
        older_than_enabled: policy.age_check_enabled(),
        older_than: u64::from(policy.minimum_age()),
        forbidden_countries_enabled: policy.countries_enabled(),
        forbidden_countries_packed: pack(policy.excluded_countries()).unwrap(),
        ofac_enabled: policy.sanctions(),
    }
}

fn sample_policy() -> VerificationPolicy {
    VerificationPolicy::new(
        18,
        vec!["IRN".into(), "PRK".into(), "CUB".into()],
        SanctionsTiers::new(true, false, false),
    )
    .unwrap()
}

#[tokio::test]
async fn absent_config_is_not_found_after_one_call() {
    let reader = ChainConfigReader::new(CountingLedger::default());
    let outcome = reader.read(&ConfigId::of(b"missing"), &mainnet()).await.unwrap();

    assert!(matches!(outcome, ReadOutcome::NotFound));
    assert_eq!(reader.client().calls(), 1);
}

#[tokio::test]
async fn present_config_takes_two_calls_and_rehashes_to_its_id() {
    let policy = sample_policy();
    let id = config_id::generate(&policy).unwrap();
    let reader = ChainConfigReader::new(CountingLedger::with(id, deployed(&policy)));

    let ReadOutcome::Found(report) = reader.read(&id, &mainnet()).await.unwrap() else {
        panic!("expected config to be found");
    };
    assert_eq!(reader.client().calls(), 2);
    assert_eq!(report.configuration.excluded_countries.codes, vec!["IRN", "PRK", "CUB"]);
    assert_eq!(report.configuration.excluded_countries.readable[2].name, "Cuba");

    let reread = report.policy().unwrap();
    assert_eq!(reread, policy);
    assert_eq!(config_id::generate(&reread).unwrap(), id);
}

#[tokio::test]
async fn transport_failure_is_distinct_from_not_found() {
    let ledger = CountingLedger {
        fail: true,
        ..Default::default()
    };
    let reader = ChainConfigReader::new(ledger);
    let err = reader.read(&ConfigId::of(b"x"), &mainnet()).await.unwrap_err();

    assert!(matches!(err, ReaderError::Remote(RpcError::Timeout { .. })));
    assert_eq!(reader.client().calls(), 1);
}

#[tokio::test]
async fn service_config_id_offers_deploy_url_when_absent() {
    let service = ConfigService::new(NetworkRegistry::builtin(), CountingLedger::default());
    let request = ConfigIdRequest {
        policy: PolicyInput {
            minimum_age: 18,
            excluded_countries: vec!["USA".into(), "GBR".into()],
            sanctions_tiers: vec![true, false, false],
        },
        network: "mainnet".into(),
    };

    let response = service.generate_config_id(&request).await;
    assert_eq!(
        response.config_id.unwrap().to_hex(),
        "0xd2e86acafee6f3665076e71b93c75a3c20409d7a8eee2d8f478986da5af7c97c"
    );
    assert_eq!(response.exists_on_chain, Some(false));
    assert_eq!(
        response.deploy_url.as_deref(),
        Some("https://tools.self.xyz/?age=18&countries=USA,GBR&ofac=true,false,false")
    );
    assert!(response.error.is_none());
}

#[tokio::test]
async fn service_config_id_reports_unknown_existence() {
    let ledger = CountingLedger {
        fail: true,
        ..Default::default()
    };
    let service = ConfigService::new(NetworkRegistry::builtin(), ledger);
    let request: ConfigIdRequest =
        serde_json::from_value(serde_json::json!({ "minimum_age": 21 })).unwrap();

    let response = service.generate_config_id(&request).await;
    assert!(response.config_id.is_some());
    assert_eq!(response.exists_on_chain, None);
    assert_eq!(response.error_kind.as_deref(), Some("remote"));
    assert!(response.deploy_url.is_some());
}

#[tokio::test]
async fn service_config_id_rejects_before_any_call() {
    let service = ConfigService::new(NetworkRegistry::builtin(), CountingLedger::default());
    let request: ConfigIdRequest = serde_json::from_value(serde_json::json!({
        "minimum_age": 151,
        "excluded_countries": ["USA"],
        "network": "testnet"
    }))
    .unwrap();

    let response = service.generate_config_id(&request).await;
    assert!(response.config_id.is_none());
    assert_eq!(response.error_kind.as_deref(), Some("validation"));
    assert_eq!(response.violations[0].rule, "age_range");
    assert_eq!(service.reader().client().calls(), 0);
}

#[tokio::test]
async fn service_read_config_not_found_and_malformed() {
    let service = ConfigService::new(NetworkRegistry::builtin(), CountingLedger::default());

    let missing = service
        .read_config(&ReadConfigRequest {
            config_id: ConfigId::of(b"nope").to_hex(),
            network: "testnet".into(),
        })
        .await;
    assert_eq!(missing.exists, Some(false));
    assert_eq!(missing.error_kind.as_deref(), Some("not_found"));

    let malformed = service
        .read_config(&ReadConfigRequest {
            config_id: "0xabc".into(),
            network: "testnet".into(),
        })
        .await;
    assert_eq!(malformed.exists, None);
    assert_eq!(malformed.error_kind.as_deref(), Some("malformed_id"));
    assert_eq!(service.reader().client().calls(), 1);

    let unknown = service
        .read_config(&ReadConfigRequest {
            config_id: ConfigId::of(b"nope").to_hex(),
            network: "devnet".into(),
        })
        .await;
    assert_eq!(unknown.error_kind.as_deref(), Some("unknown_network"));
}

#[test]
fn service_scope_hash_and_countries() {
    let service = ConfigService::new(NetworkRegistry::builtin(), CountingLedger::default());
    let ok = service.generate_scope_hash(&ScopeHashRequest {
        endpoint: "0x1234567890abcdef1234567890abcdef12345678".into(),
        seed: "my-app-v1".into(),
    });
    assert_eq!(ok.validation, ValidationStatus::Valid);
    assert_eq!(
        ok.scope_hash.unwrap().to_hex(),
        "0x774a5e2d98744b0b4f6a2eeb0ad23ef5ae397b6e0012cc504428fd0e2f2efe71"
    );

    let bad = service.generate_scope_hash(&ScopeHashRequest {
        endpoint: "https://example.com".into(),
        seed: "MyApp".into(),
    });
    assert_eq!(bad.validation, ValidationStatus::Invalid);
    assert!(bad.scope_hash.is_none());
    assert!(bad.error.is_some());

    let hits = service.list_country_codes(Some("syr"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Syria");
}

// ── JSON-RPC transport ────────────────────────────────────────────────

fn network_at(server: &MockServer) -> NetworkDescriptor {
    NetworkDescriptor {
        rpc_url: server.uri(),
        ..mainnet()
    }
}

fn rpc_result(data: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": format!("0x{}", hex::encode(data)),
    })
}

#[tokio::test]
async fn json_rpc_client_reads_config() {
    let server = MockServer::start().await;
    let policy = sample_policy();
    let id = config_id::generate(&policy).unwrap();

    let exists_data = format!("0x{}", hex::encode(abi::encode_call(EXISTS_SELECTOR, &id)));
    let get_data = format!("0x{}", hex::encode(abi::encode_call(GET_CONFIG_SELECTOR, &id)));

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "method": "eth_call",
            "params": [{ "data": exists_data }, "latest"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(&abi::bool_word(true))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "params": [{ "data": get_data }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(&deployed(&policy).encode())))
        .expect(1)
        .mount(&server)
        .await;

    let client = JsonRpcClient::new(ReaderConfig { timeout_secs: 5 }).unwrap();
    let reader = ChainConfigReader::new(client);
    let ReadOutcome::Found(report) = reader.read(&id, &network_at(&server)).await.unwrap() else {
        panic!("expected config to be found");
    };
    assert_eq!(report.configuration.minimum_age.display, "18 years");
    assert_eq!(report.configuration.excluded_countries.count, 3);
}

#[tokio::test]
async fn json_rpc_error_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "execution reverted" }
        })))
        .mount(&server)
        .await;

    let reader = ChainConfigReader::new(JsonRpcClient::new(ReaderConfig::default()).unwrap());
    let err = reader
        .exists(&ConfigId::of(b"x"), &network_at(&server))
        .await
        .unwrap_err();
    match err {
        ReaderError::Remote(RpcError::JsonRpc { message, .. }) => {
            assert_eq!(message, "execution reverted")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_failure_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let reader = ChainConfigReader::new(JsonRpcClient::new(ReaderConfig::default()).unwrap());
    let err = reader
        .exists(&ConfigId::of(b"x"), &network_at(&server))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReaderError::Remote(RpcError::Status { status: 503, .. })
    ));
}

#[tokio::test]
async fn slow_node_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(rpc_result(&abi::bool_word(true)))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let reader = ChainConfigReader::new(JsonRpcClient::new(ReaderConfig { timeout_secs: 1 }).unwrap());
    let err = reader
        .exists(&ConfigId::of(b"x"), &network_at(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::Remote(RpcError::Timeout { .. })));
}

#[tokio::test]
async fn non_hex_result_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "result": "nothex"
        })))
        .mount(&server)
        .await;

    let reader = ChainConfigReader::new(JsonRpcClient::new(ReaderConfig::default()).unwrap());
    let err = reader
        .exists(&ConfigId::of(b"x"), &network_at(&server))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReaderError::Remote(RpcError::MalformedResponse { .. })
    ));
}
