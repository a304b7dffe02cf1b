//! End-to-end constructor-argument recovery against canned explorer and RPC
//! responses.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::B256;
use chainverify_core::config::{ChainMetadata, ChainRegistry};
use chainverify_core::decoder::create_selector;
use chainverify_core::policy::{Throttle, Unthrottled};
use chainverify_core::proxy::{EIP1967_ADMIN_SLOT, EIP1967_IMPL_SLOT};
use chainverify_core::types::{ChainExplorerConfig, ExplorerFamily};
use chainverify_core::VerifyError;
use chainverify_explorer::{
    BytecodeStripStrategy, ConstructorArgsResolver, ExplorerClient, HttpFetch, StrategyTable,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use url::Url;

// ─── Helpers ──────────────────────────────────────────────────────────────────

const CONTRACT: &str = "0x3f7f02453518a55c0c6f89f0a6a8ab6c22da01df";
const RPC_URL: &str = "https://rpc.example";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Get(Url),
    Post(Url, Value),
}

type Handler = Box<dyn Fn(&Call) -> Option<Value> + Send + Sync>;

struct MockHttp {
    handler: Handler,
    calls: Mutex<Vec<Call>>,
}

impl MockHttp {
    fn new(handler: impl Fn(&Call) -> Option<Value> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, call: Call) -> Result<Value, VerifyError> {
        let resp = (self.handler)(&call);
        self.calls.lock().unwrap().push(call);
        resp.ok_or_else(|| VerifyError::Http("HTTP 404: no route".into()))
    }
}

#[async_trait]
impl HttpFetch for MockHttp {
    async fn get_json(&self, url: &Url) -> Result<Value, VerifyError> {
        self.respond(Call::Get(url.clone()))
    }

    async fn post_json(&self, url: &Url, body: &Value) -> Result<Value, VerifyError> {
        self.respond(Call::Post(url.clone(), body.clone()))
    }
}

#[derive(Default)]
struct CountingThrottle(AtomicUsize);

#[async_trait]
impl Throttle for CountingThrottle {
    async fn acquire(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn rpc_result(result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": 1, "result": result})
}

fn is_rpc(call: &Call, method: &str) -> bool {
    matches!(call, Call::Post(_, body) if body["method"] == method)
}

fn registry(family: ExplorerFamily, api_url: &str, api_key: Option<&str>) -> Arc<ChainRegistry> {
    let mut explorer = ChainExplorerConfig::new(api_url, family);
    explorer.api_key = api_key.map(str::to_string);
    let mut registry = ChainRegistry::new();
    registry.insert(ChainMetadata::new("testchain", RPC_URL, explorer));
    Arc::new(registry)
}

fn resolver(registry: Arc<ChainRegistry>, http: Arc<MockHttp>) -> ConstructorArgsResolver {
    ConstructorArgsResolver::new(registry, ExplorerClient::new(http, Arc::new(Unthrottled)))
}

/// Explorer creation lookup → `0xabc`; RPC tx input → `input`.
fn etherscan_like(input: &'static str) -> impl Fn(&Call) -> Option<Value> + Send + Sync {
    move |call| match call {
        Call::Get(_) => Some(json!({"status": "1", "message": "OK", "result": [{"txHash": "0xabc"}]})),
        c if is_rpc(c, "eth_getTransactionByHash") => Some(rpc_result(json!({"input": input}))),
        _ => None,
    }
}

fn create_calldata(input: &[u8]) -> String {
    let args = DynSolValue::Tuple(vec![
        DynSolValue::FixedBytes(B256::repeat_byte(0x01), 32),
        DynSolValue::FixedBytes(B256::repeat_byte(0x03), 32),
        DynSolValue::Bytes(input.to_vec()),
    ]);
    let mut data = create_selector().to_vec();
    data.extend(args.abi_encode_params());
    format!("0x{}", hex::encode(data))
}

// ─── Etherscan / Routescan ────────────────────────────────────────────────────

#[tokio::test]
async fn etherscan_strips_known_bytecode() {
    let http = MockHttp::new(etherscan_like("0xBYTECODEDEADBEEF"));
    let resolver = resolver(
        registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", Some("KEY")),
        http.clone(),
    );

    let args = resolver
        .constructor_arguments("testchain", CONTRACT, "0xBYTECODE")
        .await
        .unwrap();
    assert_eq!(args, "deadbeef");

    let calls = http.calls();
    assert_eq!(calls.len(), 2);
    match &calls[0] {
        Call::Get(url) => {
            let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
            assert_eq!(
                pairs,
                vec![
                    ("module".to_string(), "contract".to_string()),
                    ("action".to_string(), "getcontractcreation".to_string()),
                    ("contractaddresses".to_string(), CONTRACT.to_string()),
                    ("apikey".to_string(), "KEY".to_string()),
                ]
            );
        }
        other => panic!("expected explorer GET first, got {other:?}"),
    }
    match &calls[1] {
        Call::Post(url, body) => {
            assert_eq!(url.as_str(), "https://rpc.example/");
            assert_eq!(
                body,
                &json!({
                    "method": "eth_getTransactionByHash",
                    "params": ["0xabc"],
                    "id": 1,
                    "jsonrpc": "2.0"
                })
            );
        }
        other => panic!("expected RPC POST second, got {other:?}"),
    }
}

#[tokio::test]
async fn routescan_uses_the_same_strategy() {
    let http = MockHttp::new(etherscan_like("0x6080604052000000000000000000000000000000000000000000000000000000000000002a"));
    let resolver = resolver(
        registry(ExplorerFamily::Routescan, "https://api.routescan.io/v2/network/mainnet/evm/43114/etherscan/api", None),
        http.clone(),
    );
    let args = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080604052")
        .await
        .unwrap();
    assert_eq!(args, format!("{}2a", "0".repeat(62)));
    match &http.calls()[0] {
        Call::Get(url) => assert!(!url.as_str().contains("apikey")),
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn bytecode_mismatch_passes_input_through() {
    let http = MockHttp::new(etherscan_like("0xcafebabe"));
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    let args = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap();
    assert_eq!(args, "cafebabe");
}

#[tokio::test]
async fn explorer_request_is_paced_once_per_lookup() {
    let http = MockHttp::new(etherscan_like("0x60806040"));
    let throttle = Arc::new(CountingThrottle::default());
    let client = ExplorerClient::new(http, throttle.clone());
    let resolver = ConstructorArgsResolver::new(
        registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None),
        client,
    );
    resolver
        .constructor_arguments("testchain", CONTRACT, "0x60806040")
        .await
        .unwrap();
    assert_eq!(throttle.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blockscout_lookup_is_paced_too() {
    let http = MockHttp::new(|_| Some(json!({"constructor_args": "0x0a"})));
    let throttle = Arc::new(CountingThrottle::default());
    let resolver = ConstructorArgsResolver::new(
        registry(ExplorerFamily::Blockscout, "https://explorer.example.com/api", None),
        ExplorerClient::new(http, throttle.clone()),
    );
    resolver
        .constructor_arguments("testchain", CONTRACT, "")
        .await
        .unwrap();
    assert_eq!(throttle.0.load(Ordering::SeqCst), 1);
}

// ─── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_creation_tx_is_typed_and_stops_the_flow() {
    let http = MockHttp::new(|call| match call {
        Call::Get(_) => Some(json!({"status": "0", "message": "No data found", "result": "No data found"})),
        _ => None,
    });
    let resolver = resolver(
        registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None),
        http.clone(),
    );
    let err = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap_err();
    match &err {
        VerifyError::CreationTxNotFound { chain, address } => {
            assert_eq!(chain, "testchain");
            assert_eq!(address, CONTRACT);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_retryable());
    assert_eq!(http.calls().len(), 1, "no RPC call after a failed lookup");
}

#[derive(Clone, Default)]
struct EventFields(Arc<Mutex<Vec<Vec<String>>>>);

struct FieldNames(Vec<String>);

impl Visit for FieldNames {
    fn record_debug(&mut self, field: &Field, _value: &dyn std::fmt::Debug) {
        self.0.push(field.name().to_string());
    }
}

impl<S: Subscriber> Layer<S> for EventFields {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut names = FieldNames(Vec::new());
        event.record(&mut names);
        self.0.lock().unwrap().push(names.0);
    }
}

#[tokio::test]
async fn not_found_warning_keeps_explorer_message_separate() {
    let events = EventFields::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(events.clone()));

    let http = MockHttp::new(|_| Some(json!({"status": "0", "message": "No data found", "result": []})));
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap_err();

    let recorded = events.0.lock().unwrap();
    let warning = recorded
        .iter()
        .find(|fields| fields.iter().any(|f| f == "explorer_message"))
        .expect("not-found warning recorded");
    assert_eq!(warning.iter().filter(|f| *f == "message").count(), 1);
}

#[tokio::test]
async fn empty_result_list_is_not_found() {
    let http = MockHttp::new(|_| Some(json!({"result": []})));
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    let err = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::CreationTxNotFound { .. }));
}

#[tokio::test]
async fn rpc_error_propagates() {
    let http = MockHttp::new(|call| match call {
        Call::Get(_) => Some(json!({"result": [{"txHash": "0xabc"}]})),
        Call::Post(..) => Some(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32603, "message": "internal error"}})),
    });
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    let err = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::Rpc { code: -32603, .. }));
}

#[tokio::test]
async fn unknown_transaction_is_missing_result() {
    let http = MockHttp::new(|call| match call {
        Call::Get(_) => Some(json!({"result": [{"txHash": "0xabc"}]})),
        Call::Post(..) => Some(rpc_result(Value::Null)),
    });
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    let err = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::MissingField { ref field } if field == "result"));
}

#[tokio::test]
async fn http_failure_propagates() {
    let http = MockHttp::new(|_| None);
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    let err = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::Http(_)));
}

#[tokio::test]
async fn unsupported_family_fails_before_any_request() {
    let http = MockHttp::new(|_| Some(json!({})));
    let resolver = resolver(
        registry(ExplorerFamily::Voyager, "https://voyager.example/api", None),
        http.clone(),
    );
    let err = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::UnsupportedFamily { family: ExplorerFamily::Voyager }));
    assert!(err.to_string().contains("voyager"));
    assert!(http.calls().is_empty());
}

#[tokio::test]
async fn unknown_chain_is_rejected() {
    let http = MockHttp::new(|_| Some(json!({})));
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    let err = resolver
        .constructor_arguments("nowhere", CONTRACT, "0x6080")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::UnknownChain { .. }));
}

#[tokio::test]
async fn registered_strategy_enables_new_family() {
    let http = MockHttp::new(etherscan_like("0x6080aa"));
    let mut table = StrategyTable::default();
    table.register(ExplorerFamily::Other, Arc::new(BytecodeStripStrategy));
    let resolver = resolver(registry(ExplorerFamily::Other, "https://other.example/api", None), http)
        .with_strategies(table);
    let args = resolver
        .constructor_arguments("testchain", CONTRACT, "0x6080")
        .await
        .unwrap();
    assert_eq!(args, "aa");
}

// ─── Blockscout ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn blockscout_reads_indexed_constructor_args() {
    let http = MockHttp::new(|call| match call {
        Call::Get(url) if url.path() == format!("/api/v2/smart-contracts/{CONTRACT}") => {
            Some(json!({"name": "Mailbox", "constructor_args": "0x000000000000000000000000000000000000000000000000000000000000000a"}))
        }
        _ => None,
    });
    let resolver = resolver(
        registry(ExplorerFamily::Blockscout, "https://explorer.example.com/api", None),
        http.clone(),
    );
    let args = resolver
        .constructor_arguments("testchain", CONTRACT, "0xunused")
        .await
        .unwrap();
    assert_eq!(args, format!("{}a", "0".repeat(63)));
    assert_eq!(http.calls().len(), 1);
}

#[tokio::test]
async fn blockscout_without_args_is_empty() {
    let http = MockHttp::new(|_| Some(json!({"constructor_args": null})));
    let resolver = resolver(registry(ExplorerFamily::Blockscout, "https://explorer.example.com/api", None), http);
    let args = resolver
        .constructor_arguments("testchain", CONTRACT, "")
        .await
        .unwrap();
    assert_eq!(args, "");
}

// ─── ZKSync ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn zksync_decodes_create_call() {
    let calldata = create_calldata(&[0xAA, 0xBB, 0xCC]);
    let http = MockHttp::new(move |call| match call {
        Call::Get(url) if url.path() == "/api" => Some(json!({"result": [{"txHash": "0xdef"}]})),
        c if is_rpc(c, "eth_getTransactionByHash") => Some(rpc_result(json!({"input": calldata}))),
        _ => None,
    });
    let resolver = resolver(
        registry(
            ExplorerFamily::ZkSync,
            "https://zksync.explorer.example/verification/contract_verification",
            None,
        ),
        http,
    );
    let args = resolver
        .constructor_arguments("testchain", CONTRACT, "0xignored")
        .await
        .unwrap();
    assert_eq!(args, "aabbcc");
}

#[tokio::test]
async fn zksync_rejects_non_create_input() {
    let http = MockHttp::new(etherscan_like("0xa9059cbb00000000"));
    let resolver = resolver(
        registry(ExplorerFamily::ZkSync, "https://zksync.explorer.example/api", None),
        http,
    );
    let err = resolver
        .constructor_arguments("testchain", CONTRACT, "")
        .await
        .unwrap_err();
    assert!(err.is_abi_error());
}

// ─── Proxies ──────────────────────────────────────────────────────────────────

const ADMIN: &str = "0x00000000000000000000000000000000000000ad";
const IMPL: &str = "0x00000000000000000000000000000000000000e1";

fn slot_word(addr: &str) -> String {
    format!("0x{:0>64}", &addr[2..])
}

#[tokio::test]
async fn proxy_and_admin_inputs_from_storage_slots() {
    let http = MockHttp::new(|call| match call {
        Call::Get(url) => {
            let address = url
                .query_pairs()
                .find(|(k, _)| k == "contractaddresses")
                .map(|(_, v)| v.into_owned())?;
            let tx = if address == ADMIN { "0xadmintx" } else { "0xproxytx" };
            Some(json!({"result": [{"txHash": tx}]}))
        }
        Call::Post(_, body) => match body["method"].as_str()? {
            "eth_getStorageAt" => {
                let slot = body["params"][1].as_str()?;
                let addr = if slot == EIP1967_ADMIN_SLOT {
                    ADMIN
                } else if slot == EIP1967_IMPL_SLOT {
                    IMPL
                } else {
                    return None;
                };
                Some(rpc_result(json!(slot_word(addr))))
            }
            "eth_getTransactionByHash" => {
                let input = match body["params"][0].as_str()? {
                    "0xadmintx" => "0xaaaa",
                    "0xproxytx" => "0xbbbb0101",
                    _ => return None,
                };
                Some(rpc_result(json!({"input": input})))
            }
            _ => None,
        },
    });
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);

    let inputs = resolver
        .proxy_and_admin_inputs("testchain", CONTRACT, "0xaaaa", "0xbbbb")
        .await
        .unwrap();

    assert_eq!(inputs.proxy_admin.name, "ProxyAdmin");
    assert_eq!(inputs.proxy_admin.address, ADMIN);
    assert_eq!(inputs.proxy_admin.constructor_arguments, "");
    assert!(!inputs.proxy_admin.is_proxy);
    assert_eq!(inputs.proxy_admin.expected_implementation, None);

    let proxy = &inputs.transparent_upgradeable_proxy;
    assert_eq!(proxy.name, "TransparentUpgradeableProxy");
    assert_eq!(proxy.address, CONTRACT);
    assert_eq!(proxy.constructor_arguments, "0101");
    assert!(proxy.is_proxy);
    assert_eq!(proxy.expected_implementation.as_deref(), Some(IMPL));
}

#[tokio::test]
async fn empty_admin_slot_is_an_error() {
    let http = MockHttp::new(|call| match call {
        c if is_rpc(c, "eth_getStorageAt") => Some(rpc_result(json!(format!("0x{}", "0".repeat(64))))),
        _ => None,
    });
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    let err = resolver
        .proxy_and_admin_inputs("testchain", CONTRACT, "0xaaaa", "0xbbbb")
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::MissingField { .. }));
}

#[tokio::test]
async fn implementation_input_is_capitalized_and_not_proxy() {
    let http = MockHttp::new(etherscan_like("0x6080ff"));
    let resolver = resolver(registry(ExplorerFamily::Etherscan, "https://api.etherscan.io/api", None), http);
    let input = resolver
        .implementation_input("testchain", "mailbox", CONTRACT, "0x6080")
        .await
        .unwrap();
    assert_eq!(input.name, "Mailbox");
    assert_eq!(input.constructor_arguments, "ff");
    assert!(!input.is_proxy);
}
