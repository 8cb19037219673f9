use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use secmesh_core::{
    CancelFlag, CapabilityBinding, CapabilityModule, ExecutionKind, Health, InvocationContext,
    ErrorKind, OperationSpec, ParamSpec, ParamType, ToolError,
};
use secmesh_gateway::{assemble, load, resolve, Gateway};

type CallLog = Arc<Mutex<Vec<(String, Value)>>>;

struct MockModule {
    id: &'static str,
    ops: Vec<OperationSpec>,
    health: Health,
    responses: HashMap<String, Value>,
    calls: CallLog,
    delay_ms: u64,
    cancel_on_call: Option<CancelFlag>,
}

impl MockModule {
    fn new(id: &'static str, ops: Vec<OperationSpec>) -> Self {
        Self {
            id,
            ops,
            health: Health::Loaded,
            responses: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay_ms: 0,
            cancel_on_call: None,
        }
    }

    fn unhealthy(mut self, reason: &str) -> Self {
        self.health = Health::Failed(reason.to_string());
        self
    }

    fn respond(mut self, operation: &str, value: Value) -> Self {
        self.responses.insert(operation.to_string(), value);
        self
    }

    fn delayed(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    fn cancelling(mut self, flag: &CancelFlag) -> Self {
        self.cancel_on_call = Some(flag.clone());
        self
    }

    fn call_log(&self) -> CallLog {
        self.calls.clone()
    }
}

#[async_trait]
impl CapabilityModule for MockModule {
    fn identifier(&self) -> &'static str {
        self.id
    }

    fn describe(&self) -> Vec<OperationSpec> {
        self.ops.clone()
    }

    fn health(&self) -> Health {
        self.health.clone()
    }

    async fn call(
        &self,
        _ctx: &InvocationContext,
        operation: &str,
        args: &Value,
    ) -> Result<Value, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), args.clone()));
        if self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        if let Some(flag) = &self.cancel_on_call {
            flag.cancel();
        }
        Ok(self
            .responses
            .get(operation)
            .cloned()
            .unwrap_or_else(|| json!({"ok": operation})))
    }
}

fn op(name: &str) -> OperationSpec {
    OperationSpec::new(name, "test operation", ExecutionKind::Local, vec![])
}

fn factory_of(
    modules: Vec<Arc<MockModule>>,
) -> impl Fn(&str) -> Result<Arc<dyn CapabilityModule>, ToolError> {
    move |identifier| {
        modules
            .iter()
            .find(|m| m.id == identifier)
            .map(|m| m.clone() as Arc<dyn CapabilityModule>)
            .ok_or_else(|| ToolError::NotAvailable(format!("unknown module '{identifier}'")))
    }
}

fn activation(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn load_tolerates_missing_module() {
    let alpha = Arc::new(MockModule::new("alpha", vec![op("alpha_op")]));
    let beta = Arc::new(MockModule::new("beta", vec![op("beta_op")]));
    let factory = factory_of(vec![alpha, beta]);

    let registry = load(&activation(&["alpha", "missing_module", "beta"]), factory);

    assert_eq!(registry.loaded().count(), 2);
    let failed: Vec<_> = registry.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].identifier, "missing_module");
    assert!(failed[0].failure_reason.is_some());

    let surface = assemble(&registry);
    assert_eq!(surface.len(), 2);
    let names: Vec<_> = surface
        .list_tools()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["alpha_op", "beta_op"]);
}

#[tokio::test]
async fn load_rejects_duplicate_identifier() {
    let alpha = Arc::new(MockModule::new("alpha", vec![op("alpha_op")]));
    let factory = factory_of(vec![alpha]);

    let registry = load(&activation(&["alpha", "alpha"]), factory);

    assert_eq!(registry.loaded().count(), 1);
    let failed: Vec<_> = registry.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(
        failed[0].failure_reason.as_deref(),
        Some("duplicate module identifier")
    );
}

#[tokio::test]
async fn unhealthy_module_is_recorded_and_excluded() {
    let alpha = Arc::new(MockModule::new("alpha", vec![op("alpha_op")]));
    let broken =
        Arc::new(MockModule::new("broken", vec![op("broken_op")]).unhealthy("credential missing"));
    let factory = factory_of(vec![alpha, broken]);

    let registry = load(&activation(&["alpha", "broken"]), factory);

    assert_eq!(registry.loaded().count(), 1);
    let failed: Vec<_> = registry.failed().collect();
    assert_eq!(failed[0].failure_reason.as_deref(), Some("credential missing"));

    let surface = assemble(&registry);
    assert!(surface.get("broken_op").is_none());
}

#[tokio::test]
async fn collision_is_first_registration_wins() {
    let first = Arc::new(MockModule::new("first", vec![op("search")]));
    let second = Arc::new(MockModule::new("second", vec![op("search"), op("second_only")]));
    let factory = factory_of(vec![first, second]);

    let registry = load(&activation(&["first", "second"]), factory);
    let surface = assemble(&registry);

    assert_eq!(surface.len(), 2);
    assert_eq!(surface.get("search").unwrap().origin_module, "first");
    assert_eq!(surface.get("second_only").unwrap().origin_module, "second");

    let excluded = surface.excluded();
    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].public_name, "search");
    assert_eq!(excluded[0].origin_module, "second");
    assert_eq!(excluded[0].claimed_by, "first");

    // Pure function of registry order: a second assembly is identical.
    let again = assemble(&registry);
    assert_eq!(again.get("search").unwrap().origin_module, "first");
    assert_eq!(again.excluded().len(), 1);
}

fn nl_local_module() -> MockModule {
    let search = OperationSpec::new(
        "search_events_text",
        "one-step natural-language search",
        ExecutionKind::Local,
        vec![ParamSpec::required("text", ParamType::String, "query text")],
    )
    .with_capability(CapabilityBinding::single("nl_search"));
    MockModule::new("siem_local", vec![search])
}

fn nl_remote_module() -> MockModule {
    let translate = OperationSpec::new(
        "translate_query",
        "translate natural language to a query",
        ExecutionKind::Remote,
        vec![ParamSpec::required("text", ParamType::String, "query text")],
    )
    .with_capability(CapabilityBinding::step("nl_search", 0, Some("query")));
    let search = OperationSpec::new(
        "execute_query",
        "execute a translated query",
        ExecutionKind::Remote,
        vec![ParamSpec::required("query", ParamType::String, "query")],
    )
    .with_capability(CapabilityBinding::step("nl_search", 1, None));
    MockModule::new("siem_remote", vec![translate, search])
}

#[tokio::test]
async fn resolver_prefers_remote_plan() {
    let local = Arc::new(nl_local_module());
    let remote = Arc::new(nl_remote_module());
    let factory = factory_of(vec![local, remote]);

    let registry = load(&activation(&["siem_local", "siem_remote"]), factory);
    let surface = assemble(&registry);

    let plan = resolve("nl_search", &surface).unwrap();
    assert_eq!(plan.kind, ExecutionKind::Remote);
    assert_eq!(plan.origin_module, "siem_remote");
    assert_eq!(plan.steps.len(), 2);
    assert_eq!(plan.steps[0].public_name, "translate_query");
    assert_eq!(plan.steps[1].public_name, "execute_query");
}

#[tokio::test]
async fn resolver_falls_back_to_local_when_remote_failed() {
    let local = Arc::new(nl_local_module());
    let remote = Arc::new(nl_remote_module().unhealthy("no token"));
    let factory = factory_of(vec![local, remote]);

    let registry = load(&activation(&["siem_local", "siem_remote"]), factory);
    let surface = assemble(&registry);

    let plan = resolve("nl_search", &surface).unwrap();
    assert_eq!(plan.kind, ExecutionKind::Local);
    assert_eq!(plan.origin_module, "siem_local");
    assert_eq!(plan.steps.len(), 1);
}

#[tokio::test]
async fn resolver_reports_unknown_capability() {
    let local = Arc::new(nl_local_module());
    let factory = factory_of(vec![local]);

    let registry = load(&activation(&["siem_local"]), factory);
    let surface = assemble(&registry);

    let err = resolve("case_triage", &surface).unwrap_err();
    assert!(matches!(err, ToolError::NotAvailable(_)));
}

#[tokio::test]
async fn resolver_rejects_broken_step_sequence() {
    let orphan = OperationSpec::new(
        "finish_only",
        "second half of a workflow",
        ExecutionKind::Remote,
        vec![],
    )
    .with_capability(CapabilityBinding::step("nl_search", 1, None));
    let module = Arc::new(MockModule::new("gappy", vec![orphan]));
    let factory = factory_of(vec![module]);

    let registry = load(&activation(&["gappy"]), factory);
    let surface = assemble(&registry);

    let err = resolve("nl_search", &surface).unwrap_err();
    assert!(matches!(err, ToolError::Internal(_)));
}

#[tokio::test]
async fn two_step_plan_pipes_payload_into_next_step() {
    let remote = Arc::new(
        nl_remote_module()
            .respond("translate_query", json!("principal.ip = \"1.2.3.4\""))
            .respond("execute_query", json!({"events": [], "total_events": 0})),
    );
    let log = remote.call_log();
    let factory = factory_of(vec![remote]);

    let gateway = Gateway::new(&activation(&["siem_remote"]), factory, 5_000);
    let cancel = CancelFlag::new();
    let result = gateway
        .call_capability("nl_search", &json!({"text": "dns traffic from 1.2.3.4"}), &cancel)
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
    assert_eq!(result.origin_module.as_deref(), Some("siem_remote"));
    assert_eq!(result.payload, Some(json!({"events": [], "total_events": 0})));

    let calls = log.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "translate_query");
    assert_eq!(calls[1].0, "execute_query");
    // Caller arguments merged with the piped payload.
    assert_eq!(calls[1].1["query"], json!("principal.ip = \"1.2.3.4\""));
    assert_eq!(calls[1].1["text"], json!("dns traffic from 1.2.3.4"));
}

#[tokio::test]
async fn timeout_yields_timeout_error() {
    let slow = Arc::new(MockModule::new("slow", vec![op("sleepy")]).delayed(10_000));
    let factory = factory_of(vec![slow]);

    let gateway = Gateway::new(&activation(&["slow"]), factory, 100);
    let cancel = CancelFlag::new();
    let result = gateway.call_tool("sleepy", &json!({}), &cancel).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(result.origin_module.as_deref(), Some("slow"));
}

#[tokio::test]
async fn cancellation_aborts_between_steps() {
    let cancel = CancelFlag::new();
    let remote = Arc::new(
        nl_remote_module()
            .respond("translate_query", json!("q"))
            .cancelling(&cancel),
    );
    let log = remote.call_log();
    let factory = factory_of(vec![remote]);

    let gateway = Gateway::new(&activation(&["siem_remote"]), factory, 5_000);
    let result = gateway
        .call_capability("nl_search", &json!({"text": "anything"}), &cancel)
        .await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Cancelled));
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_module() {
    let local = Arc::new(nl_local_module());
    let log = local.call_log();
    let factory = factory_of(vec![local]);

    let gateway = Gateway::new(&activation(&["siem_local"]), factory, 5_000);
    let cancel = CancelFlag::new();
    let result = gateway
        .call_tool("search_events_text", &json!({"text": 7}), &cancel)
        .await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::InvalidArgument));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_tool_is_not_available() {
    let local = Arc::new(nl_local_module());
    let factory = factory_of(vec![local]);

    let gateway = Gateway::new(&activation(&["siem_local"]), factory, 5_000);
    let cancel = CancelFlag::new();
    let result = gateway.call_tool("no_such_tool", &json!({}), &cancel).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::NotAvailable));
}

#[tokio::test]
async fn list_tools_is_idempotent() {
    let alpha = Arc::new(MockModule::new("alpha", vec![op("alpha_op"), op("alpha_two")]));
    let factory = factory_of(vec![alpha]);

    let gateway = Gateway::new(&activation(&["alpha"]), factory, 5_000);
    assert_eq!(gateway.list_tools(), gateway.list_tools());
}

#[tokio::test]
async fn surface_order_follows_activation_order() {
    let beta = Arc::new(MockModule::new("beta", vec![op("b1")]));
    let alpha = Arc::new(MockModule::new("alpha", vec![op("a1"), op("a2")]));
    let factory = factory_of(vec![alpha, beta]);

    let registry = load(&activation(&["beta", "alpha"]), factory);
    let surface = assemble(&registry);

    let names: Vec<_> = surface
        .entries()
        .iter()
        .map(|e| e.public_name.clone())
        .collect();
    assert_eq!(names, vec!["b1", "a1", "a2"]);
}
