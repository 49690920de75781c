//! Orchestration loop integration tests
//!
//! Drives the loop with a scripted backend and an in-memory tool
//! transport, with no network involved.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use driftwatch::agent::{Assistant, Orchestrator, RunOutcome};
use driftwatch::Config;
use driftwatch::core::{
    DriftwatchError, ErrorKind, Result, ToolCall, ToolErrorKind, ToolSchema, Turn,
};
use driftwatch::llm::{Generation, GenerationClient};
use driftwatch::tools::{Dispatcher, RemoteTool, ToolSnapshot, ToolTransport};

/// Backend that replays a scripted sequence of generations
struct ScriptedClient {
    script: Mutex<VecDeque<Generation>>,
    calls: AtomicU32,
    step_hints: Mutex<Vec<u32>>,
    contexts: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedClient {
    fn new(script: Vec<Generation>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
            step_hints: Mutex::new(Vec::new()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(
        &self,
        context: &[Turn],
        _tools: &[ToolSchema],
        steps_remaining: u32,
    ) -> Result<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.step_hints.lock().unwrap().push(steps_remaining);
        self.contexts.lock().unwrap().push(context.to_vec());

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DriftwatchError::Backend("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Backend that never answers, for deadline tests
struct HangingClient;

#[async_trait]
impl GenerationClient for HangingClient {
    async fn generate(
        &self,
        _context: &[Turn],
        _tools: &[ToolSchema],
        _steps_remaining: u32,
    ) -> Result<Generation> {
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

/// Per-tool behavior for the in-memory transport
#[derive(Clone)]
struct ToolBehavior {
    latency: Duration,
    fail: bool,
}

/// Transport that answers from an in-memory table
struct TableTransport {
    behaviors: HashMap<String, ToolBehavior>,
    invocations: Mutex<Vec<String>>,
}

impl TableTransport {
    fn new(behaviors: HashMap<String, ToolBehavior>) -> Self {
        Self {
            behaviors,
            invocations: Mutex::new(Vec::new()),
        }
    }

    fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolTransport for TableTransport {
    async fn invoke(
        &self,
        tool: &RemoteTool,
        _arguments: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.invocations.lock().unwrap().push(tool.name.clone());

        let behavior = self
            .behaviors
            .get(&tool.name)
            .cloned()
            .unwrap_or(ToolBehavior {
                latency: Duration::ZERO,
                fail: false,
            });

        tokio::time::sleep(behavior.latency).await;

        if behavior.fail {
            return Err(DriftwatchError::Registry(format!(
                "{} answered with 500",
                tool.name
            )));
        }
        Ok(json!({"tool": tool.name, "drift_score": 0.4}))
    }
}

fn remote_tool(name: &str) -> RemoteTool {
    RemoteTool {
        name: name.to_string(),
        description: format!("{} tool", name),
        parameters: json!({"type": "object"}),
        provider: "http://tools:9400".to_string(),
    }
}

fn generation(text: Option<&str>, tool_calls: Vec<ToolCall>) -> Generation {
    Generation {
        text: text.map(str::to_string),
        tool_calls,
        model: "drift-planner".to_string(),
        usage: None,
    }
}

struct Harness {
    client: Arc<ScriptedClient>,
    transport: Arc<TableTransport>,
    orchestrator: Orchestrator,
}

fn harness(
    script: Vec<Generation>,
    tools: Vec<RemoteTool>,
    behaviors: HashMap<String, ToolBehavior>,
    max_steps: u32,
) -> Harness {
    let client = Arc::new(ScriptedClient::new(script));
    let transport = Arc::new(TableTransport::new(behaviors));
    let snapshot = Arc::new(ToolSnapshot::from_tools(tools));
    let dispatcher = Dispatcher::new(snapshot, transport.clone(), Duration::from_secs(30));
    let orchestrator = Orchestrator::new(
        client.clone(),
        dispatcher,
        max_steps,
        Duration::from_secs(300),
    );
    Harness {
        client,
        transport,
        orchestrator,
    }
}

#[tokio::test]
async fn completes_on_first_call_free_turn() {
    let h = harness(
        vec![generation(Some("n1 looks healthy"), vec![])],
        vec![remote_tool("node_status")],
        HashMap::new(),
        10,
    );

    let outcome = h
        .orchestrator
        .run("sys", "is n1 healthy?", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed("n1 looks healthy".to_string()));
    assert_eq!(h.client.calls(), 1);
    assert!(h.transport.invocations().is_empty());
}

#[tokio::test]
async fn tool_turn_then_answer() {
    let h = harness(
        vec![
            generation(
                None,
                vec![ToolCall::new("c1", "node_status", json!({"node": "n1"}))],
            ),
            generation(Some("n1 drift is 0.4, normal"), vec![]),
        ],
        vec![remote_tool("node_status")],
        HashMap::new(),
        10,
    );

    let outcome = h
        .orchestrator
        .run("sys", "is n1 drifting?", CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_completed());
    assert_eq!(h.client.calls(), 2);
    assert_eq!(h.transport.invocations(), vec!["node_status".to_string()]);

    // The second generation call must see the tool result in context.
    let contexts = h.client.contexts.lock().unwrap();
    let second = &contexts[1];
    assert!(matches!(second[2], Turn::Assistant { .. }));
    assert!(matches!(second[3], Turn::ToolResult(_)));
}

#[tokio::test]
async fn exhaustion_without_any_text() {
    let h = harness(
        vec![generation(
            None,
            vec![ToolCall::new("c1", "node_status", json!({}))],
        )],
        vec![remote_tool("node_status")],
        HashMap::new(),
        1,
    );

    let outcome = h
        .orchestrator
        .run("sys", "check n1", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::BudgetExhausted(None));
    assert_eq!(h.client.calls(), 1);
}

#[tokio::test]
async fn exhaustion_carries_last_assistant_text() {
    let h = harness(
        vec![
            generation(
                Some("checking n1 first"),
                vec![ToolCall::new("c1", "node_status", json!({}))],
            ),
            generation(
                None,
                vec![ToolCall::new("c2", "node_status", json!({}))],
            ),
        ],
        vec![remote_tool("node_status")],
        HashMap::new(),
        2,
    );

    let outcome = h
        .orchestrator
        .run("sys", "check n1", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::BudgetExhausted(Some("checking n1 first".to_string()))
    );
}

#[tokio::test]
async fn step_hint_counts_down() {
    let h = harness(
        vec![
            generation(None, vec![ToolCall::new("c1", "node_status", json!({}))]),
            generation(Some("done"), vec![]),
        ],
        vec![remote_tool("node_status")],
        HashMap::new(),
        10,
    );

    h.orchestrator
        .run("sys", "check n1", CancellationToken::new())
        .await
        .unwrap();

    let hints = h.client.step_hints.lock().unwrap();
    assert_eq!(*hints, vec![10, 9]);
}

#[tokio::test]
async fn unknown_tool_is_an_observation_not_a_failure() {
    let h = harness(
        vec![
            generation(None, vec![ToolCall::new("c1", "reboot_node", json!({}))]),
            generation(Some("that tool does not exist"), vec![]),
        ],
        vec![remote_tool("node_status")],
        HashMap::new(),
        10,
    );

    let outcome = h
        .orchestrator
        .run("sys", "reboot n1", CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_completed());
    // The transport must never have been asked.
    assert!(h.transport.invocations().is_empty());

    // The second generation call saw an error record for c1.
    let contexts = h.client.contexts.lock().unwrap();
    let Turn::ToolResult(record) = &contexts[1][3] else {
        panic!("expected a tool result turn");
    };
    assert_eq!(record.call_id, "c1");
    assert_eq!(record.error_kind(), Some(ToolErrorKind::UnknownTool));
}

#[tokio::test(start_paused = true)]
async fn tool_timeout_feeds_back_and_loop_continues() {
    let mut behaviors = HashMap::new();
    behaviors.insert(
        "node_status".to_string(),
        ToolBehavior {
            latency: Duration::from_secs(120),
            fail: false,
        },
    );

    let h = harness(
        vec![
            generation(None, vec![ToolCall::new("c1", "node_status", json!({}))]),
            generation(Some("node_status timed out"), vec![]),
        ],
        vec![remote_tool("node_status")],
        behaviors,
        10,
    );

    let outcome = h
        .orchestrator
        .run("sys", "check n1", CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_completed());
    assert_eq!(h.client.calls(), 2);

    let contexts = h.client.contexts.lock().unwrap();
    let Turn::ToolResult(record) = &contexts[1][3] else {
        panic!("expected a tool result turn");
    };
    assert_eq!(record.error_kind(), Some(ToolErrorKind::Timeout));
}

#[tokio::test(start_paused = true)]
async fn results_come_back_in_emission_order() {
    let mut behaviors = HashMap::new();
    behaviors.insert(
        "slow_history".to_string(),
        ToolBehavior {
            latency: Duration::from_secs(3),
            fail: false,
        },
    );
    behaviors.insert(
        "node_status".to_string(),
        ToolBehavior {
            latency: Duration::ZERO,
            fail: false,
        },
    );

    let h = harness(
        vec![
            generation(
                None,
                vec![
                    ToolCall::new("c1", "slow_history", json!({})),
                    ToolCall::new("c2", "node_status", json!({})),
                ],
            ),
            generation(Some("done"), vec![]),
        ],
        vec![remote_tool("slow_history"), remote_tool("node_status")],
        behaviors,
        10,
    );

    h.orchestrator
        .run("sys", "compare", CancellationToken::new())
        .await
        .unwrap();

    // The fast tool finished first, but records follow emission order.
    let contexts = h.client.contexts.lock().unwrap();
    let second = &contexts[1];
    let Turn::ToolResult(first) = &second[3] else {
        panic!("expected a tool result turn");
    };
    let Turn::ToolResult(after) = &second[4] else {
        panic!("expected a tool result turn");
    };
    assert_eq!(first.call_id, "c1");
    assert_eq!(after.call_id, "c2");
}

#[tokio::test]
async fn duplicate_call_id_invokes_once() {
    let h = harness(
        vec![
            generation(
                None,
                vec![
                    ToolCall::new("c1", "node_status", json!({"node": "n1"})),
                    ToolCall::new("c1", "node_status", json!({"node": "n2"})),
                ],
            ),
            generation(Some("done"), vec![]),
        ],
        vec![remote_tool("node_status")],
        HashMap::new(),
        10,
    );

    h.orchestrator
        .run("sys", "compare n1 n2", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(h.transport.invocations().len(), 1);

    let contexts = h.client.contexts.lock().unwrap();
    let Turn::ToolResult(dup) = &contexts[1][4] else {
        panic!("expected a tool result turn");
    };
    assert_eq!(dup.error_kind(), Some(ToolErrorKind::DuplicateCallId));
}

#[tokio::test]
async fn failed_invocation_is_fed_back() {
    let mut behaviors = HashMap::new();
    behaviors.insert(
        "node_status".to_string(),
        ToolBehavior {
            latency: Duration::ZERO,
            fail: true,
        },
    );

    let h = harness(
        vec![
            generation(None, vec![ToolCall::new("c1", "node_status", json!({}))]),
            generation(Some("the status tool is down"), vec![]),
        ],
        vec![remote_tool("node_status")],
        behaviors,
        10,
    );

    let outcome = h
        .orchestrator
        .run("sys", "check n1", CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_completed());
    let contexts = h.client.contexts.lock().unwrap();
    let Turn::ToolResult(record) = &contexts[1][3] else {
        panic!("expected a tool result turn");
    };
    assert_eq!(record.error_kind(), Some(ToolErrorKind::InvocationFailed));
}

#[tokio::test]
async fn textless_call_free_turn_is_a_backend_error() {
    let h = harness(
        vec![generation(None, vec![])],
        vec![remote_tool("node_status")],
        HashMap::new(),
        10,
    );

    let err = h
        .orchestrator
        .run("sys", "check n1", CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
}

#[tokio::test]
async fn pre_cancelled_token_aborts_before_any_call() {
    let h = harness(
        vec![generation(Some("never seen"), vec![])],
        vec![remote_tool("node_status")],
        HashMap::new(),
        10,
    );

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h.orchestrator.run("sys", "check n1", cancel).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(h.client.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_run_during_slow_tools() {
    let mut behaviors = HashMap::new();
    behaviors.insert(
        "node_status".to_string(),
        ToolBehavior {
            latency: Duration::from_secs(20),
            fail: false,
        },
    );

    let h = harness(
        vec![
            generation(None, vec![ToolCall::new("c1", "node_status", json!({}))]),
            generation(Some("never reached"), vec![]),
        ],
        vec![remote_tool("node_status")],
        behaviors,
        10,
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = h
        .orchestrator
        .run("sys", "check n1", cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    // The tool was in flight when the cancel landed, and no second
    // generation call was ever made.
    assert_eq!(h.transport.invocations().len(), 1);
    assert_eq!(h.client.calls(), 1);
}

#[tokio::test]
async fn cancellation_is_observed_during_discovery() {
    let mut config = Config::default();
    config.registry.providers = vec!["http://127.0.0.1:1".to_string()];
    let assistant = Assistant::with_config(config).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = assistant
        .submit_with_cancel("check n1", cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn run_deadline_cuts_off_a_hanging_backend() {
    let snapshot = Arc::new(ToolSnapshot::from_tools(vec![remote_tool("node_status")]));
    let transport = Arc::new(TableTransport::new(HashMap::new()));
    let dispatcher = Dispatcher::new(snapshot, transport, Duration::from_secs(30));
    let orchestrator = Orchestrator::new(
        Arc::new(HangingClient),
        dispatcher,
        10,
        Duration::from_secs(5),
    );

    let err = orchestrator
        .run("sys", "check n1", CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
}

#[tokio::test]
async fn context_always_starts_with_the_system_turn() {
    let h = harness(
        vec![
            generation(None, vec![ToolCall::new("c1", "node_status", json!({}))]),
            generation(Some("done"), vec![]),
        ],
        vec![remote_tool("node_status")],
        HashMap::new(),
        10,
    );

    h.orchestrator
        .run("you are driftwatch", "check n1", CancellationToken::new())
        .await
        .unwrap();

    let contexts = h.client.contexts.lock().unwrap();
    for context in contexts.iter() {
        let Turn::System { text } = &context[0] else {
            panic!("first turn must be the system prompt");
        };
        assert_eq!(text, "you are driftwatch");
        assert!(matches!(context[1], Turn::User { .. }));
        // Exactly one system turn per run.
        let systems = context
            .iter()
            .filter(|t| matches!(t, Turn::System { .. }))
            .count();
        assert_eq!(systems, 1);
    }
}
