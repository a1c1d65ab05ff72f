//! End-to-end tests of the capability invocation surface.

use std::sync::Arc;

use atelier_capabilities::{FnCapability, ParameterSchema, PropertySchema};
use atelier_integration_tests::test_runtime;
use atelier_runtime::InvokeRequest;
use serde_json::json;

fn request(name: &str, arguments: serde_json::Value) -> InvokeRequest {
    InvokeRequest {
        name: name.into(),
        arguments,
    }
}

#[tokio::test]
async fn shell_sessions_are_isolated_through_the_surface() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _engine) = test_runtime(dir.path()).await;

    // s1 writes a file via the shell.
    let result = runtime
        .invoke(request(
            "execute_shell",
            json!({"command": "echo s1-data > marker.txt", "session_id": "s1"}),
        ))
        .await;
    assert_eq!(result["success"], json!(true));

    // s1 sees it.
    let result = runtime
        .invoke(request(
            "execute_shell",
            json!({"command": "cat marker.txt", "session_id": "s1"}),
        ))
        .await;
    assert_eq!(result["success"], json!(true));
    assert!(result["stdout"].as_str().unwrap().contains("s1-data"));

    // s2 does not.
    let result = runtime
        .invoke(request(
            "execute_shell",
            json!({"command": "cat marker.txt", "session_id": "s2"}),
        ))
        .await;
    assert_eq!(result["success"], json!(true));
    assert_ne!(result["exit_code"], json!(0));
    assert!(!result["stdout"].as_str().unwrap().contains("s1-data"));
}

#[tokio::test]
async fn shell_nonzero_exit_is_success_with_captured_output() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _engine) = test_runtime(dir.path()).await;

    let result = runtime
        .invoke(request(
            "execute_shell",
            json!({"command": "echo warn >&2; exit 3", "session_id": "s1"}),
        ))
        .await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["exit_code"], json!(3));
    assert!(result["stderr"].as_str().unwrap().contains("warn"));
}

#[tokio::test]
async fn file_round_trip_and_escape_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _engine) = test_runtime(dir.path()).await;

    let result = runtime
        .invoke(request(
            "write_file",
            json!({"session_id": "s1", "path": "src/main.rs", "content": "fn main() {}"}),
        ))
        .await;
    assert_eq!(result["success"], json!(true));

    let result = runtime
        .invoke(request(
            "read_file",
            json!({"session_id": "s1", "path": "src/main.rs"}),
        ))
        .await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["content"], "fn main() {}");

    let result = runtime
        .invoke(request(
            "read_file",
            json!({"session_id": "s2", "path": "../s1/src/main.rs"}),
        ))
        .await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["error"], "path_escape");

    let result = runtime
        .invoke(request(
            "list_files",
            json!({"session_id": "s1", "directory": "src"}),
        ))
        .await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["entries"][0]["name"], "main.rs");
}

#[tokio::test]
async fn missing_required_argument_never_reaches_the_handler() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _engine) = test_runtime(dir.path()).await;

    let result = runtime
        .invoke(request("execute_shell", json!({"session_id": "s1"})))
        .await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["error"], "invalid_arguments");
    assert!(result["message"].as_str().unwrap().contains("command"));

    // Nothing ran, so the session was never created either.
    assert!(runtime.sandbox().sessions().await.is_empty());
}

#[tokio::test]
async fn dynamic_capability_registers_and_invokes_without_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _engine) = test_runtime(dir.path()).await;

    // Unknown before registration.
    let result = runtime.invoke(request("wrap_foo", json!({}))).await;
    assert_eq!(result["error"], "unknown_capability");

    // Mint a wrapper capability at runtime, e.g. around a freshly installed
    // package, and register it through the normal path.
    let wrapper = FnCapability::new(
        "wrap_foo",
        "Calls the foo package",
        ParameterSchema::new()
            .property("input", PropertySchema::string("Input passed to foo"))
            .required("input"),
        |args| async move {
            let input = args["input"].as_str().unwrap_or_default();
            Ok(json!({"output": format!("foo({input})")}))
        },
    );
    runtime.register_dynamic(Arc::new(wrapper)).await.unwrap();

    let result = runtime
        .invoke(request("wrap_foo", json!({"input": "bar"})))
        .await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["output"], "foo(bar)");

    // Same uniqueness invariant as the built-ins.
    let duplicate = FnCapability::new("wrap_foo", "dup", ParameterSchema::new(), |_| async {
        Ok(json!({}))
    });
    assert!(runtime.register_dynamic(Arc::new(duplicate)).await.is_err());
}

#[tokio::test]
async fn invocations_are_audited() {
    use atelier_browser::mock::MockEngine;
    use atelier_browser::{BrowserEngine, BrowserLimits, BrowserSessionManager};
    use atelier_capabilities::InvocationAudit;
    use atelier_jobs::JobQueue;
    use atelier_runtime::ActionRuntime;
    use atelier_sandbox::SandboxManager;
    use atelier_storage::{DocumentStore, MemoryDocumentStore};

    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let audit = Arc::new(InvocationAudit::new(Arc::clone(&store), "invocations").unwrap());

    let runtime = ActionRuntime::with_parts(
        Arc::new(SandboxManager::new(dir.path())),
        Arc::new(BrowserSessionManager::new(
            Arc::new(MockEngine::new()) as Arc<dyn BrowserEngine>,
            BrowserLimits::default(),
        )),
        Arc::new(JobQueue::new(store, "jobs").unwrap()),
        Some(Arc::clone(&audit)),
    )
    .await
    .unwrap();

    runtime
        .invoke(request(
            "execute_shell",
            json!({"command": "true", "session_id": "s1"}),
        ))
        .await;
    runtime
        .invoke(request("no_such_capability", json!({})))
        .await;

    let records = audit.all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|r| r.capability == "execute_shell" && r.success));
    assert!(
        records
            .iter()
            .any(|r| r.capability == "no_such_capability"
                && !r.success
                && r.error.as_deref() == Some("unknown_capability"))
    );
}
