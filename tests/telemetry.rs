mod common;
use common::*;

use std::sync::Arc;

use dagwire::telemetry::{init_diagnostics, init_tracing};
use dagwire::types::RunStatus;

#[test]
fn init_is_idempotent() {
    // Later installs lose the race for the global default and are no-ops.
    init_tracing();
    init_tracing();
    init_diagnostics();
}

#[tokio::test]
async fn instrumented_run_works_under_the_subscriber() {
    init_tracing();
    let runner = runner_with(chain_graph(&["a", "b"]), Arc::new(EchoAction));
    let outcome = runner.run_node("b").await.unwrap();
    assert_eq!(outcome.status, RunStatus::Success);
}
