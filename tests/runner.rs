//! Tests for the run lifecycle, the catalog and model sessions.
mod common;
use common::*;
use model_runner::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_test::block_on;

fn runner_with(gateway: MockGateway) -> (Arc<MockGateway>, ModelRunner) {
    let gateway = Arc::new(gateway);
    let runner = ModelRunner::new(gateway.clone(), "price.series");
    (gateway, runner)
}

#[test]
fn test_run_config_defaults_and_request() {
    let config = RunConfig::default();
    assert_eq!(config.chain_id, 1);
    assert_eq!(config.block_number, BlockNumber::Latest);
    assert_eq!(config.version, ModelVersion::Latest);

    let request = config.request("price.series", json!({ "address": "0x01" }));
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "slug": "price.series",
            "chainId": 1,
            "blockNumber": "latest",
            "input": { "address": "0x01" }
        })
    );

    let pinned = RunConfig {
        chain_id: 0,
        block_number: BlockNumber::Number(15000000),
        version: "1.2".parse().unwrap(),
    };
    let value = serde_json::to_value(pinned.request("price.series", json!({}))).unwrap();
    assert_eq!(value["chainId"], json!(1));
    assert_eq!(value["blockNumber"], json!(15000000));
    assert_eq!(value["version"], json!("1.2"));

    let genesis = RunConfig {
        block_number: BlockNumber::Number(0),
        ..RunConfig::default()
    };
    let value = serde_json::to_value(genesis.request("price.series", json!({}))).unwrap();
    assert_eq!(value["blockNumber"], json!("latest"));
}

#[test]
fn test_successful_run() {
    let (gateway, runner) =
        runner_with(MockGateway::new(vec![]).then(Scripted::Respond(success(price_result()))));
    runner.set_config(RunConfig {
        chain_id: 137,
        ..RunConfig::default()
    });

    let outcome = block_on(runner.run(json!({ "address": "0x01" }))).unwrap();
    assert_eq!(outcome, RunOutcome::Success(price_result()));
    assert_eq!(runner.outcome(), Some(outcome));
    assert!(runner.take_notices().is_empty());

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].slug, "price.series");
    assert_eq!(requests[0].chain_id, 137);
    assert_eq!(requests[0].input, json!({ "address": "0x01" }));
}

#[test]
fn test_model_error_becomes_a_failure_with_a_notice() {
    let (_, runner) =
        runner_with(MockGateway::new(vec![]).then(Scripted::Respond(failure(sample_run_error()))));

    let outcome = block_on(runner.run(json!({}))).unwrap();
    assert_eq!(outcome, RunOutcome::Failure(sample_run_error()));

    let notices = runner.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Error while running model");
    assert_eq!(notices[0].duration, Duration::from_secs(10));
    assert!(runner.take_notices().is_empty());
}

#[test]
fn test_transport_error_leaves_no_outcome() {
    let (_, runner) = runner_with(
        MockGateway::new(vec![])
            .then(Scripted::Respond(success(json!({ "value": 1 }))))
            .then(Scripted::Fail(502)),
    );

    block_on(runner.run(json!({}))).unwrap();
    assert!(runner.outcome().is_some());

    let err = block_on(runner.run(json!({}))).unwrap_err();
    assert!(matches!(
        err,
        RunnerError::Gateway(GatewayError::Status { status: 502, .. })
    ));
    // Starting a run clears the previous outcome.
    assert_eq!(runner.outcome(), None);
    assert_eq!(runner.take_notices().len(), 1);
}

#[test]
fn test_stale_response_is_discarded() {
    let gate = Arc::new(Notify::new());
    let (_, runner) = runner_with(
        MockGateway::new(vec![])
            .then(Scripted::Hold(success(json!({ "run": "first" })), gate.clone()))
            .then(Scripted::Release(success(json!({ "run": "second" })), gate)),
    );

    let (first, second) = block_on(async {
        tokio::join!(runner.run(json!({ "n": 1 })), runner.run(json!({ "n": 2 })))
    });

    assert!(matches!(
        first,
        Err(RunnerError::Superseded {
            generation: 1,
            current: 2
        })
    ));
    assert_eq!(second.unwrap(), RunOutcome::Success(json!({ "run": "second" })));
    assert_eq!(runner.outcome(), Some(RunOutcome::Success(json!({ "run": "second" }))));
}

#[test]
fn test_reset_restores_defaults() {
    let (_, mut runner) =
        runner_with(MockGateway::new(vec![]).then(Scripted::Respond(success(json!({})))));
    runner.set_config(RunConfig {
        chain_id: 10,
        block_number: BlockNumber::Number(5),
        version: ModelVersion::Pinned("2.0".to_string()),
    });
    block_on(runner.run(json!({}))).unwrap();

    runner.reset("example.echo");
    assert_eq!(runner.slug(), "example.echo");
    assert_eq!(runner.config(), RunConfig::default());
    assert_eq!(runner.outcome(), None);
}

#[test]
fn test_catalog_fetch_and_search() {
    let gateway = MockGateway::new(vec![price_model(), echo_model()]);
    let catalog = block_on(Catalog::fetch(&gateway)).unwrap();
    assert_eq!(catalog.models().len(), 2);

    let found: Vec<_> = catalog.search(" historical ").iter().map(|m| m.slug.clone()).collect();
    assert_eq!(found, vec!["price.series"]);
    assert_eq!(catalog.search("").len(), 2);
    assert_eq!(catalog.find("example.echo").map(|m| m.label()), Some("example.echo"));
}

#[test]
fn test_catalog_failures_read_as_not_found() {
    let err = block_on(Catalog::fetch(&MockGateway::unavailable())).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound));

    let err = block_on(Catalog::fetch(&MockGateway::new(vec![]))).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound));
}

#[test]
fn test_selection_resolves_against_the_catalog() {
    let catalog = Catalog::new(vec![price_model(), echo_model()]).unwrap();

    let selection = Selection::from_query("?slug=price.series");
    assert_eq!(selection.resolve(&catalog).map(|m| m.slug.as_str()), Some("price.series"));
    assert_eq!(selection.to_query(), "/?slug=price.series");

    assert_eq!(Selection::from_query("slug=unknown").resolve(&catalog), None);
    assert_eq!(Selection::from_query("other=1").slug, None);
    assert_eq!(Selection::from_query("slug=").slug, None);
    assert_eq!(Selection::default().to_query(), "/");
}

#[test]
fn test_session_submit_rejects_invalid_forms() {
    let gateway = Arc::new(MockGateway::new(vec![]));
    let mut session =
        ModelSession::new(price_model(), gateway.clone(), TransformEvaluator::default()).unwrap();

    let submission = block_on(session.submit()).unwrap();
    let Submission::Invalid(errors) = submission else {
        panic!("expected the form to be rejected");
    };
    assert_eq!(errors.get("address").as_deref(), Some("Required."));
    assert!(gateway.requests().is_empty());
    assert!(session.chart().is_none());
}

#[test]
fn test_session_submit_prepares_the_chart() {
    let gateway = Arc::new(MockGateway::new(vec![]).then(Scripted::Respond(success(price_result()))));
    let mut session =
        ModelSession::new(price_model(), gateway.clone(), TransformEvaluator::default()).unwrap();
    session.form_mut().set_value("address", json!("0x01"));
    session.form_mut().edit_array("tokens", ArrayAction::Push).unwrap();
    session.form_mut().set_value("tokens[0].symbol", json!("AAA"));

    let submission = block_on(session.submit()).unwrap();
    assert_eq!(submission, Submission::Completed(RunOutcome::Success(price_result())));
    assert_eq!(
        gateway.requests()[0].input,
        json!({ "address": "0x01", "window": 7, "tokens": [{ "symbol": "AAA", "weight": 1 }] })
    );

    let chart = session.chart_mut().expect("a successful run prepares the chart");
    assert!(chart.has_chart_tab());
    chart.select_key("price");
    let line = session.chart_line().unwrap().unwrap();
    assert_eq!(line.name, "Price Series");
    assert_eq!(line.points.len(), 2);
    assert_eq!(session.error_panel(), None);
}

#[test]
fn test_session_failure_shows_the_error_panel() {
    let gateway =
        Arc::new(MockGateway::new(vec![]).then(Scripted::Respond(failure(sample_run_error()))));
    let mut session = ModelSession::new(echo_model(), gateway, TransformEvaluator::default()).unwrap();

    let submission = block_on(session.submit()).unwrap();
    assert!(matches!(submission, Submission::Completed(RunOutcome::Failure(_))));
    assert!(session.chart().is_none());
    assert!(session.chart_line().is_none());

    let panel = session.error_panel().unwrap();
    assert!(panel.starts_with("Error while running model\nmessage: Pool not found"));
}

#[test]
fn test_session_select_starts_over() {
    let gateway = Arc::new(MockGateway::new(vec![]).then(Scripted::Respond(success(json!({})))));
    let mut session = ModelSession::new(echo_model(), gateway, TransformEvaluator::default()).unwrap();
    session.runner().set_config(RunConfig {
        chain_id: 5,
        ..RunConfig::default()
    });
    block_on(session.submit()).unwrap();
    assert!(session.runner().outcome().is_some());

    session.select(price_model()).unwrap();
    assert_eq!(session.model().slug, "price.series");
    assert_eq!(session.runner().slug(), "price.series");
    assert_eq!(session.runner().config(), RunConfig::default());
    assert_eq!(session.runner().outcome(), None);
    assert_eq!(session.form().value("window"), Some(&json!(7)));
    assert!(session.chart().is_none());
}
