//! Async-job polling against a mock server.

use httpmock::prelude::*;
use mlplatform_sdk::prelude::*;
use serde_json::json;
use std::time::Duration;

fn client_for(server: &MockServer, max_wait: Duration) -> PlatformClient {
    PlatformClient::builder()
        .config(ClientConfig::new(&server.base_url(), "test-token"))
        .poll_config(PollConfig::new(Duration::from_millis(10), max_wait))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_see_other_resolves_to_location() {
    let server = MockServer::start();
    let resource = server.url("/projects/p1/models/m1/");

    let status = server.mock(|when, then| {
        when.method(GET).path("/status/job-1/");
        then.status(303).header("Location", resource.as_str());
    });
    let target = server.mock(|when, then| {
        when.method(GET).path("/projects/p1/models/m1/");
        then.status(200).json_body(json!({"id": "m1"}));
    });

    let client = client_for(&server, Duration::from_secs(2));
    let resolution = client.wait_for_async_resolution("status/job-1/").await.unwrap();

    assert_eq!(resolution, AsyncResolution::Redirect(resource.clone()));
    status.assert_hits(1);
    // The redirect is reported, not followed.
    target.assert_hits(0);
}

#[tokio::test]
async fn test_completed_status_returns_body() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/status/job-2/");
        then.status(200)
            .json_body(json!({"status": "COMPLETED", "message": "", "id": "job-2"}));
    });

    let client = client_for(&server, Duration::from_secs(2));
    let resolution = client.wait_for_async_resolution("status/job-2/").await.unwrap();

    match resolution {
        AsyncResolution::Completed(body) => assert_eq!(body["id"], "job-2"),
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_fails_with_message() {
    let server = MockServer::start();

    let status = server.mock(|when, then| {
        when.method(GET).path("/status/job-3/");
        then.status(200)
            .json_body(json!({"status": "ERROR", "message": "not enough rows"}));
    });

    let client = client_for(&server, Duration::from_secs(2));
    let err = client.wait_for_async_resolution("status/job-3/").await.unwrap_err();

    match err {
        SdkError::AsyncProcessUnsuccessful { status, message } => {
            assert_eq!(status, "ERROR");
            assert_eq!(message, "not enough rows");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    status.assert_hits(1);
}

#[tokio::test]
async fn test_running_job_times_out() {
    let server = MockServer::start();

    let status = server.mock(|when, then| {
        when.method(GET).path("/status/job-4/");
        then.status(200).json_body(json!({"status": "RUNNING"}));
    });

    let client = client_for(&server, Duration::from_millis(100));
    let err = client.wait_for_async_resolution("status/job-4/").await.unwrap_err();

    match err {
        SdkError::AsyncTimeout { location, .. } => assert_eq!(location, "status/job-4/"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(status.hits() >= 2);
}

#[tokio::test]
async fn test_submit_and_wait_follows_accepted_location() {
    let server = MockServer::start();
    let status_url = server.url("/status/job-5/");
    let resource = server.url("/projects/p1/");

    let submit = server.mock(|when, then| {
        when.method(POST)
            .path("/projects/")
            .header("authorization", "Bearer test-token")
            .json_body(json!({"projectName": "churn"}));
        then.status(202).header("Location", status_url.as_str());
    });
    let status = server.mock(|when, then| {
        when.method(GET).path("/status/job-5/");
        then.status(303).header("Location", resource.as_str());
    });

    let client = client_for(&server, Duration::from_secs(2));
    let resolution = client
        .submit_and_wait("projects/", &json!({"projectName": "churn"}))
        .await
        .unwrap();

    assert_eq!(resolution.location(), Some(resource.as_str()));
    submit.assert_hits(1);
    status.assert_hits(1);
}

#[tokio::test]
async fn test_submit_without_location_is_unexpected() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/projects/");
        then.status(202);
    });

    let client = client_for(&server, Duration::from_secs(2));
    let err = client
        .submit_and_wait("projects/", &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, SdkError::Http(HttpError::UnexpectedResponse(_))));
}
