//! Integration tests for the GitHub client using wiremock
//!
//! These tests pin down the wire contract: verbs, paths, headers, success
//! statuses, and how every other outcome is classified.

use std::time::Duration;

use hemmer_provider_github::client::{ACCEPT_MEDIA_TYPE, API_VERSION, API_VERSION_HEADER};
use hemmer_provider_github::{
    ClientError, CreateRepository, GitHubClient, ProviderConfig, TransportError, UpdateRepository,
};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{bearer_token, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GitHubClient {
    GitHubClient::new(ProviderConfig::new("test-token").with_base_url(server.uri())).unwrap()
}

fn repo_body(description: Option<&str>, private: bool, has_issues: bool, has_wiki: bool) -> Value {
    json!({
        "id": 1,
        "node_id": "R_kgDOAAAAAQ",
        "name": "demo",
        "full_name": "alice/demo",
        "description": description,
        "private": private,
        "has_issues": has_issues,
        "has_wiki": has_wiki,
        "owner": {"login": "alice", "id": 7, "type": "User"}
    })
}

mod get {
    use super::*;

    #[tokio::test]
    async fn test_get_success_sends_auth_and_version_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/alice/demo"))
            .and(bearer_token("test-token"))
            .and(header("accept", ACCEPT_MEDIA_TYPE))
            .and(header(API_VERSION_HEADER, API_VERSION))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(repo_body(Some("x"), false, true, true)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let repo = assert_ok!(
            client_for(&server)
                .get(&CancellationToken::new(), "alice", "demo")
                .await
        );
        assert_eq!(repo.id, 1);
        assert_eq!(repo.full_name, "alice/demo");
        assert_eq!(repo.description.as_deref(), Some("x"));

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("content-type"));
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_get_404_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/alice/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest/repos/repos#get-a-repository"
            })))
            .mount(&server)
            .await;

        let err = assert_err!(
            client_for(&server)
                .get(&CancellationToken::new(), "alice", "missing")
                .await
        );
        assert!(matches!(err, ClientError::NotFound));
    }

    #[tokio::test]
    async fn test_get_other_status_is_remote_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/alice/demo"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "Resource not accessible by personal access token"
            })))
            .mount(&server)
            .await;

        let err = assert_err!(
            client_for(&server)
                .get(&CancellationToken::new(), "alice", "demo")
                .await
        );
        match err {
            ClientError::Remote { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(
                    message.as_deref(),
                    Some("Resource not accessible by personal access token")
                );
            },
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/alice/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "not-a-number"})))
            .mount(&server)
            .await;

        let err = assert_err!(
            client_for(&server)
                .get(&CancellationToken::new(), "alice", "demo")
                .await
        );
        assert!(matches!(err, ClientError::Decode(_)));
    }
}

mod create {
    use super::*;

    #[tokio::test]
    async fn test_create_posts_directive_and_decodes_201() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/repos"))
            .and(bearer_token("test-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "name": "demo",
                "private": false,
                "has_issues": true,
                "has_wiki": true,
                "auto_init": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 1,
                "name": "demo",
                "full_name": "alice/demo",
                "owner": {"login": "alice"},
                "private": false,
                "has_issues": true,
                "has_wiki": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let directive = CreateRepository {
            name: "demo".to_string(),
            description: None,
            private: false,
            has_issues: true,
            has_wiki: true,
            auto_init: true,
        };
        let repo = assert_ok!(
            client_for(&server)
                .create(&CancellationToken::new(), &directive)
                .await
        );
        assert_eq!(repo.full_name, repo.derived_full_name());
        assert_eq!(repo.owner.login, "alice");
    }

    #[tokio::test]
    async fn test_create_200_is_not_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/repos"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(repo_body(None, false, true, true)),
            )
            .mount(&server)
            .await;

        let directive = CreateRepository {
            name: "demo".to_string(),
            description: Some("x".to_string()),
            private: false,
            has_issues: true,
            has_wiki: true,
            auto_init: false,
        };
        let err = assert_err!(
            client_for(&server)
                .create(&CancellationToken::new(), &directive)
                .await
        );
        assert_eq!(err.status(), Some(200));
    }

    #[tokio::test]
    async fn test_create_name_taken_is_remote_422() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/repos"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Repository creation failed.",
                "errors": [{"resource": "Repository", "code": "custom", "field": "name",
                            "message": "name already exists on this account"}]
            })))
            .mount(&server)
            .await;

        let directive = CreateRepository {
            name: "demo".to_string(),
            description: None,
            private: true,
            has_issues: false,
            has_wiki: false,
            auto_init: false,
        };
        let err = assert_err!(
            client_for(&server)
                .create(&CancellationToken::new(), &directive)
                .await
        );
        assert!(matches!(err, ClientError::Remote { status: 422, .. }));
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn test_update_round_trip_preserves_settings() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/repos/alice/demo"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "description": "x",
                "private": true,
                "has_issues": false,
                "has_wiki": true
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(repo_body(Some("x"), true, false, true)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let directive = UpdateRepository {
            description: "x".to_string(),
            private: true,
            has_issues: false,
            has_wiki: true,
        };
        let repo = assert_ok!(
            client_for(&server)
                .update(&CancellationToken::new(), "alice", "demo", &directive)
                .await
        );
        assert_eq!(repo.description.as_deref(), Some("x"));
        assert!(repo.private);
        assert!(!repo.has_issues);
        assert!(repo.has_wiki);
    }

    #[tokio::test]
    async fn test_update_failure_is_remote_error() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/repos/alice/demo"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let directive = UpdateRepository {
            description: String::new(),
            private: false,
            has_issues: true,
            has_wiki: true,
        };
        let err = assert_err!(
            client_for(&server)
                .update(&CancellationToken::new(), "alice", "demo", &directive)
                .await
        );
        assert!(matches!(err, ClientError::Remote { status: 404, message: None }));
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn test_delete_204_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/repos/alice/demo"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        assert_ok!(
            client_for(&server)
                .delete(&CancellationToken::new(), "alice", "demo")
                .await
        );
    }

    #[tokio::test]
    async fn test_delete_404_is_remote_error_not_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/repos/alice/demo"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let err = assert_err!(
            client_for(&server)
                .delete(&CancellationToken::new(), "alice", "demo")
                .await
        );
        assert!(matches!(err, ClientError::Remote { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_get_after_delete_observes_absence() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/repos/alice/demo"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/demo"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ctx = CancellationToken::new();
        assert_ok!(client.delete(&ctx, "alice", "demo").await);
        let err = assert_err!(client.get(&ctx, "alice", "demo").await);
        assert!(matches!(err, ClientError::NotFound));
    }
}

mod transport {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_context_performs_no_io() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ctx = CancellationToken::new();
        ctx.cancel();

        let err = assert_err!(client.get(&ctx, "alice", "demo").await);
        assert!(matches!(err, ClientError::Transport(TransportError::Cancelled)));
        let err = assert_err!(client.delete(&ctx, "alice", "demo").await);
        assert!(matches!(err, ClientError::Transport(TransportError::Cancelled)));

        let create = CreateRepository {
            name: "demo".to_string(),
            description: None,
            private: false,
            has_issues: true,
            has_wiki: true,
            auto_init: false,
        };
        let err = assert_err!(client.create(&ctx, &create).await);
        assert!(matches!(err, ClientError::Transport(TransportError::Cancelled)));

        let update = UpdateRepository {
            description: "hi".to_string(),
            private: true,
            has_issues: true,
            has_wiki: true,
        };
        let err = assert_err!(client.update(&ctx, "alice", "demo", &update).await);
        assert!(matches!(err, ClientError::Transport(TransportError::Cancelled)));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/alice/demo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(repo_body(None, false, true, true))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let err = assert_err!(client.get(&ctx, "alice", "demo").await);
        assert!(matches!(err, ClientError::Transport(TransportError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/alice/demo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(repo_body(None, false, true, true))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = ProviderConfig::new("test-token")
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(200));
        let client = GitHubClient::new(config).unwrap();

        let err = assert_err!(client.get(&CancellationToken::new(), "alice", "demo").await);
        assert!(matches!(err, ClientError::Transport(TransportError::TimedOut(_))));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Reserve a port, then release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = GitHubClient::new(ProviderConfig::new("test-token").with_base_url(uri)).unwrap();
        let err = assert_err!(client.get(&CancellationToken::new(), "alice", "demo").await);
        assert!(err.is_transport());
        assert_eq!(err.status(), None);
    }
}

mod redirects {
    use super::*;

    #[tokio::test]
    async fn test_get_moved_permanently_is_not_followed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/alice/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/repos/alice/new", server.uri())),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repo_body(None, false, true, true)))
            .expect(0)
            .mount(&server)
            .await;

        let err = assert_err!(
            client_for(&server)
                .get(&CancellationToken::new(), "alice", "old")
                .await
        );
        assert!(matches!(err, ClientError::Remote { status: 301, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_temporary_redirect_is_not_followed() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/repos/alice/demo"))
            .respond_with(
                ResponseTemplate::new(307)
                    .insert_header("location", format!("{}/repositories/42", server.uri())),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repositories/42"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let err = assert_err!(
            client_for(&server)
                .delete(&CancellationToken::new(), "alice", "demo")
                .await
        );
        assert!(matches!(err, ClientError::Remote { status: 307, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
