//! Integration tests for the OpenStack client and report assembly, using
//! wiremock to stand in for Keystone, Octavia, Nova, and Glance.

use openstack_lb_info::config::{AuthConfig, CloudConfig};
use openstack_lb_info::openstack::client::{OsClient, ServiceEndpoints};
use openstack_lb_info::resource::{query_load_balancers, LbFilters, ReportBuilder, ReportOptions};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

/// Client pointing every service at the mock server, with a fixed token.
fn client_for(server: &MockServer) -> OsClient {
    OsClient::with_endpoints(
        ServiceEndpoints {
            load_balancer: server.uri(),
            compute: format!("{}/v2.1", server.uri()),
            image: server.uri(),
        },
        TOKEN,
    )
    .expect("client construction")
}

fn builder_for(server: &MockServer, options: ReportOptions) -> ReportBuilder {
    ReportBuilder::new(client_for(server), options)
}

fn default_options() -> ReportOptions {
    ReportOptions {
        details: false,
        no_members: false,
        max_workers: 4,
    }
}

fn lb_value(id: &str, name: &str, listener_ids: &[&str]) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "vip_address": "10.0.0.5",
        "provisioning_status": "ACTIVE",
        "operating_status": "ONLINE",
        "tags": ["prod"],
        "listeners": listener_ids.iter().map(|l| json!({"id": l})).collect::<Vec<_>>(),
    })
}

mod keystone {
    use super::*;

    #[tokio::test]
    async fn connect_resolves_catalog_endpoints_and_token() {
        let server = MockServer::start().await;
        let expires = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();

        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Subject-Token", TOKEN)
                    .set_body_json(json!({
                        "token": {
                            "expires_at": expires,
                            "catalog": [
                                {
                                    "type": "load-balancer",
                                    "name": "octavia",
                                    "endpoints": [
                                        {"interface": "public", "region": "RegionOne", "url": server.uri()}
                                    ]
                                },
                                {
                                    "type": "compute",
                                    "name": "nova",
                                    "endpoints": [
                                        {"interface": "public", "region": "RegionOne", "url": format!("{}/v2.1", server.uri())}
                                    ]
                                },
                                {
                                    "type": "image",
                                    "name": "glance",
                                    "endpoints": [
                                        {"interface": "public", "region": "RegionOne", "url": server.uri()}
                                    ]
                                }
                            ]
                        }
                    })),
            )
            .mount(&server)
            .await;

        // The issued token must be sent to the service endpoints
        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/loadbalancers"))
            .and(header("X-Auth-Token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "loadbalancers": [lb_value("lb-1", "web", &[])],
            })))
            .mount(&server)
            .await;

        let config = CloudConfig {
            auth: AuthConfig {
                auth_url: server.uri(),
                username: "demo".to_string(),
                password: "secret".to_string(),
                project_name: "demo".to_string(),
                user_domain_name: "Default".to_string(),
                project_domain_name: "Default".to_string(),
            },
            region_name: Some("RegionOne".to_string()),
            interface: "public".to_string(),
        };

        let client = OsClient::connect(config).await.expect("connect");
        assert_eq!(client.endpoints.load_balancer, server.uri());

        let lbs = client.list_load_balancers(&[]).await.expect("list");
        assert_eq!(lbs.len(), 1);
        assert_eq!(lbs[0]["id"], "lb-1");
    }

    #[tokio::test]
    async fn bad_credentials_are_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": 401, "message": "The request you have made requires authentication."}
            })))
            .mount(&server)
            .await;

        let config = CloudConfig {
            auth: AuthConfig {
                auth_url: server.uri(),
                username: "demo".to_string(),
                password: "wrong".to_string(),
                project_name: "demo".to_string(),
                user_domain_name: "Default".to_string(),
                project_domain_name: "Default".to_string(),
            },
            region_name: None,
            interface: "public".to_string(),
        };

        let err = OsClient::connect(config).await.unwrap_err();
        assert!(format!("{err:#}").contains("401"));
    }
}

mod load_balancer_listing {
    use super::*;

    #[tokio::test]
    async fn follows_pagination_links() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/loadbalancers"))
            .and(query_param("marker", "lb-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "loadbalancers": [lb_value("lb-2", "web-2", &[])],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/loadbalancers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "loadbalancers": [lb_value("lb-1", "web-1", &[])],
                "loadbalancers_links": [
                    {"rel": "next", "href": format!("{}/v2.0/lbaas/loadbalancers?marker=lb-1", server.uri())}
                ],
            })))
            .mount(&server)
            .await;

        let lbs = query_load_balancers(&client_for(&server), &LbFilters::default())
            .await
            .expect("query");

        assert_eq!(lbs.len(), 2);
        assert_eq!(lbs[0].item.id, "lb-1");
        assert_eq!(lbs[1].item.id, "lb-2");
    }

    #[tokio::test]
    async fn forwards_filter_criteria_as_query_params() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/loadbalancers"))
            .and(query_param("vip_address", "10.0.0.5"))
            .and(query_param("tags", "prod"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "loadbalancers": [lb_value("lb-1", "web", &[])],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let filters = LbFilters {
            vip_address: Some("10.0.0.5".to_string()),
            tags: Some("prod".to_string()),
            ..Default::default()
        };

        let lbs = query_load_balancers(&client_for(&server), &filters)
            .await
            .expect("query");
        assert_eq!(lbs.len(), 1);
    }

    #[tokio::test]
    async fn name_filter_is_applied_client_side() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/loadbalancers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "loadbalancers": [
                    lb_value("lb-1", "frontend-web", &[]),
                    lb_value("lb-2", "database", &[]),
                ],
            })))
            .mount(&server)
            .await;

        let filters = LbFilters {
            name: Some("web".to_string()),
            ..Default::default()
        };

        let lbs = query_load_balancers(&client_for(&server), &filters)
            .await
            .expect("query");
        assert_eq!(lbs.len(), 1);
        assert_eq!(lbs[0].item.id, "lb-1");
    }

    #[tokio::test]
    async fn server_error_is_propagated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/loadbalancers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = query_load_balancers(&client_for(&server), &LbFilters::default()).await;
        assert!(result.unwrap_err().to_string().contains("500"));
    }
}

mod lb_report {
    use super::*;
    use openstack_lb_info::resource::Raw;

    async fn mount_graph(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/listeners/ls-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "listener": {
                    "id": "ls-1",
                    "name": "http",
                    "protocol": "HTTP",
                    "protocol_port": 80,
                    "provisioning_status": "ACTIVE",
                    "operating_status": "ONLINE",
                    "default_pool_id": "pool-1",
                }
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/pools/pool-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pool": {
                    "id": "pool-1",
                    "protocol": "HTTP",
                    "lb_algorithm": "ROUND_ROBIN",
                    "provisioning_status": "ACTIVE",
                    "operating_status": "ONLINE",
                    "healthmonitor_id": "hm-1",
                    "members": [{"id": "m-1"}, {"id": "m-2"}, {"id": "m-3"}],
                }
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/healthmonitors/hm-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "healthmonitor": {
                    "id": "hm-1",
                    "type": "HTTP",
                    "http_method": "GET",
                    "expected_codes": "200",
                    "url_path": "/health",
                    "provisioning_status": "ACTIVE",
                    "operating_status": "ONLINE",
                }
            })))
            .mount(server)
            .await;

        for (index, member_id) in ["m-1", "m-2", "m-3"].iter().enumerate() {
            // The first member responds slowest; order must still hold
            let delay = Duration::from_millis(60 - (index as u64) * 25);
            Mock::given(method("GET"))
                .and(path(format!("/v2.0/lbaas/pools/pool-1/members/{member_id}")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_delay(delay)
                        .set_body_json(json!({
                            "member": {
                                "id": member_id,
                                "address": format!("192.0.2.{}", index + 1),
                                "protocol_port": 8080,
                                "weight": 1,
                                "backup": false,
                                "provisioning_status": "ACTIVE",
                                "operating_status": "ONLINE",
                            }
                        })),
                )
                .mount(server)
                .await;
        }
    }

    fn lb_raw() -> Raw<openstack_lb_info::resource::LoadBalancer> {
        Raw::from_value(lb_value("lb-1", "web", &["ls-1"])).expect("lb value")
    }

    #[tokio::test]
    async fn builds_full_listener_pool_member_graph() {
        let server = MockServer::start().await;
        mount_graph(&server).await;

        let builder = builder_for(&server, default_options());
        let report = builder.lb_report(lb_raw()).await.expect("report");

        assert_eq!(report.listeners.len(), 1);
        let listener = report.listeners[0].listener.as_ref().expect("listener");
        assert_eq!(listener.item.id, "ls-1");

        let pool = report.listeners[0].pool.as_ref().expect("pool");
        assert_eq!(pool.pool.item.id, "pool-1");
        assert_eq!(
            pool.health_monitor.as_ref().expect("monitor").item.id,
            "hm-1"
        );

        // Concurrent member fetches must preserve the pool's member order
        let members = pool.members.as_ref().expect("members");
        let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m-1", "m-2", "m-3"]);
        assert!(members.iter().all(|m| m.member.is_some()));
    }

    #[tokio::test]
    async fn vanished_listener_becomes_placeholder() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/listeners/ls-1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "faultcode": "NotFound",
            })))
            .mount(&server)
            .await;

        let builder = builder_for(&server, default_options());
        let report = builder.lb_report(lb_raw()).await.expect("report");

        assert_eq!(report.listeners.len(), 1);
        assert!(report.listeners[0].listener.is_none());
        assert!(report.listeners[0].pool.is_none());
    }

    #[tokio::test]
    async fn no_members_skips_member_requests_entirely() {
        let server = MockServer::start().await;
        mount_graph(&server).await;

        // Member requests route through this catch-all check
        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/pools/pool-1/members/m-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let options = ReportOptions {
            no_members: true,
            ..default_options()
        };
        let builder = builder_for(&server, options);
        let report = builder.lb_report(lb_raw()).await.expect("report");

        let pool = report.listeners[0].pool.as_ref().expect("pool");
        assert!(pool.members.is_none());
    }

    #[tokio::test]
    async fn listener_without_pool_renders_no_pool() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/listeners/ls-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "listener": {
                    "id": "ls-1",
                    "protocol": "TCP",
                    "protocol_port": 5432,
                    "provisioning_status": "ACTIVE",
                    "operating_status": "ONLINE",
                    "default_pool_id": null,
                }
            })))
            .mount(&server)
            .await;

        let builder = builder_for(&server, default_options());
        let report = builder.lb_report(lb_raw()).await.expect("report");
        assert!(report.listeners[0].listener.is_some());
        assert!(report.listeners[0].pool.is_none());
    }
}

mod logging {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Level, Metadata};

    /// Records the level of every emitted event.
    #[derive(Clone, Default)]
    struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

    impl tracing::Subscriber for LevelRecorder {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &Attributes<'_>) -> Id {
            Id::from_u64(1)
        }
        fn record(&self, _: &Id, _: &Record<'_>) {}
        fn record_follows_from(&self, _: &Id, _: &Id) {}
        fn event(&self, event: &Event<'_>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
        fn enter(&self, _: &Id) {}
        fn exit(&self, _: &Id) {}
    }

    #[tokio::test]
    async fn handled_404_is_not_logged_as_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/listeners/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let recorder = LevelRecorder::default();
        let levels = Arc::clone(&recorder.0);
        let _guard = tracing::subscriber::set_default(recorder);

        let found = client_for(&server)
            .find_listener("gone")
            .await
            .expect("lookup");
        assert!(found.is_none());
        assert!(!levels.lock().unwrap().contains(&Level::ERROR));
    }

    #[tokio::test]
    async fn server_failure_is_logged_as_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/lbaas/loadbalancers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let recorder = LevelRecorder::default();
        let levels = Arc::clone(&recorder.0);
        let _guard = tracing::subscriber::set_default(recorder);

        let result = client_for(&server).list_load_balancers(&[]).await;
        assert!(result.is_err());
        assert!(levels.lock().unwrap().contains(&Level::ERROR));
    }
}

mod amphora_report {
    use super::*;
    use openstack_lb_info::resource::Raw;

    fn amphora(id: &str, compute_id: &str, image_id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "role": "MASTER",
            "status": "ALLOCATED",
            "lb_network_ip": "192.168.0.10",
            "compute_id": compute_id,
            "image_id": image_id,
            "loadbalancer_id": "lb-1",
        })
    }

    #[tokio::test]
    async fn resolves_servers_and_caches_image_names() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/octavia/amphorae"))
            .and(query_param("loadbalancer_id", "lb-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "amphorae": [
                    amphora("amp-1", "srv-1", "img-1"),
                    amphora("amp-2", "srv-2", "img-1"),
                ],
            })))
            .mount(&server)
            .await;

        for srv in ["srv-1", "srv-2"] {
            Mock::given(method("GET"))
                .and(path(format!("/v2.1/servers/{srv}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "server": {
                        "id": srv,
                        "flavor": {"original_name": "m1.amphora"},
                        "OS-EXT-SRV-ATTR:host": "compute-03",
                    }
                })))
                .mount(&server)
                .await;
        }

        // Both amphorae share one image; Glance must be hit exactly once
        Mock::given(method("GET"))
            .and(path("/v2/images/img-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "img-1",
                "name": "amphora-x64-haproxy",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut builder = builder_for(&server, default_options());
        let lb = Raw::from_value(lb_value("lb-1", "web", &[])).expect("lb value");
        let report = builder.amphora_report(lb).await.expect("report");

        assert_eq!(report.amphorae.len(), 2);
        for entry in &report.amphorae {
            assert_eq!(entry.image_name.as_deref(), Some("amphora-x64-haproxy"));
            let srv = entry.server.as_ref().expect("server");
            assert_eq!(srv.item.flavor_name(), "m1.amphora");
            assert_eq!(srv.item.compute_host.as_deref(), Some("compute-03"));
        }
    }

    #[tokio::test]
    async fn missing_server_yields_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2.0/octavia/amphorae"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "amphorae": [amphora("amp-1", "srv-gone", "img-1")],
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2.1/servers/srv-gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/images/img-1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut builder = builder_for(&server, default_options());
        let lb = Raw::from_value(lb_value("lb-1", "web", &[])).expect("lb value");
        let report = builder.amphora_report(lb).await.expect("report");

        assert!(report.amphorae[0].server.is_none());
        assert!(report.amphorae[0].image_name.is_none());
    }
}
