//! Integration tests for osm2routes
//!
//! These tests run the whole pipeline, library and binary, against a mock
//! OSM API so no network access is needed.

use std::time::Duration;

use osm2routes::{
    classify, Classification, Coord, EntityKind, IgnoreReason, Member, Relation, ResolveOptions,
    SourceConfig, Tags,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn node_xml(id: u64, lon: f64, lat: f64) -> String {
    format!(r#"<osm version="0.6"><node id="{id}" lat="{lat}" lon="{lon}"/></osm>"#)
}

fn way_xml(id: u64, node_ids: &[u64]) -> String {
    let nds: String = node_ids.iter().map(|n| format!(r#"<nd ref="{n}"/>"#)).collect();
    format!(r#"<osm version="0.6"><way id="{id}">{nds}</way></osm>"#)
}

fn relation_xml(id: u64, tags: &[(&str, &str)], members: &[(&str, u64, &str)]) -> String {
    let members: String = members
        .iter()
        .map(|(kind, r, role)| format!(r#"<member type="{kind}" ref="{r}" role="{role}"/>"#))
        .collect();
    let tags: String = tags
        .iter()
        .map(|(k, v)| format!(r#"<tag k="{k}" v="{v}"/>"#))
        .collect();
    format!(r#"<osm version="0.6"><relation id="{id}">{members}{tags}</relation></osm>"#)
}

/// Serve `body` at `url_path`, asserting the number of requests when `times` is given
async fn mount(server: &MockServer, url_path: &str, body: String, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body));
    match times {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

/// A tram line under a route master: 100 -> 200 -> way 300 -> nodes 1, 2
async fn mount_tram_network(server: &MockServer) {
    mount(
        server,
        "/relation/100",
        relation_xml(100, &[("type", "route_master")], &[("relation", 200, "")]),
        Some(1),
    )
    .await;
    mount(
        server,
        "/relation/200",
        relation_xml(
            200,
            &[("type", "route"), ("route", "tram"), ("colour", "#ff0000")],
            &[("way", 300, ""), ("node", 1, "stop")],
        ),
        Some(1),
    )
    .await;
    mount(server, "/way/300", way_xml(300, &[1, 2]), None).await;
    mount(server, "/node/1", node_xml(1, 13.0, 52.5), None).await;
    mount(server, "/node/2", node_xml(2, 13.1, 52.6), None).await;
}

fn test_config(server: &MockServer) -> SourceConfig {
    SourceConfig {
        retries: 0,
        retry_base_delay: Duration::from_millis(10),
        ..SourceConfig::with_base_url(&server.uri())
    }
}

#[tokio::test]
async fn test_end_to_end_tram_network() {
    let mock_server = MockServer::start().await;
    mount_tram_network(&mock_server).await;

    let resolution = osm2routes::resolve_all_with_options(
        &[100],
        test_config(&mock_server),
        ResolveOptions::default(),
    )
    .await
    .unwrap();

    assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
    assert_eq!(resolution.routes.len(), 1);

    let route = &resolution.routes[0];
    assert_eq!(route.id, 200);
    assert_eq!(route.parent, 100);
    assert_eq!(route.tags["stroke"], "#ff0000");
    assert_eq!(route.tags["stroke-width"], "1");
    assert_eq!(route.tags["route"], "tram");
    assert_eq!(
        route.geometry,
        vec![vec![Coord::new(13.0, 52.5), Coord::new(13.1, 52.6)]]
    );

    let json = serde_json::to_value(osm2routes::feature_collection(&resolution.routes)).unwrap();
    assert_eq!(json["features"][0]["properties"]["stroke-width"], 1);
    assert_eq!(
        json["features"][0]["geometry"]["coordinates"],
        serde_json::json!([[[13.0, 52.5], [13.1, 52.6]]])
    );
}

#[tokio::test]
async fn test_shared_trunk_relation_fetched_once() {
    let mock_server = MockServer::start().await;

    // Two networks share the route master 10
    for root in [1u64, 2] {
        mount(
            &mock_server,
            &format!("/relation/{root}"),
            relation_xml(root, &[("type", "network")], &[("relation", 10, "")]),
            Some(1),
        )
        .await;
    }
    mount(
        &mock_server,
        "/relation/10",
        relation_xml(
            10,
            &[("type", "route_master")],
            &[("relation", 20, ""), ("relation", 21, "")],
        ),
        Some(1),
    )
    .await;
    for (id, role) in [(20u64, ""), (21, "forward")] {
        mount(
            &mock_server,
            &format!("/relation/{id}"),
            relation_xml(
                id,
                &[("type", "route"), ("route", "subway")],
                &[("way", 300, role), ("way", 301, "platform")],
            ),
            Some(1),
        )
        .await;
    }
    mount(&mock_server, "/way/300", way_xml(300, &[1, 2]), None).await;
    mount(&mock_server, "/way/301", way_xml(301, &[3, 4]), None).await;
    for (id, lon) in [(1u64, 13.0), (2, 13.1), (3, 13.2), (4, 13.3)] {
        mount(&mock_server, &format!("/node/{id}"), node_xml(id, lon, 52.5), None).await;
    }

    let options = ResolveOptions {
        share_member_cache: true,
        way_concurrency: 2,
        ..Default::default()
    };
    let mut resolution =
        osm2routes::resolve_all_with_options(&[1, 2], test_config(&mock_server), options)
            .await
            .unwrap();

    resolution.routes.sort_by_key(|r| r.id);
    let ids: Vec<u64> = resolution.routes.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![20, 21]);

    for route in &resolution.routes {
        assert_eq!(route.parent, 10);
        assert_eq!(route.tags["stroke-width"], "2");
        // Platform way 301 is not part of the track
        assert_eq!(route.geometry.len(), 1);
        assert_eq!(route.geometry[0].len(), 2);
    }
}

#[tokio::test]
async fn test_broken_members_are_reported_not_fatal() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "/relation/1",
        relation_xml(
            1,
            &[("type", "route"), ("route", "bus")],
            &[("way", 300, ""), ("way", 301, ""), ("node", 9, "stop")],
        ),
        None,
    )
    .await;
    mount(&mock_server, "/way/300", way_xml(300, &[1, 2]), None).await;
    mount(&mock_server, "/node/1", node_xml(1, 13.0, 52.5), None).await;
    mount(&mock_server, "/node/2", node_xml(2, 13.1, 52.6), None).await;
    // way 301 and node 9 are served as garbage and 404 respectively
    mount(&mock_server, "/way/301", "<html>oops</html>".to_string(), None).await;

    let resolution = osm2routes::resolve_all_with_options(
        &[1],
        test_config(&mock_server),
        ResolveOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(resolution.routes.len(), 1);
    assert_eq!(resolution.routes[0].parent, 0);
    assert_eq!(resolution.diagnostics.len(), 2);

    let contexts: Vec<String> = resolution
        .diagnostics
        .iter()
        .map(|d| d.context.to_string())
        .collect();
    assert!(contexts.contains(&"way 301 of route 1".to_string()));
    assert!(contexts.contains(&"node 9 of route 1".to_string()));
    assert!(resolution.diagnostics.iter().any(|d| matches!(
        d.context,
        osm2routes::Context::Member { kind: EntityKind::Node, id: 9, route: 1 }
    )));
}

#[tokio::test]
async fn test_unreachable_roots_are_fatal() {
    let mock_server = MockServer::start().await;

    // Repeated roots, as in the default Berlin list, must not mask the failure
    let result = osm2routes::resolve_all_with_options(
        &[1, 2, 2, 3],
        test_config(&mock_server),
        ResolveOptions::default(),
    )
    .await;

    assert!(matches!(result, Err(osm2routes::Error::Fatal(_))));
}

#[test]
fn test_classify_public_api() {
    let mut tags = Tags::new();
    tags.insert("type".to_string(), "multipolygon".to_string());
    let relation = Relation {
        id: 5,
        tags,
        members: vec![Member { kind: EntityKind::Way, id: 300, role: "outer".to_string() }],
    };

    match classify(&relation) {
        Classification::Ignored(IgnoreReason::UnsupportedType(t)) => assert_eq!(t, "multipolygon"),
        other => panic!("Expected ignored relation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cli_writes_feature_collection() {
    let mock_server = MockServer::start().await;
    mount_tram_network(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("tram.geojson");

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_osm2routes"))
        .arg("100")
        .arg("--api-url")
        .arg(mock_server.uri())
        .arg("--retries")
        .arg("0")
        .arg("-o")
        .arg(&output_path)
        .output()
        .await
        .expect("Failed to run osm2routes");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "osm2routes failed: {stderr}");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(written["type"], "FeatureCollection");
    assert_eq!(written["features"].as_array().map(Vec::len), Some(1));
    assert_eq!(written["features"][0]["properties"]["id"], 200);
    assert_eq!(written["features"][0]["properties"]["parent"], 100);
    assert_eq!(written["features"][0]["properties"]["stroke"], "#ff0000");
}

#[tokio::test]
async fn test_cli_refuses_to_overwrite_without_force() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "existing content").unwrap();

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_osm2routes"))
        .arg("100")
        .arg("--api-url")
        .arg("http://127.0.0.1:9")
        .arg("-o")
        .arg(file.path())
        .output()
        .await
        .expect("Failed to run osm2routes");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("use --force to overwrite"), "{stderr}");
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "existing content");
}

#[test]
fn test_cli_dry_run() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_osm2routes"))
        .args(["53181", "18813", "--dry-run"])
        .output()
        .expect("Failed to run dry-run command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Dry run should succeed: {stderr}");
    assert!(stderr.contains("DRY RUN"));
    assert!(stderr.contains("53181, 18813"));
    assert!(stderr.contains("https://www.openstreetmap.org/api/0.6"));
}
