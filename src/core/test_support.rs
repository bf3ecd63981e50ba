//! Mock OSM API helpers shared by the unit tests

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::fetcher::EntityFetcher;
use crate::core::source::SourceConfig;
use crate::core::transport::HttpTransport;

pub fn node_xml(id: u64, lon: f64, lat: f64) -> String {
    format!(r#"<osm version="0.6"><node id="{id}" lat="{lat}" lon="{lon}"/></osm>"#)
}

pub fn way_xml(id: u64, node_ids: &[u64]) -> String {
    let nds: String = node_ids.iter().map(|n| format!(r#"<nd ref="{n}"/>"#)).collect();
    format!(r#"<osm version="0.6"><way id="{id}">{nds}</way></osm>"#)
}

/// Members are (type, ref, role) triples
pub fn relation_xml(id: u64, tags: &[(&str, &str)], members: &[(&str, u64, &str)]) -> String {
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

pub async fn mount_xml(server: &MockServer, url_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_node(server: &MockServer, id: u64, lon: f64, lat: f64) {
    mount_xml(server, &format!("/node/{id}"), node_xml(id, lon, lat)).await;
}

pub async fn mount_way(server: &MockServer, id: u64, node_ids: &[u64]) {
    mount_xml(server, &format!("/way/{id}"), way_xml(id, node_ids)).await;
}

/// Fetcher against a mock server, without response caching or retries
pub fn test_fetcher(server: &MockServer) -> EntityFetcher {
    test_fetcher_with(server, 5, Duration::from_secs(5))
}

pub fn test_fetcher_with(
    server: &MockServer,
    max_connections: usize,
    fetch_timeout: Duration,
) -> EntityFetcher {
    let config = SourceConfig {
        cache_responses: false,
        retries: 0,
        max_connections,
        ..SourceConfig::with_base_url(&server.uri())
    };
    EntityFetcher::new(
        HttpTransport::new(config).expect("transport"),
        fetch_timeout,
        false,
    )
}
