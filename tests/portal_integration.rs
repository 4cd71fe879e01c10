use httpmock::prelude::*;
use modlock::portal::{PortalClient, PortalError, PortalProvider};
use modlock::resolver::{PackageProvider, ResolveError};
use modlock::version::Version;
use serde_json::json;

fn mock_manifest<'a>(
    server: &'a MockServer,
    name: &str,
    body: serde_json::Value,
) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path(format!("/api/mods/{name}/full"));
        then.status(200)
            .header("Content-Type", "application/json")
            .body(body.to_string());
    })
}

fn release(version: &str, deps: &[&str]) -> serde_json::Value {
    json!({
        "version": version,
        "download_url": format!("/download/{version}"),
        "file_name": format!("mod_{version}.zip"),
        "sha1": "da39a3ee5e6b4b0d3255bfef95601890afd80709",
        "info_json": { "dependencies": deps }
    })
}

#[test]
fn fetches_and_parses_a_manifest() {
    let server = MockServer::start();
    mock_manifest(
        &server,
        "mod-a",
        json!({
            "name": "mod-a",
            "releases": [release("1.0.0", &["base >= 2.0"]), release("1.2.0", &[])]
        }),
    );

    let client = PortalClient::new(&server.base_url()).unwrap();
    let package = client.fetch_package("mod-a").unwrap();
    assert_eq!(package.name, "mod-a");
    assert_eq!(package.releases.len(), 2);

    let oldest = package.release(&Version::new([1, 0, 0])).unwrap();
    assert_eq!(oldest.dependencies[0].to_string(), "base >= 2.0");
    assert_eq!(oldest.artifact.as_ref().unwrap().download_url, "/download/1.0.0");
}

#[test]
fn missing_mod_is_unknown() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/mods/ghost/full");
        then.status(404);
    });

    let client = PortalClient::new(&server.base_url()).unwrap();
    assert!(matches!(
        client.fetch_package("ghost"),
        Err(PortalError::UnknownMod(name)) if name == "ghost"
    ));
}

#[test]
fn mismatched_manifest_name_is_rejected() {
    let server = MockServer::start();
    mock_manifest(&server, "mod-a", json!({ "name": "mod-b", "releases": [] }));

    let client = PortalClient::new(&server.base_url()).unwrap();
    assert!(matches!(
        client.fetch_package("mod-a"),
        Err(PortalError::Manifest { .. })
    ));
}

#[test]
fn resolves_transitively_with_internal_mods_and_memoizes() {
    let server = MockServer::start();
    let a = mock_manifest(
        &server,
        "mod-a",
        json!({
            "name": "mod-a",
            "releases": [release("1.0.0", &["base >= 2.0", "mod-b"])]
        }),
    );
    let b = mock_manifest(
        &server,
        "mod-b",
        json!({
            "name": "mod-b",
            "releases": [release("0.4.3", &["base"])]
        }),
    );

    let provider = PortalProvider::new(
        PortalClient::new(&server.base_url()).unwrap(),
        Version::new([2, 0, 28]),
    );
    let result = provider
        .resolve(&["mod-a".parse().unwrap(), "mod-a".parse().unwrap()])
        .unwrap();

    let mut names: Vec<&str> = result.iter().map(|r| r.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["base", "mod-a", "mod-b"]);
    // base is synthesized, never fetched; the real mods are fetched once
    // despite appearing twice in the requirements.
    a.assert_hits(1);
    b.assert_hits(1);
}

#[test]
fn portal_failures_are_fatal_to_resolution() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/mods/flaky/full");
        then.status(500);
    });

    let provider = PortalProvider::new(
        PortalClient::new(&server.base_url()).unwrap(),
        Version::new([2, 0, 28]),
    );
    assert!(matches!(
        provider.resolve(&["flaky".parse().unwrap()]),
        Err(ResolveError::Portal(_))
    ));
}
