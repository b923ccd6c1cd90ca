//! Loading documents and references over HTTP.

#![cfg(feature = "remote")]

use std::rc::Rc;

use openapi_loader::model::{RefOr, Schema};
use openapi_loader::{
    Document, FetchError, HttpFetcher, LoadError, LoaderConfig, ResolutionError, Session,
    ValidationContext,
};

const ROOT: &str = r#"
openapi: 3.0.3
info: { title: Pets, version: "1.0" }
paths:
  /pets:
    get:
      responses:
        200:
          description: ok
          content:
            application/json:
              schema: { $ref: "schemas.yaml#/Pet" }
components:
  schemas:
    Pet: { $ref: "schemas.yaml#/Pet" }
    Owner: { $ref: "schemas.yaml#/Owner" }
"#;

const SCHEMAS: &str = r##"
Pet:
  type: object
  properties:
    owner: { $ref: "#/Owner" }
Owner:
  type: object
  properties:
    name: { type: string }
"##;

fn http_config() -> LoaderConfig {
    LoaderConfig::new()
        .allow_external_refs(true)
        .fetcher(HttpFetcher::new().unwrap())
}

fn target(holder: &RefOr<Schema>) -> Rc<Schema> {
    holder.as_reference().unwrap().node().unwrap()
}

fn component<'a>(document: &'a Document, name: &str) -> &'a RefOr<Schema> {
    &document.components.as_ref().unwrap().schemas[name]
}

#[test]
fn external_document_fetched_once() {
    let mut server = mockito::Server::new();
    let root = server
        .mock("GET", "/api/openapi.yaml")
        .with_body(ROOT)
        .expect(1)
        .create();
    let schemas = server
        .mock("GET", "/api/schemas.yaml")
        .with_body(SCHEMAS)
        .expect(1)
        .create();

    let url = format!("{}/api/openapi.yaml", server.url());
    let mut session = Session::new(http_config());
    let document = session.load_url(&url).unwrap();

    root.assert();
    schemas.assert();
    assert_eq!(session.document_count(), 2);

    let pet = target(component(&document, "Pet"));
    let owner = target(component(&document, "Owner"));
    assert!(Rc::ptr_eq(&target(&pet.properties["owner"]), &owner));
    document.validate(&ValidationContext::new()).unwrap();
}

#[test]
fn default_fetcher_reaches_http() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/openapi.yaml").with_body(ROOT).create();
    server.mock("GET", "/schemas.yaml").with_body(SCHEMAS).create();

    let config = LoaderConfig::new().allow_external_refs(true);
    let document = Session::new(config)
        .load_source(&format!("{}/openapi.yaml", server.url()))
        .unwrap();
    assert!(component(&document, "Owner").as_reference().unwrap().is_resolved());
}

#[test]
fn missing_external_document_is_a_fetch_error() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/openapi.yaml").with_body(ROOT).create();
    server
        .mock("GET", "/schemas.yaml")
        .with_status(404)
        .create();

    let err = Session::new(http_config())
        .load_url(&format!("{}/openapi.yaml", server.url()))
        .unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(matches!(
        err,
        LoadError::Resolution(ResolutionError::Fetch {
            source: FetchError::Http(_),
            ..
        })
    ));
}

#[test]
fn external_refs_refused_without_fetching() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/openapi.yaml").with_body(ROOT).create();
    let schemas = server
        .mock("GET", "/schemas.yaml")
        .with_body(SCHEMAS)
        .expect(0)
        .create();

    let config = LoaderConfig::new().fetcher(HttpFetcher::new().unwrap());
    let err = Session::new(config)
        .load_url(&format!("{}/openapi.yaml", server.url()))
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Resolution(ResolutionError::ExternalRefsDisallowed { .. })
    ));
    schemas.assert();
}
