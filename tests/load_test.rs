//! Integration tests for loading and reference materialization.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use openapi_loader::model::{RefOr, Schema};
use openapi_loader::{
    load, Document, FetchError, LoadError, LoaderConfig, ResolutionError, Session,
    StructuralErrorKind, ValidationContext,
};
use url::Url;

/// In-memory documents keyed by URL, counting fetches per URL.
#[derive(Clone, Default)]
struct MockFetcher {
    documents: Rc<HashMap<String, String>>,
    calls: Rc<RefCell<HashMap<String, usize>>>,
}

impl MockFetcher {
    fn new(documents: &[(&str, &str)]) -> Self {
        Self {
            documents: Rc::new(
                documents
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
            ),
            calls: Rc::default(),
        }
    }

    fn calls(&self, url: &str) -> usize {
        self.calls.borrow().get(url).copied().unwrap_or(0)
    }

    fn config(&self) -> LoaderConfig {
        let fetcher = self.clone();
        LoaderConfig::new()
            .allow_external_refs(true)
            .fetcher(move |url: &Url| -> Result<Vec<u8>, FetchError> {
                *fetcher.calls.borrow_mut().entry(url.to_string()).or_default() += 1;
                fetcher
                    .documents
                    .get(url.as_str())
                    .map(|body| body.as_bytes().to_vec())
                    .ok_or_else(|| FetchError::Other(format!("no document at {}", url)))
            })
    }
}

fn load_str(source: &str) -> Result<Document, LoadError> {
    load(source.as_bytes(), "", &LoaderConfig::default())
}

fn component<'a>(document: &'a Document, name: &str) -> &'a RefOr<Schema> {
    &document.components.as_ref().unwrap().schemas[name]
}

fn target(holder: &RefOr<Schema>) -> Rc<Schema> {
    holder.as_reference().expect("a reference").node().expect("resolved")
}

mod round_trip {
    use super::*;
    use pretty_assertions::assert_eq;

    const PETSTORE: &str = r##"
openapi: "3.0.3"
info:
  title: Petstore
  version: 1.0.0
  x-audience: public
servers:
  - url: https://petstore.example.org/v1
paths:
  /pets/{petId}:
    parameters:
      - $ref: "#/components/parameters/PetId"
    get:
      operationId: showPetById
      tags: [pets]
      responses:
        200:
          description: A pet
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pet"
        default:
          $ref: "#/components/responses/Error"
components:
  parameters:
    PetId:
      name: petId
      in: path
      required: true
      schema: { type: string }
  responses:
    Error:
      description: unexpected error
      content:
        application/json:
          schema:
            type: object
            properties:
              message: { type: string }
  schemas:
    Pet:
      type: object
      required: [id, name]
      properties:
        id: { type: integer, format: int64 }
        name: { type: string }
        tag: { type: string, nullable: true }
"##;

    #[test]
    fn load_marshal_load_is_stable() {
        let first = load_str(PETSTORE).unwrap();
        let bytes = first.to_json().unwrap();
        let second = load(&bytes, "", &LoaderConfig::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn loaded_document_validates() {
        let document = load_str(PETSTORE).unwrap();
        document.validate(&ValidationContext::new()).unwrap();
    }

    #[test]
    fn references_are_emitted_as_written() {
        let document = load_str(PETSTORE).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&document.to_json().unwrap()).unwrap();
        assert_eq!(
            json["paths"]["/pets/{petId}"]["get"]["responses"]["default"],
            serde_json::json!({ "$ref": "#/components/responses/Error" })
        );
        assert_eq!(json["info"]["x-audience"], "public");
    }
}

mod shared_nodes {
    use super::*;

    #[test]
    fn identical_locations_share_one_node() {
        let document = load_str(
            r##"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Id: { type: string }
    A:
      type: object
      properties:
        id: { $ref: "#/components/schemas/Id" }
    B:
      type: array
      items: { $ref: "#/components/schemas/Id" }
"##,
        )
        .unwrap();

        let a = component(&document, "A").as_item().unwrap();
        let b = component(&document, "B").as_item().unwrap();
        let from_a = target(&a.properties["id"]);
        let from_b = target(b.items.as_ref().unwrap());
        assert!(Rc::ptr_eq(&from_a, &from_b));
        assert!(Rc::ptr_eq(&from_a, component(&document, "Id").as_node().unwrap()));
    }

    #[test]
    fn self_reference_closes_on_the_component() {
        let document = load_str(
            r##"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Node:
      type: object
      properties:
        next: { $ref: "#/components/schemas/Node" }
        children:
          type: array
          items: { $ref: "#/components/schemas/Node" }
"##,
        )
        .unwrap();

        let node = component(&document, "Node").as_node().unwrap();
        let next = node.properties["next"].as_reference().unwrap();
        assert!(next.is_cycle());
        assert!(Rc::ptr_eq(&next.node().unwrap(), node));

        let items = node.properties["children"].as_item().unwrap().items.as_ref().unwrap();
        assert!(Rc::ptr_eq(&target(items), node));

        document.validate(&ValidationContext::new()).unwrap();
    }

    #[test]
    fn mutual_recursion_terminates() {
        let document = load_str(
            r##"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Even: { properties: { odd: { $ref: "#/components/schemas/Odd" } } }
    Odd: { properties: { even: { $ref: "#/components/schemas/Even" } } }
"##,
        )
        .unwrap();
        let even = target(&component(&document, "Odd").as_item().unwrap().properties["even"]);
        let odd = target(&even.properties["odd"]);
        assert!(Rc::ptr_eq(&target(&odd.properties["even"]), &even));
        assert!(Rc::ptr_eq(&even, component(&document, "Even").as_node().unwrap()));
        assert!(Rc::ptr_eq(&odd, component(&document, "Odd").as_node().unwrap()));
    }

    #[test]
    fn alias_chain_resolves_to_final_node() {
        let document = load_str(
            r##"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    A: { $ref: "#/components/schemas/B" }
    B: { $ref: "#/components/schemas/C" }
    C: { type: string }
"##,
        )
        .unwrap();
        assert!(target(component(&document, "A")).has_type("string"));
    }

    #[test]
    fn alias_cycle_is_an_error() {
        let err = load_str(
            r##"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    A: { $ref: "#/components/schemas/B" }
    B: { $ref: "#/components/schemas/A" }
"##,
        )
        .unwrap_err();
        assert!(
            matches!(err, LoadError::Resolution(ResolutionError::AliasCycle { .. })),
            "{:?}",
            err
        );
    }
}

mod structural_errors {
    use super::*;
    use pretty_assertions::assert_eq;

    const ISSUE_513_OK: &str = r##"
openapi: "3.0.3"
info:
  title: 'My app'
  version: 1.0.0
  description: 'An API'
paths:
  /v1/operation:
    delete:
      summary: Delete something
      responses:
        200:
          description: Success
        default:
          description: '* **400** - Bad Request'
          x-my-extension: {val: ue}
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Error'
components:
  schemas:
    Error:
      type: object
      description: An error response body.
      properties:
        message:
          description: A detailed message describing the error.
          type: string
"##;

    #[test]
    fn response_extension_is_kept() {
        let document = load_str(ISSUE_513_OK).unwrap();
        document.validate(&ValidationContext::new()).unwrap();
        let json = String::from_utf8(document.to_json().unwrap()).unwrap();
        assert!(json.contains(r#""x-my-extension":{"val":"ue"}"#), "{}", json);
    }

    #[test]
    fn unknown_response_field_is_named() {
        let source = ISSUE_513_OK.replace(
            "          content:\n            application/json:\n              schema:\n",
            "          schema:\n",
        );
        let source = source.replace(
            "                $ref: '#/components/schemas/Error'",
            "            $ref: '#/components/schemas/Error'",
        );
        let err = load_str(&source).unwrap_err();
        assert!(err.is_structural());
        match err {
            LoadError::Structural(e) => {
                assert_eq!(e.path, "/paths/~1v1~1operation/delete/responses/default");
                assert_eq!(
                    e.kind,
                    StructuralErrorKind::UnknownFields {
                        fields: vec!["schema".into()]
                    }
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn ref_with_siblings_in_response() {
        let err = load_str(
            r##"
openapi: "3.0.3"
info: { title: t, version: "1" }
paths:
  /v1/operation:
    delete:
      responses:
        default:
          description: Success
          $ref: '#/components/responses/Ok'
components:
  responses:
    Ok: { description: ok }
"##,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("$ref"), "{}", message);
        assert!(message.contains("description"), "{}", message);
        assert!(err.is_structural());
    }

    #[test]
    fn object_instead_of_list() {
        let err = load_str(
            r##"
openapi: 3.0.1
info: { version: v1, title: Products api }
components:
  schemas:
    schemaArray:
      type: array
      minItems: 1
      items:
        $ref: '#'
paths:
  /categories:
    get:
      responses:
        '200':
          description: ''
          content:
            application/json:
              schema:
                allOf:
                  $ref: '#/components/schemas/schemaArray'
"##,
        )
        .unwrap_err();
        match err {
            LoadError::Structural(e) => {
                assert!(e.path.ends_with("/schema/allOf"), "{}", e.path);
                assert_eq!(
                    e.kind,
                    StructuralErrorKind::InvalidType {
                        expected: "array",
                        actual: "object"
                    }
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn ref_to_a_property_named_all_of() {
        let document = load_str(
            r##"
openapi: 3.0.1
info: { version: v1, title: Products api }
components:
  schemas:
    someSchema:
      type: object
    schemaArray:
      type: array
      minItems: 1
      items:
        $ref: '#/components/schemas/someSchema'
paths:
  /categories:
    get:
      responses:
        '200':
          description: ''
          content:
            application/json:
              schema:
                properties:
                  allOf:
                    $ref: '#/components/schemas/schemaArray'
"##,
        )
        .unwrap();
        document.validate(&ValidationContext::new()).unwrap();
    }

    #[test]
    fn missing_target_names_the_pointer() {
        let err = load_str(
            r##"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    A: { $ref: "#/components/schemas/Missing" }
"##,
        )
        .unwrap_err();
        assert!(err.to_string().contains("/components/schemas/Missing"), "{}", err);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn syntax_error() {
        let err = load_str("openapi: [3.0").unwrap_err();
        assert!(matches!(err, LoadError::Syntax { .. }));
    }
}

mod external_refs {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_REFS: &str = r##"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    A:
      $ref: http://example.org/foo.json#/Bar
    B:
      type: object
      properties:
        bar:
          $ref: http://example.org/foo.json#/Bar
"##;

    const FOO: &str = r#"{ "Bar": { "type": "string" } }"#;

    #[test]
    fn disallowed_by_default() {
        let err = load_str(TWO_REFS).unwrap_err();
        match err {
            LoadError::Resolution(ResolutionError::ExternalRefsDisallowed { reference, .. }) => {
                assert_eq!(reference, "http://example.org/foo.json#/Bar");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn fetched_once_when_allowed() {
        let fetcher = MockFetcher::new(&[("http://example.org/foo.json", FOO)]);
        let document = load(TWO_REFS.as_bytes(), "", &fetcher.config()).unwrap();
        assert_eq!(fetcher.calls("http://example.org/foo.json"), 1);

        let a = target(component(&document, "A"));
        let b = target(&component(&document, "B").as_item().unwrap().properties["bar"]);
        assert!(Rc::ptr_eq(&a, &b));
        assert!(a.has_type("string"));
    }

    #[test]
    fn session_reuses_fetched_documents() {
        let fetcher = MockFetcher::new(&[("http://example.org/foo.json", FOO)]);
        let mut session = Session::new(fetcher.config());
        session.load(TWO_REFS.as_bytes(), "memory:///one.yaml").unwrap();
        session.load(TWO_REFS.as_bytes(), "memory:///two.yaml").unwrap();
        assert_eq!(fetcher.calls("http://example.org/foo.json"), 1);
        assert_eq!(session.document_count(), 3);
    }

    #[test]
    fn fetch_failure_is_an_io_error() {
        let fetcher = MockFetcher::new(&[]);
        let err = load(TWO_REFS.as_bytes(), "", &fetcher.config()).unwrap_err();
        assert!(matches!(err, LoadError::Resolution(ResolutionError::Fetch { .. })));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn relative_refs_resolve_against_their_document() {
        let fetcher = MockFetcher::new(&[
            (
                "https://specs.example.org/api/schemas/pet.yaml",
                "Pet:\n  type: object\n  properties:\n    owner: { $ref: 'person.yaml#/Person' }\n",
            ),
            (
                "https://specs.example.org/api/schemas/person.yaml",
                "Person: { type: string }\n",
            ),
        ]);
        let source = r##"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Pet: { $ref: "schemas/pet.yaml#/Pet" }
"##;
        let document = load(
            source.as_bytes(),
            "https://specs.example.org/api/openapi.yaml",
            &fetcher.config(),
        )
        .unwrap();
        let pet = target(component(&document, "Pet"));
        assert!(target(&pet.properties["owner"]).has_type("string"));
    }

    const CATEGORIES: &str = r#"{
        "$id": "http://schemas.sentex.io/store/categories.json",
        "$schema": "http://json-schema.org/draft-07/schema#",
        "description": "array of category strings",
        "type": "array",
        "items": {
            "allOf": [ { "$ref": "http://schemas.sentex.io/store/category.json" } ]
        }
    }"#;

    const CATEGORY: &str = r#"{
        "$id": "http://schemas.sentex.io/store/category.json",
        "$schema": "http://json-schema.org/draft-07/schema#",
        "description": "category name for products",
        "type": "string",
        "pattern": "^[A-Za-z0-9\\-]+$",
        "minimum": 1,
        "maximum": 30
    }"#;

    fn products_api(schema_ref: &str) -> String {
        format!(
            r##"
openapi: 3.0.1
servers:
- url: http://localhost:5000
info:
  version: v1
  title: Products api
  contact:
    name: me
    email: me@github.com
  description: This is a sample
paths:
  /categories:
    get:
      summary: Provides the available categories for the store
      operationId: list-categories
      responses:
        '200':
          description: this is a desc
          content:
            application/json:
              schema:
                $ref: {}
"##,
            schema_ref
        )
    }

    #[test]
    fn draft_07_documents() {
        let fetcher = MockFetcher::new(&[
            ("http://schemas.sentex.io/store/categories.json", CATEGORIES),
            ("http://schemas.sentex.io/store/category.json", CATEGORY),
        ]);
        let source = products_api("http://schemas.sentex.io/store/categories.json");
        let document = load(source.as_bytes(), "", &fetcher.config()).unwrap();
        document.validate(&ValidationContext::new()).unwrap();
    }

    /// The draft-04 meta-schema, served locally.
    const DRAFT_04: &str = r##"{
        "id": "http://json-schema.org/draft-04/schema#",
        "$schema": "http://json-schema.org/draft-04/schema#",
        "description": "Core schema meta-schema",
        "definitions": {
            "schemaArray": { "type": "array", "minItems": 1, "items": { "$ref": "#" } },
            "positiveInteger": { "type": "integer", "minimum": 0 },
            "positiveIntegerDefault0": {
                "allOf": [ { "$ref": "#/definitions/positiveInteger" }, { "default": 0 } ]
            },
            "simpleTypes": {
                "enum": [ "array", "boolean", "integer", "null", "number", "object", "string" ]
            },
            "stringArray": { "type": "array", "items": { "type": "string" }, "minItems": 1, "uniqueItems": true }
        },
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "$schema": { "type": "string" },
            "title": { "type": "string" },
            "description": { "type": "string" },
            "default": {},
            "multipleOf": { "type": "number", "minimum": 0, "exclusiveMinimum": true },
            "maximum": { "type": "number" },
            "exclusiveMaximum": { "type": "boolean", "default": false },
            "minimum": { "type": "number" },
            "exclusiveMinimum": { "type": "boolean", "default": false },
            "maxLength": { "$ref": "#/definitions/positiveInteger" },
            "minLength": { "$ref": "#/definitions/positiveIntegerDefault0" },
            "pattern": { "type": "string", "format": "regex" },
            "additionalItems": { "anyOf": [ { "type": "boolean" }, { "$ref": "#" } ], "default": {} },
            "items": { "anyOf": [ { "$ref": "#" }, { "$ref": "#/definitions/schemaArray" } ], "default": {} },
            "maxItems": { "$ref": "#/definitions/positiveInteger" },
            "minItems": { "$ref": "#/definitions/positiveIntegerDefault0" },
            "uniqueItems": { "type": "boolean", "default": false },
            "maxProperties": { "$ref": "#/definitions/positiveInteger" },
            "minProperties": { "$ref": "#/definitions/positiveIntegerDefault0" },
            "required": { "$ref": "#/definitions/stringArray" },
            "additionalProperties": { "anyOf": [ { "type": "boolean" }, { "$ref": "#" } ], "default": {} },
            "definitions": { "type": "object", "additionalProperties": { "$ref": "#" }, "default": {} },
            "properties": { "type": "object", "additionalProperties": { "$ref": "#" }, "default": {} },
            "patternProperties": { "type": "object", "additionalProperties": { "$ref": "#" }, "default": {} },
            "dependencies": {
                "type": "object",
                "additionalProperties": { "anyOf": [ { "$ref": "#" }, { "$ref": "#/definitions/stringArray" } ] }
            },
            "enum": { "type": "array", "minItems": 1, "uniqueItems": true },
            "type": {
                "anyOf": [
                    { "$ref": "#/definitions/simpleTypes" },
                    { "type": "array", "items": { "$ref": "#/definitions/simpleTypes" }, "minItems": 1, "uniqueItems": true }
                ]
            },
            "format": { "type": "string" },
            "allOf": { "$ref": "#/definitions/schemaArray" },
            "anyOf": { "$ref": "#/definitions/schemaArray" },
            "oneOf": { "$ref": "#/definitions/schemaArray" },
            "not": { "$ref": "#" }
        },
        "dependencies": { "exclusiveMaximum": [ "maximum" ], "exclusiveMinimum": [ "minimum" ] },
        "default": {}
    }"##;

    #[test]
    fn draft_04_meta_schema_resolves_structurally() {
        let fetcher = MockFetcher::new(&[("http://json-schema.org/draft-04/schema", DRAFT_04)]);
        let source = products_api("http://json-schema.org/draft-04/schema");
        let document = load(source.as_bytes(), "", &fetcher.config()).unwrap();
        assert_eq!(fetcher.calls("http://json-schema.org/draft-04/schema"), 1);

        let paths = document.paths.as_ref().unwrap();
        let item = paths.get("/categories").unwrap().value().unwrap();
        let responses = item.get.as_ref().unwrap().responses.as_ref().unwrap();
        let response = responses.status(200).unwrap().value().unwrap();
        let content = response.content.as_ref().unwrap();
        let root = target(content["application/json"].schema.as_ref().unwrap());
        assert_eq!(root.dialect, openapi_loader::Dialect::Draft4);

        // `items: {$ref: "#"}` under `schemaArray` points back at the meta-schema root.
        let schema_array = target(&root.properties["allOf"]);
        assert!(Rc::ptr_eq(&target(schema_array.items.as_ref().unwrap()), &root));
        assert!(Rc::ptr_eq(&target(&root.properties["anyOf"]), &schema_array));

        document.validate(&ValidationContext::new()).unwrap();
    }
}
