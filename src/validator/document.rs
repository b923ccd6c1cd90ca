use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::model::{
    Callback, Components, Contact, Document, ExternalDocs, Info, License, OAuthFlow, OAuthFlows,
    Operation, Parameter, PathItem, Paths, RefOr, SecurityRequirement, SecurityScheme, Server,
    ServerVariable, Tag,
};
use crate::validator::{entries, indexed, Validate, ValidationContext, Validator};

impl Document {
    /// Validate the whole document graph.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in document order. The document is
    /// left untouched and may be corrected and validated again.
    pub fn validate(&self, context: &ValidationContext) -> Result<(), ValidationError> {
        Validator::run(context, self)
    }
}

impl Validate for Document {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.openapi.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "openapi" }));
        }
        let schemes: HashSet<String> = self
            .components
            .as_ref()
            .map(|c| c.security_schemes.keys().cloned().collect())
            .unwrap_or_default();
        v.declare_security_schemes(schemes);

        match &self.info {
            Some(info) => v.at("info", |v| info.validate_with(v))?,
            None => return Err(v.error(ValidationErrorKind::MissingField { field: "info" })),
        }
        match &self.paths {
            Some(paths) => v.at("paths", |v| paths.validate_with(v))?,
            None => return Err(v.error(ValidationErrorKind::MissingField { field: "paths" })),
        }
        if let Some(components) = &self.components {
            v.at("components", |v| components.validate_with(v))?;
        }
        if let Some(security) = &self.security {
            v.each("security", indexed(security))?;
        }
        v.each("servers", indexed(&self.servers))?;

        let mut tag_names = HashSet::new();
        for (i, tag) in self.tags.iter().enumerate() {
            if !tag_names.insert(tag.name.as_str()) {
                return Err(v.error_at("tags", ValidationErrorKind::Duplicate {
                    what: "tag",
                    name: tag.name.clone(),
                }));
            }
            v.at("tags", |v| v.at(i.to_string(), |v| tag.validate_with(v)))?;
        }
        if let Some(docs) = &self.external_docs {
            v.at("externalDocs", |v| docs.validate_with(v))?;
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Info {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "title" }));
        }
        if self.version.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "version" }));
        }
        if let Some(contact) = &self.contact {
            v.at("contact", |v| contact.validate_with(v))?;
        }
        if let Some(license) = &self.license {
            v.at("license", |v| license.validate_with(v))?;
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Contact {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        v.extensions(&self.extensions)
    }
}

impl Validate for License {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "name" }));
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Server {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "url" }));
        }
        v.each("variables", entries(&self.variables))?;
        v.extensions(&self.extensions)
    }
}

impl Validate for ServerVariable {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.default.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "default" }));
        }
        if let Some(values) = &self.enum_values {
            if values.is_empty() {
                return Err(v.error_at("enum", ValidationErrorKind::Invalid {
                    message: "enum must not be empty".to_string(),
                }));
            }
            if !values.contains(&self.default) {
                return Err(v.error_at("default", ValidationErrorKind::Invalid {
                    message: format!("default \"{}\" is not one of the enum values", self.default),
                }));
            }
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Tag {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "name" }));
        }
        if let Some(docs) = &self.external_docs {
            v.at("externalDocs", |v| docs.validate_with(v))?;
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for ExternalDocs {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "url" }));
        }
        v.extensions(&self.extensions)
    }
}

/// Template with every `{name}` replaced by `{}`, so that `/a/{id}` and
/// `/a/{name}` compare equal.
fn normalize_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut in_param = false;
    for c in template.chars() {
        match c {
            '{' => {
                in_param = true;
                out.push('{');
            }
            '}' => {
                in_param = false;
                out.push('}');
            }
            _ if in_param => {}
            _ => out.push(c),
        }
    }
    out
}

/// Names of the `{param}` segments of a path template, in order.
fn template_parameters(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        names.push(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    names
}

fn path_parameter_names(parameters: &[RefOr<Parameter>]) -> HashSet<String> {
    parameters
        .iter()
        .filter_map(|p| p.value())
        .filter(|p| p.location == "path")
        .map(|p| p.name.clone())
        .collect()
}

impl Validate for Paths {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        let mut normalized: HashMap<String, &str> = HashMap::new();
        for (template, item) in &self.items {
            v.checkpoint()?;
            if !template.starts_with('/') {
                return Err(v.error_at(template, ValidationErrorKind::Invalid {
                    message: format!("path \"{}\" must begin with \"/\"", template),
                }));
            }
            if let Some(previous) = normalized.insert(normalize_template(template), template) {
                return Err(v.error_at(template, ValidationErrorKind::Invalid {
                    message: format!("path \"{}\" conflicts with \"{}\"", template, previous),
                }));
            }
            v.at(template.as_str(), |v| {
                item.validate_with(v)?;
                match item.value() {
                    Some(resolved) => check_template_parameters(template, &resolved, v),
                    None => Ok(()),
                }
            })?;
        }
        v.extensions(&self.extensions)
    }
}

fn check_template_parameters(
    template: &str,
    item: &PathItem,
    v: &mut Validator<'_>,
) -> Result<(), ValidationError> {
    let names = template_parameters(template);
    if names.is_empty() {
        return Ok(());
    }
    let shared = path_parameter_names(&item.parameters);
    for (method, operation) in item.operations() {
        let own = path_parameter_names(&operation.parameters);
        if let Some(missing) = names
            .iter()
            .find(|name| !shared.contains(**name) && !own.contains(**name))
        {
            return Err(v.error_at(method, ValidationErrorKind::Undeclared {
                what: "path parameter",
                name: missing.to_string(),
            }));
        }
    }
    Ok(())
}

/// Fails on two parameters sharing `name` and `in`.
fn check_unique_parameters(
    parameters: &[RefOr<Parameter>],
    v: &Validator<'_>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (i, parameter) in parameters.iter().enumerate() {
        let Some(parameter) = parameter.value() else {
            continue;
        };
        if !seen.insert((parameter.name.clone(), parameter.location.clone())) {
            return Err(v.error_at("parameters", ValidationErrorKind::Duplicate {
                what: "parameter",
                name: format!("{} (in {}) at index {}", parameter.name, parameter.location, i),
            }));
        }
    }
    Ok(())
}

impl Validate for PathItem {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        v.each("parameters", indexed(&self.parameters))?;
        check_unique_parameters(&self.parameters, v)?;
        for (method, operation) in self.operations() {
            v.at(method, |v| operation.validate_with(v))?;
        }
        v.each("servers", indexed(&self.servers))?;
        v.extensions(&self.extensions)
    }
}

impl Validate for Operation {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if let Some(id) = &self.operation_id {
            if !v.claim_operation_id(id) {
                return Err(v.error_at("operationId", ValidationErrorKind::Duplicate {
                    what: "operationId",
                    name: id.clone(),
                }));
            }
        }
        v.each("parameters", indexed(&self.parameters))?;
        check_unique_parameters(&self.parameters, v)?;
        if let Some(body) = &self.request_body {
            v.at("requestBody", |v| body.validate_with(v))?;
        }
        match &self.responses {
            Some(responses) => v.at("responses", |v| responses.validate_with(v))?,
            None => return Err(v.error(ValidationErrorKind::MissingField { field: "responses" })),
        }
        v.each("callbacks", entries(&self.callbacks))?;
        if let Some(security) = &self.security {
            v.each("security", indexed(security))?;
        }
        v.each("servers", indexed(&self.servers))?;
        if let Some(docs) = &self.external_docs {
            v.at("externalDocs", |v| docs.validate_with(v))?;
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Callback {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        for (expression, item) in &self.items {
            v.at(expression.as_str(), |v| item.validate_with(v))?;
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for SecurityRequirement {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        for name in self.keys() {
            if !v.security_scheme_declared(name) {
                return Err(v.error_at(name, ValidationErrorKind::Undeclared {
                    what: "security scheme",
                    name: name.clone(),
                }));
            }
        }
        Ok(())
    }
}

/// Component names are restricted to `^[a-zA-Z0-9.\-_]+$`.
fn is_component_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn check_component_names<'a>(
    kind: &str,
    names: impl IntoIterator<Item = &'a String>,
    v: &Validator<'_>,
) -> Result<(), ValidationError> {
    for name in names {
        if !is_component_name(name) {
            return Err(v.error_at(kind, ValidationErrorKind::Invalid {
                message: format!(
                    "component name \"{}\" does not match ^[a-zA-Z0-9.\\-_]+$",
                    name
                ),
            }));
        }
    }
    Ok(())
}

fn check_component_kind<T: Validate>(
    kind: &str,
    map: &IndexMap<String, T>,
    v: &mut Validator<'_>,
) -> Result<(), ValidationError> {
    v.checkpoint()?;
    check_component_names(kind, map.keys(), v)?;
    v.each(kind, entries(map))
}

impl Validate for Components {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        check_component_kind("schemas", &self.schemas, v)?;
        check_component_kind("parameters", &self.parameters, v)?;
        check_component_kind("headers", &self.headers, v)?;
        check_component_kind("requestBodies", &self.request_bodies, v)?;
        check_component_kind("responses", &self.responses, v)?;
        check_component_kind("securitySchemes", &self.security_schemes, v)?;
        check_component_kind("examples", &self.examples, v)?;
        check_component_kind("links", &self.links, v)?;
        check_component_kind("callbacks", &self.callbacks, v)?;
        v.extensions(&self.extensions)
    }
}

impl Validate for SecurityScheme {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        match self.type_.as_str() {
            "apiKey" => {
                if self.name.as_deref().map_or(true, str::is_empty) {
                    return Err(v.error(ValidationErrorKind::MissingField { field: "name" }));
                }
                match self.location.as_deref() {
                    Some("query" | "header" | "cookie") => {}
                    Some(other) => {
                        return Err(v.error_at("in", ValidationErrorKind::UnsupportedValue {
                            field: "in",
                            value: other.to_string(),
                        }))
                    }
                    None => return Err(v.error(ValidationErrorKind::MissingField { field: "in" })),
                }
            }
            "http" => {
                if self.scheme.as_deref().map_or(true, str::is_empty) {
                    return Err(v.error(ValidationErrorKind::MissingField { field: "scheme" }));
                }
            }
            "oauth2" => match &self.flows {
                Some(flows) => v.at("flows", |v| flows.validate_with(v))?,
                None => return Err(v.error(ValidationErrorKind::MissingField { field: "flows" })),
            },
            "openIdConnect" => {
                if self.open_id_connect_url.as_deref().map_or(true, str::is_empty) {
                    return Err(v.error(ValidationErrorKind::MissingField {
                        field: "openIdConnectUrl",
                    }));
                }
            }
            "" => return Err(v.error(ValidationErrorKind::MissingField { field: "type" })),
            other => {
                return Err(v.error_at("type", ValidationErrorKind::UnsupportedValue {
                    field: "security scheme type",
                    value: other.to_string(),
                }))
            }
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for OAuthFlows {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        for (name, flow) in self.iter() {
            v.at(name, |v| check_flow(name, flow, v))?;
        }
        v.extensions(&self.extensions)
    }
}

fn check_flow(name: &str, flow: &OAuthFlow, v: &Validator<'_>) -> Result<(), ValidationError> {
    let needs_authorization = matches!(name, "implicit" | "authorizationCode");
    let needs_token = matches!(name, "password" | "clientCredentials" | "authorizationCode");
    if needs_authorization && flow.authorization_url.as_deref().map_or(true, str::is_empty) {
        return Err(v.error(ValidationErrorKind::MissingField {
            field: "authorizationUrl",
        }));
    }
    if needs_token && flow.token_url.as_deref().map_or(true, str::is_empty) {
        return Err(v.error(ValidationErrorKind::MissingField { field: "tokenUrl" }));
    }
    v.extensions(&flow.extensions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_compare_modulo_parameter_names() {
        assert_eq!(normalize_template("/pets/{id}"), normalize_template("/pets/{petId}"));
        assert_ne!(normalize_template("/pets/{id}"), normalize_template("/pets/{id}/toys"));
    }

    #[test]
    fn template_parameter_names() {
        assert_eq!(
            template_parameters("/users/{userId}/posts/{postId}"),
            vec!["userId", "postId"]
        );
        assert!(template_parameters("/health").is_empty());
    }

    #[test]
    fn component_names() {
        assert!(is_component_name("Pet.v1-beta_2"));
        assert!(!is_component_name("Pet Store"));
        assert!(!is_component_name(""));
    }
}
