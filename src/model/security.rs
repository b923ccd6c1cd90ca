use std::ops::Deref;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::reference::Referable;
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::Extensions;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for SecurityScheme {
    const KIND: &'static str = "security scheme";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            type_: f.take_or_default("type")?,
            description: f.take("description")?,
            name: f.take("name")?,
            location: f.take("in")?,
            scheme: f.take("scheme")?,
            bearer_format: f.take("bearerFormat")?,
            flows: f.take("flows")?,
            open_id_connect_url: f.take("openIdConnectUrl")?,
            extensions: f.finish()?,
        })
    }
}

impl Referable for SecurityScheme {}

impl Materialize for SecurityScheme {
    fn materialize(&self, _m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl OAuthFlows {
    /// Flows present, with their field names, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &OAuthFlow)> {
        [
            ("implicit", &self.implicit),
            ("password", &self.password),
            ("clientCredentials", &self.client_credentials),
            ("authorizationCode", &self.authorization_code),
        ]
        .into_iter()
        .filter_map(|(name, flow)| flow.as_ref().map(|flow| (name, flow)))
    }
}

impl Parse for OAuthFlows {
    const KIND: &'static str = "oauth flows";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            implicit: f.take("implicit")?,
            password: f.take("password")?,
            client_credentials: f.take("clientCredentials")?,
            authorization_code: f.take("authorizationCode")?,
            extensions: f.finish()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    pub scopes: IndexMap<String, String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for OAuthFlow {
    const KIND: &'static str = "oauth flow";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            authorization_url: f.take("authorizationUrl")?,
            token_url: f.take("tokenUrl")?,
            refresh_url: f.take("refreshUrl")?,
            scopes: f.take_or_default("scopes")?,
            extensions: f.finish()?,
        })
    }
}

/// Security scheme names mapped to the scopes an operation requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SecurityRequirement(pub IndexMap<String, Vec<String>>);

impl Deref for SecurityRequirement {
    type Target = IndexMap<String, Vec<String>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Parse for SecurityRequirement {
    const KIND: &'static str = "security requirement";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        IndexMap::parse(value, cursor).map(SecurityRequirement)
    }
}
