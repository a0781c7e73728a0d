//! Symbolic API operations and their network descriptors

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{GatewayError, GatewayResult};

use super::method::HttpMethod;

/// Network shape of one symbolic API operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDescriptor {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the base URL, with optional `{name}` placeholders.
    pub path: String,
    /// Parameters sent on every call of this operation.
    pub params: BTreeMap<String, Value>,
    /// When set, the only statuses this operation accepts.
    pub valid_status: Option<Vec<u16>>,
}

impl ApiDescriptor {
    /// Creates a descriptor with no fixed parameters.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            valid_status: None,
        }
    }

    /// Shorthand for a GET descriptor.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Shorthand for a POST descriptor.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Shorthand for a PUT descriptor.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Shorthand for a DELETE descriptor.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Adds a fixed parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Restricts accepted statuses.
    #[must_use]
    pub fn with_valid_status(mut self, statuses: &[u16]) -> Self {
        self.valid_status = Some(statuses.to_vec());
        self
    }

    /// Returns true if `status` is acceptable for this operation:
    /// membership in `valid_status` when set, any 2xx otherwise.
    #[must_use]
    pub fn accepts(&self, status: u16) -> bool {
        self.valid_status
            .as_ref()
            .map_or((200..300).contains(&status), |valid| valid.contains(&status))
    }

    /// Substitutes `{name}` placeholders in `path` with `args`.
    ///
    /// Values are percent-encoded as single path segments, so `/`, `?` or
    /// `#` in an argument cannot change the request target. Commas are kept
    /// for Wrike's comma-separated id lists.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingPathArgument` for a placeholder with no
    /// value.
    pub fn render_path(
        &self,
        api: &str,
        args: &BTreeMap<String, String>,
    ) -> GatewayResult<String> {
        let mut rendered = String::with_capacity(self.path.len());
        let mut rest = self.path.as_str();

        while let Some(start) = rest.find('{') {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                rendered.push_str(&rest[start..]);
                return Ok(rendered);
            };
            let name = &after[..end];
            let value = args
                .get(name)
                .ok_or_else(|| GatewayError::MissingPathArgument {
                    api: api.to_string(),
                    argument: name.to_string(),
                })?;
            rendered.push_str(&encode_segment(value));
            rest = &after[end + 1..];
        }

        rendered.push_str(rest);
        Ok(rendered)
    }

    /// Fixed parameters overlaid with the caller's parameters.
    #[must_use]
    pub fn merged_params(&self, call: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        let mut merged = self.params.clone();
        merged.extend(call.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).replace("%2C", ",")
}

/// One invocation of a symbolic operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiCall {
    /// Registered operation name.
    pub name: String,
    /// Values for `{placeholders}` in the descriptor path.
    pub path_args: BTreeMap<String, String>,
    /// Query or form parameters.
    pub params: BTreeMap<String, Value>,
}

impl ApiCall {
    /// Creates a call with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a path argument.
    #[must_use]
    pub fn path_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_args.insert(name.into(), value.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Immutable name-to-descriptor table, defined once per gateway.
#[derive(Debug, Clone, Default)]
pub struct ApiRegistry {
    descriptors: BTreeMap<String, ApiDescriptor>,
}

impl ApiRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under `name`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, descriptor: ApiDescriptor) -> Self {
        self.descriptors.insert(name.into(), descriptor);
        self
    }

    /// Looks up a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::UnknownApi` if nothing is registered under
    /// `name`.
    pub fn get(&self, name: &str) -> GatewayResult<&ApiDescriptor> {
        self.descriptors
            .get(name)
            .ok_or_else(|| GatewayError::UnknownApi(name.to_string()))
    }

    /// Iterates descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ApiDescriptor)> {
        self.descriptors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
