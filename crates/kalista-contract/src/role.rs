//! Which side of the exchange a schema describes.

use std::fmt;

use kalista_schema::SchemaResource;
use serde::{Deserialize, Serialize};

/// Role of a schema within a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaRole {
    /// Shape of the request body (the contract's own payload fixture).
    Request,
    /// Shape of the response body returned by the server.
    Response,
}

impl SchemaRole {
    /// Both roles, request first.
    pub const ALL: [SchemaRole; 2] = [SchemaRole::Request, SchemaRole::Response];

    /// Lowercase role name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }

    /// Resource file name used as the last segment of the schema URI.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Request => "request.json",
            Self::Response => "response.json",
        }
    }

    /// Schema resource for this role of the contract `identifier`.
    ///
    /// Deterministic, and distinct for every (identifier, role) pair.
    pub fn resource_for(self, identifier: &str) -> SchemaResource {
        SchemaResource::from_segments([identifier, self.file_name()])
    }
}

impl fmt::Display for SchemaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
