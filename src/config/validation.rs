//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile-check route patterns, reject non-terminal `...`
//! - Validate value ranges and the access descriptor tree
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::access::{self, AccessSchema};
use crate::config::schema::ServerConfig;
use crate::path::{parse, NodeKind, WildcardKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{address}` is not a valid socket address")]
    InvalidBindAddress { address: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("route with empty name")]
    EmptyRouteName,

    #[error("duplicate route name `{name}`")]
    DuplicateRouteName { name: String },

    #[error("route `{name}`: pattern `{pattern}` does not parse")]
    BadRoutePattern { name: String, pattern: String },

    #[error("route `{name}`: `...` is only meaningful as the final pattern node")]
    NonTerminalSubPath { name: String },

    #[error(transparent)]
    Access(access::ValidationError),
}

/// Validate a full server configuration, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            address: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "listener.max_connections",
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "listener.max_body_bytes",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "timeouts.request_secs",
        });
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        if route.name.is_empty() {
            errors.push(ValidationError::EmptyRouteName);
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName {
                name: route.name.clone(),
            });
        }
        match parse(&route.pattern, true) {
            Err(_) => errors.push(ValidationError::BadRoutePattern {
                name: route.name.clone(),
                pattern: route.pattern.clone(),
            }),
            Ok(pattern) => {
                let non_terminal_tail = pattern
                    .nodes()
                    .iter()
                    .rev()
                    .skip(1)
                    .any(|n| n.kind == NodeKind::Wildcard(WildcardKind::AnySubPath));
                if non_terminal_tail {
                    errors.push(ValidationError::NonTerminalSubPath {
                        name: route.name.clone(),
                    });
                }
            }
        }
    }

    if let Err(access::SchemaError::Validation(report)) = AccessSchema::from_config(&config.access)
    {
        errors.extend(report.0.into_iter().map(ValidationError::Access));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
