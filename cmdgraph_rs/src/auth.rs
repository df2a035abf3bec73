//! Permission checks.
//!
//! The core never decides who may do what; it asks an [`Authorizer`] with
//! the invocation namespace and one permission string at a time.

use std::sync::Arc;

use crate::namespace::Namespace;

pub trait Authorizer: Send + Sync {
    fn test_permission(&self, namespace: &Namespace, permission: &str) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&Namespace, &str) -> bool + Send + Sync,
{
    fn test_permission(&self, namespace: &Namespace, permission: &str) -> bool {
        self(namespace, permission)
    }
}

/// Grants everything. Default for [`ParametricBuilder`](crate::command::ParametricBuilder).
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn test_permission(&self, _namespace: &Namespace, _permission: &str) -> bool {
        true
    }
}

/// Whoever is running the command.
pub trait Subject: Send + Sync {
    fn has_permission(&self, permission: &str) -> bool;

    fn groups(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Reads an `Arc<dyn Subject>` from the namespace; no subject, no access.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectAuthorizer;

impl Authorizer for SubjectAuthorizer {
    fn test_permission(&self, namespace: &Namespace, permission: &str) -> bool {
        namespace
            .get::<Arc<dyn Subject>>()
            .is_some_and(|subject| subject.has_permission(permission))
    }
}
