//! Resource references and `${...}` interpolation tokens
//!
//! Terraform wires resources together through interpolation strings such as
//! `${zitadel_org.org.id}`. A [`ResourceRef`] is the handle a stack returns
//! when a resource is added; it renders those strings and its fully
//! qualified name (`type.name`) is what `depends_on` lists contain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a resource declared in a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_type: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Fully qualified name, e.g. `helm_release.cert-manager`
    pub fn fqn(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// Interpolation of one attribute, e.g. `${docker_image.registry-image.image_id}`
    pub fn attr(&self, attribute: &str) -> String {
        format!("${{{}.{}}}", self.fqn(), attribute)
    }

    /// Shorthand for the `id` attribute every resource exports
    pub fn id(&self) -> String {
        self.attr("id")
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Check that a name is usable as a Terraform block label
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Extract every resource referenced by `${type.name.attr}` interpolations
///
/// Only managed-resource references are returned: `var.`, `local.`,
/// `data.`, `module.` and similar namespaces are ignored, and so are
/// expressions that are not a plain attribute path. Duplicates are kept
/// out and the result preserves first-seen order.
pub fn references(text: &str) -> Vec<ResourceRef> {
    let mut found = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        if let Some(reference) = parse_reference(&after[..end])
            && !found.contains(&reference)
        {
            found.push(reference);
        }
        rest = &after[end + 1..];
    }

    found
}

const NON_RESOURCE_ROOTS: &[&str] = &["var", "local", "data", "module", "path", "terraform", "each", "count", "self"];

fn parse_reference(expr: &str) -> Option<ResourceRef> {
    let mut parts = expr.trim().split('.');
    let resource_type = parts.next()?;
    let name = parts.next()?;
    parts.next()?;

    if NON_RESOURCE_ROOTS.contains(&resource_type)
        || !is_valid_name(resource_type)
        || !is_valid_name(name)
    {
        return None;
    }

    Some(ResourceRef::new(resource_type, name))
}
