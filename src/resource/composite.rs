//! Composite payload builders
//!
//! Some operations send deeply nested bodies (the company profile, a
//! quotation draft). Their leaf fields are declared in the registry with
//! `"location": "composite"` and a full dot path as target. Each
//! [`CompositeShape`] owns a fixed set of sections and only ever writes the
//! direct leaves of those sections into `additionalFields`, so values the
//! caller already placed elsewhere in the tree survive.

use super::builder::{is_provided, read_field};
use super::json_path::{has_path, set_path, split_parent};
use super::registry::{schema, FieldLocation};
use super::types::{Operation, ResourceType};
use crate::error::DispatchError;
use crate::input::InputSource;
use serde_json::{Map, Value};

/// A nested payload shape and the sub-trees it may write to
#[derive(Debug, Clone, Copy)]
pub struct CompositeShape {
    pub name: &'static str,
    /// Dot paths (under `additionalFields`) whose direct leaves this shape owns
    pub sections: &'static [&'static str],
}

pub const COMPANY_PROFILE: CompositeShape = CompositeShape {
    name: "company profile",
    sections: &["company", "company.address", "company.contact", "company.banking"],
};

pub const ORGANIZATION_SETTINGS: CompositeShape = CompositeShape {
    name: "organization settings",
    sections: &[
        "organization.tax",
        "organization.payment",
        "organization.document",
        "organization.api",
        "organization.system",
    ],
};

pub const QUOTATION_DRAFT: CompositeShape = CompositeShape {
    name: "quotation draft",
    sections: &["address", "totalPrice", "taxConditions", "shippingConditions"],
};

const PROFILE_SHAPES: &[CompositeShape] = &[COMPANY_PROFILE, ORGANIZATION_SETTINGS];
const QUOTATION_SHAPES: &[CompositeShape] = &[QUOTATION_DRAFT];

/// Composite shapes assembled for a (resource, operation) pair
pub fn shapes_for(resource: ResourceType, operation: Operation) -> &'static [CompositeShape] {
    match (resource, operation) {
        (ResourceType::Profile, Operation::Update) => PROFILE_SHAPES,
        (ResourceType::Quotation, Operation::Create | Operation::Update) => QUOTATION_SHAPES,
        _ => &[],
    }
}

/// Writes leaves of one shape into a shared root object
pub struct CompositeBuilder<'a> {
    shape: &'static CompositeShape,
    root: &'a mut Map<String, Value>,
}

impl<'a> CompositeBuilder<'a> {
    pub fn new(shape: &'static CompositeShape, root: &'a mut Map<String, Value>) -> Self {
        Self { shape, root }
    }

    /// Whether `target` is a direct leaf of one of this shape's sections
    pub fn owns(&self, target: &str) -> bool {
        split_parent(target).is_some_and(|(parent, _)| self.shape.sections.contains(&parent))
    }

    /// Overwrite the leaf at `target`. Returns false for paths outside the shape.
    pub fn set_leaf(&mut self, target: &str, value: Value) -> bool {
        if !self.owns(target) {
            return false;
        }
        set_path(self.root, target, value);
        true
    }

    /// Write a default only when nothing is present at `target` yet
    pub fn fill_default(&mut self, target: &str, value: Value) -> bool {
        if !self.owns(target) || has_path(self.root, target) {
            return false;
        }
        set_path(self.root, target, value);
        true
    }
}

/// Merge every composite leaf of the active schema entry into `additional`
pub(crate) fn assemble(
    resource: ResourceType,
    operation: Operation,
    input: &dyn InputSource,
    index: usize,
    additional: &mut Map<String, Value>,
) -> Result<(), DispatchError> {
    let fields: Vec<_> = schema(resource, operation)
        .iter()
        .filter(|f| f.location == FieldLocation::Composite)
        .collect();
    if fields.is_empty() {
        return Ok(());
    }

    let mut claimed = vec![false; fields.len()];

    for shape in shapes_for(resource, operation) {
        let mut builder = CompositeBuilder::new(shape, additional);

        for (field, claimed) in fields.iter().zip(claimed.iter_mut()) {
            if !builder.owns(field.target()) {
                continue;
            }
            *claimed = true;

            let provided = is_provided(input, field, index);
            let Some(value) = read_field(input, field, index)? else {
                continue;
            };

            if provided {
                builder.set_leaf(field.target(), value);
            } else {
                builder.fill_default(field.target(), value);
            }
        }

        tracing::debug!("assembled {} for {} {}", shape.name, resource, operation);
    }

    for (field, claimed) in fields.iter().zip(&claimed) {
        if !claimed {
            tracing::warn!(
                "composite field '{}' ({}) of {} {} has no owning shape",
                field.name,
                field.target(),
                resource,
                operation
            );
        }
    }

    Ok(())
}
