//! Message Dispatcher
//!
//! Routes `<family>.<operation>` patterns to the family services. Each
//! operation has an HTTP twin; see the API routes.

use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, ServiceError};
use crate::messaging::Envelope;
use crate::models::{
    BulkCreateRequest, IdRequest, IdStatusRequest, SlugRequest, SortOrderRequest, UpdateRequest,
    ValidateParams,
};
use crate::taxonomy::{EntityFamily, ListQuery, NewTaxon, TaxonomyService, TaxonomyServices};

// == Operation ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FindAll,
    FindOne,
    FindBySlug,
    GetStats,
    FindByGender,
    FindWithChildren,
    Validate,
    Create,
    BulkCreate,
    Update,
    UpdateStatus,
    UpdateSortOrder,
    Remove,
    PermanentDelete,
    Restore,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::FindAll,
        Operation::FindOne,
        Operation::FindBySlug,
        Operation::GetStats,
        Operation::FindByGender,
        Operation::FindWithChildren,
        Operation::Validate,
        Operation::Create,
        Operation::BulkCreate,
        Operation::Update,
        Operation::UpdateStatus,
        Operation::UpdateSortOrder,
        Operation::Remove,
        Operation::PermanentDelete,
        Operation::Restore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FindAll => "findAll",
            Operation::FindOne => "findOne",
            Operation::FindBySlug => "findBySlug",
            Operation::GetStats => "getStats",
            Operation::FindByGender => "findByGender",
            Operation::FindWithChildren => "findWithChildren",
            Operation::Validate => "validate",
            Operation::Create => "create",
            Operation::BulkCreate => "bulkCreate",
            Operation::Update => "update",
            Operation::UpdateStatus => "updateStatus",
            Operation::UpdateSortOrder => "updateSortOrder",
            Operation::Remove => "remove",
            Operation::PermanentDelete => "permanentDelete",
            Operation::Restore => "restore",
        }
    }
}

impl FromStr for Operation {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ServiceError::InvalidRequest(format!("Unknown operation: {}", s)))
    }
}

/// Splits `categories.findAll` into its family and operation.
fn parse_pattern(pattern: &str) -> Result<(EntityFamily, Operation)> {
    let (family, operation) = pattern.split_once('.').ok_or_else(|| {
        ServiceError::InvalidRequest(format!("Malformed message pattern: {}", pattern))
    })?;
    Ok((family.parse()?, operation.parse()?))
}

fn payload<T: DeserializeOwned>(payload: Value) -> Result<T> {
    let payload = match payload {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(payload)
        .map_err(|e| ServiceError::InvalidRequest(format!("Invalid payload: {}", e)))
}

fn data<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ServiceError::Internal(e.to_string()))
}

// == Message Dispatcher ==
#[derive(Clone)]
pub struct MessageDispatcher {
    services: TaxonomyServices,
}

impl MessageDispatcher {
    pub fn new(services: TaxonomyServices) -> Self {
        Self { services }
    }

    /// Runs the operation named by `pattern`. Failures come back as a
    /// `success: false` envelope, never as a panic or a dropped reply.
    pub async fn dispatch(&self, pattern: &str, payload: Value) -> Envelope {
        let result = match parse_pattern(pattern) {
            Ok((family, operation)) => {
                self.run(self.services.family(family), operation, payload)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(pattern, error = %e, "message failed");
                Envelope::failure(&e)
            }
        }
    }

    async fn run(
        &self,
        service: &TaxonomyService,
        operation: Operation,
        input: Value,
    ) -> Result<Envelope> {
        let label = service.family().label();
        let envelope = match operation {
            Operation::FindAll => {
                let query: ListQuery = payload(input)?;
                Envelope::ok(data(&service.list(query).await?.value)?)
            }
            Operation::FindOne => {
                let req: IdRequest = payload(input)?;
                Envelope::ok(data(&service.get_by_id(req.id).await?.value)?)
            }
            Operation::FindBySlug => {
                let req: SlugRequest = payload(input)?;
                Envelope::ok(data(&service.get_by_slug(&req.slug).await?.value)?)
            }
            Operation::GetStats => Envelope::ok(data(&service.stats().await?.value)?),
            Operation::FindByGender => Envelope::ok(data(&service.by_gender().await?.value)?),
            Operation::FindWithChildren => {
                Envelope::ok(data(&service.with_children().await?.value)?)
            }
            Operation::Validate => {
                let req: ValidateParams = payload(input)?;
                let availability = service
                    .validate(&req.name, req.slug.as_deref(), req.exclude_id)
                    .await?;
                Envelope::ok(data(&availability.value)?)
            }
            Operation::Create => {
                let input: NewTaxon = payload(input)?;
                Envelope::ok(data(&service.create(input).await?)?)
                    .with_message(format!("{} created successfully", label))
            }
            Operation::BulkCreate => {
                let req: BulkCreateRequest = payload(input)?;
                let created = service.bulk_create(req.items).await?;
                let count = created.len();
                Envelope::ok(data(&created)?)
                    .with_message(format!("{} {} entities created", count, label))
            }
            Operation::Update => {
                let req: UpdateRequest = payload(input)?;
                if req.patch.is_empty() {
                    return Err(ServiceError::InvalidRequest("No fields to update".to_string()));
                }
                Envelope::ok(data(&service.update(req.id, req.patch).await?)?)
                    .with_message(format!("{} updated successfully", label))
            }
            Operation::UpdateStatus => {
                let req: IdStatusRequest = payload(input)?;
                Envelope::ok(data(&service.update_status(req.id, req.status).await?)?)
                    .with_message(format!("{} status updated", label))
            }
            Operation::UpdateSortOrder => {
                let req: SortOrderRequest = payload(input)?;
                Envelope::ok(data(&service.update_sort_order(req.items).await?)?)
                    .with_message("Sort order updated")
            }
            Operation::Remove => {
                let req: IdRequest = payload(input)?;
                Envelope::ok(data(&service.soft_delete(req.id).await?)?)
                    .with_message(format!("{} deleted successfully", label))
            }
            Operation::PermanentDelete => {
                let req: IdRequest = payload(input)?;
                Envelope::ok(data(&service.hard_delete(req.id).await?)?)
                    .with_message(format!("{} permanently deleted", label))
            }
            Operation::Restore => {
                let req: IdRequest = payload(input)?;
                Envelope::ok(data(&service.restore(req.id).await?)?)
                    .with_message(format!("{} restored successfully", label))
            }
        };
        Ok(envelope)
    }
}
