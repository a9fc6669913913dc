use {
    crate::{Attribute, PermissionHierarchy, Policy, Resource, RhabacError},
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tokio_util::sync::CancellationToken,
};

/// Request to persist a resource, optionally with an initial attribute list.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CreateResourceReq {
    pub resource: Resource,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Request to delete a resource. Deletion cascades to the resource's
/// inheritance edges and to every policy scoped on it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DeleteResourceReq {
    pub resource: Resource,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GetResourceReq {
    pub resource: Resource,
}

/// A resource together with its stored attributes.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GetResourceResp {
    pub resource: Resource,
    pub attributes: Vec<Attribute>,
}

/// Upsert an attribute on a resource, keyed by the attribute id.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PutAttributeReq {
    pub resource: Resource,
    pub attribute: Attribute,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DeleteAttributeReq {
    pub resource: Resource,
    pub attribute_id: String,
}

/// Add the inheritance edge `from → to`: `from` inherits the attributes and
/// applicable policies of `to`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CreateInheritanceRelReq {
    pub from: Resource,
    pub to: Resource,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DeleteInheritanceRelReq {
    pub from: Resource,
    pub to: Resource,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CreatePolicyReq {
    pub policy: Policy,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DeletePolicyReq {
    pub policy: Policy,
}

/// Query for every policy applicable to a concrete
/// `(subject, object, permission)` triple.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GetPermissionHierarchyReq {
    pub subject: Resource,
    pub object: Resource,
    pub permission_name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GetPermissionHierarchyResp {
    pub hierarchy: PermissionHierarchy,
}

/// Query for every policy whose subject scope is an ancestor of `subject`,
/// regardless of object.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GetApplicablePoliciesReq {
    pub subject: Resource,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GetApplicablePoliciesResp {
    pub policies: Vec<Policy>,
}

/// The storage contract the evaluator runs against.
///
/// Reads are idempotent and writes atomic. Every call observes the request's
/// cancellation token and aborts promptly with [RhabacError::Cancelled] once
/// it trips. Implementations may block on I/O; callers treat every method as
/// a suspension point.
#[async_trait]
pub trait RhabacRepo: Send + Sync {
    async fn create_resource(&self, cancel: &CancellationToken, req: CreateResourceReq) -> Result<(), RhabacError>;

    async fn delete_resource(&self, cancel: &CancellationToken, req: DeleteResourceReq) -> Result<(), RhabacError>;

    async fn get_resource(
        &self,
        cancel: &CancellationToken,
        req: GetResourceReq,
    ) -> Result<GetResourceResp, RhabacError>;

    async fn put_attribute(&self, cancel: &CancellationToken, req: PutAttributeReq) -> Result<(), RhabacError>;

    async fn delete_attribute(&self, cancel: &CancellationToken, req: DeleteAttributeReq) -> Result<(), RhabacError>;

    async fn create_inheritance_rel(
        &self,
        cancel: &CancellationToken,
        req: CreateInheritanceRelReq,
    ) -> Result<(), RhabacError>;

    async fn delete_inheritance_rel(
        &self,
        cancel: &CancellationToken,
        req: DeleteInheritanceRelReq,
    ) -> Result<(), RhabacError>;

    async fn create_policy(&self, cancel: &CancellationToken, req: CreatePolicyReq) -> Result<(), RhabacError>;

    async fn delete_policy(&self, cancel: &CancellationToken, req: DeletePolicyReq) -> Result<(), RhabacError>;

    async fn get_permission_hierarchy(
        &self,
        cancel: &CancellationToken,
        req: GetPermissionHierarchyReq,
    ) -> Result<GetPermissionHierarchyResp, RhabacError>;

    async fn get_applicable_policies(
        &self,
        cancel: &CancellationToken,
        req: GetApplicablePoliciesReq,
    ) -> Result<GetApplicablePoliciesResp, RhabacError>;
}
