#![warn(clippy::all)]

//! Relationship- and hierarchy-aware attribute-based access control (RHABAC).
//!
//! Resources carry attributes and form an inheritance DAG; policies are
//! written against subject and object scopes and propagate along inheritance
//! edges and dotted-name scopes. The evaluator collects the applicable
//! policies for a concrete `(subject, object, permission)` query, orders them
//! by specificity, and resolves them band by band with deny taking precedence
//! within a band and absence defaulting closed.

#[macro_use]
mod serutil;

mod api;
mod attribute;
mod condition;
mod error;
mod eval;
mod hierarchy;
mod memory;
mod policy;
mod repo;
mod resource;
mod service;

pub use {
    api::{
        dispatch_administration, dispatch_evaluation, AdministrationRequest, AdministrationResponse, ErrorCode,
        EvaluationRequest, EvaluationResponse,
    },
    attribute::{Attribute, AttributeValue},
    condition::{AttrRef, CompareOp, Comparison, Condition, Scope},
    error::RhabacError,
    eval::{Context, ContextBuilder, ContextBuilderError, EvalResult},
    hierarchy::{Distance, HierarchyEntry, Origin, PermissionHierarchy, Priority},
    memory::MemoryRhabacRepo,
    policy::{Effect, GrantedPermission, Policy, PolicyBuilder, PolicyBuilderError},
    repo::{
        CreateInheritanceRelReq, CreatePolicyReq, CreateResourceReq, DeleteAttributeReq, DeleteInheritanceRelReq,
        DeletePolicyReq, DeleteResourceReq, GetApplicablePoliciesReq, GetApplicablePoliciesResp,
        GetPermissionHierarchyReq, GetPermissionHierarchyResp, GetResourceReq, GetResourceResp, PutAttributeReq,
        RhabacRepo,
    },
    resource::Resource,
    service::{
        AdministrationService, AuthorizationReq, EvaluationService, GetGrantedPermissionsReq, GrantedPermissionsResp,
    },
};
