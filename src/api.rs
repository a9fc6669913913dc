use {
    crate::{
        AdministrationService, Attribute, AuthorizationReq, CreateInheritanceRelReq, CreatePolicyReq,
        CreateResourceReq, DeleteAttributeReq, DeleteInheritanceRelReq, DeletePolicyReq, DeleteResourceReq,
        EvaluationService, GetGrantedPermissionsReq, GrantedPermission, Policy, PutAttributeReq, Resource, RhabacError,
    },
    serde::{Deserialize, Serialize},
    tokio_util::sync::CancellationToken,
};

/// An administration request, one variant per operation. A transport binding
/// deserialises one of these off the bus, dispatches it, and publishes the
/// uniform [AdministrationResponse] to the caller's reply subject.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum AdministrationRequest {
    CreateResource {
        resource: Resource,
        #[serde(default)]
        attributes: Vec<Attribute>,
    },
    DeleteResource {
        resource: Resource,
    },
    PutAttribute {
        resource: Resource,
        attribute: Attribute,
    },
    DeleteAttribute {
        resource: Resource,
        attribute_id: String,
    },
    CreateInheritanceRel {
        from: Resource,
        to: Resource,
    },
    DeleteInheritanceRel {
        from: Resource,
        to: Resource,
    },
    CreatePolicy {
        policy: Policy,
    },
    DeletePolicy {
        policy: Policy,
    },
}

display_json!(AdministrationRequest);
from_str_json!(AdministrationRequest);

/// Wire error codes, mirroring the domain error taxonomy.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Ok,
    NotFound,
    Conflict,
    InvalidArgument,
    Backend,
    Cancelled,
    Internal,
}

impl From<&RhabacError> for ErrorCode {
    fn from(error: &RhabacError) -> Self {
        match error {
            RhabacError::NotFound(_) => Self::NotFound,
            RhabacError::Conflict(_) => Self::Conflict,
            RhabacError::InvalidArgument(_) => Self::InvalidArgument,
            RhabacError::Backend(_) => Self::Backend,
            RhabacError::Cancelled => Self::Cancelled,
            RhabacError::Internal(_) => Self::Internal,
        }
    }
}

/// The uniform administration response: an error code and a message, empty
/// on success.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AdministrationResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
}

impl AdministrationResponse {
    pub fn ok() -> Self {
        Self {
            error_code: ErrorCode::Ok,
            error_message: String::new(),
        }
    }

    pub fn from_error(error: &RhabacError) -> Self {
        Self {
            error_code: ErrorCode::from(error),
            error_message: error.to_string(),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error_code == ErrorCode::Ok
    }
}

display_json!(AdministrationResponse);
from_str_json!(AdministrationResponse);

/// An evaluation request: either a point authorization query or a
/// granted-permissions listing.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum EvaluationRequest {
    Authorize {
        subject: Resource,
        object: Resource,
        permission_name: String,
        #[serde(default)]
        env: Vec<Attribute>,
    },
    GetGrantedPermissions {
        subject: Resource,
        #[serde(default)]
        env: Vec<Attribute>,
    },
}

display_json!(EvaluationRequest);
from_str_json!(EvaluationRequest);

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum EvaluationResponse {
    Authorize {
        authorized: bool,
        error_code: ErrorCode,
        error_message: String,
    },
    GrantedPermissions {
        permissions: Vec<GrantedPermission>,
        error_code: ErrorCode,
        error_message: String,
    },
}

display_json!(EvaluationResponse);
from_str_json!(EvaluationResponse);

/// Route an administration request to the facade and fold the outcome into
/// the uniform response.
pub async fn dispatch_administration(
    service: &AdministrationService,
    cancel: &CancellationToken,
    request: AdministrationRequest,
) -> AdministrationResponse {
    let result = match request {
        AdministrationRequest::CreateResource {
            resource,
            attributes,
        } => {
            service
                .create_resource(
                    cancel,
                    CreateResourceReq {
                        resource,
                        attributes,
                    },
                )
                .await
        }
        AdministrationRequest::DeleteResource {
            resource,
        } => {
            service
                .delete_resource(
                    cancel,
                    DeleteResourceReq {
                        resource,
                    },
                )
                .await
        }
        AdministrationRequest::PutAttribute {
            resource,
            attribute,
        } => {
            service
                .put_attribute(
                    cancel,
                    PutAttributeReq {
                        resource,
                        attribute,
                    },
                )
                .await
        }
        AdministrationRequest::DeleteAttribute {
            resource,
            attribute_id,
        } => {
            service
                .delete_attribute(
                    cancel,
                    DeleteAttributeReq {
                        resource,
                        attribute_id,
                    },
                )
                .await
        }
        AdministrationRequest::CreateInheritanceRel {
            from,
            to,
        } => {
            service
                .create_inheritance_rel(
                    cancel,
                    CreateInheritanceRelReq {
                        from,
                        to,
                    },
                )
                .await
        }
        AdministrationRequest::DeleteInheritanceRel {
            from,
            to,
        } => {
            service
                .delete_inheritance_rel(
                    cancel,
                    DeleteInheritanceRelReq {
                        from,
                        to,
                    },
                )
                .await
        }
        AdministrationRequest::CreatePolicy {
            policy,
        } => {
            service
                .create_policy(
                    cancel,
                    CreatePolicyReq {
                        policy,
                    },
                )
                .await
        }
        AdministrationRequest::DeletePolicy {
            policy,
        } => {
            service
                .delete_policy(
                    cancel,
                    DeletePolicyReq {
                        policy,
                    },
                )
                .await
        }
    };

    match result {
        Ok(()) => AdministrationResponse::ok(),
        Err(error) => AdministrationResponse::from_error(&error),
    }
}

/// Route an evaluation request to the facade.
pub async fn dispatch_evaluation(
    service: &EvaluationService,
    cancel: &CancellationToken,
    request: EvaluationRequest,
) -> EvaluationResponse {
    match request {
        EvaluationRequest::Authorize {
            subject,
            object,
            permission_name,
            env,
        } => {
            match service
                .authorize(
                    cancel,
                    AuthorizationReq {
                        subject,
                        object,
                        permission_name,
                        env,
                    },
                )
                .await
            {
                Ok(authorized) => EvaluationResponse::Authorize {
                    authorized,
                    error_code: ErrorCode::Ok,
                    error_message: String::new(),
                },
                Err(error) => EvaluationResponse::Authorize {
                    authorized: false,
                    error_code: ErrorCode::from(&error),
                    error_message: error.to_string(),
                },
            }
        }
        EvaluationRequest::GetGrantedPermissions {
            subject,
            env,
        } => {
            let resp = service
                .get_granted_permissions(
                    cancel,
                    GetGrantedPermissionsReq {
                        subject,
                        env,
                    },
                )
                .await;
            let (error_code, error_message) = match &resp.error {
                Some(error) => (ErrorCode::from(error), error.to_string()),
                None => (ErrorCode::Ok, String::new()),
            };
            EvaluationResponse::GrantedPermissions {
                permissions: resp.permissions,
                error_code,
                error_message,
            }
        }
    }
}
