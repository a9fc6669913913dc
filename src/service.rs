use {
    crate::{
        Attribute, Context, CreateInheritanceRelReq, CreatePolicyReq, CreateResourceReq, DeleteAttributeReq,
        DeleteInheritanceRelReq, DeletePolicyReq, DeleteResourceReq, GetApplicablePoliciesReq,
        GetPermissionHierarchyReq, GetResourceReq, GrantedPermission, Policy, PutAttributeReq, Resource, RhabacError,
        RhabacRepo,
    },
    serde::{Deserialize, Serialize},
    std::{
        collections::{HashMap, HashSet},
        sync::Arc,
    },
    tokio_util::sync::CancellationToken,
};

/// An authorization query: may `subject` perform `permission_name` on
/// `object`, given the environment attributes?
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AuthorizationReq {
    pub subject: Resource,
    pub object: Resource,
    pub permission_name: String,
    #[serde(default)]
    pub env: Vec<Attribute>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GetGrantedPermissionsReq {
    pub subject: Resource,
    #[serde(default)]
    pub env: Vec<Attribute>,
}

/// The outcome of a granted-permissions query. The list may be partial when
/// `error` is set: the query is advisory and keeps whatever it had
/// accumulated when it was interrupted.
#[derive(Clone, Debug, PartialEq)]
pub struct GrantedPermissionsResp {
    pub permissions: Vec<GrantedPermission>,
    pub error: Option<RhabacError>,
}

/// The administration facade: pass-through to the repository, with scope
/// normalisation and validation applied exactly once, here.
#[derive(Clone)]
pub struct AdministrationService {
    repo: Arc<dyn RhabacRepo>,
}

impl AdministrationService {
    pub fn new(repo: Arc<dyn RhabacRepo>) -> Self {
        Self {
            repo,
        }
    }

    pub async fn create_resource(&self, cancel: &CancellationToken, req: CreateResourceReq) -> Result<(), RhabacError> {
        self.repo.create_resource(cancel, req).await
    }

    pub async fn delete_resource(&self, cancel: &CancellationToken, req: DeleteResourceReq) -> Result<(), RhabacError> {
        self.repo.delete_resource(cancel, req).await
    }

    pub async fn put_attribute(&self, cancel: &CancellationToken, req: PutAttributeReq) -> Result<(), RhabacError> {
        self.repo.put_attribute(cancel, req).await
    }

    pub async fn delete_attribute(
        &self,
        cancel: &CancellationToken,
        req: DeleteAttributeReq,
    ) -> Result<(), RhabacError> {
        self.repo.delete_attribute(cancel, req).await
    }

    pub async fn create_inheritance_rel(
        &self,
        cancel: &CancellationToken,
        req: CreateInheritanceRelReq,
    ) -> Result<(), RhabacError> {
        self.repo.create_inheritance_rel(cancel, req).await
    }

    pub async fn delete_inheritance_rel(
        &self,
        cancel: &CancellationToken,
        req: DeleteInheritanceRelReq,
    ) -> Result<(), RhabacError> {
        self.repo.delete_inheritance_rel(cancel, req).await
    }

    pub async fn create_policy(&self, cancel: &CancellationToken, req: CreatePolicyReq) -> Result<(), RhabacError> {
        let policy = validated(req.policy)?;
        self.repo
            .create_policy(
                cancel,
                CreatePolicyReq {
                    policy,
                },
            )
            .await
    }

    pub async fn delete_policy(&self, cancel: &CancellationToken, req: DeletePolicyReq) -> Result<(), RhabacError> {
        let policy = validated(req.policy)?;
        self.repo
            .delete_policy(
                cancel,
                DeletePolicyReq {
                    policy,
                },
            )
            .await
    }
}

/// Reject empty permission names and collapse empty-named scopes onto the
/// root. The repository below assumes both.
fn validated(policy: Policy) -> Result<Policy, RhabacError> {
    if policy.permission_name().is_empty() {
        return Err(RhabacError::InvalidArgument("empty permission name".to_string()));
    }
    Ok(policy.normalized())
}

/// The evaluation facade. Stateless between requests; all mutable state lives
/// in the repository.
#[derive(Clone)]
pub struct EvaluationService {
    repo: Arc<dyn RhabacRepo>,
}

impl EvaluationService {
    pub fn new(repo: Arc<dyn RhabacRepo>) -> Self {
        Self {
            repo,
        }
    }

    /// Answer an authorization query. Every repository failure propagates;
    /// this never returns `Ok(true)` on error.
    pub async fn authorize(&self, cancel: &CancellationToken, req: AuthorizationReq) -> Result<bool, RhabacError> {
        // The three reads are independent; issue them concurrently.
        let (hierarchy_resp, subject_resp, object_resp) = tokio::try_join!(
            self.repo.get_permission_hierarchy(
                cancel,
                GetPermissionHierarchyReq {
                    subject: req.subject.clone(),
                    object: req.object.clone(),
                    permission_name: req.permission_name.clone(),
                },
            ),
            self.repo.get_resource(
                cancel,
                GetResourceReq {
                    resource: req.subject.clone(),
                },
            ),
            self.repo.get_resource(
                cancel,
                GetResourceReq {
                    resource: req.object.clone(),
                },
            ),
        )?;

        let context = Context::new(subject_resp.attributes, object_resp.attributes, req.env);
        let result = hierarchy_resp.hierarchy.eval(&context);
        log::debug!("authorize {} for {} on {}: {}", req.permission_name, req.subject, req.object, result);
        Ok(result.is_allowed())
    }

    /// Report every permission the subject currently holds and over which
    /// objects. Per-policy failures are logged and skipped; cancellation
    /// returns whatever was accumulated, marked with the cancelled error.
    pub async fn get_granted_permissions(
        &self,
        cancel: &CancellationToken,
        req: GetGrantedPermissionsReq,
    ) -> GrantedPermissionsResp {
        let policies = match self
            .repo
            .get_applicable_policies(
                cancel,
                GetApplicablePoliciesReq {
                    subject: req.subject.clone(),
                },
            )
            .await
        {
            Ok(resp) => resp.policies,
            Err(error) => {
                return GrantedPermissionsResp {
                    permissions: vec![],
                    error: Some(error),
                }
            }
        };

        let subject_attributes = match self
            .repo
            .get_resource(
                cancel,
                GetResourceReq {
                    resource: req.subject.clone(),
                },
            )
            .await
        {
            Ok(resp) => resp.attributes,
            Err(error) => {
                return GrantedPermissionsResp {
                    permissions: vec![],
                    error: Some(error),
                }
            }
        };

        // Object attribute fetches are memoised per object for the duration
        // of this call.
        let mut object_attributes: HashMap<Resource, Vec<Attribute>> = HashMap::new();
        let mut granted: Vec<GrantedPermission> = Vec::new();
        let mut seen: HashSet<(String, Resource)> = HashSet::new();

        for policy in policies {
            if cancel.is_cancelled() {
                return GrantedPermissionsResp {
                    permissions: granted,
                    error: Some(RhabacError::Cancelled),
                };
            }

            let object = policy.object_scope().clone();
            let attributes = match object_attributes.get(&object) {
                Some(attributes) => attributes.clone(),
                None => {
                    match self
                        .repo
                        .get_resource(
                            cancel,
                            GetResourceReq {
                                resource: object.clone(),
                            },
                        )
                        .await
                    {
                        Ok(resp) => {
                            object_attributes.insert(object.clone(), resp.attributes.clone());
                            resp.attributes
                        }
                        Err(RhabacError::Cancelled) => {
                            return GrantedPermissionsResp {
                                permissions: granted,
                                error: Some(RhabacError::Cancelled),
                            }
                        }
                        Err(error) => {
                            log::warn!("skipping policy {} over {}: {}", policy.permission_name(), object, error);
                            continue;
                        }
                    }
                }
            };

            let hierarchy = match self
                .repo
                .get_permission_hierarchy(
                    cancel,
                    GetPermissionHierarchyReq {
                        subject: req.subject.clone(),
                        object: object.clone(),
                        permission_name: policy.permission_name().to_string(),
                    },
                )
                .await
            {
                Ok(resp) => resp.hierarchy,
                Err(RhabacError::Cancelled) => {
                    return GrantedPermissionsResp {
                        permissions: granted,
                        error: Some(RhabacError::Cancelled),
                    }
                }
                Err(error) => {
                    log::warn!("skipping policy {} over {}: {}", policy.permission_name(), object, error);
                    continue;
                }
            };

            let context = Context::new(subject_attributes.clone(), attributes, req.env.clone());
            if hierarchy.eval(&context).is_allowed()
                && seen.insert((policy.permission_name().to_string(), object.clone()))
            {
                granted.push(GrantedPermission::new(policy.permission_name(), object));
            }
        }

        GrantedPermissionsResp {
            permissions: granted,
            error: None,
        }
    }
}
