use {
    crate::{
        Attribute, CreateInheritanceRelReq, CreatePolicyReq, CreateResourceReq, DeleteAttributeReq,
        DeleteInheritanceRelReq, DeletePolicyReq, DeleteResourceReq, Distance, Effect, GetApplicablePoliciesReq,
        GetApplicablePoliciesResp, GetPermissionHierarchyReq, GetPermissionHierarchyResp, GetResourceReq,
        GetResourceResp, HierarchyEntry, Origin, PermissionHierarchy, Policy, Priority, PutAttributeReq, Resource,
        RhabacError, RhabacRepo,
    },
    async_trait::async_trait,
    std::{
        collections::{HashMap, HashSet, VecDeque},
        sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    },
    tokio_util::sync::CancellationToken,
};

/// Policies are atomic tuples; the key is everything but the condition.
type PolicyKey = (String, Resource, Resource, Effect);

/// The backing tables: a keyed resource table, the inheritance edge map
/// (`from` to its parents), and the policy table. Everything references
/// resources by `(kind, name)` identity.
#[derive(Debug, Default)]
struct Tables {
    resources: HashMap<Resource, Vec<Attribute>>,
    parents: HashMap<Resource, HashSet<Resource>>,
    policies: HashMap<PolicyKey, Policy>,
}

/// Collapse root aliases onto the root singleton for table access.
fn key(resource: &Resource) -> Resource {
    resource.clone().normalized()
}

fn policy_key(policy: &Policy) -> PolicyKey {
    (
        policy.permission_name().to_string(),
        policy.subject_scope().clone(),
        policy.object_scope().clone(),
        policy.effect(),
    )
}

impl Tables {
    fn contains(&self, resource: &Resource) -> bool {
        resource.is_root() || self.resources.contains_key(resource)
    }

    fn require(&self, resource: &Resource) -> Result<(), RhabacError> {
        if self.contains(resource) {
            Ok(())
        } else {
            Err(RhabacError::NotFound(format!("resource {}", resource)))
        }
    }

    fn create_resource(&mut self, req: CreateResourceReq) -> Result<(), RhabacError> {
        let resource = key(&req.resource);
        if resource.is_root() {
            return Err(RhabacError::Conflict("the root resource always exists".to_string()));
        }
        if self.resources.contains_key(&resource) {
            return Err(RhabacError::Conflict(format!("resource {} already exists", resource)));
        }

        // Fold the initial list through the upsert rule so ids stay unique
        // and the last write wins.
        let mut attributes: Vec<Attribute> = Vec::with_capacity(req.attributes.len());
        for attribute in req.attributes {
            match attributes.iter_mut().find(|a| a.id() == attribute.id()) {
                Some(existing) => *existing = attribute,
                None => attributes.push(attribute),
            }
        }
        self.resources.insert(resource, attributes);
        Ok(())
    }

    fn delete_resource(&mut self, req: DeleteResourceReq) -> Result<(), RhabacError> {
        let resource = key(&req.resource);
        if resource.is_root() {
            return Err(RhabacError::InvalidArgument("the root resource cannot be deleted".to_string()));
        }
        if self.resources.remove(&resource).is_none() {
            return Err(RhabacError::NotFound(format!("resource {}", resource)));
        }

        self.parents.remove(&resource);
        self.parents.retain(|_, tos| {
            tos.remove(&resource);
            !tos.is_empty()
        });
        self.policies.retain(|_, policy| policy.subject_scope() != &resource && policy.object_scope() != &resource);
        Ok(())
    }

    fn get_resource(&self, req: GetResourceReq) -> Result<GetResourceResp, RhabacError> {
        let resource = key(&req.resource);
        self.require(&resource)?;
        Ok(GetResourceResp {
            attributes: self.resources.get(&resource).cloned().unwrap_or_default(),
            resource,
        })
    }

    fn put_attribute(&mut self, req: PutAttributeReq) -> Result<(), RhabacError> {
        let resource = key(&req.resource);
        self.require(&resource)?;
        let attributes = self.resources.entry(resource).or_default();
        match attributes.iter_mut().find(|a| a.id() == req.attribute.id()) {
            Some(existing) => *existing = req.attribute,
            None => attributes.push(req.attribute),
        }
        Ok(())
    }

    fn delete_attribute(&mut self, req: DeleteAttributeReq) -> Result<(), RhabacError> {
        let resource = key(&req.resource);
        self.require(&resource)?;
        let attributes = self.resources.entry(resource.clone()).or_default();
        match attributes.iter().position(|a| a.id() == req.attribute_id) {
            Some(index) => {
                attributes.remove(index);
                Ok(())
            }
            None => Err(RhabacError::NotFound(format!("attribute {} on resource {}", req.attribute_id, resource))),
        }
    }

    fn create_inheritance_rel(&mut self, req: CreateInheritanceRelReq) -> Result<(), RhabacError> {
        let from = key(&req.from);
        let to = key(&req.to);
        self.require(&from)?;
        self.require(&to)?;

        if from == to || self.inherits(&to, &from) {
            return Err(RhabacError::Conflict(format!("inheritance from {} to {} would close a cycle", from, to)));
        }
        if !self.parents.entry(from.clone()).or_default().insert(to.clone()) {
            return Err(RhabacError::Conflict(format!("inheritance from {} to {} already exists", from, to)));
        }
        Ok(())
    }

    fn delete_inheritance_rel(&mut self, req: DeleteInheritanceRelReq) -> Result<(), RhabacError> {
        let from = key(&req.from);
        let to = key(&req.to);
        let removed = match self.parents.get_mut(&from) {
            Some(tos) => tos.remove(&to),
            None => false,
        };
        if !removed {
            return Err(RhabacError::NotFound(format!("inheritance from {} to {}", from, to)));
        }
        if self.parents.get(&from).map(|tos| tos.is_empty()).unwrap_or(false) {
            self.parents.remove(&from);
        }
        Ok(())
    }

    fn create_policy(&mut self, req: CreatePolicyReq) -> Result<(), RhabacError> {
        // Scope resources are registered on first reference, the way a graph
        // MERGE would.
        for scope in [req.policy.subject_scope(), req.policy.object_scope()] {
            if !scope.is_root() {
                self.resources.entry(scope.clone()).or_default();
            }
        }

        let policy_key = policy_key(&req.policy);
        if self.policies.contains_key(&policy_key) {
            return Err(RhabacError::Conflict(format!(
                "policy {} ({} over {}, {}) already exists",
                req.policy.permission_name(),
                req.policy.subject_scope(),
                req.policy.object_scope(),
                req.policy.effect()
            )));
        }
        self.policies.insert(policy_key, req.policy);
        Ok(())
    }

    fn delete_policy(&mut self, req: DeletePolicyReq) -> Result<(), RhabacError> {
        match self.policies.remove(&policy_key(&req.policy)) {
            Some(_) => Ok(()),
            None => Err(RhabacError::NotFound(format!(
                "policy {} ({} over {})",
                req.policy.permission_name(),
                req.policy.subject_scope(),
                req.policy.object_scope()
            ))),
        }
    }

    /// True if `from` reaches `to` through explicit inheritance edges.
    fn inherits(&self, from: &Resource, to: &Resource) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(parents) = self.parents.get(current) {
                stack.extend(parents.iter());
            }
        }
        false
    }

    /// Every ancestor of `start` through inheritance edges and scope
    /// stripping, with the minimal distance each was discovered at. A path
    /// keeps the `Inheritance` origin only while every step is an explicit
    /// edge; at equal hop counts `Inheritance` wins.
    fn ancestors(&self, start: &Resource) -> HashMap<Resource, Distance> {
        let start = key(start);
        let mut best = HashMap::new();
        best.insert(start.clone(), Distance::new(0, Origin::Inheritance));
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let here = best[&current];

            let mut steps: Vec<(Resource, Distance)> = Vec::new();
            if let Some(parents) = self.parents.get(&current) {
                for parent in parents {
                    steps.push((parent.clone(), Distance::new(here.hops() + 1, here.origin())));
                }
            }
            if let Some(parent) = current.scope_parent() {
                steps.push((parent, Distance::new(here.hops() + 1, Origin::Scope)));
            }

            for (ancestor, candidate) in steps {
                let improved = match best.get(&ancestor) {
                    Some(existing) => candidate < *existing,
                    None => true,
                };
                if improved {
                    best.insert(ancestor.clone(), candidate);
                    queue.push_back(ancestor);
                }
            }
        }

        best
    }

    fn permission_hierarchy(&self, req: GetPermissionHierarchyReq) -> Result<GetPermissionHierarchyResp, RhabacError> {
        let subject_ancestors = self.ancestors(&req.subject);
        let object_ancestors = self.ancestors(&req.object);

        let mut entries = Vec::new();
        for policy in self.policies.values() {
            if policy.permission_name() != req.permission_name {
                continue;
            }
            let subject_distance = match subject_ancestors.get(policy.subject_scope()) {
                Some(distance) => *distance,
                None => continue,
            };
            let object_distance = match object_ancestors.get(policy.object_scope()) {
                Some(distance) => *distance,
                None => continue,
            };
            if !self.contains(policy.subject_scope()) || !self.contains(policy.object_scope()) {
                return Err(RhabacError::Internal(format!(
                    "policy {} references a scope missing from the resource table",
                    policy.permission_name()
                )));
            }
            entries.push(HierarchyEntry::new(policy.clone(), Priority::new(subject_distance, object_distance)));
        }

        Ok(GetPermissionHierarchyResp {
            hierarchy: PermissionHierarchy::from_entries(entries),
        })
    }

    fn applicable_policies(&self, req: GetApplicablePoliciesReq) -> GetApplicablePoliciesResp {
        let subject_ancestors = self.ancestors(&req.subject);
        let mut policies: Vec<Policy> = self
            .policies
            .values()
            .filter(|policy| subject_ancestors.contains_key(policy.subject_scope()))
            .cloned()
            .collect();
        policies.sort_by(|a, b| {
            (a.permission_name(), a.object_scope().kind(), a.object_scope().name()).cmp(&(
                b.permission_name(),
                b.object_scope().kind(),
                b.object_scope().name(),
            ))
        });
        GetApplicablePoliciesResp {
            policies,
        }
    }
}

/// An in-memory [RhabacRepo]. Intended for tests and single-process
/// deployments; the production realisation of the contract lives behind a
/// graph database and is an external collaborator.
#[derive(Debug, Default)]
pub struct MemoryRhabacRepo {
    tables: RwLock<Tables>,
}

impl MemoryRhabacRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<Tables>, RhabacError> {
        self.tables.read().map_err(|_| RhabacError::Internal("state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<Tables>, RhabacError> {
        self.tables.write().map_err(|_| RhabacError::Internal("state lock poisoned".to_string()))
    }
}

fn ensure_live(cancel: &CancellationToken) -> Result<(), RhabacError> {
    if cancel.is_cancelled() {
        Err(RhabacError::Cancelled)
    } else {
        Ok(())
    }
}

#[async_trait]
impl RhabacRepo for MemoryRhabacRepo {
    async fn create_resource(&self, cancel: &CancellationToken, req: CreateResourceReq) -> Result<(), RhabacError> {
        ensure_live(cancel)?;
        self.write()?.create_resource(req)
    }

    async fn delete_resource(&self, cancel: &CancellationToken, req: DeleteResourceReq) -> Result<(), RhabacError> {
        ensure_live(cancel)?;
        self.write()?.delete_resource(req)
    }

    async fn get_resource(
        &self,
        cancel: &CancellationToken,
        req: GetResourceReq,
    ) -> Result<GetResourceResp, RhabacError> {
        ensure_live(cancel)?;
        self.read()?.get_resource(req)
    }

    async fn put_attribute(&self, cancel: &CancellationToken, req: PutAttributeReq) -> Result<(), RhabacError> {
        ensure_live(cancel)?;
        self.write()?.put_attribute(req)
    }

    async fn delete_attribute(&self, cancel: &CancellationToken, req: DeleteAttributeReq) -> Result<(), RhabacError> {
        ensure_live(cancel)?;
        self.write()?.delete_attribute(req)
    }

    async fn create_inheritance_rel(
        &self,
        cancel: &CancellationToken,
        req: CreateInheritanceRelReq,
    ) -> Result<(), RhabacError> {
        ensure_live(cancel)?;
        self.write()?.create_inheritance_rel(req)
    }

    async fn delete_inheritance_rel(
        &self,
        cancel: &CancellationToken,
        req: DeleteInheritanceRelReq,
    ) -> Result<(), RhabacError> {
        ensure_live(cancel)?;
        self.write()?.delete_inheritance_rel(req)
    }

    async fn create_policy(&self, cancel: &CancellationToken, req: CreatePolicyReq) -> Result<(), RhabacError> {
        ensure_live(cancel)?;
        self.write()?.create_policy(req)
    }

    async fn delete_policy(&self, cancel: &CancellationToken, req: DeletePolicyReq) -> Result<(), RhabacError> {
        ensure_live(cancel)?;
        self.write()?.delete_policy(req)
    }

    async fn get_permission_hierarchy(
        &self,
        cancel: &CancellationToken,
        req: GetPermissionHierarchyReq,
    ) -> Result<GetPermissionHierarchyResp, RhabacError> {
        ensure_live(cancel)?;
        self.read()?.permission_hierarchy(req)
    }

    async fn get_applicable_policies(
        &self,
        cancel: &CancellationToken,
        req: GetApplicablePoliciesReq,
    ) -> Result<GetApplicablePoliciesResp, RhabacError> {
        ensure_live(cancel)?;
        Ok(self.read()?.applicable_policies(req))
    }
}
