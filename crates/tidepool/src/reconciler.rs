use crate::error::{Error, ValidationError};
use crate::execute::{ApplyPolicy, ApplyReport, PlanExecutor, apply_plan};
use crate::plan::Plan;
use crate::planner;
use crate::remote::RemoteStateProvider;
use crate::request::{PolicyChangeRequest, RoleChangeRequest, TableChangeRequest};
use tidepool_config::{Capability, Config, ConfigError};
use tidepool_model::{Policy, Project, Role, Table};
use tracing::{debug, warn};

/// Fetches actual state, plans against it and applies the result.
///
/// Every entry point checks the deployment target first and fails with
/// [`Error::UnsupportedInMode`] before touching the remote service.
pub struct Reconciler<P, E> {
    config: Config,
    provider: P,
    executor: E,
}

impl<P, E> Reconciler<P, E> {
    pub fn new(config: Config, provider: P, executor: E) -> Self {
        Self {
            config,
            provider,
            executor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn require(&self, capability: Capability) -> Result<(), Error> {
        let target = self.config.deployment_target;
        if target.permits(capability) {
            Ok(())
        } else {
            Err(Error::UnsupportedInMode { capability, target })
        }
    }

    /// An empty schema is the default `public` one.
    fn require_schema(&self, schema: &str) -> Result<(), Error> {
        let schema = if schema.is_empty() { "public" } else { schema };
        if self.config.schemas().contains(&schema) {
            Ok(())
        } else {
            Err(Error::UnmanagedSchema {
                schema: schema.to_string(),
            })
        }
    }
}

impl<P: RemoteStateProvider, E: PlanExecutor> Reconciler<P, E> {
    /// Look up the configured project on the hosted platform.
    pub async fn find_project(&self) -> Result<Project, Error> {
        self.require(Capability::ProjectDiscovery)?;
        let id = self
            .config
            .project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid("project_id is required for project discovery".to_string())
            })?;
        let project = self
            .provider
            .fetch_project(id)
            .await?
            .ok_or_else(|| Error::ProjectNotFound { id: id.to_string() })?;
        if let Some(expected) = &self.config.project_name {
            if *expected != project.name {
                warn!(
                    id,
                    %expected,
                    found = %project.name,
                    "project name does not match the configuration"
                );
            }
        }
        Ok(project)
    }

    /// Plan a table against its deployed version, or its creation when it is
    /// not deployed. The fetched snapshot replaces `request.old`.
    pub async fn plan_table(
        &self,
        desired: &Table,
        request: TableChangeRequest,
    ) -> Result<Plan, Error> {
        self.require(Capability::TableReconciliation)?;
        if desired.name.trim().is_empty() {
            return Err(ValidationError::EmptyTableName.into());
        }
        self.require_schema(&desired.schema)?;

        let (schema, name) = if request.old.name.is_empty() {
            (desired.schema.as_str(), desired.name.as_str())
        } else {
            (request.old.schema.as_str(), request.old.name.as_str())
        };
        match self.provider.fetch_table(schema, name).await? {
            None => {
                debug!(schema, name, "table is not deployed, planning its creation");
                Ok(planner::plan_create_table(desired)?)
            }
            Some(actual) => {
                let request = TableChangeRequest {
                    old: actual,
                    ..request
                };
                Ok(planner::plan_table_changes(desired, &request)?)
            }
        }
    }

    pub async fn plan_role(&self, desired: &Role, request: RoleChangeRequest) -> Result<Plan, Error> {
        self.require(Capability::RoleReconciliation)?;
        if desired.name.trim().is_empty() {
            return Err(ValidationError::EmptyRoleName.into());
        }

        let name = if request.old.name.is_empty() {
            desired.name.as_str()
        } else {
            request.old.name.as_str()
        };
        match self.provider.fetch_role(name).await? {
            None => {
                debug!(name, "role is not deployed, planning its creation");
                Ok(planner::plan_create_role(desired)?)
            }
            Some(actual) => {
                let request = RoleChangeRequest {
                    old: actual,
                    ..request
                };
                Ok(planner::plan_role_changes(desired, &request)?)
            }
        }
    }

    pub async fn plan_policy(
        &self,
        desired: &Policy,
        request: PolicyChangeRequest,
    ) -> Result<Plan, Error> {
        self.require(Capability::PolicyReconciliation)?;
        if desired.name.trim().is_empty() {
            return Err(ValidationError::EmptyPolicyName.into());
        }
        self.require_schema(&desired.schema)?;

        let request = if request.name.is_empty() {
            PolicyChangeRequest {
                name: desired.name.clone(),
                ..request
            }
        } else {
            request
        };
        let name = request.name.as_str();
        let deployed = self
            .provider
            .fetch_policy(&desired.schema, &desired.table, name)
            .await?;
        match deployed {
            None => {
                debug!(name, "policy is not deployed, planning its creation");
                Ok(planner::plan_create_policy(desired)?)
            }
            Some(_) => Ok(planner::plan_policy_changes(desired, &request)?),
        }
    }

    pub async fn sync_table(
        &mut self,
        desired: &Table,
        request: TableChangeRequest,
    ) -> Result<ApplyReport, Error> {
        let plan = self.plan_table(desired, request).await?;
        Ok(self.apply(&plan).await)
    }

    pub async fn sync_role(
        &mut self,
        desired: &Role,
        request: RoleChangeRequest,
    ) -> Result<ApplyReport, Error> {
        let plan = self.plan_role(desired, request).await?;
        Ok(self.apply(&plan).await)
    }

    pub async fn sync_policy(
        &mut self,
        desired: &Policy,
        request: PolicyChangeRequest,
    ) -> Result<ApplyReport, Error> {
        let plan = self.plan_policy(desired, request).await?;
        Ok(self.apply(&plan).await)
    }

    /// Apply a plan, halting on the first failure unless the config says otherwise.
    pub async fn apply(&mut self, plan: &Plan) -> ApplyReport {
        let policy = ApplyPolicy::from_halt_on_error(self.config.halt_on_error());
        apply_plan(plan, &mut self.executor, policy).await
    }
}
