//! Operation handlers: one external action per family, turned into a narrative.
//!
//! `HandlerService` is the innermost `tower::Service<Job>` of the handler
//! pipeline. Each call performs exactly one action routine and maps its result
//! to either a [`Completion`] or a [`HandlerFailure`]. Missing metadata becomes
//! a failure as well, so every job still ends in one terminal event.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use nsm_adapter_core::catalog::properties;
use nsm_adapter_core::{
    names, AdapterError, MeshActions, OperationFamily, OperationMetadata, SmiTestOptions, Status,
};
use tower::Service;

use super::config::AdapterConfig;
use super::operation::{Completion, HandlerFailure, Job};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Completion, HandlerFailure>> + Send>>;

/// Where conformance runs deploy the SMI tool from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmiSettings {
    pub manifest: String,
    pub namespace: String,
}

impl From<&AdapterConfig> for SmiSettings {
    fn from(config: &AdapterConfig) -> Self {
        Self {
            manifest: config.smi_manifest.clone(),
            namespace: config.smi_namespace.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// HandlerService
// ---------------------------------------------------------------------------

/// Runs the action routine matching a job's family.
#[derive(Clone)]
pub struct HandlerService {
    actions: Arc<dyn MeshActions>,
    smi: Arc<SmiSettings>,
}

impl HandlerService {
    #[must_use]
    pub fn new(actions: Arc<dyn MeshActions>, smi: SmiSettings) -> Self {
        Self {
            actions,
            smi: Arc::new(smi),
        }
    }
}

impl Service<Job> for HandlerService {
    type Response = Completion;
    type Error = HandlerFailure;
    type Future = HandlerFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, job: Job) -> Self::Future {
        let actions = Arc::clone(&self.actions);
        let smi = Arc::clone(&self.smi);
        Box::pin(async move {
            let actions = actions.as_ref();
            match job.family {
                OperationFamily::Mesh => install_mesh(actions, &job).await,
                OperationFamily::SampleApp => install_sample_app(actions, &job).await,
                OperationFamily::CustomManifest => apply_custom(actions, &job).await,
                OperationFamily::NsmSampleApp => install_nsm_sample_app(actions, &job).await,
                OperationFamily::SmiConformance => run_conformance(actions, &smi, &job).await,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Metadata lookups
// ---------------------------------------------------------------------------

fn entry<'a>(job: &'a Job, name: &str) -> Result<&'a OperationMetadata, AdapterError> {
    job.operations
        .get(name)
        .ok_or_else(|| AdapterError::missing_metadata(name, "table entry"))
}

/// Version every NSM install uses: the first version listed for the mesh.
fn mesh_version(job: &Job) -> Result<&str, AdapterError> {
    entry(job, names::NSM_MESH)?
        .primary_version()
        .ok_or_else(|| AdapterError::missing_metadata(names::NSM_MESH, "version"))
}

fn app_name<'a>(meta: &'a OperationMetadata, job: &'a Job) -> &'a str {
    meta.property(properties::SERVICE_NAME)
        .unwrap_or_else(|| job.operation_name())
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

async fn install_mesh(actions: &dyn MeshActions, job: &Job) -> Result<Completion, HandlerFailure> {
    let req = &job.request;
    let delete = req.is_delete_operation;
    let version = mesh_version(job).map_err(|err| {
        HandlerFailure::new(
            format!("Error while {} NSM service mesh", Status::installing(delete)),
            err,
        )
    })?;

    match actions.install_nsm_mesh(delete, version, &req.namespace).await {
        Ok(stat) => Ok(Completion {
            summary: format!("NSM service mesh {stat} successfully"),
            details: format!("The NSM service mesh is now {stat}."),
        }),
        Err(failure) => Err(HandlerFailure::new(
            format!("Error while {} NSM service mesh", failure.status),
            failure.error,
        )),
    }
}

async fn install_sample_app(
    actions: &dyn MeshActions,
    job: &Job,
) -> Result<Completion, HandlerFailure> {
    let req = &job.request;
    let delete = req.is_delete_operation;
    let meta = entry(job, job.operation_name()).map_err(|err| {
        HandlerFailure::new(
            format!(
                "Error while {} {} application",
                Status::deploying(delete),
                job.operation_name()
            ),
            err,
        )
    })?;
    let app = app_name(meta, job);

    match actions
        .install_sample_app(&req.namespace, delete, &meta.templates)
        .await
    {
        Ok(stat) => Ok(app_completion(app, stat)),
        Err(failure) => Err(HandlerFailure::new(
            format!("Error while {} {app} application", failure.status),
            failure.error,
        )),
    }
}

async fn apply_custom(actions: &dyn MeshActions, job: &Job) -> Result<Completion, HandlerFailure> {
    let req = &job.request;
    let manifest = req.custom_body.as_deref().unwrap_or_default();

    match actions
        .apply_custom_operation(&req.namespace, manifest, req.is_delete_operation)
        .await
    {
        Ok(_) => Ok(Completion {
            summary: format!("Manifest {} successfully", Status::Deployed),
            details: String::new(),
        }),
        Err(failure) => Err(HandlerFailure::new(
            format!("Error while {} custom operation", failure.status),
            failure.error,
        )),
    }
}

async fn install_nsm_sample_app(
    actions: &dyn MeshActions,
    job: &Job,
) -> Result<Completion, HandlerFailure> {
    let req = &job.request;
    let delete = req.is_delete_operation;
    let missing = |app: &str, err: AdapterError| {
        HandlerFailure::new(
            format!("Error while {} {app} application", Status::installing(delete)),
            err,
        )
    };

    let meta = entry(job, job.operation_name()).map_err(|err| missing(job.operation_name(), err))?;
    let app = app_name(meta, job);
    let version = mesh_version(job).map_err(|err| missing(app, err))?;
    let chart = meta
        .property(properties::HELM_CHART)
        .ok_or_else(|| {
            missing(app, AdapterError::missing_metadata(job.operation_name(), "helm chart"))
        })?;

    match actions
        .install_nsm_sample_app(&req.namespace, chart, version, delete)
        .await
    {
        Ok(stat) => Ok(app_completion(app, stat)),
        Err(failure) => Err(HandlerFailure::new(
            format!("Error while {} {app} application", failure.status),
            failure.error,
        )),
    }
}

async fn run_conformance(
    actions: &dyn MeshActions,
    smi: &SmiSettings,
    job: &Job,
) -> Result<Completion, HandlerFailure> {
    let meta = entry(job, job.operation_name()).map_err(|err| {
        HandlerFailure::new(
            format!("Error while {} {} test", Status::Running, job.operation_name()),
            err,
        )
    })?;
    let name = meta.description.as_str();

    let options = SmiTestOptions {
        operation_id: job.request.operation_id.clone(),
        manifest: smi.manifest.clone(),
        namespace: smi.namespace.clone(),
        labels: Default::default(),
        annotations: Default::default(),
    };

    match actions.run_smi_test(options).await {
        Ok(_) => Ok(Completion {
            summary: format!("{name} test {} successfully", Status::Completed),
            details: String::new(),
        }),
        Err(error) => Err(HandlerFailure::new(
            format!("Error while {} {name} test", Status::Running),
            error,
        )),
    }
}

fn app_completion(app: &str, stat: Status) -> Completion {
    Completion {
        summary: format!("{app} application {stat} successfully"),
        details: format!("The {app} application is now {stat}."),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
