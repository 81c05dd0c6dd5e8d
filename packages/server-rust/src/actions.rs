//! [`MeshActions`] backed by the `helm` and `kubectl` command-line tools.

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use nsm_adapter_core::{
    ActionFailure, ActionResult, AdapterError, MeshActions, SmiTestOptions, Status,
};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Chart repository serving the NSM charts.
pub const DEFAULT_HELM_REPO: &str = "https://helm.nsm.dev/";

/// Release and chart name of the NSM control plane.
const MESH_RELEASE: &str = "nsm";

/// One program run: binary, arguments and optional stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl Invocation {
    fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    fn with_stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }
}

/// Arguments installing (`helm upgrade --install`) or removing
/// (`helm uninstall`) a release.
#[must_use]
pub fn helm_release_args(
    release: &str,
    chart: &str,
    repo: &str,
    version: &str,
    namespace: &str,
    delete: bool,
) -> Vec<String> {
    let args: Vec<&str> = if delete {
        vec!["uninstall", release, "--namespace", namespace]
    } else {
        vec![
            "upgrade",
            "--install",
            release,
            chart,
            "--repo",
            repo,
            "--version",
            version,
            "--namespace",
            namespace,
            "--create-namespace",
        ]
    };
    args.into_iter().map(String::from).collect()
}

/// Arguments applying or deleting `source` (a path, URL or `-` for stdin).
#[must_use]
pub fn kubectl_manifest_args(namespace: &str, source: &str, delete: bool) -> Vec<String> {
    let verb = if delete { "delete" } else { "apply" };
    [verb, "-n", namespace, "-f", source]
        .into_iter()
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// CommandActions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CommandActions {
    helm: String,
    kubectl: String,
    helm_repo: String,
}

impl CommandActions {
    /// Runs `helm` and `kubectl` from `PATH`, pulling charts from `helm_repo`.
    #[must_use]
    pub fn new(helm_repo: impl Into<String>) -> Self {
        Self {
            helm: "helm".to_string(),
            kubectl: "kubectl".to_string(),
            helm_repo: helm_repo.into(),
        }
    }

    /// Overrides the programs invoked for helm and kubectl.
    #[must_use]
    pub fn with_programs(mut self, helm: impl Into<String>, kubectl: impl Into<String>) -> Self {
        self.helm = helm.into();
        self.kubectl = kubectl.into();
        self
    }

    fn helm_release(
        &self,
        release: &str,
        chart: &str,
        version: &str,
        namespace: &str,
        delete: bool,
    ) -> Invocation {
        Invocation::new(
            &self.helm,
            helm_release_args(release, chart, &self.helm_repo, version, namespace, delete),
        )
    }

    fn kubectl_manifest(&self, namespace: &str, source: &str, delete: bool) -> Invocation {
        Invocation::new(&self.kubectl, kubectl_manifest_args(namespace, source, delete))
    }
}

impl Default for CommandActions {
    fn default() -> Self {
        Self::new(DEFAULT_HELM_REPO)
    }
}

#[async_trait]
impl MeshActions for CommandActions {
    #[instrument(skip(self))]
    async fn install_nsm_mesh(&self, delete: bool, version: &str, namespace: &str) -> ActionResult {
        let invocation = self.helm_release(MESH_RELEASE, MESH_RELEASE, version, namespace, delete);
        run(&invocation)
            .await
            .map_err(|err| ActionFailure::new(Status::installing(delete), err))?;
        Ok(Status::installed(delete))
    }

    #[instrument(skip(self))]
    async fn install_sample_app(
        &self,
        namespace: &str,
        delete: bool,
        templates: &[String],
    ) -> ActionResult {
        for template in templates {
            run(&self.kubectl_manifest(namespace, template, delete))
                .await
                .map_err(|err| ActionFailure::new(Status::deploying(delete), err))?;
        }
        Ok(Status::deployed(delete))
    }

    #[instrument(skip(self, manifest))]
    async fn apply_custom_operation(
        &self,
        namespace: &str,
        manifest: &str,
        delete: bool,
    ) -> ActionResult {
        let invocation = self.kubectl_manifest(namespace, "-", delete).with_stdin(manifest);
        run(&invocation)
            .await
            .map_err(|err| ActionFailure::new(Status::deploying(delete), err))?;
        Ok(Status::deployed(delete))
    }

    #[instrument(skip(self))]
    async fn install_nsm_sample_app(
        &self,
        namespace: &str,
        chart: &str,
        version: &str,
        delete: bool,
    ) -> ActionResult {
        let invocation = self.helm_release(chart, chart, version, namespace, delete);
        run(&invocation)
            .await
            .map_err(|err| ActionFailure::new(Status::installing(delete), err))?;
        Ok(Status::installed(delete))
    }

    #[instrument(skip(self, options), fields(operation_id = %options.operation_id))]
    async fn run_smi_test(&self, options: SmiTestOptions) -> anyhow::Result<String> {
        let invocation = self.kubectl_manifest(&options.namespace, &options.manifest, false);
        Ok(run(&invocation).await?)
    }
}

/// Runs `invocation` to completion and returns its stdout.
async fn run(invocation: &Invocation) -> Result<String, AdapterError> {
    let program = invocation.program.as_str();
    debug!(program, args = ?invocation.args, "running command");

    let mut command = Command::new(program);
    command
        .args(&invocation.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command.stdin(if invocation.stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = command
        .spawn()
        .map_err(|err| AdapterError::command_spawn(program, &err))?;

    if let (Some(input), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
        // A child that exits without reading is judged by its exit status.
        match stdin.write_all(input.as_bytes()).await {
            Err(err) if err.kind() != ErrorKind::BrokenPipe => {
                return Err(AdapterError::command_spawn(program, &err));
            }
            _ => {}
        }
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|err| AdapterError::command_spawn(program, &err))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(AdapterError::command_failed(
            program,
            &output.status.to_string(),
            &String::from_utf8_lossy(&output.stderr),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use nsm_adapter_core::errors::codes;

    use super::*;

    #[test]
    fn helm_install_args() {
        let args = helm_release_args("nsm", "nsm", "https://charts", "v0.2.0", "nsm-system", false);
        assert_eq!(
            args,
            [
                "upgrade",
                "--install",
                "nsm",
                "nsm",
                "--repo",
                "https://charts",
                "--version",
                "v0.2.0",
                "--namespace",
                "nsm-system",
                "--create-namespace",
            ]
        );
    }

    #[test]
    fn helm_uninstall_args() {
        let args = helm_release_args("vpn", "vpn", "https://charts", "v0.2.0", "default", true);
        assert_eq!(args, ["uninstall", "vpn", "--namespace", "default"]);
    }

    #[test]
    fn kubectl_args_follow_delete_flag() {
        assert_eq!(
            kubectl_manifest_args("default", "app.yaml", false),
            ["apply", "-n", "default", "-f", "app.yaml"]
        );
        assert_eq!(
            kubectl_manifest_args("default", "-", true),
            ["delete", "-n", "default", "-f", "-"]
        );
    }

    #[test]
    fn custom_manifest_is_piped_on_stdin() {
        let actions = CommandActions::default();
        let invocation = actions
            .kubectl_manifest("default", "-", false)
            .with_stdin("kind: Namespace");
        assert_eq!(invocation.program, "kubectl");
        assert_eq!(invocation.stdin.as_deref(), Some("kind: Namespace"));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let actions = CommandActions::default().with_programs(
            "nsm-adapter-test-no-such-helm",
            "nsm-adapter-test-no-such-kubectl",
        );

        let failure = actions.install_nsm_mesh(false, "v1", "nsm").await.unwrap_err();

        assert_eq!(failure.status, Status::Installing);
        let err = failure.error.downcast_ref::<AdapterError>().unwrap();
        assert_eq!(err.code, codes::COMMAND_SPAWN);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_command_failure() {
        let actions = CommandActions::default().with_programs("false", "false");

        let failure = actions
            .install_sample_app("default", true, &["app.yaml".to_string()])
            .await
            .unwrap_err();

        assert_eq!(failure.status, Status::Removing);
        let err = failure.error.downcast_ref::<AdapterError>().unwrap();
        assert_eq!(err.code, codes::COMMAND_FAILED);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_commands_report_final_status() {
        let actions = CommandActions::default().with_programs("true", "true");

        assert_eq!(
            actions.install_nsm_mesh(true, "v1", "nsm").await.unwrap(),
            Status::Removed
        );
        assert_eq!(
            actions
                .install_nsm_sample_app("default", "vpn", "v1", false)
                .await
                .unwrap(),
            Status::Installed
        );
        assert_eq!(
            actions
                .apply_custom_operation("default", "kind: Namespace", false)
                .await
                .unwrap(),
            Status::Deployed
        );
    }

    #[tokio::test]
    async fn empty_template_list_deploys_nothing() {
        let actions = CommandActions::default().with_programs("unused", "unused");
        let stat = actions.install_sample_app("default", false, &[]).await.unwrap();
        assert_eq!(stat, Status::Deployed);
    }
}
