//! Idempotent desired-state application.
//!
//! Every reconciliation follows the same shape: check the current server
//! state, mutate if it disagrees with the desired state, then re-read the
//! server state and verify the mutation took effect. Success means
//! "desired state is observably true", not "the mutation request was
//! accepted".

use crate::{
    error::*,
    mirror::MirrorClient,
    repo_name::RepoName,
    repository::RepositoryClient,
    spec::{MirrorSpec, RepoKind, RepoSpec, Visibility},
    transport::{Rest, Transport, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT},
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Environment variables consulted for the API token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &[
    "QUAY_API_KEY",
    "QUAY_API_TOKEN",
    "QUAY_OAUTH_TOKEN",
    "QUAY_AUTH_TOKEN",
];

/// Desired state of the target
///
/// `Present`/`Absent` drive the repository lifecycle, `Enabled`/`Disabled`
/// the mirror configuration of an existing repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Present,
    Absent,
    Enabled,
    Disabled,
}

/// Result of a single reconciliation run
///
/// Always fully populated: a failed run raises an [`Error`] instead of
/// returning a partial outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl Outcome {
    fn unchanged(message: &str) -> Self {
        Outcome {
            changed: false,
            message: message.to_string(),
            data: None,
        }
    }

    fn changed(message: &str, data: Option<Value>) -> Self {
        Outcome {
            changed: true,
            message: message.to_string(),
            data,
        }
    }

    fn noop() -> Self {
        Outcome {
            changed: false,
            message: String::new(),
            data: None,
        }
    }
}

/// Caller-side description of one reconciliation
#[derive(Debug, Clone)]
pub struct Params {
    /// API token; when unset the `TOKEN_ENV_VARS` chain is consulted
    pub auth: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
    /// Qualified `namespace/repository` name of the target
    pub name: String,
    pub state: State,
    /// Explicit namespace, overriding the split of `name`. Must be
    /// supplied together with `repository`.
    pub namespace: Option<String>,
    pub repository: Option<String>,
    pub visibility: Visibility,
    pub repo_kind: RepoKind,
    pub description: String,
    pub mirror: MirrorSpec,
    /// Evaluate without mutating the registry
    pub check_mode: bool,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            auth: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            name: String::new(),
            state: State::default(),
            namespace: None,
            repository: None,
            visibility: Visibility::default(),
            repo_kind: RepoKind::default(),
            description: String::new(),
            mirror: MirrorSpec::default(),
            check_mode: false,
        }
    }
}

/// Resolve the API token from explicit configuration or the environment.
///
/// Resolution order, first match wins: the explicit `auth` value, then
/// each variable of [`TOKEN_ENV_VARS`].
pub fn resolve_token(auth: Option<&str>) -> Result<String> {
    if let Some(token) = auth {
        return Ok(token.to_string());
    }
    for var in TOKEN_ENV_VARS {
        if let Ok(token) = std::env::var(var) {
            if !token.is_empty() {
                return Ok(token);
            }
        }
    }
    Err(Error::Validation(format!(
        "API token is required: set `auth` or one of {}",
        TOKEN_ENV_VARS.join(", ")
    )))
}

/// Reconcile the registry to the desired state described by `params`.
///
/// In check mode this returns a no-op outcome before any request is made
/// through `rest`.
pub fn reconcile(params: &Params, rest: &impl Rest) -> Result<Outcome> {
    let repo = resolve_repo_name(params)?;
    if params.state == State::Enabled {
        validate_mirror_params(params)?;
    }
    if params.check_mode {
        log::debug!("check mode, leaving {} untouched", repo);
        return Ok(Outcome::noop());
    }

    let repos = RepositoryClient::new(rest);
    match params.state {
        State::Present => ensure_present(&repos, &repo, params),
        State::Absent => ensure_absent(&repos, &repo),
        State::Enabled => ensure_mirror(&repos, &MirrorClient::new(rest), &repo, params, true),
        State::Disabled => ensure_mirror(&repos, &MirrorClient::new(rest), &repo, params, false),
    }
}

/// A reconciler bound to one registry for the lifetime of a run
///
/// Owns the transport; nothing is shared or cached across instances.
pub struct Reconciler {
    transport: Transport,
}

impl Reconciler {
    /// Resolve the token and connect, probing the API once.
    pub fn connect(params: &Params) -> Result<Self> {
        let token = resolve_token(params.auth.as_deref())?;
        let transport = Transport::with_timeout(&params.endpoint, &token, params.timeout)?;
        Ok(Reconciler { transport })
    }

    pub fn run(&self, params: &Params) -> Result<Outcome> {
        reconcile(params, &self.transport)
    }

    /// The underlying transport, for direct client calls outside a
    /// reconciliation.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

fn resolve_repo_name(params: &Params) -> Result<RepoName> {
    match (params.namespace.as_deref(), params.repository.as_deref()) {
        (Some(namespace), Some(repository)) => RepoName::from_parts(namespace, repository),
        (None, None) if !params.name.is_empty() => RepoName::parse(&params.name),
        (None, None) => Err(Error::Validation("name is required".to_string())),
        _ => Err(Error::Validation(
            "namespace and repository must be supplied together".to_string(),
        )),
    }
}

fn validate_mirror_params(params: &Params) -> Result<()> {
    if params.mirror.external_reference.is_none() {
        return Err(Error::Validation(
            "external_reference is required to enable a mirror".to_string(),
        ));
    }
    if params.mirror.root_rule.is_none() {
        return Err(Error::Validation(
            "root_rule is required to enable a mirror".to_string(),
        ));
    }
    Ok(())
}

fn ensure_present<R: Rest>(
    repos: &RepositoryClient<'_, R>,
    repo: &RepoName,
    params: &Params,
) -> Result<Outcome> {
    if repos.exists(repo)? {
        return Ok(Outcome::unchanged("Repository Already Present!"));
    }
    let spec = RepoSpec {
        namespace: repo.namespace.clone(),
        repository: repo.repository.clone(),
        visibility: params.visibility,
        repo_kind: params.repo_kind,
        description: params.description.clone(),
    };
    let data = repos.create(&spec)?;
    if !repos.exists(repo)? {
        return Err(Error::VerificationFailed("Repository Creation Failed!"));
    }
    log::debug!("created repository {}", repo);
    Ok(Outcome::changed("Repository Created!", data))
}

fn ensure_absent<R: Rest>(repos: &RepositoryClient<'_, R>, repo: &RepoName) -> Result<Outcome> {
    if !repos.exists(repo)? {
        return Ok(Outcome::unchanged("Repository Already Deleted!"));
    }
    let data = repos.delete(repo)?;
    if repos.exists(repo)? {
        return Err(Error::VerificationFailed("Repository Deletion Failed!"));
    }
    log::debug!("deleted repository {}", repo);
    Ok(Outcome::changed("Repository Deleted!", data))
}

fn ensure_mirror<R: Rest>(
    repos: &RepositoryClient<'_, R>,
    mirrors: &MirrorClient<'_, R>,
    repo: &RepoName,
    params: &Params,
    enable: bool,
) -> Result<Outcome> {
    // Mirror reconciliation is never attempted against a repository that
    // does not exist.
    if !repos.exists(repo)? {
        return Err(Error::RepositoryMissing(repo.to_string()));
    }

    let mut spec = params.mirror.clone();
    spec.is_enabled = enable;
    let data = if enable {
        mirrors.create(repo, &spec)?
    } else {
        mirrors.update(repo, &spec)?
    };

    let observed = mirrors.fetch(repo)?;
    let observed_enabled = observed
        .as_ref()
        .and_then(|config| config.get("is_enabled"))
        .and_then(Value::as_bool);
    if observed_enabled != Some(enable) {
        return Err(Error::VerificationFailed(if enable {
            "Mirror Enablement Failed!"
        } else {
            "Mirror Disablement Failed!"
        }));
    }
    Ok(Outcome::changed(
        if enable {
            "Mirror Enabled!"
        } else {
            "Mirror Disabled!"
        },
        data,
    ))
}
