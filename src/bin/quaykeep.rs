use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use quaykeep::{
    error::Result,
    mirror::MirrorClient,
    reconcile::{Params, Reconciler, State},
    repository::RepositoryClient,
    spec::{ExternalRegistryConfig, MirrorSpec, Proxy, RepoKind, RootRule, Visibility},
    transport::DEFAULT_ENDPOINT,
    RepoName,
};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(version, about = "Declarative repository and mirror management for Quay registries")]
struct Opt {
    #[command(flatten)]
    connection: Connection,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Connection {
    /// Quay API endpoint
    #[arg(long, global = true, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// OAuth token. Falls back to QUAY_API_KEY, QUAY_API_TOKEN,
    /// QUAY_OAUTH_TOKEN or QUAY_AUTH_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Evaluate without mutating the registry
    #[arg(long, global = true)]
    check: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage repositories
    #[command(subcommand)]
    Repo(RepoCommand),

    /// Manage repository mirrors
    #[command(subcommand)]
    Mirror(MirrorCommand),
}

#[derive(Debug, Subcommand)]
enum RepoCommand {
    /// Ensure the repository exists
    Present {
        /// Qualified name, `namespace/repository`
        name: String,

        #[arg(long, default_value = "public")]
        visibility: Visibility,

        #[arg(long = "kind", default_value = "image")]
        repo_kind: RepoKind,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Ensure the repository does not exist
    Absent { name: String },

    /// List repositories visible to the current user
    List,

    /// Change the visibility of a repository
    Visibility {
        name: String,
        visibility: Visibility,
    },

    /// Change the content-trust flag of a repository
    Trust {
        name: String,

        /// Turn content trust off instead of on
        #[arg(long)]
        disable: bool,
    },

    /// Update the description of a repository
    Describe { name: String, description: String },
}

#[derive(Debug, Subcommand)]
enum MirrorCommand {
    /// Enable mirroring of an external repository
    Enable {
        name: String,

        /// Location to mirror, e.g. docker.io/library/alpine
        #[arg(long)]
        external_reference: String,

        /// Comma-separated tag globs to sync
        #[arg(long)]
        rule_value: String,

        #[arg(long, default_value = quaykeep::spec::DEFAULT_RULE_TYPE)]
        rule_type: String,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        robot: Option<String>,

        /// Seconds between syncs
        #[arg(long)]
        sync_interval: Option<u64>,

        /// First sync time, RFC 3339
        #[arg(long)]
        sync_start_date: Option<DateTime<Utc>>,

        #[arg(long)]
        https_proxy: Option<String>,

        #[arg(long)]
        http_proxy: Option<String>,

        #[arg(long)]
        no_proxy: Option<String>,
    },

    /// Disable mirroring
    Disable { name: String },

    /// Show the mirror configuration
    Show { name: String },
}

fn main() {
    env_logger::init();
    let opt = Opt::parse();
    if let Err(e) = run(opt) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    let params = Params {
        auth: opt.connection.token.clone(),
        endpoint: opt.connection.endpoint.clone(),
        timeout: Duration::from_secs(opt.connection.timeout),
        check_mode: opt.connection.check,
        ..Default::default()
    };
    let reconciler = Reconciler::connect(&params)?;

    match opt.command {
        Command::Repo(RepoCommand::Present {
            name,
            visibility,
            repo_kind,
            description,
        }) => {
            let params = Params {
                name,
                state: State::Present,
                visibility,
                repo_kind,
                description,
                ..params
            };
            print_json(&reconciler.run(&params)?)
        }

        Command::Repo(RepoCommand::Absent { name }) => {
            let params = Params {
                name,
                state: State::Absent,
                ..params
            };
            print_json(&reconciler.run(&params)?)
        }

        Command::Repo(RepoCommand::List) => {
            let repos = RepositoryClient::new(reconciler.transport());
            print_json(&repos.list_all()?)
        }

        Command::Repo(RepoCommand::Visibility { name, visibility }) => {
            let repos = RepositoryClient::new(reconciler.transport());
            print_json(&repos.change_visibility(&RepoName::parse(&name)?, visibility)?)
        }

        Command::Repo(RepoCommand::Trust { name, disable }) => {
            let repos = RepositoryClient::new(reconciler.transport());
            print_json(&repos.change_trust(&RepoName::parse(&name)?, !disable)?)
        }

        Command::Repo(RepoCommand::Describe { name, description }) => {
            let repos = RepositoryClient::new(reconciler.transport());
            print_json(&repos.update_description(&RepoName::parse(&name)?, &description)?)
        }

        Command::Mirror(MirrorCommand::Enable {
            name,
            external_reference,
            rule_value,
            rule_type,
            username,
            password,
            robot,
            sync_interval,
            sync_start_date,
            https_proxy,
            http_proxy,
            no_proxy,
        }) => {
            let proxy = if https_proxy.is_some() || http_proxy.is_some() || no_proxy.is_some() {
                Some(Proxy {
                    https_proxy,
                    http_proxy,
                    no_proxy,
                })
            } else {
                None
            };
            let params = Params {
                name,
                state: State::Enabled,
                mirror: MirrorSpec {
                    external_reference: Some(external_reference),
                    root_rule: Some(RootRule {
                        rule_type,
                        rule_value,
                    }),
                    external_registry_username: username,
                    external_registry_password: password,
                    robot_username: robot,
                    sync_interval,
                    sync_start_date,
                    external_registry_config: proxy
                        .map(|proxy| ExternalRegistryConfig { proxy: Some(proxy) }),
                    ..Default::default()
                },
                ..params
            };
            print_json(&reconciler.run(&params)?)
        }

        Command::Mirror(MirrorCommand::Disable { name }) => {
            let params = Params {
                name,
                state: State::Disabled,
                ..params
            };
            print_json(&reconciler.run(&params)?)
        }

        Command::Mirror(MirrorCommand::Show { name }) => {
            let mirrors = MirrorClient::new(reconciler.transport());
            print_json(&mirrors.fetch(&RepoName::parse(&name)?)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
