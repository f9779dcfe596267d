//! xpdemo - bootstrap a local Crossplane + ArgoCD GitOps demo environment.

use anyhow::Result;
use bootstrap::workflows::{argocd, cluster, crossplane, demo, gitops, teardown};
use bootstrap::{
    check_host_requirements, ChannelProgressReporter, DemoConfig, HostRunner, ProgressReporter,
    TaskExecutor, TemplateRenderer,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(about, version, subcommand_help_heading = "Commands")]
struct Cli {
    /// Path to xpdemo.toml (defaults to the working directory)
    #[arg(long, global = true, value_name = "path")]
    config: Option<PathBuf>,

    /// Kubeconfig override (defaults to the cluster's extract under /tmp)
    #[arg(long, global = true, value_name = "path")]
    kubeconfig: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Check host requirements without changing anything
    Check,

    /// Bring up the whole demo environment
    Up,

    /// kind cluster lifecycle
    Cluster {
        #[command(subcommand)]
        command: ClusterCommand,
    },

    /// Install Crossplane, its packages, and provider configuration
    Crossplane,

    /// ArgoCD installation and access
    Argocd {
        #[command(subcommand)]
        command: ArgocdCommand,
    },

    /// GitOps wiring and repository seeding
    Gitops {
        #[command(subcommand)]
        command: GitopsCommand,
    },

    /// Scripted update/rollback demo
    Demo {
        #[command(subcommand)]
        command: DemoCommand,
    },

    /// Tear the demo environment down
    Down,
}

#[derive(Debug, Clone, Subcommand)]
enum ClusterCommand {
    /// Create the kind cluster and export its kubeconfig
    Create,
    /// Delete the kind cluster
    Delete,
}

#[derive(Debug, Clone, Subcommand)]
enum ArgocdCommand {
    /// Install ArgoCD via Helm
    Install,
    /// Print the initial admin password
    Password,
    /// Start the background port-forward to argocd-server
    Forward,
    /// Stop the background port-forward
    StopForward,
}

#[derive(Debug, Clone, Subcommand)]
enum GitopsCommand {
    /// Apply the repository secret and the ArgoCD Application
    Wire,
    /// Seed the repository with the demo workload
    Seed,
}

#[derive(Debug, Clone, Subcommand)]
enum DemoCommand {
    /// Bump the demo workload image tag and wait for the sync
    Update,
    /// Revert the last commit and wait for the sync
    Rollback,
    /// Update, dwell, rollback
    Cycle,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer().compact();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = DemoConfig::load(cli.config.as_deref())?;

    let kubeconfig = cli
        .kubeconfig
        .clone()
        .unwrap_or_else(|| config.cluster.kubeconfig_path());
    let runner = HostRunner::with_kubeconfig(kubeconfig);
    let renderer = TemplateRenderer::from_embedded()?;
    let executor = TaskExecutor::new(runner.clone(), std::env::temp_dir());

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let reporter = Arc::new(ChannelProgressReporter::new(tx));
    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            match &progress.phase {
                Some(phase) => tracing::info!(
                    "[{:>3}%] {}: {}",
                    progress.percentage,
                    phase,
                    progress.message
                ),
                None => tracing::info!("[{:>3}%] {}", progress.percentage, progress.message),
            }
        }
    });

    match cli.command {
        Command::Check => run_check(),

        Command::Up => {
            run_check()?;

            let progress = phase_progress(reporter.clone(), "cluster", 0, 15);
            cluster::create_cluster(&runner, &renderer, &config.cluster, progress).await?;

            let progress = phase_progress(reporter.clone(), "crossplane", 15, 35);
            crossplane::install_crossplane(&executor, &config.crossplane, progress).await?;

            let progress = phase_progress(reporter.clone(), "packages", 35, 60);
            crossplane::install_packages(
                &executor,
                &renderer,
                &config.crossplane,
                0,
                100,
                progress,
            )
            .await?;
            crossplane::configure_providers(&executor, &renderer, &config.crossplane).await?;

            let progress = phase_progress(reporter.clone(), "argocd", 60, 80);
            argocd::install_argocd(&executor, &config.argocd, progress).await?;

            let password = argocd::initial_admin_password(&runner, &config.argocd).await?;
            argocd::start_port_forward(&runner, &config.argocd).await?;
            argocd::login(&runner, &config.argocd, &password).await;

            let git = config.git_settings()?;
            let progress = phase_progress(reporter.clone(), "gitops", 80, 90);
            gitops::seed_repository(&runner, &renderer, &config.gitops, &git, progress).await?;
            let progress = phase_progress(reporter.clone(), "gitops", 90, 100);
            gitops::wire_application(
                &executor,
                &renderer,
                &config.gitops,
                &config.argocd,
                &git,
                progress,
            )
            .await?;

            tracing::info!(
                "Demo environment is up. ArgoCD UI: https://localhost:{} (admin / see `xpdemo argocd password`)",
                config.argocd.local_port
            );
            Ok(())
        }

        Command::Cluster { command } => match command {
            ClusterCommand::Create => {
                let progress = phase_progress(reporter.clone(), "cluster", 0, 100);
                cluster::create_cluster(&runner, &renderer, &config.cluster, progress).await
            }
            ClusterCommand::Delete => cluster::delete_cluster(&runner, &config.cluster).await,
        }
        .map_err(Into::into),

        Command::Crossplane => {
            let progress = phase_progress(reporter.clone(), "crossplane", 0, 40);
            crossplane::install_crossplane(&executor, &config.crossplane, progress).await?;
            let progress = phase_progress(reporter.clone(), "packages", 40, 100);
            crossplane::install_packages(
                &executor,
                &renderer,
                &config.crossplane,
                0,
                100,
                progress,
            )
            .await?;
            crossplane::configure_providers(&executor, &renderer, &config.crossplane).await?;
            Ok(())
        }

        Command::Argocd { command } => match command {
            ArgocdCommand::Install => {
                let progress = phase_progress(reporter.clone(), "argocd", 0, 100);
                argocd::install_argocd(&executor, &config.argocd, progress).await?;
                Ok(())
            }
            ArgocdCommand::Password => {
                let password = argocd::initial_admin_password(&runner, &config.argocd).await?;
                println!("{password}");
                Ok(())
            }
            ArgocdCommand::Forward => {
                let pid = argocd::start_port_forward(&runner, &config.argocd).await?;
                tracing::info!(
                    "Port-forward running (pid {}), https://localhost:{}",
                    pid,
                    config.argocd.local_port
                );
                Ok(())
            }
            ArgocdCommand::StopForward => {
                argocd::stop_port_forward(&config.argocd)?;
                Ok(())
            }
        },

        Command::Gitops { command } => {
            let git = config.git_settings()?;
            match command {
                GitopsCommand::Wire => {
                    let progress = phase_progress(reporter.clone(), "gitops", 0, 100);
                    gitops::wire_application(
                        &executor,
                        &renderer,
                        &config.gitops,
                        &config.argocd,
                        &git,
                        progress,
                    )
                    .await?;
                }
                GitopsCommand::Seed => {
                    let progress = phase_progress(reporter.clone(), "gitops", 0, 100);
                    gitops::seed_repository(&runner, &renderer, &config.gitops, &git, progress)
                        .await?;
                }
            }
            Ok(())
        }

        Command::Demo { command } => {
            let git = config.git_settings()?;
            match command {
                DemoCommand::Update => {
                    demo::run_update(
                        &runner,
                        &config.gitops,
                        &config.demo,
                        &config.argocd.namespace,
                        &git,
                    )
                    .await?;
                }
                DemoCommand::Rollback => {
                    demo::run_rollback(&runner, &config.gitops, &config.argocd.namespace, &git)
                        .await?;
                }
                DemoCommand::Cycle => {
                    demo::run_cycle(
                        &runner,
                        &config.gitops,
                        &config.demo,
                        &config.argocd.namespace,
                        &git,
                    )
                    .await?;
                }
            }
            Ok(())
        }

        Command::Down => teardown::teardown(&runner, &config).await.map_err(Into::into),
    }
}

fn run_check() -> Result<()> {
    let result = check_host_requirements();
    for check in &result.checks {
        if check.passed {
            tracing::info!("ok: {} - {}", check.name, check.message);
        } else {
            tracing::warn!("FAIL: {} - {}", check.name, check.message);
        }
    }
    if let Some(message) = result.error_message() {
        eprintln!("{message}");
        anyhow::bail!("host requirements not met");
    }
    Ok(())
}

/// Scale a workflow's local 0-100 progress into a slice of the overall bar.
fn phase_progress(
    reporter: Arc<ChannelProgressReporter>,
    phase: &'static str,
    start: u32,
    end: u32,
) -> impl Fn(u32, &str) {
    move |p, message| {
        let span = end.saturating_sub(start);
        let overall = start + span.saturating_mul(p.min(100)) / 100;
        reporter.emit_detailed(
            overall,
            message.to_string(),
            Some(phase.to_string()),
            None,
        );
    }
}
