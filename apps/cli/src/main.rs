//! Provisioner admin CLI.
//!
//! Thin front-end over the core crates: triggers one provisioning workflow
//! run, prints a server record, or runs the boarding validator, then exits.
//! Not a dashboard or a scheduler — per spec §6 "CLI surface", those stay
//! external collaborators; this only drives the library entry points.

use clap::{Parser, Subcommand};
use provisioner_boarding::{all_checks, run_boarding_validation, BoardingContext};
use provisioner_domain::{ServerId, WorkflowId};
use provisioner_ipmi::IpmiCredentials;
use provisioner_strategy::{build_workflow_steps, FirmwareFirstStrategy, ProvisioningStrategy, StandardStrategy};
use provisioner_workflow_engine::{WorkflowContext, WorkflowEngine};

#[derive(Parser)]
#[command(name = "provisioner")]
#[command(about = "Bare-metal provisioning orchestrator admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one provisioning workflow for a server to completion.
    Provision {
        #[arg(long)]
        server_id: String,
        #[arg(long)]
        device_type: String,
        #[arg(long)]
        bmc_ip: Option<String>,
        #[arg(long)]
        gateway: Option<String>,
        /// Use the firmware-first strategy (IPMI configured early, firmware
        /// updated before BIOS settings are applied) instead of standard.
        #[arg(long)]
        firmware_first: bool,
    },
    /// Print the current server record.
    Status {
        #[arg(long)]
        server_id: String,
    },
    /// Run the boarding validator against a server's persisted state.
    BoardingValidate {
        #[arg(long)]
        server_id: String,
        #[arg(long)]
        ipmi_username: Option<String>,
        #[arg(long)]
        ipmi_password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    provisioner_common::init_tracing();
    let cli = Cli::parse();
    let config = provisioner_common::Config::load()?;

    match cli.command {
        Commands::Provision {
            server_id,
            device_type,
            bmc_ip,
            gateway,
            firmware_first,
        } => provision(&config, server_id, device_type, bmc_ip, gateway, firmware_first).await,
        Commands::Status { server_id } => status(&config, server_id).await,
        Commands::BoardingValidate {
            server_id,
            ipmi_username,
            ipmi_password,
        } => boarding_validate(&config, server_id, ipmi_username, ipmi_password).await,
    }
}

async fn provision(
    config: &provisioner_common::Config,
    server_id: String,
    device_type: String,
    bmc_ip: Option<String>,
    gateway: Option<String>,
    firmware_first: bool,
) -> anyhow::Result<()> {
    let runtime = provisioner_common::build_stage_runtime(config, false).await?;
    let server_id = ServerId::new(server_id);
    runtime.store.ensure_server(&server_id).await?;

    let strategy: Box<dyn ProvisioningStrategy> = if firmware_first {
        Box::new(FirmwareFirstStrategy)
    } else {
        Box::new(StandardStrategy)
    };
    let steps = build_workflow_steps(strategy.as_ref(), &runtime);

    let workflow_id = WorkflowId::new();
    let mut context = WorkflowContext::new(workflow_id, server_id, device_type, steps.len() as u32);
    context.target_bmc_ip = bmc_ip;
    context.gateway = gateway;

    let engine = WorkflowEngine::new(steps);
    let outcome = engine.execute(&runtime.store, &mut context).await?;

    println!("workflow {workflow_id} finished: {outcome:?}");
    for sub_task in context.sub_tasks() {
        println!("  - {sub_task}");
    }
    if !context.errors().is_empty() {
        println!("errors:");
        for error in context.errors() {
            println!("  ! {error}");
        }
    }

    Ok(())
}

async fn status(config: &provisioner_common::Config, server_id: String) -> anyhow::Result<()> {
    let pool = provisioner_store::open(&config.store_path).await?;
    let store = provisioner_store::Store::new(pool);
    let server_id = ServerId::new(server_id);

    match store.get_server(&server_id).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("no record for server {server_id}"),
    }

    Ok(())
}

async fn boarding_validate(
    config: &provisioner_common::Config,
    server_id: String,
    ipmi_username: Option<String>,
    ipmi_password: Option<String>,
) -> anyhow::Result<()> {
    let pool = provisioner_store::open(&config.store_path).await?;
    let store = provisioner_store::Store::new(pool);
    let server_id = ServerId::new(server_id);

    let server = store
        .get_server(&server_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no record for server {server_id}"))?;

    let catalog = provisioner_catalog::Catalog::new(config.catalog_path.clone());
    let snapshot = catalog.snapshot().ok();

    let adapter = provisioner_ipmi::IpmiAdapter::new(
        config.ipmi.ipmitool_path.clone(),
        std::time::Duration::from_secs(config.ipmi.command_timeout_secs),
    );
    let creds = server.ipmi_address.clone().map(|bmc_ip| IpmiCredentials {
        bmc_ip,
        username: ipmi_username.unwrap_or_else(|| config.ipmi.default_username.clone()),
        password: ipmi_password.unwrap_or_else(|| config.ipmi.default_password.clone()),
    });

    let mut context = BoardingContext::new(server);
    if let Some(snapshot) = &snapshot {
        context = context.with_catalog(snapshot);
    }
    if let Some(creds) = &creds {
        context = context.with_ipmi(&adapter, creds);
    }

    let checks = all_checks();
    let validation = run_boarding_validation(&checks, &context).await;

    for result in &validation.results {
        println!("[{}] {} ({}): {}", result.status, result.check_name, result.category, result.message);
    }
    let summary = validation.summary();
    println!(
        "overall: {} (pass={} fail={} warning={} skip={})",
        validation.overall_status, summary.passed, summary.failed, summary.warning, summary.skipped
    );

    Ok(())
}
