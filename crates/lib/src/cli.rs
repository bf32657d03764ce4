//! CLI argument definitions and dispatch

use clap::Parser;

use amicycle_utils::output;

use crate::error::{Error, Result};
use crate::service::ImageService;

/// Lifecycle management for EC2 machine images (AMIs)
#[derive(Debug, Parser)]
#[clap(name = "amicycle", version)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub(crate) cmd: Cmd,
}

/// Image lifecycle commands
#[derive(Debug, clap::Subcommand, PartialEq)]
pub(crate) enum Cmd {
    /// Create an AMI of the given EC2 instance
    Create(CreateOpts),
    /// Delete AMIs of the given EC2 instance by age, honoring a
    /// minimum retention count
    Delete(DeleteOpts),
    /// Report a metric to CloudWatch
    Report(ReportOpts),
    /// Print the version of amicycle
    Version,
}

/// Options for creating an image
#[derive(Debug, Parser, PartialEq, Eq)]
pub(crate) struct CreateOpts {
    /// The AWS region to use (e.g. us-west-2)
    #[clap(long)]
    pub(crate) region: Option<String>,

    /// The id of the EC2 instance from which to create the AMI
    #[clap(long)]
    pub(crate) instance_id: Option<String>,

    /// The name (from tags) of the EC2 instance from which to create the AMI
    #[clap(long)]
    pub(crate) instance_name: Option<String>,

    /// The name of the AMI; the current timestamp will be automatically appended
    #[clap(long)]
    pub(crate) ami_name: Option<String>,

    /// Execute a simulated run; nothing is actually created
    #[clap(long)]
    pub(crate) dry_run: bool,

    /// If true, do not reboot the instance before creating the AMI.
    /// Rebooting guarantees a consistent filesystem, but the likelihood
    /// of an inconsistent snapshot is very low.
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) no_reboot: bool,
}

/// Options for pruning images
#[derive(Debug, Parser, PartialEq, Eq)]
pub(crate) struct DeleteOpts {
    /// The AWS region to use (e.g. us-west-2)
    #[clap(long)]
    pub(crate) region: Option<String>,

    /// The id of the EC2 instance whose AMIs should be pruned
    #[clap(long)]
    pub(crate) instance_id: Option<String>,

    /// The name (from tags) of the EC2 instance whose AMIs should be pruned
    #[clap(long)]
    pub(crate) instance_name: Option<String>,

    /// Delete AMIs older than the specified age; accepts formats like '30d' or '4h'
    #[clap(long)]
    pub(crate) older_than: Option<String>,

    /// Never delete AMIs such that fewer than this number remain
    #[clap(long, default_value_t = 0)]
    pub(crate) require_at_least: u32,

    /// Execute a simulated run; lists AMIs to be deleted without deleting them
    #[clap(long)]
    pub(crate) dry_run: bool,
}

/// Options for reporting a metric
#[derive(Debug, Parser, PartialEq)]
pub(crate) struct ReportOpts {
    /// The AWS region to use (e.g. us-west-2)
    #[clap(long)]
    pub(crate) region: Option<String>,

    /// The CloudWatch namespace for this metric (e.g. MyCustomMetrics)
    #[clap(long)]
    pub(crate) namespace: Option<String>,

    /// The name of the metric (e.g. MyEC2Backup)
    #[clap(long)]
    pub(crate) name: Option<String>,

    /// The value of the metric
    #[clap(long, default_value_t = crate::report::DEFAULT_METRIC_VALUE)]
    pub(crate) value: f64,

    /// The unit of the metric
    #[clap(long, default_value = crate::report::DEFAULT_METRIC_UNIT)]
    pub(crate) unit: String,
}

/// The instance an operation applies to: exactly one of an id or a
/// Name tag, per the CLI contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum InstanceTarget {
    /// A literal instance id.
    Id(String),
    /// A Name tag, resolved to exactly one id at run time.
    Name(String),
}

impl InstanceTarget {
    /// Resolve this target to a concrete instance id.
    pub(crate) async fn resolve(&self, images: &dyn ImageService) -> Result<String> {
        match self {
            InstanceTarget::Id(id) => Ok(id.clone()),
            InstanceTarget::Name(name) => {
                let id = images.resolve_instance_name(name).await?;
                output(format!("==> Resolved instance name \"{name}\" to {id}"));
                Ok(id)
            }
        }
    }
}

/// Validated arguments for `create`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CreateArgs {
    pub(crate) region: String,
    pub(crate) target: InstanceTarget,
    pub(crate) ami_name: String,
    pub(crate) dry_run: bool,
    pub(crate) no_reboot: bool,
}

/// Validated arguments for `delete`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DeleteArgs {
    pub(crate) region: String,
    pub(crate) target: InstanceTarget,
    pub(crate) older_than: String,
    pub(crate) require_at_least: u32,
    pub(crate) dry_run: bool,
}

/// Validated arguments for `report`.
#[derive(Debug, PartialEq)]
pub(crate) struct ReportArgs {
    pub(crate) region: String,
    pub(crate) namespace: String,
    pub(crate) name: String,
    pub(crate) value: f64,
    pub(crate) unit: String,
}

fn require(value: &Option<String>, flag: &str) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Validation(format!("the argument '--{flag}' is required")))
}

fn instance_target(id: &Option<String>, name: &Option<String>) -> Result<InstanceTarget> {
    match (id, name) {
        (Some(id), None) => Ok(InstanceTarget::Id(id.clone())),
        (None, Some(name)) => Ok(InstanceTarget::Name(name.clone())),
        _ => Err(Error::Validation(
            "you must specify exactly one of '--instance-id' or '--instance-name'".to_owned(),
        )),
    }
}

impl CreateOpts {
    /// Check the semantic argument constraints and normalize.
    pub(crate) fn validated(&self) -> Result<CreateArgs> {
        Ok(CreateArgs {
            region: require(&self.region, "region")?,
            target: instance_target(&self.instance_id, &self.instance_name)?,
            ami_name: require(&self.ami_name, "ami-name")?,
            dry_run: self.dry_run,
            no_reboot: self.no_reboot,
        })
    }
}

impl DeleteOpts {
    /// Check the semantic argument constraints and normalize.
    pub(crate) fn validated(&self) -> Result<DeleteArgs> {
        Ok(DeleteArgs {
            region: require(&self.region, "region")?,
            target: instance_target(&self.instance_id, &self.instance_name)?,
            older_than: require(&self.older_than, "older-than")?,
            require_at_least: self.require_at_least,
            dry_run: self.dry_run,
        })
    }
}

impl ReportOpts {
    /// Check the semantic argument constraints and normalize.
    pub(crate) fn validated(&self) -> Result<ReportArgs> {
        Ok(ReportArgs {
            region: require(&self.region, "region")?,
            namespace: require(&self.namespace, "namespace")?,
            name: require(&self.name, "name")?,
            value: self.value,
            unit: self.unit.clone(),
        })
    }
}

/// Parse the process arguments and execute the selected subcommand.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Create(opts) => crate::create::run(&opts).await,
        Cmd::Delete(opts) => crate::delete::run(&opts).await,
        Cmd::Report(opts) => crate::report::run(&opts).await,
        Cmd::Version => {
            output(format!(
                "You are running {} version {}.",
                amicycle_utils::NAME,
                env!("CARGO_PKG_VERSION")
            ));
            Ok(())
        }
    }
}
