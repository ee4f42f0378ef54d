//! Command-line flags.
//!
//! Flag spellings (including the underscores) are what provisioning templates
//! already pass, so they are kept as-is.
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "turbonomic-provision",
    version,
    about = "Create or delete Turbonomic services, groups, and scale policies",
    after_help = "Environment:\n  TURBONOMIC_ENDPOINT, TURBONOMIC_USER, TURBONOMIC_PASSWORD\n\nExamples:\n  turbonomic-provision -g web -T VirtualMachine -t env -v prod\n  turbonomic-provision -s shop -G <vm-group>,<db-server-group>\n  turbonomic-provision -p web-scale -G <vm-group>\n  turbonomic-provision -d -P <policy> -G <group> -S <service>\n\nOn success the ids of created resources are printed to stdout as JSON."
)]
pub struct Args {
    /// Create a service and attach the groups given by --group_ids
    #[arg(short = 's', long = "create_service", value_name = "NAME")]
    pub service_name: Option<String>,

    /// Create a dynamic group whose members match --tag_name=--tag_value
    #[arg(short = 'g', long = "create_group", value_name = "NAME")]
    pub group_name: Option<String>,

    /// Group type: VirtualMachine, Database, or DatabaseServer (any case)
    #[arg(short = 'T', long = "group_type", value_name = "TYPE")]
    pub group_type: Option<String>,

    /// Tag name used to select group members
    #[arg(short = 't', long = "tag_name", value_name = "TAG")]
    pub tag_name: Option<String>,

    /// Tag value used to select group members
    #[arg(short = 'v', long = "tag_value", value_name = "VALUE")]
    pub tag_value: Option<String>,

    /// Create an IA scale-action VM policy scoped to --group_ids
    #[arg(short = 'p', long = "create_vm_policy", value_name = "NAME")]
    pub vm_policy_name: Option<String>,

    /// Delete the resources named by --policy_ids, --group_ids, and --service_ids
    #[arg(short = 'd', long = "delete")]
    pub delete: bool,

    /// Comma-separated service ids (delete mode)
    #[arg(short = 'S', long = "service_ids", value_name = "IDS")]
    pub service_ids: Option<String>,

    /// Comma-separated group ids
    #[arg(short = 'G', long = "group_ids", value_name = "IDS")]
    pub group_ids: Option<String>,

    /// Comma-separated policy ids (delete mode)
    #[arg(short = 'P', long = "policy_ids", value_name = "IDS")]
    pub policy_ids: Option<String>,
}
