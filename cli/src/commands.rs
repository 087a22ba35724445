pub mod deploy;
pub mod destroy;
pub mod outputs;
pub mod plan;
pub mod status;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Compose the deployment and print the template, without touching AWS
    Plan(plan::PlanCommand),

    /// Upload the code and create or update the stack
    Deploy(deploy::DeployCommand),

    /// Status of the latest stack operation
    Status(status::StatusCommand),

    /// Values assigned by AWS, e.g. endpoints and ARNs
    Outputs(outputs::OutputsCommand),

    /// [DANGER] Delete the stack and everything in it
    Destroy(destroy::DestroyCommand),
}
