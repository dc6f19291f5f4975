use clap::Args;

#[derive(Debug, PartialEq, Eq, Args)]
#[command(next_help_heading = "Maintenance Options")]
pub struct MaintenanceOptions {
    /// Don't maintain the CustomResourceDefinitions (CRDs) this controller is responsible for.
    ///
    /// Maintenance includes creating the CRD initially and adding new versions. Turning this off
    /// can be desirable to reduce the RBAC permissions of the controller.
    ///
    /// WARNING: If you disable CRD maintenance you are responsible for maintaining it, including,
    /// but not limited to, the points above.
    #[arg(long, env)]
    pub disable_crd_maintenance: bool,
}
