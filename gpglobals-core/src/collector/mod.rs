//! Global (cluster-wide) metadata collection.
//!
//! # Module Structure
//! - `database`: session settings, database identity and database-level config
//! - `resources`: resource queues and resource groups
//! - `roles`: roles, their time constraints, and role memberships
//! - `tablespaces`: user tablespaces
//!
//! Every operation takes a live [`QueryExecutor`] and returns fully populated
//! records. Any query failure is returned immediately; there is no retry and
//! no partial result, because DDL generation downstream assumes a complete
//! and consistent catalog snapshot.

mod database;
mod resources;
mod roles;
mod tablespaces;


use crate::Result;
use crate::executor::QueryExecutor;
use crate::models::GlobalMetadata;

pub use database::{
    ConfigOption, collect_database_config, collect_database_identity, collect_session_settings,
    config_statement,
};
pub use resources::{collect_resource_groups, collect_resource_queues};
pub use roles::{collect_role_members, collect_roles, collect_time_constraints};
pub use tablespaces::{collect_tablespaces, is_reserved_location};

/// First version whose catalog has resource groups.
const RESOURCE_GROUP_VERSION: &str = "5";

/// Collects every global object category, in a fixed order.
///
/// The first failing query aborts the whole phase and its error is returned;
/// nothing collected before it is kept.
///
/// # Example
/// ```rust,ignore
/// let connection = GpConnection::connect("postgres://gpadmin@mdw:5432/prod").await?;
/// let globals = collect_globals(&connection).await?;
/// println!("Found {} roles", globals.roles.len());
/// ```
pub async fn collect_globals<E>(executor: &E) -> Result<GlobalMetadata>
where
    E: QueryExecutor + ?Sized,
{
    let start_time = std::time::Instant::now();
    tracing::info!(
        "Starting global metadata collection for database '{}' (Greenplum {})",
        executor.database_name(),
        executor.version()
    );

    let session = collect_session_settings(executor).await?;
    let database = collect_database_identity(executor).await?;
    let database_config = collect_database_config(executor).await?;
    let resource_queues = collect_resource_queues(executor).await?;

    let resource_groups = if executor.version().at_least(RESOURCE_GROUP_VERSION) {
        collect_resource_groups(executor).await?
    } else {
        tracing::debug!(
            "Skipping resource groups: not available before Greenplum {}",
            RESOURCE_GROUP_VERSION
        );
        Vec::new()
    };

    let roles = collect_roles(executor).await?;
    let role_members = collect_role_members(executor).await?;
    let tablespaces = collect_tablespaces(executor).await?;

    tracing::info!(
        "Global metadata collection completed in {:.2}s - found {} roles, {} role grants, {} resource queues, {} resource groups, {} tablespaces",
        start_time.elapsed().as_secs_f64(),
        roles.len(),
        role_members.len(),
        resource_queues.len(),
        resource_groups.len(),
        tablespaces.len()
    );

    Ok(GlobalMetadata {
        session,
        database,
        database_config,
        resource_queues,
        resource_groups,
        roles,
        role_members,
        tablespaces,
    })
}
