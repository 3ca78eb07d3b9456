//! Cluster-wide catalog records collected for a backup.
//!
//! Each record is a snapshot of one catalog object and carries the engine's
//! own object identifier. Records are built once per collection call and are
//! never modified afterwards; field names match the column aliases used by
//! the collector queries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Object identifier assigned by the source cluster.
pub type Oid = u32;

/// Name of the filespace every cluster ships with; never backed up.
pub const DEFAULT_FILESPACE: &str = "pg_system";

/// Session-level settings that must be replayed before any DDL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Value of `client_encoding`
    pub client_encoding: String,
    /// Value of `default_with_oids`
    pub default_with_oids: String,
}

/// The database being backed up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseIdentity {
    /// Database oid
    pub oid: Oid,
    /// Quoted database name
    pub name: String,
    /// Quoted name of the default tablespace
    pub tablespace: String,
}

/// Resource queue limits.
///
/// Cost limits are stored as text rounded to two decimals so that the
/// generated DDL is identical across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQueue {
    /// Queue oid
    pub oid: Oid,
    /// Quoted queue name
    pub name: String,
    /// Active statement limit, -1 for none
    pub active_statements: i32,
    /// Cost limit, two decimals
    pub max_cost: String,
    /// Whether queries may exceed the cost limit when the system is idle
    pub cost_overcommit: bool,
    /// Cost below which queries bypass the queue, two decimals
    pub min_cost: String,
    /// Priority setting
    pub priority: String,
    /// Memory limit setting
    pub memory_limit: String,
}

/// Resource group capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    /// Group oid
    pub oid: Oid,
    /// Quoted group name
    pub name: String,
    /// Concurrent transaction limit
    pub concurrency: i32,
    /// CPU share, percent
    pub cpu_rate_limit: i32,
    /// Memory share, percent
    pub memory_limit: i32,
    /// Shared memory quota, percent
    pub memory_shared_quota: i32,
    /// Spill threshold, percent
    pub memory_spill_ratio: i32,
}

/// A login window restriction owned by a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConstraint {
    /// Owning role
    pub oid: Oid,
    /// Day of week the window starts, 0 is Sunday
    pub start_day: i32,
    /// Start time of day
    pub start_time: String,
    /// Day of week the window ends
    pub end_day: i32,
    /// End time of day
    pub end_time: String,
}

/// A cluster role with its attributes and login windows.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role oid
    pub oid: Oid,
    /// Quoted role name
    pub name: String,
    /// SUPERUSER
    pub superuser: bool,
    /// INHERIT
    pub inherit: bool,
    /// CREATEROLE
    pub create_role: bool,
    /// CREATEDB
    pub create_db: bool,
    /// LOGIN
    pub can_login: bool,
    /// Connection limit, -1 for none
    pub connection_limit: i32,
    /// Password hash, empty when the role has none
    pub password: String,
    /// Expiry in UTC with an explicit `-00` offset; empty means no expiry
    pub valid_until: String,
    /// Quoted name of the assigned resource queue
    pub resource_queue: Option<String>,
    /// Only present on clusters with resource groups
    pub resource_group: Option<String>,
    /// May create readable http external tables
    pub create_read_ext_http: bool,
    /// May create readable gpfdist external tables
    pub create_read_ext_gpfdist: bool,
    /// May create writable gpfdist external tables
    pub create_write_ext_gpfdist: bool,
    /// May create readable gphdfs external tables
    #[serde(default)]
    pub create_read_ext_hdfs: bool,
    /// May create writable gphdfs external tables
    #[serde(default)]
    pub create_write_ext_hdfs: bool,
    /// Login windows, empty when unrestricted
    #[serde(default)]
    pub time_constraints: Vec<TimeConstraint>,
}

impl std::fmt::Debug for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = if self.password.is_empty() { "" } else { "****" };
        f.debug_struct("Role")
            .field("oid", &self.oid)
            .field("name", &self.name)
            .field("superuser", &self.superuser)
            .field("inherit", &self.inherit)
            .field("create_role", &self.create_role)
            .field("create_db", &self.create_db)
            .field("can_login", &self.can_login)
            .field("connection_limit", &self.connection_limit)
            .field("password", &password)
            .field("valid_until", &self.valid_until)
            .field("resource_queue", &self.resource_queue)
            .field("resource_group", &self.resource_group)
            .field("create_read_ext_http", &self.create_read_ext_http)
            .field("create_read_ext_gpfdist", &self.create_read_ext_gpfdist)
            .field("create_write_ext_gpfdist", &self.create_write_ext_gpfdist)
            .field("create_read_ext_hdfs", &self.create_read_ext_hdfs)
            .field("create_write_ext_hdfs", &self.create_write_ext_hdfs)
            .field("time_constraints", &self.time_constraints)
            .finish()
    }
}

/// A role membership grant: `member` is a member of `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMember {
    /// Oid of the granted role
    pub role_oid: Oid,
    /// Oid of the member
    pub member_oid: Oid,
    /// Granted role name
    pub role: String,
    /// Member role name
    pub member: String,
    /// Role that made the grant
    pub grantor: String,
    /// Granted WITH ADMIN OPTION
    pub is_admin: bool,
}

/// A user tablespace and the filesystem location it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tablespace {
    /// Tablespace oid
    pub oid: Oid,
    /// Quoted tablespace name
    pub name: String,
    /// Filespace name before 6, directory from 6
    pub filespace: String,
}

/// Everything collected by one run of the global metadata phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMetadata {
    /// Session settings
    pub session: SessionSettings,
    /// Database being backed up
    pub database: DatabaseIdentity,
    /// `SET` statements in catalog order
    pub database_config: Vec<String>,
    /// Resource queues
    pub resource_queues: Vec<ResourceQueue>,
    /// Resource groups, empty before 5
    pub resource_groups: Vec<ResourceGroup>,
    /// Roles with their time constraints
    pub roles: Vec<Role>,
    /// Membership grants ordered by (role, member)
    pub role_members: Vec<RoleMember>,
    /// User tablespaces
    pub tablespaces: Vec<Tablespace>,
}

impl GlobalMetadata {
    /// Per-category object counts for the backup report.
    pub fn object_counts(&self) -> HashMap<String, usize> {
        HashMap::from([
            ("database gucs".to_string(), self.database_config.len()),
            ("resource queues".to_string(), self.resource_queues.len()),
            ("resource groups".to_string(), self.resource_groups.len()),
            ("roles".to_string(), self.roles.len()),
            ("role grants".to_string(), self.role_members.len()),
            ("tablespaces".to_string(), self.tablespaces.len()),
        ])
    }
}
