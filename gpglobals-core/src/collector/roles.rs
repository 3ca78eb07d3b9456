//! Role, role time constraint, and role membership collection.

use crate::Result;
use crate::enrichment::{attach_time_constraints, group_time_constraints};
use crate::executor::{self, CatalogQuery, QueryExecutor};
use crate::models::{Role, RoleMember, TimeConstraint};
use crate::version::{GatedFragment, render_fragments};

/// Role columns that only exist on some catalog versions. A column whose
/// gate fails is left out of the query text, not selected as a default.
const VERSIONED_ROLE_COLUMNS: &[GatedFragment] = &[
    GatedFragment::at_least(
        "5",
        "
	(SELECT quote_ident(rsgname) FROM pg_resgroup WHERE pg_resgroup.oid = rolresgroup) AS resource_group,",
    ),
    // gphdfs privileges were dropped from the catalog in 6
    GatedFragment::before(
        "6",
        "
	rolcreaterexthdfs AS create_read_ext_hdfs,
	rolcreatewexthdfs AS create_write_ext_hdfs,",
    ),
];

const TIME_CONSTRAINT_QUERY: &str = r#"
SELECT
	authid AS oid,
	start_day,
	start_time::text AS start_time,
	end_day,
	end_time::text AS end_time
FROM
	pg_auth_time_constraint"#;

const ROLE_MEMBER_QUERY: &str = r#"
SELECT
	roleid AS role_oid,
	member AS member_oid,
	pg_get_userbyid(roleid) AS role,
	pg_get_userbyid(member) AS member,
	pg_get_userbyid(grantor) AS grantor,
	admin_option AS is_admin
FROM pg_auth_members"#;

/// Builds the role query for the cluster's catalog version.
///
/// `rolvaliduntil` is converted to UTC with an explicit `-00` suffix so the
/// timestamp stays unambiguous when replayed in another timezone.
pub(crate) fn roles_query<E>(executor: &E) -> CatalogQuery
where
    E: QueryExecutor + ?Sized,
{
    let versioned_columns = render_fragments(VERSIONED_ROLE_COLUMNS, executor.version());
    CatalogQuery::new(
        "roles",
        format!(
            r#"
SELECT
	oid,
	quote_ident(rolname) AS name,
	rolsuper AS superuser,
	rolinherit AS inherit,
	rolcreaterole AS create_role,
	rolcreatedb AS create_db,
	rolcanlogin AS can_login,
	rolconnlimit AS connection_limit,
	coalesce(rolpassword, '') AS password,
	coalesce(timezone('UTC', rolvaliduntil) || '-00', '') AS valid_until,
	(SELECT quote_ident(rsqname) FROM pg_resqueue WHERE pg_resqueue.oid = rolresqueue) AS resource_queue,{versioned_columns}
	rolcreaterexthttp AS create_read_ext_http,
	rolcreaterextgpfd AS create_read_ext_gpfdist,
	rolcreatewextgpfd AS create_write_ext_gpfdist
FROM
	pg_authid"#
        ),
    )
}

/// Collects every role together with its login time constraints.
///
/// Constraints for all roles are fetched with one query and joined in
/// memory; every returned role carries a (possibly empty) constraint list.
pub async fn collect_roles<E>(executor: &E) -> Result<Vec<Role>>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Collecting roles");
    let mut roles: Vec<Role> = executor::select(executor, &roles_query(executor)).await?;

    let constraints = collect_time_constraints(executor).await?;
    let constraint_count = constraints.len();
    attach_time_constraints(&mut roles, group_time_constraints(constraints));

    tracing::info!(
        "Collected {} roles with {} time constraints",
        roles.len(),
        constraint_count
    );
    Ok(roles)
}

/// Collects the login time constraints of all roles, in catalog order.
pub async fn collect_time_constraints<E>(executor: &E) -> Result<Vec<TimeConstraint>>
where
    E: QueryExecutor + ?Sized,
{
    let query = CatalogQuery::new("role time constraints", TIME_CONSTRAINT_QUERY);
    executor::select(executor, &query).await
}

/// Collects role membership grants ordered by (role oid, member oid).
///
/// The sort is stable, so grants sharing both oids keep their catalog order.
pub async fn collect_role_members<E>(executor: &E) -> Result<Vec<RoleMember>>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Collecting role memberships");
    let query = CatalogQuery::new("role members", ROLE_MEMBER_QUERY);
    let mut members: Vec<RoleMember> = executor::select(executor, &query).await?;
    members.sort_by_key(|grant| (grant.role_oid, grant.member_oid));

    tracing::info!("Collected {} role memberships", members.len());
    Ok(members)
}
