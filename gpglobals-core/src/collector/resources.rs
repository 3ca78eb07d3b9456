//! Resource queue and resource group collection.

use crate::Result;
use crate::executor::{self, CatalogQuery, QueryExecutor};
use crate::models::{ResourceGroup, ResourceQueue};

/// Cost limits are `real` in the catalog. They are rounded to two decimals
/// and returned as text, the same representation `pg_dumpall` produces.
const RESOURCE_QUEUE_QUERY: &str = r#"
SELECT
	r.oid,
	quote_ident(r.rsqname) AS name,
	r.rsqcountlimit::int AS active_statements,
	ROUND(r.rsqcostlimit::numeric, 2)::text AS max_cost,
	r.rsqovercommit AS cost_overcommit,
	ROUND(r.rsqignorecostlimit::numeric, 2)::text AS min_cost,
	priority_capability.ressetting::text AS priority,
	memory_capability.ressetting::text AS memory_limit
FROM
	pg_resqueue r
		JOIN
		(SELECT resqueueid, ressetting FROM pg_resqueuecapability WHERE restypid = 5) priority_capability
		ON r.oid = priority_capability.resqueueid
	JOIN
		(SELECT resqueueid, ressetting FROM pg_resqueuecapability WHERE restypid = 6) memory_capability
		ON r.oid = memory_capability.resqueueid"#;

/// Capability limit types 1 through 5 are concurrency, cpu rate limit,
/// memory limit, shared quota and spill ratio.
const RESOURCE_GROUP_QUERY: &str = r#"
SELECT g.oid,
	quote_ident(g.rsgname) AS name,
	t1.proposed::int AS concurrency,
	t2.proposed::int AS cpu_rate_limit,
	t3.proposed::int AS memory_limit,
	t4.proposed::int AS memory_shared_quota,
	t5.proposed::int AS memory_spill_ratio
FROM pg_resgroup g,
	pg_resgroupcapability t1,
	pg_resgroupcapability t2,
	pg_resgroupcapability t3,
	pg_resgroupcapability t4,
	pg_resgroupcapability t5
WHERE g.oid = t1.resgroupid AND
	g.oid = t2.resgroupid AND
	g.oid = t3.resgroupid AND
	g.oid = t4.resgroupid AND
	g.oid = t5.resgroupid AND
	t1.reslimittype = 1 AND
	t2.reslimittype = 2 AND
	t3.reslimittype = 3 AND
	t4.reslimittype = 4 AND
	t5.reslimittype = 5"#;

/// Collects all resource queues with their priority and memory capabilities.
pub async fn collect_resource_queues<E>(executor: &E) -> Result<Vec<ResourceQueue>>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Collecting resource queues");
    let query = CatalogQuery::new("resource queues", RESOURCE_QUEUE_QUERY);
    let queues: Vec<ResourceQueue> = executor::select(executor, &query).await?;
    tracing::info!("Collected {} resource queues", queues.len());
    Ok(queues)
}

/// Collects all resource groups with their five capability limits.
pub async fn collect_resource_groups<E>(executor: &E) -> Result<Vec<ResourceGroup>>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Collecting resource groups");
    let query = CatalogQuery::new("resource groups", RESOURCE_GROUP_QUERY);
    let groups: Vec<ResourceGroup> = executor::select(executor, &query).await?;
    tracing::info!("Collected {} resource groups", groups.len());
    Ok(groups)
}
