//! Read operations against Neo4j.
//!
//! Entities are addressed by their internal `id()`, which is what the
//! keyset cursors page over.

use neo4rs::{query, Row};

use cleaner_core::{Node, NodeId, Relationship, RelationshipId};

use crate::client::{GraphClient, Neo4jTxn};
use crate::store::GraphError;

impl GraphClient {
    /// Count all committed nodes.
    pub async fn count_nodes(&self) -> Result<u64, GraphError> {
        let q = query("MATCH (n) RETURN count(n) AS cnt");
        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0) as u64),
            None => Ok(0),
        }
    }

    /// Count all committed relationships.
    pub async fn count_relationships(&self) -> Result<u64, GraphError> {
        let q = query("MATCH ()-[r]->() RETURN count(r) AS cnt");
        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0) as u64),
            None => Ok(0),
        }
    }
}

impl Neo4jTxn {
    pub(crate) async fn fetch_relationships_after(
        &mut self,
        after: Option<RelationshipId>,
        limit: usize,
    ) -> Result<Vec<Relationship>, GraphError> {
        let q = query(
            "MATCH (a)-[r]->(b)
             WHERE id(r) > $after
             RETURN id(r) AS id, id(a) AS source, id(b) AS target, type(r) AS rel_type
             ORDER BY id(r)
             LIMIT $limit",
        )
        .param("after", after.map_or(-1, |id| id.0 as i64))
        .param("limit", limit as i64);

        self.rows(q)
            .await?
            .iter()
            .map(|row| {
                Ok(Relationship {
                    id: RelationshipId(get_id(row, "id")?),
                    source: NodeId(get_id(row, "source")?),
                    target: NodeId(get_id(row, "target")?),
                    rel_type: row
                        .get::<String>("rel_type")
                        .map_err(|e| GraphError::Serialization(format!("rel_type: {e}")))?,
                })
            })
            .collect()
    }

    pub(crate) async fn fetch_nodes_after(
        &mut self,
        after: Option<NodeId>,
        limit: usize,
    ) -> Result<Vec<Node>, GraphError> {
        let q = query(
            "MATCH (n)
             WHERE id(n) > $after
             RETURN id(n) AS id, labels(n) AS labels
             ORDER BY id(n)
             LIMIT $limit",
        )
        .param("after", after.map_or(-1, |id| id.0 as i64))
        .param("limit", limit as i64);

        self.rows(q)
            .await?
            .iter()
            .map(|row| {
                Ok(Node {
                    id: NodeId(get_id(row, "id")?),
                    labels: row.get::<Vec<String>>("labels").unwrap_or_default(),
                })
            })
            .collect()
    }

    pub(crate) async fn find_reference_node(&mut self) -> Result<Option<NodeId>, GraphError> {
        let Some(label) = self.reference_label.clone() else {
            return Ok(None);
        };
        let cypher = format!(
            "MATCH (n:`{label}`)
             RETURN id(n) AS id
             ORDER BY id(n)
             LIMIT 1"
        );

        match self.rows(query(&cypher)).await?.first() {
            Some(row) => Ok(Some(NodeId(get_id(row, "id")?))),
            None => Ok(None),
        }
    }
}

/// Read a non-negative internal id column.
pub(crate) fn get_id(row: &Row, column: &str) -> Result<u64, GraphError> {
    let raw = row
        .get::<i64>(column)
        .map_err(|e| GraphError::Serialization(format!("{column}: {e}")))?;
    u64::try_from(raw)
        .map_err(|_| GraphError::Serialization(format!("{column}: negative id {raw}")))
}
