//! Write operations against Neo4j.
//!
//! Deletes run inside a [`Neo4jTxn`] and report whether the entity was still
//! there. The node delete performs its own referential check first, so a
//! node with remaining relationships surfaces as
//! [`GraphError::DanglingRelationships`] rather than a driver error.

use neo4rs::query;

use cleaner_core::{NodeId, RelationshipId};

use crate::client::{GraphClient, Neo4jTxn};
use crate::queries::get_id;
use crate::store::GraphError;

impl Neo4jTxn {
    pub(crate) async fn delete_relationship_by_id(
        &mut self,
        id: RelationshipId,
    ) -> Result<bool, GraphError> {
        let q = query(
            "MATCH ()-[r]->() WHERE id(r) = $id
             DELETE r
             RETURN count(*) AS deleted",
        )
        .param("id", id.0 as i64);

        let deleted = self.count_column(q, "deleted").await?;
        self.removed.relationships += deleted;
        Ok(deleted > 0)
    }

    pub(crate) async fn delete_node_by_id(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let check = query(
            "MATCH (n) WHERE id(n) = $id
             OPTIONAL MATCH (n)-[r]-()
             RETURN count(r) AS degree",
        )
        .param("id", id.0 as i64);

        let rows = self.rows(check).await?;
        let Some(row) = rows.first() else {
            return Ok(false);
        };
        let degree = get_id(row, "degree")?;
        if degree > 0 {
            return Err(GraphError::DanglingRelationships { node: id, degree });
        }

        let q = query(
            "MATCH (n) WHERE id(n) = $id
             DELETE n
             RETURN count(*) AS deleted",
        )
        .param("id", id.0 as i64);

        let deleted = self.count_column(q, "deleted").await?;
        self.removed.nodes += deleted;
        Ok(deleted > 0)
    }

    pub(crate) async fn clear_properties_by_id(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let q = query(
            "MATCH (n) WHERE id(n) = $id
             SET n = {}
             RETURN count(*) AS cleared",
        )
        .param("id", id.0 as i64);

        Ok(self.count_column(q, "cleared").await? > 0)
    }

    async fn count_column(&mut self, q: neo4rs::Query, column: &str) -> Result<u64, GraphError> {
        match self.rows(q).await?.first() {
            Some(row) => get_id(row, column),
            None => Ok(0),
        }
    }
}

impl GraphClient {
    /// Create a node with the given labels and return its internal id.
    pub async fn create_node(&self, labels: &[&str]) -> Result<NodeId, GraphError> {
        let label_clause: String = labels.iter().map(|l| format!(":`{l}`")).collect();
        let cypher = format!("CREATE (n{label_clause}) RETURN id(n) AS id");

        match self.query_one(query(&cypher)).await? {
            Some(row) => Ok(NodeId(get_id(&row, "id")?)),
            None => Err(GraphError::Serialization("CREATE returned no row".into())),
        }
    }

    /// Create a relationship between two existing nodes.
    pub async fn create_relationship(
        &self,
        source: NodeId,
        target: NodeId,
        rel_type: &str,
    ) -> Result<RelationshipId, GraphError> {
        let cypher = format!(
            "MATCH (a) WHERE id(a) = $source
             MATCH (b) WHERE id(b) = $target
             CREATE (a)-[r:`{rel_type}`]->(b)
             RETURN id(r) AS id"
        );
        let q = query(&cypher)
            .param("source", source.0 as i64)
            .param("target", target.0 as i64);

        match self.query_one(q).await? {
            Some(row) => Ok(RelationshipId(get_id(&row, "id")?)),
            None => Err(GraphError::NodeNotFound(source)),
        }
    }
}
