use crate::error::Error;
use crate::storage::statement::{id_set, id_set_value};
use crate::storage::{QueryExecutor, Statement};
use rusqlite::types::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Every editable relationship between two entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    DeploymentContact,
    DeploymentOrganization,
    MooringEquipment,
    OrganizationContact,
    OrganizationEquipment,
    OrganizationDeployment,
}

/// How a relation is persisted.
#[derive(Debug, Clone, Copy)]
enum Link {
    /// A join table row per pair.
    Join {
        table: &'static str,
        owner: &'static str,
        member: &'static str,
    },
    /// A nullable foreign key on the member row pointing at its single owner.
    ForeignKey {
        table: &'static str,
        column: &'static str,
    },
}

impl Relation {
    fn link(self) -> Link {
        match self {
            Relation::DeploymentContact => Link::Join {
                table: "deployment_contact",
                owner: "deployment_id",
                member: "contact_id",
            },
            Relation::DeploymentOrganization => Link::Join {
                table: "deployment_organization",
                owner: "deployment_id",
                member: "organization_id",
            },
            Relation::MooringEquipment => Link::Join {
                table: "mooring_equipment",
                owner: "mooring_id",
                member: "equipment_id",
            },
            Relation::OrganizationDeployment => Link::Join {
                table: "deployment_organization",
                owner: "organization_id",
                member: "deployment_id",
            },
            Relation::OrganizationContact => Link::ForeignKey {
                table: "contact",
                column: "organization_id",
            },
            Relation::OrganizationEquipment => Link::ForeignKey {
                table: "equipment",
                column: "organization_id",
            },
        }
    }

    pub fn current_ids_statement(self, owner_id: i64) -> Statement {
        let sql = match self.link() {
            Link::Join {
                table,
                owner,
                member,
            } => format!("SELECT {member} FROM {table} WHERE {owner} = ?1 ORDER BY {member}"),
            Link::ForeignKey { table, column } => {
                format!("SELECT id FROM {table} WHERE {column} = ?1 ORDER BY id")
            }
        };
        Statement::new(sql, vec![Value::Integer(owner_id)])
    }

    /// The live member set for an owner.
    pub fn current_ids<Q: QueryExecutor + ?Sized>(
        self,
        db: &Q,
        owner_id: i64,
    ) -> Result<BTreeSet<i64>, Error> {
        db.query_ids(&self.current_ids_statement(owner_id))
    }
}

/// Previous and requested member sets for one relation of one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationDiff {
    pub previous: BTreeSet<i64>,
    pub requested: BTreeSet<i64>,
}

impl AssociationDiff {
    pub fn new(previous: BTreeSet<i64>, requested: BTreeSet<i64>) -> Self {
        Self {
            previous,
            requested,
        }
    }

    pub fn to_remove(&self) -> Vec<i64> {
        self.previous.difference(&self.requested).copied().collect()
    }

    pub fn to_add(&self) -> Vec<i64> {
        self.requested.difference(&self.previous).copied().collect()
    }

    pub fn is_noop(&self) -> bool {
        self.previous == self.requested
    }
}

/// Incremental statements turning `diff.previous` into `diff.requested`.
///
/// Removals are a single statement scoped to the owner; additions are one insert per
/// join row, or one foreign-key assignment covering every added member.
pub fn reconcile_statements(relation: Relation, owner_id: i64, diff: &AssociationDiff) -> Vec<Statement> {
    let to_remove = diff.to_remove();
    let to_add = diff.to_add();
    let mut batch = Vec::new();

    match relation.link() {
        Link::Join {
            table,
            owner,
            member,
        } => {
            if !to_remove.is_empty() {
                let params = vec![Value::Integer(owner_id), id_set_value(&to_remove)];
                batch.push(Statement::new(
                    format!(
                        "DELETE FROM {table} WHERE {owner} = ?1 AND {member} IN {}",
                        id_set(2)
                    ),
                    params,
                ));
            }
            for id in &to_add {
                batch.push(Statement::new(
                    format!("INSERT INTO {table} ({owner}, {member}) VALUES (?1, ?2)"),
                    vec![Value::Integer(owner_id), Value::Integer(*id)],
                ));
            }
        }
        Link::ForeignKey { table, column } => {
            if !to_remove.is_empty() {
                let params = vec![Value::Integer(owner_id), id_set_value(&to_remove)];
                batch.push(Statement::new(
                    format!(
                        "UPDATE {table} SET {column} = NULL WHERE {column} = ?1 AND id IN {}",
                        id_set(2)
                    ),
                    params,
                ));
            }
            if !to_add.is_empty() {
                let params = vec![Value::Integer(owner_id), id_set_value(&to_add)];
                batch.push(Statement::new(
                    format!("UPDATE {table} SET {column} = ?1 WHERE id IN {}", id_set(2)),
                    params,
                ));
            }
        }
    }

    debug!(
        "{:?} owner {}: -{} +{}",
        relation,
        owner_id,
        to_remove.len(),
        to_add.len()
    );
    batch
}

/// Fetch the live member set and plan the statements reaching `requested`.
pub fn plan_reconciliation<Q: QueryExecutor + ?Sized>(
    db: &Q,
    relation: Relation,
    owner_id: i64,
    requested: &BTreeSet<i64>,
) -> Result<Vec<Statement>, Error> {
    let previous = relation.current_ids(db, owner_id)?;
    let diff = AssociationDiff::new(previous, requested.clone());
    Ok(reconcile_statements(relation, owner_id, &diff))
}

/// Reconcile one relation in its own transaction. Returns rows changed.
pub fn reconcile<Q: QueryExecutor + ?Sized>(
    db: &Q,
    relation: Relation,
    owner_id: i64,
    requested: &BTreeSet<i64>,
) -> Result<usize, Error> {
    let batch = plan_reconciliation(db, relation, owner_id, requested)?;
    db.execute_all(&batch)
}
