use crate::associations::{plan_reconciliation, Relation};
use crate::error::Error;
use crate::requests::{
    ContactFields, DeploymentFields, EntityRequest, EquipmentFields, ExtractMode, FieldSet,
    FileFields, FileRequest, MooringFields, OrganizationFields,
};
use crate::storage::statement::{id_set, id_set_value};
use crate::storage::{QueryExecutor, Statement};
use rusqlite::types::Value;
use std::collections::BTreeSet;
use tracing::info;

/// Scalar fields of a login account that an update may change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFields {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<i64>,
    pub password_expired: Option<bool>,
}

impl FieldSet for UserFields {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        if let Some(email) = &self.email {
            out.push(("email", Value::Text(email.clone())));
        }
        if let Some(hash) = &self.password_hash {
            out.push(("password", Value::Text(hash.clone())));
        }
        if let Some(role) = self.role {
            out.push(("role", Value::Integer(role)));
        }
        if let Some(expired) = self.password_expired {
            out.push(("password_expired", Value::Integer(expired as i64)));
        }
        out
    }
}

/// An edit of one entity: its identity, scalar payload and requested links.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityUpdate {
    Contact {
        id: i64,
        fields: ContactFields,
    },
    Deployment {
        id: i64,
        fields: DeploymentFields,
        contact_ids: BTreeSet<i64>,
        organization_ids: BTreeSet<i64>,
    },
    Equipment {
        id: i64,
        fields: EquipmentFields,
    },
    File {
        ids: Vec<i64>,
        fields: FileFields,
    },
    Mooring {
        id: i64,
        fields: MooringFields,
        equipment_ids: BTreeSet<i64>,
    },
    Organization {
        id: i64,
        fields: OrganizationFields,
        contact_ids: BTreeSet<i64>,
        deployment_ids: BTreeSet<i64>,
        equipment_ids: BTreeSet<i64>,
    },
    User {
        id: i64,
        fields: UserFields,
    },
}

impl EntityUpdate {
    /// Pair an extracted edit submission with the entity it targets. File updates
    /// target the submitted indexes rather than `id`.
    ///
    /// Creation payloads are rejected: their association sets were never collected,
    /// and applying them would unlink every member of `id`.
    pub fn from_request(id: i64, request: EntityRequest) -> Result<Self, Error> {
        if request.mode() == Some(ExtractMode::Strict) {
            return Err(Error::Validation(
                "a creation submission cannot update an existing record".to_string(),
            ));
        }
        Ok(match request {
            EntityRequest::Contact(_, fields) => EntityUpdate::Contact { id, fields },
            EntityRequest::Deployment(_, req) => EntityUpdate::Deployment {
                id,
                fields: req.fields,
                contact_ids: req.contact_ids,
                organization_ids: req.organization_ids,
            },
            EntityRequest::Equipment(_, fields) => EntityUpdate::Equipment { id, fields },
            EntityRequest::File(
                FileRequest::Process { indexes, fields } | FileRequest::Edit { indexes, fields },
            ) => EntityUpdate::File { ids: indexes, fields },
            EntityRequest::File(_) => {
                return Err(Error::Validation(
                    "file delete and restore requests do not update records".to_string(),
                ))
            }
            EntityRequest::Mooring(_, req) => EntityUpdate::Mooring {
                id,
                fields: req.fields,
                equipment_ids: req.equipment_ids,
            },
            EntityRequest::Organization(_, req) => EntityUpdate::Organization {
                id,
                fields: req.fields,
                contact_ids: req.contact_ids,
                deployment_ids: req.deployment_ids,
                equipment_ids: req.equipment_ids,
            },
            EntityRequest::User(_) => {
                return Err(Error::Validation(
                    "user authentication requests do not update records".to_string(),
                ))
            }
        })
    }

    fn table(&self) -> &'static str {
        match self {
            EntityUpdate::Contact { .. } => "contact",
            EntityUpdate::Deployment { .. } => "deployment",
            EntityUpdate::Equipment { .. } => "equipment",
            EntityUpdate::File { .. } => "file",
            EntityUpdate::Mooring { .. } => "mooring",
            EntityUpdate::Organization { .. } => "organization",
            EntityUpdate::User { .. } => "app_user",
        }
    }

    fn target_ids(&self) -> Vec<i64> {
        match self {
            EntityUpdate::File { ids, .. } => ids.clone(),
            EntityUpdate::Contact { id, .. }
            | EntityUpdate::Deployment { id, .. }
            | EntityUpdate::Equipment { id, .. }
            | EntityUpdate::Mooring { id, .. }
            | EntityUpdate::Organization { id, .. }
            | EntityUpdate::User { id, .. } => vec![*id],
        }
    }

    fn assignments(&self) -> Vec<(&'static str, Value)> {
        match self {
            EntityUpdate::Contact { fields, .. } => fields.assignments(),
            EntityUpdate::Deployment { fields, .. } => fields.assignments(),
            EntityUpdate::Equipment { fields, .. } => fields.assignments(),
            EntityUpdate::File { fields, .. } => fields.assignments(),
            EntityUpdate::Mooring { fields, .. } => fields.assignments(),
            EntityUpdate::Organization { fields, .. } => fields.assignments(),
            EntityUpdate::User { fields, .. } => fields.assignments(),
        }
    }

    fn relations(&self) -> Vec<(Relation, i64, &BTreeSet<i64>)> {
        match self {
            EntityUpdate::Deployment {
                id,
                contact_ids,
                organization_ids,
                ..
            } => vec![
                (Relation::DeploymentContact, *id, contact_ids),
                (Relation::DeploymentOrganization, *id, organization_ids),
            ],
            EntityUpdate::Mooring {
                id, equipment_ids, ..
            } => vec![(Relation::MooringEquipment, *id, equipment_ids)],
            EntityUpdate::Organization {
                id,
                contact_ids,
                deployment_ids,
                equipment_ids,
                ..
            } => vec![
                (Relation::OrganizationContact, *id, contact_ids),
                (Relation::OrganizationDeployment, *id, deployment_ids),
                (Relation::OrganizationEquipment, *id, equipment_ids),
            ],
            _ => Vec::new(),
        }
    }
}

/// `UPDATE table SET ... WHERE id IN (...)`, or nothing when no field was submitted.
pub fn scalar_update_statement(
    table: &str,
    assignments: Vec<(&'static str, Value)>,
    ids: &[i64],
) -> Option<Statement> {
    if assignments.is_empty() || ids.is_empty() {
        return None;
    }
    let set_clause = assignments
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let mut params: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
    let id_param = params.len() + 1;
    params.push(id_set_value(ids));
    Some(Statement::new(
        format!(
            "UPDATE {} SET {} WHERE id IN {}",
            table,
            set_clause,
            id_set(id_param)
        ),
        params,
    ))
}

/// Association deltas against the live store, followed by the scalar update.
pub fn update_statements<Q: QueryExecutor + ?Sized>(
    db: &Q,
    update: &EntityUpdate,
) -> Result<Vec<Statement>, Error> {
    let mut batch = Vec::new();
    for (relation, owner_id, requested) in update.relations() {
        batch.extend(plan_reconciliation(db, relation, owner_id, requested)?);
    }
    if let Some(statement) =
        scalar_update_statement(update.table(), update.assignments(), &update.target_ids())
    {
        batch.push(statement);
    }
    Ok(batch)
}

/// Apply one entity edit as a single transaction. Returns rows changed.
pub fn apply_update<Q: QueryExecutor + ?Sized>(db: &Q, update: &EntityUpdate) -> Result<usize, Error> {
    let batch = update_statements(db, update)?;
    let changed = db.execute_all(&batch)?;
    info!(
        "Updated {} {:?}: {} statements, {} rows",
        update.table(),
        update.target_ids(),
        batch.len(),
        changed
    );
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_update_statement_numbering() {
        let statement = scalar_update_statement(
            "file",
            vec![
                ("description", Value::Text("CTD cast".to_string())),
                ("comments", Value::Null),
            ],
            &[3, 4],
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE file SET description = ?1, comments = ?2 \
             WHERE id IN (SELECT value FROM json_each(?3))"
        );
        assert_eq!(statement.params.len(), 3);
    }

    #[test]
    fn test_no_fields_means_no_scalar_update() {
        assert!(scalar_update_statement("deployment", vec![], &[1]).is_none());
    }
}
