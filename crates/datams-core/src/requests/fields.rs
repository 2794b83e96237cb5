use rusqlite::types::Value;
use std::collections::BTreeSet;

/// `None`: not submitted, leave untouched. `Some(None)`: submitted empty, clear it.
pub type Field<T> = Option<Option<T>>;

/// Column assignments a typed payload contributes to an update.
pub trait FieldSet {
    fn assignments(&self) -> Vec<(&'static str, Value)>;

    fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

fn assign<T: Clone + Into<Value>>(out: &mut Vec<(&'static str, Value)>, column: &'static str, field: &Field<T>) {
    match field {
        None => {}
        Some(None) => out.push((column, Value::Null)),
        Some(Some(v)) => out.push((column, v.clone().into())),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFields {
    pub organization_id: Field<i64>,
    pub position: Field<String>,
    pub first_name: Field<String>,
    pub last_name: Field<String>,
    pub email: Field<String>,
    pub phone: Field<String>,
    pub comments: Field<String>,
    pub avatar: Field<Vec<u8>>,
}

impl FieldSet for ContactFields {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "organization_id", &self.organization_id);
        assign(&mut out, "position", &self.position);
        assign(&mut out, "first_name", &self.first_name);
        assign(&mut out, "last_name", &self.last_name);
        assign(&mut out, "email", &self.email);
        assign(&mut out, "phone", &self.phone);
        assign(&mut out, "comments", &self.comments);
        assign(&mut out, "avatar", &self.avatar);
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentFields {
    pub region: Field<String>,
    pub country_id: Field<i64>,
    pub comments: Field<String>,
}

impl FieldSet for DeploymentFields {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "region", &self.region);
        assign(&mut out, "country_id", &self.country_id);
        assign(&mut out, "comments", &self.comments);
        out
    }
}

/// Deployment submission. `id` is assigned only on creation; `contact_ids` is
/// collected only on edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentRequest {
    pub id: Option<i64>,
    pub fields: DeploymentFields,
    pub contact_ids: BTreeSet<i64>,
    pub organization_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentFields {
    pub serial_number: Field<String>,
    pub item: Field<String>,
    pub make: Field<String>,
    pub model: Field<String>,
    pub organization_id: Field<i64>,
    pub status: Field<String>,
    pub comments: Field<String>,
}

impl FieldSet for EquipmentFields {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "serial_number", &self.serial_number);
        assign(&mut out, "item", &self.item);
        assign(&mut out, "make", &self.make);
        assign(&mut out, "model", &self.model);
        assign(&mut out, "organization_id", &self.organization_id);
        assign(&mut out, "status", &self.status);
        assign(&mut out, "comments", &self.comments);
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MooringFields {
    pub deployment_id: Field<i64>,
    pub deployed: Field<i64>,
    pub recovered: Field<i64>,
    pub timezone: Field<f64>,
    pub latitude: Field<f64>,
    pub longitude: Field<f64>,
    pub seafloor_depth: Field<f64>,
    pub line_length: Field<f64>,
    pub comments: Field<String>,
}

impl FieldSet for MooringFields {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "deployment_id", &self.deployment_id);
        assign(&mut out, "deployed", &self.deployed);
        assign(&mut out, "recovered", &self.recovered);
        assign(&mut out, "timezone", &self.timezone);
        assign(&mut out, "latitude", &self.latitude);
        assign(&mut out, "longitude", &self.longitude);
        assign(&mut out, "seafloor_depth", &self.seafloor_depth);
        assign(&mut out, "line_length", &self.line_length);
        assign(&mut out, "comments", &self.comments);
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MooringRequest {
    pub fields: MooringFields,
    pub equipment_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationFields {
    pub name: Field<String>,
    pub abbreviation: Field<String>,
    pub country_id: Field<i64>,
    pub comments: Field<String>,
}

impl FieldSet for OrganizationFields {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "name", &self.name);
        assign(&mut out, "abbreviation", &self.abbreviation);
        assign(&mut out, "country_id", &self.country_id);
        assign(&mut out, "comments", &self.comments);
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationRequest {
    pub fields: OrganizationFields,
    pub contact_ids: BTreeSet<i64>,
    pub deployment_ids: BTreeSet<i64>,
    pub equipment_ids: BTreeSet<i64>,
}

/// Metadata and ownership applied to a set of file records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileFields {
    pub ftype: Field<String>,
    pub uploads_id: Field<String>,
    pub description: Field<String>,
    pub comments: Field<String>,
    pub uploaded: Field<i64>,
    pub organization_id: Field<i64>,
    pub deployment_id: Field<i64>,
    pub mooring_equipment_id: Field<i64>,
}

impl FieldSet for FileFields {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        assign(&mut out, "ftype", &self.ftype);
        assign(&mut out, "uploads_id", &self.uploads_id);
        assign(&mut out, "description", &self.description);
        assign(&mut out, "comments", &self.comments);
        assign(&mut out, "uploaded", &self.uploaded);
        assign(&mut out, "organization_id", &self.organization_id);
        assign(&mut out, "deployment_id", &self.deployment_id);
        assign(&mut out, "mooring_equipment_id", &self.mooring_equipment_id);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileRequest {
    Process {
        indexes: Vec<i64>,
        fields: FileFields,
    },
    Edit {
        indexes: Vec<i64>,
        fields: FileFields,
    },
    Delete {
        ftype: Option<String>,
        indexes: Vec<i64>,
        uploads_id: Option<String>,
    },
    Restore {
        indexes: Vec<i64>,
        uploads_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRequest {
    Auth {
        email: String,
        password: String,
    },
    PasswordReset {
        username: String,
        current_password: String,
        new_password: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignments_skip_absent_and_null_cleared() {
        let fields = DeploymentFields {
            region: Some(Some("Chukchi Sea".to_string())),
            country_id: None,
            comments: Some(None),
        };
        assert_eq!(
            fields.assignments(),
            vec![
                ("region", Value::Text("Chukchi Sea".to_string())),
                ("comments", Value::Null),
            ]
        );
    }

    #[test]
    fn test_default_fields_are_empty() {
        assert!(MooringFields::default().is_empty());
        assert!(ContactFields::default().is_empty());
    }
}
