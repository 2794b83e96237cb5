use std::collections::BTreeSet;

use datams_core::associations::Relation;
use datams_core::requests::{
    parse_request, EntityRequest, ExtractMode, FileAction, RequestTarget, Submission,
};
use datams_core::storage::{Database, QueryExecutor, Statement};
use datams_core::update::{apply_update, update_statements, EntityUpdate};
use datams_core::Error;
use rusqlite::types::Value;

fn exec(db: &Database, sql: &str) {
    db.execute_all(&[Statement::new(sql, vec![])]).unwrap();
}

/// Three organizations, four contacts, three deployments, three pieces of equipment,
/// one mooring.
fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    exec(&db, "INSERT INTO country (id, name) VALUES (1, 'Canada'), (2, 'Norway')");
    exec(
        &db,
        "INSERT INTO organization (id, name, abbreviation, country_id) VALUES \
         (1, 'Ocean Lab', 'OL', 1), (2, 'Polar Institute', 'PI', 2), (3, 'Spare', 'SP', 1)",
    );
    exec(
        &db,
        "INSERT INTO contact (id, organization_id, first_name) VALUES \
         (1, 1, 'Ada'), (2, 1, 'Ben'), (3, 2, 'Cy'), (4, NULL, 'Di')",
    );
    exec(
        &db,
        "INSERT INTO deployment (id, region, country_id) VALUES \
         (1, 'Beaufort Sea', 1), (2, 'Barents Sea', 2), (3, 'Labrador Sea', 1)",
    );
    exec(
        &db,
        "INSERT INTO deployment_organization (deployment_id, organization_id) VALUES (1, 1), (2, 1), (2, 2)",
    );
    exec(
        &db,
        "INSERT INTO equipment (id, serial_number, item, organization_id) VALUES \
         (1, 'SN-1', 'ADCP', 1), (2, 'SN-2', 'CTD', 2), (3, 'SN-3', 'Hydrophone', NULL)",
    );
    exec(&db, "INSERT INTO mooring (id, deployment_id, comments) VALUES (1, 1, 'first')");
    exec(&db, "INSERT INTO mooring_equipment (mooring_id, equipment_id) VALUES (1, 1)");
    db
}

fn ids(db: &Database, relation: Relation, owner: i64) -> BTreeSet<i64> {
    relation.current_ids(db, owner).unwrap()
}

fn set(values: &[i64]) -> BTreeSet<i64> {
    values.iter().copied().collect()
}

fn organization_edit() -> Submission {
    Submission::new()
        .field("name", "Ocean Lab")
        .field("abbreviation", "OL-2")
        .field("country_id", "1")
        .field("comments", "")
        .field("contact_2", "2")
        .field("contact_4", "4")
        .field("deployment_3", "3")
        .field("equipment_1", "1")
        .field("equipment_3", "3")
}

#[test]
fn test_organization_edit_reconciles_every_relation() {
    let db = seeded();
    let request = parse_request(
        &db,
        RequestTarget::Organization(ExtractMode::Lenient),
        &organization_edit(),
    )
    .unwrap();
    let update = EntityUpdate::from_request(1, request).unwrap();
    apply_update(&db, &update).unwrap();

    assert_eq!(ids(&db, Relation::OrganizationContact, 1), set(&[2, 4]));
    assert_eq!(ids(&db, Relation::OrganizationDeployment, 1), set(&[3]));
    assert_eq!(ids(&db, Relation::OrganizationEquipment, 1), set(&[1, 3]));

    // Other owners keep their links.
    assert_eq!(ids(&db, Relation::OrganizationContact, 2), set(&[3]));
    assert_eq!(ids(&db, Relation::OrganizationDeployment, 2), set(&[2]));
    assert_eq!(ids(&db, Relation::OrganizationEquipment, 2), set(&[2]));

    let abbreviation = db
        .query_first(&Statement::new(
            "SELECT abbreviation FROM organization WHERE id = 1",
            vec![],
        ))
        .unwrap();
    assert_eq!(abbreviation, Some(Value::Text("OL-2".to_string())));
    let comments = db
        .query_first(&Statement::new(
            "SELECT comments FROM organization WHERE id = 1",
            vec![],
        ))
        .unwrap();
    assert_eq!(comments, Some(Value::Null));
}

#[test]
fn test_repeated_edit_emits_only_scalar_update() {
    let db = seeded();
    let request = parse_request(
        &db,
        RequestTarget::Organization(ExtractMode::Lenient),
        &organization_edit(),
    )
    .unwrap();
    let update = EntityUpdate::from_request(1, request).unwrap();
    apply_update(&db, &update).unwrap();

    let again = update_statements(&db, &update).unwrap();
    assert_eq!(again.len(), 1);
    assert!(again[0].sql.starts_with("UPDATE organization SET"));
}

#[test]
fn test_deployment_edit_replaces_contacts_and_organizations() {
    let db = seeded();
    exec(&db, "INSERT INTO deployment_contact (deployment_id, contact_id) VALUES (2, 1), (2, 3)");
    let submission = Submission::new()
        .field("region", "Barents Sea")
        .field("country_id", "2")
        .field("comments", "re-surveyed")
        .field("contact_3", "3")
        .field("contact_4", "4")
        .field("organization_id_2", "2");

    let request =
        parse_request(&db, RequestTarget::Deployment(ExtractMode::Lenient), &submission).unwrap();
    let update = EntityUpdate::from_request(2, request).unwrap();
    let statements = update_statements(&db, &update).unwrap();
    // contacts: delete {1}, insert {4}; organizations: delete {1}; scalar update
    assert_eq!(statements.len(), 4);

    apply_update(&db, &update).unwrap();
    assert_eq!(ids(&db, Relation::DeploymentContact, 2), set(&[3, 4]));
    assert_eq!(ids(&db, Relation::DeploymentOrganization, 2), set(&[2]));
    assert_eq!(ids(&db, Relation::DeploymentOrganization, 1), set(&[1]));
}

#[test]
fn test_mooring_edit_updates_equipment_links() {
    let db = seeded();
    let submission = Submission::new()
        .field("deployment_id", "1")
        .field("deployed", "2023-08-01T12:00")
        .field("recovered", "2024-08-01 09:30:00")
        .field("timezone", "-7")
        .field("latitude", "71.25")
        .field("longitude", "-152.5")
        .field("seafloor_depth", "")
        .field("line_length", "120")
        .field("comments", "swapped ADCP")
        .field("equipment_2", "2")
        .field("equipment_3", "3");

    let request =
        parse_request(&db, RequestTarget::Mooring(ExtractMode::Lenient), &submission).unwrap();
    apply_update(&db, &EntityUpdate::from_request(1, request).unwrap()).unwrap();

    assert_eq!(ids(&db, Relation::MooringEquipment, 1), set(&[2, 3]));
    let deployed = db
        .query_first(&Statement::new("SELECT deployed FROM mooring WHERE id = 1", vec![]))
        .unwrap();
    assert_eq!(deployed, Some(Value::Integer(1_690_891_200)));
}

#[test]
fn test_contact_edit_without_avatar_keeps_existing() {
    let db = seeded();
    exec(&db, "UPDATE contact SET avatar = x'89504e47' WHERE id = 1");
    let submission = Submission::new()
        .field("organization_id", "2")
        .field("position", "Technician")
        .field("first_name", "Ada")
        .field("last_name", "Lovelace")
        .field("email", "ada@example.org")
        .field("phone", "")
        .field("comments", "");

    let request =
        parse_request(&db, RequestTarget::Contact(ExtractMode::Lenient), &submission).unwrap();
    apply_update(&db, &EntityUpdate::from_request(1, request).unwrap()).unwrap();

    let table = db
        .query_table(&Statement::new(
            "SELECT organization_id, avatar, phone FROM contact WHERE id = 1",
            vec![],
        ))
        .unwrap();
    assert_eq!(
        table.rows[0],
        vec![
            Value::Integer(2),
            Value::Blob(vec![0x89, 0x50, 0x4e, 0x47]),
            Value::Null
        ]
    );
}

#[test]
fn test_strict_extraction_lists_missing_fields() {
    let db = seeded();
    let submission = Submission::new().field("name", "New Org");
    let err = parse_request(&db, RequestTarget::Organization(ExtractMode::Strict), &submission)
        .unwrap_err();
    match err {
        Error::MissingRequiredData(missing) => {
            assert_eq!(missing, vec!["abbreviation", "comments", "country_id"]);
        }
        other => panic!("expected missing data, got {:?}", other),
    }
}

#[test]
fn test_strict_deployment_takes_next_id() {
    let db = seeded();
    let submission = Submission::new()
        .field("region", "Chukchi Sea")
        .field("country_id", "1")
        .field("comments", "");
    match parse_request(&db, RequestTarget::Deployment(ExtractMode::Strict), &submission).unwrap() {
        EntityRequest::Deployment(mode, request) => {
            assert_eq!(mode, ExtractMode::Strict);
            assert_eq!(request.id, Some(4));
        }
        other => panic!("unexpected request {:?}", other),
    }
}

#[test]
fn test_file_processing_attaches_to_mooring_equipment() {
    let db = seeded();
    exec(&db, "INSERT INTO file (id, path) VALUES (10, '/data/a.nc'), (11, '/data/b.nc')");
    exec(&db, "UPDATE file SET organization_id = 1 WHERE id = 10");
    let submission = Submission::new()
        .field("ftype", "netcdf")
        .field("indexes", "[10, 11]")
        .field("uploads_id", "batch-7")
        .field("description", "ADCP velocities")
        .field("comments", "")
        .field("level", "mooring_equipment")
        .field("mooring_id", "1")
        .field("equipment_id", "1");

    let request =
        parse_request(&db, RequestTarget::File(FileAction::Process), &submission).unwrap();
    let update = EntityUpdate::from_request(0, request).unwrap();
    assert_eq!(apply_update(&db, &update).unwrap(), 2);

    let link = db
        .query_first(&Statement::new(
            "SELECT id FROM mooring_equipment WHERE mooring_id = 1 AND equipment_id = 1",
            vec![],
        ))
        .unwrap();
    let table = db
        .query_table(&Statement::new(
            "SELECT organization_id, mooring_equipment_id FROM file ORDER BY id",
            vec![],
        ))
        .unwrap();
    for row in &table.rows {
        assert_eq!(row[0], Value::Null);
        assert_eq!(Some(row[1].clone()), link);
    }
}

#[test]
fn test_failed_update_leaves_store_untouched() {
    let db = seeded();
    let update = EntityUpdate::Mooring {
        id: 1,
        fields: Default::default(),
        equipment_ids: set(&[99]),
    };
    assert!(apply_update(&db, &update).is_err());
    assert_eq!(ids(&db, Relation::MooringEquipment, 1), set(&[1]));
}

#[test]
fn test_creation_submission_cannot_update_links() {
    let db = seeded();
    let submission = Submission::new()
        .field("name", "Ocean Lab")
        .field("abbreviation", "OL")
        .field("country_id", "1")
        .field("comments", "");
    let request =
        parse_request(&db, RequestTarget::Organization(ExtractMode::Strict), &submission).unwrap();
    assert_eq!(request.mode(), Some(ExtractMode::Strict));

    let err = EntityUpdate::from_request(1, request).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(ids(&db, Relation::OrganizationContact, 1), set(&[1, 2]));
    assert_eq!(ids(&db, Relation::OrganizationDeployment, 1), set(&[1, 2]));
}
