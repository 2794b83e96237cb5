use super::fields::*;
use super::{restricted_characters, ExtractMode, FieldReader, Submission};
use crate::error::Error;
use crate::storage::queries;
use crate::storage::QueryExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Auth,
    PasswordReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Process,
    Edit,
    Delete,
    Restore,
}

/// What a submission is for. Entity kinds that are created or edited carry the
/// extraction mode; users and files carry their own action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTarget {
    Contact(ExtractMode),
    Deployment(ExtractMode),
    Equipment(ExtractMode),
    File(FileAction),
    Mooring(ExtractMode),
    Organization(ExtractMode),
    User(UserAction),
}

/// An extracted submission. Entity kinds keep the mode they were extracted under so a
/// creation payload is never mistaken for an edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRequest {
    Contact(ExtractMode, ContactFields),
    Deployment(ExtractMode, DeploymentRequest),
    Equipment(ExtractMode, EquipmentFields),
    File(FileRequest),
    Mooring(ExtractMode, MooringRequest),
    Organization(ExtractMode, OrganizationRequest),
    User(UserRequest),
}

impl EntityRequest {
    /// Extraction mode for entity kinds; `None` for files and users.
    pub fn mode(&self) -> Option<ExtractMode> {
        match self {
            EntityRequest::Contact(mode, _)
            | EntityRequest::Deployment(mode, _)
            | EntityRequest::Equipment(mode, _)
            | EntityRequest::Mooring(mode, _)
            | EntityRequest::Organization(mode, _) => Some(*mode),
            EntityRequest::File(_) | EntityRequest::User(_) => None,
        }
    }
}

pub fn parse_request<Q: QueryExecutor + ?Sized>(
    db: &Q,
    target: RequestTarget,
    submission: &Submission,
) -> Result<EntityRequest, Error> {
    Ok(match target {
        RequestTarget::Contact(mode) => {
            EntityRequest::Contact(mode, extract_contact(submission, mode)?)
        }
        RequestTarget::Deployment(mode) => {
            EntityRequest::Deployment(mode, extract_deployment(db, submission, mode)?)
        }
        RequestTarget::Equipment(mode) => {
            EntityRequest::Equipment(mode, extract_equipment(submission, mode)?)
        }
        RequestTarget::File(action) => EntityRequest::File(extract_file(db, submission, action)?),
        RequestTarget::Mooring(mode) => {
            EntityRequest::Mooring(mode, extract_mooring(submission, mode)?)
        }
        RequestTarget::Organization(mode) => {
            EntityRequest::Organization(mode, extract_organization(submission, mode)?)
        }
        RequestTarget::User(action) => EntityRequest::User(extract_user(submission, action)?),
    })
}

pub fn extract_contact(submission: &Submission, mode: ExtractMode) -> Result<ContactFields, Error> {
    let reader = FieldReader::new(submission, mode);
    reader.require(
        &[
            "organization_id",
            "position",
            "first_name",
            "last_name",
            "email",
            "phone",
            "comments",
        ],
        &["avatar"],
    )?;
    Ok(ContactFields {
        organization_id: reader.int("organization_id")?,
        position: reader.text("position"),
        first_name: reader.text("first_name"),
        last_name: reader.text("last_name"),
        email: reader.text("email"),
        phone: reader.text("phone"),
        comments: reader.text("comments"),
        avatar: reader.bytes("avatar"),
    })
}

pub fn extract_deployment<Q: QueryExecutor + ?Sized>(
    db: &Q,
    submission: &Submission,
    mode: ExtractMode,
) -> Result<DeploymentRequest, Error> {
    let reader = FieldReader::new(submission, mode);
    reader.require(&["region", "country_id", "comments"], &[])?;
    let fields = DeploymentFields {
        region: reader.text("region"),
        country_id: reader.int("country_id")?,
        comments: reader.text("comments"),
    };
    let organization_ids = reader.ids_with_prefix("organization_id")?;

    Ok(match mode {
        ExtractMode::Lenient => DeploymentRequest {
            id: None,
            fields,
            contact_ids: reader.ids_with_prefix("contact")?,
            organization_ids,
        },
        ExtractMode::Strict => DeploymentRequest {
            id: Some(queries::next_deployment_id(db)?),
            fields,
            contact_ids: Default::default(),
            organization_ids,
        },
    })
}

pub fn extract_equipment(submission: &Submission, mode: ExtractMode) -> Result<EquipmentFields, Error> {
    let reader = FieldReader::new(submission, mode);
    reader.require(
        &[
            "serial_number",
            "item",
            "make",
            "model",
            "organization_id",
            "status",
            "comments",
        ],
        &[],
    )?;
    let fields = EquipmentFields {
        serial_number: reader.text("serial_number"),
        item: reader.text("item"),
        make: reader.text("make"),
        model: reader.text("model"),
        organization_id: reader.int("organization_id")?,
        status: reader.text("status"),
        comments: reader.text("comments"),
    };
    for (name, value) in [("serial_number", &fields.serial_number), ("item", &fields.item)] {
        if let Some(Some(v)) = value {
            if v.contains(',') {
                return Err(Error::Validation(format!(
                    "{} contains comma which is a restricted character and can't be used",
                    name
                )));
            }
        }
    }
    Ok(fields)
}

pub fn extract_mooring(submission: &Submission, mode: ExtractMode) -> Result<MooringRequest, Error> {
    let reader = FieldReader::new(submission, mode);
    reader.require(
        &[
            "deployment_id",
            "deployed",
            "recovered",
            "timezone",
            "latitude",
            "longitude",
            "seafloor_depth",
            "line_length",
            "comments",
        ],
        &[],
    )?;
    let fields = MooringFields {
        deployment_id: reader.int("deployment_id")?,
        deployed: reader.timestamp("deployed")?,
        recovered: reader.timestamp("recovered")?,
        timezone: reader.float("timezone")?,
        latitude: reader.float("latitude")?,
        longitude: reader.float("longitude")?,
        seafloor_depth: reader.float("seafloor_depth")?,
        line_length: reader.float("line_length")?,
        comments: reader.text("comments"),
    };
    let equipment_ids = match mode {
        ExtractMode::Lenient => reader.ids_with_prefix("equipment")?,
        ExtractMode::Strict => Default::default(),
    };
    Ok(MooringRequest {
        fields,
        equipment_ids,
    })
}

pub fn extract_organization(
    submission: &Submission,
    mode: ExtractMode,
) -> Result<OrganizationRequest, Error> {
    let reader = FieldReader::new(submission, mode);
    reader.require(&["name", "abbreviation", "country_id", "comments"], &[])?;
    let fields = OrganizationFields {
        name: reader.text("name"),
        abbreviation: reader.text("abbreviation"),
        country_id: reader.int("country_id")?,
        comments: reader.text("comments"),
    };
    if let Some(Some(abbreviation)) = &fields.abbreviation {
        if !restricted_characters(abbreviation).is_empty() {
            return Err(Error::Validation(
                "abbreviation contains restricted characters. Allowed characters include \
                 alpha numeric characters, underscore, and dash"
                    .to_string(),
            ));
        }
    }

    let mut request = OrganizationRequest {
        fields,
        ..Default::default()
    };
    if mode == ExtractMode::Lenient {
        request.contact_ids = reader.ids_with_prefix("contact")?;
        request.deployment_ids = reader.ids_with_prefix("deployment")?;
        request.equipment_ids = reader.ids_with_prefix("equipment")?;
    }
    Ok(request)
}

pub fn extract_user(submission: &Submission, action: UserAction) -> Result<UserRequest, Error> {
    let reader = FieldReader::new(submission, ExtractMode::Strict);
    match action {
        UserAction::Auth => {
            reader.require(&["email", "password"], &[])?;
            Ok(UserRequest::Auth {
                email: reader.raw("email").to_lowercase(),
                password: reader.raw("password"),
            })
        }
        UserAction::PasswordReset => {
            reader.require(
                &[
                    "current_password",
                    "new_password",
                    "confirmed_new_password",
                    "username",
                ],
                &[],
            )?;
            let current_password = reader.raw("current_password");
            let new_password = reader.raw("new_password");
            if new_password.chars().count() < 6 {
                return Err(Error::Validation(
                    "New password must be at least 6 characters".to_string(),
                ));
            }
            if new_password != reader.raw("confirmed_new_password") {
                return Err(Error::Validation("New password entries do not match".to_string()));
            }
            if new_password == current_password {
                return Err(Error::Validation(
                    "New password should differ from current password".to_string(),
                ));
            }
            Ok(UserRequest::PasswordReset {
                username: reader.raw("username"),
                current_password,
                new_password,
            })
        }
    }
}

/// Parse a submitted index list such as `[1, 2, 3]`, `(4,)` or `5,6`.
pub fn parse_indexes(value: &str) -> Result<Vec<i64>, Error> {
    value
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')'])
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Validation(format!("`indexes` contains non-integer `{}`", s)))
        })
        .collect()
}

fn optional_text(reader: &FieldReader<'_>, key: &str) -> Option<String> {
    reader.text(key).flatten()
}

pub fn extract_file<Q: QueryExecutor + ?Sized>(
    db: &Q,
    submission: &Submission,
    action: FileAction,
) -> Result<FileRequest, Error> {
    let reader = FieldReader::new(submission, ExtractMode::Strict);
    match action {
        FileAction::Process => {
            reader.require(
                &["ftype", "indexes", "uploads_id", "description", "comments", "level"],
                &[],
            )?;
            let indexes = parse_indexes(&reader.raw("indexes"))?;
            let mut fields = FileFields {
                ftype: reader.text("ftype"),
                uploads_id: reader.text("uploads_id"),
                description: reader.text("description"),
                comments: reader.text("comments"),
                uploaded: Some(Some(chrono::Utc::now().timestamp())),
                organization_id: Some(None),
                deployment_id: Some(None),
                mooring_equipment_id: Some(None),
            };
            match reader.raw("level").as_str() {
                "organization" => fields.organization_id = Some(reader.int("organization_id")?.flatten()),
                "deployment" => fields.deployment_id = Some(reader.int("deployment_id")?.flatten()),
                "mooring_equipment" => {
                    let mooring = reader.int("mooring_id")?.flatten();
                    let equipment = reader.int("equipment_id")?.flatten();
                    let link = match (mooring, equipment) {
                        (Some(m), Some(e)) => queries::mooring_equipment_id(db, m, e)?,
                        _ => None,
                    };
                    fields.mooring_equipment_id = Some(link);
                }
                _ => {}
            }
            Ok(FileRequest::Process { indexes, fields })
        }
        FileAction::Edit => {
            reader.require(&["indexes"], &[])?;
            let lenient = FieldReader::new(submission, ExtractMode::Lenient);
            Ok(FileRequest::Edit {
                indexes: parse_indexes(&reader.raw("indexes"))?,
                fields: FileFields {
                    ftype: lenient.text("ftype"),
                    description: lenient.text("description"),
                    comments: lenient.text("comments"),
                    ..Default::default()
                },
            })
        }
        FileAction::Delete => {
            reader.require(&["ftype", "indexes", "uploads_id"], &[])?;
            Ok(FileRequest::Delete {
                ftype: optional_text(&reader, "ftype"),
                indexes: parse_indexes(&reader.raw("indexes"))?,
                uploads_id: optional_text(&reader, "uploads_id"),
            })
        }
        FileAction::Restore => {
            reader.require(&["indexes", "uploads_id"], &[])?;
            Ok(FileRequest::Restore {
                indexes: parse_indexes(&reader.raw("indexes"))?,
                uploads_id: optional_text(&reader, "uploads_id"),
            })
        }
    }
}
