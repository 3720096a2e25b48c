//! Typed request forms for every mutating operation.
//!
//! A form is read from the payload by a [`FormReader`], which rejects values
//! of the wrong type. Its field constraints are `validator` attributes.
//! Uniqueness and existence are checked against storage last, and only for
//! fields that passed everything else.

use async_trait::async_trait;
use chrono::NaiveDate;
use orgdesk_core::{
    attribute_name, merge_field_errors, ExistsTarget, Field, FieldErrors, FormReader, OrgdeskError, OrgdeskResult,
    Payload, RuleLookup, UniqueKey, UploadedFile, ValidateExt,
};
use validator::Validate;

const IMAGE_TYPES: &[&str] = &["jpeg", "png", "jpg", "gif"];

/// Largest accepted profile image.
pub const MAX_IMAGE_KILOBYTES: u64 = 2048;

/// A request body for a create or an update.
#[async_trait]
pub trait RequestForm: Validate + Sized + Send + Sync {
    fn read(reader: &mut FormReader) -> Self;

    /// Checks spanning several fields. `current` is the id of the record
    /// being updated, `None` on create.
    fn check(&self, _current: Option<i64>) -> FieldErrors {
        FieldErrors::new()
    }

    /// Uniqueness and existence checks.
    async fn check_storage(
        &self,
        _current: Option<i64>,
        _lookup: &dyn RuleLookup,
        _errors: &mut FieldErrors,
    ) -> OrgdeskResult<()> {
        Ok(())
    }
}

/// Reads and validates a form, collecting every field's first message.
pub async fn parse_form<F: RequestForm>(
    payload: Payload,
    current: Option<i64>,
    lookup: &dyn RuleLookup,
) -> OrgdeskResult<F> {
    let mut reader = FormReader::new(payload);
    let form = F::read(&mut reader);
    let mut errors = reader.finish();
    merge_field_errors(&mut errors, form.field_errors());
    merge_field_errors(&mut errors, form.check(current));
    form.check_storage(current, lookup, &mut errors).await?;

    if errors.is_empty() {
        Ok(form)
    } else {
        Err(OrgdeskError::Validation(errors))
    }
}

fn reject(errors: &mut FieldErrors, field: &str, message: String) {
    errors.insert(field.to_string(), vec![message]);
}

async fn check_unique(
    errors: &mut FieldErrors,
    lookup: &dyn RuleLookup,
    key: UniqueKey,
    field: &str,
    value: &Field<String>,
    current: Option<i64>,
) -> OrgdeskResult<()> {
    let Some(value) = value.as_value() else {
        return Ok(());
    };
    if !errors.contains_key(field) && lookup.is_taken(key, value, current).await? {
        reject(errors, field, format!("The {} has already been taken.", attribute_name(field)));
    }
    Ok(())
}

async fn check_exists(
    errors: &mut FieldErrors,
    lookup: &dyn RuleLookup,
    target: ExistsTarget,
    field: &str,
    id: Option<i64>,
) -> OrgdeskResult<()> {
    let Some(id) = id else {
        return Ok(());
    };
    if !errors.contains_key(field) && !lookup.exists(target, id).await? {
        reject(errors, field, format!("The selected {} is invalid.", attribute_name(field)));
    }
    Ok(())
}

/// Body of user create and update requests.
#[derive(Debug, Clone, Validate)]
pub struct UserForm {
    #[validate(
        required(message = "The u employee id field is required."),
        length(max = 20, message = "The u employee id must not be greater than 20 characters.")
    )]
    pub u_employee_id: Field<String>,
    #[validate(
        required(message = "The u name field is required."),
        length(max = 100, message = "The u name must not be greater than 100 characters.")
    )]
    pub u_name: Field<String>,
    #[validate(
        required(message = "The u email field is required."),
        email(message = "The u email must be a valid email address."),
        length(max = 100, message = "The u email must not be greater than 100 characters.")
    )]
    pub u_email: Field<String>,
    #[validate(length(min = 8, message = "The u password must be at least 8 characters."))]
    pub u_password: Field<String>,
    pub u_password_confirmation: Option<String>,
    #[validate(length(max = 20, message = "The u phone must not be greater than 20 characters."))]
    pub u_phone: Field<String>,
    pub u_address: Field<String>,
    pub u_birthdate: Field<NaiveDate>,
    #[validate(required(message = "The u join date field is required."))]
    pub u_join_date: Field<NaiveDate>,
    pub u_profile_image: Field<UploadedFile>,
    pub u_division_id: Field<i64>,
    pub u_position_id: Field<i64>,
    pub u_is_manager: Field<bool>,
    pub u_manager_id: Field<i64>,
    pub u_is_active: Field<bool>,
    pub roles: Field<Vec<i64>>,
}

/// Password pair checked when an account is created.
#[derive(Debug, Validate)]
struct PasswordConfirmation {
    #[validate(must_match(
        other = "u_password_confirmation",
        message = "The u password confirmation does not match."
    ))]
    u_password: String,
    u_password_confirmation: String,
}

#[async_trait]
impl RequestForm for UserForm {
    fn read(reader: &mut FormReader) -> Self {
        Self {
            u_employee_id: reader.text("u_employee_id"),
            u_name: reader.text("u_name"),
            u_email: reader.text("u_email"),
            u_password: reader.text("u_password"),
            u_password_confirmation: reader.text_or_none("u_password_confirmation"),
            u_phone: reader.text("u_phone"),
            u_address: reader.text("u_address"),
            u_birthdate: reader.date("u_birthdate"),
            u_join_date: reader.date("u_join_date"),
            u_profile_image: reader.image("u_profile_image", IMAGE_TYPES, MAX_IMAGE_KILOBYTES),
            u_division_id: reader.reference("u_division_id"),
            u_position_id: reader.reference("u_position_id"),
            u_is_manager: reader.boolean("u_is_manager"),
            u_manager_id: reader.reference("u_manager_id"),
            u_is_active: reader.boolean("u_is_active"),
            roles: reader.references("roles"),
        }
    }

    /// New accounts need a confirmed password; updates may omit it.
    fn check(&self, current: Option<i64>) -> FieldErrors {
        if current.is_some() {
            return FieldErrors::new();
        }
        let Some(password) = self.u_password.as_value() else {
            return FieldErrors::from([(
                "u_password".to_string(),
                vec!["The u password field is required.".to_string()],
            )]);
        };
        PasswordConfirmation {
            u_password: password.clone(),
            u_password_confirmation: self.u_password_confirmation.clone().unwrap_or_default(),
        }
        .field_errors()
    }

    async fn check_storage(
        &self,
        current: Option<i64>,
        lookup: &dyn RuleLookup,
        errors: &mut FieldErrors,
    ) -> OrgdeskResult<()> {
        check_unique(errors, lookup, UniqueKey::UserEmployeeId, "u_employee_id", &self.u_employee_id, current)
            .await?;
        check_unique(errors, lookup, UniqueKey::UserEmail, "u_email", &self.u_email, current).await?;

        let references = [
            (ExistsTarget::Division, "u_division_id", &self.u_division_id),
            (ExistsTarget::Position, "u_position_id", &self.u_position_id),
            (ExistsTarget::User, "u_manager_id", &self.u_manager_id),
        ];
        for (target, field, id) in references {
            check_exists(errors, lookup, target, field, id.as_value().copied()).await?;
        }

        if let Some(ids) = self.roles.as_value() {
            for (index, id) in ids.iter().enumerate() {
                let field = format!("roles.{index}");
                check_exists(errors, lookup, ExistsTarget::Role, &field, Some(*id)).await?;
            }
        }
        Ok(())
    }
}

/// Body of role create and update requests.
#[derive(Debug, Clone, Validate)]
pub struct RoleForm {
    #[validate(
        required(message = "The role name field is required."),
        length(max = 50, message = "The role name must not be greater than 50 characters.")
    )]
    pub role_name: Field<String>,
    #[validate(
        required(message = "The role level field is required."),
        range(min = 0, max = 100_000)
    )]
    pub role_level: Field<i64>,
    pub role_is_active: Field<bool>,
}

#[async_trait]
impl RequestForm for RoleForm {
    fn read(reader: &mut FormReader) -> Self {
        Self {
            role_name: reader.text("role_name"),
            role_level: reader.integer("role_level"),
            role_is_active: reader.boolean("role_is_active"),
        }
    }

    async fn check_storage(
        &self,
        current: Option<i64>,
        lookup: &dyn RuleLookup,
        errors: &mut FieldErrors,
    ) -> OrgdeskResult<()> {
        check_unique(errors, lookup, UniqueKey::RoleName, "role_name", &self.role_name, current).await
    }
}

/// Validated values of a code/name catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogValues {
    pub code: String,
    pub name: String,
    pub is_active: Field<bool>,
}

/// Body of division create and update requests.
#[derive(Debug, Clone, Validate)]
pub struct DivisionForm {
    #[validate(
        required(message = "The div code field is required."),
        length(max = 10, message = "The div code must not be greater than 10 characters.")
    )]
    pub div_code: Field<String>,
    #[validate(
        required(message = "The div name field is required."),
        length(max = 100, message = "The div name must not be greater than 100 characters.")
    )]
    pub div_name: Field<String>,
    pub div_is_active: Field<bool>,
}

impl DivisionForm {
    pub fn into_values(self) -> OrgdeskResult<CatalogValues> {
        Ok(CatalogValues {
            code: self.div_code.require("div_code")?,
            name: self.div_name.require("div_name")?,
            is_active: self.div_is_active,
        })
    }
}

#[async_trait]
impl RequestForm for DivisionForm {
    fn read(reader: &mut FormReader) -> Self {
        Self {
            div_code: reader.text("div_code"),
            div_name: reader.text("div_name"),
            div_is_active: reader.boolean("div_is_active"),
        }
    }

    async fn check_storage(
        &self,
        current: Option<i64>,
        lookup: &dyn RuleLookup,
        errors: &mut FieldErrors,
    ) -> OrgdeskResult<()> {
        check_unique(errors, lookup, UniqueKey::DivisionCode, "div_code", &self.div_code, current).await
    }
}

/// Body of position create and update requests.
#[derive(Debug, Clone, Validate)]
pub struct PositionForm {
    #[validate(
        required(message = "The pos code field is required."),
        length(max = 10, message = "The pos code must not be greater than 10 characters.")
    )]
    pub pos_code: Field<String>,
    #[validate(
        required(message = "The pos name field is required."),
        length(max = 100, message = "The pos name must not be greater than 100 characters.")
    )]
    pub pos_name: Field<String>,
    pub pos_is_active: Field<bool>,
}

impl PositionForm {
    pub fn into_values(self) -> OrgdeskResult<CatalogValues> {
        Ok(CatalogValues {
            code: self.pos_code.require("pos_code")?,
            name: self.pos_name.require("pos_name")?,
            is_active: self.pos_is_active,
        })
    }
}

#[async_trait]
impl RequestForm for PositionForm {
    fn read(reader: &mut FormReader) -> Self {
        Self {
            pos_code: reader.text("pos_code"),
            pos_name: reader.text("pos_name"),
            pos_is_active: reader.boolean("pos_is_active"),
        }
    }

    async fn check_storage(
        &self,
        current: Option<i64>,
        lookup: &dyn RuleLookup,
        errors: &mut FieldErrors,
    ) -> OrgdeskResult<()> {
        check_unique(errors, lookup, UniqueKey::PositionCode, "pos_code", &self.pos_code, current).await
    }
}

/// Body of the login request.
#[derive(Debug, Clone, Validate)]
pub struct LoginForm {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Field<String>,
    #[validate(required(message = "The password field is required."))]
    pub password: Field<String>,
}

#[async_trait]
impl RequestForm for LoginForm {
    fn read(reader: &mut FormReader) -> Self {
        Self {
            email: reader.text("email"),
            password: reader.text("password"),
        }
    }
}
