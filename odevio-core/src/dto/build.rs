//! Build submission DTOs
//!
//! The remote service takes a multipart form whose field names differ from
//! the names used in [`BuildRequest`]. The mapping lives in [`FIELD_TABLE`]
//! so the wire contract can be checked without any HTTP involved.

use crate::domain::build::BuildRequest;

/// Multipart field carrying the source archive
pub const SOURCE_FIELD: &str = "source";

/// File name announced for the source archive part
pub const SOURCE_FILE_NAME: &str = "source.zip";

/// Optional request fields that are forwarded when present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalField {
    FlutterVersion,
    MinimalIosVersion,
    AppVersion,
    BuildNumber,
    Mode,
    Target,
    Flavor,
    PostBuildCommand,
}

/// Conversion applied to a field value before it is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Verbatim,
    Integer,
}

/// Internal field -> remote field name -> transform
pub const FIELD_TABLE: &[(OptionalField, &str, Transform)] = &[
    (OptionalField::FlutterVersion, "flutter_version", Transform::Verbatim),
    (OptionalField::MinimalIosVersion, "min_sdk", Transform::Verbatim),
    (OptionalField::AppVersion, "app_version", Transform::Verbatim),
    (OptionalField::BuildNumber, "build_number", Transform::Integer),
    (OptionalField::Mode, "mode", Transform::Verbatim),
    (OptionalField::Target, "target", Transform::Verbatim),
    (OptionalField::Flavor, "flavor", Transform::Verbatim),
    (OptionalField::PostBuildCommand, "post_build_commands", Transform::Verbatim),
];

impl OptionalField {
    /// Value of this field in a request, if set
    pub fn value(self, request: &BuildRequest) -> Option<&str> {
        let value = match self {
            OptionalField::FlutterVersion => &request.flutter_version,
            OptionalField::MinimalIosVersion => &request.minimal_ios_version,
            OptionalField::AppVersion => &request.app_version,
            OptionalField::BuildNumber => &request.build_number,
            OptionalField::Mode => &request.mode,
            OptionalField::Target => &request.target,
            OptionalField::Flavor => &request.flavor,
            OptionalField::PostBuildCommand => &request.post_build_command,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

/// Errors raised while assembling the submission form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Field '{field}' must be an integer, got '{value}'")]
    NotAnInteger { field: &'static str, value: String },
}

/// Value of a text part of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    Integer(i64),
}

impl std::fmt::Display for FormValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormValue::Text(text) => f.write_str(text),
            FormValue::Integer(number) => write!(f, "{}", number),
        }
    }
}

/// Text parts of a build submission, in the order they are sent
///
/// The archive part is added by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildForm {
    pub fields: Vec<(&'static str, FormValue)>,
}

impl BuildForm {
    /// Maps a request onto remote field names
    pub fn from_request(request: &BuildRequest) -> Result<Self, FormError> {
        let mut fields = vec![
            ("application", FormValue::Text(request.app_key.clone())),
            (
                "build_type",
                FormValue::Text(request.build_type.as_str().to_string()),
            ),
        ];

        for (field, remote, transform) in FIELD_TABLE {
            let Some(value) = field.value(request) else {
                continue;
            };
            let value = match transform {
                Transform::Verbatim => FormValue::Text(value.to_string()),
                Transform::Integer => FormValue::Integer(value.trim().parse().map_err(|_| {
                    FormError::NotAnInteger {
                        field: *remote,
                        value: value.to_string(),
                    }
                })?),
            };
            fields.push((*remote, value));
        }

        Ok(Self { fields })
    }

    /// Looks up a field by its remote name
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}
