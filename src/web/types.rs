//! Most of the structs in `web` module and their implementations live here.
//! Includes structs that need to be validated, their parsing implementations and tests for those

use serde::Deserialize;
use strum_macros::AsRefStr;
use unicode_segmentation::UnicodeSegmentation;
use validator::ValidateEmail;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable signup request.
/// Both fields may be missing or empty, `ValidSignup` sorts that out.
#[derive(Debug, Deserialize)]
pub struct DeserSignup {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
}

/// Validated signup request
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub email: ValidEmail,
    pub variant: Option<String>,
}

impl TryFrom<DeserSignup> for ValidSignup {
    type Error = DataParsingError;

    fn try_from(deser: DeserSignup) -> Result<Self, Self::Error> {
        let email = deser
            .email
            .filter(|email| !email.is_empty())
            .ok_or(DataParsingError::EmailMissing)?;

        Ok(ValidSignup {
            email: ValidEmail::parse(email)?,
            variant: deser.variant.filter(|variant| !variant.is_empty()),
        })
    }
}

/// Validated Subscriber Email
#[derive(Debug, Clone)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if value.graphemes(true).count() > 256 {
            return Err(DataParsingError::EmailTooLong);
        }

        if value.validate_email() {
            Ok(ValidEmail(value.to_owned()))
        } else {
            Err(DataParsingError::EmailInvalid)
        }
    }
}

/// Query of the dashboard endpoint, `?action=stats|test-pipeline`.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum DashboardAction {
    #[strum(serialize = "stats")]
    Stats,
    #[strum(serialize = "test-pipeline")]
    TestPipeline,
}

impl TryFrom<&str> for DashboardAction {
    type Error = DataParsingError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "stats" => Ok(Self::Stats),
            "test-pipeline" => Ok(Self::TestPipeline),
            _ => Err(DataParsingError::ActionInvalid(value.to_string())),
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("email missing")]
    EmailMissing,
    #[error("email invalid")]
    EmailInvalid,
    #[error("email too long")]
    EmailTooLong,

    #[error("invalid dashboard action: {0}")]
    ActionInvalid(String),
}
