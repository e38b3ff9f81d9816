use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProviderError, ProviderResult};

pub type CourseId = i64;
pub type BatchId = i64;

/// Audience classification of a batch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Internal,
    Eksternal,
}

impl GroupType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Eksternal => "eksternal",
        }
    }

    /// Wire encoding used by the batch endpoints.
    pub fn encode(self) -> u8 {
        match self {
            Self::Internal => 1,
            Self::Eksternal => 2,
        }
    }

    pub fn decode(raw: i64) -> ProviderResult<Self> {
        match raw {
            1 => Ok(Self::Internal),
            2 => Ok(Self::Eksternal),
            other => Err(ProviderError::InvalidValue {
                field: "group_type",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for GroupType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(Self::Internal),
            "eksternal" => Ok(Self::Eksternal),
            other => Err(ProviderError::InvalidValue {
                field: "group_type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- auth ---

#[derive(Serialize, Debug)]
pub struct LoginReq<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct LoginResp {
    pub access: Option<String>,
}

// --- catalog listings ---

#[derive(Deserialize, Debug, Clone)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BatchSummary {
    pub id: BatchId,
    pub batch: String,
}

// --- batches ---

/// Full replacement body for batch create and update.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BatchPayload {
    pub batch: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub group_type: u8,
    pub is_last_batch: bool,
    pub is_enroll_pass: bool,
    pub is_certificate: bool,
    pub is_schedule: bool,
    pub course: CourseId,
}

#[derive(Deserialize, Debug)]
pub struct BatchCreated {
    pub id: BatchId,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CourseData {
    pub title: String,
}

/// Batch detail body. Identity comes from the request path, not the body.
#[derive(Deserialize, Debug, Clone)]
pub struct BatchRecord {
    pub batch: String,
    pub course_data: CourseData,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub group_type: i64,
    pub is_last_batch: bool,
    pub is_enroll_pass: bool,
    pub is_certificate: bool,
    pub is_schedule: bool,
    pub is_active: bool,
}

#[derive(Serialize, Debug, Clone, Copy)]
pub struct StatusChangeReq {
    pub is_broadcast: bool,
    pub is_active: bool,
}

impl StatusChangeReq {
    pub fn quiet(is_active: bool) -> Self {
        Self {
            is_broadcast: false,
            is_active,
        }
    }
}

// --- enrollment ---

#[derive(Serialize, Debug)]
pub struct EnrollReq<'a> {
    pub batch_id: BatchId,
    pub usernames: &'a [String],
}

/// Body shared by the check and revoke endpoints.
#[derive(Serialize, Debug)]
pub struct MembershipReq<'a> {
    pub course_id: CourseId,
    pub batch_id: BatchId,
    pub usernames: &'a [String],
}

#[derive(Deserialize, Debug)]
pub struct RevokeResp {
    pub message: Option<String>,
}
