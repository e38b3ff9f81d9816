//! Membership of a list of usernames in one (course, batch) pair.
//!
//! The enrollment has no remote identity of its own; its ID is the configured
//! usernames joined with `,`. Course and class are fixed for the lifetime of
//! an enrollment, so changing either means replace, not update.

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{decode, Session};
use crate::diff::MembershipDelta;
use crate::error::{ProviderError, ProviderResult};
use crate::lookup;
use crate::models::{BatchId, CourseId, EnrollReq, MembershipReq, RevokeResp};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentSpec {
    pub course_name: String,
    pub class_name: String,
    pub usernames: Vec<String>,
}

impl EnrollmentSpec {
    pub fn validate(&self) -> ProviderResult<()> {
        if self.course_name.trim().is_empty() {
            return Err(invalid("course_name", &self.course_name));
        }
        if self.class_name.trim().is_empty() {
            return Err(invalid("class_name", &self.class_name));
        }
        if self.usernames.is_empty() {
            return Err(invalid("usernames", "[]"));
        }
        if let Some(bad) = self.usernames.iter().find(|u| u.trim().is_empty()) {
            return Err(invalid("usernames", format!("{bad:?}")));
        }
        Ok(())
    }

    pub fn id(&self) -> String {
        self.usernames.join(",")
    }

    pub fn requires_replacement(&self, other: &Self) -> bool {
        self.course_name != other.course_name || self.class_name != other.class_name
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentState {
    pub id: String,
    pub spec: EnrollmentSpec,
}

impl From<EnrollmentSpec> for EnrollmentState {
    fn from(spec: EnrollmentSpec) -> Self {
        Self {
            id: spec.id(),
            spec,
        }
    }
}

fn invalid(field: &'static str, value: impl ToString) -> ProviderError {
    ProviderError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

/// Checks that the target course and batch exist. Issues only list calls.
pub async fn validate(
    session: &Session,
    spec: &EnrollmentSpec,
) -> ProviderResult<(CourseId, BatchId)> {
    spec.validate()?;
    lookup::resolve_target(session, &spec.course_name, &spec.class_name).await
}

pub async fn create(session: &Session, spec: &EnrollmentSpec) -> ProviderResult<EnrollmentState> {
    let (_, batch_id) = validate(session, spec).await?;
    enroll(session, batch_id, &spec.usernames).await?;
    Ok(spec.clone().into())
}

/// Verifies the membership through the check endpoint.
///
/// An empty check result is `NotFound`, meaning the enrollment is gone.
pub async fn read(session: &Session, spec: &EnrollmentSpec) -> ProviderResult<EnrollmentState> {
    let (course_id, batch_id) = validate(session, spec).await?;
    let body = session
        .send_json(
            Method::POST,
            "check enrollment",
            "/admin/enrollment/check_user/",
            &MembershipReq {
                course_id,
                batch_id,
                usernames: &spec.usernames,
            },
            StatusCode::OK,
        )
        .await?;

    let found: Value = decode("check enrollment", &body)?;
    match member_count(&found) {
        Some(0) => Err(ProviderError::NotFound {
            kind: "enrollment",
            name: spec.id(),
            scope: format!(" in batch '{}'", spec.class_name),
        }),
        Some(n) => {
            tracing::debug!(batch_id, members = n, "enrollment verified");
            Ok(spec.clone().into())
        }
        None => Err(ProviderError::Decode {
            operation: "check enrollment",
            source: serde::de::Error::custom("expected a list of enrollments"),
        }),
    }
}

/// Moves membership from `prior` to `desired`: revoke first, then enroll,
/// then verify.
///
/// If the enroll step fails after a revoke went through, the error is a
/// `PartialFailure` whose `pending` lists the usernames that were not added.
pub async fn update(
    session: &Session,
    prior: &EnrollmentSpec,
    desired: &EnrollmentSpec,
) -> ProviderResult<EnrollmentState> {
    if prior.requires_replacement(desired) {
        let field = if prior.course_name != desired.course_name {
            "course_name"
        } else {
            "class_name"
        };
        return Err(ProviderError::InvalidValue {
            field,
            value: "changing the course or class requires replacing the enrollment".into(),
        });
    }

    let delta = MembershipDelta::between(&prior.usernames, &desired.usernames);
    if delta.is_empty() {
        return read(session, desired).await;
    }

    let (course_id, batch_id) = validate(session, desired).await?;

    if !delta.to_revoke.is_empty() {
        revoke(session, course_id, batch_id, &delta.to_revoke).await?;
    }

    if !delta.to_enroll.is_empty() {
        if let Err(e) = enroll(session, batch_id, &delta.to_enroll).await {
            if delta.to_revoke.is_empty() {
                return Err(e);
            }
            tracing::warn!(
                revoked = ?delta.to_revoke,
                not_enrolled = ?delta.to_enroll,
                error = %e,
                "enrollment update stopped after revoke"
            );
            return Err(ProviderError::PartialFailure {
                operation: "update enrollment",
                resource_id: Some(prior.id()),
                completed: format!("revoked {}", delta.to_revoke.join(", ")),
                pending: delta.to_enroll,
                source: Box::new(e),
            });
        }
    }

    read(session, desired).await
}

pub async fn delete(session: &Session, spec: &EnrollmentSpec) -> ProviderResult<()> {
    let (course_id, batch_id) = validate(session, spec).await?;
    revoke(session, course_id, batch_id, &spec.usernames).await
}

async fn enroll(session: &Session, batch_id: BatchId, usernames: &[String]) -> ProviderResult<()> {
    session
        .send_json(
            Method::POST,
            "enroll users",
            "/admin/enrollment/enroll_users/",
            &EnrollReq { batch_id, usernames },
            StatusCode::OK,
        )
        .await?;
    tracing::info!(batch_id, users = ?usernames, "users enrolled");
    Ok(())
}

async fn revoke(
    session: &Session,
    course_id: CourseId,
    batch_id: BatchId,
    usernames: &[String],
) -> ProviderResult<()> {
    let body = session
        .send_json(
            Method::POST,
            "revoke users",
            "/admin/enrollment/revoke_users/",
            &MembershipReq {
                course_id,
                batch_id,
                usernames,
            },
            StatusCode::OK,
        )
        .await?;

    if let Some(expected) = session.revoke_ack() {
        let got = decode::<RevokeResp>("revoke users", &body)?.message;
        if got.as_deref() != Some(expected) {
            return Err(ProviderError::Unacknowledged {
                operation: "revoke users",
                expected: expected.to_string(),
                got,
            });
        }
    }

    tracing::info!(batch_id, users = ?usernames, "users revoked");
    Ok(())
}

/// Size of the collection returned by the check endpoint: a bare array, or an
/// object wrapping one under `results`, `data` or `usernames`.
fn member_count(v: &Value) -> Option<usize> {
    match v {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => ["results", "data", "usernames"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
            .map(Vec::len),
        _ => None,
    }
}
