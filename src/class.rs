//! Class (batch) lifecycle: create, read, update, delete and activation.

use chrono::NaiveDate;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{decode, Session};
use crate::error::{ProviderError, ProviderResult};
use crate::lookup;
use crate::models::{
    BatchCreated, BatchId, BatchPayload, BatchRecord, CourseId, GroupType, StatusChangeReq,
};

/// Desired state of a class.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClassSpec {
    pub class_name: String,
    pub course_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub group_type: GroupType,
    #[serde(default)]
    pub is_last_batch: bool,
    #[serde(default)]
    pub is_enroll_pass: bool,
    #[serde(default = "enabled")]
    pub is_certificate: bool,
    #[serde(default = "enabled")]
    pub is_schedule: bool,
    #[serde(default)]
    pub is_active: bool,
}

fn enabled() -> bool {
    true
}

impl ClassSpec {
    pub fn validate(&self) -> ProviderResult<()> {
        if self.class_name.trim().is_empty() {
            return Err(invalid("class_name", &self.class_name));
        }
        if self.course_name.trim().is_empty() {
            return Err(invalid("course_name", &self.course_name));
        }
        if self.end_date < self.start_date {
            return Err(invalid("end_date", self.end_date));
        }
        Ok(())
    }

    /// True when anything other than `is_active` differs, which needs a full PUT.
    pub fn structure_changed(&self, other: &Self) -> bool {
        self.class_name != other.class_name
            || self.course_name != other.course_name
            || self.start_date != other.start_date
            || self.end_date != other.end_date
            || self.group_type != other.group_type
            || self.is_last_batch != other.is_last_batch
            || self.is_enroll_pass != other.is_enroll_pass
            || self.is_certificate != other.is_certificate
            || self.is_schedule != other.is_schedule
    }

    fn payload(&self, course_id: CourseId) -> BatchPayload {
        BatchPayload {
            batch: self.class_name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            group_type: self.group_type.encode(),
            is_last_batch: self.is_last_batch,
            is_enroll_pass: self.is_enroll_pass,
            is_certificate: self.is_certificate,
            is_schedule: self.is_schedule,
            course: course_id,
        }
    }

    fn from_record(rec: BatchRecord) -> ProviderResult<Self> {
        Ok(Self {
            class_name: rec.batch,
            course_name: rec.course_data.title,
            start_date: rec.start_date,
            end_date: rec.end_date,
            group_type: GroupType::decode(rec.group_type)?,
            is_last_batch: rec.is_last_batch,
            is_enroll_pass: rec.is_enroll_pass,
            is_certificate: rec.is_certificate,
            is_schedule: rec.is_schedule,
            is_active: rec.is_active,
        })
    }
}

/// A class as it exists remotely, keyed by the server-assigned ID.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClassState {
    pub id: BatchId,
    pub spec: ClassSpec,
}

fn invalid(field: &'static str, value: impl ToString) -> ProviderError {
    ProviderError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

fn batch_path(id: BatchId) -> String {
    format!("/admin/batchs/{id}/")
}

/// Creates the batch and, if requested, activates it.
///
/// Activation is a second call. If it fails the batch still exists, and the
/// returned `PartialFailure` carries its ID.
pub async fn create(session: &Session, spec: &ClassSpec) -> ProviderResult<ClassState> {
    spec.validate()?;
    let course_id = lookup::resolve_course_id(session, &spec.course_name).await?;

    let body = session
        .send_json(
            Method::POST,
            "create class",
            "/admin/batchs/",
            &spec.payload(course_id),
            StatusCode::CREATED,
        )
        .await?;
    let created: BatchCreated = decode("create class", &body)?;
    let id = created.id;
    tracing::info!(batch_id = id, class = %spec.class_name, course_id, "class created");

    if spec.is_active {
        if let Err(e) = change_status(session, id, true).await {
            tracing::warn!(batch_id = id, error = %e, "class created but activation failed");
            return Err(ProviderError::PartialFailure {
                operation: "create class",
                resource_id: Some(id.to_string()),
                completed: format!("batch {id} created"),
                pending: vec!["activate".into()],
                source: Box::new(e),
            });
        }
    }

    Ok(ClassState {
        id,
        spec: spec.clone(),
    })
}

/// State left behind by a `create` that failed after the batch was created.
///
/// The batch exists but is inactive, so the returned spec has `is_active`
/// cleared; a later `update` against it retries the activation.
pub fn created_before_failure(err: &ProviderError, spec: &ClassSpec) -> Option<ClassState> {
    match err {
        ProviderError::PartialFailure {
            operation: "create class",
            resource_id: Some(id),
            ..
        } => Some(ClassState {
            id: id.parse().ok()?,
            spec: ClassSpec {
                is_active: false,
                ..spec.clone()
            },
        }),
        _ => None,
    }
}

pub async fn read(session: &Session, id: BatchId) -> ProviderResult<ClassState> {
    let rec: BatchRecord = session.get_json("read class", &batch_path(id)).await?;
    Ok(ClassState {
        id,
        spec: ClassSpec::from_record(rec)?,
    })
}

/// Converges the batch from `prior` to `desired` and returns the refreshed state.
///
/// Structural changes resend the whole object; a lone `is_active` change only
/// hits the status endpoint. Both may run in one update.
pub async fn update(
    session: &Session,
    id: BatchId,
    prior: &ClassSpec,
    desired: &ClassSpec,
) -> ProviderResult<ClassState> {
    desired.validate()?;
    let mut replaced = false;

    if prior.structure_changed(desired) {
        let course_id = lookup::resolve_course_id(session, &desired.course_name).await?;
        session
            .send_json(
                Method::PUT,
                "update class",
                &batch_path(id),
                &desired.payload(course_id),
                StatusCode::OK,
            )
            .await?;
        replaced = true;
        tracing::info!(batch_id = id, course_id, "class replaced");
    }

    if prior.is_active != desired.is_active {
        if let Err(e) = change_status(session, id, desired.is_active).await {
            if !replaced {
                return Err(e);
            }
            tracing::warn!(batch_id = id, error = %e, "class replaced but status change failed");
            return Err(ProviderError::PartialFailure {
                operation: "update class",
                resource_id: Some(id.to_string()),
                completed: format!("batch {id} replaced"),
                pending: vec![status_word(desired.is_active).into()],
                source: Box::new(e),
            });
        }
    }

    read(session, id).await
}

/// Only 204 counts as deleted.
pub async fn delete(session: &Session, id: BatchId) -> ProviderResult<()> {
    session
        .delete("delete class", &batch_path(id), StatusCode::NO_CONTENT)
        .await?;
    tracing::info!(batch_id = id, "class deleted");
    Ok(())
}

pub async fn change_status(session: &Session, id: BatchId, is_active: bool) -> ProviderResult<()> {
    session
        .send_json(
            Method::POST,
            "change class status",
            &format!("/admin/batchs/{id}/change_status/"),
            &StatusChangeReq::quiet(is_active),
            StatusCode::OK,
        )
        .await?;
    tracing::info!(batch_id = id, is_active, "class status changed");
    Ok(())
}

fn status_word(is_active: bool) -> &'static str {
    if is_active {
        "activate"
    } else {
        "deactivate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ClassSpec {
        serde_json::from_value(serde_json::json!({
            "class_name": "Batch 1",
            "course_name": "Docker",
            "start_date": "2024-03-01",
            "end_date": "2024-04-01",
            "group_type": "internal"
        }))
        .unwrap()
    }

    #[test]
    fn defaults_follow_resource_schema() {
        let s = spec();
        assert!(!s.is_last_batch);
        assert!(!s.is_enroll_pass);
        assert!(s.is_certificate);
        assert!(s.is_schedule);
        assert!(!s.is_active);
    }

    #[test]
    fn invalid_group_type_rejected_at_boundary() {
        let res = serde_json::from_value::<ClassSpec>(serde_json::json!({
            "class_name": "Batch 1",
            "course_name": "Docker",
            "start_date": "2024-03-01",
            "end_date": "2024-04-01",
            "group_type": "external"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn end_before_start_rejected() {
        let mut s = spec();
        s.end_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(matches!(
            s.validate(),
            Err(ProviderError::InvalidValue { field: "end_date", .. })
        ));
    }

    #[test]
    fn active_flag_alone_is_not_structural() {
        let a = spec();
        let mut b = a.clone();
        b.is_active = true;
        assert!(!a.structure_changed(&b));
        b.group_type = GroupType::Eksternal;
        assert!(a.structure_changed(&b));
    }

    #[test]
    fn record_decodes_group_type_and_course_title() {
        let rec: BatchRecord = serde_json::from_value(serde_json::json!({
            "id": 44,
            "batch": "Batch 1",
            "course_data": {"id": 3, "title": "Docker"},
            "start_date": "2024-03-01",
            "end_date": "2024-04-01",
            "group_type": 2,
            "is_last_batch": true,
            "is_enroll_pass": false,
            "is_certificate": true,
            "is_schedule": false,
            "is_active": true
        }))
        .unwrap();
        let s = ClassSpec::from_record(rec).unwrap();
        assert_eq!(s.course_name, "Docker");
        assert_eq!(s.group_type, GroupType::Eksternal);
        assert!(s.is_active && s.is_last_batch && !s.is_schedule);
    }

    #[test]
    fn partial_create_leaves_inactive_state() {
        let mut desired = spec();
        desired.is_active = true;
        let err = ProviderError::PartialFailure {
            operation: "create class",
            resource_id: Some("55".into()),
            completed: "batch 55 created".into(),
            pending: vec!["activate".into()],
            source: Box::new(ProviderError::Auth {
                reason: "expired".into(),
            }),
        };
        let state = created_before_failure(&err, &desired).unwrap();
        assert_eq!(state.id, 55);
        assert!(!state.spec.is_active);
        assert_eq!(state.spec.class_name, desired.class_name);

        let other = ProviderError::not_found("course", "Docker");
        assert!(created_before_failure(&other, &desired).is_none());
    }

    #[test]
    fn record_with_unknown_group_type_is_an_error() {
        let rec: BatchRecord = serde_json::from_value(serde_json::json!({
            "id": 44,
            "batch": "Batch 1",
            "course_data": {"title": "Docker"},
            "start_date": "2024-03-01",
            "end_date": "2024-04-01",
            "group_type": 3,
            "is_last_batch": false,
            "is_enroll_pass": false,
            "is_certificate": true,
            "is_schedule": true,
            "is_active": false
        }))
        .unwrap();
        assert!(ClassSpec::from_record(rec).is_err());
    }
}
