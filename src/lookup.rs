//! Name to ID resolution by list-and-scan.
//!
//! Names compare exactly and case-sensitively; the first match wins. A miss
//! is `ProviderError::NotFound`, which callers can tell apart from transport
//! and status failures.

use crate::client::Session;
use crate::error::{ProviderError, ProviderResult};
use crate::models::{BatchId, BatchSummary, Course, CourseId};

pub async fn resolve_course_id(session: &Session, course_name: &str) -> ProviderResult<CourseId> {
    let courses: Vec<Course> = session.get_json("list courses", "/courses/").await?;
    let id = find_course(&courses, course_name)?;
    tracing::debug!(course = course_name, course_id = id, "resolved course");
    Ok(id)
}

/// Resolves a batch among those belonging to `course_id`.
///
/// `course_name` is only used to make the not-found message readable.
pub async fn resolve_batch_id(
    session: &Session,
    course_id: CourseId,
    class_name: &str,
    course_name: &str,
) -> ProviderResult<BatchId> {
    let path = format!("/admin/batchs/?course_id={course_id}");
    let batches: Vec<BatchSummary> = session.get_json("list batches", &path).await?;
    let id = find_batch(&batches, class_name, course_name)?;
    tracing::debug!(class = class_name, course_id, batch_id = id, "resolved batch");
    Ok(id)
}

/// Resolves both IDs an enrollment needs; the batch lookup depends on the course.
pub async fn resolve_target(
    session: &Session,
    course_name: &str,
    class_name: &str,
) -> ProviderResult<(CourseId, BatchId)> {
    let course_id = resolve_course_id(session, course_name).await?;
    let batch_id = resolve_batch_id(session, course_id, class_name, course_name).await?;
    Ok((course_id, batch_id))
}

fn find_course(courses: &[Course], name: &str) -> ProviderResult<CourseId> {
    courses
        .iter()
        .find(|c| c.title == name)
        .map(|c| c.id)
        .ok_or_else(|| ProviderError::not_found("course", name))
}

fn find_batch(batches: &[BatchSummary], name: &str, course_name: &str) -> ProviderResult<BatchId> {
    batches
        .iter()
        .find(|b| b.batch == name)
        .map(|b| b.id)
        .ok_or_else(|| ProviderError::NotFound {
            kind: "batch",
            name: name.to_string(),
            scope: format!(" for course '{course_name}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: CourseId, title: &str) -> Course {
        Course {
            id,
            title: title.into(),
        }
    }

    fn batch(id: BatchId, name: &str) -> BatchSummary {
        BatchSummary {
            id,
            batch: name.into(),
        }
    }

    #[test]
    fn course_match_is_exact_and_first_wins() {
        let courses = vec![
            course(1, "Linux Fundamentals"),
            course(2, "Docker"),
            course(3, "Docker"),
        ];
        assert_eq!(find_course(&courses, "Docker").unwrap(), 2);
        assert!(find_course(&courses, "docker").unwrap_err().is_not_found());
        assert!(find_course(&courses, "Linux").unwrap_err().is_not_found());
    }

    #[test]
    fn empty_listing_is_not_found() {
        assert!(find_course(&[], "Docker").unwrap_err().is_not_found());
        assert!(find_batch(&[], "B1", "Docker").unwrap_err().is_not_found());
    }

    #[test]
    fn batch_miss_names_course() {
        let batches = vec![batch(10, "Batch 1"), batch(11, "Batch 2")];
        assert_eq!(find_batch(&batches, "Batch 2", "Docker").unwrap(), 11);
        let err = find_batch(&batches, "Batch 3", "Docker").unwrap_err();
        assert_eq!(err.to_string(), "batch 'Batch 3' not found for course 'Docker'");
    }
}
