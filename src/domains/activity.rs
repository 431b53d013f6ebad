//! Reports over engineering activity collections
//!
//! The hrm and engineering domains both carry deployments, incidents and
//! code reviews. They differ only in collection and field names, which a
//! `ActivityLayout` captures; the report bodies are shared.

use serde_json::{json, Value};

use super::common::{enriched, opt_round0, opt_round1, reference_labels, NOT_ASSIGNED};
use crate::aggregate::{count_in, count_map, DurationSummary, NumericSummary, Rate};
use crate::api::ApiResult;
use crate::executor::QueryExecutor;
use crate::storage::Record;

/// Collection and field names of one domain's activity data
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActivityLayout {
    pub deployments: &'static str,
    pub incidents: &'static str,
    pub code_reviews: &'static str,
    pub created_at: &'static str,
    pub resolved_at: &'static str,
    pub lines_changed: &'static str,
    pub review_time: &'static str,
}

pub(crate) const CAMEL_CASE: ActivityLayout = ActivityLayout {
    deployments: "deployments",
    incidents: "incidents",
    code_reviews: "codeReviews",
    created_at: "createdAt",
    resolved_at: "resolvedAt",
    lines_changed: "linesChanged",
    review_time: "reviewTime",
};

pub(crate) const SNAKE_CASE: ActivityLayout = ActivityLayout {
    deployments: "deployments",
    incidents: "incidents",
    code_reviews: "code_reviews",
    created_at: "created_at",
    resolved_at: "resolved_at",
    lines_changed: "lines_changed",
    review_time: "review_time",
};

/// Outcome counts, success rate and average duration of deployments, in
/// the order given
pub(crate) fn deployment_report(
    executor: &QueryExecutor<'_>,
    layout: &ActivityLayout,
    deployments: &[&Record],
) -> ApiResult<Value> {
    let successful = count_in(deployments.iter().copied(), "status", &["success"]);
    let durations = NumericSummary::over(deployments.iter().copied(), "duration");

    let joins = executor.joins();
    let listed = deployments
        .iter()
        .map(|deployment| {
            let deployer = joins.resolve_label(layout.deployments, deployment, "deployer", NOT_ASSIGNED)?;
            Ok(enriched(deployment, vec![("deployerName", json!(deployer))]))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": deployments.len(),
        "successful": successful,
        "failed": count_in(deployments.iter().copied(), "status", &["failed"]),
        "rolledBack": count_in(deployments.iter().copied(), "status", &["rolled_back"]),
        "successRate": Rate::of(successful, deployments.len()),
        "averageDurationMinutes": opt_round1(durations.map(|d| d.average)),
        "deployments": listed,
    }))
}

/// Resolution counts, MTTR and breakdowns of incidents.
///
/// MTTR is measured from the creation and resolution timestamps; incidents
/// without a resolution timestamp stay in every count but not in MTTR.
pub(crate) fn incident_report(
    executor: &QueryExecutor<'_>,
    layout: &ActivityLayout,
    incidents: &[&Record],
    resolved_states: &[&str],
) -> ApiResult<Value> {
    let resolved = count_in(incidents.iter().copied(), "status", resolved_states);
    let mttr = DurationSummary::between(incidents.iter().copied(), layout.created_at, layout.resolved_at);

    let joins = executor.joins();
    let listed = incidents
        .iter()
        .map(|incident| {
            let assignee = joins.resolve_label(layout.incidents, incident, "assignee", NOT_ASSIGNED)?;
            let reporter = joins.resolve_label(layout.incidents, incident, "reporter", NOT_ASSIGNED)?;
            Ok(enriched(
                incident,
                vec![("assigneeName", json!(assignee)), ("reporterName", json!(reporter))],
            ))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": incidents.len(),
        "resolved": resolved,
        "open": incidents.len() - resolved,
        "mttrMinutes": opt_round0(mttr.average_minutes),
        "mttrMeasured": mttr.measured,
        "unresolvedExcluded": mttr.excluded,
        "severityBreakdown": count_map(incidents.iter().copied(), "severity"),
        "statusBreakdown": count_map(incidents.iter().copied(), "status"),
        "incidents": listed,
    }))
}

/// Completion counts, review time and change size of code reviews.
///
/// Review time is averaged over completed reviews only; open reviews carry
/// a placeholder time.
pub(crate) fn review_report(
    executor: &QueryExecutor<'_>,
    layout: &ActivityLayout,
    reviews: &[&Record],
    completed_states: &[&str],
) -> ApiResult<Value> {
    let completed: Vec<&Record> = reviews
        .iter()
        .copied()
        .filter(|r| r.str_field("status").map(|s| completed_states.contains(&s)).unwrap_or(false))
        .collect();
    let review_time = NumericSummary::over(completed.iter().copied(), layout.review_time);
    let lines = NumericSummary::over(reviews.iter().copied(), layout.lines_changed);

    let joins = executor.joins();
    let listed = reviews
        .iter()
        .map(|review| {
            let author = joins.resolve_label(layout.code_reviews, review, "author", NOT_ASSIGNED)?;
            let reviewers = reference_labels(&joins, layout.code_reviews, review, "reviewers")?;
            Ok(enriched(
                review,
                vec![("authorName", json!(author)), ("reviewerNames", json!(reviewers))],
            ))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": reviews.len(),
        "merged": count_in(reviews.iter().copied(), "status", &["Merged"]),
        "completed": completed.len(),
        "open": reviews.len() - completed.len(),
        "completionRate": Rate::of(completed.len(), reviews.len()),
        "averageReviewTimeHours": opt_round1(review_time.map(|r| r.average)),
        "averageLinesChanged": opt_round0(lines.map(|l| l.average)),
        "reviews": listed,
    }))
}
