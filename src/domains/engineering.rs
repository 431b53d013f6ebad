//! Engineering organization domain
//!
//! Teams own repositories; deployments, incidents and code reviews point at
//! repositories by name. Team-scoped metrics follow that chain.

use std::collections::HashSet;

use chrono::{Datelike, Duration};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::activity::{deployment_report, incident_report, review_report, SNAKE_CASE};
use super::common::{
    enriched, find_by_id_or_name, opt_round0, opt_round1, parse_call, reference_labels,
    reference_list, timeframe, unit_manager, within_window, NONE_LABEL, NOT_ASSIGNED,
};
use super::{Domain, DomainKind};
use crate::aggregate::{
    count_by, count_in, count_map, group_key, newest, round_int, DurationSummary, NumericSummary,
    Rate,
};
use crate::api::{ApiError, ApiResult, OperationSpec, ParamSpec, ViewSpec};
use crate::executor::{Criterion, Matcher, Query, QueryExecutor, SortKey, SortSpec};
use crate::storage::Record;

const LEVELS: &[&str] = &["L3", "L4", "L5", "L6", "L7", "L8", "L9", "L10"];
const ROLES: &[&str] = &[
    "SWE", "SRE", "Data", "ML", "Security", "Architect", "Manager", "Director", "VP",
];
const PROJECT_STATUSES: &[&str] = &["Planning", "Active", "Blocked", "Completed", "Cancelled"];
const PRIORITIES: &[&str] = &["P0", "P1", "P2", "P3"];
const REPOSITORY_SORTS: &[&str] = &["techDebt", "security", "coverage", "uptime"];
const ENVIRONMENTS: &[&str] = &["dev", "staging", "canary", "production"];
const DEPLOYMENT_STATUSES: &[&str] = &["success", "failed", "rolled_back"];
const TIMEFRAMES: &[&str] = &["24h", "7d", "30d"];
const SEVERITIES: &[&str] = &["SEV0", "SEV1", "SEV2", "SEV3", "SEV4"];
const INCIDENT_STATUSES: &[&str] = &["Open", "Investigating", "Mitigating", "Resolved", "Post-mortem"];
const REVIEW_STATUSES: &[&str] = &["Open", "Approved", "Changes Requested", "Merged", "Closed"];
const HEALTH_METRICS: &[&str] = &["velocity", "quality", "incidents", "deployments"];

const RESOLVED_STATES: &[&str] = &["Resolved", "Post-mortem"];
const COMPLETED_REVIEWS: &[&str] = &["Merged", "Closed"];
const VULNERABILITY_PATHS: &[&str] = &[
    "security_vulns.critical",
    "security_vulns.high",
    "security_vulns.medium",
    "security_vulns.low",
];

const ORG_OVERVIEW: ViewSpec = ViewSpec::new(
    "engineering://org-overview",
    "Engineering Organization Overview",
    "High-level engineering metrics and KPIs",
);
const TEAM_STRUCTURE: ViewSpec = ViewSpec::new(
    "engineering://team-structure",
    "Team Structure",
    "Engineers grouped by team with their reporting lines",
);
const TECH_STACK: ViewSpec = ViewSpec::new(
    "engineering://tech-stack",
    "Technology Stack",
    "Languages across repositories with size and owning teams",
);
const QUARTERLY_METRICS: ViewSpec = ViewSpec::new(
    "engineering://quarterly-metrics",
    "Quarterly Engineering Metrics",
    "Delivery, reliability and quality indicators for the latest quarter on record",
);

pub struct Engineering;

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", content = "arguments", rename_all = "snake_case")]
enum EngineeringCall {
    SearchEngineers(SearchEngineersArgs),
    GetTeamInfo(TeamInfoArgs),
    GetProjectStatus(ProjectStatusArgs),
    RepositoryMetrics(RepositoryMetricsArgs),
    DeploymentDashboard(DeploymentArgs),
    IncidentAnalysis(IncidentArgs),
    CodeReviewMetrics(CodeReviewArgs),
    OncallSchedule(OncallArgs),
    TeamHealthMetrics(TeamHealthArgs),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchEngineersArgs {
    query: Option<String>,
    team: Option<String>,
    role: Option<String>,
    level: Option<String>,
    location: Option<String>,
    skill: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamInfoArgs {
    team: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectStatusArgs {
    status: Option<String>,
    priority: Option<String>,
    team: Option<String>,
    owner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RepositoryMetricsArgs {
    team: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    language: Option<String>,
    sort_by: Option<RepositorySort>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
enum RepositorySort {
    TechDebt,
    Security,
    Coverage,
    Uptime,
}

impl RepositorySort {
    /// Worst repositories first
    fn spec(self) -> SortSpec {
        match self {
            RepositorySort::TechDebt => SortSpec::desc(SortKey::field("tech_debt_score")),
            RepositorySort::Security => SortSpec::desc(SortKey::sum(VULNERABILITY_PATHS)),
            RepositorySort::Coverage => SortSpec::asc(SortKey::field("test_coverage")),
            RepositorySort::Uptime => SortSpec::asc(SortKey::field("uptime")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeploymentArgs {
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    status: Option<String>,
    timeframe: String,
}

#[derive(Debug, Deserialize)]
struct IncidentArgs {
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    assignee: Option<String>,
    timeframe: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CodeReviewArgs {
    repository: Option<String>,
    author: Option<String>,
    reviewer: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OncallArgs {
    team: Option<String>,
    service: Option<String>,
    engineer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TeamHealthArgs {
    team: Option<String>,
    metric: Option<HealthMetric>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum HealthMetric {
    Velocity,
    Quality,
    Incidents,
    Deployments,
}

impl Domain for Engineering {
    fn kind(&self) -> DomainKind {
        DomainKind::Engineering
    }

    fn operations(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new("search_engineers", "Search engineers by name, team, role, level, location or skill")
                .param(ParamSpec::string("query", "Matches name, email or id"))
                .param(ParamSpec::string("team", "Team name"))
                .param(ParamSpec::string("role", "Engineering role").one_of(ROLES))
                .param(ParamSpec::string("level", "Engineering level").one_of(LEVELS))
                .param(ParamSpec::string("location", "Office location (partial match)"))
                .param(ParamSpec::string("skill", "Skill (partial match)")),
            OperationSpec::new("get_team_info", "Team with manager, members, repositories and their incidents")
                .param(ParamSpec::string("team", "Team id or name").required()),
            OperationSpec::new("get_project_status", "Projects with owners, risks and dependencies")
                .param(ParamSpec::string("status", "Project status").one_of(PROJECT_STATUSES))
                .param(ParamSpec::string("priority", "Project priority").one_of(PRIORITIES))
                .param(ParamSpec::string("team", "Owning team"))
                .param(ParamSpec::string("owner", "Owner engineer id")),
            OperationSpec::new("repository_metrics", "Repository security, quality and reliability metrics")
                .param(ParamSpec::string("team", "Owning team"))
                .param(ParamSpec::string("type", "Repository type"))
                .param(ParamSpec::string("language", "Primary language"))
                .param(ParamSpec::string("sortBy", "Order, worst first").one_of(REPOSITORY_SORTS)),
            OperationSpec::new("deployment_dashboard", "Deployment outcomes over a trailing timeframe")
                .param(ParamSpec::string("repository", "Repository name"))
                .param(ParamSpec::string("environment", "Target environment").one_of(ENVIRONMENTS))
                .param(ParamSpec::string("status", "Deployment status").one_of(DEPLOYMENT_STATUSES))
                .param(ParamSpec::string("timeframe", "Trailing window").one_of(TIMEFRAMES).default_value("7d")),
            OperationSpec::new("incident_analysis", "Incident counts, MTTR and severity breakdown")
                .param(ParamSpec::string("severity", "Incident severity").one_of(SEVERITIES))
                .param(ParamSpec::string("status", "Incident status").one_of(INCIDENT_STATUSES))
                .param(ParamSpec::string("service", "Affected service"))
                .param(ParamSpec::string("assignee", "Assignee engineer id"))
                .param(ParamSpec::string("timeframe", "Trailing window").one_of(TIMEFRAMES).default_value("30d")),
            OperationSpec::new("code_review_metrics", "Code review throughput and review time")
                .param(ParamSpec::string("repository", "Repository name"))
                .param(ParamSpec::string("author", "Author engineer id"))
                .param(ParamSpec::string("reviewer", "Reviewer engineer id"))
                .param(ParamSpec::string("status", "Review status").one_of(REVIEW_STATUSES)),
            OperationSpec::new("oncall_schedule", "On-call rotations with escalation paths")
                .param(ParamSpec::string("team", "Team name"))
                .param(ParamSpec::string("service", "Service name"))
                .param(ParamSpec::string("engineer", "Engineer id")),
            OperationSpec::new("team_health_metrics", "Velocity, quality, incident and deployment health")
                .param(ParamSpec::string("team", "Team id or name; all teams when omitted"))
                .param(ParamSpec::string("metric", "Single metric family").one_of(HEALTH_METRICS)),
        ]
    }

    fn views(&self) -> Vec<ViewSpec> {
        vec![ORG_OVERVIEW, TEAM_STRUCTURE, TECH_STACK, QUARTERLY_METRICS]
    }

    fn execute(
        &self,
        executor: &QueryExecutor<'_>,
        operation: &str,
        args: Map<String, Value>,
    ) -> ApiResult<Value> {
        match parse_call(operation, args)? {
            EngineeringCall::SearchEngineers(args) => search_engineers(executor, args),
            EngineeringCall::GetTeamInfo(args) => team_info(executor, args),
            EngineeringCall::GetProjectStatus(args) => project_status(executor, args),
            EngineeringCall::RepositoryMetrics(args) => repository_metrics(executor, args),
            EngineeringCall::DeploymentDashboard(args) => deployment_dashboard(executor, args),
            EngineeringCall::IncidentAnalysis(args) => incident_analysis(executor, args),
            EngineeringCall::CodeReviewMetrics(args) => code_review_metrics(executor, args),
            EngineeringCall::OncallSchedule(args) => oncall_schedule(executor, args),
            EngineeringCall::TeamHealthMetrics(args) => team_health(executor, args),
        }
    }

    fn read_view(&self, executor: &QueryExecutor<'_>, uri: &str) -> ApiResult<Value> {
        match uri {
            uri if uri == ORG_OVERVIEW.uri => org_overview(executor),
            uri if uri == TEAM_STRUCTURE.uri => team_structure(executor),
            uri if uri == TECH_STACK.uri => tech_stack(executor),
            uri if uri == QUARTERLY_METRICS.uri => quarterly_metrics(executor),
            _ => Err(ApiError::UnknownView(uri.to_string())),
        }
    }
}

fn names(records: &[&Record]) -> Vec<Value> {
    records
        .iter()
        .map(|r| r.get("name").cloned().unwrap_or(Value::Null))
        .collect()
}

fn search_engineers(executor: &QueryExecutor<'_>, args: SearchEngineersArgs) -> ApiResult<Value> {
    let query = Query::new("engineers")
        .filter_opt(args.query.map(|q| Criterion::any_of(&["name", "email", "id"], Matcher::Substring(q))))
        .filter_opt(args.team.map(|t| Criterion::exact("team", t)))
        .filter_opt(args.role.map(|r| Criterion::exact("role", r)))
        .filter_opt(args.level.map(|l| Criterion::exact("level", l)))
        .filter_opt(args.location.map(|l| Criterion::substring("location", l)))
        .filter_opt(args.skill.map(|s| Criterion::list_contains("skills", s)));
    let result = executor.execute(&query)?;

    let joins = executor.joins();
    let engineers = result
        .iter()
        .map(|engineer| {
            let manager = joins.resolve_label("engineers", engineer, "manager", NONE_LABEL)?;
            Ok(enriched(engineer, vec![("managerName", json!(manager))]))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": result.len(),
        "engineers": engineers,
    }))
}

fn team_info(executor: &QueryExecutor<'_>, args: TeamInfoArgs) -> ApiResult<Value> {
    let team = find_by_id_or_name(executor.store(), "teams", &args.team, "Team")?;
    let joins = executor.joins();

    let engineers = joins.referencing("engineers", "team", team)?;
    let repositories = joins.referencing("repositories", "team", team)?;
    let projects = joins.referencing("projects", "team", team)?;

    let mut incidents = Vec::new();
    for repository in &repositories {
        incidents.extend(joins.referencing("incidents", "service", repository)?);
    }
    let open = incidents.len() - count_in(incidents.iter().copied(), "status", RESOLVED_STATES);

    let listed_incidents: Vec<Value> = incidents
        .iter()
        .map(|incident| {
            json!({
                "id": incident.id(),
                "title": incident.get("title"),
                "severity": incident.get("severity"),
                "status": incident.get("status"),
                "service": incident.get("service"),
            })
        })
        .collect();

    Ok(json!({
        "team": team.to_value(),
        "manager": unit_manager(&joins, "teams", team)?,
        "members": reference_list(&joins, "teams", team, "members")?,
        "engineers": names(&engineers),
        "repositories": names(&repositories),
        "projects": names(&projects),
        "incidents": listed_incidents,
        "openIncidents": open,
    }))
}

fn project_status(executor: &QueryExecutor<'_>, args: ProjectStatusArgs) -> ApiResult<Value> {
    let query = Query::new("projects")
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)))
        .filter_opt(args.priority.map(|p| Criterion::exact("priority", p)))
        .filter_opt(args.team.map(|t| Criterion::exact("team", t)))
        .filter_opt(args.owner.map(|o| Criterion::exact("owner", o)));
    let projects = executor.execute(&query)?.records;

    let progress = NumericSummary::over(projects.iter().copied(), "progress");
    let risks: usize = projects.iter().map(|p| p.str_list("risks").len()).sum();

    let joins = executor.joins();
    let listed = projects
        .iter()
        .map(|project| {
            let owner = joins.resolve_label("projects", project, "owner", NOT_ASSIGNED)?;
            let dependencies = reference_list(&joins, "projects", project, "dependencies")?;
            Ok(enriched(
                project,
                vec![("ownerName", json!(owner)), ("dependencyStatus", dependencies)],
            ))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": projects.len(),
        "statusSummary": count_map(projects.iter().copied(), "status"),
        "averageProgress": opt_round1(progress.map(|p| p.average)),
        "openRisks": risks,
        "projects": listed,
    }))
}

fn vulnerability_total(repository: &Record) -> f64 {
    VULNERABILITY_PATHS.iter().filter_map(|p| repository.number(p)).sum()
}

fn repository_metrics(executor: &QueryExecutor<'_>, args: RepositoryMetricsArgs) -> ApiResult<Value> {
    let mut query = Query::new("repositories")
        .filter_opt(args.team.map(|t| Criterion::exact("team", t)))
        .filter_opt(args.kind.map(|k| Criterion::exact("type", k)))
        .filter_opt(args.language.map(|l| Criterion::exact("language", l)));
    if let Some(sort) = args.sort_by {
        query = query.sort_by(sort.spec());
    }
    let repositories = executor.execute(&query)?.records;

    let mut vulnerabilities = Map::new();
    for path in VULNERABILITY_PATHS {
        let severity = path.trim_start_matches("security_vulns.");
        let sum = NumericSummary::over(repositories.iter().copied(), path).map(|s| s.sum).unwrap_or(0.0);
        vulnerabilities.insert(severity.to_string(), json!(round_int(sum)));
    }

    let listed: Vec<Value> = repositories
        .iter()
        .map(|repo| enriched(repo, vec![("totalVulnerabilities", json!(round_int(vulnerability_total(repo))))]))
        .collect();

    let lines = NumericSummary::over(repositories.iter().copied(), "lines_of_code").map(|s| s.sum).unwrap_or(0.0);
    Ok(json!({
        "total": repositories.len(),
        "totalLinesOfCode": round_int(lines),
        "averageTestCoverage": opt_round1(NumericSummary::over(repositories.iter().copied(), "test_coverage").map(|s| s.average)),
        "averageTechDebt": opt_round1(NumericSummary::over(repositories.iter().copied(), "tech_debt_score").map(|s| s.average)),
        "averageUptime": NumericSummary::over(repositories.iter().copied(), "uptime").map(|s| (s.average * 100.0).round() / 100.0),
        "vulnerabilities": vulnerabilities,
        "repositories": listed,
    }))
}

fn deployment_dashboard(executor: &QueryExecutor<'_>, args: DeploymentArgs) -> ApiResult<Value> {
    let length = timeframe(&args.timeframe)?;
    let query = Query::new("deployments")
        .filter_opt(args.repository.map(|r| Criterion::exact("repository", r)))
        .filter_opt(args.environment.map(|e| Criterion::exact("environment", e)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)))
        .sort_by(SortSpec::desc(SortKey::field("timestamp")));
    let deployments = executor.execute(&query)?.records;
    let deployments = within_window(executor, "deployments", deployments, "timestamp", length)?;

    let mut report = deployment_report(executor, &SNAKE_CASE, &deployments)?;
    report["timeframe"] = json!(args.timeframe);
    Ok(report)
}

fn incident_analysis(executor: &QueryExecutor<'_>, args: IncidentArgs) -> ApiResult<Value> {
    let length = timeframe(&args.timeframe)?;
    let query = Query::new("incidents")
        .filter_opt(args.severity.map(|s| Criterion::exact("severity", s)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)))
        .filter_opt(args.service.map(|s| Criterion::exact("service", s)))
        .filter_opt(args.assignee.map(|a| Criterion::exact("assignee", a)))
        .sort_by(SortSpec::desc(SortKey::field("created_at")));
    let incidents = executor.execute(&query)?.records;
    let incidents = within_window(executor, "incidents", incidents, "created_at", length)?;

    let mut report = incident_report(executor, &SNAKE_CASE, &incidents, RESOLVED_STATES)?;
    report["timeframe"] = json!(args.timeframe);
    Ok(report)
}

fn code_review_metrics(executor: &QueryExecutor<'_>, args: CodeReviewArgs) -> ApiResult<Value> {
    let query = Query::new("code_reviews")
        .filter_opt(args.repository.map(|r| Criterion::exact("repository", r)))
        .filter_opt(args.author.map(|a| Criterion::exact("author", a)))
        .filter_opt(args.reviewer.map(|r| Criterion::list_includes("reviewers", r)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)));
    let reviews = executor.execute(&query)?.records;

    review_report(executor, &SNAKE_CASE, &reviews, COMPLETED_REVIEWS)
}

fn oncall_schedule(executor: &QueryExecutor<'_>, args: OncallArgs) -> ApiResult<Value> {
    let query = Query::new("oncall_rotations")
        .filter_opt(args.team.map(|t| Criterion::exact("team", t)))
        .filter_opt(args.service.map(|s| Criterion::exact("service", s)))
        .filter_opt(args.engineer.map(|e| Criterion::exact("engineer", e)))
        .sort_by(SortSpec::asc(SortKey::field("start_date")));
    let rotations = executor.execute(&query)?.records;

    let joins = executor.joins();
    let listed = rotations
        .iter()
        .map(|rotation| {
            let engineer = joins.resolve_label("oncall_rotations", rotation, "engineer", NOT_ASSIGNED)?;
            let escalation = reference_labels(&joins, "oncall_rotations", rotation, "escalation_path")?;
            Ok(enriched(
                rotation,
                vec![("engineerName", json!(engineer)), ("escalationNames", json!(escalation))],
            ))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": rotations.len(),
        "rotations": listed,
    }))
}

/// Records of `collection` whose `field` names one of `repositories`
fn against_repositories<'s>(
    executor: &QueryExecutor<'s>,
    collection: &str,
    field: &str,
    repositories: &[&Record],
) -> ApiResult<Vec<&'s Record>> {
    let wanted: HashSet<&str> = repositories.iter().filter_map(|r| r.str_field("name")).collect();
    Ok(executor
        .all(collection)?
        .records
        .into_iter()
        .filter(|r| r.str_field(field).map(|v| wanted.contains(v)).unwrap_or(false))
        .collect())
}

/// Records of `collection` owned by `team`, or all of them without one
fn owned_by<'s>(
    executor: &QueryExecutor<'s>,
    team: Option<&Record>,
    collection: &str,
) -> ApiResult<Vec<&'s Record>> {
    match team {
        Some(team) => Ok(executor.joins().referencing(collection, "team", team)?),
        None => Ok(executor.all(collection)?.records),
    }
}

fn team_health(executor: &QueryExecutor<'_>, args: TeamHealthArgs) -> ApiResult<Value> {
    let team = args
        .team
        .as_deref()
        .map(|key| find_by_id_or_name(executor.store(), "teams", key, "Team"))
        .transpose()?;

    let engineers = owned_by(executor, team, "engineers")?;
    let projects = owned_by(executor, team, "projects")?;
    let repositories = owned_by(executor, team, "repositories")?;

    let wants = |metric: HealthMetric| args.metric.map(|m| m == metric).unwrap_or(true);
    let mut report = Map::new();
    report.insert("team".into(), json!(team.and_then(|t| t.str_field("name"))));

    if wants(HealthMetric::Velocity) {
        let progress = NumericSummary::over(projects.iter().copied(), "progress");
        report.insert(
            "velocity".into(),
            json!({
                "engineers": engineers.len(),
                "activeProjects": count_in(projects.iter().copied(), "status", &["Active"]),
                "averageProgress": opt_round1(progress.map(|p| p.average)),
                "repositories": repositories.len(),
            }),
        );
    }

    if wants(HealthMetric::Quality) {
        let reviews = against_repositories(executor, "code_reviews", "repository", &repositories)?;
        let completed: Vec<&Record> = reviews
            .into_iter()
            .filter(|r| r.str_field("status").map(|s| COMPLETED_REVIEWS.contains(&s)).unwrap_or(false))
            .collect();
        report.insert(
            "quality".into(),
            json!({
                "averageTestCoverage": opt_round1(NumericSummary::over(repositories.iter().copied(), "test_coverage").map(|s| s.average)),
                "averageTechDebt": opt_round1(NumericSummary::over(repositories.iter().copied(), "tech_debt_score").map(|s| s.average)),
                "averageReviewTimeHours": opt_round1(NumericSummary::over(completed.iter().copied(), "review_time").map(|s| s.average)),
            }),
        );
    }

    if wants(HealthMetric::Incidents) {
        let incidents = match team {
            Some(_) => against_repositories(executor, "incidents", "service", &repositories)?,
            None => executor.all("incidents")?.records,
        };
        let resolved = count_in(incidents.iter().copied(), "status", RESOLVED_STATES);
        let mttr = DurationSummary::between(incidents.iter().copied(), "created_at", "resolved_at");
        report.insert(
            "incidents".into(),
            json!({
                "total": incidents.len(),
                "open": incidents.len() - resolved,
                "mttrMinutes": opt_round0(mttr.average_minutes),
            }),
        );
    }

    if wants(HealthMetric::Deployments) {
        let deployments = match team {
            Some(_) => against_repositories(executor, "deployments", "repository", &repositories)?,
            None => executor.all("deployments")?.records,
        };
        let successful = count_in(deployments.iter().copied(), "status", &["success"]);
        let frequency = NumericSummary::over(repositories.iter().copied(), "deployment_freq");
        report.insert(
            "deployments".into(),
            json!({
                "total": deployments.len(),
                "successRate": Rate::of(successful, deployments.len()),
                "averageDeployFrequency": opt_round1(frequency.map(|f| f.average)),
            }),
        );
    }

    Ok(Value::Object(report))
}

fn completed_review_hours(executor: &QueryExecutor<'_>) -> ApiResult<Option<f64>> {
    let reviews = executor.all("code_reviews")?.records;
    let completed: Vec<&Record> = reviews
        .into_iter()
        .filter(|r| r.str_field("status").map(|s| COMPLETED_REVIEWS.contains(&s)).unwrap_or(false))
        .collect();
    Ok(NumericSummary::over(completed.iter().copied(), "review_time").map(|s| s.average))
}

fn org_overview(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let projects = executor.all("projects")?.records;
    let repositories = executor.all("repositories")?.records;
    let incidents = executor.all("incidents")?.records;
    let deployments = executor.all("deployments")?.records;
    let this_week = within_window(executor, "deployments", deployments, "timestamp", Duration::days(7))?;
    let coverage = NumericSummary::over(repositories.iter().copied(), "test_coverage");

    Ok(json!({
        "totalEngineers": executor.store().get("engineers")?.len(),
        "totalProjects": projects.len(),
        "activeProjects": count_in(projects.iter().copied(), "status", &["Active"]),
        "totalRepositories": repositories.len(),
        "deploymentsThisWeek": this_week.len(),
        "openIncidents": incidents.len() - count_in(incidents.iter().copied(), "status", RESOLVED_STATES),
        "avgCodeReviewTimeHours": opt_round1(completed_review_hours(executor)?),
        "avgTestCoverage": opt_round0(coverage.map(|c| c.average)),
    }))
}

fn team_structure(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let engineers = executor.all("engineers")?.records;
    let joins = executor.joins();

    let mut teams = Map::new();
    for (team, _) in count_by(engineers.iter().copied(), "team") {
        let members = engineers
            .iter()
            .filter(|e| group_key(e, "team") == team)
            .map(|engineer| {
                Ok(json!({
                    "id": engineer.id(),
                    "name": engineer.get("name"),
                    "role": engineer.get("role"),
                    "level": engineer.get("level"),
                    "manager": joins.resolve_label("engineers", engineer, "manager", NONE_LABEL)?,
                }))
            })
            .collect::<ApiResult<Vec<_>>>()?;
        teams.insert(team, Value::Array(members));
    }
    Ok(Value::Object(teams))
}

fn tech_stack(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let repositories = executor.all("repositories")?.records;

    let mut languages = Map::new();
    for (language, count) in count_by(repositories.iter().copied(), "language") {
        let owned: Vec<&Record> = repositories
            .iter()
            .copied()
            .filter(|r| group_key(r, "language") == language)
            .collect();
        let lines = NumericSummary::over(owned.iter().copied(), "lines_of_code").map(|s| s.sum).unwrap_or(0.0);
        let mut teams: Vec<&str> = Vec::new();
        for team in owned.iter().filter_map(|r| r.str_field("team")) {
            if !teams.contains(&team) {
                teams.push(team);
            }
        }
        languages.insert(
            language,
            json!({ "repositories": count, "totalLOC": round_int(lines), "teams": teams }),
        );
    }
    Ok(Value::Object(languages))
}

fn quarterly_metrics(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let deployments = executor.store().get("deployments")?;
    let repositories = executor.all("repositories")?.records;
    let incidents = executor.all("incidents")?.records;

    let quarter = newest(deployments, "timestamp")
        .map(|latest| format!("{}-Q{}", latest.year(), latest.month0() / 3 + 1));
    let mttr = DurationSummary::between(incidents.iter().copied(), "created_at", "resolved_at");
    let average = |path: &str| NumericSummary::over(repositories.iter().copied(), path).map(|s| s.average);

    Ok(json!({
        "quarter": quarter,
        "deploymentFrequencyPerWeek": opt_round1(average("deployment_freq")),
        "incidentResolutionMinutes": opt_round0(mttr.average_minutes),
        "codeReviewHours": opt_round1(completed_review_hours(executor)?),
        "testCoverage": opt_round1(average("test_coverage")),
        "technicalDebtScore": opt_round1(average("tech_debt_score")),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::load_store;
    use crate::storage::RecordStore;

    fn store() -> RecordStore {
        load_store(DomainKind::Engineering, None).unwrap()
    }

    fn call(store: &RecordStore, operation: &str, args: Value) -> ApiResult<Value> {
        let spec = Engineering
            .operations()
            .into_iter()
            .find(|op| op.name == operation)
            .unwrap();
        let args = spec.validate(&args)?;
        Engineering.execute(&QueryExecutor::new(store), operation, args)
    }

    fn view(store: &RecordStore, uri: &str) -> Value {
        Engineering.read_view(&QueryExecutor::new(store), uri).unwrap()
    }

    fn ids(list: &Value) -> Vec<&str> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_search_engineers_by_skill_and_location() {
        let store = store();
        let result = call(&store, "search_engineers", json!({"skill": "python"})).unwrap();
        assert_eq!(ids(&result["engineers"]), vec!["eng_001", "eng_004", "eng_100"]);

        let result = call(&store, "search_engineers", json!({"location": "seattle"})).unwrap();
        assert_eq!(ids(&result["engineers"]), vec!["eng_002", "eng_101"]);
        assert_eq!(result["engineers"][0]["managerName"], "Michael O'Brien");
    }

    #[test]
    fn test_search_engineers_top_of_org_has_no_manager() {
        let store = store();
        let result = call(&store, "search_engineers", json!({"role": "VP"})).unwrap();
        assert_eq!(result["engineers"][0]["managerName"], "None");
    }

    #[test]
    fn test_team_info_declared_vs_resolved_members() {
        let store = store();
        let result = call(&store, "get_team_info", json!({"team": "Search Platform"})).unwrap();
        assert_eq!(result["manager"]["name"], "Jennifer Wu");
        assert_eq!(result["members"]["declared"], 5);
        assert_eq!(result["members"]["resolved"], json!(["Alex Chen", "Jennifer Wu"]));
        assert_eq!(result["members"]["dangling"], json!(["eng_006", "eng_007", "eng_008"]));
        assert_eq!(result["repositories"], json!(["search-service"]));
        assert_eq!(ids(&result["incidents"]), vec!["inc_001"]);
        assert_eq!(result["openIncidents"], 0);
    }

    #[test]
    fn test_team_info_by_id_and_missing_manager() {
        let store = store();
        let result = call(&store, "get_team_info", json!({"team": "team_007"})).unwrap();
        assert_eq!(result["manager"], "not assigned");

        // manager eng_102 is not on record
        let result = call(&store, "get_team_info", json!({"team": "Mobile Platform"})).unwrap();
        assert_eq!(result["manager"], "not assigned");
        assert_eq!(result["openIncidents"], 0);
    }

    #[test]
    fn test_team_info_unknown_team() {
        let store = store();
        let err = call(&store, "get_team_info", json!({"team": "Payments"})).unwrap_err();
        assert_eq!(err.code(), "ORG_NOT_FOUND");
        let err = call(&store, "get_team_info", json!({})).unwrap_err();
        assert_eq!(err.code(), "ORG_INVALID_ARGUMENT");
    }

    #[test]
    fn test_project_status() {
        let store = store();
        let result = call(&store, "get_project_status", json!({})).unwrap();
        assert_eq!(result["averageProgress"], 48.0);
        assert_eq!(result["statusSummary"]["Active"], 2);
        assert_eq!(result["openRisks"], 8);
        assert_eq!(result["projects"][0]["dependencyStatus"]["resolved"], json!(["API Gateway V2"]));
        assert_eq!(result["projects"][0]["ownerName"], "Alex Chen");
    }

    #[test]
    fn test_repository_sorting_worst_first() {
        let store = store();
        let by = |sort: &str| {
            let result = call(&store, "repository_metrics", json!({"sortBy": sort})).unwrap();
            ids(&result["repositories"]).into_iter().map(String::from).collect::<Vec<_>>()
        };
        assert_eq!(by("techDebt"), vec!["repo_003", "repo_001", "repo_004", "repo_002", "repo_005"]);
        assert_eq!(by("security"), vec!["repo_003", "repo_001", "repo_004", "repo_002", "repo_005"]);
        assert_eq!(by("coverage"), vec!["repo_003", "repo_001", "repo_004", "repo_002", "repo_005"]);
        // repo_002 and repo_005 tie on uptime and keep their order
        assert_eq!(by("uptime"), vec!["repo_004", "repo_003", "repo_001", "repo_002", "repo_005"]);
    }

    #[test]
    fn test_repository_totals() {
        let store = store();
        let result = call(&store, "repository_metrics", json!({"language": "Python"})).unwrap();
        assert_eq!(result["total"], 2);
        assert_eq!(result["totalLinesOfCode"], 235000);
        assert_eq!(result["averageTestCoverage"], 88.0);
        assert_eq!(result["vulnerabilities"]["high"], 3);
        assert_eq!(result["repositories"][0]["totalVulnerabilities"], 25);
    }

    #[test]
    fn test_deployment_timeframes() {
        let store = store();
        let week = call(&store, "deployment_dashboard", json!({})).unwrap();
        assert_eq!(week["timeframe"], "7d");
        assert_eq!(week["total"], 5);
        assert_eq!(week["successful"], 3);
        assert_eq!(week["rolledBack"], 1);
        assert_eq!(week["successRate"], 60.0);
        assert_eq!(week["averageDurationMinutes"], 19.6);
        assert_eq!(
            ids(&week["deployments"]),
            vec!["deploy_005", "deploy_001", "deploy_004", "deploy_002", "deploy_003"]
        );

        let day = call(&store, "deployment_dashboard", json!({"timeframe": "24h"})).unwrap();
        assert_eq!(day["total"], 4);
    }

    #[test]
    fn test_deployment_rejects_unknown_timeframe() {
        let store = store();
        let err = call(&store, "deployment_dashboard", json!({"timeframe": "90d"})).unwrap_err();
        assert_eq!(err.code(), "ORG_INVALID_ARGUMENT");
    }

    #[test]
    fn test_incident_mttr_excludes_unresolved() {
        let store = store();
        let result = call(&store, "incident_analysis", json!({})).unwrap();
        assert_eq!(result["total"], 4);
        assert_eq!(result["resolved"], 2);
        assert_eq!(result["mttrMinutes"], 165);
        assert_eq!(result["mttrMeasured"], 2);
        assert_eq!(result["unresolvedExcluded"], 2);
        assert_eq!(ids(&result["incidents"]), vec!["inc_004", "inc_003", "inc_001", "inc_002"]);

        let day = call(&store, "incident_analysis", json!({"timeframe": "24h"})).unwrap();
        assert_eq!(day["total"], 3);
        assert_eq!(day["mttrMinutes"], 135);
    }

    #[test]
    fn test_code_review_metrics() {
        let store = store();
        let result = call(&store, "code_review_metrics", json!({})).unwrap();
        assert_eq!(result["completed"], 2);
        assert_eq!(result["open"], 2);
        assert_eq!(result["completionRate"], 50.0);
        assert_eq!(result["averageReviewTimeHours"], 12.5);
        assert_eq!(result["averageLinesChanged"], 220);

        let by_reviewer = call(&store, "code_review_metrics", json!({"reviewer": "eng_005"})).unwrap();
        assert_eq!(ids(&by_reviewer["reviews"]), vec!["cr_001", "cr_003"]);
    }

    #[test]
    fn test_oncall_schedule_by_start_date() {
        let store = store();
        let result = call(&store, "oncall_schedule", json!({})).unwrap();
        assert_eq!(ids(&result["rotations"]), vec!["oncall_003", "oncall_001", "oncall_002"]);
        assert_eq!(result["rotations"][0]["engineerName"], "Priya Patel");
        // eng_103 is not on record
        assert_eq!(result["rotations"][0]["escalationNames"], json!(["Lisa Anderson"]));
    }

    #[test]
    fn test_team_health_for_one_team() {
        let store = store();
        let result = call(&store, "team_health_metrics", json!({"team": "Search Platform"})).unwrap();
        assert_eq!(result["team"], "Search Platform");
        assert_eq!(result["velocity"]["engineers"], 2);
        assert_eq!(result["velocity"]["averageProgress"], 65.0);
        assert_eq!(result["quality"]["averageReviewTimeHours"], 6.5);
        assert_eq!(result["incidents"], json!({"total": 1, "open": 0, "mttrMinutes": 135}));
        assert_eq!(result["deployments"]["successRate"], 100.0);
    }

    #[test]
    fn test_team_health_single_metric() {
        let store = store();
        let result = call(&store, "team_health_metrics", json!({"metric": "deployments"})).unwrap();
        assert_eq!(result["team"], Value::Null);
        assert!(result.get("velocity").is_none());
        assert_eq!(result["deployments"]["total"], 5);
        assert_eq!(result["deployments"]["averageDeployFrequency"], 4.4);
    }

    #[test]
    fn test_org_overview() {
        let store = store();
        let overview = view(&store, "engineering://org-overview");
        assert_eq!(overview["totalEngineers"], 9);
        assert_eq!(overview["deploymentsThisWeek"], 5);
        assert_eq!(overview["openIncidents"], 2);
        assert_eq!(overview["avgCodeReviewTimeHours"], 12.5);
        assert_eq!(overview["avgTestCoverage"], 88);
    }

    #[test]
    fn test_team_structure_and_tech_stack() {
        let store = store();
        let structure = view(&store, "engineering://team-structure");
        assert_eq!(structure["Search Platform"].as_array().unwrap().len(), 2);
        assert_eq!(structure["Engineering"][0]["manager"], "None");

        let stack = view(&store, "engineering://tech-stack");
        assert_eq!(
            stack["Python"],
            json!({"repositories": 2, "totalLOC": 235000, "teams": ["Search Platform", "Data Platform"]})
        );
    }

    #[test]
    fn test_quarterly_metrics() {
        let store = store();
        let metrics = view(&store, "engineering://quarterly-metrics");
        assert_eq!(metrics["quarter"], "2024-Q2");
        assert_eq!(metrics["incidentResolutionMinutes"], 165);
        assert_eq!(metrics["testCoverage"], 87.6);
        assert_eq!(metrics["technicalDebtScore"], 5.2);
    }
}
