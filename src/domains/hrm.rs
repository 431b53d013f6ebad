//! Unified HR and engineering domain
//!
//! Employees double as engineers when they carry an engineering level, so
//! the engineering operations here scan the employee collection.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::activity::{deployment_report, incident_report, review_report, CAMEL_CASE};
use super::common::{
    enriched, find_by_id, opt_round0, opt_round1, parse_call, reference_labels, reference_list,
    trailing_days, unit_manager, within_window, NONE_LABEL, NOT_ASSIGNED,
};
use super::{Domain, DomainKind};
use crate::aggregate::{
    count_by, count_map, group_by, group_key, round_int, GroupMetric, NumericSummary,
};
use crate::api::{ApiError, ApiResult, OperationSpec, ParamSpec, ViewSpec};
use crate::executor::{Criterion, Matcher, Query, QueryExecutor, SortDirection, SortKey, SortSpec};
use crate::storage::Record;

const EMPLOYEE_STATUSES: &[&str] = &["active", "inactive", "on_leave"];
const SALARY_GROUPS: &[&str] = &["department", "position", "location"];
const TIME_OFF_STATUSES: &[&str] = &["pending", "approved", "denied"];
const TIME_OFF_TYPES: &[&str] = &["vacation", "sick", "personal", "maternity", "paternity"];
const REVIEW_STATUSES: &[&str] = &["scheduled", "completed", "overdue"];
const LEVELS: &[&str] = &["L3", "L4", "L5", "L6", "L7", "L8", "L9", "L10"];
const ROLES: &[&str] = &["SWE", "SRE", "Data", "ML", "Security", "Manager", "Director", "VP"];
const PROJECT_STATUSES: &[&str] = &["Active", "Planning", "Blocked", "Completed"];
const PRIORITIES: &[&str] = &["P0", "P1", "P2", "P3"];
const ENVIRONMENTS: &[&str] = &["production", "staging", "development"];
const SEVERITIES: &[&str] = &["SEV1", "SEV2", "SEV3", "SEV4"];
const INCIDENT_STATUSES: &[&str] = &["Open", "Investigating", "Resolved"];
const REVIEW_STATES: &[&str] = &["Open", "Merged", "Closed"];

const COMPANY_OVERVIEW: ViewSpec = ViewSpec::new(
    "hrm://company-overview",
    "Company Overview",
    "Headcount, department breakdown and payroll totals",
);
const ORG_CHART: ViewSpec = ViewSpec::new(
    "hrm://org-chart",
    "Organization Chart",
    "Employees grouped by department with their managers",
);
const PAYROLL_SUMMARY: ViewSpec = ViewSpec::new(
    "hrm://payroll-summary",
    "Payroll Summary",
    "Annual payroll and salary totals per department",
);
const TEAM_STRUCTURE: ViewSpec = ViewSpec::new(
    "engineering://team-structure",
    "Engineering Team Structure",
    "Engineers by level and role, with the on-call roster",
);
const TECH_STACK: ViewSpec = ViewSpec::new(
    "engineering://tech-stack",
    "Technology Stack",
    "Skill frequency across engineers and repository languages",
);

pub struct Hrm;

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", content = "arguments", rename_all = "snake_case")]
enum HrmCall {
    SearchEmployees(SearchEmployeesArgs),
    GetEmployeeDetails(EmployeeDetailsArgs),
    GetDepartmentInfo(DepartmentInfoArgs),
    GetSalaryAnalysis(SalaryAnalysisArgs),
    GetTimeOffSummary(TimeOffArgs),
    GetPerformanceReviews(ReviewArgs),
    SearchEngineers(SearchEngineersArgs),
    GetProjectStatus(ProjectStatusArgs),
    RepositoryMetrics(RepositoryMetricsArgs),
    DeploymentDashboard(DeploymentArgs),
    IncidentAnalysis(IncidentArgs),
    CodeReviewMetrics(CodeReviewArgs),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchEmployeesArgs {
    query: Option<String>,
    department: Option<String>,
    position: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeDetailsArgs {
    employee_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DepartmentInfoArgs {
    department_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalaryAnalysisArgs {
    group_by: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TimeOffArgs {
    employee_id: Option<String>,
    status: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReviewArgs {
    employee_id: Option<String>,
    period: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SearchEngineersArgs {
    skill: Option<String>,
    level: Option<String>,
    role: Option<String>,
    is_oncall: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectStatusArgs {
    status: Option<String>,
    priority: Option<String>,
    owner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RepositoryMetricsArgs {
    team: Option<String>,
    language: Option<String>,
    show_vulnerabilities: bool,
}

#[derive(Debug, Deserialize)]
struct DeploymentArgs {
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    repository: Option<String>,
    days: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IncidentArgs {
    severity: Option<String>,
    service: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CodeReviewArgs {
    repository: Option<String>,
    author: Option<String>,
    status: Option<String>,
}

impl Domain for Hrm {
    fn kind(&self) -> DomainKind {
        DomainKind::Hrm
    }

    fn operations(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new("search_employees", "Search employees by name, department, position or status")
                .param(ParamSpec::string("query", "Matches first name, last name, email or id"))
                .param(ParamSpec::string("department", "Department name"))
                .param(ParamSpec::string("position", "Job title (partial match)"))
                .param(ParamSpec::string("status", "Employment status").one_of(EMPLOYEE_STATUSES)),
            OperationSpec::new("get_employee_details", "Full profile of one employee")
                .param(ParamSpec::string("employeeId", "Employee id").required()),
            OperationSpec::new("get_department_info", "Department with manager, members and budget")
                .param(ParamSpec::string("departmentId", "Department id"))
                .param(ParamSpec::string("name", "Department name")),
            OperationSpec::new("get_salary_analysis", "Salary statistics grouped by a category")
                .param(
                    ParamSpec::string("groupBy", "Grouping field")
                        .one_of(SALARY_GROUPS)
                        .default_value("department"),
                ),
            OperationSpec::new("get_time_off_summary", "Time-off requests with per-type totals")
                .param(ParamSpec::string("employeeId", "Employee id"))
                .param(ParamSpec::string("status", "Request status").one_of(TIME_OFF_STATUSES))
                .param(ParamSpec::string("type", "Request type").one_of(TIME_OFF_TYPES)),
            OperationSpec::new("get_performance_reviews", "Performance reviews with average rating")
                .param(ParamSpec::string("employeeId", "Employee id"))
                .param(ParamSpec::string("period", "Review period, e.g. 2024-Q2"))
                .param(ParamSpec::string("status", "Review status").one_of(REVIEW_STATUSES)),
            OperationSpec::new("search_engineers", "Search employees with an engineering level")
                .param(ParamSpec::string("skill", "Skill (partial match)"))
                .param(ParamSpec::string("level", "Engineering level").one_of(LEVELS))
                .param(ParamSpec::string("role", "Engineering role").one_of(ROLES))
                .param(ParamSpec::boolean("isOncall", "Currently on call")),
            OperationSpec::new("get_project_status", "Projects with owners, progress and dependencies")
                .param(ParamSpec::string("status", "Project status").one_of(PROJECT_STATUSES))
                .param(ParamSpec::string("priority", "Project priority").one_of(PRIORITIES))
                .param(ParamSpec::string("owner", "Owner employee id")),
            OperationSpec::new("repository_metrics", "Repository size, quality and security metrics")
                .param(ParamSpec::string("team", "Owning team"))
                .param(ParamSpec::string("language", "Primary language"))
                .param(
                    ParamSpec::boolean("showVulnerabilities", "Include vulnerability counts")
                        .default_value(false),
                ),
            OperationSpec::new("deployment_dashboard", "Deployment outcomes over a trailing window")
                .param(ParamSpec::string("environment", "Target environment").one_of(ENVIRONMENTS))
                .param(ParamSpec::string("repository", "Repository name"))
                .param(ParamSpec::integer("days", "Window length in days").default_value(30)),
            OperationSpec::new("incident_analysis", "Incident counts, MTTR and severity breakdown")
                .param(ParamSpec::string("severity", "Incident severity").one_of(SEVERITIES))
                .param(ParamSpec::string("service", "Affected service"))
                .param(ParamSpec::string("status", "Incident status").one_of(INCIDENT_STATUSES)),
            OperationSpec::new("code_review_metrics", "Code review throughput and review time")
                .param(ParamSpec::string("repository", "Repository name"))
                .param(ParamSpec::string("author", "Author employee id"))
                .param(ParamSpec::string("status", "Review status").one_of(REVIEW_STATES)),
        ]
    }

    fn views(&self) -> Vec<ViewSpec> {
        vec![COMPANY_OVERVIEW, ORG_CHART, PAYROLL_SUMMARY, TEAM_STRUCTURE, TECH_STACK]
    }

    fn execute(
        &self,
        executor: &QueryExecutor<'_>,
        operation: &str,
        args: Map<String, Value>,
    ) -> ApiResult<Value> {
        match parse_call(operation, args)? {
            HrmCall::SearchEmployees(args) => search_employees(executor, args),
            HrmCall::GetEmployeeDetails(args) => employee_details(executor, args),
            HrmCall::GetDepartmentInfo(args) => department_info(executor, args),
            HrmCall::GetSalaryAnalysis(args) => salary_analysis(executor, args),
            HrmCall::GetTimeOffSummary(args) => time_off_summary(executor, args),
            HrmCall::GetPerformanceReviews(args) => performance_reviews(executor, args),
            HrmCall::SearchEngineers(args) => search_engineers(executor, args),
            HrmCall::GetProjectStatus(args) => project_status(executor, args),
            HrmCall::RepositoryMetrics(args) => repository_metrics(executor, args),
            HrmCall::DeploymentDashboard(args) => deployment_dashboard(executor, args),
            HrmCall::IncidentAnalysis(args) => incident_analysis(executor, args),
            HrmCall::CodeReviewMetrics(args) => code_review_metrics(executor, args),
        }
    }

    fn read_view(&self, executor: &QueryExecutor<'_>, uri: &str) -> ApiResult<Value> {
        match uri {
            uri if uri == COMPANY_OVERVIEW.uri => company_overview(executor),
            uri if uri == ORG_CHART.uri => org_chart(executor),
            uri if uri == PAYROLL_SUMMARY.uri => payroll_summary(executor),
            uri if uri == TEAM_STRUCTURE.uri => team_structure(executor),
            uri if uri == TECH_STACK.uri => tech_stack(executor),
            _ => Err(ApiError::UnknownView(uri.to_string())),
        }
    }
}

fn employee_name(executor: &QueryExecutor<'_>, employee: &Record) -> ApiResult<String> {
    Ok(executor.joins().label("employees", employee)?)
}

fn search_employees(executor: &QueryExecutor<'_>, args: SearchEmployeesArgs) -> ApiResult<Value> {
    let query = Query::new("employees")
        .filter_opt(args.query.map(|q| {
            Criterion::any_of(&["firstName", "lastName", "email", "id"], Matcher::Substring(q))
        }))
        .filter_opt(args.department.map(|d| Criterion::exact("department", d)))
        .filter_opt(args.position.map(|p| Criterion::substring("position", p)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)));
    let result = executor.execute(&query)?;

    let joins = executor.joins();
    let employees = result
        .iter()
        .map(|employee| {
            Ok(json!({
                "id": employee.id(),
                "name": employee_name(executor, employee)?,
                "email": employee.get("email"),
                "department": employee.get("department"),
                "position": employee.get("position"),
                "status": employee.get("status"),
                "location": employee.get("location"),
                "manager": joins.resolve_label("employees", employee, "manager", NONE_LABEL)?,
            }))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": result.len(),
        "employees": employees,
    }))
}

fn employee_details(executor: &QueryExecutor<'_>, args: EmployeeDetailsArgs) -> ApiResult<Value> {
    let employee = find_by_id(executor.store(), "employees", &args.employee_id, "Employee")?;
    let joins = executor.joins();

    let department = joins.resolve("employees", employee, "department")?;
    let projects = joins.resolve_many("employees", employee, "currentProjects")?;

    let engineering = if employee.has("engineeringLevel") {
        json!({
            "level": employee.get("engineeringLevel"),
            "role": employee.get("role"),
            "skills": employee.get("skills"),
            "isOncall": employee.bool_field("isOncall").unwrap_or(false),
        })
    } else {
        Value::Null
    };

    let current: Vec<Value> = projects
        .resolved
        .iter()
        .map(|p| {
            json!({
                "id": p.id(),
                "name": p.get("name"),
                "status": p.get("status"),
                "progress": p.get("progress"),
            })
        })
        .collect();

    Ok(json!({
        "employee": employee.to_value(),
        "name": employee_name(executor, employee)?,
        "manager": joins.resolve_label("employees", employee, "manager", NONE_LABEL)?,
        "department": department.record().map(Record::to_value),
        "engineering": engineering,
        "projects": {
            "declared": projects.declared,
            "resolved": current,
            "dangling": projects.dangling,
        },
        "timeOffRequests": joins.referencing("timeOffRequests", "employeeId", employee)?.len(),
        "performanceReviews": joins.referencing("performanceReviews", "employeeId", employee)?.len(),
    }))
}

fn department_info(executor: &QueryExecutor<'_>, args: DepartmentInfoArgs) -> ApiResult<Value> {
    let departments = executor.store().get("departments")?;
    let department = match (&args.department_id, &args.name) {
        (Some(id), _) => departments
            .get_by_id(id)
            .ok_or_else(|| ApiError::not_found("Department", id.as_str()))?,
        (None, Some(name)) => departments
            .find_by("name", name)
            .ok_or_else(|| ApiError::not_found("Department", name.as_str()))?,
        (None, None) => {
            return Err(ApiError::invalid_argument(
                "departmentId",
                "either departmentId or name is required",
            ))
        }
    };

    let joins = executor.joins();
    let headcount = department.number("headcount").filter(|h| *h > 0.0);
    let budget_per_head = department.number("budget").zip(headcount).map(|(b, h)| b / h);

    Ok(json!({
        "department": department.to_value(),
        "manager": unit_manager(&joins, "departments", department)?,
        "members": reference_list(&joins, "departments", department, "members")?,
        "budgetPerHead": opt_round0(budget_per_head),
        "projects": joins
            .referencing("projects", "team", department)?
            .iter()
            .map(|p| p.get("name").cloned().unwrap_or(Value::Null))
            .collect::<Vec<_>>(),
    }))
}

fn salary_analysis(executor: &QueryExecutor<'_>, args: SalaryAnalysisArgs) -> ApiResult<Value> {
    let employees = executor.all("employees")?.records;
    let overall = NumericSummary::over(employees.iter().copied(), "salary");

    // ranked by average salary, highest first; ties keep first-seen order
    let groups: Vec<Value> = group_by(employees.iter().copied(), &args.group_by, "salary")
        .ranked(GroupMetric::Average, SortDirection::Desc)
        .iter()
        .map(|group| {
            json!({
                "group": group.key,
                "count": group.count,
                "averageSalary": opt_round0(group.average()),
                "minSalary": group.min(),
                "maxSalary": group.max(),
                "totalSalary": round_int(group.sum()),
            })
        })
        .collect();

    Ok(json!({
        "groupBy": args.group_by,
        "totalEmployees": employees.len(),
        "totalPayroll": round_int(overall.map(|s| s.sum).unwrap_or(0.0)),
        "averageSalary": opt_round0(overall.map(|s| s.average)),
        "groups": groups,
    }))
}

fn time_off_summary(executor: &QueryExecutor<'_>, args: TimeOffArgs) -> ApiResult<Value> {
    let query = Query::new("timeOffRequests")
        .filter_opt(args.employee_id.map(|e| Criterion::exact("employeeId", e)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)))
        .filter_opt(args.kind.map(|k| Criterion::exact("type", k)));
    let requests = executor.execute(&query)?.records;

    let total_days = NumericSummary::over(requests.iter().copied(), "days").map(|s| s.sum).unwrap_or(0.0);
    let by_type: Vec<Value> = group_by(requests.iter().copied(), "type", "days")
        .iter()
        .map(|group| json!({ "type": group.key, "requests": group.count, "days": group.sum() }))
        .collect();

    let joins = executor.joins();
    let listed = requests
        .iter()
        .map(|request| {
            let employee = joins.resolve_label("timeOffRequests", request, "employeeId", NOT_ASSIGNED)?;
            Ok(enriched(request, vec![("employeeName", json!(employee))]))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": requests.len(),
        "totalDays": total_days,
        "byType": by_type,
        "requests": listed,
    }))
}

fn performance_reviews(executor: &QueryExecutor<'_>, args: ReviewArgs) -> ApiResult<Value> {
    let query = Query::new("performanceReviews")
        .filter_opt(args.employee_id.map(|e| Criterion::exact("employeeId", e)))
        .filter_opt(args.period.map(|p| Criterion::exact("period", p)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)));
    let reviews = executor.execute(&query)?.records;

    let joins = executor.joins();
    let listed = reviews
        .iter()
        .map(|review| {
            let employee = joins.resolve_label("performanceReviews", review, "employeeId", NOT_ASSIGNED)?;
            let reviewer = joins.resolve_label("performanceReviews", review, "reviewerId", NOT_ASSIGNED)?;
            Ok(enriched(
                review,
                vec![("employeeName", json!(employee)), ("reviewerName", json!(reviewer))],
            ))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let mut report = Map::new();
    report.insert("total".into(), json!(reviews.len()));
    if let Some(rating) = NumericSummary::over(reviews.iter().copied(), "overallRating") {
        report.insert("averageRating".into(), opt_round1(Some(rating.average)));
    }
    report.insert("reviews".into(), Value::Array(listed));
    Ok(Value::Object(report))
}

/// Employees carrying an engineering level, in insertion order
fn engineers<'s>(executor: &QueryExecutor<'s>, query: Query) -> ApiResult<Vec<&'s Record>> {
    Ok(executor
        .execute(&query)?
        .records
        .into_iter()
        .filter(|e| e.has("engineeringLevel"))
        .collect())
}

fn search_engineers(executor: &QueryExecutor<'_>, args: SearchEngineersArgs) -> ApiResult<Value> {
    let query = Query::new("employees")
        .filter_opt(args.skill.map(|s| Criterion::list_contains("skills", s)))
        .filter_opt(args.level.map(|l| Criterion::exact("engineeringLevel", l)))
        .filter_opt(args.role.map(|r| Criterion::exact("role", r)))
        .filter_opt(args.is_oncall.map(|o| Criterion::exact("isOncall", o)));
    let matched = engineers(executor, query)?;

    let joins = executor.joins();
    let listed = matched
        .iter()
        .map(|engineer| {
            Ok(json!({
                "id": engineer.id(),
                "name": employee_name(executor, engineer)?,
                "level": engineer.get("engineeringLevel"),
                "role": engineer.get("role"),
                "department": engineer.get("department"),
                "skills": engineer.get("skills"),
                "isOncall": engineer.bool_field("isOncall").unwrap_or(false),
                "projects": reference_labels(&joins, "employees", engineer, "currentProjects")?,
            }))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": matched.len(),
        "engineers": listed,
    }))
}

fn project_status(executor: &QueryExecutor<'_>, args: ProjectStatusArgs) -> ApiResult<Value> {
    let query = Query::new("projects")
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)))
        .filter_opt(args.priority.map(|p| Criterion::exact("priority", p)))
        .filter_opt(args.owner.map(|o| Criterion::exact("owner", o)));
    let projects = executor.execute(&query)?.records;

    let progress = NumericSummary::over(projects.iter().copied(), "progress");
    let budget = NumericSummary::over(projects.iter().copied(), "budget").map(|s| s.sum).unwrap_or(0.0);

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
        "totalBudget": round_int(budget),
        "projects": listed,
    }))
}

fn repository_metrics(executor: &QueryExecutor<'_>, args: RepositoryMetricsArgs) -> ApiResult<Value> {
    let query = Query::new("repositories")
        .filter_opt(args.team.map(|t| Criterion::exact("team", t)))
        .filter_opt(args.language.map(|l| Criterion::exact("language", l)));
    let repositories = executor.execute(&query)?.records;

    let listed: Vec<Value> = repositories
        .iter()
        .map(|repo| {
            let mut value = repo.to_value();
            if !args.show_vulnerabilities {
                if let Some(fields) = value.as_object_mut() {
                    fields.remove("securityVulns");
                }
            }
            value
        })
        .collect();

    let lines = NumericSummary::over(repositories.iter().copied(), "linesOfCode").map(|s| s.sum).unwrap_or(0.0);
    let mut report = json!({
        "total": repositories.len(),
        "totalLinesOfCode": round_int(lines),
        "averageTestCoverage": opt_round1(NumericSummary::over(repositories.iter().copied(), "testCoverage").map(|s| s.average)),
        "averageTechDebt": opt_round1(NumericSummary::over(repositories.iter().copied(), "techDebtScore").map(|s| s.average)),
        "repositories": listed,
    });

    if args.show_vulnerabilities {
        let mut totals = Map::new();
        for severity in ["critical", "high", "medium", "low"] {
            let path = format!("securityVulns.{}", severity);
            let sum = NumericSummary::over(repositories.iter().copied(), &path).map(|s| s.sum).unwrap_or(0.0);
            totals.insert(severity.to_string(), json!(round_int(sum)));
        }
        report["vulnerabilities"] = Value::Object(totals);
    }

    Ok(report)
}

fn deployment_dashboard(executor: &QueryExecutor<'_>, args: DeploymentArgs) -> ApiResult<Value> {
    let length = trailing_days("days", args.days)?;

    let query = Query::new("deployments")
        .filter_opt(args.environment.map(|e| Criterion::exact("environment", e)))
        .filter_opt(args.repository.map(|r| Criterion::exact("repository", r)))
        .sort_by(SortSpec::desc(SortKey::field("timestamp")));
    let deployments = executor.execute(&query)?.records;
    let deployments = within_window(executor, "deployments", deployments, "timestamp", length)?;

    let mut report = deployment_report(executor, &CAMEL_CASE, &deployments)?;
    report["days"] = json!(args.days);
    Ok(report)
}

fn incident_analysis(executor: &QueryExecutor<'_>, args: IncidentArgs) -> ApiResult<Value> {
    let query = Query::new("incidents")
        .filter_opt(args.severity.map(|s| Criterion::exact("severity", s)))
        .filter_opt(args.service.map(|s| Criterion::exact("service", s)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)))
        .sort_by(SortSpec::desc(SortKey::field("createdAt")));
    let incidents = executor.execute(&query)?.records;

    incident_report(executor, &CAMEL_CASE, &incidents, &["Resolved"])
}

fn code_review_metrics(executor: &QueryExecutor<'_>, args: CodeReviewArgs) -> ApiResult<Value> {
    let query = Query::new("codeReviews")
        .filter_opt(args.repository.map(|r| Criterion::exact("repository", r)))
        .filter_opt(args.author.map(|a| Criterion::exact("author", a)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)));
    let reviews = executor.execute(&query)?.records;

    review_report(executor, &CAMEL_CASE, &reviews, &["Merged"])
}

fn company_overview(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let employees = executor.all("employees")?.records;
    let salary = NumericSummary::over(employees.iter().copied(), "salary");

    Ok(json!({
        "totalEmployees": employees.len(),
        "activeEmployees": employees.iter().filter(|e| e.str_field("status") == Some("active")).count(),
        "departmentBreakdown": count_map(employees.iter().copied(), "department"),
        "averageSalary": opt_round0(salary.map(|s| s.average)),
        "totalPayroll": round_int(salary.map(|s| s.sum).unwrap_or(0.0)),
    }))
}

fn org_chart(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let employees = executor.all("employees")?.records;
    let joins = executor.joins();

    let mut chart = Map::new();
    for (department, _) in count_by(employees.iter().copied(), "department") {
        let members = employees
            .iter()
            .filter(|e| group_key(e, "department") == department)
            .map(|employee| {
                Ok(json!({
                    "id": employee.id(),
                    "name": employee_name(executor, employee)?,
                    "position": employee.get("position"),
                    "manager": joins.resolve_label("employees", employee, "manager", NONE_LABEL)?,
                }))
            })
            .collect::<ApiResult<Vec<_>>>()?;
        chart.insert(department, Value::Array(members));
    }
    Ok(Value::Object(chart))
}

fn payroll_summary(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let employees = executor.all("employees")?.records;
    let salary = NumericSummary::over(employees.iter().copied(), "salary");

    let by_department: Map<String, Value> = group_by(employees.iter().copied(), "department", "salary")
        .iter()
        .map(|group| {
            (
                group.key.clone(),
                json!({ "employees": group.count, "totalSalary": round_int(group.sum()) }),
            )
        })
        .collect();

    Ok(json!({
        "totalEmployees": employees.len(),
        "totalAnnualPayroll": round_int(salary.map(|s| s.sum).unwrap_or(0.0)),
        "averageSalary": opt_round0(salary.map(|s| s.average)),
        "salaryByDepartment": by_department,
    }))
}

fn team_structure(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let engineers = engineers(executor, Query::new("employees"))?;
    let oncall = engineers
        .iter()
        .filter(|e| e.bool_field("isOncall") == Some(true))
        .map(|e| employee_name(executor, e))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "totalEngineers": engineers.len(),
        "levelBreakdown": count_map(engineers.iter().copied(), "engineeringLevel"),
        "roleBreakdown": count_map(engineers.iter().copied(), "role"),
        "oncallEngineers": oncall,
    }))
}

fn tech_stack(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let engineers = engineers(executor, Query::new("employees"))?;
    let repositories = executor.all("repositories")?.records;

    let mut skills: Vec<(String, usize)> = Vec::new();
    for skill in engineers.iter().flat_map(|e| e.str_list("skills")) {
        match skills.iter_mut().find(|(s, _)| s == skill) {
            Some((_, n)) => *n += 1,
            None => skills.push((skill.to_string(), 1)),
        }
    }
    // most common first; ties keep first-seen order
    skills.sort_by(|a, b| b.1.cmp(&a.1));

    let frequency: Vec<Value> = skills
        .iter()
        .map(|(skill, count)| json!({ "skill": skill, "engineers": count }))
        .collect();

    Ok(json!({
        "totalSkills": skills.len(),
        "skillFrequency": frequency,
        "repositories": repositories.len(),
        "languages": count_map(repositories.iter().copied(), "language"),
    }))
}
