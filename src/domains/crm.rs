//! Customer relationship domain: customers, account managers, orders and
//! support tickets

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::common::{enriched, find_by_id, opt_round0, opt_round1, parse_call, to_values, NOT_ASSIGNED};
use super::{Domain, DomainKind};
use crate::aggregate::{
    count_in, count_map, group_by, group_key, group_pairs, round_int, DurationSummary, GroupMetric,
    NumericSummary, Rate, UNKNOWN_GROUP,
};
use crate::api::{ApiError, ApiResult, OperationSpec, ParamSpec, ViewSpec};
use crate::executor::{Criterion, Matcher, Query, QueryExecutor, SortDirection};
use crate::join::{Reference, UNKNOWN_LABEL};
use crate::storage::Record;

const TIERS: &[&str] = &["enterprise", "growth", "starter"];
const CUSTOMER_STATUSES: &[&str] = &["active", "trial", "churned"];
const ORDER_STATUSES: &[&str] = &["pending", "shipped", "delivered", "cancelled"];
const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];
const TICKET_STATUSES: &[&str] = &["open", "in_progress", "resolved", "closed"];

/// Ticket states that count as handled
const TICKET_DONE: &[&str] = &["resolved", "closed"];

const SUMMARY: ViewSpec = ViewSpec::new(
    "crm://summary",
    "CRM Summary",
    "Customer, revenue, order and support totals",
);

pub struct Crm;

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", content = "arguments", rename_all = "snake_case")]
enum CrmCall {
    SearchCustomers(SearchCustomersArgs),
    GetCustomerDetails(CustomerDetailsArgs),
    GetOrderSummary(OrderSummaryArgs),
    SupportTicketAnalysis(TicketAnalysisArgs),
    RevenueByTier(NoArgs),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SearchCustomersArgs {
    query: Option<String>,
    tier: Option<String>,
    status: Option<String>,
    min_revenue: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerDetailsArgs {
    customer_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OrderSummaryArgs {
    customer_id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TicketAnalysisArgs {
    customer_id: Option<String>,
    priority: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoArgs {}

impl Domain for Crm {
    fn kind(&self) -> DomainKind {
        DomainKind::Crm
    }

    fn operations(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new("search_customers", "Search customers by name, email, tier, status or revenue")
                .param(ParamSpec::string("query", "Matches customer name, email or id"))
                .param(ParamSpec::string("tier", "Customer tier").one_of(TIERS))
                .param(ParamSpec::string("status", "Account status").one_of(CUSTOMER_STATUSES))
                .param(ParamSpec::number("minRevenue", "Minimum annual revenue (inclusive)")),
            OperationSpec::new("get_customer_details", "Customer profile with account manager, orders and tickets")
                .param(ParamSpec::string("customerId", "Customer id").required()),
            OperationSpec::new("get_order_summary", "Order totals, status breakdown and revenue by tier")
                .param(ParamSpec::string("customerId", "Restrict to one customer"))
                .param(ParamSpec::string("status", "Order status").one_of(ORDER_STATUSES)),
            OperationSpec::new("support_ticket_analysis", "Resolution rate and time, priority breakdown")
                .param(ParamSpec::string("customerId", "Restrict to one customer"))
                .param(ParamSpec::string("priority", "Ticket priority").one_of(PRIORITIES))
                .param(ParamSpec::string("status", "Ticket status").one_of(TICKET_STATUSES)),
            OperationSpec::new("revenue_by_tier", "Customer revenue grouped by tier"),
        ]
    }

    fn views(&self) -> Vec<ViewSpec> {
        vec![SUMMARY]
    }

    fn execute(
        &self,
        executor: &QueryExecutor<'_>,
        operation: &str,
        args: Map<String, Value>,
    ) -> ApiResult<Value> {
        match parse_call(operation, args)? {
            CrmCall::SearchCustomers(args) => search_customers(executor, args),
            CrmCall::GetCustomerDetails(args) => customer_details(executor, args),
            CrmCall::GetOrderSummary(args) => order_summary(executor, args),
            CrmCall::SupportTicketAnalysis(args) => ticket_analysis(executor, args),
            CrmCall::RevenueByTier(NoArgs {}) => revenue_by_tier(executor),
        }
    }

    fn read_view(&self, executor: &QueryExecutor<'_>, uri: &str) -> ApiResult<Value> {
        match uri {
            uri if uri == SUMMARY.uri => summary(executor),
            _ => Err(ApiError::UnknownView(uri.to_string())),
        }
    }
}

fn search_customers(executor: &QueryExecutor<'_>, args: SearchCustomersArgs) -> ApiResult<Value> {
    let query = Query::new("customers")
        .filter_opt(args.query.map(|q| Criterion::any_of(&["name", "email", "id"], Matcher::Substring(q))))
        .filter_opt(args.tier.map(|t| Criterion::exact("tier", t)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)))
        .filter_opt(args.min_revenue.map(|r| Criterion::at_least("revenue", r)));
    let result = executor.execute(&query)?;

    let joins = executor.joins();
    let customers = result
        .iter()
        .map(|customer| {
            let manager = joins.resolve_label("customers", customer, "accountManager", NOT_ASSIGNED)?;
            Ok(enriched(customer, vec![("accountManagerName", json!(manager))]))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": result.len(),
        "customers": customers,
    }))
}

fn customer_details(executor: &QueryExecutor<'_>, args: CustomerDetailsArgs) -> ApiResult<Value> {
    let customer = find_by_id(executor.store(), "customers", &args.customer_id, "Customer")?;
    let joins = executor.joins();

    let manager = joins.resolve_label("customers", customer, "accountManager", NOT_ASSIGNED)?;
    let orders = joins.referencing("orders", "customerId", customer)?;
    let tickets = joins.referencing("supportTickets", "customerId", customer)?;

    // cancelled orders never count towards lifetime value
    let lifetime = orders
        .iter()
        .filter(|o| o.str_field("status") != Some("cancelled"))
        .filter_map(|o| o.number("amount"))
        .sum::<f64>();
    let open_tickets = tickets.len() - count_in(tickets.iter().copied(), "status", TICKET_DONE);

    Ok(json!({
        "customer": customer.to_value(),
        "accountManager": manager,
        "orders": to_values(&orders),
        "supportTickets": to_values(&tickets),
        "lifetimeValue": round_int(lifetime),
        "openTickets": open_tickets,
    }))
}

/// Tier of the customer an order belongs to; `"Unknown"` when the customer
/// does not resolve
fn order_tier(executor: &QueryExecutor<'_>, order: &Record) -> ApiResult<String> {
    Ok(match executor.joins().resolve("orders", order, "customerId")? {
        Reference::Resolved(customer) => group_key(customer, "tier"),
        _ => UNKNOWN_GROUP.to_string(),
    })
}

fn order_summary(executor: &QueryExecutor<'_>, args: OrderSummaryArgs) -> ApiResult<Value> {
    let query = Query::new("orders")
        .filter_opt(args.customer_id.map(|c| Criterion::exact("customerId", c)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)));
    let orders = executor.execute(&query)?.records;

    let amounts = NumericSummary::over(orders.iter().copied(), "amount");

    let tiers = orders
        .iter()
        .map(|order| Ok((order_tier(executor, order)?, order.number("amount"))))
        .collect::<ApiResult<Vec<_>>>()?;
    let by_tier: Vec<Value> = group_pairs(tiers)
        .ranked(GroupMetric::Sum, SortDirection::Desc)
        .iter()
        .map(|group| {
            json!({
                "tier": group.key,
                "orders": group.count,
                "revenue": round_int(group.sum()),
            })
        })
        .collect();

    let joins = executor.joins();
    let listed = orders
        .iter()
        .map(|order| {
            let customer = joins.resolve_label("orders", order, "customerId", UNKNOWN_LABEL)?;
            Ok(enriched(order, vec![("customerName", json!(customer))]))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "totalOrders": orders.len(),
        "totalValue": round_int(amounts.map(|a| a.sum).unwrap_or(0.0)),
        "averageOrderValue": opt_round0(amounts.map(|a| a.average)),
        "statusBreakdown": count_map(orders.iter().copied(), "status"),
        "revenueByTier": by_tier,
        "orders": listed,
    }))
}

fn ticket_analysis(executor: &QueryExecutor<'_>, args: TicketAnalysisArgs) -> ApiResult<Value> {
    let query = Query::new("supportTickets")
        .filter_opt(args.customer_id.map(|c| Criterion::exact("customerId", c)))
        .filter_opt(args.priority.map(|p| Criterion::exact("priority", p)))
        .filter_opt(args.status.map(|s| Criterion::exact("status", s)));
    let tickets = executor.execute(&query)?.records;

    let resolved = count_in(tickets.iter().copied(), "status", TICKET_DONE);
    let durations = DurationSummary::between(tickets.iter().copied(), "createdAt", "resolvedAt");

    let joins = executor.joins();
    let listed = tickets
        .iter()
        .map(|ticket| {
            let customer = joins.resolve_label("supportTickets", ticket, "customerId", UNKNOWN_LABEL)?;
            let assignee = joins.resolve_label("supportTickets", ticket, "assignee", NOT_ASSIGNED)?;
            Ok(enriched(
                ticket,
                vec![("customerName", json!(customer)), ("assigneeName", json!(assignee))],
            ))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(json!({
        "total": tickets.len(),
        "resolved": resolved,
        "resolutionRate": Rate::of(resolved, tickets.len()),
        "averageResolutionHours": opt_round1(durations.average_hours()),
        "unresolvedExcluded": durations.excluded,
        "priorityBreakdown": count_map(tickets.iter().copied(), "priority"),
        "statusBreakdown": count_map(tickets.iter().copied(), "status"),
        "tickets": listed,
    }))
}

fn revenue_by_tier(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let customers = executor.all("customers")?.records;
    let total = NumericSummary::over(customers.iter().copied(), "revenue").map(|s| s.sum).unwrap_or(0.0);

    let tiers: Vec<Value> = group_by(customers.iter().copied(), "tier", "revenue")
        .ranked(GroupMetric::Sum, SortDirection::Desc)
        .iter()
        .map(|group| {
            json!({
                "tier": group.key,
                "customers": group.count,
                "totalRevenue": round_int(group.sum()),
                "averageRevenue": opt_round0(group.average()),
            })
        })
        .collect();

    Ok(json!({
        "totalRevenue": round_int(total),
        "tiers": tiers,
    }))
}

fn summary(executor: &QueryExecutor<'_>) -> ApiResult<Value> {
    let customers = executor.all("customers")?.records;
    let orders = executor.all("orders")?.records;
    let tickets = executor.all("supportTickets")?.records;

    let revenue = NumericSummary::over(customers.iter().copied(), "revenue").map(|s| s.sum).unwrap_or(0.0);
    let order_value = NumericSummary::over(orders.iter().copied(), "amount").map(|s| s.sum).unwrap_or(0.0);

    Ok(json!({
        "totalCustomers": customers.len(),
        "activeCustomers": count_in(customers.iter().copied(), "status", &["active"]),
        "tierBreakdown": count_map(customers.iter().copied(), "tier"),
        "statusBreakdown": count_map(customers.iter().copied(), "status"),
        "totalRevenue": round_int(revenue),
        "totalOrders": orders.len(),
        "totalOrderValue": round_int(order_value),
        "openTickets": tickets.len() - count_in(tickets.iter().copied(), "status", TICKET_DONE),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::load_store;
    use crate::storage::RecordStore;

    fn store() -> RecordStore {
        load_store(DomainKind::Crm, None).unwrap()
    }

    fn call(store: &RecordStore, operation: &str, args: Value) -> ApiResult<Value> {
        let spec = Crm
            .operations()
            .into_iter()
            .find(|op| op.name == operation)
            .unwrap();
        let args = spec.validate(&args)?;
        Crm.execute(&QueryExecutor::new(store), operation, args)
    }

    fn ids(list: &Value) -> Vec<&str> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_search_by_tier() {
        let store = store();
        let result = call(&store, "search_customers", json!({"tier": "enterprise"})).unwrap();
        assert_eq!(result["total"], 2);
        assert_eq!(ids(&result["customers"]), vec!["cust_001", "cust_003"]);
    }

    #[test]
    fn test_min_revenue_is_inclusive() {
        let store = store();
        let result = call(&store, "search_customers", json!({"minRevenue": 45000})).unwrap();
        assert_eq!(
            ids(&result["customers"]),
            vec!["cust_001", "cust_002", "cust_003", "cust_005", "cust_006"]
        );
    }

    #[test]
    fn test_search_query_matches_email_case_insensitive() {
        let store = store();
        let result = call(&store, "search_customers", json!({"query": "BRIGHTSIDE.IO"})).unwrap();
        assert_eq!(ids(&result["customers"]), vec!["cust_002"]);
    }

    #[test]
    fn test_account_manager_labels() {
        let store = store();
        let result = call(&store, "search_customers", json!({})).unwrap();
        let customers = result["customers"].as_array().unwrap();
        assert_eq!(customers[0]["accountManagerName"], "Nadia Okafor");
        // null manager vs dangling manager
        assert_eq!(customers[3]["accountManagerName"], "not assigned");
        assert_eq!(customers[4]["accountManagerName"], "Unknown");
    }

    #[test]
    fn test_customer_details() {
        let store = store();
        let result = call(&store, "get_customer_details", json!({"customerId": "cust_001"})).unwrap();
        assert_eq!(result["accountManager"], "Nadia Okafor");
        assert_eq!(ids(&result["orders"]), vec!["ord_001", "ord_002"]);
        assert_eq!(result["lifetimeValue"], 60500);
        assert_eq!(result["openTickets"], 0);
    }

    #[test]
    fn test_missing_customer_is_not_found() {
        let store = store();
        let err = call(&store, "get_customer_details", json!({"customerId": "cust_999"})).unwrap_err();
        assert_eq!(err.code(), "ORG_NOT_FOUND");
        assert!(err.to_string().contains("cust_999"));
    }

    #[test]
    fn test_order_summary_revenue_by_tier() {
        let store = store();
        let result = call(&store, "get_order_summary", json!({})).unwrap();
        assert_eq!(result["totalOrders"], 6);
        assert_eq!(result["totalValue"], 163700);
        assert_eq!(result["averageOrderValue"], 27283);

        let tiers = result["revenueByTier"].as_array().unwrap();
        assert_eq!(tiers[0], json!({"tier": "enterprise", "orders": 3, "revenue": 136500}));
        assert_eq!(tiers[1], json!({"tier": "growth", "orders": 2, "revenue": 24000}));
        assert_eq!(tiers[2], json!({"tier": "Unknown", "orders": 1, "revenue": 3200}));

        let orders = result["orders"].as_array().unwrap();
        assert_eq!(orders[5]["customerName"], "Unknown");
    }

    #[test]
    fn test_empty_order_summary() {
        let store = store();
        let result = call(&store, "get_order_summary", json!({"customerId": "cust_004"})).unwrap();
        assert_eq!(result["totalOrders"], 0);
        assert_eq!(result["totalValue"], 0);
        assert_eq!(result["averageOrderValue"], Value::Null);
    }

    #[test]
    fn test_ticket_analysis() {
        let store = store();
        let result = call(&store, "support_ticket_analysis", json!({})).unwrap();
        assert_eq!(result["total"], 4);
        assert_eq!(result["resolved"], 2);
        assert_eq!(result["resolutionRate"], 50.0);
        assert_eq!(result["averageResolutionHours"], 25.8);
        assert_eq!(result["unresolvedExcluded"], 2);
        let tickets = result["tickets"].as_array().unwrap();
        assert_eq!(tickets[3]["assigneeName"], "Unknown");
    }

    #[test]
    fn test_ticket_rate_over_nothing() {
        let store = store();
        let result = call(&store, "support_ticket_analysis", json!({"customerId": "cust_004"})).unwrap();
        assert_eq!(result["total"], 0);
        assert_eq!(result["resolutionRate"], "n/a");
        assert_eq!(result["averageResolutionHours"], Value::Null);
    }

    #[test]
    fn test_revenue_by_tier_ranked() {
        let store = store();
        let result = call(&store, "revenue_by_tier", json!({})).unwrap();
        assert_eq!(result["totalRevenue"], 844000);
        let tiers: Vec<_> = result["tiers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["tier"].as_str().unwrap())
            .collect();
        assert_eq!(tiers, vec!["enterprise", "growth", "starter"]);
        assert_eq!(result["tiers"][1]["customers"], 3);
    }

    #[test]
    fn test_summary_view() {
        let store = store();
        let view = Crm.read_view(&QueryExecutor::new(&store), "crm://summary").unwrap();
        assert_eq!(view["totalCustomers"], 6);
        assert_eq!(view["activeCustomers"], 4);
        assert_eq!(view["openTickets"], 2);
        assert!(Crm.read_view(&QueryExecutor::new(&store), "crm://nope").is_err());
    }
}
