use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Decimal money value kept as its exact decimal text. The API sends
/// decimals as strings ("1200.00") but aggregates may come back as bare
/// numbers, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_f64(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::new(value)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Amount::new(s)),
            Value::Number(n) => Ok(Amount(n.to_string())),
            other => Err(D::Error::custom(format!("expected a decimal amount, got {other}"))),
        }
    }
}

fn lossy_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()).unwrap_or(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Account Manager")]
    AccountManager,
    #[serde(rename = "Team Lead")]
    TeamLead,
    #[serde(rename = "Team Member")]
    TeamMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    pub event_date: NaiveDate,
    pub expected_budget: Amount,
    #[serde(default)]
    pub actual_budget: Option<Amount>,
    #[serde(default)]
    pub expected_attendance: u32,
    #[serde(default)]
    pub expected_revenue: Option<Amount>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub team_lead: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: String,
    pub event_date: NaiveDate,
    pub expected_budget: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_budget: Option<Amount>,
    pub expected_attendance: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_revenue: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_lead: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    #[default]
    NotPaid,
    DepositPaid,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub id: i64,
    pub event: i64,
    pub name: String,
    pub estimated_cost: Amount,
    #[serde(default)]
    pub actual_cost: Option<Amount>,
    #[serde(default)]
    pub status: BudgetStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItemInput {
    pub name: String,
    pub estimated_cost: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BudgetStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub event: i64,
    /// `None` for miscellaneous expenses not tied to a budget line.
    #[serde(default)]
    pub budget_item: Option<i64>,
    pub name: String,
    pub amount: Amount,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub name: String,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_item: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: i64,
    pub event: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ChecklistStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItemInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ChecklistStatus>,
}

impl From<&ChecklistItem> for ChecklistItemInput {
    fn from(item: &ChecklistItem) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            assigned_to: item.assigned_to,
            due_date: item.due_date,
            status: Some(item.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default)]
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTeamMember {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub name: String,
    pub organization_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event: SummaryEvent,
    pub financials: Financials,
    pub checklist: ChecklistProgress,
    pub attendance: Attendance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEvent {
    pub id: i64,
    pub name: String,
    pub status: EventStatus,
    pub event_date: NaiveDate,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub expected_budget: Amount,
    pub budget_items_total: Amount,
    pub expenses_total: Amount,
    pub remaining_budget: Amount,
    #[serde(deserialize_with = "lossy_percent")]
    pub budget_utilization_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistProgress {
    pub total_items: u32,
    pub completed_items: u32,
    #[serde(deserialize_with = "lossy_percent")]
    pub progress_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub expected_attendance: u32,
    #[serde(default)]
    pub expected_revenue: Option<Amount>,
}
