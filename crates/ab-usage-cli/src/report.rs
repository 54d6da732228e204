//! Usage and cost report views.
//!
//! Each view prompts for a date range (absolute dates, or bare integers
//! meaning "N hours/days/months ago"), fetches the report and renders it
//! the way operators read it: capped record listings, per-day totals with
//! top services, and per-month cost breakdowns.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io;

use chrono::{DateTime, Datelike, Duration, DurationRound, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

use ab_usage_client::{GroupedQuery, ReportPage, UsageApiClient};
use ab_usage_core::Prompt;

use crate::export;

/// How many records a console listing shows before eliding the rest.
const LISTING_CAP: usize = 20;

/// Run the reports menu until the operator goes back.
///
/// # Errors
///
/// Returns an I/O error when the console is closed mid-session.
pub async fn reports_menu(client: &UsageApiClient, prompt: &mut dyn Prompt) -> io::Result<()> {
    loop {
        prompt.say("\nView usage & cost data:");
        prompt.say("  1. Hourly usage");
        prompt.say("  2. Daily usage (date range)");
        prompt.say("  3. Daily usage summary (grouped)");
        prompt.say("  4. Daily cost report");
        prompt.say("  5. Monthly cost summary");
        prompt.say("  6. Monthly cost by service");
        prompt.say("  0. Back to main menu");

        let choice = prompt.ask("Select option (0-6): ")?;
        match choice.trim() {
            "0" => return Ok(()),
            "1" => hourly(client, prompt).await?,
            "2" => daily(client, prompt).await?,
            "3" => daily_grouped(client, prompt).await?,
            "4" => daily_costs(client, prompt).await?,
            "5" => monthly_tenants(client, prompt).await?,
            "6" => monthly_services(client, prompt).await?,
            _ => prompt.say("Invalid choice"),
        }
    }
}

async fn hourly(client: &UsageApiClient, prompt: &mut dyn Prompt) -> io::Result<()> {
    let input = prompt.ask("Enter usage hour (YYYY-MM-DD HH:00) or hours ago (default 1): ")?;
    let Some(hour) = parse_hour(input.trim()) else {
        prompt.say("Invalid date format");
        return Ok(());
    };

    match client.hourly_usage(hour).await {
        Ok(page) => {
            prompt.say(&format!(
                "\nHourly usage for {}:",
                hour.format("%Y-%m-%d %H:00")
            ));
            display_records(&page, prompt);
            export::prompt_export(prompt, &page.items, "usage data")?;
        }
        Err(e) => prompt.say(&format!("Request failed: {e}")),
    }
    Ok(())
}

async fn daily(client: &UsageApiClient, prompt: &mut dyn Prompt) -> io::Result<()> {
    let Some((from, to)) = ask_day_range(prompt, 7)? else {
        return Ok(());
    };

    match client.daily_usage(from, to).await {
        Ok(page) => {
            prompt.say(&format!(
                "\nDaily usage from {} to {}:",
                from.format("%Y-%m-%d"),
                to.format("%Y-%m-%d")
            ));
            display_daily_usage(&page, prompt);
            export::prompt_export(prompt, &page.items, "daily usage data")?;
        }
        Err(e) => prompt.say(&format!("Request failed: {e}")),
    }
    Ok(())
}

async fn daily_grouped(client: &UsageApiClient, prompt: &mut dyn Prompt) -> io::Result<()> {
    let Some((from, to)) = ask_day_range(prompt, 7)? else {
        return Ok(());
    };

    prompt.say("Optional filters (press Enter to skip):");
    let mut query = GroupedQuery::new(from, to);
    query.provider_csv = optional(prompt.ask("  Provider: ")?);
    query.service_csv = optional(prompt.ask("  Service: ")?);
    query.meter_id_csv = optional(prompt.ask("  Meter ID: ")?);

    match client.daily_usage_grouped(&query).await {
        Ok(report) => {
            if !report.success {
                prompt.say("The server reported a failed query");
            }
            prompt.say(&format!(
                "\nGrouped usage, {} rows (group by {}):",
                report.rows.len(),
                report.metadata.group_by.as_deref().unwrap_or(&query.group_by)
            ));
            display_rows(&report.rows, prompt);
            export::prompt_export(prompt, &report.rows, "grouped data")?;
        }
        Err(e) => prompt.say(&format!("Request failed: {e}")),
    }
    Ok(())
}

async fn daily_costs(client: &UsageApiClient, prompt: &mut dyn Prompt) -> io::Result<()> {
    let Some((from, to)) = ask_day_range(prompt, 7)? else {
        return Ok(());
    };

    match client.daily_costs(from, to).await {
        Ok(page) => {
            prompt.say(&format!(
                "\nDaily costs from {} to {}:",
                from.format("%Y-%m-%d"),
                to.format("%Y-%m-%d")
            ));
            display_daily_costs(&page, prompt);
            export::prompt_export(prompt, &page.items, "daily cost data")?;
        }
        Err(e) => prompt.say(&format!("Request failed: {e}")),
    }
    Ok(())
}

async fn monthly_tenants(client: &UsageApiClient, prompt: &mut dyn Prompt) -> io::Result<()> {
    let Some((from, to)) = ask_month_range(prompt)? else {
        return Ok(());
    };

    match client.monthly_tenant_costs(from, to).await {
        Ok(page) => {
            display_monthly_tenants(&page, prompt);
            export::prompt_export(prompt, &page.items, "monthly cost summary")?;
        }
        Err(e) => prompt.say(&format!("Request failed: {e}")),
    }
    Ok(())
}

async fn monthly_services(client: &UsageApiClient, prompt: &mut dyn Prompt) -> io::Result<()> {
    let Some((from, to)) = ask_month_range(prompt)? else {
        return Ok(());
    };

    match client.monthly_service_costs(from, to).await {
        Ok(page) => {
            display_monthly_services(&page, prompt);
            export::prompt_export(prompt, &page.items, "monthly service cost data")?;
        }
        Err(e) => prompt.say(&format!("Request failed: {e}")),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Date input
// ---------------------------------------------------------------------------

fn ask_day_range(
    prompt: &mut dyn Prompt,
    default_days: i64,
) -> io::Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let from_input =
        prompt.ask(&format!("From date (YYYY-MM-DD) or days ago (default {default_days}): "))?;
    let Some(from) = parse_from_day(from_input.trim(), default_days) else {
        prompt.say("Invalid date format");
        return Ok(None);
    };

    let to_input = prompt.ask("To date (YYYY-MM-DD) or press Enter for today: ")?;
    let Some(to) = parse_to_day(to_input.trim()) else {
        prompt.say("Invalid date format");
        return Ok(None);
    };

    Ok(Some((from, to)))
}

fn ask_month_range(
    prompt: &mut dyn Prompt,
) -> io::Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let from_input = prompt.ask("From date (YYYY-MM-DD) or months ago (default 3): ")?;
    let Some(from) = parse_from_month(from_input.trim(), 3) else {
        prompt.say("Invalid date format");
        return Ok(None);
    };

    let to_input = prompt.ask("To date (YYYY-MM-DD) or press Enter for today: ")?;
    let Some(to) = parse_to_day(to_input.trim()) else {
        prompt.say("Invalid date format");
        return Ok(None);
    };

    Ok(Some((from, to)))
}

/// An hour: blank or an integer N means "N hours ago", otherwise an
/// absolute `YYYY-MM-DD HH:MM` timestamp. The result is truncated to the
/// hour.
fn parse_hour(input: &str) -> Option<DateTime<Utc>> {
    let at = if input.is_empty() {
        Utc::now() - Duration::hours(1)
    } else if let Ok(hours_ago) = input.parse::<i64>() {
        Utc::now() - Duration::hours(hours_ago)
    } else {
        parse_day_time(input)?
    };
    at.duration_trunc(Duration::hours(1)).ok()
}

/// A range start: blank or an integer N means "N days ago", otherwise an
/// absolute date. The result is the start of that day.
fn parse_from_day(input: &str, default_days: i64) -> Option<DateTime<Utc>> {
    let day = if input.is_empty() {
        Utc::now() - Duration::days(default_days)
    } else if let Ok(days_ago) = input.parse::<i64>() {
        Utc::now() - Duration::days(days_ago)
    } else {
        parse_date(input)?
    };
    Some(start_of_day(day))
}

/// A range end: blank means today, an integer N means "N days ago",
/// otherwise an absolute date. The result is the end of that day.
fn parse_to_day(input: &str) -> Option<DateTime<Utc>> {
    let day = if input.is_empty() {
        Utc::now()
    } else if let Ok(days_ago) = input.parse::<i64>() {
        Utc::now() - Duration::days(days_ago)
    } else {
        parse_date(input)?
    };
    Some(end_of_day(day))
}

/// A month-range start: blank or an integer N means "N months ago",
/// otherwise an absolute date. The result is the first day of that month.
fn parse_from_month(input: &str, default_months: i64) -> Option<DateTime<Utc>> {
    let day = if input.is_empty() {
        Utc::now() - Duration::days(default_months * 30)
    } else if let Ok(months_ago) = input.parse::<i64>() {
        Utc::now() - Duration::days(months_ago * 30)
    } else {
        parse_date(input)?
    };
    let first = day.date_naive().with_day0(0).unwrap_or(day.date_naive());
    Some(first.and_time(NaiveTime::MIN).and_utc())
}

fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

fn parse_day_time(input: &str) -> Option<DateTime<Utc>> {
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    at.date_naive().and_time(end).and_utc()
}

fn optional(input: String) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn display_records(page: &ReportPage, prompt: &mut dyn Prompt) {
    let total = page.total_count.unwrap_or(page.items.len() as u64);
    if page.items.is_empty() {
        prompt.say("No usage data found for this period");
        return;
    }
    prompt.say(&format!("Showing {} of {total} records", page.items.len()));

    for (i, item) in page.items.iter().take(LISTING_CAP).enumerate() {
        prompt.say(&format!("\n[Record #{}]", i + 1));
        prompt.say(&format!("  Provider:   {}", str_field(item, "provider")));
        prompt.say(&format!("  Service:    {}", str_field(item, "service")));
        prompt.say(&format!("  Operation:  {}", str_field(item, "operation")));
        let resource: String = str_field(item, "resourceId").chars().take(50).collect();
        prompt.say(&format!("  Resource:   {resource}"));
        prompt.say(&format!("  Meter ID:   {}", str_field(item, "meterId")));
        prompt.say(&format!(
            "  Quantity:   {} {}",
            num_field(item, "quantity"),
            str_field(item, "unit")
        ));
        prompt.say(&format!("  Usage time: {}", str_field(item, "usageStart")));
    }
    elide(page.items.len(), prompt);
}

fn display_daily_usage(page: &ReportPage, prompt: &mut dyn Prompt) {
    if page.items.is_empty() {
        prompt.say("No usage data found for this period");
        return;
    }
    prompt.say(&format!("Found {} daily usage records", page.items.len()));

    for (day, records) in by_key(&page.items, "usageDay") {
        let total: f64 = records.iter().map(|r| num_field(r, "quantity")).sum();
        prompt.say(&format!("\n{day}"));
        prompt.say(&format!("  Records: {}", records.len()));
        prompt.say(&format!("  Total quantity: {total:.2}"));

        let mut services: BTreeMap<String, f64> = BTreeMap::new();
        for record in &records {
            *services
                .entry(str_field(record, "service"))
                .or_default() += num_field(record, "quantity");
        }
        for (service, quantity) in top_by_value(services, 3) {
            prompt.say(&format!("    - {service}: {quantity:.2}"));
        }
    }
}

fn display_rows(rows: &[Value], prompt: &mut dyn Prompt) {
    if rows.is_empty() {
        prompt.say("No usage data found");
        return;
    }
    for (i, row) in rows.iter().take(LISTING_CAP).enumerate() {
        prompt.say(&format!("\n[Row #{}]", i + 1));
        if let Some(fields) = row.as_object() {
            for (key, value) in fields {
                if !value.is_null() {
                    prompt.say(&format!("  {key:<20}: {}", plain(value)));
                }
            }
        }
    }
    elide(rows.len(), prompt);
}

fn display_daily_costs(page: &ReportPage, prompt: &mut dyn Prompt) {
    if page.items.is_empty() {
        prompt.say("No cost data found for this period");
        return;
    }

    let mut grand_total = 0.0;
    for (day, records) in by_key(&page.items, "usageDay") {
        let cost: f64 = records.iter().map(|r| num_field(r, "totalCost")).sum();
        grand_total += cost;
        prompt.say(&format!("\n{day}"));
        prompt.say(&format!("  Cost: ${cost:.4}"));
        prompt.say(&format!("  Records: {}", records.len()));
    }
    prompt.say(&format!("\nTOTAL COST: ${grand_total:.4}"));
}

fn display_monthly_tenants(page: &ReportPage, prompt: &mut dyn Prompt) {
    prompt.say("\nMonthly cost summary:");
    if page.items.is_empty() {
        prompt.say("No cost data found");
        return;
    }

    let mut grand_total = 0.0;
    for (month, records) in by_key(&page.items, "usageMonth") {
        let mut tenants: Vec<(String, f64, String)> = records
            .iter()
            .map(|r| {
                (
                    opt_str_field(r, "tenantId").unwrap_or_else(|| "(No tenant)".to_string()),
                    cost_field(r),
                    opt_str_field(r, "currency").unwrap_or_else(|| "USD".to_string()),
                )
            })
            .collect();
        tenants.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let month_total: f64 = tenants.iter().map(|t| t.1).sum();
        grand_total += month_total;
        prompt.say(&format!("\n{month}"));
        prompt.say(&format!("  Month total: ${month_total:.4}"));
        for (tenant, cost, currency) in tenants {
            prompt.say(&format!("    {tenant:<20} ${cost:>12.4}  {currency}"));
        }
    }
    prompt.say(&format!("\nGRAND TOTAL: ${grand_total:.4}"));
}

fn display_monthly_services(page: &ReportPage, prompt: &mut dyn Prompt) {
    prompt.say("\nMonthly cost by service:");
    if page.items.is_empty() {
        prompt.say("No cost data found");
        return;
    }

    let mut grand_total = 0.0;
    for (month, records) in by_key(&page.items, "usageMonth") {
        let mut services: BTreeMap<String, f64> = BTreeMap::new();
        for record in &records {
            *services.entry(str_field(record, "service")).or_default() += cost_field(record);
        }
        let month_total: f64 = services.values().sum();
        grand_total += month_total;

        prompt.say(&format!("\n{month} - total ${month_total:.4}"));
        for (service, cost) in top_by_value(services, usize::MAX) {
            let pct = if month_total > 0.0 {
                cost / month_total * 100.0
            } else {
                0.0
            };
            prompt.say(&format!("  {service:<30} ${cost:>12.4}  ({pct:>5.1}%)"));
        }
    }
    prompt.say(&format!("\nGRAND TOTAL: ${grand_total:.4}"));
}

fn elide(total: usize, prompt: &mut dyn Prompt) {
    if total > LISTING_CAP {
        prompt.say(&format!("\n... and {} more", total - LISTING_CAP));
    }
}

/// Group records by a string field, sorted by key.
fn by_key<'a>(items: &'a [Value], key: &str) -> BTreeMap<String, Vec<&'a Value>> {
    let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
    for item in items {
        groups
            .entry(opt_str_field(item, key).unwrap_or_else(|| "Unknown".to_string()))
            .or_default()
            .push(item);
    }
    groups
}

fn top_by_value(map: BTreeMap<String, f64>, n: usize) -> Vec<(String, f64)> {
    let mut pairs: Vec<(String, f64)> = map.into_iter().collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    pairs.truncate(n);
    pairs
}

fn str_field(item: &Value, key: &str) -> String {
    opt_str_field(item, key).unwrap_or_else(|| "N/A".to_string())
}

fn opt_str_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(String::from)
}

fn num_field(item: &Value, key: &str) -> f64 {
    item.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Cost under either of the field names the API uses.
fn cost_field(item: &Value) -> f64 {
    item.get("totalCost")
        .or_else(|| item.get("cost"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
