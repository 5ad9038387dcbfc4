//! Server-rendered pages for entering, editing and filtering payments.

use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    error::Result,
    handlers::payment::{DueDateQuery, PaymentState},
    models::payment::{Payment, PaymentSummary, parse_optional_date},
};

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2rem; color: #222; }
nav a { margin-right: 1rem; }
table { border-collapse: collapse; margin-top: 1rem; }
th, td { border: 1px solid #ccc; padding: 0.4rem 0.8rem; text-align: left; }
form label { display: block; margin-top: 0.6rem; }
.hidden { display: none; }
.totals { margin-top: 1rem; font-weight: bold; }
"#;

const ADD_ENTRY_SCRIPT: &str = r#"
const paymentChoice = document.getElementById("payment_date");
const picker = document.getElementById("payment_date_picker");
paymentChoice.addEventListener("change", () => {
    const pick = paymentChoice.value === "pick_date";
    picker.classList.toggle("hidden", !pick);
    picker.required = pick;
    if (!pick) picker.value = "";
});
document.getElementById("entryForm").addEventListener("submit", async (e) => {
    e.preventDefault();
    const form = new FormData(e.target);
    const paymentDate = paymentChoice.value === "pick_date" ? picker.value : null;
    const body = {
        company: form.get("company"),
        amount: form.get("amount"),
        payment_date: paymentDate,
        status: paymentDate ? "paid" : "unpaid",
        due_date: form.get("due_date"),
    };
    const response = await fetch("/api/records", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
    });
    if (response.ok) {
        window.location.reload();
    } else {
        const err = await response.json();
        alert(err.error);
    }
});
"#;

const EDIT_ENTRY_SCRIPT: &str = r#"
const editForm = document.getElementById("editForm");
document.querySelectorAll("button.edit").forEach((button) => {
    button.addEventListener("click", async () => {
        const response = await fetch(`/api/records/${button.dataset.id}`);
        if (!response.ok) { alert("Could not load record."); return; }
        const record = await response.json();
        document.getElementById("editId").value = record.id;
        document.getElementById("editCompany").textContent = record.company;
        document.getElementById("editAmount").value = record.amount;
        document.getElementById("editPaymentDate").value = record.payment_date || "";
        const dueDate = document.getElementById("editDueDate");
        if (![...dueDate.options].some((o) => o.value === record.due_date)) {
            dueDate.add(new Option(record.due_date, record.due_date));
        }
        dueDate.value = record.due_date;
        editForm.classList.remove("hidden");
    });
});
document.querySelectorAll("button.delete").forEach((button) => {
    button.addEventListener("click", async () => {
        if (!confirm("Delete this record?")) return;
        const response = await fetch(`/api/records/${button.dataset.id}`, { method: "DELETE" });
        if (response.ok) { window.location.reload(); } else { alert("Failed to delete record."); }
    });
});
document.getElementById("cancelEdit").addEventListener("click", () => editForm.classList.add("hidden"));
editForm.addEventListener("submit", async (e) => {
    e.preventDefault();
    const id = document.getElementById("editId").value;
    const body = {
        amount: document.getElementById("editAmount").value,
        payment_date: document.getElementById("editPaymentDate").value,
        due_date: document.getElementById("editDueDate").value,
    };
    const response = await fetch(`/api/records/${id}`, {
        method: "PUT",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body),
    });
    if (response.ok) {
        window.location.reload();
    } else {
        const err = await response.json();
        alert(err.error);
    }
});
"#;

const FILTER_SCRIPT: &str = r#"
document.getElementById("filterDueDate").addEventListener("change", (e) => {
    const value = e.target.value;
    window.location.search = value ? `?due_date=${encodeURIComponent(value)}` : "";
});
"#;

#[derive(Debug, Default, Deserialize)]
pub struct CompanyQuery {
    pub company: Option<String>,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Quarterly estimated tax dates: Apr 15, Jun 15, Sep 15 and Jan 15 of the next year.
pub fn quarterly_due_dates(year: i32) -> Vec<NaiveDate> {
    [(year, 4), (year, 6), (year, 9), (year + 1, 1)]
        .into_iter()
        .filter_map(|(y, m)| NaiveDate::from_ymd_opt(y, m, 15))
        .collect()
}

fn render_page(title: &str, content: &str, script: Option<&str>) -> String {
    let script = script
        .map(|s| format!("<script>{}</script>", s))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Tax Tracker</title>
<style>{style}</style>
</head>
<body>
<nav><a href="/">Home</a><a href="/addentry">Add entry</a><a href="/editentry">Edit entries</a><a href="/filterpayments">Filter payments</a></nav>
<h1>{title}</h1>
{content}
{script}
</body>
</html>"#,
        title = escape_html(title),
        style = STYLE,
        content = content,
        script = script,
    )
}

fn due_date_options(selected: Option<NaiveDate>, placeholder: &str) -> String {
    let mut dates = quarterly_due_dates(Utc::now().year());
    if let Some(date) = selected {
        if !dates.contains(&date) {
            dates.push(date);
            dates.sort();
        }
    }

    let mut options = format!(r#"<option value="">{}</option>"#, escape_html(placeholder));
    for date in dates {
        let marker = if Some(date) == selected { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{value}"{marker}>{label}</option>"#,
            value = date,
            marker = marker,
            label = date.format("%B %-d, %Y"),
        ));
    }
    options
}

fn payment_rows(payments: &[Payment], with_actions: bool) -> String {
    if payments.is_empty() {
        let span = if with_actions { 7 } else { 6 };
        return format!(r#"<tr><td colspan="{}">No records</td></tr>"#, span);
    }

    payments
        .iter()
        .map(|p| {
            let actions = if with_actions {
                format!(
                    r#"<td><button class="edit" data-id="{id}">Edit</button> <button class="delete" data-id="{id}">Delete</button></td>"#,
                    id = p.id
                )
            } else {
                String::new()
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td>{}</tr>",
                p.id,
                escape_html(&p.company),
                p.amount,
                p.payment_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                p.status,
                p.due_date,
                actions
            )
        })
        .collect()
}

fn payment_table(id: &str, payments: &[Payment], with_actions: bool) -> String {
    let action_header = if with_actions { "<th>Actions</th>" } else { "" };
    format!(
        r#"<table id="{id}"><thead><tr><th>ID</th><th>Company</th><th>Amount</th><th>Payment date</th><th>Status</th><th>Due date</th>{action_header}</tr></thead><tbody>{rows}</tbody></table>"#,
        id = id,
        action_header = action_header,
        rows = payment_rows(payments, with_actions),
    )
}

pub async fn welcome_page() -> Html<String> {
    let content = r#"<p>Keep track of estimated tax and invoice payments.</p>
<ul>
<li><a href="/addentry">Add a new payment entry</a></li>
<li><a href="/editentry">Edit or delete existing entries</a></li>
<li><a href="/filterpayments">Filter payments by due date</a></li>
</ul>"#;
    Html(render_page("Welcome", content, None))
}

pub async fn add_entry_page(State(state): State<PaymentState>) -> Result<Html<String>> {
    let payments = state.payment_store.list().await?;

    let content = format!(
        r#"<form id="entryForm">
<label>Company <input name="company" required></label>
<label>Amount <input name="amount" type="number" step="0.01" required></label>
<label>Payment date
<select id="payment_date"><option value="not_paid">Not paid yet</option><option value="pick_date">Pick a date</option></select>
<input id="payment_date_picker" type="date" class="hidden">
</label>
<label>Due date <select name="due_date" required>{options}</select></label>
<button type="submit">Save</button>
</form>
{table}"#,
        options = due_date_options(None, "Select due date"),
        table = payment_table("companyTable", &payments, false),
    );

    Ok(Html(render_page("Add entry", &content, Some(ADD_ENTRY_SCRIPT))))
}

pub async fn edit_entry_page(
    State(state): State<PaymentState>,
    Query(query): Query<CompanyQuery>,
) -> Result<Html<String>> {
    let mut payments = state.payment_store.list().await?;
    if let Some(company) = query.company.as_deref().filter(|c| !c.is_empty()) {
        payments.retain(|p| p.company == company);
    }

    let content = format!(
        r#"<form id="editForm" class="hidden">
<input id="editId" type="hidden">
<p>Company: <span id="editCompany"></span></p>
<label>Amount <input id="editAmount" type="number" step="0.01" required></label>
<label>Payment date <input id="editPaymentDate" type="date"></label>
<label>Due date <select id="editDueDate" required>{options}</select></label>
<button type="submit">Save</button> <button type="button" id="cancelEdit">Cancel</button>
</form>
{table}"#,
        options = due_date_options(None, "Select due date"),
        table = payment_table("taxTable", &payments, true),
    );

    Ok(Html(render_page("Edit entries", &content, Some(EDIT_ENTRY_SCRIPT))))
}

pub async fn filter_payments_page(
    State(state): State<PaymentState>,
    Query(query): Query<DueDateQuery>,
) -> Result<Html<String>> {
    let due_date = query.due_date.as_deref();
    let payments = state.payment_store.filter(due_date).await?;
    // Non-ISO input still filters (and matches nothing); it just cannot be preselected
    let selected = parse_optional_date("due_date", due_date).ok().flatten();
    let summary = PaymentSummary::from_payments(&payments);

    let content = format!(
        r#"<label>Due date <select id="filterDueDate">{options}</select></label>
<a id="resetButton" href="/filterpayments">Reset</a>
{table}
<p class="totals">Payments: {count} &middot; Total amount: <span id="totalAmount">${total:.2}</span> &middot; Tax due: <span id="taxDue">${tax:.2}</span></p>"#,
        options = due_date_options(selected, "All due dates"),
        table = payment_table("paymentsTable", &payments, false),
        count = summary.count,
        total = summary.total_amount,
        tax = summary.tax_due,
    );

    Ok(Html(render_page("Filter payments", &content, Some(FILTER_SCRIPT))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::PaymentStatus;

    #[test]
    fn edit_script_offers_the_records_own_due_date() {
        let add = EDIT_ENTRY_SCRIPT
            .find("dueDate.add(new Option(record.due_date, record.due_date))")
            .expect("missing option is added");
        let select = EDIT_ENTRY_SCRIPT
            .find("dueDate.value = record.due_date")
            .expect("due date is selected");
        assert!(add < select);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Acme" & Sons's</b>"#),
            "&lt;b&gt;&quot;Acme&quot; &amp; Sons&#39;s&lt;/b&gt;"
        );
    }

    #[test]
    fn quarterly_dates_span_into_next_year() {
        let dates: Vec<String> = quarterly_due_dates(2024)
            .into_iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(
            dates,
            vec!["2024-04-15", "2024-06-15", "2024-09-15", "2025-01-15"]
        );
    }

    #[test]
    fn selected_date_outside_quarters_is_listed() {
        let selected = NaiveDate::from_ymd_opt(2020, 2, 1);
        let options = due_date_options(selected, "All");
        assert!(options.contains(r#"<option value="2020-02-01" selected>February 1, 2020</option>"#));
    }

    #[test]
    fn rows_escape_company_and_show_missing_payment_date() {
        let payments = vec![Payment {
            id: 3,
            company: "<script>".into(),
            amount: 12.5,
            payment_date: None,
            status: PaymentStatus::Unpaid,
            due_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
        }];

        let rows = payment_rows(&payments, true);
        assert!(rows.contains("&lt;script&gt;"));
        assert!(rows.contains("<td>12.50</td>"));
        assert!(rows.contains("<td>N/A</td>"));
        assert!(rows.contains(r#"data-id="3""#));
        assert_eq!(
            payment_rows(&[], false),
            r#"<tr><td colspan="6">No records</td></tr>"#
        );
    }
}
