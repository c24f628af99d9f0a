use leaddesk_core::LeadListController;
use leaddesk_core::Notice;
use leaddesk_core::Severity;
use leaddesk_protocol::Lead;
use owo_colors::OwoColorize;
use serde_json::json;

/// Notices go to stderr; stdout is reserved for data.
pub(crate) fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.severity {
            Severity::Info => eprintln!("{}", notice.message),
            Severity::Error => eprintln!("{} {}", "error:".red().bold(), notice.message),
        }
    }
}

pub(crate) fn print_page(controller: &LeadListController, as_json: bool) -> anyhow::Result<()> {
    let query = controller.query();
    let page = controller.page();
    if as_json {
        let value = json!({
            "unitId": controller.unit_id(),
            "address": controller.address(),
            "page": query.page,
            "pageSize": query.page_size.get(),
            "total": page.total(),
            "items": page.items(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if page.items().is_empty() {
        println!("No leads match this view.");
        return Ok(());
    }
    for lead in page.items() {
        println!("{}", row(lead));
    }
    let pages = query.last_page(page.total()) + 1;
    println!(
        "Page {} of {pages} ({} leads)",
        query.page + 1,
        page.total()
    );
    Ok(())
}

fn row(lead: &Lead) -> String {
    let dash = |value: Option<&str>| value.unwrap_or("-").to_string();
    let assignees = if lead.assigned_to.is_empty() {
        "-".to_string()
    } else {
        lead.assigned_to.join(",")
    };
    [
        lead.id.clone(),
        lead.name.clone(),
        dash(lead.phone.as_deref()),
        dash(lead.email.as_deref()),
        dash(lead.status_id.as_deref()),
        dash(lead.tag_id.as_deref()),
        assignees,
    ]
    .join("\t")
}
