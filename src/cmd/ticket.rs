use std::path::PathBuf;

use clap::Args;

use crate::context::AppContext;
use crate::domain::attachment::{SUGGESTED_ATTACHMENT_LIMIT, download_names};
use crate::domain::form::{FormKind, SelectionRejected, TicketForm};
use crate::domain::ticket::{Ticket, TicketEdit, parse_status_color};
use crate::error::AppResult;
use crate::infra::attachments::read_local_file;
use crate::workflow::page::{PageChange, PageKind, TicketPage};
use crate::workflow::search::{UserSearch, resolve_user};
use crate::workflow::sync::BatchOutcome;

#[derive(Args, Debug, Clone, Default)]
pub struct TicketFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// User-facing ticket label.
    #[arg(long = "id", conflicts_with = "generate_id")]
    pub label: Option<String>,
    /// Replace the label with a generated UUID.
    #[arg(long)]
    pub generate_id: bool,
    /// Status title, e.g. "In progress".
    #[arg(long)]
    pub status: Option<String>,
    /// Status color as `#rrggbb` or `r,g,b`.
    #[arg(long, value_parser = parse_color_arg)]
    pub color: Option<String>,
    /// Assign a user by user name. Repeatable.
    #[arg(long = "assign", value_name = "USER")]
    pub assign: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub fields: TicketFields,
    /// Attach a local file. Repeatable; up to 10 files are recommended.
    #[arg(long = "attach", value_name = "PATH")]
    pub attach: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Internal id of an owned or assigned ticket.
    pub internal_id: String,
    #[command(flatten)]
    pub fields: TicketFields,
    /// Remove an assignee by id or user name. Repeatable.
    #[arg(long = "unassign", value_name = "USER")]
    pub unassign: Vec<String>,
}

fn parse_color_arg(value: &str) -> Result<String, String> {
    parse_status_color(value).ok_or_else(|| format!("'{value}' is not #rrggbb or r,g,b"))
}

pub async fn list(ctx: &AppContext, kind: PageKind) -> AppResult<()> {
    let page = TicketPage::load(kind, ctx.backend.clone(), ctx.session.clone()).await?;

    let heading = match page.kind() {
        PageKind::Dashboard => "Dashboard",
        PageKind::MyTickets => "My Tickets",
    };
    println!("{heading}");
    if page.owned().is_empty() {
        println!("  No personally created tickets available.");
    }
    for ticket in page.owned() {
        println!("  {}", ticket_line(ticket));
    }

    if page.kind() == PageKind::Dashboard {
        println!("\nAssigned Tickets");
        if page.assigned().is_empty() {
            println!("  No assigned tickets available.");
        }
        for entry in page.assigned() {
            println!("  {}  owner: {}", ticket_line(&entry.ticket), entry.owner_id);
        }
    }
    Ok(())
}

pub async fn create(ctx: &AppContext, args: CreateArgs) -> AppResult<()> {
    let mut page = TicketPage::load(PageKind::MyTickets, ctx.backend.clone(), ctx.session.clone())
        .await?;
    let mut form = page.open_new();

    apply_fields(ctx, &mut form, &args.fields).await?;
    if args.attach.len() > SUGGESTED_ATTACHMENT_LIMIT {
        eprintln!(
            "Warning: {} attachments given, at most {SUGGESTED_ATTACHMENT_LIMIT} are recommended.",
            args.attach.len()
        );
    }
    for path in &args.attach {
        form.attach(read_local_file(path).await?);
    }

    let change = page.submit(form.save()).await?;
    if let Some(ticket) = page.owned().last() {
        println!("Created {}", ticket_line(ticket));
    }
    report(change)
}

pub async fn edit(ctx: &AppContext, args: EditArgs) -> AppResult<()> {
    let mut page = TicketPage::load(PageKind::Dashboard, ctx.backend.clone(), ctx.session.clone())
        .await?;
    let mut form = page.open_ticket(&args.internal_id).await?;

    apply_fields(ctx, &mut form, &args.fields).await?;
    for needle in &args.unassign {
        let user_id = form
            .draft()
            .users
            .iter()
            .find(|user| user.user_id == *needle || user.user_name.eq_ignore_ascii_case(needle))
            .map(|user| user.user_id.clone());
        match user_id {
            Some(user_id) => {
                form.remove_user(&user_id);
            }
            None => eprintln!("Warning: '{needle}' is not assigned to this ticket."),
        }
    }

    let kind = form.kind();
    let change = page.submit(form.save()).await?;
    match kind {
        FormKind::Assigned => println!("Updated assigned ticket {}", args.internal_id),
        _ => println!("Updated ticket {}", args.internal_id),
    }
    report(change)
}

pub async fn delete(ctx: &AppContext, internal_id: &str) -> AppResult<()> {
    let mut page = TicketPage::load(PageKind::Dashboard, ctx.backend.clone(), ctx.session.clone())
        .await?;
    let form = page.open_ticket(internal_id).await?;

    let change = page.submit(form.delete()).await?;
    println!("Deleted ticket {internal_id}");
    report(change)
}

/// Writes every attachment of a ticket into `out_dir`.
pub async fn files(ctx: &AppContext, internal_id: &str, out_dir: PathBuf) -> AppResult<()> {
    let page = TicketPage::load(PageKind::Dashboard, ctx.backend.clone(), ctx.session.clone())
        .await?;
    let form = page.open_ticket(internal_id).await?;
    let attachments = &form.draft().attachments;

    if attachments.is_empty() {
        println!("Ticket {internal_id} has no attachments.");
        return Ok(());
    }

    tokio::fs::create_dir_all(&out_dir).await?;
    for (attachment, (id, name)) in attachments.iter().zip(download_names(attachments)) {
        let target = out_dir.join(&name);
        tokio::fs::write(&target, &attachment.data).await?;
        tracing::debug!(attachment = %id, path = %target.display(), "attachment written");
        println!(
            "{}  {}  {} bytes",
            target.display(),
            attachment.content_type,
            attachment.data.len()
        );
    }
    Ok(())
}

pub async fn search(ctx: &AppContext, query: &str) -> AppResult<()> {
    let mut search = UserSearch::new();
    search.search(ctx.backend.as_ref(), query).await?;
    if search.results().is_empty() {
        println!("No users found for '{}'.", search.query().trim());
    }
    for user in search.results() {
        println!("{}  {}", user.user_id, user.user_name);
    }
    Ok(())
}

async fn apply_fields(
    ctx: &AppContext,
    form: &mut TicketForm,
    fields: &TicketFields,
) -> AppResult<()> {
    if let Some(title) = &fields.title {
        form.apply(TicketEdit::Title(title.clone()));
    }
    if let Some(description) = &fields.description {
        form.apply(TicketEdit::Description(description.clone()));
    }
    if let Some(category) = &fields.category {
        form.apply(TicketEdit::Category(category.clone()));
    }
    if fields.generate_id {
        form.apply(TicketEdit::GenerateLabel(true));
    }
    if let Some(label) = &fields.label {
        if form.draft().uuid {
            form.apply(TicketEdit::GenerateLabel(false));
        }
        form.apply(TicketEdit::Label(label.clone()));
    }
    if let Some(status) = &fields.status {
        form.apply(TicketEdit::StatusTitle(status.clone()));
    }
    if let Some(color) = &fields.color {
        form.apply(TicketEdit::StatusColor(color.clone()));
    }

    for needle in &fields.assign {
        let user = resolve_user(ctx.backend.as_ref(), needle).await?;
        match form.select_user(user) {
            Ok(()) => {}
            Err(SelectionRejected::SelfAssignment) => {
                eprintln!("Warning: a ticket cannot be assigned to its owner; skipped '{needle}'.")
            }
            Err(SelectionRejected::AlreadySelected) => {
                eprintln!("Warning: '{needle}' is already assigned.")
            }
        }
    }
    Ok(())
}

fn report(change: PageChange) -> AppResult<()> {
    let batch = match change {
        PageChange::Saved(batch) | PageChange::Deleted(batch) => batch,
        PageChange::Unchanged => return Ok(()),
    };
    print_batch(&batch);
    batch.into_result().map(|_| ())
}

fn print_batch(batch: &BatchOutcome) {
    for user in &batch.assigned {
        println!("  assigned {}", user.user_name);
    }
    for user in &batch.unassigned {
        println!("  unassigned {}", user.user_name);
    }
    for failure in &batch.failures {
        eprintln!(
            "  failed to {} {}: {}",
            failure.action, failure.user.user_name, failure.reason
        );
    }
}

fn ticket_line(ticket: &Ticket) -> String {
    let label = if ticket.id.is_empty() {
        "-"
    } else {
        ticket.id.as_str()
    };
    let status = if ticket.ticket_status.status_title.is_empty() {
        "no status"
    } else {
        ticket.ticket_status.status_title.as_str()
    };
    let users = if ticket.users.is_empty() {
        "none".to_string()
    } else {
        ticket.assignee_names()
    };
    format!(
        "[{}] {} {}  category: {}  status: {}  users: {}",
        ticket.internal_id, label, ticket.title, ticket.category, status, users
    )
}
