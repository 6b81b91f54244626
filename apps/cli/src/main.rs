use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use client_core::{load_settings, TransferApi, TransferClient};
use shared::{
    domain::{CompanyId, TransferId, TransferState, WarehouseId},
    protocol::{Page, ReceiveTransferRequest, Transfer, TransferFilter, TransferQuery},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "transfers", about = "Inspect, receive and revert warehouse transfers")]
struct Args {
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List transfers arriving at one warehouse.
    List {
        #[arg(long)]
        company: i64,
        #[arg(long)]
        destination: i64,
        #[arg(long)]
        origin: Option<i64>,
        /// EN_TRANSITO, RECIBIDO, RECIBIDO_PARCIAL, RECIBIDO_SOBRANTE or PERDIDO.
        #[arg(long)]
        state: Option<TransferState>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sent_from: Option<NaiveDate>,
        #[arg(long)]
        sent_to: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Record the reception of an in-transit transfer.
    Receive {
        id: i64,
        #[arg(long, allow_negative_numbers = true)]
        quantity: f64,
        #[arg(long)]
        notes: Option<String>,
        /// Local time as "YYYY-MM-DD HH:MM"; defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
    /// Put a received transfer back in transit.
    Revert {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(raw) = args.api_base_url.as_deref() {
        settings = settings.with_base_url(raw)?;
    }
    if let Some(token) = args.token {
        settings = settings.with_auth_token(token);
    }
    let client = TransferClient::from_settings(&settings)?;

    match args.command {
        Command::List {
            company,
            destination,
            origin,
            state,
            search,
            sent_from,
            sent_to,
            page,
            page_size,
        } => {
            if let (Some(from), Some(to)) = (sent_from, sent_to) {
                if from > to {
                    bail!("--sent-from must not be after --sent-to");
                }
            }
            let filter = TransferFilter {
                origin_warehouse: origin.map(WarehouseId),
                state,
                search: search.filter(|search| !search.trim().is_empty()),
                sent_from,
                sent_to,
                ..TransferFilter::new(CompanyId(company), WarehouseId(destination))
            };
            let query = TransferQuery {
                page: page.max(1),
                page_size: page_size.unwrap_or(settings.page_size),
                filter,
            };
            let result = client.list_transfers(&query).await?;
            print!("{}", render_page(&query, &result));
        }
        Command::Receive {
            id,
            quantity,
            notes,
            at,
        } => {
            let quantity = validate_quantity(quantity)?;
            let received_at = match at.as_deref() {
                Some(raw) => parse_local_time(raw)?,
                None => Utc::now(),
            };
            let request = ReceiveTransferRequest {
                received_quantity: quantity,
                notes: notes.filter(|notes| !notes.trim().is_empty()),
                received_at: Some(received_at),
            };
            let transfer = client
                .receive_transfer(TransferId(id), &request)
                .await
                .with_context(|| format!("receiving transfer #{id}"))?;
            println!(
                "Transfer #{} is now {}",
                transfer.id,
                transfer.state.label()
            );
        }
        Command::Revert { id, yes } => {
            let confirmed = yes
                || confirm(
                    &format!("Revert the reception of transfer #{id}?"),
                    &mut io::stdin().lock(),
                    &mut io::stdout(),
                )?;
            if !confirmed {
                println!("Aborted");
                return Ok(());
            }
            let transfer = client
                .revert_reception(TransferId(id))
                .await
                .with_context(|| format!("reverting transfer #{id}"))?;
            println!(
                "Transfer #{} is back to {}",
                transfer.id,
                transfer.state.label()
            );
        }
    }

    Ok(())
}

fn validate_quantity(quantity: f64) -> Result<f64> {
    if !quantity.is_finite() || quantity < 0.0 {
        bail!("--quantity must be zero or greater");
    }
    Ok(quantity)
}

fn parse_local_time(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M")
        .with_context(|| format!("'{raw}' is not a time like 2024-03-01 14:30"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .with_context(|| format!("'{raw}' does not exist in the local time zone"))
}

fn confirm(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn render_page(query: &TransferQuery, page: &Page<Transfer>) -> String {
    let mut out = String::new();
    if page.results.is_empty() {
        out.push_str("No transfers match the filter.\n");
        return out;
    }
    out.push_str(&format!(
        "{:>6}  {:<16}  {:<20}  {:<24}  {:>10}  {:>10}  {:<18}  {}\n",
        "#", "SENT", "ORIGIN", "PRODUCT", "SENT QTY", "RECEIVED", "STATE", "ACTION"
    ));
    for row in &page.results {
        let action = row
            .state
            .available_action()
            .map(|action| action.label())
            .unwrap_or("-");
        let received = row
            .received_quantity
            .map(|qty| qty.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>6}  {:<16}  {:<20}  {:<24}  {:>10}  {:>10}  {:<18}  {}\n",
            row.id.0,
            row.sent_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            row.origin_display(),
            row.product_display(),
            row.sent_quantity,
            received,
            row.state.label(),
            action
        ));
    }
    let pages = page.count.div_ceil(u64::from(query.page_size.max(1))).max(1);
    out.push_str(&format!(
        "Page {} of {} ({} transfers)\n",
        query.page, pages, page.count
    ));
    out
}
