use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_view::api::OrderApiClient;
use order_view::config::load_settings;
use order_view::domain::order::{
    project_view, ExpandState, Order, OrderListView, OrderStatus, OrderTab, Role,
    StatusTransitionGuard, StatusUpdateHandler,
};
use order_view::metrics::Metrics;

#[derive(Parser, Debug)]
#[command(name = "order-view", about = "Browse and manage food orders")]
struct Cli {
    /// Settings file (defaults to ./order_view.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Orders you placed, grouped by day
    MyOrders {
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Orders your restaurant received, grouped by day
    RestaurantOrders {
        #[arg(long, value_enum, default_value_t = RestaurantTab::Active)]
        tab: RestaurantTab,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Change the status of one of your restaurant's orders
    SetStatus { order_id: String, status: OrderStatus },
}

#[derive(Args, Debug)]
struct DisplayArgs {
    /// Collapse the group for this day (YYYY-MM-DD); repeatable
    #[arg(long = "collapse", value_name = "DATE")]
    collapsed: Vec<String>,
    /// Print the view model as JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RestaurantTab {
    /// Paid orders
    Active,
    /// Placed but not paid
    Placed,
}

impl From<RestaurantTab> for OrderTab {
    fn from(tab: RestaurantTab) -> Self {
        match tab {
            RestaurantTab::Active => OrderTab::RestaurantOrders,
            RestaurantTab::Placed => OrderTab::RestaurantPlacedOrders,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    // RUST_LOG wins over the configured filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    tracing::debug!(api_base_url = %settings.api_base_url, "Loaded settings");

    let metrics = Arc::new(Metrics::new()?);
    let guard = StatusTransitionGuard::new(settings.transition_policy());
    let client = OrderApiClient::new(
        &settings.api_base_url,
        settings.access_token.clone(),
        settings.request_timeout(),
    )?;

    match cli.command {
        Command::MyOrders { display } => {
            let orders = client.get_my_orders().await?;
            show(&orders, OrderTab::MyOrders, &display, &guard, &metrics)?;
        }
        Command::RestaurantOrders { tab, display } => {
            let orders = client.get_my_restaurant_orders().await?;
            show(&orders, tab.into(), &display, &guard, &metrics)?;
        }
        Command::SetStatus { order_id, status } => {
            let mut order = client
                .get_my_restaurant_orders()
                .await?
                .into_iter()
                .find(|order| order.id == order_id)
                .with_context(|| format!("order {order_id} not found for this restaurant"))?;

            let handler = StatusUpdateHandler::new(client, guard, metrics.clone());
            match handler
                .apply_transition(&mut order, status, Role::RestaurantOwner)
                .await
            {
                Ok(event) => {
                    println!(
                        "{}: {} -> {}",
                        event.order_id,
                        event.from.label(),
                        event.to.label()
                    );
                }
                Err(error) => {
                    if error.revert_status(&mut order) {
                        tracing::info!(order_id = %order.id, status = %order.status, "Reverted optimistic status");
                    }
                    return Err(error.into());
                }
            }
        }
    }

    tracing::debug!(metrics = %metrics.encode_text()?, "Final metrics");
    Ok(())
}

fn show(
    orders: &[Order],
    tab: OrderTab,
    display: &DisplayArgs,
    guard: &StatusTransitionGuard,
    metrics: &Metrics,
) -> anyhow::Result<()> {
    let mut expand_state = ExpandState::new();
    for date in &display.collapsed {
        expand_state.set(date.clone(), false);
    }

    let view = project_view(orders, tab, &expand_state, &Local);
    metrics.record_projection(tab.as_str(), view.total, view.skipped);

    if display.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_text(&view, guard)?);
    }
    Ok(())
}

fn render_text(view: &OrderListView<'_>, guard: &StatusTransitionGuard) -> anyhow::Result<String> {
    let mut out = String::new();

    if view.is_empty() {
        writeln!(out, "No orders found")?;
        return Ok(out);
    }

    writeln!(out, "{} orders", view.total)?;

    for group in &view.groups {
        let marker = if group.expanded { "v" } else { ">" };
        writeln!(
            out,
            "\n{marker} {}  [{}: {}]",
            group.date_key, group.badge_label, group.count
        )?;

        for order in group.visible_orders() {
            let when = order
                .display_date_time(&Local)
                .unwrap_or_else(|_| order.created_at.clone());
            writeln!(
                out,
                "  {when}  {}  {}, {}  {}  {}",
                order.delivery_details.name,
                order.delivery_details.address_line1,
                order.delivery_details.city,
                order.formatted_total(),
                order.status.label(),
            )?;

            for item in &order.cart_items {
                writeln!(out, "      {} x {}", item.quantity, item.name)?;
            }

            if view.tab == OrderTab::MyOrders && order.awaits_payment() {
                writeln!(
                    out,
                    "      ! The order is placed but not paid, so the order is cancelled or invalid."
                )?;
            }

            if group.show_status_selector {
                let options: Vec<&str> = guard
                    .status_options(order.status)
                    .into_iter()
                    .filter(|option| !option.disabled)
                    .map(|option| option.status.as_str())
                    .collect();
                writeln!(out, "      status options: {}", options.join(", "))?;
            }
        }
    }

    Ok(out)
}
