use std::{io, sync::Arc};

use clap::{Args, Parser, Subcommand};
use storefront_cart::{
    actions::CartAction,
    render::write_cart,
    session::{CartSession, DispatchOutcome},
    storefront::StorefrontClient,
};
use tracing::info;

use self::config::{LoggingConfig, StorefrontArgs};

mod config;
pub(crate) mod logging;

#[derive(Debug, Parser)]
#[command(name = "storefront-cart", about = "Storefront cart CLI", long_about = None)]
pub(crate) struct Cli {
    /// Storefront connection settings.
    #[command(flatten)]
    storefront: StorefrontArgs,

    /// Logging output settings.
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the cart
    Show,

    /// Add merchandise to the cart, creating it if needed
    Add(AddArgs),

    /// Set the quantity of a line; zero removes it
    Update(UpdateArgs),

    /// Remove lines
    Remove(RemoveArgs),

    /// Replace the applied discount codes; no codes clears them
    Discount(DiscountArgs),
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Variant to add
    #[arg(long)]
    merchandise_id: String,

    /// Quantity to add
    #[arg(long, default_value_t = 1)]
    quantity: u32,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Line to update
    #[arg(long)]
    line_id: String,

    /// New quantity
    #[arg(long)]
    quantity: u32,
}

#[derive(Debug, Args)]
struct RemoveArgs {
    /// Lines to remove
    #[arg(long = "line-id", required = true)]
    line_ids: Vec<String>,
}

#[derive(Debug, Args)]
struct DiscountArgs {
    /// Codes to apply
    #[arg(long = "code")]
    codes: Vec<String>,
}

impl Commands {
    fn into_action(self) -> Option<CartAction> {
        match self {
            Self::Show => None,
            Self::Add(args) => Some(CartAction::add_line(args.merchandise_id, args.quantity)),
            Self::Update(args) => Some(CartAction::update_line(args.line_id, args.quantity)),
            Self::Remove(args) => Some(CartAction::RemoveLines(
                args.line_ids.into_iter().map(Into::into).collect(),
            )),
            Self::Discount(args) => Some(CartAction::UpdateDiscountCodes(args.codes)),
        }
    }
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let backend = Arc::new(StorefrontClient::new(self.storefront.config()));

        let session = CartSession::load(backend, self.storefront.cart_id())
            .await
            .map_err(|error| format!("failed to load cart: {error}"))?;

        let outcome = match self.command.into_action() {
            Some(action) => Some(
                session
                    .dispatch(action)
                    .await
                    .map_err(|error| format!("invalid cart action: {error}"))?,
            ),
            None => None,
        };

        write_cart(
            &mut io::stdout().lock(),
            &session.projected(),
            &session.pending_errors(),
        )
        .map_err(|error| format!("failed to write cart: {error}"))?;

        match outcome {
            Some(DispatchOutcome::Failed(failure)) => {
                Err(format!("cart mutation failed: {failure}"))
            }
            Some(DispatchOutcome::Applied) => {
                info!(cart_id = ?session.cart_id(), "cart updated");
                Ok(())
            }
            Some(DispatchOutcome::Superseded) | None => Ok(()),
        }
    }
}
