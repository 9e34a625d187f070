//! Cart table rendering for terminals.

use std::io;

use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};

use crate::{
    projection::{ProjectedCart, ProjectedLine},
    session::PendingError,
};

const PLACEHOLDER: &str = "…";

/// Write the projected cart as a table followed by a short summary.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_cart(
    out: &mut impl io::Write,
    cart: &ProjectedCart,
    errors: &[PendingError],
) -> io::Result<()> {
    if cart.is_empty() {
        writeln!(out, "Your bag is empty.")?;
    } else {
        let mut builder = Builder::default();

        builder.push_record(["#", "Line", "Merchandise", "Qty", "Total", "Status"]);

        for (index, line) in cart.lines.iter().enumerate() {
            builder.push_record([
                format!("{}", index + 1),
                line.id
                    .as_ref()
                    .map_or_else(|| PLACEHOLDER.to_string(), ToString::to_string),
                line.merchandise_id.to_string(),
                line.quantity.to_string(),
                line.cost.as_ref().map_or_else(
                    || PLACEHOLDER.to_string(),
                    |cost| cost.total_amount.to_string(),
                ),
                line_status(line),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(3..5), Alignment::right());
        table.modify(Rows::first(), Alignment::center());

        writeln!(out, "{table}")?;
    }

    if let Some(id) = &cart.id {
        writeln!(out, "cart: {id}")?;
    }

    writeln!(out, "items: {}", cart.badge_count())?;

    if let Some(cost) = &cart.cost {
        let stale = if cart.has_pending() { " (updating)" } else { "" };

        writeln!(out, "subtotal: {}{stale}", cost.subtotal_amount)?;
        writeln!(out, "total: {}{stale}", cost.total_amount)?;
    }

    for code in &cart.discount_codes {
        let verdict = match code.applicable {
            Some(true) => "applied",
            Some(false) => "not applicable",
            None => "pending",
        };

        writeln!(out, "discount {}: {verdict}", code.code)?;
    }

    if let Some(url) = &cart.checkout_url {
        writeln!(out, "checkout: {url}")?;
    }

    for error in errors {
        writeln!(out, "error [{}]: {}", error.key, error.failure)?;
    }

    Ok(())
}

fn line_status(line: &ProjectedLine) -> String {
    if let Some(error) = &line.error {
        return format!("failed: {error}");
    }

    if line.is_optimistic {
        return "adding".to_string();
    }

    String::new()
}
