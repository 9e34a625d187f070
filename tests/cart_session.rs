use std::sync::Arc;

use testresult::TestResult;

use storefront_cart::prelude::*;

use crate::support::{FakeStorefront, quantities};

mod support;

const CART: &str = "gid://fake/Cart/existing";

async fn session_for(fake: &Arc<FakeStorefront>) -> Result<CartSession, CartError> {
    CartSession::load(Arc::clone(fake) as Arc<dyn CartBackend>, Some(CartId::new(CART))).await
}

fn two_line_store() -> Arc<FakeStorefront> {
    Arc::new(FakeStorefront::with_cart(
        CART,
        &[("line-a", "variant-a", 1), ("line-b", "variant-b", 2)],
    ))
}

#[tokio::test]
async fn settled_session_matches_backend_cart() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;

    session.dispatch(CartAction::update_line("line-a", 3)).await?;
    session.dispatch(CartAction::add_line("variant-c", 1)).await?;
    session.dispatch(CartAction::remove_line("line-b")).await?;

    let snapshot = fake.cart().ok_or("backend has no cart")?;
    let projected = session.projected();

    assert_eq!(session.snapshot(), Some(snapshot.clone()));
    assert_eq!(projected, project(Some(&snapshot), &[]));
    assert_eq!(projected.pending, 0);
    assert_eq!(projected.badge_count(), 4);
    assert!(projected.lines.iter().all(|line| !line.is_optimistic));

    Ok(())
}

#[tokio::test]
async fn stale_in_flight_result_is_discarded() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;
    let line_a = CartLineId::new("line-a");

    let hold = fake.hold_next();
    let stale = session.enqueue(CartAction::update_line("line-a", 3))?;

    let in_flight = tokio::spawn({
        let session = session.clone();
        async move { session.submit(stale).await }
    });

    hold.entered().await;

    let current = session.enqueue(CartAction::update_line("line-a", 5))?;

    assert_eq!(session.projected().line(&line_a).map(|line| line.quantity), Some(5));
    assert_eq!(session.projected().pending, 1);

    hold.release();

    assert_eq!(in_flight.await?, DispatchOutcome::Superseded);

    // The stale confirmation for 3 never reaches the snapshot.
    let snapshot = session.snapshot().ok_or("session has no snapshot")?;
    assert_eq!(snapshot.line(&line_a).map(|line| line.quantity), Some(1));
    assert_eq!(session.projected().line(&line_a).map(|line| line.quantity), Some(5));

    assert_eq!(session.submit(current).await, DispatchOutcome::Applied);
    assert_eq!(session.projected().line(&line_a).map(|line| line.quantity), Some(5));
    assert_eq!(session.projected().pending, 0);

    Ok(())
}

#[tokio::test]
async fn optimistic_add_is_replaced_by_confirmed_line() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;
    let variant = MerchandiseId::new("variant-c");

    let ticket = session.enqueue(CartAction::add_line("variant-c", 2))?;

    let optimistic = session.projected();
    let added = optimistic.lines.last().ok_or("projection has no lines")?;

    assert!(added.is_optimistic);
    assert_eq!(added.id, None);
    assert_eq!(added.quantity, 2);
    assert_eq!(optimistic.badge_count(), 5);

    assert_eq!(session.submit(ticket).await, DispatchOutcome::Applied);

    let confirmed = session.projected();
    let matching: Vec<_> = confirmed
        .lines
        .iter()
        .filter(|line| line.merchandise_id == variant)
        .collect();

    assert_eq!(matching.len(), 1);
    assert!(matching.iter().all(|line| !line.is_optimistic && line.id.is_some()));
    assert_eq!(confirmed.badge_count(), 5);

    Ok(())
}

#[tokio::test]
async fn rejected_update_keeps_confirmed_quantity() -> TestResult {
    let fake = two_line_store();
    fake.set_stock(5);

    let session = session_for(&fake).await?;
    let line_b = CartLineId::new("line-b");

    let outcome = session.dispatch(CartAction::update_line("line-b", 10)).await?;

    assert!(
        matches!(&outcome, DispatchOutcome::Failed(CartFailure::Rejected(errors)) if errors.len() == 1),
        "expected a rejection, got {outcome:?}"
    );

    let projected = session.projected();
    let line = projected.line(&line_b).ok_or("line-b missing")?;

    assert_eq!(line.quantity, 2);
    assert!(line.error.is_some());
    assert_eq!(projected.pending, 0);

    let errors = session.pending_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.first().map(|error| error.key.targets().to_vec()),
        Some(vec!["line-b".to_string()])
    );

    Ok(())
}

#[tokio::test]
async fn retry_after_network_failure_clears_error() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;
    let line_a = CartLineId::new("line-a");

    fake.fail_network(true);

    let failed = session.dispatch(CartAction::update_line("line-a", 2)).await?;
    assert!(
        matches!(failed, DispatchOutcome::Failed(CartFailure::Network(_))),
        "expected a network failure, got {failed:?}"
    );
    assert_eq!(session.pending_errors().len(), 1);

    fake.fail_network(false);

    let retried = session.dispatch(CartAction::update_line("line-a", 2)).await?;

    assert_eq!(retried, DispatchOutcome::Applied);
    assert!(session.pending_errors().is_empty());
    assert_eq!(session.projected().line(&line_a).map(|line| line.quantity), Some(2));

    Ok(())
}

#[tokio::test]
async fn zero_quantity_update_removes_line() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;
    let line_a = CartLineId::new("line-a");

    let ticket = session.enqueue(CartAction::update_line("line-a", 0))?;
    assert!(session.projected().line(&line_a).is_none());

    assert_eq!(session.submit(ticket).await, DispatchOutcome::Applied);
    assert!(session.projected().line(&line_a).is_none());
    assert_eq!(session.projected().badge_count(), 2);

    Ok(())
}

#[tokio::test]
async fn update_then_remove_converges_to_removed() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;
    let line_a = CartLineId::new("line-a");

    let update = session.enqueue(CartAction::update_line("line-a", 4))?;
    let remove = session.enqueue(CartAction::remove_line("line-a"))?;

    assert!(session.projected().line(&line_a).is_none());

    assert_eq!(session.submit(update).await, DispatchOutcome::Applied);
    assert!(session.projected().line(&line_a).is_none());

    assert_eq!(session.submit(remove).await, DispatchOutcome::Applied);
    assert!(session.projected().line(&line_a).is_none());
    assert_eq!(quantities(&session.projected()), vec![(Some("line-b".to_string()), 2)]);

    Ok(())
}

#[tokio::test]
async fn independent_lines_commute() -> TestResult {
    let mut results = Vec::new();

    for update_first in [true, false] {
        let fake = two_line_store();
        let session = session_for(&fake).await?;

        let update = session.enqueue(CartAction::update_line("line-a", 4))?;
        let remove = session.enqueue(CartAction::remove_line("line-b"))?;

        let order = if update_first {
            [update, remove]
        } else {
            [remove, update]
        };

        for ticket in order {
            assert_eq!(session.submit(ticket).await, DispatchOutcome::Applied);
        }

        results.push(session.projected());
    }

    let [first, second] = results.as_slice() else {
        return Err("expected two projections".into());
    };

    assert_eq!(first, second);
    assert_eq!(quantities(first), vec![(Some("line-a".to_string()), 4)]);

    Ok(())
}

#[tokio::test]
async fn superseded_actions_are_never_sent() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;

    let first = session.enqueue(CartAction::update_line("line-a", 2))?;
    let second = session.enqueue(CartAction::update_line("line-a", 3))?;

    assert_eq!(session.submit(first).await, DispatchOutcome::Superseded);
    assert_eq!(fake.calls(), 0);

    assert_eq!(session.submit(second).await, DispatchOutcome::Applied);
    assert_eq!(fake.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn concurrent_first_adds_create_one_cart() -> TestResult {
    let fake = Arc::new(FakeStorefront::new());
    let session = CartSession::load(Arc::clone(&fake) as Arc<dyn CartBackend>, None).await?;

    let hold = fake.hold_next();
    let first = session.enqueue(CartAction::add_line("variant-x", 1))?;
    let second = session.enqueue(CartAction::add_line("variant-y", 2))?;

    assert_eq!(session.projected().badge_count(), 3);
    assert_eq!(session.projected().id, None);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit(first).await }
    });

    hold.entered().await;

    let second = tokio::spawn({
        let session = session.clone();
        async move { session.submit(second).await }
    });

    hold.release();

    assert_eq!(first.await?, DispatchOutcome::Applied);
    assert_eq!(second.await?, DispatchOutcome::Applied);
    assert_eq!(fake.carts_created(), 1);

    let projected = session.projected();

    assert_eq!(projected.id, fake.cart().map(|cart| cart.id));
    assert_eq!(projected.lines.len(), 2);
    assert_eq!(projected.badge_count(), 3);
    assert!(projected.lines.iter().all(|line| !line.is_optimistic));

    Ok(())
}

#[tokio::test]
async fn superseded_first_add_still_provides_cart_id() -> TestResult {
    let fake = Arc::new(FakeStorefront::new());
    let session = CartSession::load(Arc::clone(&fake) as Arc<dyn CartBackend>, None).await?;

    let hold = fake.hold_next();
    let first = session.enqueue(CartAction::add_line("variant-x", 1))?;

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit(first).await }
    });

    hold.entered().await;

    let second = session.enqueue(CartAction::add_line("variant-x", 1))?;
    assert_eq!(session.projected().pending, 1);

    hold.release();

    assert_eq!(first.await?, DispatchOutcome::Superseded);

    let created = fake.cart().map(|cart| cart.id);
    assert!(created.is_some());
    assert_eq!(session.cart_id(), created);

    assert_eq!(session.submit(second).await, DispatchOutcome::Applied);
    assert_eq!(fake.carts_created(), 1);
    assert_eq!(session.cart_id(), created);

    let projected = session.projected();
    assert_eq!(projected.pending, 0);
    assert_eq!(projected.lines.len(), 1);
    assert!(projected.lines.iter().all(|line| !line.is_optimistic));

    Ok(())
}

#[tokio::test]
async fn line_mutations_without_cart_are_refused() -> TestResult {
    let fake = Arc::new(FakeStorefront::new());
    let session = CartSession::load(Arc::clone(&fake) as Arc<dyn CartBackend>, None).await?;

    let result = session.dispatch(CartAction::remove_line("line-a")).await;

    assert!(matches!(result, Err(CartError::NoCart)), "got {result:?}");
    assert_eq!(fake.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn subscribers_see_optimistic_and_confirmed_states() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;
    let line_a = CartLineId::new("line-a");
    let mut updates = session.subscribe();

    let ticket = session.enqueue(CartAction::update_line("line-a", 7))?;

    assert!(updates.has_changed()?);
    {
        let optimistic = updates.borrow_and_update();
        assert_eq!(optimistic.pending, 1);
        assert_eq!(optimistic.line(&line_a).map(|line| line.quantity), Some(7));
    }

    assert_eq!(session.submit(ticket).await, DispatchOutcome::Applied);

    assert!(updates.has_changed()?);
    let confirmed = updates.borrow_and_update();
    assert_eq!(confirmed.pending, 0);
    assert_eq!(
        confirmed
            .line(&line_a)
            .and_then(|line| line.cost.as_ref())
            .map(|cost| cost.total_amount.to_string()),
        Some("70 GBP".to_string())
    );

    Ok(())
}

#[tokio::test]
async fn discount_codes_project_before_confirmation() -> TestResult {
    let fake = two_line_store();
    let session = session_for(&fake).await?;

    let ticket = session.enqueue(CartAction::UpdateDiscountCodes(vec!["SAVE10".to_string()]))?;

    let pending = session.projected();
    assert_eq!(pending.discount_codes.len(), 1);
    assert!(pending.discount_codes.iter().all(|code| code.applicable.is_none()));
    assert!(!pending.has_applicable_discount());

    assert_eq!(session.submit(ticket).await, DispatchOutcome::Applied);
    assert!(session.projected().has_applicable_discount());

    Ok(())
}
