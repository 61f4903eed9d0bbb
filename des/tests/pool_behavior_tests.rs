//! Behaviour of the server pool as seen by the activities that use it
//!
//! Tests follow the Given-When-Then pattern.

use std::num::NonZeroUsize;

use des::ActivityId;
use des::pool::{Acquire, PoolError, ServerPool};

fn pool(capacity: usize) -> ServerPool {
    ServerPool::new(NonZeroUsize::new(capacity).unwrap())
}

// ============================================================================
// Level 1: Granting and queueing
// ============================================================================

#[test]
fn given_free_units_when_requested_then_granted_immediately() {
    // GIVEN: Pool with two units
    let mut pool = pool(2);

    // WHEN: Two requests arrive
    let first = pool.request(ActivityId(1));
    let second = pool.request(ActivityId(2));

    // THEN: Both hold a unit, nobody waits
    assert!(first.is_granted());
    assert!(second.is_granted());
    assert_eq!(pool.busy_count(), 2);
    assert_eq!(pool.queue_length(), 0);
}

#[test]
fn given_full_pool_when_requested_then_queued() {
    // GIVEN: Single unit already held
    let mut pool = pool(1);
    pool.request(ActivityId(1));

    // WHEN: Another request arrives
    let acquire = pool.request(ActivityId(2));

    // THEN: It waits and busy stays at capacity
    assert!(matches!(acquire, Acquire::Queued(_)));
    assert!(!pool.is_held(acquire.ticket()));
    assert_eq!(pool.busy_count(), 1);
    assert_eq!(pool.queue_length(), 1);
}

// ============================================================================
// Level 2: Release order
// ============================================================================

#[test]
fn given_waiters_when_units_released_then_handed_over_in_arrival_order() {
    // GIVEN: One holder and three waiters
    let mut pool = pool(1);
    let holder = pool.request(ActivityId(1)).ticket();
    let second = pool.request(ActivityId(2)).ticket();
    let third = pool.request(ActivityId(3)).ticket();
    pool.request(ActivityId(4));

    // WHEN: Releases happen one after the other
    let woken_first = pool.release(holder).unwrap();
    let woken_second = pool.release(second).unwrap();
    let woken_third = pool.release(third).unwrap();

    // THEN: Waiters are served first come first served
    assert_eq!(woken_first, Some(ActivityId(2)));
    assert_eq!(woken_second, Some(ActivityId(3)));
    assert_eq!(woken_third, Some(ActivityId(4)));
    assert_eq!(pool.busy_count(), 1);
    assert_eq!(pool.queue_length(), 0);
}

#[test]
fn given_handover_when_observed_then_unit_never_idles() {
    // GIVEN: Full pool with a waiter
    let mut pool = pool(1);
    let holder = pool.request(ActivityId(1)).ticket();
    let waiter = pool.request(ActivityId(2)).ticket();

    // WHEN: The holder releases
    pool.release(holder).unwrap();

    // THEN: The waiter already holds the unit
    assert!(pool.is_held(waiter));
    assert_eq!(pool.busy_count(), 1);
}

#[test]
fn given_no_waiters_when_released_then_unit_becomes_free() {
    let mut pool = pool(3);
    let ticket = pool.request(ActivityId(1)).ticket();

    assert_eq!(pool.release(ticket), Ok(None));
    assert_eq!(pool.busy_count(), 0);
}

// ============================================================================
// Level 3: Misuse
// ============================================================================

#[test]
fn given_released_ticket_when_released_again_then_rejected() {
    // GIVEN: A ticket that has been released once
    let mut pool = pool(1);
    let ticket = pool.request(ActivityId(1)).ticket();
    pool.release(ticket).unwrap();

    // WHEN: It is released a second time
    let result = pool.release(ticket);

    // THEN: The pool refuses and busy does not underflow
    assert_eq!(result, Err(PoolError::NotHeld(ticket)));
    assert_eq!(pool.busy_count(), 0);
}

#[test]
fn given_waiting_ticket_when_released_then_rejected_and_queue_kept() {
    let mut pool = pool(1);
    pool.request(ActivityId(1));
    let waiter = pool.request(ActivityId(2)).ticket();

    assert_eq!(pool.release(waiter), Err(PoolError::NotHeld(waiter)));
    assert_eq!(pool.queue_length(), 1);
}

#[test]
fn given_withdrawn_waiter_when_unit_released_then_next_waiter_served() {
    // GIVEN: Two waiters, the first gives up
    let mut pool = pool(1);
    let holder = pool.request(ActivityId(1)).ticket();
    let quitter = pool.request(ActivityId(2)).ticket();
    pool.request(ActivityId(3));
    assert!(pool.withdraw(quitter));

    // WHEN: The holder releases
    let woken = pool.release(holder).unwrap();

    // THEN: The withdrawn waiter is skipped
    assert_eq!(woken, Some(ActivityId(3)));
    assert!(!pool.withdraw(quitter));
}
