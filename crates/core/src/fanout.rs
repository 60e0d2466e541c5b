//! Bounded fan-out executor for batch operations.
//!
//! A batch is a `Vec` of per-item arguments and a single-item async
//! operation. Items are queued on a bounded channel and drained by a fixed
//! worker set of `min(limit, items.len())` tasks, so the batch size never
//! dictates how many calls are in flight.
//!
//! # Guarantees
//!
//! - Exactly one [`ItemOutcome`] per input, at the input's position.
//! - An item that errors or panics becomes a `Failure`; siblings are unaffected.
//! - `execute` returns only after every item has an outcome.
//! - Once the [`CancellationToken`] fires, in-flight operations are dropped
//!   and unstarted items are skipped; both yield [`Error::Cancelled`].
//! - No retries.
//!
//! # Example
//!
//! ```ignore
//! let fanout = FanOut::new(8);
//! let outcomes = fanout
//!     .execute(ids, move |id| {
//!         let transport = Arc::clone(&transport);
//!         async move { transport.send(Request::delete(format!("session/{id}"))).await }
//!     })
//!     .await;
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::outcome::ItemOutcome;

/// Default number of concurrent calls per batch.
pub const DEFAULT_CONCURRENCY: usize = 32;

/// Bounded concurrent executor with a shared cancellation token.
#[derive(Debug, Clone)]
pub struct FanOut {
	limit: usize,
	cancel: CancellationToken,
}

impl Default for FanOut {
	fn default() -> Self {
		Self::new(DEFAULT_CONCURRENCY)
	}
}

impl FanOut {
	/// Creates an executor running at most `limit` items at once (minimum 1).
	pub fn new(limit: usize) -> Self {
		Self {
			limit: limit.max(1),
			cancel: CancellationToken::new(),
		}
	}

	/// Replaces the cancellation token, e.g. with a child of a caller's token.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancel = token;
		self
	}

	pub fn limit(&self) -> usize {
		self.limit
	}

	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.cancel
	}

	/// Cancels every batch sharing this executor's token.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Runs `operation` once per item and returns outcomes in input order.
	pub async fn execute<I, T, F, Fut>(&self, items: Vec<I>, operation: F) -> Vec<ItemOutcome<T>>
	where
		I: Send + 'static,
		T: Send + 'static,
		F: Fn(I) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		let total = items.len();
		if total == 0 {
			return Vec::new();
		}

		let workers = self.limit.min(total);
		debug!(items = total, workers, "dispatching batch");

		let (queue_tx, queue_rx) = mpsc::channel::<(usize, I)>(workers);
		let queue_rx = Arc::new(Mutex::new(queue_rx));
		let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(usize, ItemOutcome<T>)>();
		let operation = Arc::new(operation);

		let mut pool = JoinSet::new();
		for worker in 0..workers {
			let queue_rx = Arc::clone(&queue_rx);
			let done_tx = done_tx.clone();
			let operation = Arc::clone(&operation);
			let cancel = self.cancel.clone();
			pool.spawn(async move {
				loop {
					let next = queue_rx.lock().await.recv().await;
					let Some((index, item)) = next else {
						break;
					};
					let outcome = run_item(operation.as_ref(), item, &cancel).await;
					if done_tx.send((index, outcome)).is_err() {
						break;
					}
				}
				debug!(worker, "fan-out worker drained");
			});
		}
		drop(done_tx);

		for (index, item) in items.into_iter().enumerate() {
			if queue_tx.send((index, item)).await.is_err() {
				error!(index, "fan-out queue closed before all items were queued");
				break;
			}
		}
		drop(queue_tx);

		while let Some(joined) = pool.join_next().await {
			if let Err(err) = joined {
				error!(error = %err, "fan-out worker aborted");
			}
		}

		let mut slots: Vec<Option<ItemOutcome<T>>> = (0..total).map(|_| None).collect();
		while let Some((index, outcome)) = done_rx.recv().await {
			slots[index] = Some(outcome);
		}

		slots
			.into_iter()
			.enumerate()
			.map(|(index, slot)| slot.unwrap_or(ItemOutcome::Failure(Error::MissingOutcome(index))))
			.collect()
	}
}

async fn run_item<I, T, F, Fut>(operation: &F, item: I, cancel: &CancellationToken) -> ItemOutcome<T>
where
	F: Fn(I) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	if cancel.is_cancelled() {
		return ItemOutcome::Failure(Error::Cancelled);
	}

	let call = match std::panic::catch_unwind(AssertUnwindSafe(|| operation(item))) {
		Ok(call) => call,
		Err(panic) => return ItemOutcome::Failure(Error::Panicked(panic_message(panic.as_ref()))),
	};

	tokio::select! {
		biased;
		_ = cancel.cancelled() => ItemOutcome::Failure(Error::Cancelled),
		result = AssertUnwindSafe(call).catch_unwind() => match result {
			Ok(result) => result.into(),
			Err(panic) => ItemOutcome::Failure(Error::Panicked(panic_message(panic.as_ref()))),
		},
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic payload".to_string()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	use super::*;

	fn square(x: u64) -> impl Future<Output = Result<u64>> + Send {
		async move { Ok(x * x) }
	}

	#[tokio::test]
	async fn preserves_input_order() {
		let outcomes = FanOut::new(4).execute((0..10).collect(), square).await;
		let values: Vec<u64> = outcomes.into_iter().map(|o| o.into_result().unwrap()).collect();
		assert_eq!(values, (0..10).map(|x| x * x).collect::<Vec<_>>());
	}

	#[tokio::test]
	async fn order_holds_when_completion_is_reversed() {
		let outcomes = FanOut::new(8)
			.execute((0..8u64).collect(), |x| async move {
				tokio::time::sleep(Duration::from_millis(5 * (8 - x))).await;
				Ok::<_, Error>(x)
			})
			.await;
		let values: Vec<u64> = outcomes.into_iter().map(|o| o.into_result().unwrap()).collect();
		assert_eq!(values, (0..8).collect::<Vec<_>>());
	}

	#[tokio::test]
	async fn failing_item_is_isolated() {
		let outcomes = FanOut::new(3)
			.execute((0..10u64).collect(), |x| async move {
				if x == 5 {
					return Err(Error::Protocol("item 5 failed".to_string()));
				}
				Ok(x * x)
			})
			.await;

		assert_eq!(outcomes.len(), 10);
		assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 9);
		assert!(matches!(&outcomes[5], ItemOutcome::Failure(Error::Protocol(msg)) if msg == "item 5 failed"));
		for (i, outcome) in outcomes.iter().enumerate().filter(|(i, _)| *i != 5) {
			assert_eq!(outcome.success(), Some(&((i * i) as u64)));
		}
	}

	#[tokio::test]
	async fn every_failure_permutation_keeps_positions() {
		for mask in 0u32..(1 << 5) {
			let outcomes = FanOut::new(2)
				.execute((0..5u32).collect(), move |x| async move {
					if mask & (1 << x) != 0 {
						Err(Error::Protocol(format!("item {x}")))
					} else {
						Ok(x)
					}
				})
				.await;
			assert_eq!(outcomes.len(), 5);
			for (i, outcome) in outcomes.iter().enumerate() {
				if mask & (1 << i) != 0 {
					assert!(matches!(outcome, ItemOutcome::Failure(Error::Protocol(msg)) if *msg == format!("item {i}")));
				} else {
					assert_eq!(outcome.success(), Some(&(i as u32)));
				}
			}
		}
	}

	#[tokio::test]
	async fn panicking_item_becomes_failure() {
		let outcomes = FanOut::new(2)
			.execute(vec![1u32, 2, 3], |x| async move {
				if x == 2 {
					panic!("item two exploded");
				}
				Ok::<_, Error>(x)
			})
			.await;
		assert_eq!(outcomes[0].success(), Some(&1));
		assert!(matches!(&outcomes[1], ItemOutcome::Failure(Error::Panicked(msg)) if msg == "item two exploded"));
		assert_eq!(outcomes[2].success(), Some(&3));
	}

	#[tokio::test]
	async fn concurrency_never_exceeds_limit() {
		let in_flight = Arc::new(AtomicUsize::new(0));
		let peak = Arc::new(AtomicUsize::new(0));
		let (in_flight_op, peak_op) = (Arc::clone(&in_flight), Arc::clone(&peak));

		let outcomes = FanOut::new(3)
			.execute((0..20u32).collect(), move |x| {
				let in_flight = Arc::clone(&in_flight_op);
				let peak = Arc::clone(&peak_op);
				async move {
					let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
					peak.fetch_max(now, Ordering::SeqCst);
					tokio::time::sleep(Duration::from_millis(2)).await;
					in_flight.fetch_sub(1, Ordering::SeqCst);
					Ok::<_, Error>(x)
				}
			})
			.await;

		assert_eq!(outcomes.len(), 20);
		assert!(outcomes.iter().all(ItemOutcome::is_success));
		assert!(peak.load(Ordering::SeqCst) <= 3, "peak {}", peak.load(Ordering::SeqCst));
		assert_eq!(in_flight.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn runs_items_concurrently_up_to_limit() {
		let started = std::time::Instant::now();
		let outcomes = FanOut::new(10)
			.execute((0..10u32).collect(), |x| async move {
				tokio::time::sleep(Duration::from_millis(50)).await;
				Ok::<_, Error>(x)
			})
			.await;
		assert!(outcomes.iter().all(ItemOutcome::is_success));
		assert!(started.elapsed() < Duration::from_millis(400));
	}

	#[tokio::test]
	async fn empty_batch_returns_immediately() {
		let outcomes = FanOut::new(4).execute(Vec::<u64>::new(), square).await;
		assert!(outcomes.is_empty());
	}

	#[tokio::test]
	async fn cancellation_fails_unfinished_items() {
		let fanout = FanOut::new(2);
		let token = fanout.cancellation_token().clone();

		let outcomes = fanout
			.execute((0..6u32).collect(), move |x| {
				let token = token.clone();
				async move {
					if x == 0 {
						return Ok::<_, Error>(x);
					}
					if x == 1 {
						token.cancel();
					}
					tokio::time::sleep(Duration::from_secs(30)).await;
					Ok::<_, Error>(x)
				}
			})
			.await;

		assert_eq!(outcomes.len(), 6);
		assert!(outcomes[1..].iter().all(|o| matches!(o, ItemOutcome::Failure(Error::Cancelled))));
	}

	#[tokio::test]
	async fn cancelled_before_dispatch_runs_nothing() {
		let calls = Arc::new(AtomicUsize::new(0));
		let calls_op = Arc::clone(&calls);
		let fanout = FanOut::new(4);
		fanout.cancel();

		let outcomes = fanout
			.execute(vec![1u32, 2, 3], move |x| {
				calls_op.fetch_add(1, Ordering::SeqCst);
				async move { Ok::<_, Error>(x) }
			})
			.await;

		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert!(outcomes.iter().all(|o| o.failure().is_some_and(Error::is_cancelled)));
	}

	#[test]
	fn limit_is_at_least_one() {
		assert_eq!(FanOut::new(0).limit(), 1);
		assert_eq!(FanOut::default().limit(), DEFAULT_CONCURRENCY);
	}
}
