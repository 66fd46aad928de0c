//! Dispatch benchmark suite.
//!
//! Measures listener fan-out and hub broadcast at different scales:
//! - Listeners per type: 1, 10, 100
//! - Connected clients: 10, 100, 1000
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use parking_lot::Mutex;
use serde_json::json;

use webext_messaging::logger::NoopLogger;
use webext_messaging::messaging::listener;
use webext_messaging::transport::{
    ConnectHandler, DisconnectHandler, Host, MessageHandler, Port, PortHandle,
};
use webext_messaging::{HubManager, ListenerManager, Message, Role, Selector, TargetId};

// ============================================================================
// Bench Host
// ============================================================================

/// Port that only counts posts, so long runs stay flat in memory.
struct CountingPort {
    name: String,
    posted: AtomicU64,
}

impl Port for CountingPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn post_message(&self, message: &Message) {
        black_box(message);
        self.posted.fetch_add(1, Ordering::Relaxed);
    }

    fn on_message(&self, _handler: MessageHandler) {}

    fn on_disconnect(&self, _handler: DisconnectHandler) {}

    fn disconnect(&self) {}
}

/// Host that hands counting ports to the hub.
#[derive(Default)]
struct BenchHost {
    handlers: Mutex<Vec<ConnectHandler>>,
}

impl BenchHost {
    fn open(&self, name: String) {
        let port: PortHandle = Arc::new(CountingPort {
            name,
            posted: AtomicU64::new(0),
        });
        for handler in self.handlers.lock().iter() {
            handler(Arc::clone(&port));
        }
    }
}

#[async_trait]
impl Host for BenchHost {
    fn connect(&self, name: &str) -> PortHandle {
        Arc::new(CountingPort {
            name: name.to_string(),
            posted: AtomicU64::new(0),
        })
    }

    fn on_connect(&self, handler: ConnectHandler) {
        self.handlers.lock().push(handler);
    }

    async fn resolve_target_id(&self) -> Option<TargetId> {
        None
    }
}

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LISTENER_COUNTS: &[usize] = &[1, 10, 100];
const CLIENT_COUNTS: &[u32] = &[10, 100, 1000];

// ============================================================================
// Benchmark: Listener Fan-out
// ============================================================================

fn bench_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("notify");

    for &count in LISTENER_COUNTS {
        let manager = ListenerManager::new(Arc::new(NoopLogger));
        let subscriptions: Vec<_> = (0..count)
            .map(|_| {
                manager.subscribe(
                    "tick",
                    listener(|message, _| {
                        black_box(&message.data);
                        Ok(())
                    }),
                )
            })
            .collect();

        let message = Message::new("tick", json!({ "n": 1 }));

        group.bench_with_input(BenchmarkId::new("listeners", count), &count, |b, _| {
            b.iter(|| manager.notify(black_box(&message), None));
        });

        for subscription in &subscriptions {
            subscription.unsubscribe();
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Hub Broadcast
// ============================================================================

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");

    for &count in CLIENT_COUNTS {
        let host = Arc::new(BenchHost::default());
        let hub = HubManager::new(host.clone(), Arc::new(NoopLogger));

        for target in 0..count {
            for role in Role::ALL {
                host.open(format!("{role}:{target}"));
            }
        }
        assert_eq!(hub.connection_count(), count as usize * Role::COUNT);

        let message = Message::empty("refresh");

        group.bench_with_input(BenchmarkId::new("all", count), &count, |b, _| {
            b.iter(|| hub.send_message(Selector::all(), black_box(message.clone())));
        });

        group.bench_with_input(BenchmarkId::new("role", count), &count, |b, _| {
            b.iter(|| hub.send_message(Selector::role(Role::Popup), black_box(message.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_notify, bench_broadcast);
criterion_main!(benches);
