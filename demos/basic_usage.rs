//! Basic usage example for RwDeque
//!
//! Starts traversers, consumers and producers against two deques, lets them
//! run briefly, then tears both deques down while some threads are still
//! blocked. Run with `RUST_LOG=rwdeque=debug` to see the teardown events.

use rwdeque::metrics::MetricsCollector;
use rwdeque::{Error, LinkedDeque};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const VALUES: i32 = 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("RwDeque Usage Example");
    println!("=====================");

    println!("\n1. Sequential:");
    let front = LinkedDeque::new();
    let back = LinkedDeque::new();
    for value in 1..=8 {
        front.push_front(value)?;
        back.push_back(value)?;
    }
    front.traverse(|v| print!(" {}", v))?;
    println!("   <- filled at the front");
    back.traverse(|v| print!(" {}", v))?;
    println!("   <- filled at the back");
    while let (Some(a), Some(b)) = (front.try_pop_back(), back.try_pop_front()) {
        assert_eq!(a, b);
    }

    println!("\n2. Concurrent with teardown:");
    let deques: Vec<Arc<LinkedDeque<i32>>> = (0..2).map(|_| Arc::new(LinkedDeque::new())).collect();
    let mut handles = vec![];

    for deque in &deques {
        let traverser = Arc::clone(deque);
        handles.push(thread::spawn(move || {
            let mut seen = 0;
            match traverser.traverse(|_| seen += 1) {
                Ok(()) => println!("   traversal saw {} values", seen),
                Err(e) => println!("   traversal ended: {}", e),
            }
        }));

        for front in [true, false] {
            let consumer = Arc::clone(deque);
            handles.push(thread::spawn(move || {
                let mut popped = 0;
                for _ in 0..VALUES {
                    let value = if front { consumer.pop_front() } else { consumer.pop_back() };
                    if value.is_none() {
                        break;
                    }
                    popped += 1;
                }
                println!("   consumer ({}) popped {}", if front { "front" } else { "back" }, popped);
            }));

            let producer = Arc::clone(deque);
            handles.push(thread::spawn(move || {
                for value in 0..VALUES {
                    let pushed = if front { producer.push_front(value) } else { producer.push_back(value) };
                    if let Err(e) = pushed {
                        println!("   producer stopped: {}", e);
                        break;
                    }
                }
            }));
        }
    }

    thread::sleep(Duration::from_millis(200));
    for deque in &deques {
        let leftover = deque.deinit();
        println!("   torn down with {} values handed back", leftover.len());
    }

    for handle in handles {
        handle.join().map_err(|_| "worker thread panicked")?;
    }

    println!("\n3. After teardown:");
    let deque = &deques[0];
    match deque.push_back(1) {
        Err(e) if e.error() == &Error::Destroyed => println!("   push rejected, got {} back", e.into_inner()),
        other => println!("   unexpected result: {:?}", other),
    }
    assert_eq!(deque.pop_front(), None);

    let metrics = deque.metrics();
    println!(
        "   {} operations, {:.1}% contended, max {:?}",
        metrics.total_operations,
        metrics.contention_rate(),
        metrics.max_operation_time()
    );

    Ok(())
}
