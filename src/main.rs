//! taskcast - live task list broadcaster.
//!
//! One process owns the task list; every mutation is pushed to all
//! connected Server-Sent Events subscribers as a change signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use taskcast::config::Config;
use taskcast::server;
use taskcast::store::{self, TaskStore};

/// Tasks a fresh deployment starts with, so the first subscriber sees a
/// primed snapshot with content in it.
const SEED_TASKS: [&str; 3] = [
    "Review the onboarding doc",
    "Wire up the staging deploy",
    "Triage open bug reports",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("taskcast=info")),
        )
        .init();

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║              taskcast - Live Task Broadcaster              ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    let config = Config::from_env();

    // Pin the uptime reference before anything else starts.
    let _ = &*taskcast::server::routes::health::STARTED_AT;

    // Seed the task list
    let mut tasks = TaskStore::new();
    for title in SEED_TASKS {
        tasks.add_task(title);
    }
    let tasks = store::shared(tasks);
    println!("🔧 Task list seeded with {} tasks", SEED_TASKS.len());

    // Start HTTP server
    println!("🔧 Starting HTTP server...");
    let hub = server::start_server(config.clone(), Arc::clone(&tasks));
    println!(
        "   ✓ HTTP server listening on http://127.0.0.1:{}",
        config.port
    );

    // Shutdown signal
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        println!("\n🛑 Shutdown signal received...");
        shutdown_ctrlc.store(true, Ordering::SeqCst);
    })?;

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("🎯 taskcast is now running!");
    println!("   • GET    /api/tasks            - Current task list");
    println!("   • POST   /api/tasks            - Add a task (rate limited)");
    println!("   • POST   /api/tasks/:id/toggle - Toggle a task");
    println!("   • DELETE /api/tasks/:id        - Remove a task");
    println!("   • GET    /events               - Live updates (SSE)");
    println!(
        "   • Rate limit: {} requests per {}s per client",
        config.max_requests, config.window_secs
    );
    println!("   • Press Ctrl+C to quit");
    println!("════════════════════════════════════════════════════════════════");
    println!();

    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    // Cleanup
    println!("\n⏳ Shutting down...");
    hub.shutdown();
    // Give live sessions a moment to observe their channels closing.
    thread::sleep(Duration::from_millis(100));

    println!("👋 taskcast has exited. Goodbye!");
    Ok(())
}
