use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use lithos_config::{ContentionConfig, SlotKind};
use lithos_perf::*;
use lithos_slot::{MutexSlot, RingSlot};

/// Reads per reader in the report's contention section.
const REPORT_ITERATIONS: u64 = 200_000;

/// Writes per writer in the ring size sweep.
const SWEEP_WRITES: u64 = 100_000;

#[derive(Debug, serde::Serialize)]
struct SweepResult {
    ring_size: usize,
    writers: usize,
    writes: u64,
    elapsed_ns: u64,
    ns_per_write: f64,
}

fn main() {
    let cfg = match std::env::args().nth(1) {
        Some(path) => match ContentionConfig::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("  [invalid config: {e}]");
                std::process::exit(2);
            }
        },
        None => ContentionConfig {
            iterations: REPORT_ITERATIONS,
            ..ContentionConfig::default()
        },
    };

    // ═══════════════════════════════════════════════════════════════════════
    // 1. Banner
    // ═══════════════════════════════════════════════════════════════════════
    print_banner(&cfg);

    // ═══════════════════════════════════════════════════════════════════════
    // 2. Uncontended operations
    // ═══════════════════════════════════════════════════════════════════════
    let results = section_uncontended();

    // ═══════════════════════════════════════════════════════════════════════
    // 3. Reader/writer contention
    // ═══════════════════════════════════════════════════════════════════════
    let reports = section_contention(&cfg);

    // ═══════════════════════════════════════════════════════════════════════
    // 4. Ring size sweep (writers only)
    // ═══════════════════════════════════════════════════════════════════════
    let sweep = section_ring_sweep(cfg.writer_count.max(2));

    // ═══════════════════════════════════════════════════════════════════════
    // 5. JSON Output
    // ═══════════════════════════════════════════════════════════════════════
    save_results(&cfg, &results, &reports, &sweep);

    if reports.iter().any(|r| r.verify().is_err()) {
        std::process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Banner
// ═══════════════════════════════════════════════════════════════════════════

fn print_banner(cfg: &ContentionConfig) {
    let bar = "\u{2550}".repeat(90);
    println!("\n{bar}");
    println!("  LITHOS SLOT PERFORMANCE REPORT");
    println!("  uncontended ops + reader/writer contention + ring size sweep");
    println!("{bar}\n");

    let os = run_cmd("uname", &["-srm"]).unwrap_or_else(|| "unknown".into());
    let date = run_cmd("date", &["+%Y-%m-%d %H:%M:%S"]).unwrap_or_default();
    let ncpu = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(0);

    println!("  Cores:   {ncpu}");
    println!("  OS:      {}", os.trim());
    println!("  Date:    {}", date.trim());
    println!(
        "  Load:    {} readers x {} reads, {} writers ({} ns pacing)",
        cfg.reader_count, cfg.iterations, cfg.writer_count, cfg.writer_interval_ns
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Uncontended
// ═══════════════════════════════════════════════════════════════════════════

fn section_uncontended() -> Vec<BenchResult> {
    section_header("UNCONTENDED READ / WRITE");
    print_table_header();

    let mut results = measure_slot_ops(&MutexSlot::from_value(Payload::initial()), 200);
    results.extend(measure_slot_ops(
        &RingSlot::<Payload>::from_value(Payload::initial()),
        200,
    ));
    for r in &results {
        print_result_row(r);
    }
    results
}

// ═══════════════════════════════════════════════════════════════════════════
// Contention
// ═══════════════════════════════════════════════════════════════════════════

fn section_contention(cfg: &ContentionConfig) -> Vec<ContentionReport> {
    section_header("READER / WRITER CONTENTION");

    let mut reports = Vec::new();
    for &kind in &cfg.implementations {
        let report = run_kind(kind, cfg);
        println!("  [{}]", kind.as_str());
        for line in report.to_string().lines() {
            println!("    {line}");
        }
        println!(
            "    {} reads/s, {} writes",
            format_count(report.reads_per_sec() as u64),
            format_count(report.writes)
        );
        if let Err(e) = report.verify() {
            println!("    FAILED: {e}");
        }
        reports.push(report);
    }

    if let (Some(mutex), Some(ring)) = (
        find_report(&reports, SlotKind::Mutex),
        find_report(&reports, SlotKind::Ring),
    ) {
        let speedup = ring.reads_per_sec() / mutex.reads_per_sec().max(1.0);
        println!("\n  ring vs mutex read throughput: {speedup:.2}x");
    }
    reports
}

fn find_report(reports: &[ContentionReport], kind: SlotKind) -> Option<&ContentionReport> {
    reports.iter().find(|r| r.implementation == kind.as_str())
}

// ═══════════════════════════════════════════════════════════════════════════
// Ring size sweep
// ═══════════════════════════════════════════════════════════════════════════

fn section_ring_sweep(writers: usize) -> Vec<SweepResult> {
    section_header("RING SIZE SWEEP (writers only)");
    println!(
        "  {:<10} {:>8} {:>12} {:>12}",
        "Ring", "Writers", "Writes", "ns/write"
    );
    println!("  {}", "\u{2500}".repeat(46));

    let sweep = vec![
        sweep_ring::<2>(writers),
        sweep_ring::<4>(writers),
        sweep_ring::<8>(writers),
        sweep_ring::<16>(writers),
    ];
    for s in &sweep {
        println!(
            "  {:<10} {:>8} {:>12} {:>12.1}",
            s.ring_size,
            s.writers,
            format_count(s.writes),
            s.ns_per_write
        );
    }
    sweep
}

fn sweep_ring<const N: usize>(writers: usize) -> SweepResult {
    let slot = RingSlot::<Payload, N>::from_value(Payload::initial());
    let barrier = Barrier::new(writers + 1);

    let elapsed = thread::scope(|scope| {
        for w in 1..=writers as u64 {
            let slot = &slot;
            let barrier = &barrier;
            scope.spawn(move || {
                let value = Arc::new(Payload::new(w));
                barrier.wait();
                for _ in 0..SWEEP_WRITES {
                    slot.write(Arc::clone(&value));
                }
            });
        }
        barrier.wait();
        Instant::now()
    })
    .elapsed();

    let writes = SWEEP_WRITES * writers as u64;
    SweepResult {
        ring_size: slot.capacity(),
        writers,
        writes,
        elapsed_ns: elapsed.as_nanos() as u64,
        ns_per_write: elapsed.as_nanos() as f64 / writes as f64,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// JSON Output
// ═══════════════════════════════════════════════════════════════════════════

fn save_results(
    cfg: &ContentionConfig,
    results: &[BenchResult],
    reports: &[ContentionReport],
    sweep: &[SweepResult],
) {
    let timestamp = run_cmd("date", &["+%Y%m%d_%H%M%S"])
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".into());

    let results_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/results");
    let _ = std::fs::create_dir_all(results_dir);
    let json_path = format!("{results_dir}/{timestamp}_slot_report.json");

    let output = serde_json::json!({
        "report_type": "slot",
        "timestamp": timestamp,
        "config": {
            "reader_count": cfg.reader_count,
            "writer_count": cfg.writer_count,
            "iterations": cfg.iterations,
            "writer_interval_ns": cfg.writer_interval_ns,
        },
        "uncontended": results,
        "contention": reports,
        "ring_sweep": sweep,
    });

    let bar = "\u{2550}".repeat(90);
    let written = serde_json::to_string_pretty(&output)
        .map_err(std::io::Error::other)
        .and_then(|json| std::fs::write(&json_path, json));
    match written {
        Ok(()) => {
            println!("\n{bar}");
            println!("  Results saved to: {json_path}");
            println!("{bar}\n");
        }
        Err(e) => eprintln!("\n  [failed to save results: {e}]\n"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn run_cmd(cmd: &str, args: &[&str]) -> Option<String> {
    std::process::Command::new(cmd)
        .args(args)
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                String::from_utf8(o.stdout).ok()
            } else {
                None
            }
        })
}
