// bufsock-bench: Buffered Socket Benchmark Suite
// Measures queueing throughput, loopback round-trips, reconnect recovery
mod latency;
mod throughput;

use clap::{Parser, Subcommand};
use std::process;

#[derive(Parser)]
#[command(name = "bufsock-bench")]
#[command(about = "Buffered Socket Benchmark Suite", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run all benchmark cases
    #[arg(short, long)]
    all: bool,

    /// Run specific case (shorthand for 'case' subcommand)
    #[arg(short = 'c', long = "case", value_name = "NAME")]
    case: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run specific benchmark case
    Case {
        /// Case name to run
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List all available benchmark cases
    List,
}

fn print_banner() {
    println!("=============================================================");
    println!("             BUFFERED SOCKET BENCHMARK SUITE");
    println!("  Testing: Try-Locked Queues, Background Workers, Reconnect");
    println!("=============================================================");
}

fn list_cases() {
    println!("\n=== Available Benchmark Cases ===\n");

    println!("THROUGHPUT:");
    println!("  throughput-single   - Single producer against a mock peer");
    println!("  throughput-mpsc     - Four producers sharing one session");
    println!("  throughput-all      - Run all throughput tests");
    println!();

    println!("LATENCY:");
    println!("  latency-loopback    - Round-trip time over loopback TCP");
    println!("  latency-reconnect   - Recovery time after a peer hang-up");
    println!("  latency-all         - Run all latency tests");
    println!();

    println!("COMPREHENSIVE:");
    println!("  quick               - Quick benchmark suite (~15 seconds)");
    println!("  full                - Full benchmark suite (~2 minutes)");
    println!();
    println!("Usage:");
    println!("  bufsock-bench -a                      # Run all benchmarks");
    println!("  bufsock-bench -c latency-all          # Run all latency tests");
    println!("  bufsock-bench case throughput-mpsc    # Run producer fan-in test");
    println!("  bufsock-bench list                    # Show this list");
}

fn run_throughput_single() {
    let result = throughput::bench_single_producer(10000, 128);
    throughput::print_throughput_results(&[result]);
}

fn run_throughput_mpsc() {
    let result = throughput::bench_multi_producer(4, 2500);
    throughput::print_throughput_results(&[result]);
}

fn run_throughput_all() {
    println!("\n=== COMPREHENSIVE THROUGHPUT TESTS ===");

    let mut results = vec![];
    results.push(throughput::bench_single_producer(10000, 128));
    std::thread::sleep(std::time::Duration::from_secs(1));
    results.push(throughput::bench_multi_producer(4, 2500));

    throughput::print_throughput_results(&results);
}

fn run_latency_loopback() {
    let result = latency::bench_loopback_latency(200);
    latency::print_latency_results(&[result]);
}

fn run_latency_reconnect() {
    let result = latency::bench_reconnect_recovery(10);
    latency::print_latency_results(&[result]);
}

fn run_latency_all() {
    println!("\n=== COMPREHENSIVE LATENCY TESTS ===");

    let mut results = vec![];
    results.push(latency::bench_loopback_latency(200));
    std::thread::sleep(std::time::Duration::from_secs(1));
    results.push(latency::bench_reconnect_recovery(10));

    latency::print_latency_results(&results);
}

fn run_quick_suite() {
    println!("\n=== QUICK BENCHMARK SUITE (~15 seconds) ===");

    let results = vec![
        throughput::bench_single_producer(2000, 128),
        throughput::bench_multi_producer(2, 1000),
    ];
    throughput::print_throughput_results(&results);

    let results = vec![latency::bench_loopback_latency(50)];
    latency::print_latency_results(&results);

    println!("\nQuick benchmark suite completed");
}

fn run_full_suite() {
    println!("\n=== FULL BENCHMARK SUITE (~2 minutes) ===");

    run_throughput_all();
    println!("\n{}", "-".repeat(61));

    run_latency_all();

    println!("\nFull benchmark suite completed");
}

fn run_case(name: &str) {
    match name {
        // Throughput
        "throughput-single" => run_throughput_single(),
        "throughput-mpsc" => run_throughput_mpsc(),
        "throughput-all" => run_throughput_all(),

        // Latency
        "latency-loopback" => run_latency_loopback(),
        "latency-reconnect" => run_latency_reconnect(),
        "latency-all" => run_latency_all(),

        // Suites
        "quick" => run_quick_suite(),
        "full" => run_full_suite(),

        _ => {
            eprintln!("Error: Unknown benchmark case '{}'", name);
            eprintln!("Run 'bufsock-bench list' to see available cases");
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    print_banner();

    if cli.all {
        run_full_suite();
    } else if let Some(case_name) = cli.case {
        run_case(&case_name);
    } else {
        match cli.command {
            Some(Commands::Case { name }) => {
                run_case(&name);
            }
            Some(Commands::List) => {
                list_cases();
            }
            None => {
                println!("\nNo benchmark specified. Use one of:");
                println!("  bufsock-bench -a              # Run all benchmarks");
                println!("  bufsock-bench -c <case>       # Run specific case");
                println!("  bufsock-bench case <case>     # Run specific case");
                println!("  bufsock-bench list            # List available cases");
                println!("  bufsock-bench --help          # Show help");
                println!("\nFor a quick start, try: bufsock-bench -c quick");
            }
        }
    }
}
