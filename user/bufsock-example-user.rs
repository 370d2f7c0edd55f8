// bufsock-example-user: example binary driving one buffered session
use bufsock_ng::BufferedSocket;
use std::env;

fn usage() {
    println!("Usage: bufsock-example-user [options] message");
    println!("Queue messages on a buffered session and report link status.");
    println!("Options:");
    println!("  -H host   Peer host (Default: 127.0.0.1)");
    println!("  -p port   Peer port (Default: 3490)");
    println!("  -n count  Number of messages to queue (Default: 10)");
    println!("  -d delay  Milliseconds to wait between messages (Default: 500)");
    println!("  -e        Print chunks echoed back by the peer (Default: disabled)");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut host = "127.0.0.1".to_string();
    let mut port = 3490u16;
    let mut count = 10usize;
    let mut delay = 500u64;
    let mut echo = false;
    let mut message = String::new();

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-H" => {
                if i + 1 < args.len() {
                    host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().unwrap_or(3490);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-n" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(10);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-d" => {
                if i + 1 < args.len() {
                    delay = args[i + 1].parse().unwrap_or(500);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-e" => {
                echo = true;
                i += 1;
            }
            "-h" | "--help" => {
                usage();
                return;
            }
            _ => {
                message = args[i].clone();
                i += 1;
            }
        }
    }

    if message.is_empty() {
        eprintln!("ERROR: No message selected");
        usage();
        std::process::exit(1);
    }

    println!(
        "bufsock-example-user {} -> {}:{}",
        bufsock_ng::version(),
        host,
        port
    );

    let session = BufferedSocket::open(&host, port);

    for num in 0..count {
        println!("Send {} {}", num, message);
        let payload = format!("{} {}", num, message);
        let receipt = session.send(payload.into_bytes());
        if !receipt.connected {
            println!("  link down, payload buffered");
        }
        if receipt.reconnected {
            println!("  link was silently reconnected");
        }

        if echo {
            while let Some(chunk) = session.dequeue() {
                if chunk.is_empty() {
                    println!("  peer closed the connection");
                } else {
                    println!("  echo: {}", String::from_utf8_lossy(&chunk));
                }
            }
        }

        if delay > 0 {
            std::thread::sleep(std::time::Duration::from_millis(delay));
        }
    }

    // Give the workers a moment to drain the queue before reading counters
    std::thread::sleep(std::time::Duration::from_secs(1));

    let stats = session.stats();
    println!("\n=== Final Session Statistics ===");
    println!(
        "state={} pending_send={} pending_recv={}",
        session.state(),
        session.pending_send(),
        session.pending_recv()
    );
    println!(
        "enqueued={} spilled={} sent={} partial_writes={}",
        stats.enqueued, stats.spilled, stats.sent, stats.partial_writes
    );
    println!(
        "chunks_received={} connects={} connect_failures={}",
        stats.chunks_received, stats.connects, stats.connect_failures
    );

    session.stop();
}
