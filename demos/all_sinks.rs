use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::thread;
use svc_logger::{fields, Config, Logger};

fn main() {
    // Stand-in for a log collector: print whatever arrives.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind collector");
    let address = listener.local_addr().expect("collector address").to_string();
    let collector = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        for line in BufReader::new(stream).lines().map_while(Result::ok) {
            println!("collector <- {line}");
        }
    });

    let log_path = std::env::temp_dir().join("svc-logger-demo.log");
    let config = Config::builder()
        .service_name("inventory")
        .pod("inventory-2")
        .console(true)
        .log_file_path(log_path.to_string_lossy())
        .log_analyser(address)
        .log_level("info")
        .build()
        .expect("valid config");

    let logger = match Logger::new(&config) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    logger.info("stock updated", &fields!["sku", "A-100", "delta", "-3"]);
    logger.debug("not emitted at info", &fields![]);
    logger.warn("low stock", &fields!["sku", "A-100"]);
    drop(logger);

    collector.join().expect("collector thread");
    println!("file sink: {}", log_path.display());
}
