use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use svc_logger::{fields, Config, Logger};

#[test]
fn every_sink_receives_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("svc.log");
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let config = Config::build(
        "svc",
        "pod-1",
        false,
        path.to_string_lossy(),
        address,
        true,
        "info",
    )
    .unwrap();
    let logger = Logger::new(&config).unwrap();
    let (server, _) = listener.accept().unwrap();

    logger.info("first", &fields!["n", "1"]);
    logger.debug("filtered", &fields![]);
    logger.warn("second", &fields![]);
    logger.flush();
    drop(logger);

    let remote: Vec<String> = BufReader::new(server)
        .lines()
        .map(|line| line.unwrap())
        .collect();
    let file: Vec<String> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();

    assert_eq!(remote.len(), 2);
    assert_eq!(remote, file);

    let first: serde_json::Value = serde_json::from_str(&file[0]).unwrap();
    assert_eq!(first["message"], "first");
    assert_eq!(first["pod"], "pod-1");
    assert_eq!(first["n"], "1");
}

#[test]
fn unreachable_collector_fails_initialization() {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let config = Config::builder()
        .service_name("svc")
        .log_analyser(address)
        .build()
        .unwrap();

    let err = Logger::new(&config).unwrap_err();
    assert!(err.to_string().contains("log analyser"));
}
