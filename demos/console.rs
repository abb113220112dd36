use svc_logger::{fields, Config};

fn main() {
    let config = match Config::build("checkout", "checkout-0", true, "", "", false, "debug") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid logger config: {e}");
            std::process::exit(2);
        }
    };
    svc_logger::init(config);

    svc_logger::debug("starting", &fields!["port", "8080"]);
    svc_logger::info("odd fields", &fields!["dangling"]);

    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "payment gateway unreachable");
    svc_logger::error_with_error(&err, &fields!["gateway", "stripe"]);
}
