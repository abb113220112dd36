use svc_logger::Config;
use tracing::{error, info};

fn main() {
    let config = Config::builder()
        .service_name("auth")
        .console(true)
        .build()
        .expect("valid config");
    let logger = svc_logger::init(config);
    svc_logger::init_tracing(logger).expect("set global subscriber");

    info!("starting service");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );
}
