use form_host_runtime::HostConfig;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = HostConfig::from_env();
    log::debug!("starting form host with {config:?}");

    if let Err(err) = form_host_runtime::run(&config) {
        log::error!("form_host fatal error: {err}");
        process::exit(1);
    }
}
