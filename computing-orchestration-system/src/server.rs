use std::sync::Arc;

use colored::Colorize;
use infrastructure_common::{config::build_config, telemetry::initialize_telemetry};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{api, infrastructure::ServiceProvider};

pub fn run() {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(x) => x,
        Err(e) => {
            return eprintln!("{}: {}", "Cannot build async runtime".red(), e);
        }
    };
    runtime.block_on(async_run());
}

pub async fn async_run() {
    let config = match build_config() {
        Ok(x) => x,
        Err(e) => {
            return eprintln!("{}: {}", "Cannot build config".red(), e);
        }
    };

    let service_provider = match ServiceProvider::build(config) {
        Ok(x) => Arc::new(x),
        Err(e) => {
            return eprintln!("{}: {}", "Cannot build Service Provider".red(), e);
        }
    };
    if let Err(e) = initialize_telemetry(service_provider.config().common.telemetry()) {
        return eprintln!("{}: {}", "Cannot build logger".red(), e);
    };
    let handles = service_provider
        .background_services()
        .into_iter()
        .map(|x| tokio::spawn(async move { x.run().await }))
        .collect::<Vec<JoinHandle<()>>>();
    tokio::select! {
        _ = initialize_web_host(service_provider) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Stopping services (ctrl-c handling).");
            for handle in handles {
                handle.abort()
            }
            std::process::exit(0);
        }
    }
}

pub async fn initialize_web_host(sp: Arc<ServiceProvider>) {
    let host = sp.config().common.host().clone();
    let server = actix_web::HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allow_any_method()
            .max_age(86400);

        actix_web::App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(cors)
            .app_data(actix_web::web::Data::from(sp.clone()))
            .configure(api::configure)
    })
    .bind((host.bind_address().to_owned(), *host.bind_port()));
    let server = match server {
        Ok(x) => x,
        Err(e) => {
            return error!(
                "Cannot bind web server to {}:{}: {}",
                host.bind_address(),
                host.bind_port(),
                e
            );
        }
    };
    info!("Web server listening on {}:{}.", host.bind_address(), host.bind_port());
    match server.disable_signals().run().await {
        Ok(_) => info!("Web server stopped successfully."),
        Err(e) => error!("Web server into error: {}", e),
    }
}
