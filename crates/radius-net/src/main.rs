use clap::Parser;
use radius_net::config::Config;
use radius_net::server::{handler_fn, HandlerError, Server};
use radius_proto::attributes::{self, Avp};
use radius_proto::{Packet, PacketCode, NO_VENDOR};
use std::collections::HashMap;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Multi-tenant RADIUS authentication and accounting daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "radiusd")]
struct Cli {
    /// Path to configuration file
    #[arg(value_name = "CONFIG", default_value = "radiusd.json")]
    config_path: String,

    /// Validate configuration and exit (doesn't start the server)
    #[arg(short, long)]
    validate: bool,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// PAP authentication against the configured users list. The decoder has
/// already unscrambled the User-Password value.
async fn handle_access_request(
    mut req: Packet,
    users: Arc<HashMap<String, String>>,
) -> Result<Option<Packet>, HandlerError> {
    let username = req
        .attributes_with_number(attributes::USER_NAME, NO_VENDOR)
        .first()
        .map(|avp| avp.display_value().to_string());
    let password = req
        .avps
        .iter()
        .find(|avp| avp.number == attributes::USER_PASSWORD)
        .and_then(|avp| avp.raw_value.clone());

    let mut rply = req.reply();
    let accepted = match (&username, &password) {
        (Some(username), Some(password)) => users
            .get(username)
            .is_some_and(|expected| expected.as_bytes() == password.as_slice()),
        _ => false,
    };
    if accepted {
        info!(username = username.as_deref().unwrap_or(""), "authentication successful");
        rply.code = PacketCode::AccessAccept;
    } else {
        warn!(username = username.as_deref().unwrap_or(""), "authentication failed");
        rply.code = PacketCode::AccessReject;
        rply.avps.push(Avp::from_raw(
            attributes::REPLY_MESSAGE,
            b"Authentication failed".to_vec(),
        ));
    }
    Ok(Some(rply))
}

/// Accounting requests are acknowledged; persistence stays with the caller.
async fn handle_accounting_request(req: Packet) -> Result<Option<Packet>, HandlerError> {
    let mut rply = req.reply();
    rply.code = PacketCode::AccountingResponse;
    Ok(Some(rply))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config_path) {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info");
            if cli.validate {
                eprintln!("configuration validation failed: {err}");
                process::exit(1);
            }
            warn!(path = %cli.config_path, error = %err, "could not load config file");
            info!(path = %cli.config_path, "writing example configuration");
            if let Err(err) = Config::example().to_file(&cli.config_path) {
                error!(error = %err, "error creating example config");
                process::exit(1);
            }
            info!(path = %cli.config_path, "edit the configuration and restart");
            process::exit(0);
        }
    };

    if cli.validate {
        println!("configuration validated");
        println!("  listen: {}://{}:{}", config.network, config.listen_address, config.listen_port);
        println!("  peers: {}", config.peers.len());
        println!("  users: {}", config.users.len());
        process::exit(0);
    }

    init_tracing(config.log_level.as_deref().unwrap_or("info"));
    info!("radiusd v{}", env!("CARGO_PKG_VERSION"));
    info!(path = %cli.config_path, "loaded configuration");

    if config.peers.is_empty() && config.secret.is_empty() {
        warn!("no peers and no default secret configured; every request will be dropped");
    }

    let users: Arc<HashMap<String, String>> = Arc::new(
        config
            .users
            .iter()
            .map(|user| (user.username.clone(), user.password.clone()))
            .collect(),
    );
    for user in &config.users {
        info!(username = %user.username, "added user");
    }

    let secrets = Arc::new(config.build_secrets());
    let dicts = match config.build_dictionaries() {
        Ok(dicts) => Arc::new(dicts),
        Err(err) => {
            error!(error = %err, "failed loading dictionaries");
            process::exit(1);
        }
    };

    let addr = match config.socket_addr() {
        Ok(addr) => addr.to_string(),
        Err(err) => {
            error!(error = %err, "invalid listen address");
            process::exit(1);
        }
    };

    let mut handlers = HashMap::new();
    handlers.insert(
        PacketCode::AccessRequest,
        handler_fn(move |req: Packet| handle_access_request(req, Arc::clone(&users))),
    );
    handlers.insert(
        PacketCode::AccountingRequest,
        handler_fn(handle_accounting_request),
    );

    let server = Arc::new(Server::new(
        &config.network,
        &addr,
        secrets,
        dicts,
        handlers,
        HashMap::new(),
    ));

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    if let Err(err) = server.listen_and_serve(shutdown).await {
        error!(error = %err, "server error");
        process::exit(1);
    }
    info!("server stopped");
}
