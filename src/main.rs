mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use sealview::admin::{self, MediaSpec};
use std::path::Path;
use sv_core::config::Config;
use sv_core::Role;

fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(match path {
        Some(p) => Config::load(p)?,
        None => Config::load_or_default(None),
    })
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    // CLI flags win over the config file.
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting sealview {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    sv_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise use defaults based on the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "sealview=trace,sv_server=trace,sv_access=trace,sv_viewer=trace,sv_db=debug,sv_core=debug,tower_http=debug".to_string()
        } else {
            "sealview=info,sv_server=info,sv_access=info,sv_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, config_path))
        }
        Commands::CreateUser {
            username,
            password,
            admin: is_admin,
        } => {
            let config = load_config(config_path)?;
            let db = admin::open_db(&config)?;
            let role = if is_admin { Role::Admin } else { Role::Client };
            let user = admin::create_user(&db, &username, &password, role, bcrypt::DEFAULT_COST)?;
            println!("Created {} {} ({})", user.role, user.username, user.id);
            Ok(())
        }
        Commands::AddMedia {
            title,
            kind,
            path,
            content_type,
            thumbnail,
        } => {
            let config = load_config(config_path)?;
            let db = admin::open_db(&config)?;
            let item = admin::add_media(
                &config,
                &db,
                &MediaSpec {
                    title,
                    kind,
                    path,
                    content_type,
                    thumbnail,
                },
            )?;
            println!("{}", item.id);
            Ok(())
        }
        Commands::Grant { user, media, by } => {
            let config = load_config(config_path)?;
            let db = admin::open_db(&config)?;
            let g = admin::grant(&db, &user, &media, by.as_deref())?;
            println!(
                "Granted {} on {} (by {}, {})",
                g.user_id, g.media_id, g.granted_by, g.granted_at
            );
            Ok(())
        }
        Commands::Revoke { user, media } => {
            let config = load_config(config_path)?;
            let db = admin::open_db(&config)?;
            admin::revoke(&db, &user, &media)?;
            println!("Revoked; tokens already issued stay valid until they expire");
            Ok(())
        }
        Commands::ListUsers => {
            let config = load_config(config_path)?;
            let db = admin::open_db(&config)?;
            let conn = sv_db::pool::get_conn(&db)?;
            for u in sv_db::queries::users::list_users(&conn)? {
                println!("{}  {:<6}  {}", u.id, u.role, u.username);
            }
            Ok(())
        }
        Commands::ListMedia => {
            let config = load_config(config_path)?;
            let db = admin::open_db(&config)?;
            let conn = sv_db::pool::get_conn(&db)?;
            for m in sv_db::queries::media::list_media(&conn)? {
                println!("{}  {:<12}  {}  ({})", m.id, m.kind, m.title, m.storage_path);
            }
            Ok(())
        }
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or_else(|| config_path.map(Path::to_path_buf));
            validate_config(path.as_deref())
        }
        Commands::HashPassword { password } => {
            println!("{}", bcrypt::hash(password, bcrypt::DEFAULT_COST)?);
            Ok(())
        }
        Commands::GenerateSecret => {
            println!("{}", admin::generate_secret());
            Ok(())
        }
        Commands::Version => {
            println!("sealview {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            Config::load(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Media root: {}", config.storage.media_root.display());
    println!(
        "  Token TTL: {}s (skew {}s)",
        config.streaming.effective_ttl_secs(),
        config.streaming.clock_skew_secs
    );
    println!("  Viewer mode: {:?}", config.viewer.mode);

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        for w in &warnings {
            println!("! {w}");
        }
    }
    Ok(())
}
