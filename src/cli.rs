use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sv_core::MediaKind;

#[derive(Parser)]
#[command(name = "sealview")]
#[command(author, version, about = "Grant-scoped, watermarked media streaming")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a login account
    CreateUser {
        username: String,

        /// Initial password
        #[arg(long)]
        password: String,

        /// Create an admin instead of a client
        #[arg(long)]
        admin: bool,
    },

    /// Register a media file in the catalog
    AddMedia {
        /// Display title
        #[arg(long)]
        title: String,

        /// video, document, image or presentation
        #[arg(long, value_parser = parse_kind)]
        kind: MediaKind,

        /// Location relative to storage.media_root, or absolute
        #[arg(long)]
        path: String,

        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,

        /// Poster image path
        #[arg(long)]
        thumbnail: Option<String>,
    },

    /// Allow a user to view a media item
    Grant {
        /// Username or user id
        #[arg(long)]
        user: String,

        /// Media id
        #[arg(long)]
        media: String,

        /// Admin recorded as the grantor (defaults to the first admin)
        #[arg(long)]
        by: Option<String>,
    },

    /// Withdraw a grant; live tokens stay valid until they expire
    Revoke {
        /// Username or user id
        #[arg(long)]
        user: String,

        /// Media id
        #[arg(long)]
        media: String,
    },

    /// List accounts
    ListUsers,

    /// List the media catalog
    ListMedia,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Generate a bcrypt password hash
    HashPassword {
        /// Password to hash
        password: String,
    },

    /// Generate a random stream token secret
    GenerateSecret,

    /// Display version information
    Version,
}

fn parse_kind(s: &str) -> Result<MediaKind, String> {
    s.parse().map_err(|e: sv_core::Error| e.to_string())
}
