use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "lanyard-server", about = "Event check-in and invitation server")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "lanyard.toml")]
    pub config: String,

    /// Override the bind address from the config file.
    #[arg(long)]
    pub bind: Option<String>,
}
