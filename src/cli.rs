use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the drive server
#[derive(Parser, Debug)]
#[clap(name = "mini-drive")]
#[clap(about = "Browse, upload and download files with live folder listings", long_about = None)]
pub struct Args {
    /// Directory to serve
    #[clap(long, value_name = "DIR", default_value = "asset")]
    pub asset_dir: PathBuf,

    /// Directory for uploads in progress (emptied at startup)
    #[clap(long, value_name = "DIR", default_value = "temp")]
    pub temp_dir: PathBuf,

    /// Port to listen on
    #[clap(short, long, default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Built frontend to serve for unmatched paths
    #[clap(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,
}

impl Args {
    pub fn router_config(&self) -> crate::RouterConfig {
        crate::RouterConfig {
            asset_dir: self.asset_dir.clone(),
            temp_dir: self.temp_dir.clone(),
            static_dir: self.static_dir.clone(),
        }
    }
}
