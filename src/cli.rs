use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::config::{ClientConfig, Protocol, DEFAULT_BASE_URL};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ProtocolArg {
    Direct,
    FileId,
}

#[derive(Parser, Debug)]
#[command(
    name = "xray-predict-ui",
    version,
    about = "Browser front end for a remote chest X-ray prediction API"
)]
pub(crate) struct Args {
    #[arg(long, default_value = "127.0.0.1:7860")]
    pub(crate) bind: String,
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub(crate) base_url: String,
    #[arg(long, default_value_t = 180)]
    pub(crate) timeout_secs: u64,
    #[arg(long, value_enum, default_value_t = ProtocolArg::Direct)]
    pub(crate) protocol: ProtocolArg,
    #[arg(long, default_value_t = 60)]
    pub(crate) fetch_timeout_secs: u64,
    #[arg(long)]
    pub(crate) log_json: bool,
}

impl Args {
    pub(crate) fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            protocol: match self.protocol {
                ProtocolArg::Direct => Protocol::Direct,
                ProtocolArg::FileId => Protocol::FileId,
            },
            ..ClientConfig::with_base_url(self.base_url.clone())
        }
    }
}
