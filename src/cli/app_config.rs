use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// The request url,like http://www.google.com
    pub url: String,
    /// Specify request method to use
    #[arg(short = 'X', long = "request", value_name = "method")]
    pub method_option: Option<String>,
    /// HTTP POST data.
    #[arg(short = 'd', long = "data", value_name = "data")]
    pub body_option: Option<String>,
    /// Pass custom header(s) to server
    #[arg(short = 'H', long = "header", value_name = "header")]
    pub headers: Vec<String>,
    /// Client certificate file, pem with certificate and key
    #[arg(short = 'E', long = "cert", value_name = "certificate")]
    pub certificate_path_option: Option<String>,
    /// Allow insecure server connections
    #[arg(short = 'k', long = "insecure")]
    pub skip_certificate_validate: bool,
    /// Show document info only
    #[arg(short = 'I', long = "head")]
    pub header_option: bool,
    /// Do not follow 3xx redirects
    #[arg(long = "no-redirects")]
    pub no_redirects: bool,
    /// Maximum number of redirects to follow
    #[arg(long = "max-redirects", value_name = "num", default_value_t = 2)]
    pub max_redirects: usize,
    /// Print the trace wrapped in a json document
    #[arg(long = "json")]
    pub json: bool,
    /// Make the operation more talkative
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
