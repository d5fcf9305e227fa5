//! Jenkins HTTP client.
//!
//! A thin authenticated session over `reqwest`: URL normalisation, login,
//! JSON/text GETs and HTML property scraping. Every call is a single GET,
//! never retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use jenkins_dashboard::client::{ClientConfig, JenkinsClient};
//!
//! # async fn run() -> Result<(), jenkins_dashboard::client::ClientError> {
//! let config = ClientConfig::new("jenkins.example.com", "admin", "secret");
//! let mut client = JenkinsClient::new(config)?;
//! let login = client.login().await?;
//! println!("connected as {} (Jenkins {})", login.full_name, login.version);
//! # Ok(())
//! # }
//! ```

mod error;
pub mod html;
mod session;

pub use error::ClientError;
pub use session::{ClientConfig, Crumb, JenkinsClient, LoginInfo, normalize_base_url};
