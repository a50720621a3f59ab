// Library root
// -----------
// Client library behind the `pinry` binary.
//
// Module responsibilities:
// - `config`: reads and writes the local host + token file.
// - `api`: blocking HTTP client for the Pinry v2 API (image upload, pin
//   creation, boards, token check).
// - `cli`: clap argument definitions and the `config` / `add` commands.
// - `ui`: prompts for missing values and the upload spinner.
// - `error`: the library error type.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod ui;

pub use api::{PinRequest, PinSource, PinTarget, PinryClient};
pub use config::Config;
pub use error::{PinryError, Result};
