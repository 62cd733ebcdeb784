//! Resolves a YouTube video id into a deciphered, merged and ranked list
//! of playable stream formats.
//!
//! The pipeline chains several undocumented surfaces — watch page, embed
//! page, the legacy video info endpoint, the player script, DASH and HLS
//! manifests — and tolerates partial failure of any optional source.
//!
//! ```no_run
//! # async fn run() -> Result<(), tubelink::ResolveError> {
//! let resolver = tubelink::Resolver::new()?;
//! let options = tubelink::ResolveOptions::default();
//! let info = resolver.get_full_info("dQw4w9WgXcQ", &options).await?;
//! for format in &info.formats {
//!     println!("{} {:?} {:?}", format.itag, format.resolution, format.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod common;
pub mod config;
pub mod extras;
pub mod formats;
pub mod info;
pub mod manifest;
pub mod page;
pub mod player;
pub mod util;

pub use cipher::DecipherOp;
pub use common::errors::ResolveError;
pub use config::{RequestOptions, ResolveOptions};
pub use formats::Format;
pub use info::{Resolver, VideoInfo};
