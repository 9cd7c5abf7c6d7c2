//! Round-code scanner core: locates and decodes a circular 2-D barcode in
//! a greyscale image buffer.
//!
//! ```no_run
//! let buffer: Vec<u8> = vec![0; 640 * 480];
//! // `None` defaults to `Quality::High`; pass `Some(Quality::Medium)` etc.
//! // for a different effort/accuracy tradeoff.
//! match roundcode::scan(&buffer, 640, 480, None) {
//!     Ok(result) => println!("decoded {} bytes at ({}, {})", result.payload.len(), result.center_x, result.center_y),
//!     Err(roundcode::ScanError::NotFound) => println!("no code found"),
//!     Err(e) => eprintln!("invalid input: {e}"),
//! }
//! ```

mod constants;
mod contour;
mod ellipse;
mod error;
mod finder;
mod geometry;
mod quality;
mod raster;
mod sampler;
mod scan;
mod solver;
mod timing;

pub use constants::PAYLOAD_BYTES;
pub use error::ScanError;
pub use quality::Quality;
pub use scan::{scan, scan_timed, ScanResult};
pub use timing::ScanTiming;
