//! Map sheet generation
//!
//! Turns an address, a `lat,lng` pair or a map link into a printable
//! single-page PDF holding a map clipping, an annotation box and a QR code
//! linking back to the map.
//!
//! The pieces are wired together by [`pipeline::SheetGenerator`]:
//!
//! - [`usage::UsageGate`] checks the account's monthly plan ceiling
//! - [`resolver::CoordinateResolver`] turns the user's input into [`Coordinates`]
//! - [`static_map::MapImageSource`] fetches one raster tile per zoom level
//! - [`compose::DocumentComposer`] lays out the page and writes the PDF
//!
//! Network providers and text rendering sit behind traits so each stage can
//! be exercised without live services.

pub mod compose;
pub mod coords;
pub mod error;
pub mod filename;
pub mod geocode;
pub mod maplink;
pub mod pipeline;
pub mod plan;
pub mod resolver;
pub mod shortlink;
pub mod static_map;
pub mod usage;

pub use compose::{Annotation, ComposedDocument, DocumentComposer, FontRenderer, GlyphRenderer};
pub use coords::Coordinates;
pub use error::SheetError;
pub use geocode::{Geocoder, GoogleGeocoder};
pub use maplink::{extract_coordinates, CoordinatePattern};
pub use pipeline::{GeneratedSheet, GenerationRequest, SheetGenerator};
pub use plan::{Plan, PlanLimit};
pub use resolver::CoordinateResolver;
pub use shortlink::{HttpLinkExpander, LinkExpander};
pub use static_map::{MapImageSource, StaticMapClient};
pub use usage::{Account, Authorization, MemoryUsageStore, UsageGate, UsageStore};

/// Language hint sent to the map provider when none is configured
pub const DEFAULT_LANGUAGE: &str = "ja";
