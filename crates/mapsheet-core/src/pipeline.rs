//! Sheet generation pipeline
//!
//! authorize → resolve → fetch → compose → record. A failure at any stage
//! returns before the usage record is written, so only delivered sheets
//! count against the plan.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::compose::{Annotation, DocumentComposer};
use crate::coords::Coordinates;
use crate::error::SheetError;
use crate::filename::build_output_filename;
use crate::resolver::CoordinateResolver;
use crate::static_map::MapImageSource;
use crate::usage::{Account, Authorization, UsageGate};

/// Longest remark kept, in code points
pub const MAX_REMARKS_CHARS: usize = 200;
/// Vehicle label printed when none was chosen
pub const DEFAULT_VEHICLE_TYPE: &str = "車種指定なし";

/// User input for one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub address: String,
    pub coordinates: String,
    pub customer: String,
    pub property_name: String,
    pub vehicle_type: String,
    pub remarks: String,
}

impl GenerationRequest {
    /// Trimmed fields, remarks capped and the vehicle label defaulted
    pub fn normalized(&self) -> Self {
        let vehicle_type = self.vehicle_type.trim();
        Self {
            address: self.address.trim().to_string(),
            coordinates: self.coordinates.trim().to_string(),
            customer: self.customer.trim().to_string(),
            property_name: self.property_name.trim().to_string(),
            vehicle_type: if vehicle_type.is_empty() {
                DEFAULT_VEHICLE_TYPE.to_string()
            } else {
                vehicle_type.to_string()
            },
            remarks: self.remarks.trim().chars().take(MAX_REMARKS_CHARS).collect(),
        }
    }

    /// Address, or the raw coordinate text when no address was given
    pub fn location_label(&self) -> &str {
        if self.address.is_empty() {
            &self.coordinates
        } else {
            &self.address
        }
    }

    fn annotation(&self) -> Annotation {
        Annotation {
            address: self.address.clone(),
            customer: self.customer.clone(),
            property_name: self.property_name.clone(),
            vehicle_type: self.vehicle_type.clone(),
            remarks: self.remarks.clone(),
        }
    }
}

/// A delivered sheet
#[derive(Debug, Clone)]
pub struct GeneratedSheet {
    pub pdf: Vec<u8>,
    pub filename: String,
    pub coordinates: Coordinates,
    /// Generations left this month after this one
    pub remaining: u32,
}

#[derive(Clone)]
pub struct SheetGenerator {
    resolver: CoordinateResolver,
    maps: Arc<dyn MapImageSource>,
    gate: UsageGate,
    composer: Arc<DocumentComposer>,
}

impl SheetGenerator {
    pub fn new(
        resolver: CoordinateResolver,
        maps: Arc<dyn MapImageSource>,
        gate: UsageGate,
        composer: Arc<DocumentComposer>,
    ) -> Self {
        Self {
            resolver,
            maps,
            gate,
            composer,
        }
    }

    pub fn resolver(&self) -> &CoordinateResolver {
        &self.resolver
    }

    pub fn gate(&self) -> &UsageGate {
        &self.gate
    }

    pub async fn generate(
        &self,
        account: &Account,
        request: &GenerationRequest,
    ) -> Result<GeneratedSheet, SheetError> {
        let request = request.normalized();
        let limits = account.plan.limit();

        let remaining = match self.gate.authorize(account, Utc::now()).await? {
            Authorization::Allowed { remaining } => remaining,
            Authorization::Denied { limit } => return Err(SheetError::QuotaExceeded { limit }),
        };

        let at = self
            .resolver
            .resolve(&request.coordinates, &request.address)
            .await?;

        let mut maps = Vec::with_capacity(limits.zooms().len());
        for &zoom in limits.zooms() {
            maps.push(self.maps.fetch(at, zoom).await?);
        }

        let composer = Arc::clone(&self.composer);
        let annotation = request.annotation();
        let watermark = limits.watermark;
        let pdf = tokio::task::spawn_blocking(move || {
            composer
                .compose(at, &maps, &annotation, watermark)?
                .into_pdf()
        })
        .await
        .map_err(|e| {
            warn!("Composer task failed: {}", e);
            SheetError::Render(e.to_string())
        })??;

        self.gate.record(account, Utc::now()).await?;

        let filename = build_output_filename(&request.property_name, request.location_label());
        info!(
            "Generated {} for {} at {} ({} bytes)",
            filename,
            account.id,
            at,
            pdf.len()
        );

        Ok(GeneratedSheet {
            pdf,
            filename,
            coordinates: at,
            remaining: remaining.saturating_sub(1),
        })
    }
}
