//! Zone use-case service.
//!
//! Zones are plain filter tags; the only rule above the repository is that
//! names are trimmed and non-blank.

use crate::model::item::ItemValidationError;
use crate::model::zone::{Zone, ZoneId};
use crate::repo::zone_repo::ZoneRepository;
use crate::service::item_service::{ServiceError, ServiceResult};
use log::info;

pub struct ZoneService<R: ZoneRepository> {
    repo: R,
}

impl<R: ZoneRepository> ZoneService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_zone(&self, name: impl Into<String>) -> ServiceResult<Zone> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::Validation(ItemValidationError::BlankZoneName));
        }
        let zone = self.repo.create_zone(trimmed)?;
        info!("event=zone_create module=service status=ok zone_id={}", zone.id);
        Ok(zone)
    }

    pub fn list_zones(&self) -> ServiceResult<Vec<Zone>> {
        Ok(self.repo.list_zones()?)
    }

    /// Deletes a zone; referencing items keep existing with `zone_id = None`.
    pub fn delete_zone(&self, id: ZoneId) -> ServiceResult<()> {
        self.repo.delete_zone(id)?;
        info!("event=zone_delete module=service status=ok zone_id={id}");
        Ok(())
    }
}
