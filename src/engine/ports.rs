//! Collaborators the scheduling engine reads from and writes through.
//!
//! [`crate::store::Store`] implements all four; tests substitute their own.

use async_trait::async_trait;

use crate::model::*;
use crate::store::StoreError;

/// A session the engine has cleared for commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSession {
    pub center_id: CenterId,
    pub template_id: TemplateId,
    pub span: Span,
    /// Window no existing session at the center may intersect at commit time.
    pub exclusion: Span,
}

#[async_trait]
pub trait TemplateLookup: Send + Sync {
    /// The template, only if it exists and belongs to `center_id`.
    async fn find_template(
        &self,
        template_id: TemplateId,
        center_id: CenterId,
    ) -> Result<Option<Template>, StoreError>;
}

#[async_trait]
pub trait HolidayOracle: Send + Sync {
    /// Whether `at` falls on any blackout date recorded for the center.
    async fn is_holiday(&self, center_id: CenterId, at: Ms) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait OverlapOracle: Send + Sync {
    /// Whether any session at the center intersects `span` (literal half-open test, no padding).
    async fn has_overlap(&self, center_id: CenterId, span: Span) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the session atomically, or fail with [`StoreError::Conflict`]
    /// if a session intersecting `exclusion` got there first.
    async fn create_session(&self, session: NewSession) -> Result<ClassSession, StoreError>;
}
